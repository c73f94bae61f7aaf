#![allow(clippy::float_cmp)]

use uuid::Uuid;

use super::*;

fn make_person(x: f64, y: f64, created_at: i64) -> Person {
    Person {
        id: Uuid::new_v4(),
        name: "Ana".into(),
        role: "Director".into(),
        sector: String::new(),
        sector_id: None,
        color: "#3B82F6".into(),
        avatar_url: None,
        position_x: x,
        position_y: y,
        card_size: CardSize::Medium,
        fill_card: true,
        locked: false,
        created_at,
        updated_at: created_at,
    }
}

fn make_connection(from: PersonId, to: PersonId) -> Connection {
    Connection { id: Uuid::new_v4(), from_person_id: from, to_person_id: to, created_at: 0 }
}

fn make_sector(name: &str) -> Sector {
    Sector { id: Uuid::new_v4(), name: name.into(), color: "#22C55E".into(), created_at: 0 }
}

fn make_line() -> DecorativeLine {
    DecorativeLine {
        id: Uuid::new_v4(),
        start_x: 0.0,
        start_y: 0.0,
        end_x: 100.0,
        end_y: 0.0,
        color: "#64748B".into(),
        stroke_width: 2.0,
        created_at: 0,
    }
}

fn doc_with_two() -> (ChartDoc, PersonId, PersonId) {
    let mut doc = ChartDoc::new();
    let a = make_person(0.0, 0.0, 1);
    let b = make_person(300.0, 0.0, 2);
    let (a_id, b_id) = (a.id, b.id);
    doc.insert_person(a);
    doc.insert_person(b);
    (doc, a_id, b_id)
}

// =============================================================
// CardSize
// =============================================================

#[test]
fn card_size_dimensions() {
    assert_eq!(CardSize::Small.dimensions(), (160.0, 64.0));
    assert_eq!(CardSize::Medium.dimensions(), (224.0, 96.0));
    assert_eq!(CardSize::Large.dimensions(), (288.0, 128.0));
}

#[test]
fn card_size_serde_is_lowercase() {
    assert_eq!(serde_json::to_string(&CardSize::Large).unwrap(), "\"large\"");
    let back: CardSize = serde_json::from_str("\"small\"").unwrap();
    assert_eq!(back, CardSize::Small);
}

#[test]
fn card_size_parse_matches_as_str() {
    for size in [CardSize::Small, CardSize::Medium, CardSize::Large] {
        assert_eq!(CardSize::parse(size.as_str()), Some(size));
    }
    assert_eq!(CardSize::parse("huge"), None);
}

// =============================================================
// Connections
// =============================================================

#[test]
fn connect_two_distinct_cards_adds_one_edge() {
    let (mut doc, a, b) = doc_with_two();
    doc.add_connection(make_connection(a, b)).unwrap();
    assert_eq!(doc.connections_len(), 1);
    let conn = doc.connections_sorted()[0];
    assert_eq!(conn.from_person_id, a);
    assert_eq!(conn.to_person_id, b);
}

#[test]
fn self_connection_is_rejected() {
    let (mut doc, a, _) = doc_with_two();
    let err = doc.add_connection(make_connection(a, a)).unwrap_err();
    assert_eq!(err, DocError::SelfConnection(a));
    assert_eq!(doc.connections_len(), 0);
}

#[test]
fn duplicate_connection_same_direction_is_rejected() {
    let (mut doc, a, b) = doc_with_two();
    doc.add_connection(make_connection(a, b)).unwrap();
    let err = doc.add_connection(make_connection(a, b)).unwrap_err();
    assert!(matches!(err, DocError::DuplicateConnection { .. }));
    assert_eq!(doc.connections_len(), 1);
}

#[test]
fn duplicate_connection_reverse_direction_is_rejected() {
    let (mut doc, a, b) = doc_with_two();
    doc.add_connection(make_connection(a, b)).unwrap();
    assert!(doc.add_connection(make_connection(b, a)).is_err());
    assert_eq!(doc.connections_len(), 1);
}

#[test]
fn connection_to_unknown_card_is_rejected() {
    let (mut doc, a, _) = doc_with_two();
    let ghost = Uuid::new_v4();
    assert_eq!(doc.can_connect(a, ghost), Err(DocError::PersonNotFound(ghost)));
    assert!(doc.add_connection(make_connection(ghost, a)).is_err());
}

#[test]
fn remove_person_cascades_connections() {
    let (mut doc, a, b) = doc_with_two();
    let c = make_person(600.0, 0.0, 3);
    let c_id = c.id;
    doc.insert_person(c);
    doc.add_connection(make_connection(a, b)).unwrap();
    doc.add_connection(make_connection(c_id, a)).unwrap();
    doc.add_connection(make_connection(b, c_id)).unwrap();

    let (removed, dropped) = doc.remove_person(&a).unwrap();
    assert_eq!(removed.id, a);
    assert_eq!(dropped.len(), 2);
    assert!(dropped.iter().all(|conn| conn.touches(a)));
    assert!(doc.connections_sorted().iter().all(|conn| !conn.touches(a)));
    assert_eq!(doc.connections_len(), 1);
}

#[test]
fn remove_unknown_person_returns_none() {
    let mut doc = ChartDoc::new();
    assert!(doc.remove_person(&Uuid::new_v4()).is_none());
}

#[test]
fn connections_for_lists_both_directions() {
    let mut doc = ChartDoc::new();
    let people: Vec<Person> = (0..3).map(|i| make_person(f64::from(i) * 300.0, 0.0, i64::from(i))).collect();
    let ids: Vec<PersonId> = people.iter().map(|p| p.id).collect();
    for p in people {
        doc.insert_person(p);
    }
    doc.add_connection(make_connection(ids[0], ids[1])).unwrap();
    doc.add_connection(make_connection(ids[2], ids[1])).unwrap();
    assert_eq!(doc.connections_for(ids[1]).len(), 2);
    assert_eq!(doc.connections_for(ids[0]).len(), 1);
}

#[test]
fn load_snapshot_skips_invalid_connections() {
    let a = make_person(0.0, 0.0, 1);
    let b = make_person(10.0, 0.0, 2);
    let good = make_connection(a.id, b.id);
    let reverse = Connection { created_at: 5, ..make_connection(b.id, a.id) };
    let dangling = make_connection(a.id, Uuid::new_v4());
    let looped = make_connection(b.id, b.id);

    let mut doc = ChartDoc::new();
    doc.load_snapshot(ChartSnapshot {
        people: vec![a, b],
        connections: vec![reverse, dangling, looped, good.clone()],
        sectors: vec![],
        lines: vec![],
    });
    assert_eq!(doc.connections_len(), 1);
    assert!(doc.connection(&good.id).is_some());
}

// =============================================================
// People
// =============================================================

#[test]
fn people_sorted_by_created_at() {
    let mut doc = ChartDoc::new();
    let late = make_person(0.0, 0.0, 20);
    let early = make_person(0.0, 0.0, 10);
    let (late_id, early_id) = (late.id, early.id);
    doc.insert_person(late);
    doc.insert_person(early);
    let order: Vec<PersonId> = doc.people_sorted().iter().map(|p| p.id).collect();
    assert_eq!(order, vec![early_id, late_id]);
}

#[test]
fn move_person_updates_center() {
    let (mut doc, a, _) = doc_with_two();
    let moved = doc.move_person(&a, 42.0, -7.0).unwrap();
    assert_eq!(moved.position_x, 42.0);
    assert_eq!(moved.position_y, -7.0);
}

#[test]
fn move_locked_person_is_refused() {
    let (mut doc, a, _) = doc_with_two();
    doc.person_mut(&a).unwrap().locked = true;
    assert_eq!(doc.move_person(&a, 1.0, 1.0).unwrap_err(), DocError::PersonLocked(a));
    assert_eq!(doc.person(&a).unwrap().position_x, 0.0);
}

#[test]
fn move_unknown_person_is_not_found() {
    let mut doc = ChartDoc::new();
    let id = Uuid::new_v4();
    assert_eq!(doc.move_person(&id, 0.0, 0.0).unwrap_err(), DocError::PersonNotFound(id));
}

#[test]
fn person_patch_applies_only_present_fields() {
    let (mut doc, a, _) = doc_with_two();
    let patch = PersonPatch { name: Some("Bia".into()), card_size: Some(CardSize::Large), ..Default::default() };
    assert!(doc.apply_person_patch(&a, &patch));
    let p = doc.person(&a).unwrap();
    assert_eq!(p.name, "Bia");
    assert_eq!(p.card_size, CardSize::Large);
    assert_eq!(p.role, "Director");
}

#[test]
fn person_patch_null_clears_sector_id() {
    let (mut doc, a, _) = doc_with_two();
    doc.person_mut(&a).unwrap().sector_id = Some(Uuid::new_v4());
    let patch: PersonPatch = serde_json::from_str(r#"{"sector_id": null}"#).unwrap();
    assert_eq!(patch.sector_id, Some(None));
    doc.apply_person_patch(&a, &patch);
    assert_eq!(doc.person(&a).unwrap().sector_id, None);
}

#[test]
fn person_patch_absent_sector_id_keeps_value() {
    let (mut doc, a, _) = doc_with_two();
    let sector = Uuid::new_v4();
    doc.person_mut(&a).unwrap().sector_id = Some(sector);
    let patch: PersonPatch = serde_json::from_str(r#"{"name": "Caio"}"#).unwrap();
    assert_eq!(patch.sector_id, None);
    doc.apply_person_patch(&a, &patch);
    assert_eq!(doc.person(&a).unwrap().sector_id, Some(sector));
}

#[test]
fn person_patch_unknown_id_returns_false() {
    let mut doc = ChartDoc::new();
    assert!(!doc.apply_person_patch(&Uuid::new_v4(), &PersonPatch::default()));
}

// =============================================================
// Sectors
// =============================================================

#[test]
fn sectors_sorted_case_insensitive() {
    let mut doc = ChartDoc::new();
    for name in ["rh", "Financeiro", "TI"] {
        doc.insert_sector(make_sector(name));
    }
    let names: Vec<&str> = doc.sectors_sorted().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Financeiro", "rh", "TI"]);
}

#[test]
fn remove_sector_detaches_people() {
    let (mut doc, a, b) = doc_with_two();
    let sector = make_sector("TI");
    let sector_id = sector.id;
    doc.insert_sector(sector);
    doc.person_mut(&a).unwrap().sector_id = Some(sector_id);

    let (_, detached) = doc.remove_sector(&sector_id).unwrap();
    assert_eq!(detached, vec![a]);
    assert_eq!(doc.person(&a).unwrap().sector_id, None);
    assert_eq!(doc.person(&b).unwrap().sector_id, None);
    assert!(doc.sector(&sector_id).is_none());
}

#[test]
fn people_in_sector_filters() {
    let (mut doc, a, _) = doc_with_two();
    let sector = Uuid::new_v4();
    doc.person_mut(&a).unwrap().sector_id = Some(sector);
    assert_eq!(doc.people_in_sector(None).len(), 2);
    let filtered = doc.people_in_sector(Some(sector));
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id, a);
    assert!(doc.people_in_sector(Some(Uuid::new_v4())).is_empty());
}

#[test]
fn sector_patch_renames() {
    let mut doc = ChartDoc::new();
    let sector = make_sector("RH");
    let id = sector.id;
    doc.insert_sector(sector);
    assert!(doc.apply_sector_patch(&id, &SectorPatch { name: Some("Pessoas".into()), color: None }));
    assert_eq!(doc.sector(&id).unwrap().name, "Pessoas");
    assert_eq!(doc.sector(&id).unwrap().color, "#22C55E");
}

// =============================================================
// Lines
// =============================================================

#[test]
fn line_patch_moves_endpoints() {
    let mut doc = ChartDoc::new();
    let line = make_line();
    let id = line.id;
    doc.insert_line(line);
    assert!(doc.apply_line_patch(&id, &LinePatch::endpoints(1.0, 2.0, 3.0, 4.0)));
    let l = doc.line(&id).unwrap();
    assert_eq!((l.start_x, l.start_y, l.end_x, l.end_y), (1.0, 2.0, 3.0, 4.0));
    assert_eq!(l.stroke_width, 2.0);
}

#[test]
fn remove_line() {
    let mut doc = ChartDoc::new();
    let line = make_line();
    let id = line.id;
    doc.insert_line(line);
    assert!(doc.remove_line(&id).is_some());
    assert!(doc.is_empty());
}

// =============================================================
// Snapshot
// =============================================================

#[test]
fn snapshot_round_trips_through_load() {
    let (mut doc, a, b) = doc_with_two();
    doc.add_connection(make_connection(a, b)).unwrap();
    doc.insert_sector(make_sector("TI"));
    doc.insert_line(make_line());

    let snap = doc.snapshot();
    let mut restored = ChartDoc::new();
    restored.load_snapshot(snap.clone());
    assert_eq!(restored.snapshot(), snap);
}
