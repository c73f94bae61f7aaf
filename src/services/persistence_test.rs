use super::*;
use crate::services::people::{self, NewPerson};
use crate::state::test_helpers;

fn new_person(name: &str) -> NewPerson {
    NewPerson { name: name.into(), fill_card: true, ..Default::default() }
}

// =============================================================================
// PendingWrites
// =============================================================================

#[test]
fn repeated_upserts_coalesce() {
    let mut pending = PendingWrites::new();
    let id = Uuid::new_v4();
    for _ in 0..50 {
        pending.mark_upsert(EntityKey::person(id));
    }
    assert_eq!(pending.len(), 1);
    assert_eq!(pending.op(&EntityKey::person(id)), Some(WriteOp::Upsert));
}

#[test]
fn delete_supersedes_upsert() {
    let mut pending = PendingWrites::new();
    let key = EntityKey::line(Uuid::new_v4());
    pending.mark_upsert(key);
    pending.mark_delete(key);
    assert_eq!(pending.op(&key), Some(WriteOp::Delete));

    pending.mark_upsert(key);
    assert_eq!(pending.op(&key), Some(WriteOp::Delete));
}

#[test]
fn same_id_different_kind_is_distinct() {
    let mut pending = PendingWrites::new();
    let id = Uuid::new_v4();
    pending.mark_upsert(EntityKey::person(id));
    pending.mark_upsert(EntityKey::sector(id));
    assert_eq!(pending.len(), 2);
}

#[test]
fn empty_map_is_quiet() {
    let pending = PendingWrites::new();
    assert!(pending.is_quiet(Instant::now(), Duration::from_millis(300)));
}

#[test]
fn drain_empties_and_orders_parents_first() {
    let mut pending = PendingWrites::new();
    let line = EntityKey::line(Uuid::new_v4());
    let person = EntityKey::person(Uuid::new_v4());
    let sector = EntityKey::sector(Uuid::new_v4());
    let gone = EntityKey::connection(Uuid::new_v4());
    pending.mark_upsert(line);
    pending.mark_upsert(person);
    pending.mark_upsert(sector);
    pending.mark_delete(gone);

    let batch = pending.drain();
    assert_eq!(batch.upserts, vec![sector, person, line]);
    assert_eq!(batch.deletes, vec![gone]);
    assert_eq!(batch.len(), 4);
    assert!(pending.is_empty());
    assert!(pending.is_quiet(Instant::now(), Duration::from_secs(3600)));
}

#[test]
fn rows_skip_missing_entities_and_group_deletes() {
    let mut doc = ChartDoc::new();
    let person = test_helpers::dummy_person(0.0, 0.0);
    let kept = person.id;
    doc.insert_person(person);

    let batch = WriteBatch {
        upserts: vec![EntityKey::person(kept), EntityKey::person(Uuid::new_v4())],
        deletes: vec![EntityKey::connection(Uuid::new_v4()), EntityKey::sector(Uuid::new_v4())],
    };
    let rows = batch.rows(&doc);
    assert_eq!(rows.people.len(), 1);
    assert_eq!(rows.people[0].id, kept);
    assert_eq!(rows.deleted_connections.len(), 1);
    assert_eq!(rows.deleted_sectors.len(), 1);
    assert_eq!(rows.len(), 3);
}

#[test]
fn empty_rows_report_empty() {
    assert!(FlushRows::default().is_empty());
}

// =============================================================================
// Debounce window
// =============================================================================

#[tokio::test(start_paused = true)]
async fn writes_wait_for_quiet_window() {
    let state = test_helpers::test_app_state();
    people::create_person(&state, new_person("Ana")).await.unwrap();

    assert!(take_ready_rows(&state, Instant::now()).await.is_none());
    tokio::time::advance(Duration::from_millis(299)).await;
    assert!(take_ready_rows(&state, Instant::now()).await.is_none());

    tokio::time::advance(Duration::from_millis(1)).await;
    let rows = take_ready_rows(&state, Instant::now()).await.unwrap();
    assert_eq!(rows.people.len(), 1);
    assert!(state.chart.read().await.pending.is_empty());
}

#[tokio::test(start_paused = true)]
async fn every_edit_restarts_the_window() {
    let state = test_helpers::test_app_state();
    let id = people::create_person(&state, new_person("Ana")).await.unwrap().id;

    // A drag: one move every 100ms for a second.
    for step in 1..=10 {
        tokio::time::advance(Duration::from_millis(100)).await;
        people::move_person(&state, id, f64::from(step) * 10.0, 0.0).await.unwrap();
        assert!(take_ready_rows(&state, Instant::now()).await.is_none());
    }

    tokio::time::advance(Duration::from_millis(300)).await;
    let rows = take_ready_rows(&state, Instant::now()).await.unwrap();
    assert_eq!(rows.people.len(), 1);
    assert!((rows.people[0].position_x - 100.0).abs() < f64::EPSILON);
}

#[tokio::test(start_paused = true)]
async fn batch_includes_every_touched_entity() {
    let state = test_helpers::test_app_state();
    let a = people::create_person(&state, new_person("Ana")).await.unwrap().id;
    let b = people::create_person(&state, new_person("Bia")).await.unwrap().id;
    people::move_person(&state, a, 5.0, 5.0).await.unwrap();
    people::move_person(&state, b, 9.0, 9.0).await.unwrap();

    tokio::time::advance(Duration::from_millis(300)).await;
    let rows = take_ready_rows(&state, Instant::now()).await.unwrap();
    assert_eq!(rows.people.len(), 2);
}

#[tokio::test]
async fn nothing_pending_is_not_ready() {
    let state = test_helpers::test_app_state();
    let later = Instant::now() + Duration::from_secs(10);
    assert!(take_ready_rows(&state, later).await.is_none());
}

#[tokio::test]
async fn flush_now_with_nothing_pending_writes_nothing() {
    let state = test_helpers::test_app_state();
    assert_eq!(flush_now(&state).await, 0);
}

// =============================================================================
// Background task
// =============================================================================

#[tokio::test(start_paused = true)]
async fn stop_signal_ends_task_and_leaves_pending_for_flush_now() {
    let state = test_helpers::test_app_state();
    people::create_person(&state, new_person("Ana")).await.unwrap();

    let (stop_tx, stop_rx) = watch::channel(false);
    let task = spawn_persistence_task(state.clone(), stop_rx);
    stop_tx.send(true).unwrap();
    task.await.unwrap();

    // The edit was still inside its window, so the task left it queued.
    assert_eq!(state.chart.read().await.pending.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn dropped_stop_sender_ends_task() {
    let state = test_helpers::test_app_state();
    let (stop_tx, stop_rx) = watch::channel(false);
    let task = spawn_persistence_task(state, stop_rx);
    drop(stop_tx);
    task.await.unwrap();
}
