//! Document model: people, connections, sectors, decorative lines, and the
//! in-memory chart store.
//!
//! This module defines the entities drawn on the canvas, sparse-update types
//! for incremental edits (`PersonPatch`, `SectorPatch`, `LinePatch`), and the
//! runtime store that owns all live entities (`ChartDoc`).
//!
//! The store is the single place that enforces the connection rules: no
//! self-loops, no edge to an unknown card, and at most one edge per unordered
//! pair of cards. Removing a card removes every edge touching it; removing a
//! sector detaches the cards tagged with it.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::consts::{CARD_LARGE, CARD_MEDIUM, CARD_SMALL};

pub type PersonId = Uuid;
pub type ConnectionId = Uuid;
pub type SectorId = Uuid;
pub type LineId = Uuid;

/// Errors raised by store mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocError {
    #[error("person not found: {0}")]
    PersonNotFound(PersonId),
    #[error("person is locked: {0}")]
    PersonLocked(PersonId),
    #[error("connection not found: {0}")]
    ConnectionNotFound(ConnectionId),
    #[error("sector not found: {0}")]
    SectorNotFound(SectorId),
    #[error("line not found: {0}")]
    LineNotFound(LineId),
    #[error("cannot connect a card to itself: {0}")]
    SelfConnection(PersonId),
    #[error("cards already connected: {from} <-> {to}")]
    DuplicateConnection { from: PersonId, to: PersonId },
}

/// Display size of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl CardSize {
    /// Full `(width, height)` in world units.
    #[must_use]
    pub fn dimensions(self) -> (f64, f64) {
        match self {
            Self::Small => CARD_SMALL,
            Self::Medium => CARD_MEDIUM,
            Self::Large => CARD_LARGE,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "small" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            "large" => Some(Self::Large),
            _ => None,
        }
    }
}

/// A card on the chart. The position is the card's center point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    /// Role or free-form observations shown under the name.
    pub role: String,
    /// Free-text sector label shown on the card.
    pub sector: String,
    pub sector_id: Option<SectorId>,
    pub color: String,
    pub avatar_url: Option<String>,
    pub position_x: f64,
    pub position_y: f64,
    pub card_size: CardSize,
    /// Solid fill when true, outline only when false.
    pub fill_card: bool,
    /// Locked cards cannot be dragged or deleted from the canvas.
    pub locked: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

/// A directed edge between two cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub from_person_id: PersonId,
    pub to_person_id: PersonId,
    pub created_at: i64,
}

impl Connection {
    /// Whether this edge touches `person`.
    #[must_use]
    pub fn touches(&self, person: PersonId) -> bool {
        self.from_person_id == person || self.to_person_id == person
    }

    /// Whether this edge joins `a` and `b` in either direction.
    #[must_use]
    pub fn joins(&self, a: PersonId, b: PersonId) -> bool {
        (self.from_person_id == a && self.to_person_id == b) || (self.from_person_id == b && self.to_person_id == a)
    }
}

/// A named, colored grouping tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
    pub id: SectorId,
    pub name: String,
    pub color: String,
    pub created_at: i64,
}

/// A free annotation line, independent of the cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecorativeLine {
    pub id: LineId,
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
    pub color: String,
    pub stroke_width: f64,
    pub created_at: i64,
}

/// Distinguish an absent field from an explicit `null` in sparse updates.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Sparse update for a person. Only present fields are applied.
///
/// `sector_id` and `avatar_url` are nullable: `Some(None)` clears them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub sector_id: Option<Option<SectorId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_size: Option<CardSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_card: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
}

/// Sparse update for a sector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Sparse update for a decorative line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
}

impl LinePatch {
    /// Patch that moves both endpoints.
    #[must_use]
    pub fn endpoints(start_x: f64, start_y: f64, end_x: f64, end_y: f64) -> Self {
        Self {
            start_x: Some(start_x),
            start_y: Some(start_y),
            end_x: Some(end_x),
            end_y: Some(end_y),
            ..Default::default()
        }
    }
}

/// Full chart contents, as loaded from storage or sent to a client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSnapshot {
    pub people: Vec<Person>,
    pub connections: Vec<Connection>,
    pub sectors: Vec<Sector>,
    pub lines: Vec<DecorativeLine>,
}

/// In-memory store of every chart entity.
#[derive(Debug, Clone, Default)]
pub struct ChartDoc {
    people: HashMap<PersonId, Person>,
    connections: HashMap<ConnectionId, Connection>,
    sectors: HashMap<SectorId, Sector>,
    lines: HashMap<LineId, DecorativeLine>,
}

impl ChartDoc {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all entities with a full snapshot.
    ///
    /// Connections that violate the edge rules (dangling, self-loop, or a
    /// second edge for the same pair) are skipped.
    pub fn load_snapshot(&mut self, snapshot: ChartSnapshot) {
        self.people = snapshot.people.into_iter().map(|p| (p.id, p)).collect();
        self.sectors = snapshot.sectors.into_iter().map(|s| (s.id, s)).collect();
        self.lines = snapshot.lines.into_iter().map(|l| (l.id, l)).collect();
        self.connections.clear();
        let mut connections = snapshot.connections;
        connections.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        for conn in connections {
            if self.can_connect(conn.from_person_id, conn.to_person_id).is_ok() {
                self.connections.insert(conn.id, conn);
            }
        }
    }

    /// Clone every entity out in display order.
    #[must_use]
    pub fn snapshot(&self) -> ChartSnapshot {
        ChartSnapshot {
            people: self.people_sorted().into_iter().cloned().collect(),
            connections: self.connections_sorted().into_iter().cloned().collect(),
            sectors: self.sectors_sorted().into_iter().cloned().collect(),
            lines: self.lines_sorted().into_iter().cloned().collect(),
        }
    }

    // --- People ---

    /// Insert or replace a person.
    pub fn insert_person(&mut self, person: Person) {
        self.people.insert(person.id, person);
    }

    #[must_use]
    pub fn person(&self, id: &PersonId) -> Option<&Person> {
        self.people.get(id)
    }

    pub fn person_mut(&mut self, id: &PersonId) -> Option<&mut Person> {
        self.people.get_mut(id)
    }

    /// People in draw order: `(created_at, id)`. Later cards draw on top.
    #[must_use]
    pub fn people_sorted(&self) -> Vec<&Person> {
        let mut people: Vec<&Person> = self.people.values().collect();
        people.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        people
    }

    /// People matching a sector filter, in draw order. `None` matches everyone.
    #[must_use]
    pub fn people_in_sector(&self, filter: Option<SectorId>) -> Vec<&Person> {
        self.people_sorted()
            .into_iter()
            .filter(|p| matches_sector(p, filter))
            .collect()
    }

    /// Apply a sparse update. Returns false if the person doesn't exist.
    pub fn apply_person_patch(&mut self, id: &PersonId, patch: &PersonPatch) -> bool {
        let Some(person) = self.people.get_mut(id) else {
            return false;
        };
        if let Some(name) = &patch.name {
            person.name.clone_from(name);
        }
        if let Some(role) = &patch.role {
            person.role.clone_from(role);
        }
        if let Some(sector) = &patch.sector {
            person.sector.clone_from(sector);
        }
        if let Some(sector_id) = patch.sector_id {
            person.sector_id = sector_id;
        }
        if let Some(color) = &patch.color {
            person.color.clone_from(color);
        }
        if let Some(avatar_url) = &patch.avatar_url {
            person.avatar_url.clone_from(avatar_url);
        }
        if let Some(x) = patch.position_x {
            person.position_x = x;
        }
        if let Some(y) = patch.position_y {
            person.position_y = y;
        }
        if let Some(size) = patch.card_size {
            person.card_size = size;
        }
        if let Some(fill) = patch.fill_card {
            person.fill_card = fill;
        }
        if let Some(locked) = patch.locked {
            person.locked = locked;
        }
        true
    }

    /// Move a card's center. Locked cards are refused.
    ///
    /// # Errors
    ///
    /// Returns `PersonNotFound` or `PersonLocked`.
    pub fn move_person(&mut self, id: &PersonId, x: f64, y: f64) -> Result<&Person, DocError> {
        let person = self.people.get_mut(id).ok_or(DocError::PersonNotFound(*id))?;
        if person.locked {
            return Err(DocError::PersonLocked(*id));
        }
        person.position_x = x;
        person.position_y = y;
        Ok(person)
    }

    /// Remove a person and every connection that referenced it.
    pub fn remove_person(&mut self, id: &PersonId) -> Option<(Person, Vec<Connection>)> {
        let person = self.people.remove(id)?;
        let dropped: Vec<ConnectionId> = self
            .connections
            .values()
            .filter(|c| c.touches(*id))
            .map(|c| c.id)
            .collect();
        let removed = dropped
            .iter()
            .filter_map(|cid| self.connections.remove(cid))
            .collect();
        Some((person, removed))
    }

    // --- Connections ---

    /// Check whether a new edge `from -> to` would be allowed.
    ///
    /// # Errors
    ///
    /// Returns `SelfConnection`, `PersonNotFound` for an unknown endpoint, or
    /// `DuplicateConnection` when the pair is already joined in either direction.
    pub fn can_connect(&self, from: PersonId, to: PersonId) -> Result<(), DocError> {
        if from == to {
            return Err(DocError::SelfConnection(from));
        }
        for id in [from, to] {
            if !self.people.contains_key(&id) {
                return Err(DocError::PersonNotFound(id));
            }
        }
        if self.connections.values().any(|c| c.joins(from, to)) {
            return Err(DocError::DuplicateConnection { from, to });
        }
        Ok(())
    }

    /// Insert a connection if the edge rules allow it.
    ///
    /// # Errors
    ///
    /// Propagates the rejection from [`ChartDoc::can_connect`].
    pub fn add_connection(&mut self, conn: Connection) -> Result<(), DocError> {
        self.can_connect(conn.from_person_id, conn.to_person_id)?;
        self.connections.insert(conn.id, conn);
        Ok(())
    }

    #[must_use]
    pub fn connection(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    pub fn remove_connection(&mut self, id: &ConnectionId) -> Option<Connection> {
        self.connections.remove(id)
    }

    /// Connections in creation order.
    #[must_use]
    pub fn connections_sorted(&self) -> Vec<&Connection> {
        let mut conns: Vec<&Connection> = self.connections.values().collect();
        conns.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        conns
    }

    /// Every edge touching `person`.
    #[must_use]
    pub fn connections_for(&self, person: PersonId) -> Vec<&Connection> {
        self.connections_sorted()
            .into_iter()
            .filter(|c| c.touches(person))
            .collect()
    }

    // --- Sectors ---

    pub fn insert_sector(&mut self, sector: Sector) {
        self.sectors.insert(sector.id, sector);
    }

    #[must_use]
    pub fn sector(&self, id: &SectorId) -> Option<&Sector> {
        self.sectors.get(id)
    }

    pub fn sector_mut(&mut self, id: &SectorId) -> Option<&mut Sector> {
        self.sectors.get_mut(id)
    }

    /// Sectors sorted by name, case-insensitive.
    #[must_use]
    pub fn sectors_sorted(&self) -> Vec<&Sector> {
        let mut sectors: Vec<&Sector> = self.sectors.values().collect();
        sectors.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        sectors
    }

    pub fn apply_sector_patch(&mut self, id: &SectorId, patch: &SectorPatch) -> bool {
        let Some(sector) = self.sectors.get_mut(id) else {
            return false;
        };
        if let Some(name) = &patch.name {
            sector.name.clone_from(name);
        }
        if let Some(color) = &patch.color {
            sector.color.clone_from(color);
        }
        true
    }

    /// Remove a sector and detach every card tagged with it.
    /// Returns the sector and the ids of the detached cards.
    pub fn remove_sector(&mut self, id: &SectorId) -> Option<(Sector, Vec<PersonId>)> {
        let sector = self.sectors.remove(id)?;
        let mut detached = Vec::new();
        for person in self.people.values_mut() {
            if person.sector_id == Some(*id) {
                person.sector_id = None;
                detached.push(person.id);
            }
        }
        detached.sort();
        Some((sector, detached))
    }

    // --- Decorative lines ---

    pub fn insert_line(&mut self, line: DecorativeLine) {
        self.lines.insert(line.id, line);
    }

    #[must_use]
    pub fn line(&self, id: &LineId) -> Option<&DecorativeLine> {
        self.lines.get(id)
    }

    /// Lines in draw order: `(created_at, id)`.
    #[must_use]
    pub fn lines_sorted(&self) -> Vec<&DecorativeLine> {
        let mut lines: Vec<&DecorativeLine> = self.lines.values().collect();
        lines.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        lines
    }

    pub fn apply_line_patch(&mut self, id: &LineId, patch: &LinePatch) -> bool {
        let Some(line) = self.lines.get_mut(id) else {
            return false;
        };
        if let Some(v) = patch.start_x {
            line.start_x = v;
        }
        if let Some(v) = patch.start_y {
            line.start_y = v;
        }
        if let Some(v) = patch.end_x {
            line.end_x = v;
        }
        if let Some(v) = patch.end_y {
            line.end_y = v;
        }
        if let Some(color) = &patch.color {
            line.color.clone_from(color);
        }
        if let Some(w) = patch.stroke_width {
            line.stroke_width = w;
        }
        true
    }

    pub fn remove_line(&mut self, id: &LineId) -> Option<DecorativeLine> {
        self.lines.remove(id)
    }

    // --- Counts ---

    #[must_use]
    pub fn people_len(&self) -> usize {
        self.people.len()
    }

    #[must_use]
    pub fn connections_len(&self) -> usize {
        self.connections.len()
    }

    /// Returns `true` if the store holds no entities at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.people.is_empty() && self.connections.is_empty() && self.sectors.is_empty() && self.lines.is_empty()
    }
}

/// Whether a person passes a sector filter. `None` matches everyone.
#[must_use]
pub fn matches_sector(person: &Person, filter: Option<SectorId>) -> bool {
    filter.is_none_or(|sector| person.sector_id == Some(sector))
}
