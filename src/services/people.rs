//! People service: cards on the chart.
//!
//! DESIGN
//! ======
//! Mutations update the in-memory document immediately and mark the card
//! for debounced persistence, so a drag that reports every pointer move
//! still produces one database write. Deleting a card removes its
//! connections in the same step and records their deletes too.

use canvas::consts::DEFAULT_CARD_COLOR;
use canvas::doc::{CardSize, Connection, DocError, Person, PersonPatch};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::services::persistence::EntityKey;
use crate::services::{ErrorCode, clean_text, is_hex_color, now_ms};
use crate::state::AppState;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PersonError {
    #[error("person not found: {0}")]
    NotFound(Uuid),
    #[error("person is locked: {0}")]
    Locked(Uuid),
    #[error("sector not found: {0}")]
    SectorNotFound(Uuid),
    #[error("invalid person: {0}")]
    Invalid(&'static str),
}

impl ErrorCode for PersonError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_PERSON_NOT_FOUND",
            Self::Locked(_) => "E_PERSON_LOCKED",
            Self::SectorNotFound(_) => "E_SECTOR_NOT_FOUND",
            Self::Invalid(_) => "E_PERSON_INVALID",
        }
    }
}

fn locked_or_missing(err: DocError, id: Uuid) -> PersonError {
    match err {
        DocError::PersonLocked(_) => PersonError::Locked(id),
        _ => PersonError::NotFound(id),
    }
}

/// Fields accepted when creating a card. Everything but the name is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPerson {
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub sector_id: Option<Uuid>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub position_x: f64,
    #[serde(default)]
    pub position_y: f64,
    #[serde(default)]
    pub card_size: CardSize,
    #[serde(default = "default_fill_card")]
    pub fill_card: bool,
    #[serde(default)]
    pub locked: bool,
}

fn default_fill_card() -> bool {
    true
}

/// One entry of a batch move.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PersonMove {
    pub id: Uuid,
    pub x: f64,
    pub y: f64,
}

fn check_position(x: f64, y: f64) -> Result<(), PersonError> {
    if x.is_finite() && y.is_finite() {
        Ok(())
    } else {
        Err(PersonError::Invalid("position must be finite"))
    }
}

fn check_color(color: &str) -> Result<(), PersonError> {
    if is_hex_color(color) {
        Ok(())
    } else {
        Err(PersonError::Invalid("color must be #RRGGBB"))
    }
}

// =============================================================================
// QUERIES
// =============================================================================

/// People in draw order, optionally limited to one sector.
pub async fn list_people(state: &AppState, sector: Option<Uuid>) -> Vec<Person> {
    let chart = state.chart.read().await;
    chart.doc.people_in_sector(sector).into_iter().cloned().collect()
}

/// # Errors
///
/// Returns `NotFound` if no card has this id.
pub async fn get_person(state: &AppState, id: Uuid) -> Result<Person, PersonError> {
    let chart = state.chart.read().await;
    chart.doc.person(&id).cloned().ok_or(PersonError::NotFound(id))
}

// =============================================================================
// CREATE / UPDATE
// =============================================================================

/// Create a card. The sector name is copied from `sector_id` when given.
///
/// # Errors
///
/// Returns `Invalid` for a blank name, bad color, or non-finite position,
/// and `SectorNotFound` for an unknown sector.
pub async fn create_person(state: &AppState, new: NewPerson) -> Result<Person, PersonError> {
    let name = clean_text(&new.name).ok_or(PersonError::Invalid("name is required"))?;
    check_position(new.position_x, new.position_y)?;
    let color = new.color.unwrap_or_else(|| DEFAULT_CARD_COLOR.to_owned());
    check_color(&color)?;

    let mut chart = state.chart.write().await;
    let sector = match new.sector_id {
        Some(sid) => chart.doc.sector(&sid).map(|s| s.name.clone()).ok_or(PersonError::SectorNotFound(sid))?,
        None => String::new(),
    };

    let now = now_ms();
    let person = Person {
        id: Uuid::new_v4(),
        name,
        role: new.role.trim().to_owned(),
        sector,
        sector_id: new.sector_id,
        color,
        avatar_url: new.avatar_url.filter(|u| !u.trim().is_empty()),
        position_x: new.position_x,
        position_y: new.position_y,
        card_size: new.card_size,
        fill_card: new.fill_card,
        locked: new.locked,
        created_at: now,
        updated_at: now,
    };

    chart.pending.mark_upsert(EntityKey::person(person.id));
    chart.doc.insert_person(person.clone());
    info!(person_id = %person.id, name = %person.name, "person created");
    Ok(person)
}

/// Apply a sparse edit. Changing `sector_id` also refreshes the sector name.
///
/// # Errors
///
/// Returns `NotFound`, `Locked` when a locked card would move,
/// `SectorNotFound`, or `Invalid` for bad field values.
pub async fn update_person(state: &AppState, id: Uuid, patch: PersonPatch) -> Result<Person, PersonError> {
    let mut patch = patch;
    if let Some(name) = &patch.name {
        patch.name = Some(clean_text(name).ok_or(PersonError::Invalid("name is required"))?);
    }
    if let Some(color) = &patch.color {
        check_color(color)?;
    }
    check_position(patch.position_x.unwrap_or(0.0), patch.position_y.unwrap_or(0.0))?;

    let mut chart = state.chart.write().await;
    let Some(current) = chart.doc.person(&id) else {
        return Err(PersonError::NotFound(id));
    };
    // A locked card keeps its position unless the same patch unlocks it.
    let moves = patch.position_x.is_some() || patch.position_y.is_some();
    if moves && current.locked && patch.locked != Some(false) {
        return Err(PersonError::Locked(id));
    }
    match patch.sector_id {
        Some(Some(sid)) => {
            let name = chart.doc.sector(&sid).map(|s| s.name.clone()).ok_or(PersonError::SectorNotFound(sid))?;
            patch.sector = Some(name);
        }
        Some(None) => patch.sector = Some(String::new()),
        None => {}
    }

    chart.doc.apply_person_patch(&id, &patch);
    let person = chart.doc.person_mut(&id).ok_or(PersonError::NotFound(id))?;
    person.updated_at = now_ms();
    let updated = person.clone();
    chart.pending.mark_upsert(EntityKey::person(id));
    Ok(updated)
}

// =============================================================================
// MOVE
// =============================================================================

/// Move one card. Called for every drag event; the write is debounced.
///
/// # Errors
///
/// Returns `NotFound`, `Locked`, or `Invalid` for a non-finite position.
pub async fn move_person(state: &AppState, id: Uuid, x: f64, y: f64) -> Result<Person, PersonError> {
    check_position(x, y)?;
    let mut chart = state.chart.write().await;
    chart.doc.move_person(&id, x, y).map_err(|e| locked_or_missing(e, id))?;
    let person = chart.doc.person_mut(&id).ok_or(PersonError::NotFound(id))?;
    person.updated_at = now_ms();
    let moved = person.clone();
    chart.pending.mark_upsert(EntityKey::person(id));
    Ok(moved)
}

/// Move several cards at once (multi-selection drag). All or nothing.
///
/// # Errors
///
/// Fails on the first unknown, locked, or non-finite entry without moving anything.
pub async fn move_people(state: &AppState, moves: &[PersonMove]) -> Result<Vec<Person>, PersonError> {
    for m in moves {
        check_position(m.x, m.y)?;
    }

    let mut chart = state.chart.write().await;
    for m in moves {
        match chart.doc.person(&m.id) {
            None => return Err(PersonError::NotFound(m.id)),
            Some(p) if p.locked => return Err(PersonError::Locked(m.id)),
            Some(_) => {}
        }
    }

    let now = now_ms();
    let mut moved = Vec::with_capacity(moves.len());
    for m in moves {
        chart.doc.move_person(&m.id, m.x, m.y).map_err(|e| locked_or_missing(e, m.id))?;
        if let Some(p) = chart.doc.person_mut(&m.id) {
            p.updated_at = now;
            moved.push(p.clone());
        }
        chart.pending.mark_upsert(EntityKey::person(m.id));
    }
    Ok(moved)
}

// =============================================================================
// DELETE
// =============================================================================

/// Delete a card and every connection touching it.
///
/// Returns the removed card and the removed connections.
///
/// # Errors
///
/// Returns `NotFound` if no card has this id.
pub async fn delete_person(state: &AppState, id: Uuid) -> Result<(Person, Vec<Connection>), PersonError> {
    let mut chart = state.chart.write().await;
    let (person, connections) = chart.doc.remove_person(&id).ok_or(PersonError::NotFound(id))?;
    for conn in &connections {
        chart.pending.mark_delete(EntityKey::connection(conn.id));
    }
    chart.pending.mark_delete(EntityKey::person(id));
    info!(person_id = %id, connections = connections.len(), "person deleted");
    Ok((person, connections))
}

#[cfg(test)]
#[path = "people_test.rs"]
mod tests;
