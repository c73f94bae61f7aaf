//! Sector service: named, colored groups of cards.
//!
//! Deleting a sector keeps its cards; they are detached (`sector_id` and
//! the copied sector name cleared) and rewritten.

use canvas::consts::DEFAULT_CARD_COLOR;
use canvas::doc::{Sector, SectorPatch};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::services::persistence::EntityKey;
use crate::services::{ErrorCode, clean_text, is_hex_color, now_ms};
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum SectorError {
    #[error("sector not found: {0}")]
    NotFound(Uuid),
    #[error("invalid sector: {0}")]
    Invalid(&'static str),
}

impl ErrorCode for SectorError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_SECTOR_NOT_FOUND",
            Self::Invalid(_) => "E_SECTOR_INVALID",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSector {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// Sectors sorted by name.
pub async fn list_sectors(state: &AppState) -> Vec<Sector> {
    let chart = state.chart.read().await;
    chart.doc.sectors_sorted().into_iter().cloned().collect()
}

/// # Errors
///
/// Returns `Invalid` for a blank name or a malformed color.
pub async fn create_sector(state: &AppState, new: NewSector) -> Result<Sector, SectorError> {
    let name = clean_text(&new.name).ok_or(SectorError::Invalid("name is required"))?;
    let color = new.color.unwrap_or_else(|| DEFAULT_CARD_COLOR.to_owned());
    if !is_hex_color(&color) {
        return Err(SectorError::Invalid("color must be #RRGGBB"));
    }

    let sector = Sector { id: Uuid::new_v4(), name, color, created_at: now_ms() };
    let mut chart = state.chart.write().await;
    chart.doc.insert_sector(sector.clone());
    chart.pending.mark_upsert(EntityKey::sector(sector.id));
    info!(sector_id = %sector.id, name = %sector.name, "sector created");
    Ok(sector)
}

/// Rename or recolor a sector. A rename is copied onto its cards.
///
/// # Errors
///
/// Returns `NotFound` or `Invalid`.
pub async fn update_sector(state: &AppState, id: Uuid, patch: SectorPatch) -> Result<Sector, SectorError> {
    let mut patch = patch;
    if let Some(name) = &patch.name {
        patch.name = Some(clean_text(name).ok_or(SectorError::Invalid("name is required"))?);
    }
    if patch.color.as_deref().is_some_and(|c| !is_hex_color(c)) {
        return Err(SectorError::Invalid("color must be #RRGGBB"));
    }

    let mut chart = state.chart.write().await;
    if !chart.doc.apply_sector_patch(&id, &patch) {
        return Err(SectorError::NotFound(id));
    }
    chart.pending.mark_upsert(EntityKey::sector(id));

    if let Some(name) = &patch.name {
        let members: Vec<Uuid> = chart.doc.people_in_sector(Some(id)).iter().map(|p| p.id).collect();
        let now = now_ms();
        for pid in members {
            if let Some(p) = chart.doc.person_mut(&pid) {
                p.sector.clone_from(name);
                p.updated_at = now;
            }
            chart.pending.mark_upsert(EntityKey::person(pid));
        }
    }

    chart.doc.sector(&id).cloned().ok_or(SectorError::NotFound(id))
}

/// Delete a sector and detach its cards. Returns the ids of the detached cards.
///
/// # Errors
///
/// Returns `NotFound` if no sector has this id.
pub async fn delete_sector(state: &AppState, id: Uuid) -> Result<Vec<Uuid>, SectorError> {
    let mut chart = state.chart.write().await;
    let (_, detached) = chart.doc.remove_sector(&id).ok_or(SectorError::NotFound(id))?;
    let now = now_ms();
    for pid in &detached {
        if let Some(p) = chart.doc.person_mut(pid) {
            p.sector.clear();
            p.updated_at = now;
        }
        chart.pending.mark_upsert(EntityKey::person(*pid));
    }
    chart.pending.mark_delete(EntityKey::sector(id));
    info!(sector_id = %id, detached = detached.len(), "sector deleted");
    Ok(detached)
}

#[cfg(test)]
#[path = "sectors_test.rs"]
mod tests;
