//! Decorative line service. Lines are free strokes with no link to cards.

use canvas::consts::{DEFAULT_LINE_COLOR, DEFAULT_LINE_STROKE_WIDTH};
use canvas::doc::{DecorativeLine, LinePatch};
use serde::Deserialize;
use uuid::Uuid;

use crate::services::persistence::EntityKey;
use crate::services::{ErrorCode, is_hex_color, now_ms};
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error("line not found: {0}")]
    NotFound(Uuid),
    #[error("invalid line: {0}")]
    Invalid(&'static str),
}

impl ErrorCode for LineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_LINE_NOT_FOUND",
            Self::Invalid(_) => "E_LINE_INVALID",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLine {
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub stroke_width: Option<f64>,
}

fn check_patch(patch: &LinePatch) -> Result<(), LineError> {
    let coords = [patch.start_x, patch.start_y, patch.end_x, patch.end_y];
    if coords.iter().flatten().any(|v| !v.is_finite()) {
        return Err(LineError::Invalid("coordinates must be finite"));
    }
    if patch.stroke_width.is_some_and(|w| !w.is_finite() || w <= 0.0) {
        return Err(LineError::Invalid("stroke width must be positive"));
    }
    if patch.color.as_deref().is_some_and(|c| !is_hex_color(c)) {
        return Err(LineError::Invalid("color must be #RRGGBB"));
    }
    Ok(())
}

/// Lines in draw order.
pub async fn list_lines(state: &AppState) -> Vec<DecorativeLine> {
    let chart = state.chart.read().await;
    chart.doc.lines_sorted().into_iter().cloned().collect()
}

/// # Errors
///
/// Returns `Invalid` for non-finite coordinates, a bad stroke width, or a bad color.
pub async fn create_line(state: &AppState, new: NewLine) -> Result<DecorativeLine, LineError> {
    let line = DecorativeLine {
        id: Uuid::new_v4(),
        start_x: new.start_x,
        start_y: new.start_y,
        end_x: new.end_x,
        end_y: new.end_y,
        color: new.color.unwrap_or_else(|| DEFAULT_LINE_COLOR.to_owned()),
        stroke_width: new.stroke_width.unwrap_or(DEFAULT_LINE_STROKE_WIDTH),
        created_at: now_ms(),
    };
    check_patch(&LinePatch {
        color: Some(line.color.clone()),
        stroke_width: Some(line.stroke_width),
        ..LinePatch::endpoints(line.start_x, line.start_y, line.end_x, line.end_y)
    })?;

    let mut chart = state.chart.write().await;
    chart.doc.insert_line(line.clone());
    chart.pending.mark_upsert(EntityKey::line(line.id));
    Ok(line)
}

/// Move or restyle a line. Endpoint drags call this on every pointer move.
///
/// # Errors
///
/// Returns `NotFound` or `Invalid`.
pub async fn update_line(state: &AppState, id: Uuid, patch: LinePatch) -> Result<DecorativeLine, LineError> {
    check_patch(&patch)?;
    let mut chart = state.chart.write().await;
    if !chart.doc.apply_line_patch(&id, &patch) {
        return Err(LineError::NotFound(id));
    }
    chart.pending.mark_upsert(EntityKey::line(id));
    chart.doc.line(&id).cloned().ok_or(LineError::NotFound(id))
}

/// # Errors
///
/// Returns `NotFound` if no line has this id.
pub async fn delete_line(state: &AppState, id: Uuid) -> Result<DecorativeLine, LineError> {
    let mut chart = state.chart.write().await;
    let line = chart.doc.remove_line(&id).ok_or(LineError::NotFound(id))?;
    chart.pending.mark_delete(EntityKey::line(id));
    Ok(line)
}

#[cfg(test)]
#[path = "lines_test.rs"]
mod tests;
