//! Connection service: directed edges between cards.
//!
//! The document enforces the edge rules (no self-loops, known endpoints,
//! one edge per unordered pair); this service turns a refusal into
//! `Rejected` so callers can treat a duplicate as a no-op.

use canvas::doc::{Connection, DocError};
use tracing::{debug, info};
use uuid::Uuid;

use crate::services::persistence::EntityKey;
use crate::services::{ErrorCode, now_ms};
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("connection not found: {0}")]
    NotFound(Uuid),
    #[error("person not found: {0}")]
    PersonNotFound(Uuid),
    #[error("connection rejected: {0}")]
    Rejected(DocError),
}

impl ErrorCode for ConnectionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_CONNECTION_NOT_FOUND",
            Self::PersonNotFound(_) => "E_PERSON_NOT_FOUND",
            Self::Rejected(_) => "E_CONNECTION_INVALID",
        }
    }
}

/// Connections in creation order.
pub async fn list_connections(state: &AppState) -> Vec<Connection> {
    let chart = state.chart.read().await;
    chart.doc.connections_sorted().into_iter().cloned().collect()
}

/// Connect `from -> to`.
///
/// # Errors
///
/// Returns `PersonNotFound` for an unknown endpoint and `Rejected` for a
/// self-loop or a pair that is already connected in either direction.
pub async fn create_connection(state: &AppState, from: Uuid, to: Uuid) -> Result<Connection, ConnectionError> {
    let mut chart = state.chart.write().await;
    match chart.doc.can_connect(from, to) {
        Ok(()) => {}
        Err(DocError::PersonNotFound(id)) => return Err(ConnectionError::PersonNotFound(id)),
        Err(e) => {
            debug!(%from, %to, reason = %e, "connection refused");
            return Err(ConnectionError::Rejected(e));
        }
    }

    let conn = Connection { id: Uuid::new_v4(), from_person_id: from, to_person_id: to, created_at: now_ms() };
    chart.doc.add_connection(conn.clone()).map_err(ConnectionError::Rejected)?;
    chart.pending.mark_upsert(EntityKey::connection(conn.id));
    info!(connection_id = %conn.id, %from, %to, "connection created");
    Ok(conn)
}

/// # Errors
///
/// Returns `NotFound` if no connection has this id.
pub async fn delete_connection(state: &AppState, id: Uuid) -> Result<Connection, ConnectionError> {
    let mut chart = state.chart.write().await;
    let conn = chart.doc.remove_connection(&id).ok_or(ConnectionError::NotFound(id))?;
    chart.pending.mark_delete(EntityKey::connection(id));
    Ok(conn)
}

#[cfg(test)]
#[path = "connections_test.rs"]
mod tests;
