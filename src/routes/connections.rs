//! Connection routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use canvas::doc::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::routes::ApiError;
use crate::services::connections::{self, ConnectionError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateConnectionBody {
    pub from_person_id: Uuid,
    pub to_person_id: Uuid,
}

pub(crate) fn connection_error_to_status(err: &ConnectionError) -> StatusCode {
    match err {
        ConnectionError::NotFound(_) => StatusCode::NOT_FOUND,
        ConnectionError::PersonNotFound(_) => StatusCode::BAD_REQUEST,
        ConnectionError::Rejected(_) => StatusCode::CONFLICT,
    }
}

fn api_error(err: ConnectionError) -> ApiError {
    ApiError::new(connection_error_to_status(&err), &err)
}

/// `GET /api/connections`.
pub async fn list_connections(State(state): State<AppState>) -> Json<Vec<Connection>> {
    Json(connections::list_connections(&state).await)
}

/// `POST /api/connections` — 409 when the pair is already connected or is a self-loop.
pub async fn create_connection(
    State(state): State<AppState>,
    Json(body): Json<CreateConnectionBody>,
) -> Result<(StatusCode, Json<Connection>), ApiError> {
    let conn = connections::create_connection(&state, body.from_person_id, body.to_person_id)
        .await
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(conn)))
}

/// `DELETE /api/connections/:id`.
pub async fn delete_connection(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    connections::delete_connection(&state, id).await.map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}
