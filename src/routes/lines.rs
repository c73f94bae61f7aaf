//! Decorative line routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use canvas::doc::{DecorativeLine, LinePatch};
use uuid::Uuid;

use crate::routes::ApiError;
use crate::services::lines::{self, LineError, NewLine};
use crate::state::AppState;

pub(crate) fn line_error_to_status(err: &LineError) -> StatusCode {
    match err {
        LineError::NotFound(_) => StatusCode::NOT_FOUND,
        LineError::Invalid(_) => StatusCode::BAD_REQUEST,
    }
}

fn api_error(err: LineError) -> ApiError {
    ApiError::new(line_error_to_status(&err), &err)
}

/// `GET /api/lines`.
pub async fn list_lines(State(state): State<AppState>) -> Json<Vec<DecorativeLine>> {
    Json(lines::list_lines(&state).await)
}

/// `POST /api/lines`.
pub async fn create_line(
    State(state): State<AppState>,
    Json(body): Json<NewLine>,
) -> Result<(StatusCode, Json<DecorativeLine>), ApiError> {
    let line = lines::create_line(&state, body).await.map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(line)))
}

/// `PATCH /api/lines/:id` — move endpoints or restyle.
pub async fn patch_line(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<LinePatch>,
) -> Result<Json<DecorativeLine>, ApiError> {
    lines::update_line(&state, id, patch).await.map(Json).map_err(api_error)
}

/// `DELETE /api/lines/:id`.
pub async fn delete_line(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    lines::delete_line(&state, id).await.map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}
