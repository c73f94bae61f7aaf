//! Sector routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use canvas::doc::{Sector, SectorPatch};
use serde::Serialize;
use uuid::Uuid;

use crate::routes::ApiError;
use crate::services::sectors::{self, NewSector, SectorError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DeletedSector {
    pub id: Uuid,
    pub detached_people: Vec<Uuid>,
}

pub(crate) fn sector_error_to_status(err: &SectorError) -> StatusCode {
    match err {
        SectorError::NotFound(_) => StatusCode::NOT_FOUND,
        SectorError::Invalid(_) => StatusCode::BAD_REQUEST,
    }
}

fn api_error(err: SectorError) -> ApiError {
    ApiError::new(sector_error_to_status(&err), &err)
}

/// `GET /api/sectors` — sorted by name.
pub async fn list_sectors(State(state): State<AppState>) -> Json<Vec<Sector>> {
    Json(sectors::list_sectors(&state).await)
}

/// `POST /api/sectors`.
pub async fn create_sector(
    State(state): State<AppState>,
    Json(body): Json<NewSector>,
) -> Result<(StatusCode, Json<Sector>), ApiError> {
    let sector = sectors::create_sector(&state, body).await.map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(sector)))
}

/// `PATCH /api/sectors/:id`.
pub async fn patch_sector(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<SectorPatch>,
) -> Result<Json<Sector>, ApiError> {
    sectors::update_sector(&state, id, patch).await.map(Json).map_err(api_error)
}

/// `DELETE /api/sectors/:id` — cards in the sector are kept and detached.
pub async fn delete_sector(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<DeletedSector>, ApiError> {
    let detached_people = sectors::delete_sector(&state, id).await.map_err(api_error)?;
    Ok(Json(DeletedSector { id, detached_people }))
}
