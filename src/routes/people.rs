//! People routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use canvas::doc::{Person, PersonPatch};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::routes::ApiError;
use crate::services::people::{self, NewPerson, PersonError, PersonMove};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListPeopleQuery {
    pub sector_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct PositionBody {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Serialize)]
pub struct DeletedPerson {
    pub id: Uuid,
    pub removed_connections: Vec<Uuid>,
}

pub(crate) fn person_error_to_status(err: &PersonError) -> StatusCode {
    match err {
        PersonError::NotFound(_) => StatusCode::NOT_FOUND,
        PersonError::Locked(_) => StatusCode::CONFLICT,
        PersonError::SectorNotFound(_) | PersonError::Invalid(_) => StatusCode::BAD_REQUEST,
    }
}

fn api_error(err: PersonError) -> ApiError {
    ApiError::new(person_error_to_status(&err), &err)
}

/// `GET /api/people?sector_id=` — cards in draw order.
pub async fn list_people(State(state): State<AppState>, Query(query): Query<ListPeopleQuery>) -> Json<Vec<Person>> {
    Json(people::list_people(&state, query.sector_id).await)
}

/// `POST /api/people` — create a card.
pub async fn create_person(
    State(state): State<AppState>,
    Json(body): Json<NewPerson>,
) -> Result<(StatusCode, Json<Person>), ApiError> {
    let person = people::create_person(&state, body).await.map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(person)))
}

/// `GET /api/people/:id`.
pub async fn get_person(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Person>, ApiError> {
    people::get_person(&state, id).await.map(Json).map_err(api_error)
}

/// `PATCH /api/people/:id` — sparse edit.
pub async fn patch_person(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<PersonPatch>,
) -> Result<Json<Person>, ApiError> {
    people::update_person(&state, id, patch).await.map(Json).map_err(api_error)
}

/// `PUT /api/people/:id/position` — drag update, persisted after the debounce window.
pub async fn move_person(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PositionBody>,
) -> Result<Json<Person>, ApiError> {
    people::move_person(&state, id, body.x, body.y).await.map(Json).map_err(api_error)
}

/// `PUT /api/people/positions` — multi-card drag update.
pub async fn move_people(
    State(state): State<AppState>,
    Json(moves): Json<Vec<PersonMove>>,
) -> Result<Json<Vec<Person>>, ApiError> {
    people::move_people(&state, &moves).await.map(Json).map_err(api_error)
}

/// `DELETE /api/people/:id` — delete a card and its connections.
pub async fn delete_person(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<DeletedPerson>, ApiError> {
    let (person, connections) = people::delete_person(&state, id).await.map_err(api_error)?;
    Ok(Json(DeletedPerson { id: person.id, removed_connections: connections.into_iter().map(|c| c.id).collect() }))
}
