//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! JSON-over-HTTP API for the single shared chart. Every handler goes
//! through a service, which mutates the in-memory chart and queues the
//! debounced write; handlers only parse input and map errors to statuses.

pub mod chart;
pub mod connections;
pub mod lines;
pub mod people;
pub mod sectors;

use std::fmt::Display;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, patch, put};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::services::ErrorCode;
use crate::state::AppState;

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/chart", get(chart::get_chart))
        .route("/api/people", get(people::list_people).post(people::create_person))
        .route("/api/people/positions", put(people::move_people))
        .route(
            "/api/people/{id}",
            get(people::get_person)
                .patch(people::patch_person)
                .delete(people::delete_person),
        )
        .route("/api/people/{id}/position", put(people::move_person))
        .route(
            "/api/connections",
            get(connections::list_connections).post(connections::create_connection),
        )
        .route("/api/connections/{id}", delete(connections::delete_connection))
        .route("/api/sectors", get(sectors::list_sectors).post(sectors::create_sector))
        .route("/api/sectors/{id}", patch(sectors::patch_sector).delete(sectors::delete_sector))
        .route("/api/lines", get(lines::list_lines).post(lines::create_line))
        .route("/api/lines/{id}", patch(lines::patch_line).delete(lines::delete_line))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

// =============================================================================
// ERROR RESPONSES
// =============================================================================

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

/// A service error rendered as `{ "code", "message" }` with a status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new<E: ErrorCode + Display>(status: StatusCode, err: &E) -> Self {
        Self { status, body: ErrorBody { code: err.error_code(), message: err.to_string() } }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.body.code, message = %self.body.message, "request failed");
        }
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
