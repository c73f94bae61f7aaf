//! Whole-chart snapshot, used by clients on load.

use axum::extract::State;
use axum::response::Json;
use canvas::doc::ChartSnapshot;

use crate::state::AppState;

/// `GET /api/chart` — every person, connection, sector, and line.
pub async fn get_chart(State(state): State<AppState>) -> Json<ChartSnapshot> {
    let chart = state.chart.read().await;
    Json(chart.doc.snapshot())
}
