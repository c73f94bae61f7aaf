//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the database pool, the runtime config, and the single live
//! chart: the in-memory document plus the pending-write map the
//! persistence task drains. Handlers mutate the document under the write
//! lock and never touch Postgres directly.

use std::sync::Arc;

use canvas::doc::ChartDoc;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::config::AppConfig;
use crate::services::persistence::PendingWrites;

// =============================================================================
// CHART STATE
// =============================================================================

/// Live chart contents and the writes not yet flushed to Postgres.
#[derive(Debug, Default)]
pub struct ChartState {
    pub doc: ChartDoc,
    pub pending: PendingWrites,
}

impl ChartState {
    #[must_use]
    pub fn new(doc: ChartDoc) -> Self {
        Self { doc, pending: PendingWrites::new() }
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state. Clone is cheap: every field is Arc-backed.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub chart: Arc<RwLock<ChartState>>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(pool: PgPool, doc: ChartDoc, config: AppConfig) -> Self {
        Self { pool, chart: Arc::new(RwLock::new(ChartState::new(doc))), config: Arc::new(config) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use canvas::doc::{CardSize, Person, Sector};
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    /// Create a test `AppState` with a dummy `PgPool` (connect_lazy, no live DB).
    #[must_use]
    pub fn test_app_state() -> AppState {
        let config = AppConfig::for_tests();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .expect("connect_lazy should not fail");
        AppState::new(pool, ChartDoc::new(), config)
    }

    /// Seed a person directly into the document, bypassing pending writes.
    pub async fn seed_person(state: &AppState, x: f64, y: f64) -> Uuid {
        let person = dummy_person(x, y);
        let id = person.id;
        state.chart.write().await.doc.insert_person(person);
        id
    }

    /// Seed a sector directly into the document, bypassing pending writes.
    pub async fn seed_sector(state: &AppState, name: &str) -> Uuid {
        let sector = Sector { id: Uuid::new_v4(), name: name.into(), color: "#22C55E".into(), created_at: 0 };
        let id = sector.id;
        state.chart.write().await.doc.insert_sector(sector);
        id
    }

    #[must_use]
    pub fn dummy_person(x: f64, y: f64) -> Person {
        Person {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            role: "Director".into(),
            sector: String::new(),
            sector_id: None,
            color: "#3B82F6".into(),
            avatar_url: None,
            position_x: x,
            position_y: y,
            card_size: CardSize::Medium,
            fill_card: true,
            locked: false,
            created_at: 0,
            updated_at: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_state_starts_with_empty_chart() {
        let state = test_helpers::test_app_state();
        let chart = state.chart.read().await;
        assert!(chart.doc.is_empty());
        assert!(chart.pending.is_empty());
    }

    #[tokio::test]
    async fn clones_share_the_chart() {
        let state = test_helpers::test_app_state();
        let other = state.clone();
        test_helpers::seed_person(&other, 0.0, 0.0).await;
        assert_eq!(state.chart.read().await.doc.people_len(), 1);
    }
}
