mod config;
mod db;
mod routes;
mod services;
mod state;

use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = config::AppConfig::from_env()?;
    let pool = db::init_pool(&config.database_url, config.db_max_connections).await?;

    let doc = db::hydrate_chart(&pool).await?;
    info!(
        people = doc.people_len(),
        connections = doc.connections_len(),
        "chart hydrated"
    );

    let port = config.port;
    let state = state::AppState::new(pool, doc, config);

    // Spawn background write-back task.
    let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
    let persistence = services::persistence::spawn_persistence_task(state.clone(), stop_rx);

    let app = routes::app(state.clone());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;

    info!(%port, "organogram listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let an in-flight flush commit before draining what is left.
    if stop_tx.send(true).is_err() {
        tracing::warn!("write-back task already stopped");
    }
    if let Err(e) = persistence.await {
        tracing::error!(error = %e, "write-back task failed");
    }
    let flushed = services::persistence::flush_now(&state).await;
    info!(flushed, "pending writes flushed; shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
}
