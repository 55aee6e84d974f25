use std::sync::Arc;

use anyhow::Context;
use batepapo::{app, clock::SystemClock, config::Config, db::SqliteStore, sweep::SweepScheduler, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,batepapo=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = SqliteStore::connect(&config.database_url, config.max_connections).await?;
    let app_state = AppState::new(Arc::new(store), Arc::new(SystemClock));

    let sweeper = SweepScheduler::start(
        app_state.presence.clone(),
        config.sweep_interval,
        config.participant_ttl,
    );

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("binding port {}", config.port))?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app(app_state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    sweeper.stop().await;
    Ok(())
}
