//! Nightfall API server entry point.

use std::error::Error;
use std::sync::Arc;

use nightfall_core::clock::SystemClock;
use nightfall_core::snapshot::SnapshotRepository;
use nightfall_game::application::command_handlers;
use nightfall_roles::application::wake_order_source::WakeOrderSource;
use nightfall_snapshot_store::in_memory::InMemorySnapshotRepository;
use nightfall_snapshot_store::pg_snapshot_repository::PgSnapshotRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use nightfall_api::config::AppConfig;
use nightfall_api::error::AppError;
use nightfall_api::state::{AppState, GameDefaults};
use nightfall_api::{app, ticker};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Nightfall API server");

    let config = AppConfig::from_env()?;

    let snapshots: Arc<dyn SnapshotRepository> = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .map_err(AppError::from)?;
            nightfall_snapshot_store::run_migrations(&pool)
                .await
                .map_err(AppError::from)?;
            Arc::new(PgSnapshotRepository::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, snapshots are kept in memory only");
            Arc::new(InMemorySnapshotRepository::new())
        }
    };

    let wake_orders: Arc<dyn WakeOrderSource> = Arc::new(config.wake_order_source());

    let state = AppState::new(
        Arc::new(SystemClock),
        snapshots,
        wake_orders,
        GameDefaults {
            variant: config.game_variant.clone(),
            include_base_roles: config.include_base_roles,
        },
    );

    {
        let mut game = state.game.lock().await;
        if let Some(session_id) = command_handlers::restore_latest(
            &mut game,
            state.clock.as_ref(),
            state.snapshots.as_ref(),
        )
        .await
        {
            tracing::info!(%session_id, "resumed saved game");
        }
    }

    let _ticker = ticker::spawn_ticker(state.clone());

    let addr = config.bind_addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(AppError::from)?;
    axum::serve(listener, app(state)).await.map_err(AppError::from)?;

    Ok(())
}
