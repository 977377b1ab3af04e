//! Nightfall HTTP API: the moderator's screen talks to the engine through
//! these routes.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod ticker;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    // TODO: Replace CorsLayer::permissive() with the moderator screen's origin.
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/game", routes::game::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
