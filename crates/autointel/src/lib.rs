pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

pub use state::AppState;

/// Trigger and retrieval facade over one orchestrator.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/runs", get(routes::list_runs).post(routes::create_run))
        .route("/runs/{run_id}", get(routes::get_run))
        .with_state(app_state)
}
