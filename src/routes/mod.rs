pub mod docs;
pub mod invasions;
pub mod plan;
pub mod status;

use axum::{routing::{get, post}, Router};
use std::sync::Arc;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/atlas/gerarRoteiro", post(plan::generate_routes))
        .route("/atlas/analisarInvasoes", post(invasions::analyze_invasions))
        .route("/atlas/status", get(status::service_status))
        .route("/atlas/docs", get(docs::api_docs))
        .with_state(state)
}
