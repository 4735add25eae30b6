// Route table for the Testbench API
use axum::routing::{delete, get, patch, post};
use axum::Router;
use std::sync::Arc;

use crate::handlers;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/status", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/sessions", post(handlers::create_session))
        .route("/sessions/:session_id", delete(handlers::delete_session))
        .route(
            "/sessions/:session_id/cases",
            get(handlers::list_cases).post(handlers::add_case),
        )
        .route(
            "/sessions/:session_id/cases/:case_id",
            patch(handlers::update_case).delete(handlers::remove_case),
        )
        .route("/sessions/:session_id/cases/:case_id/run", post(handlers::run_case))
        .route("/sessions/:session_id/cases/:case_id/report", post(handlers::report_case))
        .route("/sessions/:session_id/submit", post(handlers::submit))
        .route("/sessions/:session_id/exec", post(handlers::exec))
}
