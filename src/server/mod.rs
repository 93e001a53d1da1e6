mod api;
mod error;
mod state;
mod types;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;

pub use self::error::AppError;
pub use self::state::AppState;
pub use self::types::JobResponse;

/// Build the HTTP router.
pub fn create_app(state: Arc<AppState>) -> Router {
    let limit = state.max_body_bytes;
    Router::new()
        .route("/", get(api::root_handler))
        .route("/api/jobs", post(api::create_job_handler))
        .route("/api/jobs/{job_id}", get(api::get_job_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(limit))
        .with_state(state)
}
