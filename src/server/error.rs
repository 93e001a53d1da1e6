use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::error::IntakeError;

/// API error; validation problems are the client's, the rest are ours.
#[derive(Debug)]
pub struct AppError(pub IntakeError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            IntakeError::Validation(_) => StatusCode::BAD_REQUEST,
            IntakeError::ReportNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self.0 {
            IntakeError::Validation(msg) => msg.clone(),
            IntakeError::ReportNotFound(_) => "Job not found.".to_string(),
            other => {
                error!("{other}");
                format!("Something went wrong: {other}")
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<IntakeError> for AppError {
    fn from(err: IntakeError) -> Self {
        Self(err)
    }
}
