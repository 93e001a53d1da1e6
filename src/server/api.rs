use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum_typed_multipart::TypedMultipart;
use serde_json::{Value, json};
use tokio::task::block_in_place;
use tracing::info;

use super::error::AppError;
use super::state::AppState;
use super::types::{CreateJobRequest, JobResponse};
use crate::pipeline::IncomingFile;
use crate::report::Report;

type Result<T> = std::result::Result<T, AppError>;

pub async fn root_handler() -> Json<Value> {
    Json(json!({ "message": "ID Photo AI Server Running" }))
}

/// Save the uploaded photos as a new job and run the quality gate.
pub async fn create_job_handler(
    State(state): State<Arc<AppState>>,
    TypedMultipart(req): TypedMultipart<CreateJobRequest>,
) -> Result<Json<JobResponse>> {
    let files: Vec<IncomingFile> = req
        .files
        .into_iter()
        .map(|f| IncomingFile {
            filename: f.metadata.file_name.unwrap_or_default(),
            bytes: f.contents.to_vec(),
        })
        .collect();

    info!("received {} file(s)", files.len());
    let out = block_in_place(|| state.pipeline.run_job(files))?;
    Ok(Json(JobResponse::from(out.report)))
}

pub async fn get_job_handler(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<Report>> {
    let report = block_in_place(|| state.pipeline.load_report(&job_id))?;
    Ok(Json(report))
}
