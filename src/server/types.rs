use axum::body::Bytes;
use axum_typed_multipart::{FieldData, TryFromMultipart};
use serde::Serialize;

use crate::policy::Gate;
use crate::report::{PolicySection, QualityCheck, RejectedUpload, Report};

/// `POST /api/jobs` form: the `files` field may repeat.
#[derive(TryFromMultipart)]
pub struct CreateJobRequest {
    #[form_data(limit = "unlimited")]
    pub files: Vec<FieldData<Bytes>>,
}

/// Body returned after a batch has been processed.
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub job_id: String,
    pub saved_files: Vec<String>,
    pub rejected_files: Vec<RejectedUpload>,
    pub quality_check: Option<QualityCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicySection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gate: Option<Gate>,
}

impl From<Report> for JobResponse {
    fn from(r: Report) -> Self {
        Self {
            job_id: r.job_id,
            saved_files: r.saved_files,
            rejected_files: r.rejected_files,
            quality_check: r.quality_check,
            policy: r.policy,
            gate: r.gate,
        }
    }
}
