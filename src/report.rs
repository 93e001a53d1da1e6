use crate::error::{IntakeError, Result};
use crate::policy::Gate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const REPORT_FILENAME: &str = "report.json";
pub const SCHEMA_VERSION: u32 = 1;

/// Durable state of one intake job. Each pipeline stage fills in its own
/// optional section; `stage` records how far the job got.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub schema_version: u32,
    pub job_id: String,
    pub created_at: String,
    pub detector: String,
    pub stage: Stage,
    pub summary: Summary,
    pub saved_files: Vec<String>,
    pub rejected_files: Vec<RejectedUpload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_check: Option<QualityCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicySection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<Gate>,
    pub next_stage: NextStage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Saved,
    QualityChecked,
    Gated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextStage {
    QualityCheck,
    /// Blur, brightness and face-size checks.
    ExtendedChecks,
    UploadMorePhotos,
    Generation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_received: usize,
    pub saved: usize,
    pub rejected: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_passed: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_rejected: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedUpload {
    pub filename: String,
    pub reason: UploadRejection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadRejection {
    #[serde(rename = "Unsupported file extension")]
    UnsupportedExtension,
    #[serde(rename = "Failed to save file")]
    SaveFailed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityCheck {
    pub passed: Vec<PassedImage>,
    pub rejected: Vec<RejectedImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassedImage {
    pub filename: String,
    pub faces_detected: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedImage {
    pub filename: String,
    pub reason: ImageRejection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faces_detected: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageRejection {
    #[serde(rename = "Failed to read image")]
    Unreadable,
    #[serde(rename = "Face detection failed")]
    DetectionFailed,
    #[serde(rename = "No face detected")]
    NoFace,
    #[serde(rename = "Multiple faces detected")]
    MultipleFaces,
}

/// Thresholds that were in force when the gate ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySection {
    pub min_passed_photos: usize,
}

impl Report {
    pub fn new(
        job_id: &str,
        detector: &str,
        total_received: usize,
        saved_files: Vec<String>,
        rejected_files: Vec<RejectedUpload>,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            job_id: job_id.to_string(),
            created_at: crate::util::now_rfc3339(),
            detector: detector.to_string(),
            stage: Stage::Saved,
            summary: Summary {
                total_received,
                saved: saved_files.len(),
                rejected: rejected_files.len(),
                quality_passed: None,
                quality_rejected: None,
            },
            saved_files,
            rejected_files,
            quality_check: None,
            policy: None,
            gate: None,
            next_stage: NextStage::QualityCheck,
        }
    }

    pub fn record_quality(&mut self, check: QualityCheck) {
        self.summary.quality_passed = Some(check.passed.len());
        self.summary.quality_rejected = Some(check.rejected.len());
        self.quality_check = Some(check);
        self.stage = Stage::QualityChecked;
        self.next_stage = NextStage::ExtendedChecks;
    }

    pub fn record_gate(&mut self, policy: PolicySection, gate: Gate) {
        self.next_stage = gate.next_stage();
        self.policy = Some(policy);
        self.gate = Some(gate);
        self.stage = Stage::Gated;
    }
}

pub fn report_path(job_root: &Path) -> PathBuf {
    job_root.join(REPORT_FILENAME)
}

pub fn load(path: &Path) -> Result<Report> {
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(IntakeError::ReportNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(IntakeError::io(path, e)),
    };
    serde_json::from_slice(&raw).map_err(|source| IntakeError::ReportCorrupt {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save(path: &Path, report: &Report) -> Result<()> {
    let raw = to_json(report)?;
    std::fs::write(path, raw).map_err(|e| IntakeError::io(path, e))
}

pub fn to_json(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(IntakeError::ReportEncode)
}
