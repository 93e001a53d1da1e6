use crate::{
    config::Config,
    detector::FaceDetector,
    error::{IntakeError, Result},
    policy,
    quality::QualityGate,
    report::{self, RejectedUpload, Report, UploadRejection},
    storage::{self, Job},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub const NO_FILES: &str = "No files uploaded.";
pub const ALL_REJECTED: &str =
    "All uploaded files were rejected. Please upload jpg/png/webp images.";

/// One file as received from the client.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl IncomingFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// What happened to one received file during the save step.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadRecord {
    Saved { original: String, stored: String },
    Rejected(RejectedUpload),
}

pub struct JobOutput {
    pub job: Job,
    pub report: Report,
}

pub struct Pipeline {
    cfg: Config,
    detector: Arc<dyn FaceDetector>,
}

impl Pipeline {
    pub fn new(cfg: &Config, detector: Arc<dyn FaceDetector>) -> Self {
        Self {
            cfg: cfg.clone(),
            detector,
        }
    }

    pub fn jobs_dir(&self) -> PathBuf {
        PathBuf::from(&self.cfg.paths.jobs_dir)
    }

    /// received → saved → quality-checked → gated → reported.
    pub fn run_job(&self, files: Vec<IncomingFile>) -> Result<JobOutput> {
        let started = Instant::now();

        if files.is_empty() {
            return Err(IntakeError::Validation(NO_FILES.into()));
        }
        if !files.iter().any(|f| storage::is_allowed(&f.filename)) {
            return Err(IntakeError::Validation(ALL_REJECTED.into()));
        }

        let job = storage::create_job(&self.jobs_dir())?;
        info!("job_id={} files={} out={}", job.id, files.len(), job.root.display());

        let mut report = admit(&job, &files, self.detector.backend().as_str())?;
        let report_path = job.report_path();

        let gate = QualityGate::new(self.detector.as_ref(), self.cfg.quality.render_preview);
        let check = gate.run(&job, &report.saved_files);
        info!(
            "quality passed={} rejected={}",
            check.passed.len(),
            check.rejected.len()
        );
        report.record_quality(check);

        if self.cfg.policy.enabled {
            let passed = report.summary.quality_passed.unwrap_or(0);
            let decision = policy::decide(&self.cfg, passed);
            info!(
                "gate status={:?} shortfall={}",
                decision.status, decision.shortfall
            );
            report.record_gate(policy::policy_section(&self.cfg), decision);
        }

        report::save(&report_path, &report)?;
        debug!("job {} finished in {:?}", job.id, started.elapsed());

        Ok(JobOutput { job, report })
    }

    pub fn load_report(&self, job_id: &str) -> Result<Report> {
        load_job_report(&self.jobs_dir(), job_id)
    }
}

/// Load `<jobs_dir>/<job_id>/report.json`. Ids we could not have issued
/// are reported as missing without touching the filesystem.
pub fn load_job_report(jobs_dir: &Path, job_id: &str) -> Result<Report> {
    if !is_job_id(job_id) {
        return Err(IntakeError::ReportNotFound(PathBuf::from(job_id)));
    }
    report::load(&report::report_path(&jobs_dir.join(job_id)))
}

/// Save the uploads and write the initial report, then read it back so later
/// stages work from the persisted record. A job that fails here is removed.
fn admit(job: &Job, files: &[IncomingFile], detector: &str) -> Result<Report> {
    write_initial_report(job, files, detector).inspect_err(|_| storage::remove_job(job))
}

fn write_initial_report(job: &Job, files: &[IncomingFile], detector: &str) -> Result<Report> {
    let mut saved_files = Vec::new();
    let mut rejected_files = Vec::new();
    for rec in save_all(job, files)? {
        match rec {
            UploadRecord::Saved { original, stored } => {
                debug!("saved {original} as {stored}");
                saved_files.push(stored);
            }
            UploadRecord::Rejected(r) => rejected_files.push(r),
        }
    }

    let report_path = job.report_path();
    let initial = Report::new(&job.id, detector, files.len(), saved_files, rejected_files);
    report::save(&report_path, &initial)?;
    report::load(&report_path)
}

/// Validate and save each file independently. Fails only if nothing could
/// be written while at least one file had an allowed extension.
fn save_all(job: &Job, files: &[IncomingFile]) -> Result<Vec<UploadRecord>> {
    let uploads = job.uploads_dir();
    let mut records = Vec::with_capacity(files.len());
    let mut last_err = None;

    for f in files {
        if !storage::is_allowed(&f.filename) {
            debug!("reject {}: unsupported extension", f.filename);
            records.push(UploadRecord::Rejected(RejectedUpload {
                filename: f.filename.clone(),
                reason: UploadRejection::UnsupportedExtension,
            }));
            continue;
        }

        match storage::save_upload(&f.bytes, &f.filename, &uploads) {
            Ok(stored) => {
                records.push(UploadRecord::Saved {
                    original: f.filename.clone(),
                    stored,
                });
            }
            Err(e) => {
                warn!("failed to save {}: {e}", f.filename);
                records.push(UploadRecord::Rejected(RejectedUpload {
                    filename: f.filename.clone(),
                    reason: UploadRejection::SaveFailed,
                }));
                last_err = Some(e);
            }
        }
    }

    let any_saved = records
        .iter()
        .any(|r| matches!(r, UploadRecord::Saved { .. }));
    match (any_saved, last_err) {
        (false, Some(e)) => Err(e),
        _ => Ok(records),
    }
}

// Job ids are generated by us; anything else must not reach the filesystem.
fn is_job_id(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && Path::new(s).components().count() == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_photo() -> Vec<IncomingFile> {
        vec![IncomingFile::new("a.jpg", b"not decoded here".to_vec())]
    }

    #[test]
    fn admit_writes_initial_report() {
        let tmp = tempfile::tempdir().unwrap();
        let job = storage::create_job(tmp.path()).unwrap();
        let report = admit(&job, &one_photo(), "cascade").unwrap();
        assert_eq!(report.saved_files.len(), 1);
        assert_eq!(report::load(&job.report_path()).unwrap(), report);
    }

    #[test]
    fn failed_report_write_removes_job() {
        let tmp = tempfile::tempdir().unwrap();
        let job = storage::create_job(tmp.path()).unwrap();
        // A directory where report.json should go makes the write fail.
        std::fs::create_dir(job.report_path()).unwrap();

        let err = admit(&job, &one_photo(), "cascade").unwrap_err();
        assert!(matches!(err, IntakeError::Io { .. }));
        assert!(!job.root.exists());
    }

    #[test]
    fn failed_saves_remove_job() {
        let tmp = tempfile::tempdir().unwrap();
        let job = storage::create_job(tmp.path()).unwrap();
        std::fs::remove_dir(job.uploads_dir()).unwrap();
        std::fs::write(job.uploads_dir(), b"not a dir").unwrap();

        let err = admit(&job, &one_photo(), "cascade").unwrap_err();
        assert!(matches!(err, IntakeError::Io { .. }));
        assert!(!job.root.exists());
    }
}
