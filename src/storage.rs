//! Job directories and upload persistence.

use crate::error::{IntakeError, Result};
use crate::util::{ensure_dir, new_job_id, short_token};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

pub const UPLOADS_DIR: &str = "uploads";
pub const OUTPUTS_DIR: &str = "outputs";
pub const WORK_DIR: &str = "work";

#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub root: PathBuf,
}

impl Job {
    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join(UPLOADS_DIR)
    }

    pub fn outputs_dir(&self) -> PathBuf {
        self.root.join(OUTPUTS_DIR)
    }

    pub fn work_dir(&self) -> PathBuf {
        self.root.join(WORK_DIR)
    }

    pub fn report_path(&self) -> PathBuf {
        crate::report::report_path(&self.root)
    }
}

/// Create `<jobs_dir>/<job_id>/{uploads,outputs,work}`.
pub fn create_job(jobs_dir: &Path) -> Result<Job> {
    let id = new_job_id();
    let job = Job {
        root: jobs_dir.join(&id),
        id,
    };
    ensure_dir(&job.uploads_dir())?;
    ensure_dir(&job.outputs_dir())?;
    ensure_dir(&job.work_dir())?;
    debug!("created job dir {}", job.root.display());
    Ok(job)
}

/// Best-effort removal of a job that aborted after its directory existed.
pub fn remove_job(job: &Job) {
    if let Err(e) = std::fs::remove_dir_all(&job.root) {
        warn!("failed to remove job dir {}: {e}", job.root.display());
    }
}

/// Suffix check only; file contents are not sniffed.
pub fn is_allowed(filename: &str) -> bool {
    extension_lower(filename)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// `selfie.PNG` becomes `selfie__1a2b3c4d.png`.
pub fn safe_filename(original_name: &str) -> String {
    let base = base_name(original_name);
    let path = Path::new(base);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("upload");
    match extension_lower(base) {
        Some(ext) => format!("{stem}__{}.{ext}", short_token()),
        None => format!("{stem}__{}", short_token()),
    }
}

/// Write `bytes` verbatim under a fresh name and return that name. An existing
/// file is never replaced; a name clash draws a new token.
pub fn save_upload(bytes: &[u8], original_name: &str, dir: &Path) -> Result<String> {
    ensure_dir(dir)?;
    let mut attempt = 0;
    loop {
        let filename = safe_filename(original_name);
        let path = dir.join(&filename);
        match write_new(&path, bytes) {
            Ok(()) => return Ok(filename),
            Err(e) if e.kind() == ErrorKind::AlreadyExists && attempt < SAVE_ATTEMPTS => {
                debug!("{} exists, retrying with a new token", path.display());
                attempt += 1;
            }
            Err(e) => return Err(IntakeError::io(&path, e)),
        }
    }
}

const SAVE_ATTEMPTS: u32 = 8;

fn write_new(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(bytes)
}

fn extension_lower(filename: &str) -> Option<String> {
    Path::new(base_name(filename))
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
}

// Clients may send full or relative paths; only the last component is ours to keep.
fn base_name(filename: &str) -> &str {
    filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .find(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_directories() {
        assert_eq!(base_name("../../etc/a.jpg"), "a.jpg");
        assert_eq!(base_name("C:\\photos\\b.png"), "b.png");
        assert_eq!(base_name(".."), "");
    }

    #[test]
    fn write_new_refuses_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("taken.jpg");
        std::fs::write(&path, b"first").unwrap();

        let err = write_new(&path, b"second").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(std::fs::read(&path).unwrap(), b"first");
    }

    #[test]
    fn safe_name_keeps_stem_and_lowercases_ext() {
        let name = safe_filename("dir/Selfie.JPG");
        assert!(name.starts_with("Selfie__"));
        assert!(name.ends_with(".jpg"));
        assert_eq!(name.len(), "Selfie__".len() + 8 + ".jpg".len());
    }
}
