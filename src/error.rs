use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = IntakeError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum IntakeError {
    /// Bad upload set; shown to the client as-is.
    #[error("{0}")]
    Validation(String),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("face detector unavailable: {0}")]
    DetectorUnavailable(String),

    #[error("face detection failed: {0}")]
    Detection(String),

    #[error("report not found: {}", .0.display())]
    ReportNotFound(PathBuf),

    #[error("report corrupt at {path}: {source}")]
    ReportCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("report serialization failed: {0}")]
    ReportEncode(#[source] serde_json::Error),
}

impl IntakeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
