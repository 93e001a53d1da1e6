pub mod cascade;
pub mod neural;
pub mod types;

use crate::config::{Config, DetectorBackend};
use crate::error::Result;
use image::DynamicImage;
use std::sync::Arc;

pub use cascade::CascadeDetector;
pub use neural::NeuralDetector;
pub use types::{BoundingBox, Detection};

/// Shared contract for face detectors.
///
/// Implementations load their model once at construction and are shared
/// read-only across requests.
pub trait FaceDetector: Send + Sync {
    fn backend(&self) -> DetectorBackend;
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>>;
}

/// Build the detector selected by `detector.backend`.
pub fn from_config(cfg: &Config) -> Result<Arc<dyn FaceDetector>> {
    let detector: Arc<dyn FaceDetector> = match cfg.detector.backend {
        DetectorBackend::Cascade => Arc::new(CascadeDetector::load(&cfg.detector.cascade)?),
        DetectorBackend::Neural => Arc::new(NeuralDetector::load(&cfg.detector.neural)?),
    };
    Ok(detector)
}
