use std::sync::Arc;

use crate::config::Config;
use crate::detector::FaceDetector;
use crate::pipeline::Pipeline;

/// Shared across requests; the detector inside is read-only after startup.
pub struct AppState {
    pub pipeline: Pipeline,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(cfg: &Config, detector: Arc<dyn FaceDetector>) -> Arc<Self> {
        Arc::new(AppState {
            pipeline: Pipeline::new(cfg, detector),
            max_body_bytes: cfg.server.max_body_bytes,
        })
    }
}
