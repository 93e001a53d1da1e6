use super::{BoundingBox, Detection, FaceDetector};
use crate::config::{self, DetectorBackend};
use crate::error::{IntakeError, Result};
use image::DynamicImage;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

/// Classical multi-scale cascade backed by `rustface` (SeetaFace funnel cascade).
pub struct CascadeDetector {
    model: rustface::Model,
    cfg: config::Cascade,
}

// rustface panics below these bounds instead of returning an error.
const MIN_FACE_SIZE_FLOOR: u32 = 20;

impl CascadeDetector {
    pub fn load(cfg: &config::Cascade) -> Result<Self> {
        check_params(cfg)?;
        let path = Path::new(&cfg.model_path);
        let file = File::open(path).map_err(|e| {
            IntakeError::DetectorUnavailable(format!("cascade model {}: {e}", path.display()))
        })?;
        let model = rustface::read_model(BufReader::new(file)).map_err(|e| {
            IntakeError::DetectorUnavailable(format!("cascade model {}: {e}", path.display()))
        })?;
        info!("cascade model loaded from {}", path.display());
        Ok(Self {
            model,
            cfg: cfg.clone(),
        })
    }

    // rustface takes a shrink factor per pyramid level rather than a growth step.
    fn pyramid_factor(&self) -> f32 {
        (1.0 / self.cfg.scale_step.max(1.01)).clamp(0.01, 0.99)
    }
}

fn check_params(cfg: &config::Cascade) -> Result<()> {
    if cfg.min_face_size < MIN_FACE_SIZE_FLOOR {
        return Err(IntakeError::DetectorUnavailable(format!(
            "cascade min_face_size must be at least {MIN_FACE_SIZE_FLOOR}, got {}",
            cfg.min_face_size
        )));
    }
    if cfg.min_score.is_nan() || cfg.min_score <= 0.0 {
        return Err(IntakeError::DetectorUnavailable(format!(
            "cascade min_score must be positive, got {}",
            cfg.min_score
        )));
    }
    Ok(())
}

impl FaceDetector for CascadeDetector {
    fn backend(&self) -> DetectorBackend {
        DetectorBackend::Cascade
    }

    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>> {
        let gray = image.to_luma8();
        let (width, height) = gray.dimensions();

        // Detector instances carry scratch state, so each call gets its own.
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(self.cfg.min_face_size);
        detector.set_score_thresh(self.cfg.min_score);
        detector.set_pyramid_scale_factor(self.pyramid_factor());
        detector.set_slide_window_step(self.cfg.window_step, self.cfg.window_step);

        let faces = detector.detect(&rustface::ImageData::new(gray.as_raw(), width, height));
        debug!("cascade found {} face(s) in {width}x{height}", faces.len());

        Ok(faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                Detection::new(
                    BoundingBox::new(bbox.x(), bbox.y(), bbox.width(), bbox.height()),
                    None,
                )
            })
            .collect())
    }
}
