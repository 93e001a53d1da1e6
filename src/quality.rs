//! Face-count quality gate.

use crate::detector::{Detection, FaceDetector};
use crate::preview;
use crate::report::{ImageRejection, PassedImage, QualityCheck, RejectedImage};
use crate::storage::{Job, WORK_DIR};
use image::{DynamicImage, ImageReader};
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Rejected(ImageRejection),
}

/// Exactly one face passes; zero or several are rejected.
pub fn classify(face_count: usize) -> Verdict {
    match face_count {
        0 => Verdict::Rejected(ImageRejection::NoFace),
        1 => Verdict::Passed,
        _ => Verdict::Rejected(ImageRejection::MultipleFaces),
    }
}

/// Index of the detection with the largest `area * score`; the earliest wins ties.
pub fn select_main_face(detections: &[Detection]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, d) in detections.iter().enumerate() {
        let w = d.weight();
        match best {
            Some((_, bw)) if w <= bw => {}
            _ => best = Some((i, w)),
        }
    }
    best.map(|(i, _)| i)
}

/// Decode by content rather than trusting the stored extension.
pub fn load_image(path: &Path) -> Result<DynamicImage, image::ImageError> {
    ImageReader::open(path)?.with_guessed_format()?.decode()
}

pub struct QualityGate<'a> {
    detector: &'a dyn FaceDetector,
    render_preview: bool,
}

impl<'a> QualityGate<'a> {
    pub fn new(detector: &'a dyn FaceDetector, render_preview: bool) -> Self {
        Self {
            detector,
            render_preview,
        }
    }

    /// Check every file in `filenames` (in order) under the job's uploads.
    /// Per-image failures become rejections; nothing here aborts the batch.
    pub fn run(&self, job: &Job, filenames: &[String]) -> QualityCheck {
        let mut check = QualityCheck::default();
        let uploads_dir = job.uploads_dir();
        let work_dir = job.work_dir();

        for filename in filenames {
            let path = uploads_dir.join(filename);
            let image = match load_image(&path) {
                Ok(img) => img,
                Err(e) => {
                    warn!("failed to read {}: {e}", path.display());
                    check.rejected.push(RejectedImage {
                        filename: filename.clone(),
                        reason: ImageRejection::Unreadable,
                        faces_detected: None,
                        preview: None,
                    });
                    continue;
                }
            };

            let faces = match self.detector.detect(&image) {
                Ok(faces) => faces,
                Err(e) => {
                    warn!("{e} ({filename})");
                    check.rejected.push(RejectedImage {
                        filename: filename.clone(),
                        reason: ImageRejection::DetectionFailed,
                        faces_detected: None,
                        preview: None,
                    });
                    continue;
                }
            };

            let count = faces.len();
            let preview = if self.render_preview {
                let main = select_main_face(&faces);
                match preview::render_preview(&image, &faces, main, &work_dir, filename) {
                    Ok(_) => Some(format!("{WORK_DIR}/{}", preview::preview_name(filename))),
                    Err(e) => {
                        warn!("preview failed for {filename}: {e}");
                        None
                    }
                }
            } else {
                None
            };

            let verdict = classify(count);
            debug!("{filename}: faces={count} verdict={verdict:?}");
            match verdict {
                Verdict::Passed => check.passed.push(PassedImage {
                    filename: filename.clone(),
                    faces_detected: count,
                    preview,
                }),
                Verdict::Rejected(reason) => check.rejected.push(RejectedImage {
                    filename: filename.clone(),
                    reason,
                    faces_detected: (reason == ImageRejection::MultipleFaces).then_some(count),
                    preview,
                }),
            }
        }

        check
    }
}
