use super::{BoundingBox, Detection, FaceDetector};
use crate::config::{self, DetectorBackend};
use crate::error::{IntakeError, Result};
use image::DynamicImage;
use image::imageops::FilterType;
use ort::session::Session;
use ort::value::Tensor;
use parking_lot::Mutex;
use std::path::Path;
use tracing::{debug, info};

/// ONNX face detector with UltraFace-style outputs:
/// `scores` `[1, N, 2]` (background, face) and `boxes` `[1, N, 4]`
/// holding normalised `x1, y1, x2, y2`.
pub struct NeuralDetector {
    session: Mutex<Session>,
    input_name: String,
    cfg: config::Neural,
}

impl NeuralDetector {
    pub fn load(cfg: &config::Neural) -> Result<Self> {
        let path = Path::new(&cfg.model_path);
        if !path.exists() {
            return Err(IntakeError::DetectorUnavailable(format!(
                "model not found: {}",
                path.display()
            )));
        }
        let unavailable =
            |e: ort::Error| IntakeError::DetectorUnavailable(format!("{}: {e}", path.display()));
        let session = Session::builder()
            .map_err(unavailable)?
            .with_intra_threads(cfg.intra_threads.max(1))
            .map_err(unavailable)?
            .commit_from_file(path)
            .map_err(unavailable)?;
        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| {
                IntakeError::DetectorUnavailable(format!("{} has no inputs", path.display()))
            })?;
        info!("neural model loaded from {} (input={input_name})", path.display());
        Ok(Self {
            session: Mutex::new(session),
            input_name,
            cfg: cfg.clone(),
        })
    }

    fn preprocess(&self, image: &DynamicImage) -> (Vec<i64>, Vec<f32>) {
        let (w, h) = (self.cfg.input_width, self.cfg.input_height);
        let rgb = image.resize_exact(w, h, FilterType::Triangle).to_rgb8();
        let plane = (w * h) as usize;
        let mut data = vec![0f32; 3 * plane];
        for (i, p) in rgb.pixels().enumerate() {
            for c in 0..3 {
                data[c * plane + i] = (p[c] as f32 - 127.0) / 128.0;
            }
        }
        (vec![1, 3, h as i64, w as i64], data)
    }

    fn infer(&self, image: &DynamicImage) -> Result<(Vec<f32>, Vec<f32>)> {
        let (shape, data) = self.preprocess(image);
        let failed = |e: ort::Error| IntakeError::Detection(e.to_string());
        let tensor = Tensor::from_array((shape, data)).map_err(failed)?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => tensor])
            .map_err(failed)?;
        let scores = outputs
            .get("scores")
            .ok_or_else(|| IntakeError::Detection("model output `scores` missing".into()))?
            .try_extract_tensor::<f32>()
            .map_err(failed)?
            .1
            .to_vec();
        let boxes = outputs
            .get("boxes")
            .ok_or_else(|| IntakeError::Detection("model output `boxes` missing".into()))?
            .try_extract_tensor::<f32>()
            .map_err(failed)?
            .1
            .to_vec();
        Ok((scores, boxes))
    }
}

impl FaceDetector for NeuralDetector {
    fn backend(&self) -> DetectorBackend {
        DetectorBackend::Neural
    }

    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>> {
        let (scores, boxes) = self.infer(image)?;
        let candidates = decode(
            &scores,
            &boxes,
            image.width(),
            image.height(),
            self.cfg.candidate_threshold,
        );
        let raw = non_max_suppression(candidates, self.cfg.nms_iou);
        let kept = apply_confidence_tiers(
            raw,
            self.cfg.primary_threshold,
            self.cfg.fallback_threshold,
        );
        debug!("neural kept {} face(s)", kept.len());
        Ok(kept)
    }
}

/// Turn flat score/box buffers into pixel-space detections above `floor`.
pub fn decode(
    scores: &[f32],
    boxes: &[f32],
    width: u32,
    height: u32,
    floor: f32,
) -> Vec<Detection> {
    let n = (scores.len() / 2).min(boxes.len() / 4);
    let (fw, fh) = (width as f32, height as f32);
    let mut out = Vec::new();
    for i in 0..n {
        let score = scores[i * 2 + 1];
        if score < floor {
            continue;
        }
        let b = &boxes[i * 4..i * 4 + 4];
        let x1 = (b[0] * fw).clamp(0.0, fw);
        let y1 = (b[1] * fh).clamp(0.0, fh);
        let x2 = (b[2] * fw).clamp(0.0, fw);
        let y2 = (b[3] * fh).clamp(0.0, fh);
        if x2 <= x1 || y2 <= y1 {
            continue;
        }
        out.push(Detection::new(
            BoundingBox::new(
                x1.round() as i32,
                y1.round() as i32,
                (x2 - x1).round() as u32,
                (y2 - y1).round() as u32,
            ),
            Some(score),
        ));
    }
    out
}

/// Greedy NMS: highest score first, drop anything overlapping a kept box by more than `iou`.
pub fn non_max_suppression(mut dets: Vec<Detection>, iou: f32) -> Vec<Detection> {
    dets.sort_by(|a, b| {
        b.score
            .unwrap_or(0.0)
            .partial_cmp(&a.score.unwrap_or(0.0))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut kept: Vec<Detection> = Vec::new();
    for d in dets {
        if kept.iter().all(|k| overlap(&k.bbox, &d.bbox) <= iou) {
            kept.push(d);
        }
    }
    kept
}

/// Keep detections at or above `primary`; if that leaves nothing but raw
/// detections existed, retry at `fallback`.
pub fn apply_confidence_tiers(
    raw: Vec<Detection>,
    primary: f32,
    fallback: f32,
) -> Vec<Detection> {
    let at = |t: f32| -> Vec<Detection> {
        raw.iter()
            .copied()
            .filter(|d| d.score.unwrap_or(1.0) >= t)
            .collect()
    };
    let strict = at(primary);
    if !strict.is_empty() || raw.is_empty() {
        return strict;
    }
    at(fallback)
}

fn overlap(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let ax2 = a.x as f32 + a.width as f32;
    let ay2 = a.y as f32 + a.height as f32;
    let bx2 = b.x as f32 + b.width as f32;
    let by2 = b.y as f32 + b.height as f32;
    let iw = (ax2.min(bx2) - (a.x.max(b.x) as f32)).max(0.0);
    let ih = (ay2.min(by2) - (a.y.max(b.y) as f32)).max(0.0);
    let inter = iw * ih;
    let union = a.area() as f32 + b.area() as f32 - inter;
    if union <= 0.0 { 0.0 } else { inter / union }
}
