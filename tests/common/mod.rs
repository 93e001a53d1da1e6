#![allow(dead_code)]

use face_intake::config::{Config, DetectorBackend};
use face_intake::detector::{BoundingBox, Detection, FaceDetector};
use face_intake::error::{IntakeError, Result};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::Path;

/// Reports as many faces as the red channel of pixel (0, 0).
pub struct ScriptedDetector;

impl FaceDetector for ScriptedDetector {
    fn backend(&self) -> DetectorBackend {
        DetectorBackend::Cascade
    }

    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>> {
        let n = image.to_rgb8().get_pixel(0, 0)[0] as i32;
        Ok((0..n)
            .map(|i| Detection::new(BoundingBox::new(4 + i * 20, 4, 16, 16), None))
            .collect())
    }
}

pub struct FailingDetector;

impl FaceDetector for FailingDetector {
    fn backend(&self) -> DetectorBackend {
        DetectorBackend::Neural
    }

    fn detect(&self, _image: &DynamicImage) -> Result<Vec<Detection>> {
        Err(IntakeError::Detection("inference exploded".into()))
    }
}

/// PNG bytes that `ScriptedDetector` will read as `faces` faces.
pub fn photo_with_faces(faces: u8) -> Vec<u8> {
    let mut img = RgbImage::new(64, 32);
    img.put_pixel(0, 0, Rgb([faces, 0, 0]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .expect("encode png");
    buf.into_inner()
}

pub fn test_config(jobs_dir: &Path) -> Config {
    let mut cfg = Config::default();
    cfg.paths.jobs_dir = jobs_dir.display().to_string();
    cfg
}

pub fn job_dirs(jobs_dir: &Path) -> Vec<std::path::PathBuf> {
    match std::fs::read_dir(jobs_dir) {
        Ok(rd) => rd.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    }
}
