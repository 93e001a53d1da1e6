//! Debug previews: every detection in green, the main face in red, and a
//! `faces=N` label in the top-left corner.

use crate::detector::{BoundingBox, Detection};
use crate::error::{IntakeError, Result};
use crate::util::ensure_dir;
use image::{DynamicImage, Rgb, RgbImage};
use std::path::{Path, PathBuf};

const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
const RED: Rgb<u8> = Rgb([255, 0, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

const LABEL_SCALE: u32 = 4;

pub fn preview_name(filename: &str) -> String {
    format!("preview__{filename}")
}

/// Draw and save the preview under `save_dir`; returns the written path.
pub fn render_preview(
    image: &DynamicImage,
    detections: &[Detection],
    main: Option<usize>,
    save_dir: &Path,
    filename: &str,
) -> Result<PathBuf> {
    ensure_dir(save_dir)?;
    let canvas = draw_preview(image, detections, main);
    let path = save_dir.join(preview_name(filename));
    canvas
        .save(&path)
        .map_err(|e| IntakeError::io(&path, std::io::Error::other(e)))?;
    Ok(path)
}

pub fn draw_preview(
    image: &DynamicImage,
    detections: &[Detection],
    main: Option<usize>,
) -> RgbImage {
    let mut canvas = image.to_rgb8();
    for d in detections {
        draw_rect(&mut canvas, &d.bbox, GREEN, 2);
    }
    if let Some(d) = main.and_then(|i| detections.get(i)) {
        draw_rect(&mut canvas, &d.bbox, RED, 3);
    }
    draw_label(
        &mut canvas,
        &format!("faces={}", detections.len()),
        10,
        10,
        WHITE,
    );
    canvas
}

fn draw_rect(img: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>, thickness: u32) {
    let x0 = bbox.x as i64;
    let y0 = bbox.y as i64;
    let x1 = x0 + bbox.width as i64 - 1;
    let y1 = y0 + bbox.height as i64 - 1;
    for t in 0..thickness as i64 {
        for x in x0..=x1 {
            put(img, x, y0 + t, color);
            put(img, x, y1 - t, color);
        }
        for y in y0..=y1 {
            put(img, x0 + t, y, color);
            put(img, x1 - t, y, color);
        }
    }
}

fn draw_label(img: &mut RgbImage, text: &str, x: i64, y: i64, color: Rgb<u8>) {
    let advance = (GLYPH_W as i64 + 1) * LABEL_SCALE as i64;
    for (i, ch) in text.chars().enumerate() {
        let Some(rows) = glyph(ch) else { continue };
        let gx = x + i as i64 * advance;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_W {
                if bits & (1 << (GLYPH_W - 1 - col)) == 0 {
                    continue;
                }
                for dy in 0..LABEL_SCALE as i64 {
                    for dx in 0..LABEL_SCALE as i64 {
                        put(
                            img,
                            gx + col as i64 * LABEL_SCALE as i64 + dx,
                            y + row as i64 * LABEL_SCALE as i64 + dy,
                            color,
                        );
                    }
                }
            }
        }
    }
}

fn put(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

const GLYPH_W: u32 = 3;

// 3x5 bitmaps, MSB is the leftmost column.
fn glyph(ch: char) -> Option<[u8; 5]> {
    Some(match ch {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'f' => [0b011, 0b100, 0b110, 0b100, 0b100],
        'a' => [0b000, 0b011, 0b101, 0b101, 0b011],
        'c' => [0b000, 0b011, 0b100, 0b100, 0b011],
        'e' => [0b010, 0b101, 0b111, 0b100, 0b011],
        's' => [0b011, 0b100, 0b010, 0b001, 0b110],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_face_drawn_over_candidates() {
        let img = DynamicImage::new_rgb8(200, 200);
        let dets = [
            Detection::new(BoundingBox::new(100, 100, 40, 40), None),
            Detection::new(BoundingBox::new(150, 150, 30, 30), None),
        ];
        let out = draw_preview(&img, &dets, Some(0));
        assert_eq!(*out.get_pixel(100, 120), RED);
        assert_eq!(*out.get_pixel(102, 120), RED);
        assert_eq!(*out.get_pixel(150, 160), GREEN);
        assert_eq!(*out.get_pixel(120, 120), Rgb([0, 0, 0]));
    }

    #[test]
    fn boxes_past_the_edge_are_clipped() {
        let img = DynamicImage::new_rgb8(20, 20);
        let dets = [Detection::new(BoundingBox::new(-5, -5, 100, 100), None)];
        let out = draw_preview(&img, &dets, None);
        assert_eq!(out.dimensions(), (20, 20));
    }

    #[test]
    fn label_is_drawn() {
        let img = DynamicImage::new_rgb8(120, 60);
        let out = draw_preview(&img, &[], None);
        assert!(out.pixels().any(|p| *p == WHITE));
    }
}
