//! HSV conversion and color thresholding
//!
//! HSV values use the 8-bit convention: hue in `0..180` (degrees / 2),
//! saturation and value in `0..=255`.

use crate::Frame;
use image::GrayImage;
use rayon::prelude::*;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};

/// Inclusive HSV bounds a pixel must fall within
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub min: [u8; 3],
    pub max: [u8; 3],
}

impl HsvRange {
    pub const fn new(min: [u8; 3], max: [u8; 3]) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| self.min[c] <= hsv[c] && hsv[c] <= self.max[c])
    }
}

/// Convert one RGB pixel to 8-bit HSV
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(f32::from);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v > 0.0 { 255.0 * diff / v } else { 0.0 };

    let h = if diff == 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / diff
    } else if v == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    let mut h = (h / 2.0).round() as u16;
    if h >= 180 {
        h -= 180;
    }

    [h as u8, s.round() as u8, v as u8]
}

/// Binary mask (255 inside `range`, 0 outside) of an RGB frame.
///
/// With a pool, disjoint row ranges are converted in parallel, one range per
/// pool thread; each task reads its own input rows and writes its own mask rows.
pub fn threshold(frame: &Frame, range: &HsvRange, pool: Option<&ThreadPool>) -> GrayImage {
    let (width, height) = frame.dimensions();
    let mut mask = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return mask;
    }

    let input: &[u8] = frame.as_raw();
    let output: &mut [u8] = &mut mask;

    match pool {
        Some(pool) if pool.current_num_threads() > 1 => {
            let rows_per_task = (height as usize).div_ceil(pool.current_num_threads());
            let out_chunk = rows_per_task * width as usize;
            let in_chunk = out_chunk * 3;
            pool.install(|| {
                output
                    .par_chunks_mut(out_chunk)
                    .zip(input.par_chunks(in_chunk))
                    .for_each(|(out, rows)| threshold_rows(rows, out, range));
            });
        }
        _ => threshold_rows(input, output, range),
    }

    mask
}

fn threshold_rows(rgb: &[u8], out: &mut [u8], range: &HsvRange) {
    for (pixel, value) in rgb.chunks_exact(3).zip(out.iter_mut()) {
        let hsv = rgb_to_hsv([pixel[0], pixel[1], pixel[2]]);
        *value = if range.contains(hsv) { 255 } else { 0 };
    }
}
