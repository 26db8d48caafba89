use image::{GrayImage, ImageBuffer, Luma};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use log::info;

use super::{DetectorKind, FeatureDetector};
use crate::error::{DetectError, Result};
use crate::models::{CornerPoint, FeatureSet, QualityLevel};

/// Per-pixel integer response.
pub type ResponseMap = ImageBuffer<Luma<i64>, Vec<i64>>;

/// Side of the square window the structure tensor is summed over.
pub const BLOCK_SIZE: u32 = 2;
/// Sobel aperture used for the gradients.
pub const APERTURE: u32 = 3;
/// Harris sensitivity `k = 0.04` in `det(M) - k * trace(M)^2`, kept as `1 / k`.
pub const INVERSE_SENSITIVITY: i64 = 25;

/// Reflect an out-of-range index back into `[0, len)` without repeating the edge.
fn reflect_101(i: i64, len: i64) -> u32 {
    if len == 1 {
        return 0;
    }
    let mut i = i;
    if i < 0 {
        i = -i;
    }
    if i >= len {
        i = 2 * len - 2 - i;
    }
    i as u32
}

/// Harris corner response of a grayscale image, scaled by `1 / k`.
///
/// Gradients come from 3x3 Sobel operators; the products are summed over a
/// `BLOCK_SIZE` square anchored at its center, which for an even block
/// means the window covers the pixel and the ones above and to its left.
/// Everything stays in integers, so a contrast change scales the whole map
/// by the same factor and leaves the normalized levels untouched.
pub fn corner_response(gray: &GrayImage) -> ResponseMap {
    let (w, h) = gray.dimensions();
    let gx = horizontal_sobel(gray);
    let gy = vertical_sobel(gray);

    let mut xx = ResponseMap::new(w, h);
    let mut xy = ResponseMap::new(w, h);
    let mut yy = ResponseMap::new(w, h);
    for (x, y, dx) in gx.enumerate_pixels() {
        let dx = dx[0] as i64;
        let dy = gy.get_pixel(x, y)[0] as i64;
        xx.put_pixel(x, y, Luma([dx * dx]));
        xy.put_pixel(x, y, Luma([dx * dy]));
        yy.put_pixel(x, y, Luma([dy * dy]));
    }

    let anchor = (BLOCK_SIZE / 2) as i64;
    let mut response = ResponseMap::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let (mut a, mut b, mut c) = (0i64, 0i64, 0i64);
            for by in 0..BLOCK_SIZE as i64 {
                let sy = reflect_101(y as i64 + by - anchor, h as i64);
                for bx in 0..BLOCK_SIZE as i64 {
                    let sx = reflect_101(x as i64 + bx - anchor, w as i64);
                    a += xx.get_pixel(sx, sy)[0];
                    b += xy.get_pixel(sx, sy)[0];
                    c += yy.get_pixel(sx, sy)[0];
                }
            }
            let trace = a + c;
            response.put_pixel(x, y, Luma([INVERSE_SENSITIVITY * (a * c - b * b) - trace * trace]));
        }
    }

    response
}

/// Min-max normalize a response map into `[0, 255]`, truncated to whole levels.
///
/// A constant map normalizes to all zeros.
pub fn normalize(map: &ResponseMap) -> GrayImage {
    let (min, max) = map
        .pixels()
        .fold((i64::MAX, i64::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));

    let mut out = GrayImage::new(map.width(), map.height());
    if max <= min {
        return out;
    }
    let range = (max - min) as i128;
    for (x, y, p) in map.enumerate_pixels() {
        let level = (p[0] - min) as i128 * 255 / range;
        out.put_pixel(x, y, Luma([level as u8]));
    }
    out
}

/// Harris corner detector.
#[derive(Debug, Clone, Default)]
pub struct CornerDetector {
    quality: QualityLevel,
}

impl CornerDetector {
    pub fn new(quality: i32) -> Result<Self> {
        Ok(Self {
            quality: QualityLevel::new(quality)?,
        })
    }

    pub fn quality(&self) -> i32 {
        self.quality.get()
    }

    pub fn set_quality(&mut self, quality: i32) -> Result<()> {
        self.quality = QualityLevel::new(quality)?;
        Ok(())
    }

    /// The normalized levels the quality level is compared against.
    pub fn normalized_response(&self, gray: &GrayImage) -> GrayImage {
        normalize(&corner_response(gray))
    }
}

impl FeatureDetector for CornerDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Corner
    }

    fn detect(&self, gray: &GrayImage) -> Result<FeatureSet> {
        if gray.width() == 0 || gray.height() == 0 {
            return Err(DetectError::EmptyImage);
        }

        let normalized = self.normalized_response(gray);
        let quality = self.quality.get();

        // enumerate_pixels walks row-major, which fixes the output order
        let corners: Vec<CornerPoint> = normalized
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] as i32 > quality)
            .map(|(x, y, _)| CornerPoint::new(x as i32, y as i32))
            .collect();

        info!("Corners detected and stored in features.");
        Ok(FeatureSet::Corners(corners))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflect_101_mirrors_without_edge_repeat() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(2, 5), 2);
        assert_eq!(reflect_101(-1, 1), 0);
    }

    #[test]
    fn flat_image_has_no_response() {
        let gray = GrayImage::from_pixel(12, 12, Luma([128]));
        let normalized = normalize(&corner_response(&gray));
        assert!(normalized.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn normalized_map_spans_full_range() {
        let mut gray = GrayImage::new(20, 20);
        for y in 5..15 {
            for x in 5..15 {
                gray.put_pixel(x, y, Luma([255]));
            }
        }
        let normalized = normalize(&corner_response(&gray));
        assert_eq!(normalized.pixels().map(|p| p[0]).max(), Some(255));
        assert_eq!(normalized.pixels().map(|p| p[0]).min(), Some(0));
    }

    #[test]
    fn levels_ignore_contrast() {
        let faint = GrayImage::from_fn(24, 24, |x, y| {
            Luma([if (6..18).contains(&x) && (6..18).contains(&y) { 101 } else { 100 }])
        });
        let strong = GrayImage::from_fn(24, 24, |x, y| {
            Luma([if (6..18).contains(&x) && (6..18).contains(&y) { 255 } else { 0 }])
        });
        assert_eq!(normalize(&corner_response(&faint)), normalize(&corner_response(&strong)));
    }
}
