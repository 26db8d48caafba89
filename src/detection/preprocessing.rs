use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageReader, RgbImage};
use imageproc::filter::{median_filter, separable_filter_equal};
use log::{debug, info};

use crate::error::{DetectError, Result};

/// Fixed 3-tap Gaussian, the kernel a 3x3 window gets when its spread is
/// derived from the window size.
const GAUSSIAN_KERNEL_3: [f32; 3] = [0.25, 0.5, 0.25];

/// Median aperture is 11 pixels, i.e. 5 on each side of the center.
const MEDIAN_RADIUS: u32 = 5;

/// Decoded raster plus its grayscale derivative.
///
/// Transform functions never modify a buffer in place; each returns the next
/// buffer in the chain.
#[derive(Debug, Clone, Default)]
pub struct ImageBuffer {
    pixels: RgbImage,
    grayscale: Option<GrayImage>,
}

impl ImageBuffer {
    pub fn new(pixels: RgbImage) -> Self {
        Self {
            pixels,
            grayscale: None,
        }
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    /// Only present once `to_grayscale` has run.
    pub fn grayscale(&self) -> Option<&GrayImage> {
        self.grayscale.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.width() == 0 || self.pixels.height() == 0
    }

    /// Dimensions of the raster that detection operates on.
    pub fn dimensions(&self) -> (u32, u32) {
        match &self.grayscale {
            Some(gray) => gray.dimensions(),
            None => self.pixels.dimensions(),
        }
    }

    /// The working raster as RGB: grayscale once converted, raw pixels before.
    pub fn working_rgb(&self) -> RgbImage {
        match &self.grayscale {
            Some(gray) => DynamicImage::ImageLuma8(gray.clone()).to_rgb8(),
            None => self.pixels.clone(),
        }
    }
}

/// Smoothing pass applied by the filtered run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenoiseKind {
    Gaussian,
    Median,
}

/// Decode an image from disk as 3-channel color.
pub fn load(path: impl AsRef<Path>) -> Result<ImageBuffer> {
    let path = path.as_ref();
    let decoded = ImageReader::open(path)
        .map_err(|e| DetectError::Load {
            path: path.to_path_buf(),
            source: image::ImageError::IoError(e),
        })?
        .with_guessed_format()
        .map_err(|e| DetectError::Load {
            path: path.to_path_buf(),
            source: image::ImageError::IoError(e),
        })?
        .decode()
        .map_err(|source| DetectError::Load {
            path: path.to_path_buf(),
            source,
        })?;

    let buffer = ImageBuffer::new(decoded.to_rgb8());
    if buffer.is_empty() {
        return Err(DetectError::EmptyImage);
    }
    debug!("Image loaded: {}x{}", buffer.pixels.width(), buffer.pixels.height());
    Ok(buffer)
}

/// Convert image to grayscale
pub fn to_grayscale(buf: &ImageBuffer) -> Result<ImageBuffer> {
    if buf.is_empty() {
        return Err(DetectError::Conversion);
    }
    let gray = DynamicImage::ImageRgb8(buf.pixels.clone()).to_luma8();
    info!("The image has been converted to grayscale");
    Ok(ImageBuffer {
        pixels: buf.pixels.clone(),
        grayscale: Some(gray),
    })
}

/// Largest raster, in pixels, a rescale may produce.
pub const MAX_RESCALED_PIXELS: u64 = 1 << 26;

/// Target size after scaling, rounded and never collapsing to zero.
fn scaled_dimension(size: u32, factor: f64) -> Option<u32> {
    let scaled = (size as f64 * factor).round();
    if !scaled.is_finite() || scaled > u32::MAX as f64 {
        return None;
    }
    Some((scaled as u32).max(1))
}

/// Both target dimensions, refused when the result would exceed `MAX_RESCALED_PIXELS`.
fn scaled_dimensions((w, h): (u32, u32), factor: f64) -> Result<(u32, u32)> {
    let too_large = || DetectError::ScaleTooLarge {
        factor,
        width: w,
        height: h,
    };
    let new_w = scaled_dimension(w, factor).ok_or_else(too_large)?;
    let new_h = scaled_dimension(h, factor).ok_or_else(too_large)?;
    if new_w as u64 * new_h as u64 > MAX_RESCALED_PIXELS {
        return Err(too_large());
    }
    Ok((new_w, new_h))
}

/// Resize both rasters by `factor` with bilinear interpolation.
pub fn rescale(buf: &ImageBuffer, factor: f64) -> Result<ImageBuffer> {
    if !(factor > 0.0) {
        return Err(DetectError::InvalidScale(factor));
    }
    if buf.is_empty() {
        return Err(DetectError::EmptyImage);
    }

    let (w, h) = buf.pixels.dimensions();
    let (new_w, new_h) = scaled_dimensions((w, h), factor)?;
    let grayscale_size = match &buf.grayscale {
        Some(gray) => Some(scaled_dimensions(gray.dimensions(), factor)?),
        None => None,
    };

    let pixels = imageops::resize(&buf.pixels, new_w, new_h, FilterType::Triangle);
    let grayscale = buf
        .grayscale
        .as_ref()
        .zip(grayscale_size)
        .map(|(gray, (gw, gh))| imageops::resize(gray, gw, gh, FilterType::Triangle));

    info!("Image Resized");
    debug!("{}x{} -> {}x{} (factor {})", w, h, new_w, new_h, factor);
    Ok(ImageBuffer { pixels, grayscale })
}

/// Smooth the working raster (grayscale when present, color otherwise).
pub fn denoise(buf: &ImageBuffer, kind: DenoiseKind) -> Result<ImageBuffer> {
    if buf.is_empty() {
        return Err(DetectError::EmptyImage);
    }

    let mut next = buf.clone();
    match (kind, &buf.grayscale) {
        (DenoiseKind::Gaussian, Some(gray)) => {
            next.grayscale = Some(separable_filter_equal(gray, &GAUSSIAN_KERNEL_3));
        }
        (DenoiseKind::Gaussian, None) => {
            next.pixels = separable_filter_equal(&buf.pixels, &GAUSSIAN_KERNEL_3);
        }
        (DenoiseKind::Median, Some(gray)) => {
            next.grayscale = Some(median_filter(gray, MEDIAN_RADIUS, MEDIAN_RADIUS));
        }
        (DenoiseKind::Median, None) => {
            next.pixels = median_filter(&buf.pixels, MEDIAN_RADIUS, MEDIAN_RADIUS);
        }
    }

    match kind {
        DenoiseKind::Gaussian => {
            info!("Noise in the image was cleaned using the Gaussian filter")
        }
        DenoiseKind::Median => info!("Noise in the image was cleaned using the median filter"),
    }
    Ok(next)
}

/// Dump every pixel as `Pixel (y, x): R: r, G: g, B: b`, row-major.
pub fn save_rgb_to_file(image: &RgbImage, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let write_err = |source| DetectError::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(write_err)?;
    let mut out = BufWriter::new(file);
    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        writeln!(out, "Pixel ({}, {}): R: {}, G: {}, B: {}", y, x, r, g, b).map_err(write_err)?;
    }
    out.flush().map_err(write_err)?;

    info!("RGB values successfully saved to file: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn scaled_dimension_rounds_and_floors_at_one() {
        assert_eq!(scaled_dimension(10, 2.0), Some(20));
        assert_eq!(scaled_dimension(3, 0.5), Some(2));
        assert_eq!(scaled_dimension(1, 0.01), Some(1));
        assert_eq!(scaled_dimension(64, 1.0e12), None);
        assert_eq!(scaled_dimension(64, f64::INFINITY), None);
    }

    #[test]
    fn pixel_limit_bounds_both_axes_together() {
        assert_eq!(scaled_dimensions((4096, 4096), 2.0).unwrap(), (8192, 8192));
        assert!(matches!(
            scaled_dimensions((64, 64), 1.0e6),
            Err(DetectError::ScaleTooLarge { width: 64, height: 64, .. })
        ));
    }

    #[test]
    fn denoise_leaves_flat_image_flat() {
        let buf = to_grayscale(&ImageBuffer::new(RgbImage::from_pixel(16, 16, Rgb([90, 90, 90]))))
            .unwrap();
        for kind in [DenoiseKind::Gaussian, DenoiseKind::Median] {
            let out = denoise(&buf, kind).unwrap();
            let gray = out.grayscale().unwrap();
            assert!(gray.pixels().all(|p| *p == gray[(0, 0)]));
        }
    }

    #[test]
    fn median_removes_isolated_speck() {
        let mut gray = GrayImage::from_pixel(21, 21, Luma([0]));
        gray.put_pixel(10, 10, Luma([255]));
        let buf = ImageBuffer {
            pixels: RgbImage::new(21, 21),
            grayscale: Some(gray),
        };
        let out = denoise(&buf, DenoiseKind::Median).unwrap();
        assert_eq!(out.grayscale().unwrap()[(10, 10)], Luma([0]));
    }
}
