use featscan::detection::preprocessing::to_grayscale;
use featscan::{Display, Frame, ImageBuffer};
use image::{GrayImage, Rgb, RgbImage};
use tempfile::NamedTempFile;

/// Dark canvas with a filled bright square covering `[lo, hi)` on both axes.
pub fn square_image(size: u32, lo: u32, hi: u32) -> RgbImage {
    RgbImage::from_fn(size, size, |x, y| {
        if (lo..hi).contains(&x) && (lo..hi).contains(&y) {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    })
}

/// A full-contrast square next to a medium-contrast one, so edge maps differ
/// between low and high thresholds.
pub fn two_square_image() -> RgbImage {
    RgbImage::from_fn(320, 200, |x, y| {
        let strong = (30..130).contains(&x) && (50..150).contains(&y);
        let medium = (190..290).contains(&x) && (50..150).contains(&y);
        if strong {
            Rgb([255, 255, 255])
        } else if medium {
            Rgb([100, 100, 100])
        } else {
            Rgb([0, 0, 0])
        }
    })
}

pub fn uniform_image(width: u32, height: u32, value: u8) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([value, value, value]))
}

pub fn gray_of(img: &RgbImage) -> GrayImage {
    to_grayscale(&ImageBuffer::new(img.clone()))
        .expect("Failed to convert test image")
        .grayscale()
        .expect("Grayscale missing after conversion")
        .clone()
}

/// Saves an image to a temp PNG that is removed when dropped.
pub fn save_temp_png(img: &RgbImage) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    img.save_with_format(file.path(), image::ImageFormat::Png)
        .expect("Failed to save test image");
    file
}

/// Display that keeps every frame it is shown.
#[derive(Default)]
pub struct RecordingDisplay {
    pub frames: Vec<Frame>,
}

impl RecordingDisplay {
    pub fn windows(&self) -> Vec<&str> {
        self.frames.iter().map(|f| f.window.as_str()).collect()
    }

    pub fn frames_for<'a>(&'a self, window: &'a str) -> impl Iterator<Item = &'a Frame> + 'a {
        self.frames.iter().filter(move |f| f.window == window)
    }
}

impl Display for RecordingDisplay {
    fn show(&mut self, frame: &Frame) -> featscan::Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }
}
