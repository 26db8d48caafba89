use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};
use log::info;

use crate::error::{DetectError, Result};
use crate::models::{CornerPoint, LineSegment};

const CORNER_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const LINE_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const CORNER_RADIUS: i32 = 5;

/// One image shown in a named window, with an optional caption.
#[derive(Debug, Clone)]
pub struct Frame {
    pub window: String,
    pub image: RgbImage,
    pub label: Option<String>,
}

impl Frame {
    pub fn new(window: impl Into<String>, image: RgbImage) -> Self {
        Self {
            window: window.into(),
            image,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Where frames go. Implementations may block until the viewer is done.
pub trait Display {
    fn show(&mut self, frame: &Frame) -> Result<()>;
}

/// Green rings around each corner.
pub fn draw_corners(base: &RgbImage, corners: &[CornerPoint]) -> RgbImage {
    let mut canvas = base.clone();
    for c in corners {
        // two rings for a 2px stroke
        draw_hollow_circle_mut(&mut canvas, (c.x, c.y), CORNER_RADIUS, CORNER_COLOR);
        draw_hollow_circle_mut(&mut canvas, (c.x, c.y), CORNER_RADIUS + 1, CORNER_COLOR);
    }
    canvas
}

/// Blue strokes along each segment.
pub fn draw_lines(base: &RgbImage, lines: &[LineSegment]) -> RgbImage {
    let mut canvas = base.clone();
    for l in lines {
        let (x1, y1) = (l.x1 as f32, l.y1 as f32);
        let (x2, y2) = (l.x2 as f32, l.y2 as f32);
        draw_line_segment_mut(&mut canvas, (x1, y1), (x2, y2), LINE_COLOR);
        // thicken across the minor axis
        let (ox, oy) = if (l.x2 - l.x1).abs() >= (l.y2 - l.y1).abs() {
            (0.0, 1.0)
        } else {
            (1.0, 0.0)
        };
        draw_line_segment_mut(&mut canvas, (x1 + ox, y1 + oy), (x2 + ox, y2 + oy), LINE_COLOR);
    }
    canvas
}

/// Window name as a file-name fragment: "Line Map" -> "line_map".
fn window_slug(window: &str) -> String {
    window
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Writes every frame to `<dir>/<NN>_<window>.png`.
pub struct PngDisplay {
    output_dir: PathBuf,
    shown: usize,
}

impl PngDisplay {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).map_err(|source| DetectError::FileWrite {
            path: output_dir.clone(),
            source,
        })?;
        Ok(Self {
            output_dir,
            shown: 0,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Number of frames written so far.
    pub fn shown(&self) -> usize {
        self.shown
    }
}

impl Display for PngDisplay {
    fn show(&mut self, frame: &Frame) -> Result<()> {
        self.shown += 1;
        let filename = format!("{:02}_{}.png", self.shown, window_slug(&frame.window));
        let path = self.output_dir.join(&filename);
        frame
            .image
            .save(&path)
            .map_err(|e| DetectError::Display(format!("failed to save {}: {}", path.display(), e)))?;

        match &frame.label {
            Some(label) => info!("{} [{}] -> {}", frame.window, label, filename),
            None => info!("{} -> {}", frame.window, filename),
        }
        Ok(())
    }
}
