pub mod preprocessing;
pub mod corners;
pub mod lines;
pub mod segments;
pub mod steps;

use image::GrayImage;

use crate::error::Result;
use crate::models::FeatureSet;

pub use corners::CornerDetector;
pub use lines::LineDetector;
pub use preprocessing::{DenoiseKind, ImageBuffer};

/// Which family of features a detector produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorKind {
    Corner,
    Line,
}

impl DetectorKind {
    /// Feature file written by the report stage.
    pub fn artifact_name(&self, filtered: bool) -> &'static str {
        match (self, filtered) {
            (DetectorKind::Corner, false) => "Corners.txt",
            (DetectorKind::Corner, true) => "CornersFiltered.txt",
            (DetectorKind::Line, false) => "Lines.txt",
            (DetectorKind::Line, true) => "LinesFiltered.txt",
        }
    }

    /// Window the annotated overlay is shown in.
    pub fn window_name(&self) -> &'static str {
        match self {
            DetectorKind::Corner => "Detected Corners",
            DetectorKind::Line => "Detected Lines",
        }
    }
}

/// The swappable detection step of a pipeline.
pub trait FeatureDetector {
    fn kind(&self) -> DetectorKind;

    /// Detect features on a grayscale image. The returned set replaces the
    /// matching sequence of the feature store as a whole.
    fn detect(&self, gray: &GrayImage) -> Result<FeatureSet>;
}
