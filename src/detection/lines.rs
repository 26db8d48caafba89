use image::GrayImage;
use imageproc::edges::canny;
use log::{debug, info};

use super::segments::{SegmentParams, detect_segments};
use super::{DetectorKind, FeatureDetector};
use crate::error::{DetectError, Result};
use crate::models::{FeatureSet, LineSegment, ThresholdState};

/// High edge threshold as a multiple of the low one.
pub const HIGH_THRESHOLD_RATIO: i32 = 3;

/// Binary edge map from a dual-threshold operator.
pub fn edge_map(gray: &GrayImage, low: i32) -> GrayImage {
    let high = low * HIGH_THRESHOLD_RATIO;
    debug!("Edge map with thresholds ({}, {})", low, high);
    canny(gray, low as f32, high as f32)
}

/// Edge map followed by probabilistic segment accumulation.
#[derive(Debug, Clone, Default)]
pub struct LineDetector {
    threshold: ThresholdState,
    params: SegmentParams,
}

impl LineDetector {
    pub fn new(low_threshold: i32) -> Result<Self> {
        Ok(Self {
            threshold: ThresholdState::new(low_threshold, ThresholdState::DEFAULT_MAX)?,
            params: SegmentParams::default(),
        })
    }

    pub fn threshold(&self) -> ThresholdState {
        self.threshold
    }

    pub fn low_threshold(&self) -> i32 {
        self.threshold.low()
    }

    pub fn set_low_threshold(&mut self, low: i32) -> Result<()> {
        self.threshold.set_low(low)
    }

    /// Replace the whole threshold state, including its upper bound.
    pub fn set_threshold(&mut self, threshold: ThresholdState) {
        self.threshold = threshold;
    }

    /// Edge map and the segments found on it for the current threshold.
    pub fn extract(&self, gray: &GrayImage) -> Result<(GrayImage, Vec<LineSegment>)> {
        if gray.width() == 0 || gray.height() == 0 {
            return Err(DetectError::EmptyImage);
        }
        let edges = edge_map(gray, self.threshold.low());
        let lines = detect_segments(&edges, &self.params);
        Ok((edges, lines))
    }
}

impl FeatureDetector for LineDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Line
    }

    fn detect(&self, gray: &GrayImage) -> Result<FeatureSet> {
        let (_, lines) = self.extract(gray)?;
        info!("Lines detected and stored in features.");
        Ok(FeatureSet::Lines(lines))
    }
}
