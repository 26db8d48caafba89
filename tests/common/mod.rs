#![allow(dead_code, unused_imports)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from featscan for tests
pub use featscan::detection::preprocessing::{load, rescale, to_grayscale};
pub use featscan::{
    CornerDetector, DetectError, DetectionPipeline, Display, FeatureDetector, FeatureSet, FeatureStore,
    Frame, ImageBuffer, LineDetector, ScaleFactor,
};
