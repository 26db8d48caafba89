pub mod detection;
pub mod display;
pub mod error;
pub mod features;
pub mod models;
pub mod pipeline;
pub mod tuner;

pub use detection::{CornerDetector, DenoiseKind, DetectorKind, FeatureDetector, ImageBuffer, LineDetector};
pub use display::{Display, Frame, PngDisplay};
pub use error::{DetectError, Result};
pub use features::FeatureStore;
pub use models::{CornerPoint, FeatureSet, LineSegment, QualityLevel, ScaleFactor, ThresholdState};
pub use pipeline::{DetectionPipeline, PipelineContext};
pub use tuner::{
    ChannelEvents, ConsoleEvents, EventSource, InteractiveTuner, ThresholdControl, TunerEvent,
    TuningSummary, adjustable_control,
};
