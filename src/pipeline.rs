use std::path::{Path, PathBuf};

use image::GrayImage;
use log::{debug, info};

use crate::detection::preprocessing::{self, DenoiseKind, ImageBuffer};
use crate::detection::steps::preprocessing_steps;
use crate::detection::{DetectorKind, FeatureDetector, LineDetector};
use crate::display::{Display, Frame, draw_corners, draw_lines};
use crate::error::{DetectError, Result};
use crate::features::FeatureStore;
use crate::models::{FeatureSet, LineSegment, ScaleFactor};

/// Settings shared by every stage of a run.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    /// Directory feature artifacts are written to.
    pub output_dir: PathBuf,
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
        }
    }
}

/// One image, one detector, one feature store.
///
/// A run walks the stages in order: show raw, grayscale, rescale (when the
/// factor is not 1.0), filter (filtered run only), detect, report. Any error
/// abandons the run where it happened.
pub struct DetectionPipeline<D> {
    name: String,
    scale: ScaleFactor,
    image: ImageBuffer,
    features: FeatureStore,
    detector: D,
    context: PipelineContext,
}

impl<D: FeatureDetector> DetectionPipeline<D> {
    /// Load `path` and validate the scale factor.
    pub fn open(path: impl AsRef<Path>, name: impl Into<String>, scale: f64, detector: D) -> Result<Self> {
        let scale = ScaleFactor::new(scale)?;
        let image = preprocessing::load(path)?;
        Ok(Self::from_buffer(image, name, scale, detector))
    }

    /// Build around an already decoded image.
    pub fn from_buffer(image: ImageBuffer, name: impl Into<String>, scale: ScaleFactor, detector: D) -> Self {
        Self {
            name: name.into(),
            scale,
            image,
            features: FeatureStore::new(),
            detector,
            context: PipelineContext::default(),
        }
    }

    pub fn with_context(mut self, context: PipelineContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.context.output_dir = output_dir.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scale(&self) -> ScaleFactor {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f64) -> Result<()> {
        self.scale.set(scale)
    }

    pub fn image(&self) -> &ImageBuffer {
        &self.image
    }

    pub fn features(&self) -> &FeatureStore {
        &self.features
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// Default run: no noise filter.
    pub fn run<V: Display>(&mut self, display: &mut V) -> Result<&FeatureStore> {
        self.execute(None, display)
    }

    /// Run with a Gaussian or median filter after rescaling.
    pub fn run_filtered<V: Display>(&mut self, filter: DenoiseKind, display: &mut V) -> Result<&FeatureStore> {
        self.execute(Some(filter), display)
    }

    fn execute<V: Display>(&mut self, filter: Option<DenoiseKind>, display: &mut V) -> Result<&FeatureStore> {
        info!("Processing '{}'", self.name);
        display.show(&Frame::new("Raw Image", self.image.pixels().clone()))?;

        for step in preprocessing_steps(self.scale, filter) {
            debug!("Running step: {}", step.name());
            self.image = step.apply(&self.image)?;
            display.show(&Frame::new(step.name(), self.image.working_rgb()))?;
        }

        self.detect_features()?;
        self.report(filter.is_some(), display)?;
        Ok(&self.features)
    }

    /// Run the detector on the current grayscale image and replace the
    /// matching feature sequence.
    pub fn detect_features(&mut self) -> Result<()> {
        let gray = self.image.grayscale().ok_or(DetectError::MissingGrayscale)?;
        let set = self.detector.detect(gray)?;
        debug!("{} features detected", set.len());
        self.features.replace(set);
        Ok(())
    }

    /// Persist the features, then show them over the processed image.
    fn report<V: Display>(&self, filtered: bool, display: &mut V) -> Result<()> {
        let kind = self.detector.kind();
        let artifact = self.context.output_dir.join(kind.artifact_name(filtered));
        self.features.save(&artifact)?;
        display.show(&self.overlay(kind))
    }

    /// Annotated view of the current features with a count caption.
    pub fn overlay(&self, kind: DetectorKind) -> Frame {
        let base = self.image.working_rgb();
        let frame = match kind {
            DetectorKind::Corner => Frame::new(kind.window_name(), draw_corners(&base, self.features.corners()))
                .with_label(format!("Corners Detected: {}", self.features.corner_count())),
            DetectorKind::Line => Frame::new(kind.window_name(), draw_lines(&base, self.features.lines()))
                .with_label(format!("Edges Detected: {}", self.features.line_count())),
        };
        if let Some(label) = &frame.label {
            info!("{}", label);
        }
        frame
    }
}

impl DetectionPipeline<LineDetector> {
    /// Re-derive the edge map and segments for a new low threshold.
    ///
    /// Only the detector threshold changes here; the store keeps its lines
    /// until they are handed to [`Self::commit_lines`].
    pub fn retune(&mut self, low: i32) -> Result<(GrayImage, Vec<LineSegment>)> {
        let gray = self.image.grayscale().ok_or(DetectError::MissingGrayscale)?;
        self.detector.set_low_threshold(low)?;
        let extracted = self.detector.extract(gray)?;
        info!("Edge map updated with threshold: {}", low);
        Ok(extracted)
    }

    /// Replace the line sequence wholesale.
    pub fn commit_lines(&mut self, lines: Vec<LineSegment>) {
        self.features.replace(FeatureSet::Lines(lines));
    }
}
