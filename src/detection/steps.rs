use crate::detection::preprocessing::{self, DenoiseKind, ImageBuffer};
use crate::error::Result;
use crate::models::ScaleFactor;

/// Trait that all preprocessing steps implement
pub trait PreprocessStep {
    /// Produce the next buffer in the chain; the input is left untouched.
    fn apply(&self, image: &ImageBuffer) -> Result<ImageBuffer>;

    /// Window the step's result is shown in.
    fn name(&self) -> &str;
}

/// Convert image to grayscale
pub struct GrayscaleStep;

impl PreprocessStep for GrayscaleStep {
    fn apply(&self, image: &ImageBuffer) -> Result<ImageBuffer> {
        preprocessing::to_grayscale(image)
    }

    fn name(&self) -> &str {
        "GrayScale"
    }
}

/// Uniform resize
pub struct RescaleStep {
    pub factor: ScaleFactor,
}

impl PreprocessStep for RescaleStep {
    fn apply(&self, image: &ImageBuffer) -> Result<ImageBuffer> {
        preprocessing::rescale(image, self.factor.get())
    }

    fn name(&self) -> &str {
        "Resized"
    }
}

/// Gaussian or median smoothing
pub struct DenoiseStep {
    pub kind: DenoiseKind,
}

impl PreprocessStep for DenoiseStep {
    fn apply(&self, image: &ImageBuffer) -> Result<ImageBuffer> {
        preprocessing::denoise(image, self.kind)
    }

    fn name(&self) -> &str {
        "Filtered"
    }
}

/// Ordered preprocessing for one run: grayscale, then rescale unless the
/// factor is 1.0, then the optional filter.
pub fn preprocessing_steps(
    scale: ScaleFactor,
    filter: Option<DenoiseKind>,
) -> Vec<Box<dyn PreprocessStep>> {
    let mut steps: Vec<Box<dyn PreprocessStep>> = vec![Box::new(GrayscaleStep)];
    if !scale.is_identity() {
        steps.push(Box::new(RescaleStep { factor: scale }));
    }
    if let Some(kind) = filter {
        steps.push(Box::new(DenoiseStep { kind }));
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(steps: &[Box<dyn PreprocessStep>]) -> Vec<&str> {
        steps.iter().map(|s| s.name()).collect()
    }

    #[test]
    fn identity_scale_skips_rescale() {
        let steps = preprocessing_steps(ScaleFactor::default(), None);
        assert_eq!(names(&steps), ["GrayScale"]);
    }

    #[test]
    fn filtered_run_orders_all_steps() {
        let scale = ScaleFactor::new(0.5).unwrap();
        let steps = preprocessing_steps(scale, Some(DenoiseKind::Median));
        assert_eq!(names(&steps), ["GrayScale", "Resized", "Filtered"]);
    }
}
