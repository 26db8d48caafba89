use std::fmt;
use std::str::FromStr;

use crate::error::DetectError;

/// Pixel coordinate of an accepted corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CornerPoint {
    pub x: i32,
    pub y: i32,
}

impl CornerPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Straight segment between two pixel endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineSegment {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl LineSegment {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn start(&self) -> (i32, i32) {
        (self.x1, self.y1)
    }

    pub fn end(&self) -> (i32, i32) {
        (self.x2, self.y2)
    }

    /// Longest axis-aligned extent, the measure used for the minimum length test.
    pub fn extent(&self) -> i32 {
        (self.x2 - self.x1).abs().max((self.y2 - self.y1).abs())
    }
}

// Artifact line formats: `Point: (x, y)` and `Line: (x1, y1) -> (x2, y2)`.

impl fmt::Display for CornerPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point: ({}, {})", self.x, self.y)
    }
}

impl fmt::Display for LineSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Line: ({}, {}) -> ({}, {})",
            self.x1, self.y1, self.x2, self.y2
        )
    }
}

/// Parse `(a, b)` into a coordinate pair.
fn parse_pair(s: &str) -> Option<(i32, i32)> {
    let inner = s.trim().strip_prefix('(')?.strip_suffix(')')?;
    let (a, b) = inner.split_once(',')?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}

impl FromStr for CornerPoint {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix("Point:").ok_or(())?;
        let (x, y) = parse_pair(rest).ok_or(())?;
        Ok(Self { x, y })
    }
}

impl FromStr for LineSegment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix("Line:").ok_or(())?;
        let (start, end) = rest.split_once("->").ok_or(())?;
        let (x1, y1) = parse_pair(start).ok_or(())?;
        let (x2, y2) = parse_pair(end).ok_or(())?;
        Ok(Self { x1, y1, x2, y2 })
    }
}

/// Output of one detection pass. Each pass replaces exactly one sequence
/// of the feature store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureSet {
    Corners(Vec<CornerPoint>),
    Lines(Vec<LineSegment>),
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        match self {
            FeatureSet::Corners(c) => c.len(),
            FeatureSet::Lines(l) => l.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Uniform resize factor, always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactor(f64);

impl ScaleFactor {
    pub fn new(value: f64) -> Result<Self, DetectError> {
        // `!(v > 0)` also rejects NaN
        if !(value > 0.0) {
            return Err(DetectError::InvalidScale(value));
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> f64 {
        self.0
    }

    pub fn set(&mut self, value: f64) -> Result<(), DetectError> {
        *self = Self::new(value)?;
        Ok(())
    }

    pub fn is_identity(&self) -> bool {
        self.0 == 1.0
    }
}

impl Default for ScaleFactor {
    fn default() -> Self {
        Self(1.0)
    }
}

/// Acceptance threshold on the normalized corner response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityLevel(i32);

impl QualityLevel {
    pub const MAX: i32 = 100;
    pub const DEFAULT: i32 = 50;

    pub fn new(value: i32) -> Result<Self, DetectError> {
        if !(0..=Self::MAX).contains(&value) {
            return Err(DetectError::InvalidQuality(value));
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> i32 {
        self.0
    }
}

impl Default for QualityLevel {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Low edge threshold together with the upper bound of its control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdState {
    low: i32,
    max: i32,
}

impl ThresholdState {
    pub const DEFAULT_LOW: i32 = 50;
    pub const DEFAULT_MAX: i32 = 255;

    pub fn new(low: i32, max: i32) -> Result<Self, DetectError> {
        if max < 0 || !(0..=max).contains(&low) {
            return Err(DetectError::InvalidThreshold { value: low, max });
        }
        Ok(Self { low, max })
    }

    pub fn low(&self) -> i32 {
        self.low
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn set_low(&mut self, low: i32) -> Result<(), DetectError> {
        *self = Self::new(low, self.max)?;
        Ok(())
    }

    /// Pull an arbitrary control value into `[0, max]`.
    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(0, self.max)
    }
}

impl Default for ThresholdState {
    fn default() -> Self {
        Self {
            low: Self::DEFAULT_LOW,
            max: Self::DEFAULT_MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_rejects_non_positive() {
        assert!(ScaleFactor::new(0.0).is_err());
        assert!(ScaleFactor::new(-1.5).is_err());
        assert!(ScaleFactor::new(f64::NAN).is_err());
        assert!(ScaleFactor::new(0.5).is_ok());
    }

    #[test]
    fn scale_setter_keeps_previous_value_on_error() {
        let mut scale = ScaleFactor::new(2.0).unwrap();
        assert!(scale.set(-1.0).is_err());
        assert_eq!(scale.get(), 2.0);
    }

    #[test]
    fn quality_bounds_are_enforced() {
        assert!(QualityLevel::new(-1).is_err());
        assert!(QualityLevel::new(101).is_err());
        assert_eq!(QualityLevel::new(100).unwrap().get(), 100);
    }

    #[test]
    fn threshold_stays_within_max() {
        let mut state = ThresholdState::default();
        assert!(state.set_low(256).is_err());
        assert_eq!(state.low(), 50);
        assert_eq!(state.clamp(300), 255);
        assert_eq!(state.clamp(-4), 0);
    }

    #[test]
    fn artifact_lines_parse_back() {
        let p: CornerPoint = "Point: (12, -3)".parse().unwrap();
        assert_eq!(p, CornerPoint::new(12, -3));
        let l: LineSegment = "Line: (1, 2) -> (30, 40)".parse().unwrap();
        assert_eq!(l, LineSegment::new(1, 2, 30, 40));
        assert!("Line: (1, 2)".parse::<LineSegment>().is_err());
    }
}
