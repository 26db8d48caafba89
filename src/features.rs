use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;

use crate::error::{DetectError, Result};
use crate::models::{CornerPoint, FeatureSet, LineSegment};

/// Detected corners and line segments, in detection order.
///
/// Each detection pass swaps one sequence out wholesale; nothing is merged
/// across passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureStore {
    corners: Vec<CornerPoint>,
    lines: Vec<LineSegment>,
}

impl FeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn corners(&self) -> &[CornerPoint] {
        &self.corners
    }

    pub fn lines(&self) -> &[LineSegment] {
        &self.lines
    }

    pub fn corner_count(&self) -> usize {
        self.corners.len()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn set_corners(&mut self, corners: Vec<CornerPoint>) {
        self.corners = corners;
    }

    pub fn set_lines(&mut self, lines: Vec<LineSegment>) {
        self.lines = lines;
    }

    /// Swap in the result of a detection pass.
    pub fn replace(&mut self, set: FeatureSet) {
        match set {
            FeatureSet::Corners(corners) => self.set_corners(corners),
            FeatureSet::Lines(lines) => self.set_lines(lines),
        }
    }

    /// Write the artifact: corners first, then lines, one per line.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let write_err = |source| DetectError::FileWrite {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(write_err)?;
        let mut out = BufWriter::new(file);
        for corner in &self.corners {
            writeln!(out, "{}", corner).map_err(write_err)?;
        }
        for line in &self.lines {
            writeln!(out, "{}", line).map_err(write_err)?;
        }
        out.flush().map_err(write_err)?;

        info!("Features saved to file: {}", path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| DetectError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        parse_artifact(&text)
    }
}

/// Parse artifact text back into a store. Blank lines are skipped.
pub fn parse_artifact(text: &str) -> Result<FeatureStore> {
    let mut store = FeatureStore::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let malformed = || DetectError::Parse {
            line: idx + 1,
            content: raw.to_string(),
        };
        if line.starts_with("Point:") {
            store.corners.push(line.parse().map_err(|_| malformed())?);
        } else if line.starts_with("Line:") {
            store.lines.push(line.parse().map_err(|_| malformed())?);
        } else {
            return Err(malformed());
        }
    }
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_swaps_only_matching_sequence() {
        let mut store = FeatureStore::new();
        store.set_corners(vec![CornerPoint::new(1, 1)]);
        store.set_lines(vec![LineSegment::new(0, 0, 5, 5)]);

        store.replace(FeatureSet::Lines(vec![]));
        assert_eq!(store.corner_count(), 1);
        assert_eq!(store.line_count(), 0);

        store.replace(FeatureSet::Corners(vec![CornerPoint::new(2, 3), CornerPoint::new(4, 5)]));
        assert_eq!(store.corners(), &[CornerPoint::new(2, 3), CornerPoint::new(4, 5)]);
    }

    #[test]
    fn parse_rejects_unknown_lines() {
        let err = parse_artifact("Point: (1, 2)\nCircle: (3, 4)\n").unwrap_err();
        assert!(matches!(err, DetectError::Parse { line: 2, .. }));
    }
}
