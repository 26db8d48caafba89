//! Integration tests for the feature artifact.

mod common;

use featscan::features::parse_artifact;
use featscan::{CornerPoint, LineSegment};

use common::*;

fn sample_store() -> FeatureStore {
    let mut store = FeatureStore::new();
    store.set_corners(vec![CornerPoint::new(3, 4), CornerPoint::new(10, 4), CornerPoint::new(0, 9)]);
    store.set_lines(vec![LineSegment::new(0, 0, 99, 0), LineSegment::new(5, 60, 5, 7)]);
    store
}

#[test]
fn test_artifact_has_one_line_per_feature_corners_first() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("Features.txt");
    sample_store().save(&path)?;

    let text = std::fs::read_to_string(&path)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        [
            "Point: (3, 4)",
            "Point: (10, 4)",
            "Point: (0, 9)",
            "Line: (0, 0) -> (99, 0)",
            "Line: (5, 60) -> (5, 7)",
        ]
    );
    assert!(text.ends_with('\n'));
    Ok(())
}

#[test]
fn test_artifact_round_trip() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("Features.txt");
    let store = sample_store();
    store.save(&path)?;

    assert_eq!(FeatureStore::load(&path)?, store);
    Ok(())
}

#[test]
fn test_empty_store_writes_empty_file() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("Empty.txt");
    FeatureStore::new().save(&path)?;

    assert_eq!(std::fs::read_to_string(&path)?, "");
    assert_eq!(parse_artifact("")?, FeatureStore::new());
    Ok(())
}

#[test]
fn test_unwritable_path_fails() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("missing").join("Corners.txt");

    let result = sample_store().save(&path);
    assert!(matches!(result, Err(DetectError::FileWrite { .. })));
    Ok(())
}
