//! Integration tests for edge-map plus segment line detection.

mod common;

use featscan::LineSegment;
use featscan::detection::lines::edge_map;

use common::*;

fn lines_of(detector: &LineDetector, gray: &image::GrayImage) -> Vec<LineSegment> {
    match detector.detect(gray).expect("Line detection failed") {
        FeatureSet::Lines(l) => l,
        other => panic!("Expected lines, got {:?}", other),
    }
}

#[test]
fn test_square_outline_yields_long_segments() -> anyhow::Result<()> {
    let gray = gray_of(&square_image(200, 50, 150));
    let lines = lines_of(&LineDetector::default(), &gray);

    assert!(!lines.is_empty(), "Square sides should produce segments");
    for l in &lines {
        assert!(l.extent() >= 50, "Segment {:?} is shorter than the minimum", l);
        for (x, y) in [l.start(), l.end()] {
            assert!((0..200).contains(&x) && (0..200).contains(&y));
        }
    }
    Ok(())
}

#[test]
fn test_detection_is_deterministic() -> anyhow::Result<()> {
    let gray = gray_of(&two_square_image());
    let detector = LineDetector::new(60)?;

    let first = lines_of(&detector, &gray);
    let second = lines_of(&detector, &gray);
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_flat_image_has_no_lines() -> anyhow::Result<()> {
    let gray = gray_of(&uniform_image(120, 80, 200));
    assert!(edge_map(&gray, 50).pixels().all(|p| p[0] == 0));
    assert!(lines_of(&LineDetector::default(), &gray).is_empty());
    Ok(())
}

#[test]
fn test_threshold_above_max_is_rejected() -> anyhow::Result<()> {
    assert!(matches!(
        LineDetector::new(256),
        Err(DetectError::InvalidThreshold { value: 256, max: 255 })
    ));

    let mut detector = LineDetector::default();
    assert!(detector.set_low_threshold(-1).is_err());
    assert_eq!(detector.low_threshold(), 50);
    Ok(())
}
