use motion_detector_common::frame::GrayFrame;
use serde::Serialize;
use tracing::debug;

use crate::diff::{FrameDiff, Threshold};
use crate::error::DetectError;

/// The only label this detector ever reports.
pub const MOTION_CLASS: &str = "motion";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub class_name: String,
    /// Fraction of pixels whose difference reached the threshold, in [0, 1].
    pub confidence: f64,
}

/// Classify how much of the scene moved between two captures.
///
/// Always produces exactly one classification once the inputs are valid.
pub fn classify(
    frame1: &GrayFrame,
    frame2: &GrayFrame,
    sensitivity: f64,
) -> Result<Classification, DetectError> {
    let threshold = Threshold::from_sensitivity(sensitivity)?;
    let diff = FrameDiff::between(frame1, frame2)?;
    Ok(classify_diff(&diff, threshold))
}

/// Classification step on an already computed difference.
pub fn classify_diff(diff: &FrameDiff, threshold: Threshold) -> Classification {
    let mask = diff.unit_mask(threshold);
    let active = mask.active();
    let confidence = if mask.is_empty() {
        0.0
    } else {
        active as f64 / mask.len() as f64
    };
    debug!(
        threshold = threshold.value(),
        active,
        total = mask.len(),
        confidence = format!("{:.4}", confidence),
        "motion classification"
    );
    Classification {
        class_name: MOTION_CLASS.into(),
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn half_changed(width: u32, height: u32, value: u8) -> (GrayFrame, GrayFrame) {
        let still = GrayFrame::new(width, height);
        let moved = GrayFrame::from_fn(width, height, |x, _| if x < width / 2 { value } else { 0 });
        (still, moved)
    }

    #[test]
    fn identical_frames_have_zero_confidence() {
        let frame = GrayFrame::from_fn(16, 12, |x, y| ((x * 13 + y * 7) % 256) as u8);
        for s in [0.0, 0.1, 0.5, 0.9, 1.0] {
            let c = classify(&frame, &frame.clone(), s).unwrap();
            assert_eq!(c.class_name, "motion");
            assert_eq!(c.confidence, 0.0, "sensitivity {s}");
        }
    }

    #[test]
    fn uniform_frames_have_zero_confidence() {
        let a = GrayFrame::from_fn(8, 8, |_, _| 90);
        let c = classify(&a, &a.clone(), 0.9).unwrap();
        assert_eq!(c.confidence, 0.0);
    }

    #[test]
    fn confidence_is_fraction_of_changed_pixels() {
        let (a, b) = half_changed(10, 10, 100);
        let c = classify(&a, &b, 0.9).unwrap();
        assert_eq!(c.confidence, 0.5);

        // below threshold (k = 25) nothing counts
        let (a, b) = half_changed(10, 10, 24);
        assert_eq!(classify(&a, &b, 0.9).unwrap().confidence, 0.0);

        // exactly at threshold counts
        let (a, b) = half_changed(10, 10, 25);
        assert_eq!(classify(&a, &b, 0.9).unwrap().confidence, 0.5);
    }

    #[test]
    fn full_change_is_one() {
        let a = GrayFrame::new(4, 4);
        let b = GrayFrame::from_fn(4, 4, |_, _| 255);
        assert_eq!(classify(&a, &b, 0.0).unwrap().confidence, 1.0);
    }

    #[test]
    fn confidence_monotonic_in_sensitivity() {
        // every difference value 0..=255 appears once
        let a = GrayFrame::new(16, 16);
        let b = GrayFrame::from_fn(16, 16, |x, y| (y * 16 + x) as u8);
        let mut previous = 0.0;
        for step in 0..=20 {
            let s = step as f64 / 20.0;
            let c = classify(&a, &b, s).unwrap().confidence;
            assert!((0.0..=1.0).contains(&c));
            assert!(c >= previous, "confidence dropped at sensitivity {s}");
            previous = c;
        }
    }

    #[test]
    fn classify_is_pure() {
        let a = GrayFrame::from_fn(20, 20, |x, y| (x * y) as u8);
        let b = GrayFrame::from_fn(20, 20, |x, y| (x + y) as u8);
        let first = classify(&a, &b, 0.7).unwrap();
        let second = classify(&a, &b, 0.7).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.confidence.to_bits(), second.confidence.to_bits());
    }

    #[test]
    fn mismatched_frames_fail() {
        let a = GrayFrame::new(10, 10);
        let b = GrayFrame::new(10, 20);
        assert!(matches!(
            classify(&a, &b, 0.9),
            Err(DetectError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn invalid_sensitivity_fails_before_dimension_check() {
        let a = GrayFrame::new(10, 10);
        let b = GrayFrame::new(10, 20);
        assert!(matches!(
            classify(&a, &b, 2.0),
            Err(DetectError::InvalidParameter(_))
        ));
    }

    #[test]
    fn empty_frames_have_zero_confidence() {
        let a = GrayFrame::new(0, 0);
        assert_eq!(classify(&a, &a.clone(), 0.9).unwrap().confidence, 0.0);
    }
}
