pub mod contours;
pub mod morphology;

use motion_detector_common::config::MAX_KERNEL_SIZE;
use motion_detector_common::frame::GrayFrame;
use serde::Serialize;
use tracing::debug;

use crate::classify::MOTION_CLASS;
use crate::diff::{FrameDiff, Threshold};
use crate::error::DetectError;

/// Confidence attached to every region; the extractor does not score boxes.
pub const DETECTION_CONFIDENCE: f64 = 0.5;

/// One moving region. Coordinates are inclusive pixel indices in the
/// captured frame, so `x_max < width` and `y_max < height`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub class_name: String,
    pub confidence: f64,
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
}

/// Side lengths of the two square structuring elements.
///
/// `denoise` drives the opening that strips salt noise; `close` drives the
/// closing that joins fragments of one moving object. Both must be odd.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kernels {
    denoise: u32,
    close: u32,
}

impl Default for Kernels {
    fn default() -> Self {
        Self {
            denoise: 3,
            close: 15,
        }
    }
}

impl Kernels {
    pub fn new(denoise: u32, close: u32) -> Result<Self, DetectError> {
        for (name, size) in [("denoise", denoise), ("close", close)] {
            if size == 0 || size % 2 == 0 || size > MAX_KERNEL_SIZE {
                return Err(DetectError::InvalidParameter(format!(
                    "{name} kernel must be odd and between 1 and {MAX_KERNEL_SIZE}, got {size}"
                )));
            }
        }
        Ok(Self { denoise, close })
    }

    pub fn denoise(&self) -> u32 {
        self.denoise
    }

    pub fn close(&self) -> u32 {
        self.close
    }

    pub(crate) fn denoise_radius(&self) -> u8 {
        (self.denoise / 2) as u8
    }

    pub(crate) fn close_radius(&self) -> u8 {
        (self.close / 2) as u8
    }
}

/// Turns a frame difference into boxes around the regions that moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionExtractor {
    min_box_area: u64,
    kernels: Kernels,
}

impl RegionExtractor {
    /// Boxes whose area is not strictly greater than `min_box_area` are dropped.
    pub fn new(min_box_area: i64, kernels: Kernels) -> Result<Self, DetectError> {
        let min_box_area = u64::try_from(min_box_area).map_err(|_| {
            DetectError::InvalidParameter(format!(
                "minimum box area must not be negative, got {min_box_area}"
            ))
        })?;
        Ok(Self {
            min_box_area,
            kernels,
        })
    }

    pub fn min_box_area(&self) -> u64 {
        self.min_box_area
    }

    pub fn kernels(&self) -> Kernels {
        self.kernels
    }

    pub fn extract(&self, diff: &FrameDiff, threshold: Threshold) -> Vec<Detection> {
        let mask = diff.foreground_mask(threshold);
        let cleaned = morphology::suppress_noise(&mask, &self.kernels);
        let boxes = contours::outer_bounding_boxes(&cleaned);
        let found = boxes.len();

        let detections: Vec<Detection> = boxes
            .into_iter()
            .filter(|b| b.area() > self.min_box_area)
            .map(|b| Detection {
                class_name: MOTION_CLASS.into(),
                confidence: DETECTION_CONFIDENCE,
                x_min: b.x_min,
                y_min: b.y_min,
                x_max: b.x_max,
                y_max: b.y_max,
            })
            .collect();

        debug!(
            threshold = threshold.value(),
            regions = found,
            kept = detections.len(),
            min_box_area = self.min_box_area,
            "motion regions extracted"
        );
        detections
    }
}

/// Detect moving regions between two captures with the default 3x3 / 15x15 kernels.
pub fn detect(
    frame1: &GrayFrame,
    frame2: &GrayFrame,
    sensitivity: f64,
    min_box_area: i64,
) -> Result<Vec<Detection>, DetectError> {
    detect_with_kernels(frame1, frame2, sensitivity, min_box_area, Kernels::default())
}

pub fn detect_with_kernels(
    frame1: &GrayFrame,
    frame2: &GrayFrame,
    sensitivity: f64,
    min_box_area: i64,
    kernels: Kernels,
) -> Result<Vec<Detection>, DetectError> {
    let threshold = Threshold::from_sensitivity(sensitivity)?;
    let extractor = RegionExtractor::new(min_box_area, kernels)?;
    let diff = FrameDiff::between(frame1, frame2)?;
    Ok(extractor.extract(&diff, threshold))
}
