use image::{GrayImage, Luma};
use motion_detector_common::frame::GrayFrame;

use crate::error::DetectError;

/// Intensity difference at or above which a pixel counts as moving.
///
/// Derived from sensitivity as `floor((1 - sensitivity) * 255)`. A zero
/// difference is never motion, so identical frames stay motionless even at
/// sensitivity 1.0 where the threshold itself is 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold(u8);

impl Threshold {
    pub fn from_sensitivity(sensitivity: f64) -> Result<Self, DetectError> {
        // NaN fails the range check as well.
        if !(0.0..=1.0).contains(&sensitivity) {
            return Err(DetectError::InvalidParameter(format!(
                "sensitivity must be between 0 and 1, got {sensitivity}"
            )));
        }
        Ok(Self(((1.0 - sensitivity) * 255.0).floor() as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_motion(self, diff: u8) -> bool {
        diff > 0 && diff >= self.0
    }
}

/// Absolute per-pixel difference of two equally-sized frames (0..=255).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameDiff {
    image: GrayImage,
}

impl FrameDiff {
    /// Fails with `DimensionMismatch` unless both frames share width and height.
    /// Neither input is modified.
    pub fn between(first: &GrayFrame, second: &GrayFrame) -> Result<Self, DetectError> {
        if first.dimensions() != second.dimensions() {
            return Err(DetectError::DimensionMismatch {
                left: first.dimensions(),
                right: second.dimensions(),
            });
        }
        let (a, b) = (first.as_image(), second.as_image());
        let image = GrayImage::from_fn(first.width(), first.height(), |x, y| {
            Luma([a.get_pixel(x, y)[0].abs_diff(b.get_pixel(x, y)[0])])
        });
        Ok(Self { image })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    /// 0/1 encoding, for summing activated pixels.
    pub fn unit_mask(&self, threshold: Threshold) -> UnitMask {
        let values = self
            .image
            .as_raw()
            .iter()
            .map(|&d| u8::from(threshold.is_motion(d)))
            .collect();
        UnitMask { values }
    }

    /// 0/255 encoding, the white-on-black image morphology and contour tracing expect.
    pub fn foreground_mask(&self, threshold: Threshold) -> GrayImage {
        let mut mask = self.image.clone();
        for pixel in mask.pixels_mut() {
            pixel[0] = if threshold.is_motion(pixel[0]) { 255 } else { 0 };
        }
        mask
    }
}

/// Binary mask with values in {0, 1}. Never feed this to morphology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitMask {
    values: Vec<u8>,
}

impl UnitMask {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of activated pixels, i.e. the sum of the mask.
    pub fn active(&self) -> u64 {
        self.values.iter().map(|&v| u64::from(v)).sum()
    }
}
