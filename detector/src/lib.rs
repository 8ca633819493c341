//! Frame-differencing motion detection.
//!
//! Two captures of the same camera are compared pixel by pixel. The
//! thresholded difference is either summarised into a single "motion"
//! confidence (`classify`) or cleaned up morphologically and turned into
//! bounding boxes (`detect`). Both are pure functions; `MotionDetector`
//! wraps them behind a camera for hosts that want a service.

pub mod camera;
pub mod classify;
pub mod diff;
pub mod error;
pub mod regions;
pub mod service;

pub use camera::{Camera, CameraError, CapturedFrame, ImageSequenceCamera};
pub use classify::{classify, Classification, MOTION_CLASS};
pub use error::DetectError;
pub use regions::{detect, detect_with_kernels, Detection, Kernels};
pub use service::{CaptureAllResult, CaptureOptions, MotionDetector, Properties, ServiceError};
