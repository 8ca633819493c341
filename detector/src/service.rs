use motion_detector_common::config::{Config, ConfigError};
use motion_detector_common::frame::GrayFrame;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::camera::{Camera, CameraError};
use crate::classify::{classify_diff, Classification};
use crate::diff::{FrameDiff, Threshold};
use crate::error::DetectError;
use crate::regions::{Detection, Kernels, RegionExtractor};

/// What the service can answer, as reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Properties {
    pub classifications_supported: bool,
    pub detections_supported: bool,
    pub object_point_clouds_supported: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CaptureOptions {
    pub return_image: bool,
    pub return_classifications: bool,
    pub return_detections: bool,
}

impl CaptureOptions {
    pub fn all() -> Self {
        Self {
            return_image: true,
            return_classifications: true,
            return_detections: true,
        }
    }
}

/// Outputs of one capture-all call. Fields are `None` when not requested.
#[derive(Debug, Clone, Default)]
pub struct CaptureAllResult {
    /// The second of the two captured frames.
    pub image: Option<GrayFrame>,
    pub classifications: Option<Vec<Classification>>,
    pub detections: Option<Vec<Detection>>,
}

/// Motion vision service bound to one camera.
///
/// Every query captures two frames back to back and compares them; nothing
/// is remembered between queries.
pub struct MotionDetector<C> {
    camera: C,
    camera_name: String,
    sensitivity: f64,
    threshold: Threshold,
    extractor: RegionExtractor,
}

impl<C: Camera> MotionDetector<C> {
    pub fn new(config: &Config, camera: C) -> Result<Self, ServiceError> {
        let (camera_name, sensitivity, threshold, extractor) = Self::settings_from(config)?;
        info!(
            camera = camera_name,
            sensitivity,
            threshold = threshold.value(),
            min_box_area = extractor.min_box_area(),
            "motion detector created"
        );
        Ok(Self {
            camera,
            camera_name,
            sensitivity,
            threshold,
            extractor,
        })
    }

    /// Apply a new configuration. On error the previous settings stay in place.
    pub fn reconfigure(&mut self, config: &Config) -> Result<(), ServiceError> {
        let (camera_name, sensitivity, threshold, extractor) = Self::settings_from(config)?;
        info!(
            camera = camera_name,
            sensitivity,
            threshold = threshold.value(),
            min_box_area = extractor.min_box_area(),
            "motion detector reconfigured"
        );
        self.camera_name = camera_name;
        self.sensitivity = sensitivity;
        self.threshold = threshold;
        self.extractor = extractor;
        Ok(())
    }

    fn settings_from(
        config: &Config,
    ) -> Result<(String, f64, Threshold, RegionExtractor), ServiceError> {
        config.validate()?;
        let detector = &config.detector;
        let kernels = Kernels::new(detector.denoise_kernel, detector.close_kernel)?;
        let extractor = RegionExtractor::new(detector.min_box_size, kernels)?;
        let sensitivity = detector.effective_sensitivity();
        let threshold = Threshold::from_sensitivity(sensitivity)?;
        Ok((config.camera.name.clone(), sensitivity, threshold, extractor))
    }

    pub fn camera_name(&self) -> &str {
        &self.camera_name
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    pub fn properties(&self) -> Properties {
        Properties {
            classifications_supported: true,
            detections_supported: true,
            object_point_clouds_supported: false,
        }
    }

    /// Classify motion between two fresh captures. Always one result.
    pub async fn classifications(&self) -> Result<Vec<Classification>, ServiceError> {
        let (first, second) = self.capture_pair().await?;
        let threshold = self.threshold;
        let classification = run_blocking(move || {
            let diff = FrameDiff::between(&first, &second)?;
            Ok(classify_diff(&diff, threshold))
        })
        .await?;
        Ok(vec![classification])
    }

    pub async fn classifications_from_camera(
        &self,
        camera_name: &str,
    ) -> Result<Vec<Classification>, ServiceError> {
        self.check_camera(camera_name)?;
        self.classifications().await
    }

    /// Boxes around regions that moved between two fresh captures.
    pub async fn detections(&self) -> Result<Vec<Detection>, ServiceError> {
        let (first, second) = self.capture_pair().await?;
        let threshold = self.threshold;
        let extractor = self.extractor;
        run_blocking(move || {
            let diff = FrameDiff::between(&first, &second)?;
            Ok(extractor.extract(&diff, threshold))
        })
        .await
    }

    pub async fn detections_from_camera(
        &self,
        camera_name: &str,
    ) -> Result<Vec<Detection>, ServiceError> {
        self.check_camera(camera_name)?;
        self.detections().await
    }

    /// One pair of captures feeds every requested output.
    pub async fn capture_all_from_camera(
        &self,
        camera_name: &str,
        options: CaptureOptions,
    ) -> Result<CaptureAllResult, ServiceError> {
        self.check_camera(camera_name)?;
        let (first, second) = self.capture_pair().await?;
        if !options.return_classifications && !options.return_detections {
            return Ok(CaptureAllResult {
                image: options.return_image.then_some(second),
                ..Default::default()
            });
        }

        let threshold = self.threshold;
        let extractor = self.extractor;
        run_blocking(move || {
            let diff = FrameDiff::between(&first, &second)?;
            let classifications = options
                .return_classifications
                .then(|| vec![classify_diff(&diff, threshold)]);
            let detections = options
                .return_detections
                .then(|| extractor.extract(&diff, threshold));
            Ok(CaptureAllResult {
                image: options.return_image.then_some(second),
                classifications,
                detections,
            })
        })
        .await
    }

    fn check_camera(&self, camera_name: &str) -> Result<(), ServiceError> {
        if camera_name != self.camera_name {
            warn!(
                requested = camera_name,
                configured = self.camera_name,
                "query for a camera this detector is not bound to"
            );
            return Err(ServiceError::CameraMismatch {
                requested: camera_name.to_string(),
                configured: self.camera_name.clone(),
            });
        }
        Ok(())
    }

    /// Two sequential captures; the second call starts after the first returns.
    async fn capture_pair(&self) -> Result<(GrayFrame, GrayFrame), ServiceError> {
        let first = self.camera.get_image().await?;
        let second = self.camera.get_image().await?;
        debug!(
            camera = self.camera.name(),
            gap_ms = (second.captured_at - first.captured_at).num_milliseconds(),
            width = second.frame.width(),
            height = second.frame.height(),
            "captured frame pair"
        );
        Ok((first.frame, second.frame))
    }
}

/// Run the CPU-bound part of a query off the async executor.
async fn run_blocking<T, F>(work: F) -> Result<T, ServiceError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, DetectError> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ServiceError::Task(e.to_string()))?;
    Ok(result?)
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("camera error: {0}")]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Detect(#[from] DetectError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("camera name passed to method: {requested} is not the configured source camera: {configured}")]
    CameraMismatch { requested: String, configured: String },
    #[error("detection task failed: {0}")]
    Task(String),
}
