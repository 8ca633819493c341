use chrono::{DateTime, Utc};
use motion_detector_common::frame::{FrameError, GrayFrame};
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// A frame as handed over by the camera, stamped with its capture time.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub frame: GrayFrame,
    pub captured_at: DateTime<Utc>,
}

impl CapturedFrame {
    pub fn now(frame: GrayFrame) -> Self {
        Self {
            frame,
            captured_at: Utc::now(),
        }
    }
}

/// Frame-acquisition capability supplied by the host.
///
/// Each call returns the camera's current frame. The detector calls it twice
/// in a row and treats the two results as consecutive captures.
pub trait Camera: Send + Sync {
    /// Name the camera is configured under.
    fn name(&self) -> &str;

    fn get_image(&self) -> impl Future<Output = Result<CapturedFrame, CameraError>> + Send;
}

/// Replays a fixed list of image files, one per `get_image` call, wrapping
/// around at the end.
pub struct ImageSequenceCamera {
    name: String,
    paths: Vec<PathBuf>,
    next: AtomicUsize,
}

impl ImageSequenceCamera {
    pub fn new(name: impl Into<String>, paths: Vec<PathBuf>) -> Self {
        Self {
            name: name.into(),
            paths,
            next: AtomicUsize::new(0),
        }
    }
}

impl Camera for ImageSequenceCamera {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_image(&self) -> Result<CapturedFrame, CameraError> {
        if self.paths.is_empty() {
            return Err(CameraError::Empty(self.name.clone()));
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.paths.len();
        let path = &self.paths[index];
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| CameraError::Read(path.display().to_string(), e))?;
        let frame = GrayFrame::decode(&bytes)?;
        debug!(
            camera = self.name,
            path = %path.display(),
            width = frame.width(),
            height = frame.height(),
            "frame loaded"
        );
        Ok(CapturedFrame::now(frame))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("failed to read frame {0}: {1}")]
    Read(String, std::io::Error),
    #[error(transparent)]
    Decode(#[from] FrameError),
    #[error("camera {0} has no frames to serve")]
    Empty(String),
    #[error("camera unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, ImageFormat, Luma};
    use std::io::Cursor;
    use std::path::Path;

    fn write_png(dir: &Path, name: &str, value: u8) -> PathBuf {
        let img = GrayImage::from_pixel(6, 4, Luma([value]));
        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    fn scratch_dir(test: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "motion-detector-{test}-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn serves_frames_in_order_and_wraps() {
        let dir = scratch_dir("sequence");
        let first = write_png(&dir, "a.png", 10);
        let second = write_png(&dir, "b.png", 200);
        let camera = ImageSequenceCamera::new("files", vec![first, second]);

        let values: Vec<u8> = [
            camera.get_image().await.unwrap(),
            camera.get_image().await.unwrap(),
            camera.get_image().await.unwrap(),
        ]
        .iter()
        .map(|c| c.frame.as_raw()[0])
        .collect();
        assert_eq!(values, vec![10, 200, 10]);
        assert_eq!(camera.name(), "files");

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn missing_file_is_read_error() {
        let camera = ImageSequenceCamera::new(
            "files",
            vec![PathBuf::from("/nonexistent/motion-detector/frame.png")],
        );
        assert!(matches!(
            camera.get_image().await,
            Err(CameraError::Read(_, _))
        ));
    }

    #[tokio::test]
    async fn undecodable_file_is_decode_error() {
        let dir = scratch_dir("garbage");
        let path = dir.join("garbage.png");
        std::fs::write(&path, b"not an image").unwrap();
        let camera = ImageSequenceCamera::new("files", vec![path]);
        assert!(matches!(
            camera.get_image().await,
            Err(CameraError::Decode(_))
        ));
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn empty_sequence_is_error() {
        let camera = ImageSequenceCamera::new("files", Vec::new());
        assert!(matches!(camera.get_image().await, Err(CameraError::Empty(_))));
    }
}
