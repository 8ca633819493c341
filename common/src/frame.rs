use image::{DynamicImage, GrayImage, ImageReader, Luma};
use std::io::Cursor;

/// An 8-bit grayscale camera frame.
///
/// Layout follows `image::GrayImage`: origin at the top-left, row-major,
/// one byte per pixel. Frames compared against each other must share the
/// same dimensions; the detector reports a mismatch instead of truncating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayFrame {
    image: GrayImage,
}

impl GrayFrame {
    /// Create an all-black frame.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: GrayImage::new(width, height),
        }
    }

    /// Wrap a raw row-major intensity buffer of exactly `width * height` bytes.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FrameError> {
        let expected = width as usize * height as usize;
        let got = data.len();
        GrayImage::from_raw(width, height, data)
            .map(Self::from_image)
            .ok_or(FrameError::BufferSize { expected, got })
    }

    /// Build a frame by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> u8) -> Self {
        Self {
            image: GrayImage::from_fn(width, height, |x, y| Luma([f(x, y)])),
        }
    }

    pub fn from_image(image: GrayImage) -> Self {
        Self { image }
    }

    /// Convert any decoded image (RGB, RGBA, 16-bit...) to 8-bit luma.
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        Self {
            image: image.to_luma8(),
        }
    }

    /// Decode an encoded image (JPEG, PNG, ...) and convert it to grayscale.
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        let img = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| FrameError::Decode(e.to_string()))?
            .decode()
            .map_err(|e| FrameError::Decode(e.to_string()))?;
        Ok(Self::from_dynamic(&img))
    }

    // -- Convenience accessors --------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn pixel_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    /// Row-major intensity bytes.
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame buffer has {got} bytes, expected {expected}")]
    BufferSize { expected: usize, got: usize },
    #[error("failed to decode image: {0}")]
    Decode(String),
}
