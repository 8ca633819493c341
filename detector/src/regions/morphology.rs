use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology::{dilate, erode};

use super::Kernels;

// LInf distance k gives a (2k+1) x (2k+1) square structuring element.

/// Erode then dilate: removes specks smaller than the kernel and leaves
/// larger regions at their original size.
pub fn open(mask: &GrayImage, radius: u8) -> GrayImage {
    dilate(&erode(mask, Norm::LInf, radius), Norm::LInf, radius)
}

/// Dilate then erode: bridges gaps narrower than the kernel, then shrinks
/// the merged region back to roughly its original outline.
pub fn close(mask: &GrayImage, radius: u8) -> GrayImage {
    erode(&dilate(mask, Norm::LInf, radius), Norm::LInf, radius)
}

/// Fine opening followed by a coarse closing on a 0/255 mask.
pub fn suppress_noise(mask: &GrayImage, kernels: &Kernels) -> GrayImage {
    close(&open(mask, kernels.denoise_radius()), kernels.close_radius())
}
