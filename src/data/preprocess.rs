//! Image decoding and conversion to network input tensors.
//!
//! Every path decodes through the `image` crate, which always yields RGB
//! channel order, so training-time and inference-time tensors agree.

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};

use crate::error::{Error, Result};
use crate::math::tensor::Tensor;
use crate::network::metadata::InputShape;

/// Resampling filter used wherever images are resized (bilinear).
pub const RESIZE_FILTER: FilterType = FilterType::Triangle;

pub fn load_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })
}

/// Saves in the format implied by the extension.
pub fn save_image(img: &DynamicImage, path: &Path) -> Result<()> {
    img.save(path).map_err(|source| Error::ImageSave {
        path: path.to_path_buf(),
        source,
    })
}

/// Converts an RGB image to a `3 × H × W` tensor scaled to [0, 1].
pub fn rgb_to_tensor(img: &RgbImage) -> Tensor {
    let (w, h) = img.dimensions();
    let (w, h) = (w as usize, h as usize);
    let mut t = Tensor::zeros(3, h, w);
    for (x, y, pixel) in img.enumerate_pixels() {
        for c in 0..3 {
            t.set(c, y as usize, x as usize, pixel.0[c] as f64 / 255.0);
        }
    }
    t
}

/// Resizes to the model resolution, converts to RGB, and scales to [0, 1].
pub fn to_input_tensor(img: &DynamicImage, shape: InputShape) -> Tensor {
    let resized = if img.width() == shape.width && img.height() == shape.height {
        img.to_rgb8()
    } else {
        img.resize_exact(shape.width, shape.height, RESIZE_FILTER).to_rgb8()
    };
    rgb_to_tensor(&resized)
}

pub fn load_input_tensor(path: &Path, shape: InputShape) -> Result<Tensor> {
    Ok(to_input_tensor(&load_image(path)?, shape))
}
