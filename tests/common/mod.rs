//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use std::path::Path;

use image::{Rgb, RgbImage};
use mugshot_origin::activation::ActivationFunction;
use mugshot_origin::layers::{Dense, Layer};
use mugshot_origin::math::Matrix;
use mugshot_origin::{InputShape, LabelSet, ModelArtifact, Network};

pub fn counties() -> LabelSet {
    LabelSet::new(vec!["jefferson".into(), "midlands".into(), "orange".into()]).unwrap()
}

/// A 3-class model that outputs `probs` for every image.
pub fn fixed_output_model(probs: [f64; 3]) -> ModelArtifact {
    let input = InputShape::new(4, 4);
    let network = Network::new(vec![
        Layer::Flatten,
        Layer::Dense(Dense {
            size: 3,
            input_size: 48,
            weights: Matrix::zeros(48, 3),
            biases: probs.iter().map(|p| p.ln()).collect(),
            activator: ActivationFunction::Softmax,
        }),
    ]);
    ModelArtifact::new("fixed", input, counties(), network).unwrap()
}

pub fn solid(path: &Path, width: u32, height: u32, rgb: [u8; 3]) {
    RgbImage::from_pixel(width, height, Rgb(rgb)).save(path).unwrap();
}

/// Pixel values that vary, so LSB changes are visible.
pub fn textured(path: &Path, width: u32, height: u32) {
    RgbImage::from_fn(width, height, |x, y| Rgb([(x * 9 + y * 3) as u8, (y * 17) as u8, (x ^ y) as u8 * 4]))
        .save(path)
        .unwrap();
}
