use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::math::tensor::Tensor;

/// Random geometric augmentation applied to training samples only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentConfig {
    /// Maximum rotation in degrees, sampled uniformly from ±value.
    pub rotation_degrees: f64,
    /// Maximum horizontal shift as a fraction of the width.
    pub width_shift: f64,
    /// Maximum vertical shift as a fraction of the height.
    pub height_shift: f64,
    pub horizontal_flip: bool,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        AugmentConfig {
            rotation_degrees: 20.0,
            width_shift: 0.2,
            height_shift: 0.2,
            horizontal_flip: true,
        }
    }
}

impl AugmentConfig {
    /// No augmentation at all.
    pub fn none() -> Self {
        AugmentConfig {
            rotation_degrees: 0.0,
            width_shift: 0.0,
            height_shift: 0.0,
            horizontal_flip: false,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.rotation_degrees == 0.0
            && self.width_shift == 0.0
            && self.height_shift == 0.0
            && !self.horizontal_flip
    }
}

/// Bilinear sample with coordinates clamped to the edge ("nearest" fill).
fn sample(plane: &[f64], height: usize, width: usize, y: f64, x: f64) -> f64 {
    let y = y.clamp(0.0, (height - 1) as f64);
    let x = x.clamp(0.0, (width - 1) as f64);
    let (y0, x0) = (y.floor() as usize, x.floor() as usize);
    let (y1, x1) = ((y0 + 1).min(height - 1), (x0 + 1).min(width - 1));
    let (fy, fx) = (y - y0 as f64, x - x0 as f64);
    let top = plane[y0 * width + x0] * (1.0 - fx) + plane[y0 * width + x1] * fx;
    let bottom = plane[y1 * width + x0] * (1.0 - fx) + plane[y1 * width + x1] * fx;
    top * (1.0 - fy) + bottom * fy
}

/// Applies one random rotation/shift/flip to every channel of `input`.
pub fn augment<R: Rng + ?Sized>(input: &Tensor, config: &AugmentConfig, rng: &mut R) -> Tensor {
    if config.is_identity() || input.is_empty() {
        return input.clone();
    }
    let (h, w) = (input.height, input.width);
    let r = config.rotation_degrees.abs();
    let theta = rng.gen_range(-r..=r).to_radians();
    let dy = rng.gen_range(-config.height_shift.abs()..=config.height_shift.abs()) * h as f64;
    let dx = rng.gen_range(-config.width_shift.abs()..=config.width_shift.abs()) * w as f64;
    let flip = config.horizontal_flip && rng.gen_bool(0.5);

    let (cy, cx) = ((h as f64 - 1.0) / 2.0, (w as f64 - 1.0) / 2.0);
    let (sin, cos) = theta.sin_cos();

    let mut out = Tensor::zeros(input.channels, h, w);
    for y in 0..h {
        for x in 0..w {
            // Inverse map: undo the shift, then the rotation about the centre.
            let xo = if flip { (w - 1 - x) as f64 } else { x as f64 };
            let (py, px) = (y as f64 - dy - cy, xo - dx - cx);
            let sy = cos * py - sin * px + cy;
            let sx = sin * py + cos * px + cx;
            for c in 0..input.channels {
                let v = sample(input.plane(c), h, w, sy, sx);
                out.set(c, y, x, v);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ramp() -> Tensor {
        Tensor::from_data(1, 2, 3, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0])
    }

    #[test]
    fn disabled_augmentation_is_identity() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(augment(&ramp(), &AugmentConfig::none(), &mut rng), ramp());
    }

    #[test]
    fn flip_only_mirrors_or_keeps() {
        let config = AugmentConfig { horizontal_flip: true, ..AugmentConfig::none() };
        let mirrored = Tensor::from_data(1, 2, 3, vec![2.0, 1.0, 0.0, 5.0, 4.0, 3.0]);
        let mut rng = StdRng::seed_from_u64(2);
        let mut seen_flip = false;
        for _ in 0..32 {
            let out = augment(&ramp(), &config, &mut rng);
            assert!(out == ramp() || out == mirrored);
            seen_flip |= out == mirrored;
        }
        assert!(seen_flip);
    }

    #[test]
    fn uniform_image_stays_uniform() {
        let flat = Tensor::from_data(3, 8, 8, vec![0.4; 192]);
        let mut rng = StdRng::seed_from_u64(3);
        let out = augment(&flat, &AugmentConfig::default(), &mut rng);
        assert!(out.data.iter().all(|v| (v - 0.4).abs() < 1e-12));
    }
}
