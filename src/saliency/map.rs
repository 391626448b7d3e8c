use image::{ImageBuffer, Luma};

use crate::data::preprocess::RESIZE_FILTER;
use crate::error::{Error, Result};
use crate::math::tensor::Tensor;

/// Row-major importance values in [0, 1] with a maximum of exactly 1.0,
/// unless every value is zero.
#[derive(Debug, Clone, PartialEq)]
pub struct SaliencyMap {
    pub width: usize,
    pub height: usize,
    pub values: Vec<f64>,
}

/// Divides by the maximum; an all-zero buffer stays all zero.
fn normalize(values: &mut [f64]) {
    let max = values.iter().cloned().fold(0.0, f64::max);
    if max > 0.0 {
        values.iter_mut().for_each(|v| *v /= max);
    }
}

impl SaliencyMap {
    /// Largest absolute gradient across channels at each pixel, normalised.
    pub fn from_gradients(grad: &Tensor) -> SaliencyMap {
        let plane = grad.plane_len();
        let mut values = vec![0.0f64; plane];
        for c in 0..grad.channels {
            for (v, g) in values.iter_mut().zip(grad.plane(c)) {
                *v = v.max(g.abs());
            }
        }
        normalize(&mut values);
        SaliencyMap { width: grad.width, height: grad.height, values }
    }

    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.values[y * self.width + x]
    }

    pub fn max(&self) -> f64 {
        self.values.iter().cloned().fold(0.0, f64::max)
    }

    /// `(x, y)` of the first maximum in row-major order.
    pub fn argmax(&self) -> (usize, usize) {
        let mut best = 0;
        for (i, &v) in self.values.iter().enumerate() {
            if v > self.values[best] {
                best = i;
            }
        }
        (best % self.width.max(1), best / self.width.max(1))
    }

    /// Bilinear resize.  Values are not renormalised.
    pub fn resize(&self, width: usize, height: usize) -> SaliencyMap {
        if width == self.width && height == self.height {
            return self.clone();
        }
        let buf: ImageBuffer<Luma<f32>, Vec<f32>> = ImageBuffer::from_raw(
            self.width as u32,
            self.height as u32,
            self.values.iter().map(|&v| v as f32).collect(),
        )
        .unwrap_or_else(|| ImageBuffer::new(self.width as u32, self.height as u32));
        let resized = image::imageops::resize(&buf, width as u32, height as u32, RESIZE_FILTER);
        SaliencyMap {
            width,
            height,
            values: resized.into_raw().into_iter().map(|v| (v as f64).clamp(0.0, 1.0)).collect(),
        }
    }

    /// Resizes every map to `width × height`, averages element-wise, and
    /// renormalises the mean by its maximum.
    pub fn average(maps: &[SaliencyMap], width: usize, height: usize) -> Result<SaliencyMap> {
        if maps.is_empty() {
            return Err(Error::InsufficientData("no saliency maps to average".into()));
        }
        let mut values = vec![0.0; width * height];
        for map in maps {
            for (acc, v) in values.iter_mut().zip(map.resize(width, height).values) {
                *acc += v;
            }
        }
        let n = maps.len() as f64;
        values.iter_mut().for_each(|v| *v /= n);
        normalize(&mut values);
        Ok(SaliencyMap { width, height, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_channel_max_of_absolute_gradient() {
        let grad = Tensor::from_data(3, 1, 2, vec![
            0.1, -0.2,
            -0.4, 0.0,
            0.2, 0.1,
        ]);
        let map = SaliencyMap::from_gradients(&grad);
        assert_eq!(map.values, vec![1.0, 0.5]);
        assert_eq!(map.argmax(), (0, 0));
    }

    #[test]
    fn zero_gradient_stays_zero() {
        let map = SaliencyMap::from_gradients(&Tensor::zeros(3, 4, 4));
        assert!(map.values.iter().all(|&v| v == 0.0));
        assert_eq!(map.max(), 0.0);
    }

    #[test]
    fn resize_stays_in_unit_range() {
        let map = SaliencyMap { width: 3, height: 2, values: vec![0.0, 1.0, 0.5, 0.25, 0.0, 0.75] };
        let big = map.resize(13, 7);
        assert_eq!((big.width, big.height), (13, 7));
        assert_eq!(big.values.len(), 91);
        assert!(big.values.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn average_renormalises_to_one() {
        let a = SaliencyMap { width: 2, height: 2, values: vec![1.0, 0.0, 0.0, 0.0] };
        let b = SaliencyMap { width: 2, height: 2, values: vec![1.0, 0.5, 0.0, 0.0] };
        let avg = SaliencyMap::average(&[a, b], 2, 2).unwrap();
        assert_eq!(avg.values, vec![1.0, 0.25, 0.0, 0.0]);
        assert!(SaliencyMap::average(&[], 2, 2).is_err());
    }
}
