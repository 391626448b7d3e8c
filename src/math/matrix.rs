use rand::prelude::*;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;

/// Row-major dense matrix backed by one flat buffer.
///
/// Dense layer weights are stored as `(input_size, size)` so that row `i`
/// holds every weight leaving input neuron `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
        // Both uniforms are drawn from (0, 1] to avoid log(0).
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// Fills a buffer of `len` values drawn from N(0, std_dev²).
    pub fn normal_vec<R: Rng + ?Sized>(len: usize, std_dev: f64, rng: &mut R) -> Vec<f64> {
        (0..len)
            .map(|_| Matrix::sample_standard_normal(rng) * std_dev)
            .collect()
    }

    /// He initialization: samples from N(0, sqrt(2 / fan_in)).
    ///
    /// Recommended before ReLU layers. The variance 2/fan_in accounts for
    /// the fact that ReLU zeroes half of its inputs on average.
    pub fn he<R: Rng + ?Sized>(rows: usize, cols: usize, fan_in: usize, rng: &mut R) -> Matrix {
        let std_dev = (2.0 / fan_in.max(1) as f64).sqrt();
        Matrix {
            rows,
            cols,
            data: Matrix::normal_vec(rows * cols, std_dev, rng),
        }
    }

    /// Xavier (Glorot) initialization: samples from N(0, sqrt(1 / fan_in)).
    ///
    /// Used for the softmax output layer, which has no rectifier in front of it.
    pub fn xavier<R: Rng + ?Sized>(rows: usize, cols: usize, fan_in: usize, rng: &mut R) -> Matrix {
        let std_dev = (1.0 / fan_in.max(1) as f64).sqrt();
        Matrix {
            rows,
            cols,
            data: Matrix::normal_vec(rows * cols, std_dev, rng),
        }
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}
