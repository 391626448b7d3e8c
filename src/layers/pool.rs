use serde::{Serialize, Deserialize};

use crate::math::tensor::Tensor;

/// Max pooling with a square window and stride equal to the window size.
/// Trailing rows/columns that do not fill a window are dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxPool2d {
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct PoolCache {
    input_shape: (usize, usize, usize),
    /// Flat input index of the winning element for every output element.
    winners: Vec<usize>,
}

impl MaxPool2d {
    pub fn new(size: usize) -> MaxPool2d {
        MaxPool2d { size }
    }

    pub fn output_dims(&self, height: usize, width: usize) -> Option<(usize, usize)> {
        let (oh, ow) = (height / self.size, width / self.size);
        if oh == 0 || ow == 0 {
            None
        } else {
            Some((oh, ow))
        }
    }

    fn pool(&self, input: &Tensor) -> (Tensor, Vec<usize>) {
        let (oh, ow) = self
            .output_dims(input.height, input.width)
            .expect("max pool input is smaller than the window");
        let s = self.size;
        let mut out = Tensor::zeros(input.channels, oh, ow);
        let mut winners = Vec::with_capacity(out.len());

        for c in 0..input.channels {
            for oy in 0..oh {
                for ox in 0..ow {
                    let mut best_idx = (c * input.height + oy * s) * input.width + ox * s;
                    let mut best = input.data[best_idx];
                    for ky in 0..s {
                        for kx in 0..s {
                            let idx = (c * input.height + oy * s + ky) * input.width + ox * s + kx;
                            if input.data[idx] > best {
                                best = input.data[idx];
                                best_idx = idx;
                            }
                        }
                    }
                    out.set(c, oy, ox, best);
                    winners.push(best_idx);
                }
            }
        }
        (out, winners)
    }

    pub fn forward(&self, input: &Tensor) -> Tensor {
        self.pool(input).0
    }

    pub fn forward_cached(&self, input: &Tensor) -> (Tensor, PoolCache) {
        let (out, winners) = self.pool(input);
        (out, PoolCache { input_shape: input.shape(), winners })
    }

    /// Routes each output gradient back to the element that won its window.
    pub fn backward(&self, cache: &PoolCache, grad_output: &Tensor) -> Tensor {
        let (c, h, w) = cache.input_shape;
        let mut grad = Tensor::zeros(c, h, w);
        for (&idx, &g) in cache.winners.iter().zip(grad_output.data.iter()) {
            grad.data[idx] += g;
        }
        grad
    }
}
