use rand::Rng;
use rayon::prelude::*;
use serde::{Serialize, Deserialize};

use crate::{math::matrix::Matrix, math::tensor::Tensor, activation::activation::ActivationFunction};
use crate::layers::grads::ParamGrads;

/// Fully connected layer: `a = σ(xW + b)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dense {
    pub size: usize,
    pub input_size: usize,
    /// Shape `(input_size, size)`.
    pub weights: Matrix,
    pub biases: Vec<f64>,
    pub activator: ActivationFunction,
}

/// Values kept from the forward pass for backprop.
#[derive(Debug, Clone)]
pub struct DenseCache {
    input: Vec<f64>,
    pre_activation: Vec<f64>, // z = xW + b, needed for the activation derivative
}

impl Dense {
    pub fn new<R: Rng + ?Sized>(
        size: usize,
        input_size: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Dense {
        let weights = match activation {
            ActivationFunction::ReLU => Matrix::he(input_size, size, input_size, rng),
            _ => Matrix::xavier(input_size, size, input_size, rng),
        };
        Dense {
            size,
            input_size,
            weights,
            biases: vec![0.0; size],
            activator: activation,
        }
    }

    fn linear(&self, input: &[f64]) -> Vec<f64> {
        assert_eq!(
            input.len(),
            self.input_size,
            "dense layer expects {} inputs, got {}",
            self.input_size,
            input.len()
        );
        let mut z = self.biases.clone();
        for (i, &x) in input.iter().enumerate() {
            // Post-ReLU activations are mostly zero.
            if x == 0.0 {
                continue;
            }
            for (zj, w) in z.iter_mut().zip(self.weights.row(i)) {
                *zj += x * w;
            }
        }
        z
    }

    pub fn forward(&self, input: &Tensor) -> Tensor {
        Tensor::vector(self.activator.apply(&self.linear(&input.data)))
    }

    pub fn forward_cached(&self, input: &Tensor) -> (Tensor, DenseCache) {
        let z = self.linear(&input.data);
        let a = self.activator.apply(&z);
        let cache = DenseCache {
            input: input.data.clone(),
            pre_activation: z,
        };
        (Tensor::vector(a), cache)
    }

    /// Backward pass.
    ///
    /// `grad_output` is ∂L/∂a for this layer (∂L/∂z when the activator is
    /// Softmax, see `ActivationFunction::derivative`).  Parameter gradients are
    /// added into `grads` when given; ∂L/∂x is returned when `need_input_grad`.
    pub fn backward(
        &self,
        cache: &DenseCache,
        grad_output: &Tensor,
        grads: Option<&mut ParamGrads>,
        need_input_grad: bool,
    ) -> Option<Tensor> {
        // δ = error ⊙ σ'(z)
        let delta: Vec<f64> = grad_output.data.iter()
            .zip(cache.pre_activation.iter())
            .map(|(g, &z)| g * self.activator.derivative(z))
            .collect();

        if let Some(grads) = grads {
            for (b, d) in grads.biases.iter_mut().zip(delta.iter()) {
                *b += d;
            }
            grads.weights
                .par_chunks_mut(self.size)
                .zip(cache.input.par_iter())
                .for_each(|(row, &x)| {
                    if x != 0.0 {
                        for (g, d) in row.iter_mut().zip(delta.iter()) {
                            *g += x * d;
                        }
                    }
                });
        }

        if !need_input_grad {
            return None;
        }
        let input_grad: Vec<f64> = (0..self.input_size)
            .into_par_iter()
            .map(|i| self.weights.row(i).iter().zip(delta.iter()).map(|(w, d)| w * d).sum())
            .collect();
        Some(Tensor::vector(input_grad))
    }

    pub fn param_lens(&self) -> (usize, usize) {
        (self.weights.len(), self.biases.len())
    }

    pub fn params_mut(&mut self) -> (&mut [f64], &mut [f64]) {
        (&mut self.weights.data, &mut self.biases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_layer(activation: ActivationFunction) -> Dense {
        Dense {
            size: 2,
            input_size: 3,
            weights: Matrix { rows: 3, cols: 2, data: vec![1.0, -1.0, 0.5, 2.0, -0.5, 0.0] },
            biases: vec![0.1, -0.2],
            activator: activation,
        }
    }

    #[test]
    fn forward_matches_hand_computation() {
        let layer = fixed_layer(ActivationFunction::Identity);
        let out = layer.forward(&Tensor::vector(vec![1.0, 2.0, 3.0]));
        // z0 = 0.1 + 1 + 1 - 1.5 ; z1 = -0.2 - 1 + 4 + 0
        assert!((out.data[0] - 0.6).abs() < 1e-12);
        assert!((out.data[1] - 2.8).abs() < 1e-12);
    }

    #[test]
    fn backward_gives_outer_product_and_transposed_product() {
        let layer = fixed_layer(ActivationFunction::Identity);
        let x = Tensor::vector(vec![1.0, 2.0, 3.0]);
        let (_, cache) = layer.forward_cached(&x);
        let mut grads = ParamGrads::zeros(6, 2);
        let dx = layer
            .backward(&cache, &Tensor::vector(vec![1.0, 0.5]), Some(&mut grads), true)
            .unwrap();
        assert_eq!(grads.biases, vec![1.0, 0.5]);
        assert_eq!(grads.weights, vec![1.0, 0.5, 2.0, 1.0, 3.0, 1.5]);
        assert_eq!(dx.data, vec![0.5, 1.5, -0.5]);
    }
}
