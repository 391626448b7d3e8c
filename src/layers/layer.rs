use rand::RngCore;
use serde::{Serialize, Deserialize};

use crate::layers::conv2d::{Conv2d, Conv2dCache};
use crate::layers::dense::{Dense, DenseCache};
use crate::layers::dropout::Dropout;
use crate::layers::grads::ParamGrads;
use crate::layers::pool::{MaxPool2d, PoolCache};
use crate::math::tensor::Tensor;

/// One stage of a sequential network.
///
/// Externally tagged so the same value round-trips through both JSON and
/// bincode model files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Layer {
    Conv2d(Conv2d),
    MaxPool2d(MaxPool2d),
    Flatten,
    Dropout(Dropout),
    Dense(Dense),
}

/// Per-layer state recorded by a cached forward pass.
#[derive(Debug, Clone)]
pub enum LayerCache {
    Conv2d(Conv2dCache),
    MaxPool2d(PoolCache),
    Flatten { shape: (usize, usize, usize) },
    Dropout { mask: Option<Vec<f64>> },
    Dense(DenseCache),
}

impl Layer {
    /// Evaluation-mode forward pass. Never mutates the layer.
    pub fn forward(&self, input: &Tensor) -> Tensor {
        match self {
            Layer::Conv2d(conv) => conv.forward(input),
            Layer::MaxPool2d(pool) => pool.forward(input),
            Layer::Flatten => input.clone().reshaped(input.len(), 1, 1),
            Layer::Dropout(_) => input.clone(),
            Layer::Dense(dense) => dense.forward(input),
        }
    }

    /// Forward pass that records what `backward` needs.  Dropout is active
    /// only when an RNG is supplied.
    pub fn forward_cached(&self, input: &Tensor, rng: Option<&mut dyn RngCore>) -> (Tensor, LayerCache) {
        match self {
            Layer::Conv2d(conv) => {
                let (out, cache) = conv.forward_cached(input);
                (out, LayerCache::Conv2d(cache))
            }
            Layer::MaxPool2d(pool) => {
                let (out, cache) = pool.forward_cached(input);
                (out, LayerCache::MaxPool2d(cache))
            }
            Layer::Flatten => (
                input.clone().reshaped(input.len(), 1, 1),
                LayerCache::Flatten { shape: input.shape() },
            ),
            Layer::Dropout(dropout) => {
                let (out, mask) = dropout.forward_cached(input, rng);
                (out, LayerCache::Dropout { mask })
            }
            Layer::Dense(dense) => {
                let (out, cache) = dense.forward_cached(input);
                (out, LayerCache::Dense(cache))
            }
        }
    }

    /// Backward pass for one layer.  Returns ∂L/∂input when
    /// `need_input_grad` is set.
    pub fn backward(
        &self,
        cache: &LayerCache,
        grad_output: &Tensor,
        grads: Option<&mut ParamGrads>,
        need_input_grad: bool,
    ) -> Option<Tensor> {
        match (self, cache) {
            (Layer::Conv2d(conv), LayerCache::Conv2d(c)) => {
                conv.backward(c, grad_output, grads, need_input_grad)
            }
            (Layer::Dense(dense), LayerCache::Dense(c)) => {
                dense.backward(c, grad_output, grads, need_input_grad)
            }
            _ if !need_input_grad => None,
            (Layer::MaxPool2d(pool), LayerCache::MaxPool2d(c)) => Some(pool.backward(c, grad_output)),
            (Layer::Flatten, LayerCache::Flatten { shape }) => {
                Some(grad_output.clone().reshaped(shape.0, shape.1, shape.2))
            }
            (Layer::Dropout(dropout), LayerCache::Dropout { mask }) => {
                Some(dropout.backward(mask.as_ref(), grad_output))
            }
            _ => panic!("layer cache does not belong to this layer"),
        }
    }

    /// Output shape for a given input shape, or `None` when the spatial
    /// extent collapses or the input does not fit.
    pub fn output_shape(&self, input: (usize, usize, usize)) -> Option<(usize, usize, usize)> {
        let (c, h, w) = input;
        match self {
            Layer::Conv2d(conv) => {
                if c != conv.in_channels {
                    return None;
                }
                conv.output_dims(h, w).map(|(oh, ow)| (conv.out_channels, oh, ow))
            }
            Layer::MaxPool2d(pool) => pool.output_dims(h, w).map(|(oh, ow)| (c, oh, ow)),
            Layer::Flatten => Some((c * h * w, 1, 1)),
            Layer::Dropout(_) => Some(input),
            Layer::Dense(dense) => {
                if c * h * w != dense.input_size {
                    return None;
                }
                Some((dense.size, 1, 1))
            }
        }
    }

    /// Lengths of the weight and bias buffers (zero for parameterless layers).
    pub fn param_lens(&self) -> (usize, usize) {
        match self {
            Layer::Conv2d(conv) => conv.param_lens(),
            Layer::Dense(dense) => dense.param_lens(),
            _ => (0, 0),
        }
    }

    pub fn params_mut(&mut self) -> Option<(&mut [f64], &mut [f64])> {
        match self {
            Layer::Conv2d(conv) => Some(conv.params_mut()),
            Layer::Dense(dense) => Some(dense.params_mut()),
            _ => None,
        }
    }
}
