use rayon::prelude::*;

/// Accumulated gradients for one layer's weights and biases.
///
/// Parameterless layers (pooling, flatten, dropout) carry empty buffers so the
/// gradient list always lines up index-for-index with `Network::layers`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamGrads {
    pub weights: Vec<f64>,
    pub biases: Vec<f64>,
}

impl ParamGrads {
    pub fn zeros(weights: usize, biases: usize) -> ParamGrads {
        ParamGrads {
            weights: vec![0.0; weights],
            biases: vec![0.0; biases],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty() && self.biases.is_empty()
    }

    pub fn scale(&mut self, factor: f64) {
        self.weights.par_iter_mut().for_each(|g| *g *= factor);
        self.biases.iter_mut().for_each(|g| *g *= factor);
    }

    pub fn add(&mut self, other: &ParamGrads) {
        self.weights.par_iter_mut().zip(other.weights.par_iter()).for_each(|(a, b)| *a += b);
        self.biases.iter_mut().zip(other.biases.iter()).for_each(|(a, b)| *a += b);
    }
}

/// Per-layer gradient storage for a whole network.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Gradients {
    pub layers: Vec<ParamGrads>,
}

impl Gradients {
    pub fn scale(&mut self, factor: f64) {
        for g in &mut self.layers {
            g.scale(factor);
        }
    }

    /// Element-wise sum, used to merge per-thread partial batches.
    pub fn add(&mut self, other: &Gradients) {
        for (a, b) in self.layers.iter_mut().zip(other.layers.iter()) {
            a.add(b);
        }
    }
}
