use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationFunction {
    ReLU,
    Identity,
    /// Softmax is a vector-valued activation; it is applied at the layer level
    /// (not element-wise) by `Dense`.  The element-wise `function()` is
    /// therefore never used for this variant.
    Softmax,
}

impl ActivationFunction {
    /// Element-wise activation.  For `Softmax` the dense layer calls
    /// [`softmax`] on the whole vector instead.
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Identity | ActivationFunction::Softmax => x,
        }
    }

    /// Element-wise derivative of the activation.
    ///
    /// For `Softmax`, the gradient handed to the layer is already taken with
    /// respect to the pre-softmax logits (`predicted - expected` for
    /// cross-entropy, `p_k (e_k - p)` for a saliency target).  Returning `1.0`
    /// passes that delta through unchanged without double-applying the
    /// Jacobian.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Identity | ActivationFunction::Softmax => 1.0,
        }
    }

    pub fn apply(&self, values: &[f64]) -> Vec<f64> {
        match self {
            ActivationFunction::Softmax => softmax(values),
            _ => values.iter().map(|&x| self.function(x)).collect(),
        }
    }
}

/// Numerically stable softmax (max-shifted).
pub fn softmax(values: &[f64]) -> Vec<f64> {
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = values.iter().map(|&x| (x - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
