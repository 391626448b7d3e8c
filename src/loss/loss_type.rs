use serde::{Serialize, Deserialize};

use crate::loss::cross_entropy::{CrossEntropyLoss, one_hot};

/// Selects which form of cross-entropy the training loop uses.
///
/// - `CrossEntropy`       — targets expanded to one-hot vectors.
/// - `SparseCrossEntropy` — targets used directly as class indices.
///
/// Both pair with a Softmax output and produce the same values; the sparse
/// form skips the one-hot allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    #[default]
    CrossEntropy,
    SparseCrossEntropy,
}

impl LossType {
    /// Scalar loss for one sample.
    pub fn loss(&self, predicted: &[f64], target: usize) -> f64 {
        match self {
            LossType::CrossEntropy => {
                CrossEntropyLoss::loss(predicted, &one_hot(target, predicted.len()))
            }
            LossType::SparseCrossEntropy => CrossEntropyLoss::sparse_loss(predicted, target),
        }
    }

    /// Gradient w.r.t. the pre-softmax logits for one sample.
    pub fn derivative(&self, predicted: &[f64], target: usize) -> Vec<f64> {
        match self {
            LossType::CrossEntropy => {
                CrossEntropyLoss::derivative(predicted, &one_hot(target, predicted.len()))
            }
            LossType::SparseCrossEntropy => CrossEntropyLoss::sparse_derivative(predicted, target),
        }
    }
}
