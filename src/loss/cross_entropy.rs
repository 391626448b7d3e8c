/// Categorical cross-entropy loss for use with a Softmax output layer.
pub struct CrossEntropyLoss;

/// Small epsilon added inside log() to prevent log(0) = -inf.
const EPS: f64 = 1e-12;

impl CrossEntropyLoss {
    /// Computes the scalar cross-entropy loss:
    ///   L = -sum(expected[i] * log(predicted[i] + eps))
    ///
    /// `predicted` — softmax probabilities, shape [n_classes]
    /// `expected`  — one-hot (or soft) target distribution, shape [n_classes]
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        predicted.iter().zip(expected.iter())
            .map(|(p, e)| -e * (p + EPS).ln())
            .sum()
    }

    /// Gradient of the combined Softmax + cross-entropy w.r.t. the pre-softmax
    /// logits:
    ///   ∂L/∂z_i = predicted[i] - expected[i]
    ///
    /// The Softmax layer's own derivative step is the identity, so this delta
    /// is not double-applied.
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        predicted.iter().zip(expected.iter())
            .map(|(p, e)| p - e)
            .collect()
    }

    /// Sparse form: the target is a class index instead of a one-hot vector.
    pub fn sparse_loss(predicted: &[f64], target: usize) -> f64 {
        -(predicted[target] + EPS).ln()
    }

    pub fn sparse_derivative(predicted: &[f64], target: usize) -> Vec<f64> {
        let mut grad = predicted.to_vec();
        grad[target] -= 1.0;
        grad
    }
}

/// Builds a one-hot target of length `n_classes`.
pub fn one_hot(target: usize, n_classes: usize) -> Vec<f64> {
    let mut v = vec![0.0; n_classes];
    v[target] = 1.0;
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_and_one_hot_forms_agree() {
        let p = [0.2, 0.75, 0.05];
        let y = one_hot(1, 3);
        assert_eq!(CrossEntropyLoss::loss(&p, &y), CrossEntropyLoss::sparse_loss(&p, 1));
        assert_eq!(CrossEntropyLoss::derivative(&p, &y), CrossEntropyLoss::sparse_derivative(&p, 1));
    }

    #[test]
    fn confident_correct_prediction_has_small_loss() {
        assert!(CrossEntropyLoss::sparse_loss(&[0.01, 0.99], 1) < 0.011);
        assert!(CrossEntropyLoss::sparse_loss(&[0.99, 0.01], 1) > 4.0);
    }
}
