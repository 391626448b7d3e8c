use rand::{Rng, RngCore};
use serde::{Serialize, Deserialize};

use crate::math::tensor::Tensor;

/// Inverted dropout: during training each activation is zeroed with
/// probability `rate` and survivors are scaled by `1 / (1 - rate)`, so
/// evaluation is the identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dropout {
    pub rate: f64,
}

impl Dropout {
    pub fn new(rate: f64) -> Dropout {
        Dropout { rate }
    }

    /// Returns the output and the mask that produced it (`None` in eval mode).
    pub fn forward_cached(&self, input: &Tensor, rng: Option<&mut dyn RngCore>) -> (Tensor, Option<Vec<f64>>) {
        let rng = match rng {
            Some(rng) if self.rate > 0.0 => rng,
            _ => return (input.clone(), None),
        };
        let keep = 1.0 / (1.0 - self.rate);
        let mask: Vec<f64> = (0..input.len())
            .map(|_| if rng.gen::<f64>() < self.rate { 0.0 } else { keep })
            .collect();
        let mut out = input.clone();
        for (v, m) in out.data.iter_mut().zip(mask.iter()) {
            *v *= m;
        }
        (out, Some(mask))
    }

    pub fn backward(&self, mask: Option<&Vec<f64>>, grad_output: &Tensor) -> Tensor {
        let mut grad = grad_output.clone();
        if let Some(mask) = mask {
            for (g, m) in grad.data.iter_mut().zip(mask.iter()) {
                *g *= m;
            }
        }
        grad
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn eval_mode_is_identity() {
        let d = Dropout::new(0.5);
        let x = Tensor::vector(vec![1.0, 2.0, 3.0]);
        let (y, mask) = d.forward_cached(&x, None);
        assert_eq!(y, x);
        assert!(mask.is_none());
    }

    #[test]
    fn training_mode_zeroes_or_rescales() {
        let d = Dropout::new(0.5);
        let mut rng = StdRng::seed_from_u64(3);
        let x = Tensor::vector(vec![1.0; 1000]);
        let (y, mask) = d.forward_cached(&x, Some(&mut rng));
        assert!(y.data.iter().all(|&v| v == 0.0 || v == 2.0));
        let dropped = y.data.iter().filter(|&&v| v == 0.0).count();
        assert!(dropped > 400 && dropped < 600);

        let g = d.backward(mask.as_ref(), &Tensor::vector(vec![1.0; 1000]));
        assert_eq!(g, y);
    }
}
