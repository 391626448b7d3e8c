use rayon::prelude::*;

use crate::optim::Optimizer;

/// Adam (Kingma & Ba, 2015) with bias-corrected first and second moments.
///
/// Moment buffers are created lazily on the first step, one per parameter
/// slot, so the slot order handed over by `Network::apply_gradients` must stay
/// the same for the optimizer's lifetime.
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    t: i32,
    m: Vec<Vec<f64>>,
    v: Vec<Vec<f64>>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Adam {
        Adam {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            t: 0,
            m: Vec::new(),
            v: Vec::new(),
        }
    }
}

impl Optimizer for Adam {
    fn step(&mut self, slots: Vec<(&mut [f64], &[f64])>) {
        if self.m.len() != slots.len() {
            self.m = slots.iter().map(|(p, _)| vec![0.0; p.len()]).collect();
            self.v = slots.iter().map(|(p, _)| vec![0.0; p.len()]).collect();
        }
        self.t += 1;
        let (b1, b2, eps) = (self.beta1, self.beta2, self.epsilon);
        let correction1 = 1.0 - b1.powi(self.t);
        let correction2 = 1.0 - b2.powi(self.t);
        let lr = self.learning_rate;

        for (((params, grads), m), v) in slots.into_iter().zip(self.m.iter_mut()).zip(self.v.iter_mut()) {
            params.par_iter_mut()
                .zip(grads.par_iter())
                .zip(m.par_iter_mut())
                .zip(v.par_iter_mut())
                .for_each(|(((p, &g), m), v)| {
                    *m = b1 * *m + (1.0 - b1) * g;
                    *v = b2 * *v + (1.0 - b2) * g * g;
                    let m_hat = *m / correction1;
                    let v_hat = *v / correction2;
                    *p -= lr * m_hat / (v_hat.sqrt() + eps);
                });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_step_moves_each_parameter_by_learning_rate() {
        let mut adam = Adam::new(0.1);
        let mut params = vec![1.0, -1.0];
        adam.step(vec![(&mut params[..], &[2.0, -0.5][..])]);
        // bias-corrected m_hat / sqrt(v_hat) is sign(g) on the first step
        assert!((params[0] - 0.9).abs() < 1e-6);
        assert!((params[1] + 0.9).abs() < 1e-6);
    }

    #[test]
    fn minimises_a_quadratic() {
        let mut adam = Adam::new(0.05);
        let mut x = vec![3.0];
        for _ in 0..500 {
            let g = vec![2.0 * x[0]];
            adam.step(vec![(&mut x[..], &g[..])]);
        }
        assert!(x[0].abs() < 0.05, "x = {}", x[0]);
    }
}
