use crate::optim::Optimizer;

/// Plain stochastic gradient descent: `θ ← θ - lr · g`.
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, slots: Vec<(&mut [f64], &[f64])>) {
        for (params, grads) in slots {
            for (p, g) in params.iter_mut().zip(grads.iter()) {
                *p -= self.learning_rate * g;
            }
        }
    }
}
