use rand::RngCore;
use serde::{Serialize, Deserialize};

use crate::layers::grads::{Gradients, ParamGrads};
use crate::layers::layer::{Layer, LayerCache};
use crate::math::tensor::Tensor;
use crate::optim::Optimizer;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
}

/// Everything a cached forward pass recorded, plus the network output.
#[derive(Debug, Clone)]
pub struct Trace {
    caches: Vec<LayerCache>,
    pub output: Vec<f64>,
}

impl Network {
    pub fn new(layers: Vec<Layer>) -> Network {
        Network { layers }
    }

    /// Evaluation-mode forward pass.  Takes `&self`, so one network can serve
    /// concurrent inference without locking.
    pub fn forward(&self, input: &Tensor) -> Vec<f64> {
        let mut current = input.clone();
        for layer in &self.layers {
            current = layer.forward(&current);
        }
        current.data
    }

    /// Evaluation-mode forward pass that keeps per-layer state for backprop.
    pub fn trace(&self, input: &Tensor) -> Trace {
        self.run_cached(input, None)
    }

    /// Training-mode forward pass (dropout active).
    pub fn trace_train(&self, input: &Tensor, rng: &mut dyn RngCore) -> Trace {
        self.run_cached(input, Some(rng))
    }

    fn run_cached(&self, input: &Tensor, mut rng: Option<&mut dyn RngCore>) -> Trace {
        let mut caches = Vec::with_capacity(self.layers.len());
        let mut current = input.clone();
        for layer in &self.layers {
            let (out, cache) = layer.forward_cached(&current, rng.as_mut().map(|r| &mut **r as &mut dyn RngCore));
            caches.push(cache);
            current = out;
        }
        Trace { caches, output: current.data }
    }

    /// Adds the parameter gradients of one sample into `grads`.
    ///
    /// `grad_output` is the gradient with respect to the final layer's output
    /// (its pre-softmax logits when the network ends in Softmax).
    pub fn accumulate_gradients(&self, trace: &Trace, grad_output: Vec<f64>, grads: &mut Gradients) {
        self.backprop(trace, grad_output, Some(grads));
    }

    /// Gradient of the output signal with respect to every input value.
    pub fn input_gradient(&self, trace: &Trace, grad_output: Vec<f64>) -> Tensor {
        self.backprop(trace, grad_output, None)
            .expect("input gradient is always produced when parameter gradients are not requested")
    }

    fn backprop(&self, trace: &Trace, grad_output: Vec<f64>, mut grads: Option<&mut Gradients>) -> Option<Tensor> {
        let want_input = grads.is_none();
        let mut delta = Tensor::vector(grad_output);
        for i in (0..self.layers.len()).rev() {
            let need_input_grad = i > 0 || want_input;
            let layer_grads = grads.as_deref_mut().map(|g| &mut g.layers[i]);
            match self.layers[i].backward(&trace.caches[i], &delta, layer_grads, need_input_grad) {
                Some(next) => delta = next,
                None => return None,
            }
        }
        Some(delta)
    }

    /// Zeroed gradient storage shaped like this network's parameters.
    pub fn zero_gradients(&self) -> Gradients {
        Gradients {
            layers: self.layers.iter()
                .map(|layer| {
                    let (w, b) = layer.param_lens();
                    ParamGrads::zeros(w, b)
                })
                .collect(),
        }
    }

    /// Hands every (parameter, gradient) buffer pair to the optimizer.
    pub fn apply_gradients(&mut self, grads: &Gradients, optimizer: &mut dyn Optimizer) {
        let mut slots: Vec<(&mut [f64], &[f64])> = Vec::new();
        for (layer, g) in self.layers.iter_mut().zip(grads.layers.iter()) {
            if let Some((weights, biases)) = layer.params_mut() {
                slots.push((weights, &g.weights));
                slots.push((biases, &g.biases));
            }
        }
        optimizer.step(slots);
    }

    /// Output shape for a given input shape, if every layer accepts it.
    pub fn output_shape(&self, input: (usize, usize, usize)) -> Option<(usize, usize, usize)> {
        self.layers.iter().try_fold(input, |shape, layer| layer.output_shape(shape))
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter()
            .map(|l| {
                let (w, b) = l.param_lens();
                w + b
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;
    use crate::layers::{Conv2d, Dense, MaxPool2d, Dropout};
    use crate::loss::CrossEntropyLoss;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn tiny_cnn(rng: &mut StdRng) -> Network {
        Network::new(vec![
            Layer::Conv2d(Conv2d::new(3, 2, 3, 0, ActivationFunction::ReLU, rng)),
            Layer::MaxPool2d(MaxPool2d::new(2)),
            Layer::Flatten,
            Layer::Dense(Dense::new(4, 8, ActivationFunction::ReLU, rng)),
            Layer::Dropout(Dropout::new(0.5)),
            Layer::Dense(Dense::new(3, 4, ActivationFunction::Softmax, rng)),
        ])
    }

    fn random_input(rng: &mut StdRng) -> Tensor {
        Tensor::from_data(3, 6, 6, (0..108).map(|_| rng.gen::<f64>()).collect())
    }

    #[test]
    fn forward_and_trace_agree_in_eval_mode() {
        let mut rng = StdRng::seed_from_u64(11);
        let net = tiny_cnn(&mut rng);
        let x = random_input(&mut rng);
        let out = net.forward(&x);
        assert_eq!(out, net.trace(&x).output);
        assert!((out.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(net.output_shape((3, 6, 6)), Some((3, 1, 1)));
    }

    #[test]
    fn training_trace_hands_the_rng_to_dropout() {
        let mut rng = StdRng::seed_from_u64(12);
        let net = tiny_cnn(&mut rng);
        let x = random_input(&mut rng);
        let eval = net.trace(&x);
        let differs = (0..8).any(|seed| {
            let mut train_rng = StdRng::seed_from_u64(seed);
            net.trace_train(&x, &mut train_rng).output != eval.output
        });
        assert!(differs);

        let a = net.trace_train(&x, &mut StdRng::seed_from_u64(2)).output;
        let b = net.trace_train(&x, &mut StdRng::seed_from_u64(2)).output;
        assert_eq!(a, b);
    }

    #[test]
    fn input_gradient_matches_finite_differences() {
        let mut rng = StdRng::seed_from_u64(5);
        let net = tiny_cnn(&mut rng);
        let x = random_input(&mut rng);
        let class = 1;

        let trace = net.trace(&x);
        let p = trace.output.clone();
        let grad_logits: Vec<f64> = p.iter().enumerate()
            .map(|(j, &pj)| p[class] * (if j == class { 1.0 } else { 0.0 } - pj))
            .collect();
        let analytic = net.input_gradient(&trace, grad_logits);

        let h = 1e-6;
        for idx in [0usize, 17, 40, 77, 107] {
            let mut plus = x.clone();
            plus.data[idx] += h;
            let mut minus = x.clone();
            minus.data[idx] -= h;
            let numeric = (net.forward(&plus)[class] - net.forward(&minus)[class]) / (2.0 * h);
            assert!(
                (numeric - analytic.data[idx]).abs() < 1e-6,
                "index {idx}: numeric {numeric} vs analytic {}",
                analytic.data[idx]
            );
        }
    }

    #[test]
    fn parameter_gradients_match_finite_differences() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut net = tiny_cnn(&mut rng);
        // Dropout off so the numeric loss is deterministic.
        net.layers[4] = Layer::Dropout(Dropout::new(0.0));
        let x = random_input(&mut rng);
        let target = [0.0, 0.0, 1.0];

        let trace = net.trace(&x);
        let mut grads = net.zero_gradients();
        net.accumulate_gradients(&trace, CrossEntropyLoss::derivative(&trace.output, &target), &mut grads);

        let h = 1e-6;
        let loss_at = |net: &Network| CrossEntropyLoss::loss(&net.forward(&x), &target);
        for (layer_idx, w_idx) in [(0usize, 3usize), (0, 40), (3, 5), (5, 2)] {
            let mut plus = net.clone();
            let mut minus = net.clone();
            plus.layers[layer_idx].params_mut().unwrap().0[w_idx] += h;
            minus.layers[layer_idx].params_mut().unwrap().0[w_idx] -= h;
            let numeric = (loss_at(&plus) - loss_at(&minus)) / (2.0 * h);
            let analytic = grads.layers[layer_idx].weights[w_idx];
            assert!(
                (numeric - analytic).abs() < 1e-5,
                "layer {layer_idx} weight {w_idx}: numeric {numeric} vs analytic {analytic}"
            );
        }
    }
}
