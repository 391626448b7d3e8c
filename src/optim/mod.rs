pub mod adam;
pub mod sgd;

pub use adam::Adam;
pub use sgd::Sgd;

/// A gradient-based update rule.
///
/// `slots` pairs each parameter buffer with its (batch-averaged) gradient, in
/// a stable order across calls.
pub trait Optimizer {
    fn step(&mut self, slots: Vec<(&mut [f64], &[f64])>);
}
