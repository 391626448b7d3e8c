//! Jurisdiction identification for booking photographs.
//!
//! Two independent techniques: a colour fingerprint of the photo backdrop
//! (`fingerprint`) and a from-scratch convolutional classifier (`network`,
//! `train`, `inference`) with gradient saliency maps (`saliency`).  `stego`
//! hides and recovers payload bits in pixel LSBs.

pub mod math;
pub mod activation;
pub mod layers;
pub mod loss;
pub mod optim;
pub mod network;
pub mod data;
pub mod train;
pub mod inference;
pub mod saliency;
pub mod fingerprint;
pub mod stego;
pub mod config;
pub mod error;

// Convenience re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use math::tensor::Tensor;
pub use network::{ModelArtifact, Network, NetworkSpec, InputShape};
pub use data::LabelSet;
pub use fingerprint::ColorFingerprint;
pub use inference::{Classifier, Prediction, PredictionRecord, Threshold};
pub use saliency::SaliencyMap;
pub use train::{train_classifier, TrainConfig};
