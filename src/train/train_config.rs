use serde::{Serialize, Deserialize};

use crate::data::augment::AugmentConfig;
use crate::error::{Error, Result};
use crate::loss::loss_type::LossType;
use crate::network::metadata::InputShape;
use crate::network::spec::NetworkSpec;
use crate::optim::{Adam, Optimizer, Sgd};

/// Which update rule `train_classifier` builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    #[default]
    Adam,
    Sgd,
}

impl OptimizerKind {
    pub fn build(&self, learning_rate: f64) -> Box<dyn Optimizer> {
        match self {
            OptimizerKind::Adam => Box::new(Adam::new(learning_rate)),
            OptimizerKind::Sgd => Box::new(Sgd::new(learning_rate)),
        }
    }
}

/// Hyperparameters for a classifier training run.
///
/// # Fields
/// - `epochs`           — full passes over the training split
/// - `batch_size`       — samples per mini-batch; gradients are averaged over it
/// - `learning_rate`    — step size handed to the optimizer
/// - `validation_split` — fraction of each class withheld for validation
/// - `conv_channels`    — output depth of each convolution + pooling stage
/// - `dense_units`      — width of the hidden dense layer
/// - `dropout`          — drop probability before the output layer
/// - `seed`             — fixes weight init, shuffling and augmentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub optimizer: OptimizerKind,
    pub loss_type: LossType,
    pub validation_split: f64,
    pub conv_channels: Vec<usize>,
    pub dense_units: usize,
    pub dropout: f64,
    pub augmentation: AugmentConfig,
    pub seed: Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            epochs: 50,
            batch_size: 32,
            learning_rate: 1e-4,
            optimizer: OptimizerKind::Adam,
            loss_type: LossType::CrossEntropy,
            validation_split: 0.2,
            conv_channels: vec![32, 64, 128],
            dense_units: 512,
            dropout: 0.5,
            augmentation: AugmentConfig::default(),
            seed: None,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::Config("epochs must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".into()));
        }
        if !(self.learning_rate > 0.0) {
            return Err(Error::Config(format!("learning_rate must be positive, got {}", self.learning_rate)));
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(Error::Config(format!(
                "validation_split must lie in [0, 1), got {}",
                self.validation_split
            )));
        }
        Ok(())
    }

    /// The classifier architecture these hyperparameters describe.
    pub fn network_spec(&self, input: InputShape, num_classes: usize) -> NetworkSpec {
        NetworkSpec {
            conv_channels: self.conv_channels.clone(),
            dense_units: self.dense_units,
            dropout: self.dropout,
            ..NetworkSpec::classifier(input, num_classes)
        }
    }
}
