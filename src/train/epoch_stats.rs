use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::error::Result;

/// Per-epoch training statistics emitted by `train_loop`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    pub total_epochs: usize,
    /// Mean training loss over all samples in this epoch.
    pub train_loss: f64,
    /// Fraction of training samples whose arg-max matched, measured on the
    /// training-mode forward passes of the epoch.
    pub train_accuracy: f64,
    /// Mean validation loss, if a validation split exists.
    pub val_loss: Option<f64>,
    pub val_accuracy: Option<f64>,
    /// Wall-clock duration of this epoch, evaluation included.
    pub elapsed_ms: u64,
}

/// Loss and accuracy of the finished network over both splits, measured in
/// evaluation mode (dropout off, no augmentation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalEvaluation {
    pub train_loss: f64,
    pub train_accuracy: f64,
    pub val_loss: Option<f64>,
    pub val_accuracy: Option<f64>,
}

/// Every epoch of one run, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_evaluation: Option<FinalEvaluation>,
}

impl TrainingHistory {
    pub fn push(&mut self, stats: EpochStats) {
        self.epochs.push(stats);
    }

    pub fn last(&self) -> Option<&EpochStats> {
        self.epochs.last()
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), self)?;
        Ok(())
    }
}
