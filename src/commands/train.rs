//! `train`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use mugshot_origin::{train_classifier, Config};

/// Command-line values that replace the configured hyperparameters.
pub struct Overrides {
    pub epochs: Option<usize>,
    pub batch_size: Option<usize>,
    pub learning_rate: Option<f64>,
    pub seed: Option<u64>,
}

pub fn execute(config: Config, root: PathBuf, output: PathBuf, overrides: Overrides) -> Result<()> {
    let mut training = config.training;
    if let Some(epochs) = overrides.epochs {
        training.epochs = epochs;
    }
    if let Some(batch_size) = overrides.batch_size {
        training.batch_size = batch_size;
    }
    if let Some(lr) = overrides.learning_rate {
        training.learning_rate = lr;
    }
    if overrides.seed.is_some() {
        training.seed = overrides.seed;
    }

    let outcome = train_classifier(&root, &output, config.classifier.input(), &training)
        .with_context(|| format!("Training on {} failed", root.display()))?;

    if let Some(last) = outcome.history.last() {
        println!(
            "Epoch {}/{}: loss {:.4}, accuracy {:.2}%",
            last.epoch,
            last.total_epochs,
            last.train_loss,
            last.train_accuracy * 100.0
        );
        if let (Some(loss), Some(acc)) = (last.val_loss, last.val_accuracy) {
            println!("  validation loss {:.4}, accuracy {:.2}%", loss, acc * 100.0);
        }
    }
    if let Some(fin) = &outcome.history.final_evaluation {
        println!("Final training loss {:.4}, accuracy {:.2}%", fin.train_loss, fin.train_accuracy * 100.0);
        if let (Some(loss), Some(acc)) = (fin.val_loss, fin.val_accuracy) {
            println!("Final validation loss {:.4}, accuracy {:.2}%", loss, acc * 100.0);
        }
    }
    println!("Labels: {}", outcome.artifact.labels.names().join(", "));
    println!("Model saved to {}", outcome.model_path.display());
    println!("History saved to {} and {}", outcome.history_json.display(), outcome.history_plot.display());
    Ok(())
}
