use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::data::dataset::Dataset;
use crate::error::{Error, Result};
use crate::layers::grads::Gradients;
use crate::loss::loss_type::LossType;
use crate::math::tensor::argmax;
use crate::network::network::Network;
use crate::optim::Optimizer;
use crate::train::epoch_stats::{EpochStats, FinalEvaluation, TrainingHistory};
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` for `config.epochs` epochs and returns one `EpochStats`
/// per epoch.
///
/// Training samples are augmented when the dataset supports it; validation
/// samples never are.  Every sample of a batch draws its own seed from `rng`,
/// so a seeded run is reproducible even though samples are processed in
/// parallel.
///
/// # Errors
/// `InsufficientData` when the training set is empty; any sample that fails
/// to load aborts the run.
pub fn train_loop(
    network: &mut Network,
    train: &dyn Dataset,
    validation: Option<&dyn Dataset>,
    optimizer: &mut dyn Optimizer,
    config: &TrainConfig,
    rng: &mut StdRng,
) -> Result<TrainingHistory> {
    if train.is_empty() {
        return Err(Error::InsufficientData("training split holds no samples".into()));
    }
    config.validate()?;

    let mut history = TrainingHistory::default();
    for epoch in 1..=config.epochs {
        let t_start = Instant::now();

        let (train_loss, train_accuracy) = run_one_epoch(network, train, optimizer, config, rng)?;

        let (val_loss, val_accuracy) = match validation {
            Some(set) if !set.is_empty() => {
                let (loss, accuracy) = evaluate(network, set, config.loss_type)?;
                (Some(loss), Some(accuracy))
            }
            _ => (None, None),
        };

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            train_loss,
            train_accuracy,
            val_loss,
            val_accuracy,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };
        info!(
            epoch,
            total = config.epochs,
            train_loss = stats.train_loss,
            train_accuracy = stats.train_accuracy,
            val_loss = ?stats.val_loss,
            val_accuracy = ?stats.val_accuracy,
            elapsed_ms = stats.elapsed_ms,
            "epoch complete"
        );
        history.push(stats);
    }
    Ok(history)
}

/// Mean loss and accuracy over a dataset in evaluation mode.
pub fn evaluate(network: &Network, dataset: &dyn Dataset, loss_type: LossType) -> Result<(f64, f64)> {
    let n = dataset.len();
    if n == 0 {
        return Ok((0.0, 0.0));
    }
    let scored: Vec<(f64, bool)> = (0..n)
        .into_par_iter()
        .map(|index| {
            // No augmentation, so the RNG is never drawn from.
            let mut unused = StdRng::seed_from_u64(0);
            let (input, target) = dataset.sample(index, false, &mut unused)?;
            let output = network.forward(&input);
            Ok((loss_type.loss(&output, target), argmax(&output) == target))
        })
        .collect::<Result<_>>()?;

    let loss = scored.iter().map(|(l, _)| l).sum::<f64>() / n as f64;
    let correct = scored.iter().filter(|(_, hit)| *hit).count();
    Ok((loss, correct as f64 / n as f64))
}

/// Evaluation-mode pass over both splits once training is over.
pub fn final_evaluation(
    network: &Network,
    train: &dyn Dataset,
    validation: Option<&dyn Dataset>,
    loss_type: LossType,
) -> Result<FinalEvaluation> {
    let (train_loss, train_accuracy) = evaluate(network, train, loss_type)?;
    let (val_loss, val_accuracy) = match validation {
        Some(v) if v.len() > 0 => {
            let (loss, acc) = evaluate(network, v, loss_type)?;
            (Some(loss), Some(acc))
        }
        _ => (None, None),
    };
    info!(
        train_loss,
        train_accuracy,
        val_loss = ?val_loss,
        val_accuracy = ?val_accuracy,
        "final evaluation"
    );
    Ok(FinalEvaluation { train_loss, train_accuracy, val_loss, val_accuracy })
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Running sums for one mini-batch (or one thread's share of it).
struct BatchAccumulator {
    grads: Gradients,
    loss: f64,
    correct: usize,
    count: usize,
}

impl BatchAccumulator {
    fn new(network: &Network) -> Self {
        BatchAccumulator { grads: network.zero_gradients(), loss: 0.0, correct: 0, count: 0 }
    }

    fn merge(mut self, other: BatchAccumulator) -> Self {
        self.grads.add(&other.grads);
        self.loss += other.loss;
        self.correct += other.correct;
        self.count += other.count;
        self
    }
}

/// One full pass of mini-batch descent.  Returns mean loss and accuracy.
fn run_one_epoch(
    network: &mut Network,
    train: &dyn Dataset,
    optimizer: &mut dyn Optimizer,
    config: &TrainConfig,
    rng: &mut StdRng,
) -> Result<(f64, f64)> {
    let n = train.len();
    let loss_type = config.loss_type;

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);

    let mut total_loss = 0.0;
    let mut total_correct = 0;

    for (batch_no, batch) in indices.chunks(config.batch_size).enumerate() {
        let seeds: Vec<u64> = batch.iter().map(|_| rng.gen()).collect();
        let net: &Network = network;

        let acc = batch
            .par_iter()
            .zip(seeds.into_par_iter())
            .try_fold(
                || BatchAccumulator::new(net),
                |mut acc, (&index, seed)| -> Result<BatchAccumulator> {
                    let mut sample_rng = StdRng::seed_from_u64(seed);
                    let (input, target) = train.sample(index, true, &mut sample_rng)?;
                    let trace = net.trace_train(&input, &mut sample_rng);
                    acc.loss += loss_type.loss(&trace.output, target);
                    if argmax(&trace.output) == target {
                        acc.correct += 1;
                    }
                    acc.count += 1;
                    let grad_output = loss_type.derivative(&trace.output, target);
                    net.accumulate_gradients(&trace, grad_output, &mut acc.grads);
                    Ok(acc)
                },
            )
            .try_reduce(|| BatchAccumulator::new(net), |a, b| Ok(a.merge(b)))?;

        let mut grads = acc.grads;
        grads.scale(1.0 / acc.count as f64);
        network.apply_gradients(&grads, optimizer);

        total_loss += acc.loss;
        total_correct += acc.correct;
        debug!(batch = batch_no + 1, size = acc.count, loss = acc.loss / acc.count as f64, "batch applied");
    }

    Ok((total_loss / n as f64, total_correct as f64 / n as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::InMemoryDataset;
    use crate::math::tensor::Tensor;
    use crate::network::metadata::InputShape;
    use crate::optim::Adam;

    /// Solid red images are class 0, solid blue class 1.
    fn red_blue(count: usize) -> InMemoryDataset {
        let mut samples = Vec::new();
        for i in 0..count {
            let shade = 0.6 + 0.4 * (i as f64 / count as f64);
            let mut red = Tensor::zeros(3, 8, 8);
            let mut blue = Tensor::zeros(3, 8, 8);
            red.data[..64].iter_mut().for_each(|v| *v = shade);
            blue.data[128..].iter_mut().for_each(|v| *v = shade);
            samples.push((red, 0));
            samples.push((blue, 1));
        }
        InMemoryDataset::new(samples)
    }

    fn tiny_config() -> TrainConfig {
        TrainConfig {
            epochs: 15,
            batch_size: 4,
            learning_rate: 0.01,
            conv_channels: vec![4],
            dense_units: 8,
            dropout: 0.0,
            seed: Some(7),
            ..TrainConfig::default()
        }
    }

    #[test]
    fn loss_decreases_on_separable_colours() {
        let config = tiny_config();
        let mut rng = StdRng::seed_from_u64(7);
        let mut network = config.network_spec(InputShape::new(8, 8), 2).build(&mut rng).unwrap();
        let train = red_blue(6);
        let val = red_blue(2);
        let mut adam = Adam::new(config.learning_rate);

        let history = train_loop(&mut network, &train, Some(&val), &mut adam, &config, &mut rng).unwrap();

        assert_eq!(history.len(), 15);
        let first = &history.epochs[0];
        let last = history.last().unwrap();
        assert!(last.train_loss < first.train_loss, "{} !< {}", last.train_loss, first.train_loss);
        assert!(last.val_accuracy.is_some());
        assert_eq!(last.epoch, 15);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let config = TrainConfig { epochs: 2, ..tiny_config() };
        let run = || {
            let mut rng = StdRng::seed_from_u64(3);
            let mut network = config.network_spec(InputShape::new(8, 8), 2).build(&mut rng).unwrap();
            let mut adam = Adam::new(config.learning_rate);
            let history = train_loop(&mut network, &red_blue(4), None, &mut adam, &config, &mut rng).unwrap();
            history.epochs.iter().map(|e| e.train_loss).collect::<Vec<_>>()
        };
        // Parallel reduction order may differ, so compare with a tolerance.
        for (a, b) in run().iter().zip(run().iter()) {
            assert!((a - b).abs() < 1e-9, "{a} vs {b}");
        }
    }

    #[test]
    fn empty_training_set_is_rejected() {
        let config = tiny_config();
        let mut rng = StdRng::seed_from_u64(1);
        let mut network = config.network_spec(InputShape::new(8, 8), 2).build(&mut rng).unwrap();
        let mut adam = Adam::new(0.01);
        let err = train_loop(&mut network, &InMemoryDataset::default(), None, &mut adam, &config, &mut rng);
        assert!(matches!(err, Err(Error::InsufficientData(_))));
    }

    #[test]
    fn final_evaluation_runs_without_dropout_over_both_splits() {
        let config = TrainConfig { dropout: 0.5, ..tiny_config() };
        let mut rng = StdRng::seed_from_u64(4);
        let network = config.network_spec(InputShape::new(8, 8), 2).build(&mut rng).unwrap();
        let train = red_blue(3);
        let val = red_blue(1);

        let once = final_evaluation(&network, &train, Some(&val), config.loss_type).unwrap();
        let again = final_evaluation(&network, &train, Some(&val), config.loss_type).unwrap();
        assert_eq!(once, again);
        assert_eq!((once.train_loss, once.train_accuracy), evaluate(&network, &train, config.loss_type).unwrap());
        assert!(once.val_loss.is_some() && once.val_accuracy.is_some());

        let empty = InMemoryDataset::default();
        let without = final_evaluation(&network, &train, Some(&empty), config.loss_type).unwrap();
        assert_eq!(without.val_loss, None);
        assert_eq!(without.val_accuracy, None);
    }
}
