pub mod epoch_stats;
pub mod loop_fn;
pub mod plot;
pub mod train_config;
pub mod trainer;

pub use epoch_stats::{EpochStats, FinalEvaluation, TrainingHistory};
pub use loop_fn::{evaluate, final_evaluation, train_loop};
pub use train_config::{OptimizerKind, TrainConfig};
pub use trainer::{train_classifier, TrainingOutcome};
