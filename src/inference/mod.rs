pub mod classifier_config;
pub mod engine;
pub mod prediction;

pub use classifier_config::ClassifierConfig;
pub use engine::Classifier;
pub use prediction::{decide, Classification, Prediction, PredictionRecord, Threshold, NO_CONFIDENT_PREDICTION};
