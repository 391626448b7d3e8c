//! Colour fingerprints: per-location statistics of the average colour of the
//! top rows of booking photos, and similarity scoring against them.

pub mod builder;
pub mod color;
pub mod fingerprint_config;
pub mod scoring;

pub use builder::{build_fingerprint, build_folder_fingerprint, top_region_average};
pub use color::ColorFingerprint;
pub use fingerprint_config::FingerprintConfig;
pub use scoring::{score_folder, score_image, ScoreRecord, ScoreReport};
