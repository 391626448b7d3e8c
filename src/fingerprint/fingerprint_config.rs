use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};

/// Options shared by fingerprint building and scoring.
///
/// Both paths resize to the same canonical resolution before sampling, so a
/// reference set and a candidate image are always measured alike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintConfig {
    pub canonical_width: u32,
    pub canonical_height: u32,
    /// Share of rows, from the top, that are averaged.
    pub top_percentage: f64,
    pub fingerprint_file: String,
    pub scores_file: String,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        FingerprintConfig {
            canonical_width: 480,
            canonical_height: 600,
            top_percentage: 5.0,
            fingerprint_file: "location_fingerprint.json".into(),
            scores_file: "image_scores.json".into(),
        }
    }
}

impl FingerprintConfig {
    pub fn validate(&self) -> Result<()> {
        if self.canonical_width == 0 || self.canonical_height == 0 {
            return Err(Error::Config("canonical fingerprint size must be non-zero".into()));
        }
        if !(self.top_percentage > 0.0 && self.top_percentage <= 100.0) {
            return Err(Error::Config(format!(
                "top_percentage must lie in (0, 100], got {}",
                self.top_percentage
            )));
        }
        Ok(())
    }

    /// Rows sampled from an image of `height` rows, at least one.
    pub fn top_rows(&self, height: u32) -> u32 {
        let rows = (height as f64 * self.top_percentage / 100.0).floor() as u32;
        rows.clamp(1, height.max(1))
    }
}
