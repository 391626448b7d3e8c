use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};

/// Floor substituted for a channel standard deviation when scoring.
pub const STD_FLOOR: f64 = 1e-6;

/// Per-channel (R, G, B) mean and population standard deviation of the
/// top-region average colours of a reference set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorFingerprint {
    pub mean: [f64; 3],
    pub std: [f64; 3],
}

/// On-disk layout: `{ "top": { "mean": [r, g, b], "std": [r, g, b] } }`.
#[derive(Serialize, Deserialize)]
struct FingerprintFile {
    top: ColorFingerprint,
}

impl ColorFingerprint {
    /// Statistics over per-image average colours.
    ///
    /// The averages are sorted first so the result is bit-for-bit independent
    /// of the order the images were read in.
    pub fn from_averages(averages: &[[f64; 3]]) -> Result<ColorFingerprint> {
        if averages.is_empty() {
            return Err(Error::InsufficientData("no image averages to build a fingerprint from".into()));
        }
        let mut sorted = averages.to_vec();
        sorted.sort_by(|a, b| {
            a[0].total_cmp(&b[0])
                .then(a[1].total_cmp(&b[1]))
                .then(a[2].total_cmp(&b[2]))
        });

        let n = sorted.len() as f64;
        let mut mean = [0.0; 3];
        let mut std = [0.0; 3];
        for c in 0..3 {
            mean[c] = sorted.iter().map(|a| a[c]).sum::<f64>() / n;
            let var = sorted.iter().map(|a| (a[c] - mean[c]).powi(2)).sum::<f64>() / n;
            std[c] = var.sqrt();
        }
        Ok(ColorFingerprint { mean, std })
    }

    /// Sum over channels of `|candidate - mean| / max(std, STD_FLOOR)`.
    pub fn z_sum(&self, average: [f64; 3]) -> f64 {
        (0..3)
            .map(|c| (average[c] - self.mean[c]).abs() / self.std[c].max(STD_FLOOR))
            .sum()
    }

    /// `max(1, 100 - 10 * z_sum)`: 100 at the mean, never below 1.
    pub fn score(&self, average: [f64; 3]) -> f64 {
        (100.0 - 10.0 * self.z_sum(average)).max(1.0)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &FingerprintFile { top: *self })?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<ColorFingerprint> {
        let file: FingerprintFile = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        Ok(file.top)
    }
}
