use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};
use tracing::info;

use crate::data::files::{file_name, list_images};
use crate::error::{Error, Result};
use crate::fingerprint::builder::{collect_averages, image_average};
use crate::fingerprint::color::ColorFingerprint;
use crate::fingerprint::fingerprint_config::FingerprintConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub filename: String,
    pub score: f64,
}

/// Contents of the scores file.  `average_score` covers scored images only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub results: Vec<ScoreRecord>,
    pub average_score: f64,
}

impl ScoreReport {
    pub fn save(&self, path: &Path) -> Result<()> {
        serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), self)?;
        Ok(())
    }
}

/// Similarity of one candidate image to a fingerprint.  The candidate goes
/// through the same canonical resize as the reference set.
pub fn score_image(path: &Path, fingerprint: &ColorFingerprint, config: &FingerprintConfig) -> Result<f64> {
    Ok(fingerprint.score(image_average(path, config)?))
}

/// Scores every readable path; unreadable ones are logged and left out.
pub fn score_paths(paths: &[PathBuf], fingerprint: &ColorFingerprint, config: &FingerprintConfig) -> Result<ScoreReport> {
    config.validate()?;
    let results: Vec<ScoreRecord> = collect_averages(paths, config)
        .into_iter()
        .map(|(path, avg)| ScoreRecord { filename: file_name(&path), score: fingerprint.score(avg) })
        .collect();
    if results.is_empty() {
        return Err(Error::InsufficientData(format!(
            "none of the {} candidate images could be scored",
            paths.len()
        )));
    }
    let average_score = results.iter().map(|r| r.score).sum::<f64>() / results.len() as f64;
    Ok(ScoreReport { results, average_score })
}

/// Scores every image in `folder` and writes `config.scores_file` there.
pub fn score_folder(folder: &Path, fingerprint: &ColorFingerprint, config: &FingerprintConfig) -> Result<(ScoreReport, PathBuf)> {
    let paths = list_images(folder)?;
    if paths.is_empty() {
        return Err(Error::InsufficientData(format!("no images found in {}", folder.display())));
    }
    let report = score_paths(&paths, fingerprint, config)?;
    for record in &report.results {
        info!(image = %record.filename, score = record.score, "similarity score");
    }
    let out = folder.join(&config.scores_file);
    report.save(&out)?;
    info!(path = %out.display(), scored = report.results.len(), average = report.average_score, "saved scores");
    Ok((report, out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::builder::build_folder_fingerprint;
    use image::{Rgb, RgbImage};

    fn cfg() -> FingerprintConfig {
        FingerprintConfig {
            canonical_width: 6,
            canonical_height: 20,
            ..FingerprintConfig::default()
        }
    }

    fn solid(path: &Path, rgb: [u8; 3]) {
        RgbImage::from_pixel(6, 20, Rgb(rgb)).save(path).unwrap();
    }

    #[test]
    fn reference_cluster_scenario() {
        let refs = tempfile::tempdir().unwrap();
        let offsets: [i16; 10] = [-5, 5, -3, 3, -1, 1, -4, 4, -2, 2];
        for (i, d) in offsets.iter().enumerate() {
            let px = [(120 + d) as u8, (80 + d) as u8, (60 + d) as u8];
            solid(&refs.path().join(format!("ref_{i}.png")), px);
        }
        let (fp, saved) = build_folder_fingerprint(refs.path(), &cfg()).unwrap();
        assert!(saved.ends_with("location_fingerprint.json"));
        assert_eq!(fp.mean, [120.0, 80.0, 60.0]);

        let candidates = tempfile::tempdir().unwrap();
        solid(&candidates.path().join("at_mean.png"), [120, 80, 60]);
        solid(&candidates.path().join("shifted.png"), [150, 110, 90]);
        std::fs::write(candidates.path().join("broken.jpg"), b"garbage").unwrap();

        let (report, out) = score_folder(candidates.path(), &fp, &cfg()).unwrap();
        assert!(out.exists());
        assert_eq!(report.results.len(), 2);
        let at_mean = report.results.iter().find(|r| r.filename == "at_mean.png").unwrap();
        let shifted = report.results.iter().find(|r| r.filename == "shifted.png").unwrap();
        assert_eq!(at_mean.score, 100.0);
        assert!(shifted.score >= 1.0 && shifted.score < 100.0);
        assert_eq!(report.average_score, (at_mean.score + shifted.score) / 2.0);
    }

    #[test]
    fn candidates_are_resized_like_the_reference_set() {
        let dir = tempfile::tempdir().unwrap();
        let big = dir.path().join("big.png");
        RgbImage::from_pixel(60, 200, Rgb([30, 40, 50])).save(&big).unwrap();
        let fp = ColorFingerprint { mean: [30.0, 40.0, 50.0], std: [1.0, 1.0, 1.0] };
        assert_eq!(score_image(&big, &fp, &cfg()).unwrap(), 100.0);
    }
}
