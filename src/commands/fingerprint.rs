//! `fingerprint build` and `fingerprint score`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use mugshot_origin::fingerprint::{build_folder_fingerprint, score_folder, ColorFingerprint};
use mugshot_origin::Config;

pub fn build(mut config: Config, folder: PathBuf, top_percentage: Option<f64>) -> Result<()> {
    if let Some(pct) = top_percentage {
        config.fingerprint.top_percentage = pct;
    }
    let (fp, path) = build_folder_fingerprint(&folder, &config.fingerprint)
        .with_context(|| format!("Failed to build fingerprint from {}", folder.display()))?;

    println!("Fingerprint saved to {}", path.display());
    println!("  mean (R, G, B): {:.2} {:.2} {:.2}", fp.mean[0], fp.mean[1], fp.mean[2]);
    println!("  std  (R, G, B): {:.2} {:.2} {:.2}", fp.std[0], fp.std[1], fp.std[2]);
    Ok(())
}

pub fn score(
    mut config: Config,
    folder: PathBuf,
    fingerprint: Option<PathBuf>,
    top_percentage: Option<f64>,
) -> Result<()> {
    if let Some(pct) = top_percentage {
        config.fingerprint.top_percentage = pct;
    }
    let fp_path = fingerprint.unwrap_or_else(|| folder.join(&config.fingerprint.fingerprint_file));
    let fp = ColorFingerprint::load(&fp_path)
        .with_context(|| format!("Failed to read fingerprint file: {}", fp_path.display()))?;

    let (report, out) = score_folder(&folder, &fp, &config.fingerprint)
        .with_context(|| format!("Failed to score images in {}", folder.display()))?;

    for record in &report.results {
        println!("{}: Similarity Score = {:.2}", record.filename, record.score);
    }
    println!("Average Score: {:.2}", report.average_score);
    println!("Results saved to {}", out.display());
    Ok(())
}
