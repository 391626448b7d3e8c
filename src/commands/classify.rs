//! `classify`: one image or a whole folder.

use std::path::PathBuf;

use anyhow::{Context, Result};
use mugshot_origin::data::files::file_name;
use mugshot_origin::{Classifier, Config, PredictionRecord, Threshold};

fn print_record(record: &PredictionRecord) {
    println!(
        "Image: {} -> Predicted County: {} (Confidence: {:.2}%)",
        record.image,
        record.predicted_county,
        record.confidence * 100.0
    );
}

pub fn execute(config: Config, path: PathBuf, model: PathBuf, threshold: Option<f64>) -> Result<()> {
    let threshold = match threshold {
        Some(t) => Threshold::new(t)?,
        None => config.classifier.confidence_threshold,
    };
    let classifier = Classifier::load(&model, threshold)
        .with_context(|| format!("Failed to load model: {}", model.display()))?;

    if path.is_dir() {
        let (records, out) = classifier
            .classify_folder(&path, &config.classifier.predictions_file)
            .with_context(|| format!("Failed to classify images in {}", path.display()))?;
        records.iter().for_each(print_record);
        println!("Predictions saved to {}", out.display());
    } else {
        let record = classifier
            .classify_path(&path)
            .with_context(|| format!("Failed to classify {}", file_name(&path)))?;
        print_record(&record);
    }
    Ok(())
}
