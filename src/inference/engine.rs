use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::data::files::{file_name, list_images};
use crate::data::preprocess::{load_image, to_input_tensor};
use crate::error::{Error, Result};
use crate::inference::prediction::{decide, Classification, PredictionRecord, Threshold};
use crate::math::tensor::Tensor;
use crate::network::artifact::ModelArtifact;

/// A loaded model plus its confidence gate.  Read-only after construction,
/// so folder classification shares it across worker threads.
#[derive(Debug, Clone)]
pub struct Classifier {
    pub artifact: ModelArtifact,
    pub threshold: Threshold,
}

impl Classifier {
    pub fn new(artifact: ModelArtifact, threshold: Threshold) -> Self {
        Classifier { artifact, threshold }
    }

    pub fn load(model: &Path, threshold: Threshold) -> Result<Self> {
        Ok(Classifier::new(ModelArtifact::load(model)?, threshold))
    }

    pub fn classify_tensor(&self, input: &Tensor) -> Result<Classification> {
        decide(self.artifact.predict(input), &self.artifact.labels, self.threshold)
    }

    /// Resizes to the model resolution and scales to [0, 1] before predicting.
    pub fn classify_image(&self, img: &DynamicImage) -> Result<Classification> {
        self.classify_tensor(&to_input_tensor(img, self.artifact.input))
    }

    pub fn classify_path(&self, path: &Path) -> Result<PredictionRecord> {
        let classification = self.classify_image(&load_image(path)?)?;
        Ok(PredictionRecord::new(file_name(path), &classification))
    }

    /// Classifies in parallel; the result keeps the order of `paths` and
    /// leaves out images that failed (each failure is logged).
    pub fn classify_paths(&self, paths: &[PathBuf]) -> Vec<PredictionRecord> {
        paths
            .par_iter()
            .filter_map(|path| match self.classify_path(path) {
                Ok(record) => {
                    info!(
                        image = %record.image,
                        prediction = %record.predicted_county,
                        confidence = %format!("{:.2}%", record.confidence * 100.0),
                        "classified"
                    );
                    Some(record)
                }
                Err(e) => {
                    warn!(image = %path.display(), error = %e, "skipping image");
                    None
                }
            })
            .collect()
    }

    /// Classifies every image in `folder` and writes the records to
    /// `folder/<output_file>` as a JSON array.
    pub fn classify_folder(&self, folder: &Path, output_file: &str) -> Result<(Vec<PredictionRecord>, PathBuf)> {
        let paths = list_images(folder)?;
        if paths.is_empty() {
            return Err(Error::InsufficientData(format!("no images found in {}", folder.display())));
        }
        let records = self.classify_paths(&paths);
        let out = folder.join(output_file);
        save_records(&records, &out)?;
        info!(path = %out.display(), classified = records.len(), skipped = paths.len() - records.len(), "saved predictions");
        Ok((records, out))
    }
}

pub fn save_records(records: &[PredictionRecord], path: &Path) -> Result<()> {
    serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), records)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;
    use crate::data::labels::LabelSet;
    use crate::inference::prediction::Prediction;
    use crate::layers::{Dense, Layer};
    use crate::math::matrix::Matrix;
    use crate::network::metadata::InputShape;
    use crate::network::network::Network;
    use image::{Rgb, RgbImage};

    /// A model whose output ignores the image: softmax of `ln(probs)`.
    fn fixed_output(probs: &[f64]) -> ModelArtifact {
        let input = InputShape::new(4, 4);
        let network = Network::new(vec![
            Layer::Flatten,
            Layer::Dense(Dense {
                size: probs.len(),
                input_size: 48,
                weights: Matrix::zeros(48, probs.len()),
                biases: probs.iter().map(|p| p.ln()).collect(),
                activator: ActivationFunction::Softmax,
            }),
        ]);
        let labels = LabelSet::new(vec!["jefferson".into(), "midlands".into(), "orange".into()]).unwrap();
        ModelArtifact::new("fixed", input, labels, network).unwrap()
    }

    #[test]
    fn folder_results_keep_file_order_and_skip_failures() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.png", "c.png"] {
            RgbImage::from_pixel(10, 7, Rgb([1, 2, 3])).save(dir.path().join(name)).unwrap();
        }
        std::fs::write(dir.path().join("bad.jpg"), b"nope").unwrap();

        let classifier = Classifier::new(fixed_output(&[0.2, 0.75, 0.05]), Threshold::default());
        let (records, out) = classifier.classify_folder(dir.path(), "predictions.json").unwrap();

        let names: Vec<&str> = records.iter().map(|r| r.image.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.png", "c.png"]);
        assert!(records.iter().all(|r| r.predicted_county == Prediction::Label("midlands".into())));
        assert!((records[0].confidence - 0.75).abs() < 1e-9);

        let saved: Vec<PredictionRecord> =
            serde_json::from_str(&std::fs::read_to_string(out).unwrap()).unwrap();
        assert_eq!(saved.len(), 3);
    }

    #[test]
    fn unconfident_model_yields_sentinel() {
        let classifier = Classifier::new(fixed_output(&[0.4, 0.35, 0.25]), Threshold::default());
        let img = DynamicImage::ImageRgb8(RgbImage::new(30, 20));
        let c = classifier.classify_image(&img).unwrap();
        assert_eq!(c.prediction, Prediction::NotConfident);
        assert_eq!(c.class_index, 0);
    }

    #[test]
    fn empty_folder_is_insufficient_data() {
        let dir = tempfile::tempdir().unwrap();
        let classifier = Classifier::new(fixed_output(&[0.2, 0.75, 0.05]), Threshold::default());
        let err = classifier.classify_folder(dir.path(), "predictions.json").unwrap_err();
        assert!(matches!(err, Error::InsufficientData(_)));
    }
}
