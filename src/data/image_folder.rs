use std::path::{Path, PathBuf};

use rand::RngCore;
use tracing::{debug, info};

use crate::data::augment::{augment, AugmentConfig};
use crate::data::dataset::Dataset;
use crate::data::files::list_images;
use crate::data::labels::LabelSet;
use crate::data::preprocess::load_input_tensor;
use crate::error::{Error, Result};
use crate::math::tensor::Tensor;
use crate::network::metadata::InputShape;

/// An image path and the class index of its enclosing directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledImage {
    pub path: PathBuf,
    pub label: usize,
}

/// A training root laid out one subdirectory per class.
#[derive(Debug, Clone)]
pub struct ImageFolder {
    pub root: PathBuf,
    pub labels: LabelSet,
    pub samples: Vec<LabeledImage>,
}

impl ImageFolder {
    pub fn scan(root: &Path) -> Result<ImageFolder> {
        if !root.is_dir() {
            return Err(Error::InsufficientData(format!(
                "training root does not exist: {}",
                root.display()
            )));
        }
        let labels = LabelSet::from_directory(root)?;
        let mut samples = Vec::new();
        for (label, name) in labels.names().iter().enumerate() {
            let files = list_images(&root.join(name))?;
            debug!(class = %name, images = files.len(), "scanned class folder");
            samples.extend(files.into_iter().map(|path| LabeledImage { path, label }));
        }
        if samples.is_empty() {
            return Err(Error::InsufficientData(format!(
                "no images found under {}",
                root.display()
            )));
        }
        info!(root = %root.display(), classes = labels.len(), images = samples.len(), "scanned training root");
        Ok(ImageFolder { root: root.to_path_buf(), labels, samples })
    }

    /// Splits per class: the first `floor(n * fraction)` files of every class
    /// (in sorted order) are withheld for validation.
    pub fn split(&self, validation_fraction: f64) -> (Vec<LabeledImage>, Vec<LabeledImage>) {
        let mut train = Vec::new();
        let mut validation = Vec::new();
        for label in 0..self.labels.len() {
            let class: Vec<&LabeledImage> = self.samples.iter().filter(|s| s.label == label).collect();
            let n_val = (class.len() as f64 * validation_fraction).floor() as usize;
            for (i, sample) in class.into_iter().enumerate() {
                if i < n_val {
                    validation.push(sample.clone());
                } else {
                    train.push(sample.clone());
                }
            }
        }
        (train, validation)
    }
}

/// One side of a split, decoded lazily from disk batch by batch.
#[derive(Debug, Clone)]
pub struct FolderDataset {
    pub samples: Vec<LabeledImage>,
    pub input: InputShape,
    pub augmentation: AugmentConfig,
}

impl FolderDataset {
    pub fn new(samples: Vec<LabeledImage>, input: InputShape, augmentation: AugmentConfig) -> Self {
        FolderDataset { samples, input, augmentation }
    }
}

impl Dataset for FolderDataset {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn sample(&self, index: usize, augmented: bool, rng: &mut dyn RngCore) -> Result<(Tensor, usize)> {
        let item = &self.samples[index];
        let tensor = load_input_tensor(&item.path, self.input)?;
        let tensor = if augmented {
            augment(&tensor, &self.augmentation, rng)
        } else {
            tensor
        };
        Ok((tensor, item.label))
    }
}
