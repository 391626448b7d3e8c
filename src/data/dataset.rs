use rand::RngCore;

use crate::error::Result;
use crate::math::tensor::Tensor;

/// A source of labelled training samples.
///
/// `augment` asks for a randomly transformed sample; implementations that
/// have no augmentation configured return the plain sample.
pub trait Dataset: Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the input tensor and class index of sample `index`.
    fn sample(&self, index: usize, augment: bool, rng: &mut dyn RngCore) -> Result<(Tensor, usize)>;
}

/// Pre-decoded samples held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataset {
    pub samples: Vec<(Tensor, usize)>,
}

impl InMemoryDataset {
    pub fn new(samples: Vec<(Tensor, usize)>) -> Self {
        InMemoryDataset { samples }
    }
}

impl Dataset for InMemoryDataset {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn sample(&self, index: usize, _augment: bool, _rng: &mut dyn RngCore) -> Result<(Tensor, usize)> {
        let (t, label) = &self.samples[index];
        Ok((t.clone(), *label))
    }
}
