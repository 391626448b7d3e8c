pub mod augment;
pub mod dataset;
pub mod files;
pub mod image_folder;
pub mod labels;
pub mod preprocess;

pub use augment::AugmentConfig;
pub use dataset::{Dataset, InMemoryDataset};
pub use image_folder::{FolderDataset, ImageFolder, LabeledImage};
pub use labels::LabelSet;
