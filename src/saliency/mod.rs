//! Gradient saliency: which input pixels a class probability is most
//! sensitive to, per image and averaged over a class folder.

pub mod generator;
pub mod map;
pub mod render;
pub mod saliency_config;

pub use generator::{image_saliency, overlay_path, saliency_folder, saliency_map, SaliencyBatch};
pub use map::SaliencyMap;
pub use render::{heatmap, jet, overlay};
pub use saliency_config::SaliencyConfig;
