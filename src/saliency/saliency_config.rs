use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaliencyConfig {
    /// Size every map is resized to before class averaging.
    pub standard_width: u32,
    pub standard_height: u32,
    /// Weight of the heatmap when blended over the original image.
    pub overlay_alpha: f64,
    pub averaged_file: String,
}

impl Default for SaliencyConfig {
    fn default() -> Self {
        SaliencyConfig {
            standard_width: 224,
            standard_height: 224,
            overlay_alpha: 0.5,
            averaged_file: "averaged_saliency_map.png".into(),
        }
    }
}

impl SaliencyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.standard_width == 0 || self.standard_height == 0 {
            return Err(Error::Config("standard saliency size must be non-zero".into()));
        }
        if !(0.0..=1.0).contains(&self.overlay_alpha) {
            return Err(Error::Config(format!("overlay_alpha must lie in [0, 1], got {}", self.overlay_alpha)));
        }
        Ok(())
    }
}
