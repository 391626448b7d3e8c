use serde::{Serialize, Deserialize};

use crate::inference::prediction::Threshold;
use crate::network::metadata::InputShape;

/// Model resolution and inference gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub input_width: u32,
    pub input_height: u32,
    pub confidence_threshold: Threshold,
    pub predictions_file: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            input_width: 224,
            input_height: 224,
            confidence_threshold: Threshold::default(),
            predictions_file: "predictions.json".into(),
        }
    }
}

impl ClassifierConfig {
    pub fn input(&self) -> InputShape {
        InputShape::new(self.input_width, self.input_height)
    }
}
