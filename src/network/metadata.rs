use serde::{Deserialize, Serialize};

/// Spatial resolution a model expects.  Inputs are always RGB, resized to
/// `width × height` and normalized to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputShape {
    pub width: u32,
    pub height: u32,
}

impl InputShape {
    pub const CHANNELS: usize = 3;

    pub fn new(width: u32, height: u32) -> Self {
        InputShape { width, height }
    }

    /// `(channels, height, width)` of the input tensor.
    pub fn tensor_shape(&self) -> (usize, usize, usize) {
        (InputShape::CHANNELS, self.height as usize, self.width as usize)
    }
}

impl Default for InputShape {
    fn default() -> Self {
        InputShape::new(224, 224)
    }
}
