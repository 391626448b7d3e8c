use serde::{Serialize, Deserialize};

/// A channel-major (C × H × W) activation buffer.
///
/// Dense activations are represented as `(n, 1, 1)` tensors so every layer
/// consumes and produces the same type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
    pub data: Vec<f64>,
}

impl Tensor {
    pub fn zeros(channels: usize, height: usize, width: usize) -> Tensor {
        Tensor {
            channels,
            height,
            width,
            data: vec![0.0; channels * height * width],
        }
    }

    /// Wraps an existing buffer. Panics if the length does not match the shape.
    pub fn from_data(channels: usize, height: usize, width: usize, data: Vec<f64>) -> Tensor {
        assert_eq!(
            data.len(),
            channels * height * width,
            "tensor data length does not match {}x{}x{}",
            channels, height, width
        );
        Tensor { channels, height, width, data }
    }

    /// A flat `(n, 1, 1)` tensor.
    pub fn vector(data: Vec<f64>) -> Tensor {
        let n = data.len();
        Tensor { channels: n, height: 1, width: 1, data }
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (self.channels, self.height, self.width)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn plane_len(&self) -> usize {
        self.height * self.width
    }

    /// The `H × W` slice of one channel.
    pub fn plane(&self, channel: usize) -> &[f64] {
        let n = self.plane_len();
        &self.data[channel * n..(channel + 1) * n]
    }

    pub fn get(&self, c: usize, y: usize, x: usize) -> f64 {
        self.data[(c * self.height + y) * self.width + x]
    }

    pub fn set(&mut self, c: usize, y: usize, x: usize, value: f64) {
        self.data[(c * self.height + y) * self.width + x] = value;
    }

    pub fn reshaped(mut self, channels: usize, height: usize, width: usize) -> Tensor {
        assert_eq!(self.data.len(), channels * height * width, "reshape must preserve length");
        self.channels = channels;
        self.height = height;
        self.width = width;
        self
    }

    pub fn map<F>(&self, functor: F) -> Tensor
    where
        F: Fn(f64) -> f64,
    {
        Tensor {
            channels: self.channels,
            height: self.height,
            width: self.width,
            data: self.data.iter().map(|&x| functor(x)).collect(),
        }
    }
}

/// Index of the maximum element in a slice (first one on ties).
pub fn argmax(v: &[f64]) -> usize {
    let mut best = 0;
    for (i, &x) in v.iter().enumerate() {
        if x > v[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexing_is_channel_major() {
        let mut t = Tensor::zeros(2, 3, 4);
        t.set(1, 2, 3, 9.0);
        assert_eq!(t.data[23], 9.0);
        assert_eq!(t.plane(1)[11], 9.0);
    }

    #[test]
    fn argmax_prefers_first_maximum() {
        assert_eq!(argmax(&[0.1, 0.7, 0.7, 0.2]), 1);
        assert_eq!(argmax(&[]), 0);
    }
}
