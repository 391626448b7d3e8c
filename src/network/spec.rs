use rand::Rng;
use serde::{Serialize, Deserialize};
use tracing::warn;

use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};
use crate::layers::{Conv2d, Dense, Dropout, Layer, MaxPool2d};
use crate::network::metadata::InputShape;
use crate::network::network::Network;

/// Smallest hidden dense layer for a production classifier.
pub const MIN_PRODUCTION_DENSE_UNITS: usize = 128;

/// Architecture of the jurisdiction classifier.
///
/// One convolution + 2×2 max-pool stage per entry of `conv_channels`, then
/// flatten, a ReLU dense layer, dropout, and a softmax output with one unit
/// per class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub input: InputShape,
    /// Output channels of each convolution stage.
    pub conv_channels: Vec<usize>,
    pub kernel_size: usize,
    /// Zero padding per side; 0 gives "valid" convolutions.
    pub padding: usize,
    /// Width of the hidden dense layer. `classifier` uses 512; `build`
    /// accepts anything from 1 so tiny test networks stay cheap, and warns
    /// below `MIN_PRODUCTION_DENSE_UNITS`.
    pub dense_units: usize,
    pub dropout: f64,
    pub num_classes: usize,
}

impl NetworkSpec {
    /// The standard three-stage classifier (32 → 64 → 128, 3×3 kernels).
    pub fn classifier(input: InputShape, num_classes: usize) -> NetworkSpec {
        NetworkSpec {
            input,
            conv_channels: vec![32, 64, 128],
            kernel_size: 3,
            padding: 0,
            dense_units: 512,
            dropout: 0.5,
            num_classes,
        }
    }

    /// Instantiates freshly initialised layers, checking every shape on the way.
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Network> {
        if self.num_classes == 0 {
            return Err(Error::Config("classifier needs at least one class".into()));
        }
        if self.dense_units == 0 {
            return Err(Error::Config("dense layer needs at least one unit".into()));
        }
        if self.dense_units < MIN_PRODUCTION_DENSE_UNITS {
            warn!(
                dense_units = self.dense_units,
                minimum = MIN_PRODUCTION_DENSE_UNITS,
                "hidden dense layer is narrower than a production classifier"
            );
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(Error::Config(format!("dropout rate {} is outside [0, 1)", self.dropout)));
        }

        let mut layers = Vec::new();
        let mut shape = self.input.tensor_shape();
        let mut push = |layer: Layer, shape: &mut (usize, usize, usize)| -> Result<()> {
            *shape = layer.output_shape(*shape).ok_or_else(|| {
                Error::Config(format!(
                    "input {}x{} is too small for {} convolution stages",
                    self.input.width,
                    self.input.height,
                    self.conv_channels.len()
                ))
            })?;
            layers.push(layer);
            Ok(())
        };

        for &channels in &self.conv_channels {
            let conv = Conv2d::new(shape.0, channels, self.kernel_size, self.padding, ActivationFunction::ReLU, rng);
            push(Layer::Conv2d(conv), &mut shape)?;
            push(Layer::MaxPool2d(MaxPool2d::new(2)), &mut shape)?;
        }
        push(Layer::Flatten, &mut shape)?;
        let flat = shape.0;
        push(Layer::Dense(Dense::new(self.dense_units, flat, ActivationFunction::ReLU, rng)), &mut shape)?;
        push(Layer::Dropout(Dropout::new(self.dropout)), &mut shape)?;
        push(
            Layer::Dense(Dense::new(self.num_classes, self.dense_units, ActivationFunction::Softmax, rng)),
            &mut shape,
        )?;
        Ok(Network::new(layers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn standard_classifier_shapes() {
        let spec = NetworkSpec {
            dense_units: 4,
            ..NetworkSpec::classifier(InputShape::new(30, 30), 3)
        };
        let mut rng = StdRng::seed_from_u64(0);
        let net = spec.build(&mut rng).unwrap();
        // 3 x (conv + pool) + flatten + dense + dropout + dense
        assert_eq!(net.layers.len(), 10);
        // 30 -> 28 -> 14 -> 12 -> 6 -> 4 -> 2
        match &net.layers[7] {
            Layer::Dense(d) => assert_eq!(d.input_size, 128 * 2 * 2),
            other => panic!("expected dense layer, got {:?}", other),
        }
        assert_eq!(net.output_shape((3, 30, 30)), Some((3, 1, 1)));
    }

    #[test]
    fn dense_width_defaults_above_production_floor_and_small_widths_still_build() {
        let spec = NetworkSpec::classifier(InputShape::new(30, 30), 2);
        assert!(spec.dense_units >= MIN_PRODUCTION_DENSE_UNITS);

        let small = NetworkSpec { conv_channels: vec![2], dense_units: 1, ..spec.clone() };
        assert!(small.build(&mut StdRng::seed_from_u64(0)).is_ok());
        let none = NetworkSpec { dense_units: 0, ..small };
        assert!(matches!(none.build(&mut StdRng::seed_from_u64(0)), Err(Error::Config(_))));
    }

    #[test]
    fn collapsing_input_is_a_config_error() {
        let spec = NetworkSpec::classifier(InputShape::new(16, 16), 3);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(spec.build(&mut rng), Err(Error::Config(_))));
    }
}
