use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use bincode::Options;
use serde::{Serialize, Deserialize};
use tracing::info;

use crate::data::labels::LabelSet;
use crate::error::{Error, Result};
use crate::math::tensor::Tensor;
use crate::network::metadata::InputShape;
use crate::network::network::Network;

/// A trained classifier together with everything inference needs: the input
/// resolution and the ordered label set the output units map to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub name: String,
    pub input: InputShape,
    pub labels: LabelSet,
    pub network: Network,
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Fixed-width integers, as `bincode::serialize` writes them.
fn bincode_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes()
}

impl ModelArtifact {
    pub fn new(name: impl Into<String>, input: InputShape, labels: LabelSet, network: Network) -> Result<Self> {
        let artifact = ModelArtifact { name: name.into(), input, labels, network };
        artifact.check().map_err(Error::Config)?;
        Ok(artifact)
    }

    /// Verifies that the network accepts `input` and has one output per label.
    fn check(&self) -> std::result::Result<(), String> {
        match self.network.output_shape(self.input.tensor_shape()) {
            None => Err(format!(
                "network does not accept {}x{} RGB input",
                self.input.width, self.input.height
            )),
            Some((n, _, _)) if n != self.labels.len() => Err(format!(
                "network has {} outputs but the label set has {} classes",
                n,
                self.labels.len()
            )),
            Some(_) => Ok(()),
        }
    }

    /// Writes pretty JSON for a `.json` path and bincode otherwise.
    pub fn save(&self, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        if is_json(path) {
            serde_json::to_writer_pretty(writer, self)?;
        } else {
            bincode_options().serialize_into(writer, self)?;
        }
        info!(path = %path.display(), parameters = self.network.parameter_count(), "saved model artifact");
        Ok(())
    }

    /// Loads and validates an artifact.  Every failure is a `ModelLoad` error
    /// naming the file.
    pub fn load(path: &Path) -> Result<ModelArtifact> {
        let fail = |reason: String| Error::ModelLoad { path: PathBuf::from(path), reason };
        let file = File::open(path).map_err(|e| fail(e.to_string()))?;
        let len = file.metadata().map_err(|e| fail(e.to_string()))?.len();
        let reader = BufReader::new(file);
        let artifact: ModelArtifact = if is_json(path) {
            serde_json::from_reader(reader).map_err(|e| fail(e.to_string()))?
        } else {
            // A model can never decode to more bytes than the file holds.
            bincode_options()
                .with_limit(len)
                .deserialize_from(reader)
                .map_err(|e| fail(e.to_string()))?
        };
        artifact.check().map_err(fail)?;
        info!(
            path = %path.display(),
            classes = artifact.labels.len(),
            input = ?artifact.input,
            "loaded model artifact"
        );
        Ok(artifact)
    }

    /// Class probabilities for an already-preprocessed input tensor.
    pub fn predict(&self, input: &Tensor) -> Vec<f64> {
        self.network.forward(input)
    }
}
