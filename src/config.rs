//! Run-wide configuration, one section per component.  Every field has a
//! default, so a config file only needs the values it changes.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::fingerprint::FingerprintConfig;
use crate::inference::ClassifierConfig;
use crate::saliency::SaliencyConfig;
use crate::train::TrainConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub classifier: ClassifierConfig,
    pub fingerprint: FingerprintConfig,
    pub saliency: SaliencyConfig,
    pub training: TrainConfig,
}

impl Config {
    pub fn load_json(path: &Path) -> Result<Config> {
        let config: Config = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every section.  The confidence threshold is already range
    /// checked when it is constructed.
    pub fn validate(&self) -> Result<()> {
        self.fingerprint.validate()?;
        self.saliency.validate()?;
        self.training.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn defaults_match_the_documented_values() {
        let cfg = Config::default();
        assert_eq!(cfg.classifier.input().tensor_shape(), (3, 224, 224));
        assert_eq!(cfg.classifier.confidence_threshold.value(), 0.70);
        assert_eq!((cfg.fingerprint.canonical_width, cfg.fingerprint.canonical_height), (480, 600));
        assert_eq!(cfg.fingerprint.top_percentage, 5.0);
        assert_eq!((cfg.saliency.standard_width, cfg.saliency.standard_height), (224, 224));
        assert_eq!(cfg.training.epochs, 50);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_file_overrides_only_what_it_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "classifier": { "confidence_threshold": 0.9 }, "fingerprint": { "top_percentage": 10 } }"#,
        )
        .unwrap();
        let cfg = Config::load_json(&path).unwrap();
        assert_eq!(cfg.classifier.confidence_threshold.value(), 0.9);
        assert_eq!(cfg.classifier.input_width, 224);
        assert_eq!(cfg.fingerprint.top_percentage, 10.0);
        assert_eq!(cfg.training, TrainConfig::default());
    }

    #[test]
    fn out_of_range_threshold_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "classifier": { "confidence_threshold": 1.2 } }"#).unwrap();
        assert!(matches!(Config::load_json(&path), Err(Error::Json(_))));
    }
}
