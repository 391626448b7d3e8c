use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::data::labels::LabelSet;
use crate::error::{Error, Result};
use crate::math::tensor::argmax;

/// Text written in place of a label when the top probability is below the
/// threshold.
pub const NO_CONFIDENT_PREDICTION: &str = "No confident predictions";

/// Minimum top-class probability, in [0, 1], for a label to be reported.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Threshold(f64);

impl Threshold {
    pub fn new(value: f64) -> Result<Threshold> {
        if (0.0..=1.0).contains(&value) {
            Ok(Threshold(value))
        } else {
            Err(Error::Config(format!("confidence threshold must lie in [0, 1], got {value}")))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold(0.70)
    }
}

impl<'de> Deserialize<'de> for Threshold {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Threshold::new(value).map_err(serde::de::Error::custom)
    }
}

/// A label, or the hard "not confident" gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prediction {
    Label(String),
    NotConfident,
}

impl Prediction {
    pub fn label(&self) -> Option<&str> {
        match self {
            Prediction::Label(name) => Some(name),
            Prediction::NotConfident => None,
        }
    }

    pub fn is_confident(&self) -> bool {
        matches!(self, Prediction::Label(_))
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prediction::Label(name) => f.write_str(name),
            Prediction::NotConfident => f.write_str(NO_CONFIDENT_PREDICTION),
        }
    }
}

impl Serialize for Prediction {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Prediction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(if text == NO_CONFIDENT_PREDICTION {
            Prediction::NotConfident
        } else {
            Prediction::Label(text)
        })
    }
}

/// Outcome of one forward pass after thresholding.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub prediction: Prediction,
    /// Arg-max class, reported even when the prediction is not confident.
    pub class_index: usize,
    /// Top probability as a fraction in [0, 1].
    pub confidence: f64,
    pub probabilities: Vec<f64>,
}

/// Applies the threshold gate to a probability vector.
///
/// The sentinel is returned iff the top probability is below `threshold`,
/// whatever class it belongs to.
pub fn decide(probabilities: Vec<f64>, labels: &LabelSet, threshold: Threshold) -> Result<Classification> {
    let class_index = argmax(&probabilities);
    let confidence = probabilities.get(class_index).copied().unwrap_or(0.0);
    let name = labels.get(class_index).ok_or(Error::ClassIndex {
        index: class_index,
        count: labels.len(),
    })?;
    let prediction = if confidence < threshold.value() {
        Prediction::NotConfident
    } else {
        Prediction::Label(name.to_owned())
    };
    Ok(Classification { prediction, class_index, confidence, probabilities })
}

/// Confidence is a fraction in memory and a percentage in result files.
mod percent {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(fraction: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(fraction * 100.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(f64::deserialize(deserializer)? / 100.0)
    }
}

/// One entry of the predictions file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub image: String,
    pub predicted_county: Prediction,
    #[serde(with = "percent")]
    pub confidence: f64,
}

impl PredictionRecord {
    pub fn new(image: impl Into<String>, classification: &Classification) -> Self {
        PredictionRecord {
            image: image.into(),
            predicted_county: classification.prediction.clone(),
            confidence: classification.confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counties() -> LabelSet {
        LabelSet::new(vec!["jefferson".into(), "midlands".into(), "orange".into()]).unwrap()
    }

    #[test]
    fn confident_prediction_names_the_label() {
        let c = decide(vec![0.2, 0.75, 0.05], &counties(), Threshold::default()).unwrap();
        assert_eq!(c.prediction, Prediction::Label("midlands".into()));
        assert_eq!(c.class_index, 1);
        assert_eq!(c.confidence, 0.75);

        let json = serde_json::to_value(PredictionRecord::new("a.jpg", &c)).unwrap();
        assert_eq!(json["predicted_county"], "midlands");
        assert_eq!(json["confidence"], 75.0);
    }

    #[test]
    fn low_confidence_is_the_sentinel_for_any_label_order() {
        let probs = vec![0.4, 0.35, 0.25];
        let orders = [
            vec!["jefferson", "midlands", "orange"],
            vec!["orange", "jefferson", "midlands"],
            vec!["midlands", "orange", "jefferson"],
        ];
        for order in orders {
            let labels = LabelSet::new(order.into_iter().map(String::from).collect()).unwrap();
            let c = decide(probs.clone(), &labels, Threshold::default()).unwrap();
            assert_eq!(c.prediction, Prediction::NotConfident);
            assert_eq!(c.prediction.label(), None);
        }
    }

    #[test]
    fn threshold_is_inclusive() {
        let t = Threshold::new(0.75).unwrap();
        let c = decide(vec![0.2, 0.75, 0.05], &counties(), t).unwrap();
        assert!(c.prediction.is_confident());
    }

    #[test]
    fn sentinel_round_trips_through_json() {
        let record = PredictionRecord {
            image: "x.png".into(),
            predicted_county: Prediction::NotConfident,
            confidence: 0.4,
        };
        let text = serde_json::to_string(&record).unwrap();
        assert!(text.contains("\"No confident predictions\""));
        let back: PredictionRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back.predicted_county, Prediction::NotConfident);
        assert!((back.confidence - 0.4).abs() < 1e-12);
    }

    #[test]
    fn threshold_outside_unit_interval_is_rejected() {
        assert!(Threshold::new(1.5).is_err());
        assert!(Threshold::new(-0.1).is_err());
        assert!(serde_json::from_str::<Threshold>("2.0").is_err());
        assert_eq!(serde_json::from_str::<Threshold>("0.5").unwrap().value(), 0.5);
    }

    #[test]
    fn more_outputs_than_labels_is_a_class_index_error() {
        let labels = LabelSet::new(vec!["a".into()]).unwrap();
        let err = decide(vec![0.1, 0.9], &labels, Threshold::default()).unwrap_err();
        assert!(matches!(err, Error::ClassIndex { index: 1, count: 1 }));
    }
}
