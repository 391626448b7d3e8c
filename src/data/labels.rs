use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};

/// Ordered class names; position `i` is the label of network output `i`.
///
/// The set is derived once from the training root and stored inside the model
/// artifact, so inference never re-reads a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet {
    names: Vec<String>,
}

impl LabelSet {
    /// Fails when the list is empty or holds duplicates.
    pub fn new(names: Vec<String>) -> Result<LabelSet> {
        if names.is_empty() {
            return Err(Error::InsufficientData("label set is empty".into()));
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(Error::Config(format!("duplicate class label '{}'", name)));
            }
        }
        Ok(LabelSet { names })
    }

    /// Sorted names of the immediate subdirectories of `root`.
    pub fn from_directory(root: &Path) -> Result<LabelSet> {
        let mut names: Vec<String> = std::fs::read_dir(root)?
            .flatten()
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().to_str().map(|s| s.to_owned()))
            .collect();
        names.sort();
        if names.is_empty() {
            return Err(Error::InsufficientData(format!(
                "no class subdirectories under {}",
                root.display()
            )));
        }
        LabelSet::new(names)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(|s| s.as_str())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Exact match first, then an ASCII case-insensitive one.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
            .or_else(|| self.names.iter().position(|n| n.eq_ignore_ascii_case(name)))
    }

    pub fn resolve(&self, name: &str) -> Result<usize> {
        self.index_of(name).ok_or_else(|| Error::UnknownLabel(name.to_owned()))
    }
}
