use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("could not load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("could not save image {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("could not load model {path}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    #[error("payload needs {needed} channel slots but the image only has {available}")]
    EncodingCapacity { needed: usize, available: usize },

    #[error("no end-of-message marker found in image")]
    MissingTerminator,

    #[error("payload contains the end-of-message marker at bit {0}")]
    PayloadContainsTerminator(usize),

    #[error("decoded payload is {0} bits long, not a whole number of bytes")]
    PartialByte(usize),

    #[error("decoded payload is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("unknown class label '{0}'")]
    UnknownLabel(String),

    #[error("class index {index} is out of range for {count} labels")]
    ClassIndex { index: usize, count: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("refusing to write an encoded payload to a lossy or unknown format: {0}")]
    LossyFormat(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("model encoding error: {0}")]
    Encoding(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
