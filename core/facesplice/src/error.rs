use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FaceSpliceError {
    #[error("source image not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("metadata document not found: {}", .0.display())]
    MetadataNotFound(PathBuf),

    #[error("failed to decode image {}: {message}", .path.display())]
    DecodeError { path: PathBuf, message: String },

    #[error("failed to encode image: {0}")]
    EncodeError(String),

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unrecognized mode {0:?}, expected \"auto\" or \"manual\"")]
    InvalidMode(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("zero-area or oversized region for face id(s) {ids:?}")]
    DegenerateRegions { ids: Vec<u32> },

    #[error("failed to write face image(s) {ids:?}: {message}")]
    FaceWriteFailed { ids: Vec<u32>, message: String },

    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("failed to parse {}: {message}", .path.display())]
    ParseError { path: PathBuf, message: String },

    #[error("failed to load detector model: {0}")]
    DetectorLoad(String),
}

impl FaceSpliceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FaceSpliceError::Io {
            path: path.into(),
            source,
        }
    }
}
