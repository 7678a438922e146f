//! Error types for Cairn

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Cairn operations
#[derive(Debug, Error)]
pub enum CairnError {
    #[error("found multiple matching assets for key: {key:?} ({} candidates)", candidates.len())]
    AmbiguousMatch {
        key: String,
        /// `(key, asset_path)` of every candidate, in registration order
        candidates: Vec<(String, String)>,
    },

    #[error("unknown asset format: {0:?}")]
    UnsupportedFormat(String),

    #[error("unable to determine hash for {url:?}: {reason}")]
    HashAcquisition { url: String, reason: String },

    #[error("error downloading {url:?}: {reason}")]
    Network { url: String, reason: String },

    #[error("hash mismatch for {}: expected {expected}, got {actual}", path.display())]
    Verification {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("error expanding {}: {reason}", path.display())]
    Extraction { path: PathBuf, reason: String },

    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),
}

/// Result type alias for Cairn operations
pub type Result<T> = std::result::Result<T, CairnError>;

impl From<toml::de::Error> for CairnError {
    fn from(err: toml::de::Error) -> Self {
        CairnError::TomlParseError(err.to_string())
    }
}
