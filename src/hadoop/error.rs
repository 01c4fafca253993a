use std::path::PathBuf;
use thiserror::Error;

/// Failure while discovering default Hadoop configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DiscoveryError {
    #[error("hadoop configuration directory not found: {0}")]
    ConfDirNotFound(PathBuf),

    #[error("failed to read hadoop config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse hadoop config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("circular reference detected in hadoop configuration")]
    CircularReference,

    #[error("referenced property not found: {0}")]
    ReferenceNotFound(String),

    #[error("invalid reference path: {0}")]
    InvalidReferencePath(String),

    #[error("reference chain too deep at property: {0}")]
    ReferenceTooDeep(String),

    #[error("expanded value of property '{0}' is too large")]
    ValueTooLarge(String),

    #[error("unclosed reference (missing '}}')")]
    UnclosedReference,
}
