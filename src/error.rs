use crate::hadoop::DiscoveryError;
use thiserror::Error;

/// Top-level error type for the catalog-context library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("hadoop configuration discovery failed: {0}")]
    ConfigurationDiscovery(#[from] DiscoveryError),

    #[error("no file io loader registered as '{0}'")]
    UnknownLoader(String),

    #[error("failed to encode catalog context: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("failed to decode catalog context: {0}")]
    Decode(#[from] toml::de::Error),
}
