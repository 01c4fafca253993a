use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Transport form of a [`CatalogContext`](super::CatalogContext).
///
/// Carries the option entries and the loader identifiers. Loaders are found
/// again by identifier on the receiving side, see
/// [`ContextFactory::from_token`](super::ContextFactory::from_token).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextToken {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefer_io: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_io: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<BTreeMap<String, String>>,
}

impl ContextToken {
    /// Encodes the token as TOML.
    pub fn to_toml(&self) -> Result<String, Error> {
        Ok(toml::to_string(self)?)
    }

    /// Decodes a token from TOML. Missing sections decode as absent.
    pub fn from_toml(s: &str) -> Result<Self, Error> {
        Ok(toml::from_str(s)?)
    }
}
