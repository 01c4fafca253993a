//! Default Hadoop configuration discovered from the environment.
//!
//! Only Hadoop-aware contexts (option `hadoop-load-default-config = true`) run
//! discovery. The result is a [`HadoopConf`]: flat, dotted property names mapped
//! to string values.

mod discovery;
mod error;
mod resolve;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

pub use discovery::HadoopDiscovery;
pub use error::DiscoveryError;

use crate::Options;

/// Produces default environment configuration for a set of options.
///
/// Implementations must not mutate `options`.
pub trait DefaultsDiscovery: Send + Sync + fmt::Debug {
    /// Discovers configuration for `options`.
    fn discover(&self, options: &Options) -> Result<HadoopConf, DiscoveryError>;
}

/// Hadoop configuration derived at context construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HadoopConf {
    props: BTreeMap<String, String>,
    sources: Vec<PathBuf>,
}

impl HadoopConf {
    /// Creates a configuration from flat properties and the files they came from.
    pub fn new(props: BTreeMap<String, String>, sources: Vec<PathBuf>) -> Self {
        Self { props, sources }
    }

    /// Returns the value of property `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.props.get(name).map(String::as_str)
    }

    /// Iterates over properties in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.props.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of properties.
    pub fn len(&self) -> usize {
        self.props.len()
    }

    /// Returns true if there are no properties.
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Files that contributed to this configuration, in merge order.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }
}
