//! Immutable catalog contexts: options plus preferred and fallback file I/O
//! loader hints, with optional default Hadoop configuration.

pub mod context;
mod error;
pub mod hadoop;
pub mod io;
pub mod options;

pub use context::{CatalogContext, CatalogContextBuilder, ContextFactory, ContextKind, ContextToken};
pub use error::Error;
pub use hadoop::{DefaultsDiscovery, DiscoveryError, HadoopConf, HadoopDiscovery};
pub use io::{select_loader, FileIoLoader, LoaderRef, LoaderRegistry};
pub use options::{ConfigOption, Options};
