//! File I/O loader hints carried by a catalog context.
//!
//! A context never invokes a loader. It only carries up to two of them: a
//! preferred one and a fallback. Callers pick a loader with [`select_loader`],
//! which tries the preferred loader first, then the fallback, then a
//! [`LoaderRegistry`] lookup by scheme.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::CatalogContext;

/// A named factory for a file I/O backend.
pub trait FileIoLoader: Send + Sync + fmt::Debug {
    /// Stable name used to find this loader again after a context is transported.
    fn identifier(&self) -> &str;

    /// URI scheme served by this loader, e.g. `s3` or `file`.
    fn scheme(&self) -> &str;

    /// True if this loader serves `scheme`.
    fn supports(&self, scheme: &str) -> bool {
        self.scheme().eq_ignore_ascii_case(scheme)
    }
}

/// Shared handle to a loader.
pub type LoaderRef = Arc<dyn FileIoLoader>;

/// Two loader hints are the same if they are the same object or share an identifier.
pub fn same_loader(a: Option<&LoaderRef>, b: Option<&LoaderRef>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Arc::ptr_eq(a, b) || a.identifier() == b.identifier(),
        _ => false,
    }
}

/// Loaders known to a process, addressable by identifier or by scheme.
///
/// The first loader registered for a scheme wins scheme lookups.
#[derive(Debug, Default, Clone)]
pub struct LoaderRegistry {
    by_identifier: HashMap<String, LoaderRef>,
    by_scheme: HashMap<String, LoaderRef>,
}

impl LoaderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a loader. A loader with the same identifier is replaced.
    pub fn register(&mut self, loader: LoaderRef) -> &mut Self {
        self.by_scheme
            .entry(loader.scheme().to_ascii_lowercase())
            .or_insert_with(|| Arc::clone(&loader));
        self.by_identifier
            .insert(loader.identifier().to_string(), loader);
        self
    }

    /// Returns the loader registered as `identifier`.
    pub fn get(&self, identifier: &str) -> Option<LoaderRef> {
        self.by_identifier.get(identifier).cloned()
    }

    /// Returns the loader serving `scheme`, compared case-insensitively.
    pub fn for_scheme(&self, scheme: &str) -> Option<LoaderRef> {
        self.by_scheme.get(&scheme.to_ascii_lowercase()).cloned()
    }

    /// Returns the number of registered loaders.
    pub fn len(&self) -> usize {
        self.by_identifier.len()
    }

    /// Returns true if no loader is registered.
    pub fn is_empty(&self) -> bool {
        self.by_identifier.is_empty()
    }
}

impl FromIterator<LoaderRef> for LoaderRegistry {
    fn from_iter<I: IntoIterator<Item = LoaderRef>>(iter: I) -> Self {
        let mut registry = Self::new();
        for loader in iter {
            registry.register(loader);
        }
        registry
    }
}

/// Picks the loader for `scheme` in priority order: preferred, fallback, then
/// the registry.
///
/// A hint that is set but does not serve `scheme` is skipped. Returns `None`
/// when nothing matches.
pub fn select_loader(
    ctx: &CatalogContext,
    scheme: &str,
    registry: &LoaderRegistry,
) -> Option<LoaderRef> {
    let hinted = [ctx.prefer_io(), ctx.fallback_io()]
        .into_iter()
        .flatten()
        .find(|loader| loader.supports(scheme));

    if let Some(loader) = hinted {
        tracing::debug!(scheme, loader = loader.identifier(), "using context loader hint");
        return Some(Arc::clone(loader));
    }

    let discovered = registry.for_scheme(scheme);
    tracing::debug!(scheme, found = discovered.is_some(), "discovering loader by scheme");
    discovered
}

/// Extracts the scheme from a location such as `s3://bucket/path`.
///
/// Plain paths have no scheme.
pub fn scheme_of(location: &str) -> Option<&str> {
    let (scheme, _) = location.split_once("://")?;
    let valid = !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(scheme)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    #[derive(Debug)]
    pub struct StaticLoader {
        pub identifier: String,
        pub scheme: String,
    }

    pub fn loader(identifier: &str, scheme: &str) -> LoaderRef {
        Arc::new(StaticLoader {
            identifier: identifier.to_string(),
            scheme: scheme.to_string(),
        })
    }

    impl FileIoLoader for StaticLoader {
        fn identifier(&self) -> &str {
            &self.identifier
        }

        fn scheme(&self) -> &str {
            &self.scheme
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::loader;
    use super::*;
    use crate::Options;

    fn context(prefer: Option<LoaderRef>, fallback: Option<LoaderRef>) -> CatalogContext {
        CatalogContext::create_with_loaders(Options::new(), prefer, fallback).unwrap()
    }

    #[test]
    fn test_prefer_wins_when_it_serves_scheme() {
        let ctx = context(Some(loader("s3-a", "s3")), Some(loader("s3-b", "s3")));
        let chosen = select_loader(&ctx, "s3", &LoaderRegistry::new()).unwrap();
        assert_eq!(chosen.identifier(), "s3-a");
    }

    #[test]
    fn test_fallback_used_when_prefer_cannot_serve() {
        let ctx = context(Some(loader("oss", "oss")), Some(loader("s3", "s3")));
        let chosen = select_loader(&ctx, "S3", &LoaderRegistry::new()).unwrap();
        assert_eq!(chosen.identifier(), "s3");
    }

    #[test]
    fn test_registry_used_when_no_hints() {
        let ctx = context(None, None);
        let registry: LoaderRegistry = [loader("local", "file"), loader("hdfs", "hdfs")]
            .into_iter()
            .collect();

        let chosen = select_loader(&ctx, "hdfs", &registry).unwrap();
        assert_eq!(chosen.identifier(), "hdfs");
        assert!(select_loader(&ctx, "gs", &registry).is_none());
    }

    #[test]
    fn test_registry_first_scheme_registration_wins() {
        let mut registry = LoaderRegistry::new();
        registry.register(loader("first", "s3")).register(loader("second", "s3"));

        assert_eq!(registry.for_scheme("s3").unwrap().identifier(), "first");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_scheme_of() {
        assert_eq!(scheme_of("s3://bucket/wh"), Some("s3"));
        assert_eq!(scheme_of("hdfs://nn:8020/wh"), Some("hdfs"));
        assert_eq!(scheme_of("/tmp/wh"), None);
        assert_eq!(scheme_of("://nothing"), None);
    }

    #[test]
    fn test_same_loader() {
        let a = loader("x", "s3");
        let b = loader("x", "s3");
        let c = loader("y", "s3");

        assert!(same_loader(Some(&a), Some(&b)));
        assert!(!same_loader(Some(&a), Some(&c)));
        assert!(!same_loader(Some(&a), None));
        assert!(same_loader(None, None));
    }
}
