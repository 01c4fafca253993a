use std::sync::Arc;

use super::{CatalogContext, ContextToken, Variant};
use crate::hadoop::{DefaultsDiscovery, HadoopDiscovery};
use crate::io::LoaderRef;
use crate::options::catalog::{HADOOP_LOAD_DEFAULT_CONFIG, WAREHOUSE};
use crate::{Error, LoaderRegistry, Options};

/// Creates [`CatalogContext`]s, choosing the plain or Hadoop kind from options.
///
/// The factory owns the discovery used for Hadoop contexts. Every context it
/// creates keeps a handle to it so that [`CatalogContext::copy`] discovers with
/// the same source.
///
/// ```
/// use catalog_context::hadoop::HadoopDiscovery;
/// use catalog_context::{ContextFactory, ContextKind, Options};
///
/// let factory = ContextFactory::new(HadoopDiscovery::new().with_environment([("HOME", "/root")]));
/// let options: Options = [("hadoop-load-default-config", "true"), ("hadoop.fs.defaultFS", "file:///")]
///     .into_iter()
///     .collect();
///
/// let ctx = factory.create(options)?;
/// assert_eq!(ctx.kind(), ContextKind::Hadoop);
/// assert_eq!(ctx.hadoop_conf().and_then(|c| c.get("fs.defaultFS")), Some("file:///"));
/// # Ok::<(), catalog_context::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ContextFactory {
    discovery: Arc<dyn DefaultsDiscovery>,
}

impl Default for ContextFactory {
    fn default() -> Self {
        Self::new(HadoopDiscovery::new())
    }
}

impl ContextFactory {
    /// Creates a factory that loads Hadoop defaults through `discovery`.
    pub fn new(discovery: impl DefaultsDiscovery + 'static) -> Self {
        Self {
            discovery: Arc::new(discovery),
        }
    }

    /// Creates a context without loader hints.
    pub fn create(&self, options: Options) -> Result<CatalogContext, Error> {
        self.create_with_loaders(options, None, None)
    }

    /// Creates a context with only a fallback loader.
    pub fn create_with_fallback(
        &self,
        options: Options,
        fallback_io: Option<LoaderRef>,
    ) -> Result<CatalogContext, Error> {
        self.create_with_loaders(options, None, fallback_io)
    }

    /// Creates a context, loading Hadoop defaults first when
    /// `hadoop-load-default-config` is `true`.
    ///
    /// A discovery failure fails construction; it never degrades to a plain
    /// context.
    pub fn create_with_loaders(
        &self,
        options: Options,
        prefer_io: Option<LoaderRef>,
        fallback_io: Option<LoaderRef>,
    ) -> Result<CatalogContext, Error> {
        let variant = if should_load_hadoop(&options) {
            Variant::Hadoop(self.discovery.discover(&options)?)
        } else {
            Variant::Plain
        };

        let ctx = CatalogContext {
            options,
            prefer_io,
            fallback_io,
            variant,
            factory: self.clone(),
        };
        tracing::debug!(
            kind = ?ctx.kind(),
            prefer_io = ctx.prefer_io.as_ref().map(|l| l.identifier()),
            fallback_io = ctx.fallback_io.as_ref().map(|l| l.identifier()),
            "created catalog context"
        );
        Ok(ctx)
    }

    /// Creates a context whose only option is `warehouse = location`.
    ///
    /// Trailing slashes are removed from `location`. An empty location is
    /// rejected with [`Error::InvalidArgument`].
    pub fn create_for_warehouse(&self, location: impl AsRef<str>) -> Result<CatalogContext, Error> {
        let location = normalize_location(location.as_ref())
            .ok_or_else(|| Error::InvalidArgument("warehouse location is empty".into()))?;
        let options = Options::new();
        options.set_option(&WAREHOUSE, location);
        self.create(options)
    }

    /// Rebuilds a context from its transport form.
    ///
    /// Loaders are looked up in `registry` by identifier and kind selection runs
    /// again here, so a Hadoop context discovers the receiving side's
    /// environment.
    pub fn from_token(
        &self,
        token: ContextToken,
        registry: &LoaderRegistry,
    ) -> Result<CatalogContext, Error> {
        let options = token
            .options
            .ok_or_else(|| Error::InvalidArgument("context token carries no options".into()))?;
        let resolve = |name: Option<String>| -> Result<Option<LoaderRef>, Error> {
            name.map(|name| registry.get(&name).ok_or(Error::UnknownLoader(name)))
                .transpose()
        };
        let prefer_io = resolve(token.prefer_io)?;
        let fallback_io = resolve(token.fallback_io)?;
        self.create_with_loaders(Options::from_map(options), prefer_io, fallback_io)
    }
}

fn should_load_hadoop(options: &Options) -> bool {
    options.get_bool(
        HADOOP_LOAD_DEFAULT_CONFIG.key(),
        HADOOP_LOAD_DEFAULT_CONFIG.default_value(),
    )
}

fn normalize_location(location: &str) -> Option<String> {
    let location = location.trim();
    if location.is_empty() {
        return None;
    }
    let trimmed = location.trim_end_matches('/');
    if trimmed.is_empty() || trimmed.ends_with(':') {
        Some(location.to_string())
    } else {
        Some(trimmed.to_string())
    }
}
