//! Catalog context: options plus file I/O loader hints.

mod factory;
mod token;

pub use factory::ContextFactory;
pub use token::ContextToken;

use serde::{Serialize, Serializer};

use crate::hadoop::HadoopConf;
use crate::io::LoaderRef;
use crate::{Error, LoaderRegistry, Options};

/// Which construction path produced a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    /// Options and loader hints only.
    Plain,
    /// Additionally loaded default Hadoop configuration from the environment.
    Hadoop,
}

#[derive(Debug, Clone)]
enum Variant {
    Plain,
    Hadoop(HadoopConf),
}

/// Immutable bundle of catalog options and file I/O loader hints.
///
/// Contexts are created through [`ContextFactory`] (or the `create*` shortcuts
/// here, which use a factory that reads the process environment). The factory
/// looks at `hadoop-load-default-config`: when it is `true` the context also
/// carries a [`HadoopConf`] discovered at construction, otherwise it is plain.
/// The kind never changes for the lifetime of a context.
///
/// The options handle is held, not copied. Mutating the same [`Options`]
/// afterwards is visible through [`options()`](Self::options), but does not
/// re-run kind selection; use [`copy`](Self::copy) for that.
///
/// Loader hints are stored in priority order. Callers should try
/// [`prefer_io`](Self::prefer_io) first and [`fallback_io`](Self::fallback_io)
/// second; see [`select_loader`](crate::io::select_loader).
///
/// ## Example
///
/// ```
/// use catalog_context::{CatalogContext, ContextKind, Options};
///
/// let options: Options = [("warehouse", "/tmp/wh")].into_iter().collect();
/// let ctx = CatalogContext::create(options.clone())?;
///
/// assert_eq!(ctx.kind(), ContextKind::Plain);
/// assert!(ctx.options().ptr_eq(&options));
/// assert!(ctx.prefer_io().is_none());
/// # Ok::<(), catalog_context::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct CatalogContext {
    options: Options,
    prefer_io: Option<LoaderRef>,
    fallback_io: Option<LoaderRef>,
    variant: Variant,
    factory: ContextFactory,
}

impl CatalogContext {
    /// Creates a context without loader hints.
    pub fn create(options: Options) -> Result<Self, Error> {
        ContextFactory::default().create(options)
    }

    /// Creates a context with only a fallback loader.
    pub fn create_with_fallback(
        options: Options,
        fallback_io: Option<LoaderRef>,
    ) -> Result<Self, Error> {
        ContextFactory::default().create_with_fallback(options, fallback_io)
    }

    /// Creates a context with both loader hints.
    pub fn create_with_loaders(
        options: Options,
        prefer_io: Option<LoaderRef>,
        fallback_io: Option<LoaderRef>,
    ) -> Result<Self, Error> {
        ContextFactory::default().create_with_loaders(options, prefer_io, fallback_io)
    }

    /// Creates a context whose only option is `warehouse = location`.
    pub fn create_for_warehouse(location: impl AsRef<str>) -> Result<Self, Error> {
        ContextFactory::default().create_for_warehouse(location)
    }

    /// Decodes a context from its TOML transport form, re-resolving loaders
    /// through `registry`.
    pub fn from_toml(s: &str, registry: &LoaderRegistry) -> Result<Self, Error> {
        ContextFactory::default().from_token(ContextToken::from_toml(s)?, registry)
    }

    /// Creates a new builder for constructing a `CatalogContext`.
    pub fn builder() -> CatalogContextBuilder {
        CatalogContextBuilder::default()
    }

    /// Returns the options handle this context was created with.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Returns the loader to try first, if any.
    pub fn prefer_io(&self) -> Option<&LoaderRef> {
        self.prefer_io.as_ref()
    }

    /// Returns the loader to try when the preferred one is absent or cannot serve.
    pub fn fallback_io(&self) -> Option<&LoaderRef> {
        self.fallback_io.as_ref()
    }

    /// Returns which construction path produced this context.
    pub fn kind(&self) -> ContextKind {
        match self.variant {
            Variant::Plain => ContextKind::Plain,
            Variant::Hadoop(_) => ContextKind::Hadoop,
        }
    }

    /// Hadoop configuration discovered at construction, for Hadoop contexts.
    pub fn hadoop_conf(&self) -> Option<&HadoopConf> {
        match &self.variant {
            Variant::Plain => None,
            Variant::Hadoop(conf) => Some(conf),
        }
    }

    /// Creates a context over `options` with this context's loader hints.
    ///
    /// Kind selection runs again against `options`, and a Hadoop context
    /// re-discovers its configuration rather than reusing this one's.
    pub fn copy(&self, options: Options) -> Result<Self, Error> {
        self.factory
            .create_with_loaders(options, self.prefer_io.clone(), self.fallback_io.clone())
    }

    /// Returns the transport form of this context.
    pub fn to_token(&self) -> ContextToken {
        ContextToken {
            prefer_io: self.prefer_io.as_ref().map(|l| l.identifier().to_string()),
            fallback_io: self.fallback_io.as_ref().map(|l| l.identifier().to_string()),
            options: Some(self.options.to_map()),
        }
    }

    /// Encodes the transport form of this context as TOML.
    pub fn to_toml(&self) -> Result<String, Error> {
        self.to_token().to_toml()
    }
}

impl Serialize for CatalogContext {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_token().serialize(serializer)
    }
}

/// Builder for constructing a [`CatalogContext`].
///
/// Options are required; everything else is optional.
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct CatalogContextBuilder {
    options: Option<Options>,
    prefer_io: Option<LoaderRef>,
    fallback_io: Option<LoaderRef>,
    factory: Option<ContextFactory>,
}

impl CatalogContextBuilder {
    /// Sets the options. Required.
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Sets the loader to try first.
    pub fn with_prefer_io(mut self, loader: LoaderRef) -> Self {
        self.prefer_io = Some(loader);
        self
    }

    /// Sets the loader to try second.
    pub fn with_fallback_io(mut self, loader: LoaderRef) -> Self {
        self.fallback_io = Some(loader);
        self
    }

    /// Uses `factory` instead of one reading the process environment.
    pub fn with_factory(mut self, factory: ContextFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Builds the `CatalogContext`.
    ///
    /// Returns [`Error::InvalidArgument`] if no options were provided.
    pub fn build(self) -> Result<CatalogContext, Error> {
        let options = self
            .options
            .ok_or_else(|| Error::InvalidArgument("catalog context requires options".into()))?;
        self.factory
            .unwrap_or_default()
            .create_with_loaders(options, self.prefer_io, self.fallback_io)
    }
}
