//! Key/value options shared between a catalog context and its callers.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A string-to-string options map behind a shared handle.
///
/// Cloning an `Options` does **not** copy the entries: both handles see the same
/// map, so a `set` through one is visible through the other. A
/// [`CatalogContext`](crate::CatalogContext) holds the handle it was given, which
/// means later mutation by the caller shows up through
/// [`options()`](crate::CatalogContext::options). Use [`deep_copy`](Self::deep_copy)
/// to detach.
///
/// ```
/// use catalog_context::Options;
///
/// let options = Options::new();
/// let alias = options.clone();
/// alias.set("warehouse", "/tmp/wh");
/// assert_eq!(options.get("warehouse").as_deref(), Some("/tmp/wh"));
/// ```
#[derive(Clone, Default)]
pub struct Options {
    inner: Arc<RwLock<BTreeMap<String, String>>>,
}

impl Options {
    /// Creates an empty options map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing map in a new handle.
    pub fn from_map(map: BTreeMap<String, String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    /// Returns a copy of the value for `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.read().get(key).cloned()
    }

    /// Reads `key` as a boolean.
    ///
    /// Only `true` and `false` (ignoring ASCII case) are accepted. A missing key or
    /// any other value yields `default`.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        let guard = self.inner.read();
        match guard.get(key) {
            None => default,
            Some(raw) => parse_bool(raw).unwrap_or_else(|| {
                tracing::debug!(key, value = %raw, default, "ignoring non-boolean option value");
                default
            }),
        }
    }

    /// Reads a typed option, falling back to its declared default.
    pub fn get_option<T: OptionValue>(&self, option: &ConfigOption<T>) -> T {
        let guard = self.inner.read();
        guard
            .get(option.key())
            .and_then(|raw| T::parse(raw))
            .unwrap_or_else(|| option.default_value())
    }

    /// Sets `key`, returning the previous value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.inner.write().insert(key.into(), value.into())
    }

    /// Sets a typed option, returning the previous value.
    pub fn set_option<T: OptionValue>(&self, option: &ConfigOption<T>, value: T) -> Option<String> {
        self.set(option.key(), value.render())
    }

    /// Removes `key`, returning its value.
    pub fn remove(&self, key: &str) -> Option<String> {
        self.inner.write().remove(key)
    }

    /// Returns true if `key` is set.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.read().contains_key(key)
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Returns a point-in-time copy of the entries.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.inner.read().clone()
    }

    /// Returns the entries whose key starts with `prefix`, with the prefix removed.
    pub fn strip_prefix(&self, prefix: &str) -> BTreeMap<String, String> {
        self.inner
            .read()
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(prefix)
                    .filter(|rest| !rest.is_empty())
                    .map(|rest| (rest.to_string(), value.clone()))
            })
            .collect()
    }

    /// Returns a new, unaliased handle holding the same entries.
    pub fn deep_copy(&self) -> Self {
        Self::from_map(self.to_map())
    }

    /// True if both handles refer to the same underlying map.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Content equality. Use [`Options::ptr_eq`] for identity.
///
/// Only one map is locked at a time.
impl PartialEq for Options {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let left = self.to_map();
        left == *other.inner.read()
    }
}

impl Eq for Options {}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.inner.read().iter()).finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, String>> for Options {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self::from_map(map)
    }
}

impl Serialize for Options {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.inner.read().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Options {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        BTreeMap::deserialize(deserializer).map(Self::from_map)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Values that can be stored in [`Options`] as strings.
pub trait OptionValue: Sized {
    /// Parses a stored string, `None` if it is not a valid value.
    fn parse(raw: &str) -> Option<Self>;
    /// Renders the value for storage.
    fn render(&self) -> String;
}

impl OptionValue for bool {
    fn parse(raw: &str) -> Option<Self> {
        parse_bool(raw)
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl OptionValue for String {
    fn parse(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }

    fn render(&self) -> String {
        self.clone()
    }
}

/// A typed option key with a default.
#[derive(Debug)]
pub struct ConfigOption<T> {
    key: &'static str,
    default: fn() -> T,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ConfigOption<T> {
    /// Creates an option stored under `key`.
    pub const fn new(key: &'static str, default: fn() -> T) -> Self {
        Self {
            key,
            default,
            _marker: PhantomData,
        }
    }

    /// Returns the key the option is stored under.
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Returns the value used when the key is missing or unparsable.
    pub fn default_value(&self) -> T {
        (self.default)()
    }
}

/// Keys recognized by catalog contexts.
pub mod catalog {
    use super::ConfigOption;

    /// Root location of the catalog.
    pub const WAREHOUSE: ConfigOption<String> = ConfigOption::new("warehouse", String::new);

    /// Selects the Hadoop-aware context, which loads default Hadoop configuration
    /// from the environment at construction.
    pub const HADOOP_LOAD_DEFAULT_CONFIG: ConfigOption<bool> =
        ConfigOption::new("hadoop-load-default-config", disabled);

    /// Explicit directory holding `core-site.toml` / `hdfs-site.toml`.
    pub const HADOOP_CONF_DIR: ConfigOption<String> =
        ConfigOption::new("hadoop-conf-dir", String::new);

    /// Options carrying this prefix are copied into the Hadoop configuration.
    pub const HADOOP_PREFIX: &str = "hadoop.";

    fn disabled() -> bool {
        false
    }
}
