//! Property reference resolution for Hadoop configuration values.
//!
//! Supports `${property.name}` to reference another property and `${env.NAME}`
//! to reference an environment variable. Use `$${...}` to escape and produce a
//! literal `${...}`.

use std::collections::{BTreeMap, BTreeSet};

use super::DiscoveryError;

const ENV_PREFIX: &str = "env.";

/// Longest chain of nested property references that is followed.
const MAX_DEPTH: usize = 32;

/// Largest value, in bytes, that substitution may produce.
const MAX_VALUE_LEN: usize = 1 << 20;

/// Resolves all `${...}` references in `props`.
///
/// Each property is expanded once, depth first, and referenced properties are
/// expanded before the value that uses them. A property that is reached again
/// while it is still being expanded is a cycle. `props` is left untouched on
/// error.
pub(crate) fn resolve_references(
    props: &mut BTreeMap<String, String>,
    env: &BTreeMap<String, String>,
) -> Result<(), DiscoveryError> {
    let raw = props.clone();
    let mut resolver = Resolver {
        raw: &raw,
        env,
        resolved: BTreeMap::new(),
        in_progress: BTreeSet::new(),
    };
    for name in raw.keys() {
        resolver.resolve(name)?;
    }

    *props = resolver.resolved;
    Ok(())
}

struct Resolver<'a> {
    raw: &'a BTreeMap<String, String>,
    env: &'a BTreeMap<String, String>,
    resolved: BTreeMap<String, String>,
    in_progress: BTreeSet<String>,
}

impl<'a> Resolver<'a> {
    fn resolve(&mut self, name: &str) -> Result<String, DiscoveryError> {
        if let Some(value) = self.resolved.get(name) {
            return Ok(value.clone());
        }
        let raw: &'a BTreeMap<String, String> = self.raw;
        let template = raw
            .get(name)
            .ok_or_else(|| DiscoveryError::ReferenceNotFound(name.to_string()))?;

        if self.in_progress.contains(name) {
            tracing::debug!(property = name, "property references itself");
            return Err(DiscoveryError::CircularReference);
        }
        if self.in_progress.len() >= MAX_DEPTH {
            return Err(DiscoveryError::ReferenceTooDeep(name.to_string()));
        }

        self.in_progress.insert(name.to_string());
        let value = self.expand(name, template)?;
        self.in_progress.remove(name);

        self.resolved.insert(name.to_string(), value.clone());
        Ok(value)
    }

    fn expand(&mut self, name: &str, template: &str) -> Result<String, DiscoveryError> {
        let mut result = String::with_capacity(template.len());
        let mut chars = template.chars();

        while let Some(ch) = chars.next() {
            if ch != '$' {
                result.push(ch);
                continue;
            }
            let rest = chars.as_str();
            if let Some(after) = rest.strip_prefix('$') {
                result.push('$');
                chars = after.chars();
            } else if let Some(after) = rest.strip_prefix('{') {
                let (reference, after) = after
                    .split_once('}')
                    .ok_or(DiscoveryError::UnclosedReference)?;
                result.push_str(&self.lookup(reference)?);
                if result.len() > MAX_VALUE_LEN {
                    return Err(DiscoveryError::ValueTooLarge(name.to_string()));
                }
                chars = after.chars();
            } else {
                result.push('$');
            }
        }

        Ok(result)
    }

    fn lookup(&mut self, reference: &str) -> Result<String, DiscoveryError> {
        let reference = reference.trim();
        if reference.is_empty() || reference.split('.').any(str::is_empty) {
            return Err(DiscoveryError::InvalidReferencePath(reference.to_string()));
        }

        match reference.strip_prefix(ENV_PREFIX) {
            Some(var) => self
                .env
                .get(var)
                .cloned()
                .ok_or_else(|| DiscoveryError::ReferenceNotFound(reference.to_string())),
            None => self.resolve(reference),
        }
    }
}
