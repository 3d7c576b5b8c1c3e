//! Raw configuration document with environment placeholder expansion.

use figment::{
    providers::{Env, Serialized},
    Figment,
};
use serde_json::Value;

use super::{types::Config, ConfigError};

/// Prefix marking a string value as an environment variable reference.
pub const ENV_SIGIL: char = '$';

/// A parsed JSON configuration tree, after placeholder expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    root: Value,
}

impl ConfigDocument {
    /// Wrap a value tree, expanding placeholders from the process environment.
    pub fn new(root: Value) -> Self {
        Self {
            root: expand_env_vars(root),
        }
    }

    /// Wrap a value tree that has already been expanded.
    pub fn from_expanded(root: Value) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Look up a value by dotted key path, e.g. `qbittorrent.host`.
    ///
    /// Returns `None` when any segment is missing or an intermediate value
    /// is not an object.
    pub fn get(&self, key_path: &str) -> Option<&Value> {
        key_path
            .split('.')
            .try_fold(&self.root, |value, key| value.as_object()?.get(key))
    }

    /// Like [`get`](Self::get), falling back to `default`.
    pub fn get_or<'a>(&'a self, key_path: &str, default: &'a Value) -> &'a Value {
        self.get(key_path).unwrap_or(default)
    }

    /// Extract the typed configuration.
    ///
    /// `SPACEWARDEN_`-prefixed environment variables override document
    /// values, with `__` separating nested keys
    /// (`SPACEWARDEN_QBITTORRENT__PORT=9090`).
    pub fn extract(&self) -> Result<Config, ConfigError> {
        Figment::new()
            .merge(Serialized::defaults(&self.root))
            .merge(Env::prefixed("SPACEWARDEN_").split("__"))
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

/// Replace every `$NAME` string in the tree with the value of the
/// environment variable `NAME`. Unset variables become `null`.
pub fn expand_env_vars(value: Value) -> Value {
    expand_vars_with(value, &|name| std::env::var(name).ok())
}

/// Placeholder expansion with an explicit variable lookup.
pub fn expand_vars_with<F>(value: Value, lookup: &F) -> Value
where
    F: Fn(&str) -> Option<String>,
{
    match value {
        Value::String(s) => match s.strip_prefix(ENV_SIGIL) {
            Some(name) => lookup(name).map(Value::String).unwrap_or(Value::Null),
            None => Value::String(s),
        },
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| expand_vars_with(item, lookup))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, item)| (key, expand_vars_with(item, lookup)))
                .collect(),
        ),
        other => other,
    }
}
