//! String-keyed property bags exchanged beside operations.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::time::Duration;

/// Metadata key carrying the connect timeout in seconds.
pub const CONNECT_TIMEOUT_KEY: &str = "ConnectTimeout";
/// Metadata key carrying the proxy connect timeout in seconds.
pub const PROXY_CONNECT_TIMEOUT_KEY: &str = "ProxyConnectTimeout";
/// Metadata key carrying the response timeout in seconds.
pub const RESPONSE_TIMEOUT_KEY: &str = "ResponseTimeout";
/// Metadata key carrying the read timeout in seconds.
pub const READ_TIMEOUT_KEY: &str = "ReadTimeout";

/// Connect timeout used when the controller supplies none.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);
/// Proxy connect timeout used when the controller supplies none.
pub const DEFAULT_PROXY_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Response timeout used when the controller supplies none.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(600);
/// Read timeout used when the controller supplies none.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(15);

/// A key/value set with last-write-wins semantics per key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataStore {
    entries: BTreeMap<String, String>,
}

impl MetadataStore {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Sets `key`, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Merges `entries` into the store; incoming values win.
    pub fn merge(&mut self, entries: BTreeMap<String, String>) {
        self.entries.extend(entries);
    }

    /// Returns `true` when `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns the value for `key`, or `default` when absent.
    #[must_use]
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over keys and values in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Copies the current contents.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.clone()
    }

    /// Moves the current contents out, leaving the store empty.
    pub fn take(&mut self) -> BTreeMap<String, String> {
        std::mem::take(&mut self.entries)
    }

    /// Removes every key.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Reads `key` as a boolean; only `true` (any case) is true.
    #[must_use]
    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.get(key)
            .map_or(default, |value| value.eq_ignore_ascii_case("true"))
    }

    /// Reads `key` as an integer, falling back to `default` when absent or
    /// unparsable.
    #[must_use]
    pub fn int_or(&self, key: &str, default: i64) -> i64 {
        self.get(key)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Reads `key` as a timeout in whole seconds. Zero, negative and
    /// unparsable values fall back to `default`.
    #[must_use]
    pub fn timeout_or(&self, key: &str, default: Duration) -> Duration {
        match self.int_or(key, 0) {
            seconds if seconds > 0 => Duration::from_secs(seconds.unsigned_abs()),
            _ => default,
        }
    }
}

impl<'a> IntoIterator for &'a MetadataStore {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
