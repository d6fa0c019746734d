//! Hooks the engine calls out to but does not implement.
//!
//! Credential storage lives outside the engine. A worker plugs a store in
//! through [`Dispatcher::with_auth_store`](crate::Dispatcher::with_auth_store);
//! without one, nothing is cached.

use std::collections::HashMap;

use courier_protocol::AuthInfo;

/// Credential cache consulted before prompting the user.
pub trait AuthStore: Send {
    /// Fills `info` from the cache. Returns `true` on a hit.
    fn check_cached(&mut self, info: &mut AuthInfo) -> bool;

    /// Stores `info`. Returns `true` when it was cached.
    fn cache(&mut self, info: &AuthInfo) -> bool;
}

/// Store that never caches anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAuthStore;

impl AuthStore for NullAuthStore {
    fn check_cached(&mut self, _info: &mut AuthInfo) -> bool {
        false
    }

    fn cache(&mut self, _info: &AuthInfo) -> bool {
        false
    }
}

/// Process-local store keyed by URL and realm.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuthStore {
    entries: HashMap<(String, Option<String>), AuthInfo>,
}

impl MemoryAuthStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of cached credentials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn key(info: &AuthInfo) -> Option<(String, Option<String>)> {
        info.url
            .as_ref()
            .map(|url| (url.to_string(), info.realm.clone()))
    }
}

impl AuthStore for MemoryAuthStore {
    fn check_cached(&mut self, info: &mut AuthInfo) -> bool {
        let Some(cached) = Self::key(info).and_then(|key| self.entries.get(&key)) else {
            return false;
        };
        info.username.clone_from(&cached.username);
        info.password.clone_from(&cached.password);
        true
    }

    fn cache(&mut self, info: &AuthInfo) -> bool {
        let Some(key) = Self::key(info) else {
            return false;
        };
        self.entries.insert(key, info.clone());
        true
    }
}

#[cfg(test)]
mod tests;
