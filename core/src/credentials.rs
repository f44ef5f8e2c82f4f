//! Bearer-token sources for `ApiClient`.
//!
//! # Design
//! The client never caches a token. It asks its `CredentialProvider` once per
//! outgoing request, so a login or logout elsewhere in the host takes effect
//! on the next call without rebuilding the client.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Key under which `CredentialStore` keeps the bearer token.
pub const AUTHORIZATION_KEY: &str = "Authorization";

/// Supplies the current bearer token, or `None` when nobody is signed in.
pub trait CredentialProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

impl<F> CredentialProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn token(&self) -> Option<String> {
        self()
    }
}

/// Shared string store holding the token under [`AUTHORIZATION_KEY`].
///
/// Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set_token(token);
        store
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key)
    }

    pub fn set_token(&self, token: impl Into<String>) {
        self.set(AUTHORIZATION_KEY, token);
    }

    pub fn clear_token(&self) {
        self.remove(AUTHORIZATION_KEY);
    }
}

impl CredentialProvider for CredentialStore {
    fn token(&self) -> Option<String> {
        self.get(AUTHORIZATION_KEY)
    }
}

/// Reads the token from an environment variable on every request.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialProvider for EnvCredentials {
    fn token(&self) -> Option<String> {
        std::env::var(&self.var).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_token_is_shared_between_clones() {
        let store = CredentialStore::new();
        let reader = store.clone();
        assert_eq!(reader.token(), None);

        store.set_token("abc");
        assert_eq!(reader.token().as_deref(), Some("abc"));

        store.clear_token();
        assert_eq!(reader.token(), None);
    }

    #[test]
    fn store_keeps_unrelated_keys() {
        let store = CredentialStore::with_token("abc");
        store.set("locale", "en");
        assert_eq!(store.get("locale").as_deref(), Some("en"));
        assert_eq!(store.get(AUTHORIZATION_KEY).as_deref(), Some("abc"));
    }

    #[test]
    fn closures_are_providers() {
        let provider = || Some("from-closure".to_string());
        assert_eq!(CredentialProvider::token(&provider).as_deref(), Some("from-closure"));
    }

    #[test]
    fn env_credentials_missing_variable_is_none() {
        let provider = EnvCredentials::new("ADMIN_CORE_TEST_TOKEN_THAT_IS_NEVER_SET");
        assert_eq!(provider.token(), None);
    }
}
