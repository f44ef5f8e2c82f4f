//! Where the backend lives.

use serde::Deserialize;

pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_BASE_PATH: &str = "/api";

/// Origin and base path every request url starts with.
///
/// An empty `origin` produces relative urls such as `/api/customers/42`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub origin: String,
    pub base_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            base_path: DEFAULT_BASE_PATH.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    /// Reads `ADMIN_API_ORIGIN` and `ADMIN_API_BASE_PATH`, falling back to
    /// the defaults for unset variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            origin: std::env::var("ADMIN_API_ORIGIN").unwrap_or(defaults.origin),
            base_path: std::env::var("ADMIN_API_BASE_PATH").unwrap_or(defaults.base_path),
        }
    }

    /// `origin + base_path` without a trailing slash; `base_path` always
    /// gets a leading one.
    pub fn base_url(&self) -> String {
        let origin = self.origin.trim_end_matches('/');
        let base_path = self.base_path.trim_matches('/');
        if base_path.is_empty() {
            origin.to_string()
        } else {
            format!("{origin}/{base_path}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_url() {
        assert_eq!(ClientConfig::default().base_url(), "http://localhost:3000/api");
    }

    #[test]
    fn slashes_are_normalized() {
        let config = ClientConfig {
            origin: "http://example.test/".to_string(),
            base_path: "api/v2/".to_string(),
        };
        assert_eq!(config.base_url(), "http://example.test/api/v2");
    }

    #[test]
    fn empty_origin_gives_relative_base() {
        assert_eq!(ClientConfig::new("").base_url(), "/api");
    }

    #[test]
    fn from_env_overrides_defaults() {
        std::env::set_var("ADMIN_API_ORIGIN", "http://admin.test");
        std::env::set_var("ADMIN_API_BASE_PATH", "/backend");
        let config = ClientConfig::from_env();
        std::env::remove_var("ADMIN_API_ORIGIN");
        std::env::remove_var("ADMIN_API_BASE_PATH");
        assert_eq!(config.base_url(), "http://admin.test/backend");
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ClientConfig = serde_json::from_str(r#"{"origin":"http://a.test"}"#).unwrap();
        assert_eq!(config.base_path, DEFAULT_BASE_PATH);
        assert_eq!(config.base_url(), "http://a.test/api");
    }
}
