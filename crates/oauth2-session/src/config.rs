//! Session configuration.

use crate::error::{Error, Result};

/// Default persisted-store key for the session credential.
pub const DEFAULT_STORAGE_KEY: &str = "qOAuth2";

/// Fixed path segment appended to the normalized server base URL. The
/// `authorize` and `token` endpoints are resolved relative to it.
const OAUTH_SEGMENT: &str = "oauth/";

/// Immutable configuration for an [`AuthSession`](crate::AuthSession).
///
/// The server base URL is normalized at construction so that it always ends
/// with exactly one `/` followed by `oauth/`, regardless of how many trailing
/// slashes the input carried.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    base_url: String,
    client_id: String,
    storage_key: String,
}

impl AuthConfig {
    /// Create a config for the given authorization server and client id.
    ///
    /// Fails with [`Error::Config`] if either is empty.
    pub fn new(server: impl Into<String>, client_id: impl Into<String>) -> Result<Self> {
        let server = server.into();
        let client_id = client_id.into();

        if server.is_empty() {
            return Err(Error::Config("server URL must not be empty".to_string()));
        }
        if client_id.is_empty() {
            return Err(Error::Config("client id must not be empty".to_string()));
        }

        let base_url = format!("{}/{}", server.trim_end_matches('/'), OAUTH_SEGMENT);

        Ok(Self {
            base_url,
            client_id,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        })
    }

    /// Use a custom persisted-store key instead of [`DEFAULT_STORAGE_KEY`].
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Normalized base URL, ending in `oauth/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// OAuth2 client identifier.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Key the committed credential is persisted under.
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Authorization endpoint URL (interactive implicit grant).
    pub fn authorize_url(&self) -> String {
        format!("{}authorize", self.base_url)
    }

    /// Token endpoint URL (client-credentials and password grants).
    pub fn token_url(&self) -> String {
        format!("{}token", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_missing_trailing_slash() {
        let config = AuthConfig::new("https://auth.example.com", "app").unwrap();
        assert_eq!(config.base_url(), "https://auth.example.com/oauth/");
    }

    #[test]
    fn test_normalizes_existing_trailing_slashes() {
        let one = AuthConfig::new("https://auth.example.com/", "app").unwrap();
        let many = AuthConfig::new("https://auth.example.com///", "app").unwrap();
        assert_eq!(one.base_url(), "https://auth.example.com/oauth/");
        assert_eq!(many.base_url(), "https://auth.example.com/oauth/");
    }

    #[test]
    fn test_endpoint_urls() {
        let config = AuthConfig::new("https://auth.example.com", "app").unwrap();
        assert_eq!(config.authorize_url(), "https://auth.example.com/oauth/authorize");
        assert_eq!(config.token_url(), "https://auth.example.com/oauth/token");
    }

    #[test]
    fn test_empty_server_rejected() {
        assert!(matches!(AuthConfig::new("", "app"), Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_client_id_rejected() {
        assert!(matches!(
            AuthConfig::new("https://auth.example.com", ""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_storage_key_default_and_override() {
        let config = AuthConfig::new("https://auth.example.com", "app").unwrap();
        assert_eq!(config.storage_key(), DEFAULT_STORAGE_KEY);

        let custom = config.with_storage_key("mySession");
        assert_eq!(custom.storage_key(), "mySession");
    }
}
