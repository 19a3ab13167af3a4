//! Credential type and codecs: the persisted-store encoding and the
//! redirect-response fragment parser.

use std::collections::HashMap;

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Token lifetime assumed when the server omits `expires_in`, in seconds.
pub const DEFAULT_EXPIRES_IN: i64 = 3600;

/// Token type assumed when the redirect fragment omits one.
pub const DEFAULT_TOKEN_TYPE: &str = "bearer";

/// An access token plus its metadata, authorizing subsequent API calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub token_type: String,
    pub scope: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Build a credential issued now, expiring `expires_in` seconds from now.
    pub fn issued(
        access_token: impl Into<String>,
        token_type: impl Into<String>,
        scope: impl Into<String>,
        expires_in: i64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: token_type.into(),
            scope: scope.into(),
            expires_at: Utc::now() + Duration::seconds(expires_in),
        }
    }

    /// Encode as the reversible persisted-store value:
    /// base64 of `access_token:token_type:scope`.
    pub fn store_value(&self) -> String {
        STANDARD.encode(format!(
            "{}:{}:{}",
            self.access_token, self.token_type, self.scope
        ))
    }
}

/// Decode a store value written by [`Credential::store_value`] back into its
/// `(access_token, token_type, scope)` fields.
pub fn parse_store_value(value: &str) -> Result<(String, String, String)> {
    let decoded = STANDARD
        .decode(value)
        .map_err(|e| Error::Storage(format!("store entry is not valid base64: {}", e)))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|e| Error::Storage(format!("store entry is not valid UTF-8: {}", e)))?;

    let mut parts = decoded.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(token), Some(token_type), Some(scope)) => {
            Ok((token.to_string(), token_type.to_string(), scope.to_string()))
        }
        _ => Err(Error::Storage(
            "store entry does not hold a token:type:scope triple".to_string(),
        )),
    }
}

/// Parse a redirect-response URL fragment into its `key=value` fields.
///
/// Strips one leading `/` if present (an artifact of router-based hash
/// normalization), splits on `&`, and splits each piece on the first `=`.
/// Values are returned raw, not URL-decoded. Empty input yields an empty map.
pub fn decode_hash(fragment: &str) -> HashMap<String, String> {
    let fragment = fragment.strip_prefix('/').unwrap_or(fragment);
    if fragment.is_empty() {
        return HashMap::new();
    }

    fragment
        .split('&')
        .filter(|piece| !piece.is_empty())
        .map(|piece| match piece.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (piece.to_string(), String::new()),
        })
        .collect()
}

/// Response body of the token endpoint.
///
/// Everything but `access_token` is optional in practice: a pure implicit
/// redirect supplies only the token, and some servers omit `scope`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

fn default_token_type() -> String {
    DEFAULT_TOKEN_TYPE.to_string()
}

fn default_expires_in() -> i64 {
    DEFAULT_EXPIRES_IN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_value_round_trip() {
        let credential = Credential::issued("tok1", "bearer", "read write", 3600);
        let (token, token_type, scope) = parse_store_value(&credential.store_value()).unwrap();
        assert_eq!(token, "tok1");
        assert_eq!(token_type, "bearer");
        assert_eq!(scope, "read write");
    }

    #[test]
    fn test_store_value_empty_scope_round_trip() {
        let credential = Credential::issued("tok", "bearer", "", 60);
        let (token, token_type, scope) = parse_store_value(&credential.store_value()).unwrap();
        assert_eq!(token, "tok");
        assert_eq!(token_type, "bearer");
        assert_eq!(scope, "");
    }

    #[test]
    fn test_parse_store_value_rejects_garbage() {
        assert!(parse_store_value("not base64!!!").is_err());

        let missing_fields = STANDARD.encode("only-a-token");
        assert!(parse_store_value(&missing_fields).is_err());
    }

    #[test]
    fn test_decode_hash_basic() {
        let fields = decode_hash("access_token=tok2&token_type=bearer");
        assert_eq!(fields.get("access_token").unwrap(), "tok2");
        assert_eq!(fields.get("token_type").unwrap(), "bearer");
    }

    #[test]
    fn test_decode_hash_strips_one_leading_slash() {
        let fields = decode_hash("/access_token=tok");
        assert_eq!(fields.get("access_token").unwrap(), "tok");

        // Only one slash is an artifact; a second one belongs to the value.
        let fields = decode_hash("//access_token=tok");
        assert!(fields.get("access_token").is_none());
    }

    #[test]
    fn test_decode_hash_splits_on_first_equals() {
        let fields = decode_hash("state=a=b=c");
        assert_eq!(fields.get("state").unwrap(), "a=b=c");
    }

    #[test]
    fn test_decode_hash_empty() {
        assert!(decode_hash("").is_empty());
        assert!(decode_hash("/").is_empty());
    }

    #[test]
    fn test_decode_hash_key_without_value() {
        let fields = decode_hash("flag&key=value");
        assert_eq!(fields.get("flag").unwrap(), "");
        assert_eq!(fields.get("key").unwrap(), "value");
    }

    #[test]
    fn test_token_response_defaults() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token": "tok"}"#).unwrap();
        assert_eq!(response.access_token, "tok");
        assert_eq!(response.token_type, DEFAULT_TOKEN_TYPE);
        assert_eq!(response.scope, "");
        assert_eq!(response.expires_in, DEFAULT_EXPIRES_IN);
    }

    #[test]
    fn test_token_response_full() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token": "tok", "token_type": "Bearer", "scope": "read", "expires_in": 60}"#,
        )
        .unwrap();
        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.scope, "read");
        assert_eq!(response.expires_in, 60);
    }
}
