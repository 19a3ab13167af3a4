//! Shared outgoing-request defaults armed by the session.

use std::sync::Arc;

use parking_lot::RwLock;

/// Cloneable handle over the default authentication state for outgoing
/// requests.
///
/// The session's commit step is the only writer; every collaborator that
/// sends requests through the application's HTTP client reads it. Handing a
/// clone to collaborators replaces the usual mutate-a-global-client pattern
/// with state the session explicitly owns.
#[derive(Debug, Clone, Default)]
pub struct RequestDefaults {
    inner: Arc<RwLock<DefaultsState>>,
}

#[derive(Debug, Default)]
struct DefaultsState {
    bearer: Option<String>,
    credentialed: bool,
}

impl RequestDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm with a bearer token and enable credentialed requests.
    pub(crate) fn set_bearer(&self, access_token: &str) {
        let mut state = self.inner.write();
        state.bearer = Some(format!("Bearer {}", access_token));
        state.credentialed = true;
    }

    /// Disarm; subsequent requests go out unauthenticated.
    pub(crate) fn clear(&self) {
        let mut state = self.inner.write();
        state.bearer = None;
        state.credentialed = false;
    }

    /// Current `Authorization` header value, if armed.
    pub fn bearer(&self) -> Option<String> {
        self.inner.read().bearer.clone()
    }

    /// Whether requests should carry ambient credentials (cookies).
    pub fn credentialed(&self) -> bool {
        self.inner.read().credentialed
    }

    /// Attach the armed `Authorization` header to a request, if any.
    pub fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.bearer() {
            Some(value) => request.header(reqwest::header::AUTHORIZATION, value),
            None => request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_start_disarmed() {
        let defaults = RequestDefaults::new();
        assert!(defaults.bearer().is_none());
        assert!(!defaults.credentialed());
    }

    #[test]
    fn test_set_and_clear() {
        let defaults = RequestDefaults::new();
        defaults.set_bearer("tok1");
        assert_eq!(defaults.bearer().unwrap(), "Bearer tok1");
        assert!(defaults.credentialed());

        defaults.clear();
        assert!(defaults.bearer().is_none());
        assert!(!defaults.credentialed());
    }

    #[test]
    fn test_clones_share_state() {
        let defaults = RequestDefaults::new();
        let handle = defaults.clone();
        defaults.set_bearer("tok1");
        assert_eq!(handle.bearer().unwrap(), "Bearer tok1");
    }
}
