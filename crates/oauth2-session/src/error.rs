//! Error types for the authentication session.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while establishing or tearing down a session.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration error: empty server URL or client id, or a grant that
    /// needs a client secret before one was set.
    #[error("Config error: {0}")]
    Config(String),

    /// The password grant was invoked without a username or password.
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// Try-mode login exhausted every credential source. Expected and
    /// recoverable; callers use it to decide whether to go interactive.
    #[error("no credential available")]
    NoCredential,

    /// Token endpoint call failed or returned an error status.
    #[error("Token exchange failed: {0}")]
    Exchange(String),

    /// Persisted store I/O or decode failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Exchange(e.to_string())
    }
}
