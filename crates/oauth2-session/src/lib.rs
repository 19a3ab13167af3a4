//! Client-side OAuth2 session management.
//!
//! Establishes an authenticated HTTP session against a single authorization
//! server without a backend token broker. A session walks a fixed priority
//! list of credential sources (in-memory cache, persisted store, the
//! redirect-response URL fragment, then an interactive redirect or token
//! exchange) and arms every subsequent outgoing request with the resulting
//! bearer credential.
//!
//! # Components
//!
//! - [`session`] — the login state machine and its grant types
//! - [`config`] — validated, URL-normalized server/client configuration
//! - [`token`] — credential type, store codec, fragment parser
//! - [`store`] — persisted key-value store capability with expiration
//! - [`page`] — current-URL and navigation capability
//! - [`http`] — shared outgoing-request defaults armed on commit

pub mod config;
pub mod error;
pub mod http;
pub mod page;
pub mod session;
pub mod store;
pub mod token;

pub use config::{AuthConfig, DEFAULT_STORAGE_KEY};
pub use error::{Error, Result};
pub use http::RequestDefaults;
pub use page::{Page, StaticPage};
pub use session::{AuthSession, GrantType, LoginOutcome, LoginRequest};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use token::{decode_hash, Credential, TokenResponse};
