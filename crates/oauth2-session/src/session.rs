//! The token-acquisition state machine.
//!
//! [`AuthSession::login`] walks a fixed priority list of credential sources:
//! in-memory cache, persisted store, redirect-response URL fragment, and
//! finally an interactive redirect (implicit grant) or a token-endpoint
//! exchange (client-credentials and password grants). The first source that
//! yields a token wins, and every success funnels through one commit step
//! that updates the cache, the store, and the outgoing-request defaults
//! together.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex as AsyncMutex;

use crate::config::AuthConfig;
use crate::error::{Error, Result};
use crate::http::RequestDefaults;
use crate::page::Page;
use crate::store::TokenStore;
use crate::token::{self, Credential, TokenResponse, DEFAULT_EXPIRES_IN, DEFAULT_TOKEN_TYPE};

/// OAuth2 mechanism by which a credential is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrantType {
    /// Machine-to-machine exchange using only the client secret.
    ClientCredentials,
    /// Resource-owner password exchange (username + password).
    UserCredentials,
    /// Browser redirect flow; the token comes back in the URL fragment.
    #[default]
    Implicit,
}

/// Parameters for a single [`AuthSession::login`] attempt.
#[derive(Debug, Clone, Default)]
pub struct LoginRequest {
    pub grant: GrantType,
    /// Probe for an existing session without forcing an interactive login.
    pub try_only: bool,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    /// Implicit grant (the default).
    pub fn implicit() -> Self {
        Self::default()
    }

    /// Client-credentials grant; requires a secret via
    /// [`AuthSession::set_secret`].
    pub fn client_credentials() -> Self {
        Self {
            grant: GrantType::ClientCredentials,
            ..Self::default()
        }
    }

    /// Resource-owner password grant; requires a secret via
    /// [`AuthSession::set_secret`].
    pub fn user_credentials(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            grant: GrantType::UserCredentials,
            username: Some(username.into()),
            password: Some(password.into()),
            ..Self::default()
        }
    }

    /// Fail with [`Error::NoCredential`] instead of going interactive when
    /// every passive source misses.
    pub fn try_only(mut self) -> Self {
        self.try_only = true;
        self
    }
}

/// How a successful login resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// A credential is committed and outgoing requests are armed.
    Authenticated,
    /// The page was sent to the authorization endpoint. The credential
    /// arrives in the URL fragment once the server redirects back, and the
    /// next `login` on the reloaded page picks it up.
    Redirected,
}

/// An authenticated HTTP session against a single authorization server.
pub struct AuthSession {
    config: AuthConfig,
    secret: RwLock<Option<String>>,
    credential: RwLock<Option<Credential>>,
    store: Arc<dyn TokenStore>,
    page: Arc<dyn Page>,
    defaults: RequestDefaults,
    http: reqwest::Client,
    /// Serializes overlapping logins so two cache misses cannot both reach
    /// the token endpoint; the loser re-runs the source list and hits the
    /// cache.
    login_gate: AsyncMutex<()>,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("config", &self.config)
            .field("authenticated", &self.credential.read().is_some())
            .finish_non_exhaustive()
    }
}

impl AuthSession {
    /// Create a session over the given store and page capabilities.
    pub fn new(config: AuthConfig, store: Arc<dyn TokenStore>, page: Arc<dyn Page>) -> Self {
        Self {
            config,
            secret: RwLock::new(None),
            credential: RwLock::new(None),
            store,
            page,
            defaults: RequestDefaults::new(),
            http: reqwest::Client::new(),
            login_gate: AsyncMutex::new(()),
        }
    }

    /// Session configuration.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Handle to the outgoing-request defaults this session arms. Hand a
    /// clone to whatever builds the application's API requests.
    pub fn request_defaults(&self) -> RequestDefaults {
        self.defaults.clone()
    }

    /// Currently committed credential, if any.
    pub fn credential(&self) -> Option<Credential> {
        self.credential.read().clone()
    }

    /// Store the client secret for the non-interactive grants.
    ///
    /// A secret shipped to a client is not a secret; this exists for tests
    /// and trusted-machine deployments, never for public browser builds.
    pub fn set_secret(&self, secret: impl Into<String>) {
        tracing::warn!(
            "client secret set on a client-side session; intended for testing only"
        );
        *self.secret.write() = Some(secret.into());
    }

    /// Acquire a credential, walking the source list in priority order.
    ///
    /// Resolves to [`LoginOutcome::Authenticated`] when a credential was
    /// committed, or [`LoginOutcome::Redirected`] when the page was sent to
    /// the authorization endpoint (implicit grant only).
    pub async fn login(&self, request: LoginRequest) -> Result<LoginOutcome> {
        let _gate = self.login_gate.lock().await;

        if request.grant == GrantType::UserCredentials
            && (request.username.is_none() || request.password.is_none())
        {
            return Err(Error::MissingCredentials(
                "username and password are required for the password grant".to_string(),
            ));
        }

        // Fast path: an already committed credential makes login idempotent.
        if self.credential.read().is_some() {
            return Ok(LoginOutcome::Authenticated);
        }

        if let Some(value) = self.store.get(self.config.storage_key()) {
            match token::parse_store_value(&value) {
                Ok((access_token, token_type, scope)) => {
                    tracing::debug!(key = self.config.storage_key(), "adopting persisted credential");
                    self.commit(Credential::issued(
                        access_token,
                        token_type,
                        scope,
                        DEFAULT_EXPIRES_IN,
                    ))?;
                    return Ok(LoginOutcome::Authenticated);
                }
                Err(err) => {
                    tracing::warn!(%err, "discarding malformed persisted credential");
                    self.store.remove(self.config.storage_key())?;
                }
            }
        }

        let fragment = self.page.fragment();
        if !fragment.is_empty() {
            let fields = token::decode_hash(&fragment);
            if let Some(access_token) = fields.get("access_token") {
                // Clear through the page capability, never a full navigation,
                // or the reload would re-enter this branch on the same
                // fragment forever.
                self.page.clear_fragment();

                let token_type = fields
                    .get("token_type")
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string());
                let scope = fields.get("scope").cloned().unwrap_or_default();
                let expires_in = fields
                    .get("expires_in")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_EXPIRES_IN);

                self.commit(Credential::issued(
                    access_token.clone(),
                    token_type,
                    scope,
                    expires_in,
                ))?;
                return Ok(LoginOutcome::Authenticated);
            }
        }

        if request.try_only {
            return Err(Error::NoCredential);
        }

        match request.grant {
            GrantType::Implicit => {
                let url = self.authorize_redirect_url();
                tracing::info!(%url, "redirecting to authorization endpoint");
                self.page.navigate(&url);
                Ok(LoginOutcome::Redirected)
            }
            grant => {
                let response = self
                    .exchange(grant, request.username.as_deref(), request.password.as_deref())
                    .await?;
                self.commit(Credential::issued(
                    response.access_token,
                    response.token_type,
                    response.scope,
                    response.expires_in,
                ))?;
                Ok(LoginOutcome::Authenticated)
            }
        }
    }

    /// Probe for an existing session: [`login`](Self::login) with
    /// `try_only` set.
    pub async fn try_login(&self, grant: GrantType) -> Result<LoginOutcome> {
        self.login(LoginRequest {
            grant,
            try_only: true,
            ..LoginRequest::default()
        })
        .await
    }

    /// Drop the credential everywhere and reload the page so application
    /// state re-initializes unauthenticated.
    pub fn logout(&self) -> Result<()> {
        *self.credential.write() = None;
        self.defaults.clear();
        self.store.remove(self.config.storage_key())?;
        tracing::info!("session logged out");
        self.page.reload();
        Ok(())
    }

    /// Authorization URL for the interactive implicit redirect.
    fn authorize_redirect_url(&self) -> String {
        format!(
            "{}?response_type=token&client_id={}&redirect_uri={}",
            self.config.authorize_url(),
            urlencoding::encode(self.config.client_id()),
            urlencoding::encode(&self.page.url()),
        )
    }

    /// Token-endpoint exchange for the client-credentials and password
    /// grants. Basic auth from `client_id:client_secret`, form body with the
    /// grant type and, for the password grant, the resource-owner
    /// credentials.
    async fn exchange(
        &self,
        grant: GrantType,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<TokenResponse> {
        let secret = self.secret.read().clone().ok_or_else(|| {
            Error::Config(
                "client secret is not set; call set_secret before using this grant".to_string(),
            )
        })?;

        let grant_param = match grant {
            GrantType::ClientCredentials => "client_credentials",
            GrantType::UserCredentials => "password",
            GrantType::Implicit => {
                return Err(Error::Config(
                    "implicit grant does not use the token endpoint".to_string(),
                ));
            }
        };

        let mut form: Vec<(&str, String)> = vec![("grant_type", grant_param.to_string())];
        if let (Some(username), Some(password)) = (username, password) {
            form.push(("username", username.to_string()));
            form.push(("password", password.to_string()));
        }

        let response = self
            .http
            .post(self.config.token_url())
            .basic_auth(self.config.client_id(), Some(&secret))
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::Exchange(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(%status, "token exchange rejected");
            return Err(Error::Exchange(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| Error::Exchange(format!("failed to parse token response: {}", e)))
    }

    /// Commit a credential: persist the encoded triple with its expiry, set
    /// the in-memory cache, and arm the request defaults, all in one step.
    fn commit(&self, credential: Credential) -> Result<()> {
        self.store.put(
            self.config.storage_key(),
            &credential.store_value(),
            credential.expires_at,
        )?;
        self.defaults.set_bearer(&credential.access_token);
        tracing::info!(expires_at = %credential.expires_at, "credential committed");
        *self.credential.write() = Some(credential);
        Ok(())
    }
}
