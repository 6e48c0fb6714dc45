//! Session lifecycle orchestration: authentication, refresh and keep-alive.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{Mutex, RwLock};
use tokio::task::{AbortHandle, JoinHandle};
use url::Url;

use super::grant::CredentialGrant;
use super::store::TokenStore;
use super::tokens::SessionTokens;
use crate::models::Environment;
use crate::{Error, Result};

/// Default port for the local authorization callback.
pub const DEFAULT_CALLBACK_PORT: u16 = 5321;

/// Resolved configuration of one OAuth application session.
///
/// One process can run several managers with different application keys;
/// the provider treats each application key as a separate OAuth client, so
/// each manager is fully independent, including its own entry in the token
/// store.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    app_key: String,
    app_secret: SecretString,
    environment: Environment,
    auth_base_override: Option<Url>,
    callback_port: u16,
}

impl SessionConfig {
    /// Configuration for an application key/secret pair in an environment.
    pub fn new(
        app_key: impl Into<String>,
        app_secret: impl Into<String>,
        environment: Environment,
    ) -> Self {
        Self {
            app_key: app_key.into(),
            app_secret: SecretString::from(app_secret.into()),
            environment,
            auth_base_override: None,
            callback_port: DEFAULT_CALLBACK_PORT,
        }
    }

    /// Override the authorization server base URL.
    ///
    /// Intended for tests and proxies; the environment default is used
    /// otherwise.
    pub fn with_auth_base(mut self, auth_base: Url) -> Self {
        self.auth_base_override = Some(auth_base);
        self
    }

    /// Use a specific local callback port; `0` picks a free port.
    pub fn with_callback_port(mut self, port: u16) -> Self {
        self.callback_port = port;
        self
    }

    /// The application key this session authenticates as.
    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    /// The environment this session runs against.
    pub fn environment(&self) -> Environment {
        self.environment
    }

    fn app_secret(&self) -> &SecretString {
        &self.app_secret
    }

    fn auth_base(&self) -> Result<Url> {
        match &self.auth_base_override {
            Some(url) => Ok(url.clone()),
            None => Ok(Url::parse(self.environment.auth_base_url())?),
        }
    }
}

/// Options for the keep-alive scheduler.
#[derive(Debug, Clone)]
pub struct KeepAliveOptions {
    /// Refresh on the first step even if the access token is still valid
    pub refresh_immediately: bool,
    /// Interval between successful steps
    pub refresh_delay: Duration,
    /// Interval before retrying after a transient refresh failure
    pub retry_delay: Duration,
}

impl Default for KeepAliveOptions {
    fn default() -> Self {
        Self {
            refresh_immediately: false,
            refresh_delay: Duration::from_secs(60),
            retry_delay: Duration::from_secs(10),
        }
    }
}

/// Cancellation handle for a running keep-alive loop.
///
/// Cloneable and cheap; `stop` is idempotent and safe to call after the
/// loop has already exited on its own.
#[derive(Debug, Clone)]
pub struct KeepAliveHandle {
    abort: AbortHandle,
}

impl KeepAliveHandle {
    /// Stop the keep-alive loop, clearing any pending timer.
    pub fn stop(&self) {
        self.abort.abort();
    }

    /// Whether the loop is still armed.
    pub fn is_scheduled(&self) -> bool {
        !self.abort.is_finished()
    }
}

/// Stateful session over one application key.
///
/// Orchestrates [`CredentialGrant`], [`TokenStore`] and [`SessionTokens`]
/// into the session lifecycle: interactive authentication, manual refresh,
/// and a self-rescheduling keep-alive loop that tolerates transient refresh
/// failures.
///
/// # Thread safety
///
/// `SessionManager` is `Clone` and designed to be shared across tasks; all
/// clones observe the same session. State is per-instance - nothing is
/// process-global, so independent managers can serve different application
/// keys concurrently.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    config: SessionConfig,
    http: reqwest::Client,
    store: TokenStore,
    grant: CredentialGrant,
    tokens: RwLock<Option<SessionTokens>>,
    keep_alive: Mutex<Option<JoinHandle<()>>>,
}

impl SessionManager {
    /// Manager using the system browser for interactive grants.
    pub fn new(config: SessionConfig, store: TokenStore) -> Self {
        Self::build(config, store, CredentialGrant::new(), reqwest::Client::new())
    }

    /// Manager with a custom grant flow (custom URL opener).
    pub fn with_grant(config: SessionConfig, store: TokenStore, grant: CredentialGrant) -> Self {
        Self::build(config, store, grant, reqwest::Client::new())
    }

    /// Manager talking to the authorization server through `http`.
    ///
    /// Token requests inherit whatever the client is configured with, such
    /// as proxies or custom root certificates.
    pub fn with_http_client(
        config: SessionConfig,
        store: TokenStore,
        http: reqwest::Client,
    ) -> Self {
        Self::build(config, store, CredentialGrant::new(), http)
    }

    fn build(
        config: SessionConfig,
        store: TokenStore,
        grant: CredentialGrant,
        http: reqwest::Client,
    ) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                config,
                http,
                store,
                grant,
                tokens: RwLock::new(None),
                keep_alive: Mutex::new(None),
            }),
        }
    }

    /// The environment this session runs against.
    pub fn environment(&self) -> Environment {
        self.inner.config.environment()
    }

    /// Establish a session, preferring stored tokens over user interaction.
    ///
    /// A stored session with an unexpired refresh token is restored; if its
    /// access token has expired, one refresh happens before this returns,
    /// so a caller never reads a dead access token right after
    /// authenticating. Without a usable stored session the interactive
    /// grant runs. Either way the resulting tokens are persisted.
    pub async fn authenticate(&self) -> Result<()> {
        match self.inner.store.load(self.inner.config.app_key())? {
            Some(tokens) if !tokens.is_refresh_expired() => {
                let needs_refresh = tokens.is_access_expired();
                *self.inner.tokens.write().await = Some(tokens);
                if needs_refresh {
                    tracing::debug!("stored access token expired; refreshing before use");
                    self.inner.refresh().await?;
                    self.inner.persist().await?;
                } else {
                    tracing::debug!("restored session from token store");
                }
                Ok(())
            }
            _ => {
                tracing::debug!("no usable stored session; starting interactive grant");
                self.inner.interactive_grant().await
            }
        }
    }

    /// Unconditionally re-run the interactive grant.
    ///
    /// Used when keep-alive has permanently failed with
    /// [`Error::RefreshTokenExpired`]; replaces the in-memory tokens and
    /// persists the result.
    pub async fn reauthenticate(&self) -> Result<()> {
        self.inner.interactive_grant().await
    }

    /// The current bearer token.
    ///
    /// A pure read of derived status - no I/O, no state change:
    /// [`Error::NotAuthenticated`] without a session,
    /// [`Error::RefreshTokenExpired`] when the session is beyond refreshing
    /// (terminal), [`Error::AccessTokenExpired`] when one [`refresh`] would
    /// recover it.
    ///
    /// [`refresh`]: SessionManager::refresh
    pub async fn access_token(&self) -> Result<SecretString> {
        let guard = self.inner.tokens.read().await;
        let tokens = guard.as_ref().ok_or(Error::NotAuthenticated)?;
        if tokens.is_refresh_expired() {
            return Err(Error::RefreshTokenExpired);
        }
        if tokens.is_access_expired() {
            return Err(Error::AccessTokenExpired);
        }
        Ok(tokens.access_token().clone())
    }

    /// A snapshot of the current token pair, if any.
    pub async fn session_tokens(&self) -> Option<SessionTokens> {
        self.inner.tokens.read().await.clone()
    }

    /// Exchange the refresh token for a fresh token pair.
    ///
    /// Fails fast with [`Error::RefreshTokenExpired`] when the refresh
    /// token has already expired. The exchange happens under the write
    /// lock, so concurrent refreshes serialize; refreshing is additive from
    /// the provider's point of view (the replaced tokens stay valid until
    /// their own natural expiry), so last-writer-wins is safe.
    pub async fn refresh(&self) -> Result<()> {
        self.inner.refresh().await
    }

    /// Arm the keep-alive loop.
    ///
    /// The contract: an access token is refreshed well before its natural
    /// expiry, transient refresh failures are retried after
    /// `options.retry_delay` without user interaction, and nothing ever
    /// retries past refresh-token expiry. Re-arming cancels any previously
    /// armed loop first, so at most one timer is ever pending per manager.
    ///
    /// The first step runs inline: with no session or an already expired
    /// refresh token this returns the corresponding error and schedules
    /// nothing. A transient first-step failure still returns a handle with
    /// the retry armed. Subsequent steps run in the background and refresh
    /// unconditionally - the point of the loop is refreshing far more often
    /// than the token lifetime requires, which converts any single missed
    /// refresh into a non-event.
    ///
    /// A caller can still observe an about-to-be-replaced access token
    /// microseconds before a scheduled refresh fires; that is inherent to
    /// periodic refresh and accepted.
    pub async fn keep_alive(&self, options: KeepAliveOptions) -> Result<KeepAliveHandle> {
        self.cancel_keep_alive().await;

        let first_delay = self
            .inner
            .keep_alive_step(options.refresh_immediately, &options)
            .await?;

        let weak = Arc::downgrade(&self.inner);
        let loop_options = options;
        let task = tokio::spawn(async move {
            let mut delay = first_delay;
            loop {
                tokio::time::sleep(delay).await;
                // Exit quietly when the manager is gone.
                let Some(inner) = weak.upgrade() else { break };
                match inner.keep_alive_step(true, &loop_options).await {
                    Ok(next_delay) => delay = next_delay,
                    Err(err) => {
                        tracing::error!(error = %err, "keep-alive stopped; re-authentication required");
                        break;
                    }
                }
            }
        });
        let abort = task.abort_handle();
        // A concurrent arm may have stored its own loop between the cancel
        // above and this store; the slot swap aborts whichever loop loses.
        if let Some(old) = self.inner.keep_alive.lock().await.replace(task) {
            old.abort();
        }

        Ok(KeepAliveHandle { abort })
    }

    async fn cancel_keep_alive(&self) {
        if let Some(task) = self.inner.keep_alive.lock().await.take() {
            task.abort();
        }
    }
}

impl ManagerInner {
    async fn interactive_grant(&self) -> Result<()> {
        let auth_base = self.config.auth_base()?;
        let code = self
            .grant
            .authorize(self.config.app_key(), &auth_base, self.config.callback_port)
            .await?;
        let tokens = SessionTokens::from_authorization_code(
            &self.http,
            &code,
            self.config.app_key(),
            self.config.app_secret(),
            &auth_base,
        )
        .await?;
        *self.tokens.write().await = Some(tokens);
        self.persist().await
    }

    async fn refresh(&self) -> Result<()> {
        let mut guard = self.tokens.write().await;
        let tokens = guard.as_ref().ok_or(Error::NotAuthenticated)?;
        if tokens.is_refresh_expired() {
            return Err(Error::RefreshTokenExpired);
        }

        let auth_base = self.config.auth_base()?;
        let refreshed = SessionTokens::from_refresh_token(
            &self.http,
            tokens.refresh_token().expose_secret(),
            self.config.app_key(),
            self.config.app_secret(),
            &auth_base,
        )
        .await?;
        *guard = Some(refreshed);
        Ok(())
    }

    async fn persist(&self) -> Result<()> {
        let guard = self.tokens.read().await;
        if let Some(tokens) = guard.as_ref() {
            self.store.save(self.config.app_key(), tokens)?;
        }
        Ok(())
    }

    /// One step of the keep-alive loop.
    ///
    /// Returns the delay until the next step; an error is terminal for the
    /// loop. Refreshes when the access token has expired or `refresh_now`
    /// is set. A transient refresh failure shortens the next delay to the
    /// retry interval; a persistence failure is logged and the loop
    /// continues, since the in-memory session remains valid.
    async fn keep_alive_step(
        &self,
        refresh_now: bool,
        options: &KeepAliveOptions,
    ) -> Result<Duration> {
        let (refresh_expired, access_expired) = {
            let guard = self.tokens.read().await;
            let tokens = guard.as_ref().ok_or(Error::NotAuthenticated)?;
            (tokens.is_refresh_expired(), tokens.is_access_expired())
        };
        if refresh_expired {
            return Err(Error::RefreshTokenExpired);
        }

        if refresh_now || access_expired {
            match self.refresh().await {
                Ok(()) => {}
                Err(Error::RefreshTokenExpired) => return Err(Error::RefreshTokenExpired),
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        retry_in_secs = options.retry_delay.as_secs(),
                        "token refresh failed; will retry"
                    );
                    return Ok(options.retry_delay);
                }
            }
        }

        if let Err(err) = self.persist().await {
            tracing::warn!(error = %err, "failed to persist session tokens");
        }
        Ok(options.refresh_delay)
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("app_key", &self.inner.config.app_key())
            .field("environment", &self.inner.config.environment())
            .finish_non_exhaustive()
    }
}
