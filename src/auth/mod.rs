//! Authentication and session lifecycle for the Saxo OpenAPI.
//!
//! Saxo sessions are established interactively: the user's browser visits
//! the authorization server, and the resulting single-use code is exchanged
//! for an access/refresh token pair. From then on the session sustains
//! itself by refreshing, with no further user interaction until the refresh
//! token itself expires.
//!
//! The moving parts:
//!
//! 1. [`CredentialGrant`] - runs the browser round-trip with CSRF
//!    protection and a one-shot localhost callback listener
//! 2. [`SessionTokens`] - an immutable token pair with derived expiry times
//! 3. [`TokenStore`] - JSON-on-disk persistence, keyed by application key,
//!    so restarts skip the browser while the refresh token lives
//! 4. [`SessionManager`] - ties the above together and runs the keep-alive
//!    loop
//!
//! # Establishing a session
//!
//! ```no_run
//! use saxo_rs::auth::{KeepAliveOptions, SessionConfig, SessionManager, TokenStore};
//! use saxo_rs::Environment;
//!
//! # async fn example() -> saxo_rs::Result<()> {
//! let config = SessionConfig::new("app-key", "app-secret", Environment::Sim);
//! let store = TokenStore::new("saxo-tokens.json");
//! let manager = SessionManager::new(config, store);
//!
//! // Restores from the store, or opens the browser when it has to.
//! manager.authenticate().await?;
//!
//! // Keep the session fresh in the background.
//! let handle = manager.keep_alive(KeepAliveOptions::default()).await?;
//!
//! let token = manager.access_token().await?;
//! # handle.stop();
//! # Ok(())
//! # }
//! ```

mod callback;
mod grant;
mod session;
mod store;
mod tokens;

pub use grant::{CredentialGrant, SystemBrowser, UrlOpener};
pub use session::{
    KeepAliveHandle, KeepAliveOptions, SessionConfig, SessionManager, DEFAULT_CALLBACK_PORT,
};
pub use store::TokenStore;
pub use tokens::{SessionTokens, TokenEndpointResponse};
