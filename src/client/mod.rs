//! HTTP client and resource-fetching layer for the Saxo OpenAPI.
//!
//! This module provides the main entry point [`SaxoClient`] plus the
//! machinery every request shares: cursor [pagination](fetch), response
//! [sanitization](sanitize) and the [`Transport`](transport::Transport)
//! seam that keeps the fetching code independent of HTTP.
//!
//! # Example
//!
//! ```no_run
//! use saxo_rs::auth::{SessionConfig, SessionManager, TokenStore};
//! use saxo_rs::{Environment, SaxoClient};
//!
//! # async fn example() -> saxo_rs::Result<()> {
//! let config = SessionConfig::new("app-key", "app-secret", Environment::Sim);
//! let manager = SessionManager::new(config, TokenStore::new("saxo-tokens.json"));
//! manager.authenticate().await?;
//!
//! let client = SaxoClient::new(manager)?;
//! let accounts = client.portfolio().accounts().await?;
//! # Ok(())
//! # }
//! ```

mod config;
pub mod fetch;
mod http;
pub mod sanitize;
pub mod transport;

pub use config::ClientConfig;
pub use fetch::{FetchOptions, MAX_PAGE_SIZE};
pub use http::SaxoClient;
pub use transport::Transport;
pub(crate) use http::ClientInner;
