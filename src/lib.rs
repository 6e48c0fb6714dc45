//! # saxo-rs
//!
//! A Rust client for the Saxo Bank OpenAPI.
//!
//! This crate covers the two layers every integration needs: establishing
//! and sustaining an OAuth session, and fetching gateway resources with
//! pagination, sanitization and validation handled for you.
//!
//! ## Features
//!
//! - **Interactive authentication**: browser-based authorization-code flow
//!   with CSRF protection and a one-shot localhost callback listener
//! - **Self-sustaining sessions**: refresh-token rotation, disk persistence
//!   across restarts, and a keep-alive loop that rides out transient
//!   failures
//! - **Cursor pagination**: collection endpoints drained through `__next`
//!   continuation links with an explicit `$top` page size
//! - **Typed models**: responses sanitized and decoded into strongly typed
//!   structs, with `serde_json::Value` as the untyped escape hatch
//! - **Async-first**: built on Tokio
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use saxo_rs::auth::{KeepAliveOptions, SessionConfig, SessionManager, TokenStore};
//! use saxo_rs::{Environment, SaxoClient};
//!
//! #[tokio::main]
//! async fn main() -> saxo_rs::Result<()> {
//!     let config = SessionConfig::new("app-key", "app-secret", Environment::Sim);
//!     let manager = SessionManager::new(config, TokenStore::new("saxo-tokens.json"));
//!
//!     // Opens the browser only when no stored session can be restored.
//!     manager.authenticate().await?;
//!     let keep_alive = manager.keep_alive(KeepAliveOptions::default()).await?;
//!
//!     let client = SaxoClient::new(manager)?;
//!
//!     let accounts = client.portfolio().accounts().await?;
//!     println!("found {} accounts", accounts.len());
//!
//!     if let Some(account) = accounts.first() {
//!         let balance = client.portfolio().balance(&account.client_key, None).await?;
//!         println!(
//!             "total value: {} {}",
//!             balance.total_value,
//!             balance.currency.as_deref().unwrap_or("?")
//!         );
//!     }
//!
//!     keep_alive.stop();
//!     Ok(())
//! }
//! ```
//!
//! ## Instrument Lookup
//!
//! ```rust,no_run
//! use saxo_rs::api::InstrumentsQuery;
//! use saxo_rs::client::FetchOptions;
//!
//! # async fn example(client: saxo_rs::SaxoClient) -> saxo_rs::Result<()> {
//! let query = InstrumentsQuery::keywords("EURUSD").with_asset_types(["FxSpot"]);
//! let instruments = client
//!     .reference()
//!     .instruments(&query, FetchOptions::limited(10))
//!     .await?;
//!
//! for instrument in instruments {
//!     println!("{}: {:?}", instrument.identifier, instrument.symbol);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod models;

// Re-export primary types at crate root for convenience
pub use auth::{SessionConfig, SessionManager, TokenStore};
pub use client::{ClientConfig, FetchOptions, SaxoClient};
pub use error::{Error, Result};
pub use models::{AccountKey, ClientKey, Environment, Uic};

/// Prelude module for convenient imports.
///
/// ```rust
/// use saxo_rs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::api::{InstrumentsQuery, PortfolioService, ReferenceService};
    pub use crate::auth::{
        KeepAliveHandle, KeepAliveOptions, SessionConfig, SessionManager, TokenStore,
    };
    pub use crate::client::{ClientConfig, FetchOptions, SaxoClient};
    pub use crate::error::{Error, Result};
    pub use crate::models::{
        Account, AccountKey, AccountUpdate, Balance, ClientKey, Environment, InstrumentDetails,
        InstrumentSummary, Position, Uic,
    };
}
