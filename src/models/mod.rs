//! Data models for the Saxo OpenAPI.
//!
//! This module contains the strongly-typed data structures the bundled
//! services exchange with the API. Models are organized by domain:
//!
//! - [`primitives`] - Core types like `AccountKey`, `Uic`, `Environment`
//! - [`portfolio`] - Account, balance and position models
//! - [`instrument`] - Instrument reference-data models
//!
//! Only the fields the bundled services surface are modelled; the remote
//! schema set is far larger and is intentionally not mirrored here.

pub mod primitives;
pub mod portfolio;
pub mod instrument;

// Re-export commonly used types
pub use primitives::*;
pub use portfolio::*;
pub use instrument::*;
