//! API service modules for Saxo OpenAPI endpoints.
//!
//! Each service provides methods for interacting with a specific
//! subset of the OpenAPI surface.

mod portfolio;
mod reference;

pub use portfolio::PortfolioService;
pub use reference::{InstrumentsQuery, ReferenceService};
