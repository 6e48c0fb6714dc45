//! Instrument reference-data models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::primitives::Uic;

/// A single hit from an instrument search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstrumentSummary {
    /// Asset type of the instrument (e.g. "Stock", "FxSpot")
    pub asset_type: String,
    /// Trading currency (ISO code)
    #[serde(default)]
    pub currency_code: Option<String>,
    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,
    /// Exchange the instrument is listed on
    #[serde(default)]
    pub exchange_id: Option<String>,
    /// Instrument UIC
    pub identifier: Uic,
    /// Country of the issuer (ISO code)
    #[serde(default)]
    pub issuer_country: Option<String>,
    /// Exchange-qualified symbol (e.g. "AAPL:xnas")
    #[serde(default)]
    pub symbol: Option<String>,
    /// Asset types this instrument can be traded as
    #[serde(default)]
    pub tradable_as: Vec<String>,
}

/// Full reference data for one instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstrumentDetails {
    /// Asset type of the instrument
    pub asset_type: String,
    /// Trading currency (ISO code)
    #[serde(default)]
    pub currency_code: Option<String>,
    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,
    /// Exchange details
    #[serde(default)]
    pub exchange: Option<InstrumentExchange>,
    /// Whether the instrument is currently tradable
    #[serde(default)]
    pub is_tradable: bool,
    /// Order types the instrument supports
    #[serde(default)]
    pub supported_order_types: Vec<String>,
    /// Exchange-qualified symbol
    #[serde(default)]
    pub symbol: Option<String>,
    /// Minimum price increment
    #[serde(default)]
    pub tick_size: Option<Decimal>,
    /// Instrument UIC
    pub uic: Uic,
}

/// Exchange details nested in instrument reference data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstrumentExchange {
    /// Country the exchange operates in (ISO code)
    #[serde(default)]
    pub country_code: Option<String>,
    /// Exchange identifier (e.g. "NASDAQ")
    #[serde(default)]
    pub exchange_id: Option<String>,
    /// Exchange display name
    #[serde(default)]
    pub name: Option<String>,
}
