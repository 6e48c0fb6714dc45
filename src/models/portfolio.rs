//! Account, balance and position models.
//!
//! These are deliberately small subsets of the OpenAPI portfolio schemas:
//! only the fields the bundled services surface. The full schema set is
//! hundreds of generated-style records and is out of scope.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::primitives::{AccountKey, ClientKey, Uic};

/// A trading account belonging to the authenticated client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Account {
    /// Account identifier as displayed to the user
    pub account_id: String,
    /// Opaque key identifying the account in API calls
    pub account_key: AccountKey,
    /// Opaque key of the owning client
    pub client_key: ClientKey,
    /// Account type (e.g. "Normal")
    #[serde(default)]
    pub account_type: Option<String>,
    /// Whether the account is active
    #[serde(default)]
    pub active: bool,
    /// Account currency (ISO code)
    #[serde(default)]
    pub currency: Option<String>,
    /// When the account was created
    #[serde(default)]
    pub creation_date: Option<DateTime<Utc>>,
    /// User-assigned display name
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Balance figures for a client or a single account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Balance {
    /// Cash balance in the account currency
    pub cash_balance: Decimal,
    /// Account currency (ISO code)
    #[serde(default)]
    pub currency: Option<String>,
    /// Decimals used when displaying currency amounts
    #[serde(default)]
    pub currency_decimals: Option<u32>,
    /// Margin currently available for trading
    #[serde(default)]
    pub margin_available_for_trading: Option<Decimal>,
    /// Margin tied up by current positions
    #[serde(default)]
    pub margin_used_by_current_positions: Option<Decimal>,
    /// Margin utilization as a percentage
    #[serde(default)]
    pub margin_utilization_pct: Option<Decimal>,
    /// Number of open net positions
    #[serde(default)]
    pub net_positions_count: u32,
    /// Number of open orders
    #[serde(default)]
    pub orders_count: u32,
    /// Total value of the account
    pub total_value: Decimal,
    /// Unrealized profit/loss across margin positions
    #[serde(default)]
    pub unrealized_margin_profit_loss: Option<Decimal>,
}

impl Balance {
    /// Returns `true` if the account has no open positions or orders.
    pub fn is_flat(&self) -> bool {
        self.net_positions_count == 0 && self.orders_count == 0
    }
}

/// A single open position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Position {
    /// Unique position identifier
    pub position_id: String,
    /// Identifier of the net position this position aggregates into
    #[serde(default)]
    pub net_position_id: Option<String>,
    /// Static properties of the position
    pub position_base: PositionBase,
    /// Market-dependent view of the position, when requested
    #[serde(default)]
    pub position_view: Option<PositionView>,
}

/// Static properties of a position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PositionBase {
    /// Account the position belongs to
    #[serde(default)]
    pub account_id: Option<String>,
    /// Opaque key of the owning account
    #[serde(default)]
    pub account_key: Option<AccountKey>,
    /// Signed position size (negative for short)
    pub amount: Decimal,
    /// Asset type of the instrument (e.g. "FxSpot", "Stock")
    pub asset_type: String,
    /// Whether the position can be closed
    #[serde(default)]
    pub can_be_closed: Option<bool>,
    /// When the opening trade executed
    #[serde(default)]
    pub execution_time_open: Option<DateTime<Utc>>,
    /// Price the position was opened at
    pub open_price: Decimal,
    /// Position status (e.g. "Open", "Closing")
    #[serde(default)]
    pub status: Option<String>,
    /// Instrument UIC
    pub uic: Uic,
}

/// Market-dependent values of a position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PositionView {
    /// Reliability of the calculation (e.g. "Ok", "NoMarketAccess")
    #[serde(default)]
    pub calculation_reliability: Option<String>,
    /// Most recent price of the instrument
    #[serde(default)]
    pub current_price: Option<Decimal>,
    /// Exposure of the position in the instrument currency
    #[serde(default)]
    pub exposure: Option<Decimal>,
    /// Currency of the exposure figure
    #[serde(default)]
    pub exposure_currency: Option<String>,
    /// Profit/loss on the trade in the instrument currency
    #[serde(default)]
    pub profit_loss_on_trade: Option<Decimal>,
    /// Total trading costs incurred
    #[serde(default)]
    pub trade_costs_total: Option<Decimal>,
}

impl Position {
    /// Returns `true` if the position status is `Open`.
    pub fn is_open(&self) -> bool {
        self.position_base.status.as_deref() == Some("Open")
    }

    /// Unrealized P&L on the trade, when the market view is available.
    pub fn unrealized_pnl(&self) -> Option<Decimal> {
        self.position_view
            .as_ref()
            .and_then(|view| view.profit_loss_on_trade)
    }
}

/// Mutable account settings for account update calls.
///
/// Only set fields are serialized, so an update touches nothing else.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountUpdate {
    /// Protection limit above which the account is closed out
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_value_protection_limit: Option<Decimal>,
}
