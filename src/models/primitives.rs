//! Primitive types and newtypes for type-safe API interactions.
//!
//! This module provides strongly-typed wrappers around the opaque Saxo
//! entity keys to prevent mixing up different kinds of identifiers at
//! compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A strongly-typed account key.
///
/// Saxo account keys are opaque, URL-safe strings issued by the API;
/// they are not account numbers.
///
/// # Example
///
/// ```
/// use saxo_rs::AccountKey;
///
/// let account = AccountKey::new("LZTc7DdejXODf-WSl2aCyQ==");
/// println!("Account: {}", account);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountKey(String);

impl AccountKey {
    /// Create a new account key from a string.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the account key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for AccountKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for AccountKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AccountKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A strongly-typed client key.
///
/// Identifies the client (customer) that owns one or more accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientKey(String);

impl ClientKey {
    /// Create a new client key.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the client key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ClientKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for ClientKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ClientKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A universal instrument code.
///
/// Every tradable instrument in the Saxo universe is identified by a
/// numeric UIC, qualified by an asset type.
///
/// # Example
///
/// ```
/// use saxo_rs::Uic;
///
/// let eurusd = Uic::new(21);
/// assert_eq!(eurusd.value(), 21);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uic(i64);

impl Uic {
    /// Create a new UIC.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the numeric UIC value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Uic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Uic {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Environment configuration for the Saxo OpenAPI.
///
/// Determines which authorization and gateway hosts to use - live or
/// simulation.
///
/// # Example
///
/// ```
/// use saxo_rs::Environment;
///
/// let env = Environment::Sim;
/// println!("API URL: {}", env.api_base_url());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Live environment - real trading with real money.
    Live,
    /// Simulation environment for development and testing.
    /// Market data is delayed and orders never reach an exchange.
    #[default]
    Sim,
}

impl Environment {
    /// Get the base URL of the OAuth authorization server.
    pub fn auth_base_url(&self) -> &'static str {
        match self {
            Environment::Live => "https://live.logonvalidation.net",
            Environment::Sim => "https://sim.logonvalidation.net",
        }
    }

    /// Get the base URL for REST API requests.
    pub fn api_base_url(&self) -> &'static str {
        match self {
            Environment::Live => "https://gateway.saxobank.com/openapi",
            Environment::Sim => "https://gateway.saxobank.com/sim/openapi",
        }
    }

    /// Returns `true` if this is the live environment.
    pub fn is_live(&self) -> bool {
        matches!(self, Environment::Live)
    }

    /// Returns `true` if this is the simulation environment.
    pub fn is_sim(&self) -> bool {
        matches!(self, Environment::Sim)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Live => write!(f, "live"),
            Environment::Sim => write!(f, "sim"),
        }
    }
}
