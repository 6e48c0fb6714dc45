//! Transport seam between resource fetchers and the HTTP client.

use std::future::Future;

use serde_json::Value;

use crate::Result;

/// A source and sink of decoded JSON documents addressed by location.
///
/// This is the only interface the pagination and service code needs from
/// the HTTP layer, which keeps that code testable against scripted pages.
/// The crate's HTTP client implements it over authenticated gateway
/// requests.
///
/// A `location` is either a path relative to the API base, such as
/// `/port/v1/accounts/me`, or an absolute URL as handed back by the
/// provider in `__next` continuation links. Implementations must accept
/// both.
pub trait Transport {
    /// Fetch `location` and decode the response body as JSON.
    ///
    /// An empty 2xx body decodes as [`Value::Null`].
    fn get_json(&self, location: &str) -> impl Future<Output = Result<Value>> + Send;

    /// PUT `body` to `location` and decode the response body as JSON.
    ///
    /// The provider answers most writes with `204 No Content`, which
    /// decodes as [`Value::Null`].
    fn put_json(&self, location: &str, body: &Value)
        -> impl Future<Output = Result<Value>> + Send;
}
