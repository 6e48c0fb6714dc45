//! Cursor-driven pagination over collection endpoints.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::sanitize::sanitize;
use super::transport::Transport;
use crate::{Error, Result};

/// Largest page the provider serves in one response.
///
/// Every collection request asks for this page size explicitly via `$top`;
/// the provider's implicit default is much smaller and would multiply the
/// number of round-trips.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Options for [`fetch_all`].
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Stop after this many records; `None` drains the whole collection.
    pub limit: Option<usize>,
}

impl FetchOptions {
    /// Drain the whole collection.
    pub fn all() -> Self {
        Self::default()
    }

    /// Stop after `limit` records.
    pub fn limited(limit: usize) -> Self {
        Self { limit: Some(limit) }
    }
}

/// One page of a collection response, as the provider shapes it.
#[derive(Debug, Deserialize)]
struct RawPage {
    #[serde(rename = "Data")]
    data: Option<Vec<Value>>,
    #[serde(rename = "__next")]
    next: Option<String>,
    #[serde(rename = "__count")]
    #[allow(dead_code)]
    count: Option<i64>,
    #[serde(rename = "MaxRows")]
    #[allow(dead_code)]
    max_rows: Option<i64>,
}

/// Drain a paginated collection into a `Vec<T>`.
///
/// Follows `__next` continuation links verbatim until the provider stops
/// issuing them, a page comes back empty, or the `limit` in `options` is
/// reached (overshoot within the final page is truncated). A page without
/// a `Data` array terminates the walk like an empty one; some endpoints
/// answer an exhausted cursor that way. A `limit` of zero answers without
/// touching the network at all.
///
/// Each record is sanitized (see [`sanitize`](super::sanitize::sanitize))
/// before being decoded into `T`; records sanitized away entirely are
/// skipped. Decoding doubles as validation: a record that does not fit `T`
/// fails the whole call with [`Error::Validation`] carrying the offending
/// record. Fetching `T = serde_json::Value` opts out of validation.
pub async fn fetch_all<T, Tr>(
    transport: &Tr,
    resource: &str,
    options: FetchOptions,
) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    Tr: Transport,
{
    if options.limit == Some(0) {
        return Ok(Vec::new());
    }

    let mut records = Vec::new();
    let mut location = with_page_size(resource, MAX_PAGE_SIZE);

    loop {
        let body = transport.get_json(&location).await?;
        let page: RawPage = serde_json::from_value(body)?;

        let Some(data) = page.data else { break };
        if data.is_empty() {
            break;
        }

        for record in data {
            let Some(cleaned) = sanitize(record) else {
                continue;
            };
            records.push(decode_record(cleaned)?);
        }

        if let Some(limit) = options.limit {
            if records.len() >= limit {
                records.truncate(limit);
                break;
            }
        }

        match page.next {
            Some(next) => location = next,
            None => break,
        }
    }

    tracing::debug!(resource, records = records.len(), "collection drained");
    Ok(records)
}

fn decode_record<T: DeserializeOwned>(record: Value) -> Result<T> {
    serde_json::from_value(record.clone()).map_err(|err| Error::Validation {
        detail: err.to_string(),
        record,
    })
}

/// Append the explicit `$top` page size to a resource location.
fn with_page_size(resource: &str, top: usize) -> String {
    let separator = if resource.contains('?') { '&' } else { '?' };
    format!("{resource}{separator}$top={top}")
}
