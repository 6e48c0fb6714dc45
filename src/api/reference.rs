//! Reference data service for instrument lookup.

use std::sync::Arc;

use url::form_urlencoded;

use crate::client::fetch::{fetch_all, FetchOptions};
use crate::client::ClientInner;
use crate::models::{InstrumentDetails, InstrumentSummary, Uic};
use crate::Result;

/// Query parameters for searching the instrument universe.
#[derive(Debug, Clone, Default)]
pub struct InstrumentsQuery {
    /// Free-text search over symbols and descriptions
    pub keywords: Option<String>,
    /// Restrict to these asset types, e.g. `FxSpot` or `Stock`
    pub asset_types: Vec<String>,
}

impl InstrumentsQuery {
    /// Search by free-text keywords.
    pub fn keywords(keywords: impl Into<String>) -> Self {
        Self {
            keywords: Some(keywords.into()),
            ..Default::default()
        }
    }

    /// Restrict results to the given asset types.
    pub fn with_asset_types<I, S>(mut self, asset_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.asset_types = asset_types.into_iter().map(Into::into).collect();
        self
    }

    fn to_resource(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(keywords) = &self.keywords {
            query.append_pair("Keywords", keywords);
        }
        if !self.asset_types.is_empty() {
            query.append_pair("AssetTypes", &self.asset_types.join(","));
        }
        let query = query.finish();
        if query.is_empty() {
            "/ref/v1/instruments".to_string()
        } else {
            format!("/ref/v1/instruments?{query}")
        }
    }
}

/// Service for instrument reference data.
///
/// # Example
///
/// ```no_run
/// use saxo_rs::api::InstrumentsQuery;
/// use saxo_rs::client::FetchOptions;
///
/// # async fn example(client: saxo_rs::SaxoClient) -> saxo_rs::Result<()> {
/// let query = InstrumentsQuery::keywords("EURUSD").with_asset_types(["FxSpot"]);
/// let matches = client
///     .reference()
///     .instruments(&query, FetchOptions::limited(25))
///     .await?;
///
/// if let Some(instrument) = matches.first() {
///     let details = client
///         .reference()
///         .instrument_details(instrument.identifier, &instrument.asset_type)
///         .await?;
///     println!("tradable: {}", details.is_tradable);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ReferenceService {
    inner: Arc<ClientInner>,
}

impl ReferenceService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Search the instrument universe.
    pub async fn instruments(
        &self,
        query: &InstrumentsQuery,
        options: FetchOptions,
    ) -> Result<Vec<InstrumentSummary>> {
        fetch_all(&*self.inner, &query.to_resource(), options).await
    }

    /// Get full details for one instrument.
    pub async fn instrument_details(
        &self,
        uic: Uic,
        asset_type: &str,
    ) -> Result<InstrumentDetails> {
        self.inner
            .get(&format!(
                "/ref/v1/instruments/details/{}/{}",
                uic.value(),
                asset_type
            ))
            .await
    }
}
