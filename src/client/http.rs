//! HTTP client implementation for the Saxo OpenAPI gateway.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use secrecy::ExposeSecret;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::api::{PortfolioService, ReferenceService};
use crate::auth::SessionManager;
use crate::{Environment, Error, Result};

use super::config::ClientConfig;
use super::fetch::{self, FetchOptions};
use super::sanitize::sanitize_body;
use super::transport::Transport;

/// The main client for the Saxo OpenAPI gateway.
///
/// Provides access to the API services through method calls that return
/// service structs. Bearer tokens come from the [`SessionManager`] on every
/// request, so a client built once keeps working across token refreshes.
///
/// # Example
///
/// ```no_run
/// use saxo_rs::auth::{SessionConfig, SessionManager, TokenStore};
/// use saxo_rs::{Environment, SaxoClient};
///
/// # async fn example() -> saxo_rs::Result<()> {
/// let config = SessionConfig::new("app-key", "app-secret", Environment::Sim);
/// let manager = SessionManager::new(config, TokenStore::new("saxo-tokens.json"));
/// manager.authenticate().await?;
///
/// let client = SaxoClient::new(manager)?;
/// let accounts = client.portfolio().accounts().await?;
/// # Ok(())
/// # }
/// ```
pub struct SaxoClient {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) http: reqwest::Client,
    pub(crate) session: SessionManager,
    pub(crate) api_base: String,
}

impl SaxoClient {
    /// Create a client over an established session.
    pub fn new(session: SessionManager) -> Result<Self> {
        Self::with_config(session, ClientConfig::default())
    }

    /// Create a client with custom configuration.
    pub fn with_config(session: SessionManager, config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let api_base = match &config.api_base {
            Some(url) => url.as_str().trim_end_matches('/').to_string(),
            None => session.environment().api_base_url().to_string(),
        };

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                session,
                api_base,
            }),
        })
    }

    /// Get the portfolio service.
    pub fn portfolio(&self) -> PortfolioService {
        PortfolioService::new(self.inner.clone())
    }

    /// Get the reference data service.
    pub fn reference(&self) -> ReferenceService {
        ReferenceService::new(self.inner.clone())
    }

    /// Drain any collection resource into typed records.
    ///
    /// The service methods cover the common endpoints; this is the escape
    /// hatch for the rest of the API surface. See
    /// [`fetch_all`](crate::client::fetch::fetch_all) for pagination and
    /// validation semantics.
    pub async fn fetch_all<T: DeserializeOwned>(
        &self,
        resource: &str,
        options: FetchOptions,
    ) -> Result<Vec<T>> {
        fetch::fetch_all(&*self.inner, resource, options).await
    }

    /// Get the current environment.
    pub fn environment(&self) -> Environment {
        self.inner.session.environment()
    }

    /// Get a reference to the session manager.
    pub fn session(&self) -> &SessionManager {
        &self.inner.session
    }
}

impl ClientInner {
    /// Resolve a location against the gateway base.
    ///
    /// Continuation links come back absolute; everything else is a path
    /// relative to the base.
    fn resolve(&self, location: &str) -> String {
        if location.starts_with("http://") || location.starts_with("https://") {
            location.to_string()
        } else {
            format!("{}{}", self.api_base, location)
        }
    }

    /// Build request headers with authentication.
    async fn build_headers(&self) -> Result<HeaderMap> {
        let token = self.session.access_token().await?;
        let bearer = format!("Bearer {}", token.expose_secret());

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer).map_err(|_| {
                Error::MalformedTokenResponse("access token is not a valid header value".into())
            })?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// GET a single resource, sanitize it and decode into `T`.
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self.request_json(path).await?;
        decode_sanitized(body)
    }

    /// PUT a typed JSON body; the provider answers these with 204 No Content.
    pub(crate) async fn put<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
        let body = serde_json::to_value(body)?;
        self.send_put(path, &body).await?;
        Ok(())
    }

    async fn send_put(&self, location: &str, body: &Value) -> Result<Value> {
        let url = self.resolve(location);
        let headers = self.build_headers().await?;
        tracing::debug!(url = %url, "PUT");

        let response = self.http.put(&url).headers(headers).json(body).send().await?;
        handle_response(response).await
    }

    async fn request_json(&self, location: &str) -> Result<Value> {
        let url = self.resolve(location);
        let headers = self.build_headers().await?;
        tracing::debug!(url = %url, "GET");

        let response = self.http.get(&url).headers(headers).send().await?;
        handle_response(response).await
    }
}

/// Map a gateway response to its JSON body.
///
/// Non-2xx statuses become [`Error`] variants via the body's error envelope;
/// an empty success body (204 writes) decodes as [`Value::Null`].
async fn handle_response(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let body: Value = serde_json::from_str(&text).unwrap_or_default();
        return Err(Error::from_api_response(status.as_u16(), body));
    }
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}

impl Transport for ClientInner {
    async fn get_json(&self, location: &str) -> Result<Value> {
        self.request_json(location).await
    }

    async fn put_json(&self, location: &str, body: &Value) -> Result<Value> {
        self.send_put(location, body).await
    }
}

impl Transport for SaxoClient {
    async fn get_json(&self, location: &str) -> Result<Value> {
        self.inner.request_json(location).await
    }

    async fn put_json(&self, location: &str, body: &Value) -> Result<Value> {
        self.inner.send_put(location, body).await
    }
}

/// Sanitize a response body, then decode it into `T`.
pub(crate) fn decode_sanitized<T: DeserializeOwned>(body: Value) -> Result<T> {
    let cleaned = sanitize_body(body);
    serde_json::from_value(cleaned.clone()).map_err(|err| Error::Validation {
        detail: err.to_string(),
        record: cleaned,
    })
}

impl Clone for SaxoClient {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl std::fmt::Debug for SaxoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaxoClient")
            .field("api_base", &self.inner.api_base)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{SessionConfig, TokenStore};
    use serde_json::json;

    fn test_inner(api_base: &str) -> (ClientInner, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig::new("app-key", "app-secret", Environment::Sim);
        let session = SessionManager::new(config, TokenStore::new(dir.path().join("tokens.json")));
        let inner = ClientInner {
            http: reqwest::Client::new(),
            session,
            api_base: api_base.to_string(),
        };
        (inner, dir)
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let (inner, _dir) = test_inner("https://gateway.saxobank.com/sim/openapi");
        assert_eq!(
            inner.resolve("/port/v1/accounts/me"),
            "https://gateway.saxobank.com/sim/openapi/port/v1/accounts/me"
        );
        assert_eq!(
            inner.resolve("https://gateway.saxobank.com/sim/openapi/port/v1/positions/?$skip=1000"),
            "https://gateway.saxobank.com/sim/openapi/port/v1/positions/?$skip=1000"
        );
    }

    #[test]
    fn test_decode_sanitized_drops_blanks() {
        #[derive(Debug, serde::Deserialize)]
        struct Probe {
            name: String,
            #[serde(default)]
            comment: Option<String>,
        }

        let probe: Probe = decode_sanitized(json!({
            "name": "  alpha  ",
            "comment": "   ",
        }))
        .unwrap();
        assert_eq!(probe.name, "alpha");
        assert_eq!(probe.comment, None);
    }

    #[test]
    fn test_decode_sanitized_reports_shape_mismatch() {
        #[derive(Debug, serde::Deserialize)]
        struct Probe {
            #[allow(dead_code)]
            name: String,
        }

        let err = decode_sanitized::<Probe>(json!({ "name": 42 })).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }
}
