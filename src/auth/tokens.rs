//! Session token values and the OAuth token-endpoint exchange.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::{Error, Result};

/// Deserialized body of a successful token-endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenEndpointResponse {
    /// The bearer token authorizing API calls
    pub access_token: String,
    /// Token type; the provider always issues `Bearer`
    pub token_type: String,
    /// Access-token lifetime in seconds
    pub expires_in: i64,
    /// Credential for obtaining the next token pair without user interaction
    pub refresh_token: String,
    /// Refresh-token lifetime in seconds
    pub refresh_token_expires_in: i64,
    /// Reserved by the provider; always null today
    #[serde(default)]
    pub base_uri: Option<String>,
}

/// An immutable access/refresh token pair with derived expiry times.
///
/// Values are created from a token-endpoint response (or rehydrated from the
/// [`TokenStore`](crate::auth::TokenStore)) and replaced wholesale on every
/// refresh; they are never mutated in place.
///
/// The pair maintains one invariant: the refresh token never expires before
/// the access token. An expired refresh token therefore always implies an
/// expired access token. Both predicates re-check the invariant and a
/// violation is treated as an internal fault, not a recoverable error.
#[derive(Clone)]
pub struct SessionTokens {
    access_token: SecretString,
    access_token_expires_at: DateTime<Utc>,
    refresh_token: SecretString,
    refresh_token_expires_at: DateTime<Utc>,
}

impl SessionTokens {
    /// Build a token pair from a token-endpoint response.
    ///
    /// The access-token expiry is read from the token's own embedded `exp`
    /// claim; the refresh-token expiry is derived from the difference of the
    /// two advertised lifetimes. The provider emits the `exp` claim either
    /// as a number or as a numeric string: both are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedTokenResponse`] when a required field is
    /// absent, empty or of the wrong shape, including a refresh lifetime
    /// shorter than the access lifetime.
    pub fn from_token_response(response: &TokenEndpointResponse) -> Result<Self> {
        let access_token = response.access_token.trim();
        if access_token.is_empty() {
            return Err(Error::MalformedTokenResponse(
                "access_token is missing or empty".into(),
            ));
        }

        let refresh_token = response.refresh_token.trim();
        if refresh_token.is_empty() {
            return Err(Error::MalformedTokenResponse(
                "refresh_token is missing or empty".into(),
            ));
        }

        if response.expires_in <= 0 {
            return Err(Error::MalformedTokenResponse(format!(
                "expires_in must be positive, got {}",
                response.expires_in
            )));
        }

        if response.refresh_token_expires_in < response.expires_in {
            return Err(Error::MalformedTokenResponse(format!(
                "refresh_token_expires_in ({}) is shorter than expires_in ({})",
                response.refresh_token_expires_in, response.expires_in
            )));
        }

        let access_token_expires_at = decode_access_expiry(access_token)?;
        // The subtraction cannot overflow: both lifetimes are validated
        // positive and ordered above. The margin itself still has to fit in
        // a chrono Duration and land on a representable instant.
        let margin = response.refresh_token_expires_in - response.expires_in;
        let refresh_token_expires_at = Duration::try_seconds(margin)
            .and_then(|margin| access_token_expires_at.checked_add_signed(margin))
            .ok_or_else(|| {
                Error::MalformedTokenResponse(format!(
                    "refresh_token_expires_in ({}) is out of range",
                    response.refresh_token_expires_in
                ))
            })?;

        Ok(Self::from_parts(
            SecretString::from(access_token.to_string()),
            access_token_expires_at,
            SecretString::from(refresh_token.to_string()),
            refresh_token_expires_at,
        ))
    }

    /// Exchange a fresh authorization code for a token pair.
    ///
    /// POSTs to `{auth_base}/token` with `grant_type=authorization_code` and
    /// HTTP Basic auth built from the application credentials. Network
    /// errors propagate unchanged; the caller decides how to classify them.
    pub async fn from_authorization_code(
        http: &reqwest::Client,
        code: &str,
        app_key: &str,
        app_secret: &SecretString,
        auth_base: &Url,
    ) -> Result<Self> {
        let response = request_token_endpoint(
            http,
            auth_base,
            app_key,
            app_secret,
            &[("grant_type", "authorization_code"), ("code", code)],
        )
        .await?;
        Self::from_token_response(&response)
    }

    /// Exchange a refresh token for a new token pair.
    ///
    /// POSTs to `{auth_base}/token` with `grant_type=refresh_token`. A
    /// provider-side `invalid_grant` rejection maps to
    /// [`Error::RefreshTokenExpired`]: a revoked or consumed refresh token
    /// is as terminal as a locally expired one.
    pub async fn from_refresh_token(
        http: &reqwest::Client,
        refresh_token: &str,
        app_key: &str,
        app_secret: &SecretString,
        auth_base: &Url,
    ) -> Result<Self> {
        let response = request_token_endpoint(
            http,
            auth_base,
            app_key,
            app_secret,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ],
        )
        .await
        .map_err(|err| match &err {
            Error::Api {
                code: Some(code), ..
            } if code == "invalid_grant" => Error::RefreshTokenExpired,
            _ => err,
        })?;
        Self::from_token_response(&response)
    }

    /// Rebuild a pair from its stored parts.
    pub(crate) fn from_parts(
        access_token: SecretString,
        access_token_expires_at: DateTime<Utc>,
        refresh_token: SecretString,
        refresh_token_expires_at: DateTime<Utc>,
    ) -> Self {
        let tokens = Self {
            access_token,
            access_token_expires_at,
            refresh_token,
            refresh_token_expires_at,
        };
        tokens.assert_invariant();
        tokens
    }

    /// Whether the access token has expired as of this instant.
    pub fn is_access_expired(&self) -> bool {
        self.assert_invariant();
        Utc::now() >= self.access_token_expires_at
    }

    /// Whether the refresh token has expired as of this instant.
    ///
    /// When this returns `true` the pair is beyond refreshing and only a new
    /// interactive grant can produce a working session.
    pub fn is_refresh_expired(&self) -> bool {
        self.assert_invariant();
        Utc::now() >= self.refresh_token_expires_at
    }

    /// The bearer token authorizing API calls.
    pub fn access_token(&self) -> &SecretString {
        &self.access_token
    }

    /// When the access token expires.
    pub fn access_token_expires_at(&self) -> DateTime<Utc> {
        self.access_token_expires_at
    }

    /// The refresh credential.
    pub(crate) fn refresh_token(&self) -> &SecretString {
        &self.refresh_token
    }

    /// When the refresh token expires.
    pub fn refresh_token_expires_at(&self) -> DateTime<Utc> {
        self.refresh_token_expires_at
    }

    fn assert_invariant(&self) {
        assert!(
            self.refresh_token_expires_at >= self.access_token_expires_at,
            "session token invariant violated: refresh expiry {} precedes access expiry {}",
            self.refresh_token_expires_at,
            self.access_token_expires_at
        );
    }
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens")
            .field("access_token", &"[REDACTED]")
            .field("access_token_expires_at", &self.access_token_expires_at)
            .field("refresh_token", &"[REDACTED]")
            .field("refresh_token_expires_at", &self.refresh_token_expires_at)
            .finish()
    }
}

/// POST to the provider's token endpoint and decode the response body.
async fn request_token_endpoint(
    http: &reqwest::Client,
    auth_base: &Url,
    app_key: &str,
    app_secret: &SecretString,
    params: &[(&str, &str)],
) -> Result<TokenEndpointResponse> {
    let url = format!("{}/token", auth_base.as_str().trim_end_matches('/'));
    tracing::debug!(url = %url, grant_type = params[0].1, "requesting tokens");

    let response = http
        .post(&url)
        .basic_auth(app_key, Some(app_secret.expose_secret()))
        .form(params)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let body: Value = serde_json::from_str(&text).unwrap_or_default();
        return Err(Error::from_api_response(status.as_u16(), body));
    }

    serde_json::from_str(&text)
        .map_err(|err| Error::MalformedTokenResponse(format!("token endpoint body: {err}")))
}

/// Extract the expiry instant from an access token's embedded claims.
fn decode_access_expiry(access_token: &str) -> Result<DateTime<Utc>> {
    let payload = access_token.split('.').nth(1).ok_or_else(|| {
        Error::MalformedTokenResponse("access_token is not a JWT".into())
    })?;

    let bytes = URL_SAFE_NO_PAD.decode(payload).map_err(|_| {
        Error::MalformedTokenResponse("access_token payload is not base64url".into())
    })?;

    let claims: Value = serde_json::from_slice(&bytes).map_err(|_| {
        Error::MalformedTokenResponse("access_token payload is not JSON".into())
    })?;

    let exp = claim_as_unix_seconds(&claims, "exp").ok_or_else(|| {
        Error::MalformedTokenResponse("access_token has no usable exp claim".into())
    })?;

    DateTime::from_timestamp(exp, 0).ok_or_else(|| {
        Error::MalformedTokenResponse(format!("access_token exp claim out of range: {exp}"))
    })
}

/// Read a numeric claim that the provider may emit as number or string.
fn claim_as_unix_seconds(claims: &Value, key: &str) -> Option<i64> {
    match claims.get(key)? {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
