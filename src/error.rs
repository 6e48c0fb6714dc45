//! Error types for the Saxo OpenAPI client.
//!
//! This module provides a single error type covering every failure mode of
//! the crate: session lifecycle, the interactive authorization flow, data
//! integrity and plain transport faults.

use serde_json::Value;
use thiserror::Error;

/// A specialized `Result` type for Saxo OpenAPI operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for all Saxo OpenAPI operations.
///
/// Session-lifecycle conditions are distinctly typed so callers can react
/// deliberately: an expired access token is recoverable via
/// [`SessionManager::refresh`](crate::auth::SessionManager::refresh), while
/// an expired refresh token always requires a new interactive grant.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O failed (token store, browser launch)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// API returned an error response
    #[error("API error: status={status}, code={code:?}, message={message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Optional error code from the API
        code: Option<String>,
        /// Human-readable error message
        message: String,
        /// Raw response body for debugging
        body: Value,
    },

    /// No session has been established yet
    #[error("Not authenticated; call authenticate() first")]
    NotAuthenticated,

    /// The access token has expired; recoverable via a refresh
    #[error("Access token expired; refresh required")]
    AccessTokenExpired,

    /// The refresh token has expired; only a new interactive grant can recover
    #[error("Refresh token expired; re-authentication required")]
    RefreshTokenExpired,

    /// The `state` echoed by the authorization callback does not match the
    /// token generated for this attempt
    #[error("CSRF state mismatch in authorization callback")]
    CsrfMismatch,

    /// The authorization callback request was missing required parameters
    #[error("Malformed authorization callback: {0}")]
    MalformedCallback(String),

    /// The token endpoint returned a body that is not a valid token response
    #[error("Malformed token response: {0}")]
    MalformedTokenResponse(String),

    /// A fetched record failed schema validation
    #[error("Validation failed: {detail}")]
    Validation {
        /// What was wrong with the record
        detail: String,
        /// The offending record, post-sanitization
        record: Value,
    },
}

impl Error {
    /// Returns `true` if this error relates to authentication or session
    /// state rather than data or transport.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Error::NotAuthenticated
                | Error::AccessTokenExpired
                | Error::RefreshTokenExpired
                | Error::CsrfMismatch
        )
    }

    /// Returns `true` if recovery requires a fresh interactive grant.
    ///
    /// # Example
    ///
    /// ```
    /// use saxo_rs::Error;
    ///
    /// fn handle_error(err: Error) {
    ///     if err.requires_reauthentication() {
    ///         println!("Session is beyond refresh; run authenticate again");
    ///     }
    /// }
    /// ```
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, Error::RefreshTokenExpired)
    }

    /// The HTTP status code, when this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Create an API error from a response body.
    ///
    /// Understands both the resource API's `{ErrorCode, Message}` shape and
    /// the OAuth endpoints' `{error, error_description}` shape.
    pub(crate) fn from_api_response(status: u16, body: Value) -> Self {
        let code = body
            .get("ErrorCode")
            .or_else(|| body.get("error"))
            .and_then(|c| c.as_str())
            .map(String::from);

        let message = body
            .get("Message")
            .or_else(|| body.get("error_description"))
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown API error")
            .to_string();

        Error::Api {
            status,
            code,
            message,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_auth() {
        assert!(Error::AccessTokenExpired.is_auth_error());
        assert!(Error::RefreshTokenExpired.is_auth_error());
        assert!(Error::CsrfMismatch.is_auth_error());
        assert!(!Error::MalformedTokenResponse("oops".into()).is_auth_error());
    }

    #[test]
    fn test_error_reauthentication() {
        assert!(Error::RefreshTokenExpired.requires_reauthentication());
        assert!(!Error::AccessTokenExpired.requires_reauthentication());
        assert!(!Error::NotAuthenticated.requires_reauthentication());
    }

    #[test]
    fn test_from_api_response_openapi_shape() {
        let body = serde_json::json!({
            "ErrorCode": "InvalidRequest",
            "Message": "AccountKey is malformed"
        });

        let err = Error::from_api_response(400, body);
        match err {
            Error::Api {
                status,
                code,
                message,
                ..
            } => {
                assert_eq!(status, 400);
                assert_eq!(code, Some("InvalidRequest".to_string()));
                assert_eq!(message, "AccountKey is malformed");
            }
            _ => panic!("Expected Api error"),
        }
    }

    #[test]
    fn test_from_api_response_oauth_shape() {
        let body = serde_json::json!({
            "error": "invalid_grant",
            "error_description": "refresh token is no longer valid"
        });

        let err = Error::from_api_response(401, body);
        match err {
            Error::Api { status, code, .. } => {
                assert_eq!(status, 401);
                assert_eq!(code, Some("invalid_grant".to_string()));
            }
            _ => panic!("Expected Api error"),
        }
    }

    #[test]
    fn test_status_accessor() {
        let err = Error::from_api_response(503, Value::Null);
        assert_eq!(err.status(), Some(503));
        assert_eq!(Error::CsrfMismatch.status(), None);
    }
}
