//! Integration tests for the session lifecycle.
//!
//! The whole lifecycle runs hermetically: the token endpoint is served by
//! httpmock and the browser is replaced by an opener that drives the
//! localhost callback itself, so the interactive grant, refresh rotation
//! and keep-alive recovery are all exercised without credentials.
//!
//! Run with: cargo test --test session_tests

use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{Duration as ChronoDuration, Utc};
use httpmock::prelude::*;
use secrecy::ExposeSecret;
use serde_json::json;
use tokio::time::timeout;
use tracing_subscriber::EnvFilter;
use url::{form_urlencoded, Url};

use saxo_rs::auth::{
    CredentialGrant, KeepAliveOptions, SessionConfig, SessionManager, TokenStore, UrlOpener,
};
use saxo_rs::{Environment, Error};

const APP_KEY: &str = "app-key";
const APP_SECRET: &str = "app-secret";

static INIT: Once = Once::new();

/// Initialize logging for tests
fn init_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// An unsigned JWT whose `exp` claim lies `seconds` from now.
///
/// The provider emits the claim as a numeric string, so these do too.
fn jwt_expiring_in(seconds: i64) -> String {
    let exp = (Utc::now() + ChronoDuration::seconds(seconds)).timestamp();
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
    let payload = URL_SAFE_NO_PAD.encode(json!({ "exp": exp.to_string() }).to_string());
    format!("{header}.{payload}.sig")
}

/// A token-endpoint success body.
fn token_body(
    access_token: &str,
    expires_in: i64,
    refresh_token: &str,
    refresh_expires_in: i64,
) -> serde_json::Value {
    json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": expires_in,
        "refresh_token": refresh_token,
        "refresh_token_expires_in": refresh_expires_in,
        "base_uri": null,
    })
}

/// Write a store file holding one session for [`APP_KEY`].
fn seed_store(path: &Path, access_token: &str, access_expires_in: i64, refresh_expires_in: i64) {
    let now = Utc::now();
    let records = json!({
        "app-key": {
            "accessToken": access_token,
            "accessTokenExpiresAt": now + ChronoDuration::seconds(access_expires_in),
            "refreshToken": "seed-refresh-token",
            "refreshTokenExpiresAt": now + ChronoDuration::seconds(refresh_expires_in),
        }
    });
    std::fs::write(path, serde_json::to_string_pretty(&records).unwrap()).unwrap();
}

/// The HTTP Basic credential the token endpoint must see.
fn expected_basic_auth() -> String {
    format!("Basic {}", STANDARD.encode(format!("{APP_KEY}:{APP_SECRET}")))
}

/// An opener that never opens anything; guards non-interactive tests.
struct NoBrowser;

impl UrlOpener for NoBrowser {
    fn open_url(&self, _url: &Url) -> saxo_rs::Result<()> {
        panic!("interactive grant must not run in this test");
    }
}

/// An opener that plays the provider's redirect role itself.
///
/// Reads `state` and `redirect_uri` from the authorization URL, runs the
/// state through `transform`, and calls the local callback with a fixed
/// authorization code.
struct RedirectOpener {
    transform: fn(String) -> String,
}

impl UrlOpener for RedirectOpener {
    fn open_url(&self, url: &Url) -> saxo_rs::Result<()> {
        let mut state = None;
        let mut redirect_uri = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "state" => state = Some(value.into_owned()),
                "redirect_uri" => redirect_uri = Some(value.into_owned()),
                _ => {}
            }
        }
        let state = (self.transform)(state.expect("authorize URL has no state"));
        let encoded_state: String = form_urlencoded::byte_serialize(state.as_bytes()).collect();
        let callback = format!(
            "{}?code=test-auth-code&state={encoded_state}",
            redirect_uri.expect("authorize URL has no redirect_uri"),
        );
        tokio::spawn(async move {
            let _ = reqwest::get(callback).await;
        });
        Ok(())
    }
}

fn manager_with_grant(server: &MockServer, store_path: PathBuf, grant: CredentialGrant) -> SessionManager {
    let config = SessionConfig::new(APP_KEY, APP_SECRET, Environment::Sim)
        .with_auth_base(Url::parse(&server.base_url()).unwrap())
        .with_callback_port(0);
    SessionManager::with_grant(config, TokenStore::new(store_path), grant)
}

fn manager(server: &MockServer, store_path: PathBuf) -> SessionManager {
    manager_with_grant(server, store_path, CredentialGrant::with_opener(NoBrowser))
}

// ============================================================================
// INTERACTIVE GRANT TESTS
// ============================================================================

mod interactive_grant_tests {
    use super::*;

    #[tokio::test]
    async fn test_interactive_grant_end_to_end() {
        init_logging();
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("tokens.json");

        let jwt = jwt_expiring_in(1200);
        let token_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/token")
                    .header("authorization", expected_basic_auth())
                    .body_contains("grant_type=authorization_code")
                    .body_contains("code=test-auth-code");
                then.status(200)
                    .json_body(token_body(&jwt, 1200, "granted-refresh", 3600));
            })
            .await;

        let grant = CredentialGrant::with_opener(RedirectOpener { transform: |s| s });
        let manager = manager_with_grant(&server, store_path.clone(), grant);

        manager.authenticate().await.unwrap();
        token_mock.assert_async().await;

        let token = manager.access_token().await.unwrap();
        assert_eq!(token.expose_secret(), jwt);

        // the new session was persisted for the next process
        let stored = std::fs::read_to_string(&store_path).unwrap();
        assert!(stored.contains("granted-refresh"));
    }

    #[tokio::test]
    async fn test_tampered_state_never_reaches_token_endpoint() {
        init_logging();
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().unwrap();

        let token_mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/token");
                then.status(200)
                    .json_body(token_body(&jwt_expiring_in(1200), 1200, "r", 3600));
            })
            .await;

        let grant = CredentialGrant::with_opener(RedirectOpener {
            transform: |_| STANDARD.encode("some-other-token"),
        });
        let manager = manager_with_grant(&server, dir.path().join("tokens.json"), grant);

        let err = manager.authenticate().await.unwrap_err();
        assert!(matches!(err, Error::CsrfMismatch));

        // the forged code must be discarded without an exchange attempt
        assert_eq!(token_mock.hits_async().await, 0);
    }

    #[tokio::test]
    async fn test_rejected_authorization_code_is_an_api_error() {
        init_logging();
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().unwrap();

        // An expired or replayed code is rejected with invalid_grant too,
        // but unlike the refresh exchange it says nothing about any refresh
        // token: it must surface as a plain API error.
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/token")
                    .body_contains("grant_type=authorization_code");
                then.status(401).json_body(json!({
                    "error": "invalid_grant",
                    "error_description": "authorization code is invalid or expired",
                }));
            })
            .await;

        let grant = CredentialGrant::with_opener(RedirectOpener { transform: |s| s });
        let manager = manager_with_grant(&server, dir.path().join("tokens.json"), grant);

        let err = manager.authenticate().await.unwrap_err();
        assert!(!err.requires_reauthentication());
        match err {
            Error::Api { status, code, .. } => {
                assert_eq!(status, 401);
                assert_eq!(code.as_deref(), Some("invalid_grant"));
            }
            other => panic!("expected an API error, got {other:?}"),
        }
    }
}

// ============================================================================
// STORED SESSION TESTS
// ============================================================================

mod stored_session_tests {
    use super::*;

    #[tokio::test]
    async fn test_restores_stored_session_without_any_http() {
        init_logging();
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("tokens.json");
        seed_store(&store_path, "seed-access-token", 1200, 3600);

        let manager = manager(&server, store_path);
        manager.authenticate().await.unwrap();

        let token = manager.access_token().await.unwrap();
        assert_eq!(token.expose_secret(), "seed-access-token");
    }

    #[tokio::test]
    async fn test_restore_refreshes_expired_access_token() {
        init_logging();
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("tokens.json");
        seed_store(&store_path, "stale-access-token", -60, 3600);

        let jwt = jwt_expiring_in(1200);
        let token_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/token")
                    .header("authorization", expected_basic_auth())
                    .body_contains("grant_type=refresh_token")
                    .body_contains("refresh_token=seed-refresh-token");
                then.status(200)
                    .json_body(token_body(&jwt, 1200, "rotated-refresh", 3600));
            })
            .await;

        let manager = manager(&server, store_path.clone());
        manager.authenticate().await.unwrap();
        token_mock.assert_async().await;

        let token = manager.access_token().await.unwrap();
        assert_eq!(token.expose_secret(), jwt);

        // the rotated refresh token was persisted
        let stored = std::fs::read_to_string(&store_path).unwrap();
        assert!(stored.contains("rotated-refresh"));
        assert!(!stored.contains("seed-refresh-token"));
    }
}

// ============================================================================
// REFRESH TESTS
// ============================================================================

mod refresh_tests {
    use super::*;

    #[tokio::test]
    async fn test_manual_refresh_rotates_tokens() {
        init_logging();
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("tokens.json");
        seed_store(&store_path, "seed-access-token", 1200, 3600);

        let jwt = jwt_expiring_in(1200);
        let token_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/token")
                    .body_contains("grant_type=refresh_token");
                then.status(200)
                    .json_body(token_body(&jwt, 1200, "rotated-refresh", 3600));
            })
            .await;

        let manager = manager(&server, store_path);
        manager.authenticate().await.unwrap();
        manager.refresh().await.unwrap();
        token_mock.assert_async().await;

        let token = manager.access_token().await.unwrap();
        assert_eq!(token.expose_secret(), jwt);
    }

    #[tokio::test]
    async fn test_provider_invalid_grant_is_terminal() {
        init_logging();
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("tokens.json");
        // refresh looks alive locally, but the provider has revoked it
        seed_store(&store_path, "stale-access-token", -60, 3600);

        server
            .mock_async(|when, then| {
                when.method(POST).path("/token");
                then.status(401).json_body(json!({
                    "error": "invalid_grant",
                    "error_description": "refresh token is expired or revoked",
                }));
            })
            .await;

        let manager = manager(&server, store_path);
        let err = manager.authenticate().await.unwrap_err();

        assert!(matches!(err, Error::RefreshTokenExpired));
        assert!(err.requires_reauthentication());
    }
}

// ============================================================================
// KEEP-ALIVE TESTS
// ============================================================================

mod keep_alive_tests {
    use super::*;

    #[tokio::test]
    async fn test_keep_alive_recovers_from_transient_failure() {
        init_logging();
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("tokens.json");
        seed_store(&store_path, "stale-access-token", -60, 3600);

        let failing = server
            .mock_async(|when, then| {
                when.method(POST).path("/token");
                then.status(500).json_body(json!({}));
            })
            .await;

        let manager = manager(&server, store_path);
        // The eager refresh fails, but the stale session stays installed.
        manager.authenticate().await.unwrap_err();

        // With the endpoint broken the first step fails transiently: the
        // loop must still be armed, retrying on the short interval.
        let handle = manager
            .keep_alive(KeepAliveOptions {
                refresh_immediately: true,
                refresh_delay: Duration::from_secs(60),
                retry_delay: Duration::from_millis(100),
            })
            .await
            .unwrap();
        assert!(handle.is_scheduled());
        assert!(matches!(
            manager.access_token().await,
            Err(Error::AccessTokenExpired)
        ));

        // Endpoint comes back; the retry should repair the session.
        failing.delete_async().await;
        let jwt = jwt_expiring_in(1200);
        let recovered = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/token")
                    .body_contains("grant_type=refresh_token");
                then.status(200)
                    .json_body(token_body(&jwt, 1200, "rotated-refresh", 3600));
            })
            .await;

        let waited = timeout(Duration::from_secs(5), async {
            loop {
                if manager.access_token().await.is_ok() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(25)).await;
            }
        })
        .await;
        assert!(waited.is_ok(), "session should recover once the endpoint is back");
        assert!(recovered.hits_async().await >= 1);

        handle.stop();
    }

    #[tokio::test]
    async fn test_keep_alive_rejects_expired_refresh_token() {
        init_logging();
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("tokens.json");
        // both tokens die one second from now
        seed_store(&store_path, "seed-access-token", 1, 1);

        let token_mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/token");
                then.status(200)
                    .json_body(token_body(&jwt_expiring_in(1200), 1200, "r", 3600));
            })
            .await;

        let manager = manager(&server, store_path);
        manager.authenticate().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1200)).await;

        let err = manager
            .keep_alive(KeepAliveOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RefreshTokenExpired));

        // beyond refreshing: no exchange may even be attempted
        assert_eq!(token_mock.hits_async().await, 0);
    }

    #[tokio::test]
    async fn test_keep_alive_stop_is_idempotent() {
        init_logging();
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("tokens.json");
        seed_store(&store_path, "seed-access-token", 1200, 3600);

        let manager = manager(&server, store_path);
        manager.authenticate().await.unwrap();

        let handle = manager
            .keep_alive(KeepAliveOptions::default())
            .await
            .unwrap();
        assert!(handle.is_scheduled());

        handle.stop();
        let stopped = timeout(Duration::from_secs(2), async {
            while handle.is_scheduled() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(stopped.is_ok(), "loop should wind down after stop");

        handle.stop(); // second stop is a no-op
        assert!(!handle.is_scheduled());
    }

    #[tokio::test]
    async fn test_rearming_replaces_previous_loop() {
        init_logging();
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("tokens.json");
        seed_store(&store_path, "seed-access-token", 1200, 3600);

        let manager = manager(&server, store_path);
        manager.authenticate().await.unwrap();

        let first = manager
            .keep_alive(KeepAliveOptions::default())
            .await
            .unwrap();
        let second = manager
            .keep_alive(KeepAliveOptions::default())
            .await
            .unwrap();

        // the first loop was cancelled by the second arm
        let replaced = timeout(Duration::from_secs(2), async {
            while first.is_scheduled() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(replaced.is_ok(), "first loop should be cancelled on re-arm");
        assert!(second.is_scheduled());

        second.stop();
    }

    #[tokio::test]
    async fn test_concurrent_arms_leave_no_orphan_loop() {
        init_logging();
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("tokens.json");
        seed_store(&store_path, "seed-access-token", 1200, 3600);

        // Slow exchanges hold both arms in flight at once, so each one runs
        // its cancel before either has stored a loop.
        let jwt = jwt_expiring_in(1200);
        let token_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/token")
                    .body_contains("grant_type=refresh_token");
                then.status(200)
                    .delay(Duration::from_millis(250))
                    .json_body(token_body(&jwt, 1200, "rotated-refresh", 3600));
            })
            .await;

        let manager = manager(&server, store_path);
        manager.authenticate().await.unwrap();

        let eager = KeepAliveOptions {
            refresh_immediately: true,
            refresh_delay: Duration::from_secs(60),
            retry_delay: Duration::from_secs(60),
        };
        let clone = manager.clone();
        let (first, second) =
            tokio::join!(manager.keep_alive(eager.clone()), clone.keep_alive(eager));
        let first = first.unwrap();
        let second = second.unwrap();
        assert_eq!(token_mock.hits_async().await, 2);

        // Whichever arm lost the race must already be cancelled, so one
        // final re-arm plus stop has to wind down every loop ever armed.
        let last = manager
            .keep_alive(KeepAliveOptions::default())
            .await
            .unwrap();
        last.stop();

        let drained = timeout(Duration::from_secs(2), async {
            while first.is_scheduled() || second.is_scheduled() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(drained.is_ok(), "no armed loop may outlive its cancellation");
    }
}
