//! One-shot localhost listener for the authorization callback.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

use crate::{Error, Result};

const SUCCESS_HTML: &str = "<html><body><h1>Authorization complete</h1><p>You can close this window and return to the application.</p></body></html>";
const ERROR_HTML: &str = "<html><body><h1>Authorization failed</h1><p>You can close this window and retry from the application.</p></body></html>";

/// Query parameters delivered by the identity provider's redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CallbackQuery {
    pub(crate) code: String,
    pub(crate) state: String,
}

/// A bound, not-yet-served callback listener.
///
/// Binding happens before the browser is launched so the provider can never
/// redirect into a closed port. The listener serves exactly one request and
/// releases the port immediately afterwards.
///
/// Browsers may resolve `localhost` to either `127.0.0.1` or `[::1]`, so
/// both families are bound when available; one is enough.
#[derive(Debug)]
pub(crate) struct CallbackListener {
    port: u16,
    listener_v4: Option<TcpListener>,
    listener_v6: Option<TcpListener>,
}

impl CallbackListener {
    /// Bind to the given port; `0` picks a free port.
    pub(crate) async fn bind(port: u16) -> Result<Self> {
        if port == 0 {
            return Self::bind_dynamic().await;
        }

        let listener_v4 = TcpListener::bind(("127.0.0.1", port)).await;
        let listener_v6 = TcpListener::bind(("::1", port)).await;
        match (listener_v4, listener_v6) {
            (Err(err), Err(_)) => Err(err.into()),
            (listener_v4, listener_v6) => Ok(Self {
                port,
                listener_v4: listener_v4.ok(),
                listener_v6: listener_v6.ok(),
            }),
        }
    }

    async fn bind_dynamic() -> Result<Self> {
        let listener_v4 = TcpListener::bind(("127.0.0.1", 0)).await?;
        let port = listener_v4.local_addr()?.port();
        // Mirror the chosen port on IPv6 when the stack allows it.
        let listener_v6 = TcpListener::bind(("::1", port)).await.ok();
        Ok(Self {
            port,
            listener_v4: Some(listener_v4),
            listener_v6,
        })
    }

    /// The port this listener is bound to.
    pub(crate) fn port(&self) -> u16 {
        self.port
    }

    /// Serve exactly one callback request and shut down.
    ///
    /// Waits indefinitely: the flow is paced by a human completing the
    /// browser interaction. The confirmation page is served on success, an
    /// error page on a malformed callback; either way the sockets are
    /// dropped afterwards so the port closes.
    pub(crate) async fn recv(mut self) -> Result<CallbackQuery> {
        let accepted = match (self.listener_v4.as_mut(), self.listener_v6.as_mut()) {
            (Some(v4), Some(v6)) => {
                tokio::select! {
                    result = v4.accept() => result,
                    result = v6.accept() => result,
                }
            }
            (Some(v4), None) => v4.accept().await,
            (None, Some(v6)) => v6.accept().await,
            (None, None) => unreachable!("bind() guarantees at least one listener"),
        };
        let (mut socket, _) = accepted?;

        let mut buffer = vec![0u8; 8192];
        let size = socket.read(&mut buffer).await?;
        let request = String::from_utf8_lossy(&buffer[..size]);

        let query = extract_request_target(request.as_ref()).and_then(parse_callback_query);

        let (status, body) = match &query {
            Ok(_) => ("HTTP/1.1 200 OK", SUCCESS_HTML),
            Err(_) => ("HTTP/1.1 400 Bad Request", ERROR_HTML),
        };
        let response = format!(
            "{status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;

        query
    }
}

/// Pull the request target out of the HTTP request line.
fn extract_request_target(request: &str) -> Result<&str> {
    let first_line = request.lines().next().unwrap_or_default();
    let mut parts = first_line.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let target = parts.next().unwrap_or_default();
    if method != "GET" || target.is_empty() {
        return Err(Error::MalformedCallback(format!(
            "expected a GET request, got {first_line:?}"
        )));
    }
    Ok(target)
}

/// Extract `code` and `state` from the callback target.
fn parse_callback_query(target: &str) -> Result<CallbackQuery> {
    let url = Url::parse(&format!("http://localhost{target}"))
        .map_err(|err| Error::MalformedCallback(format!("invalid request target: {err}")))?;

    let mut code = None;
    let mut state = None;
    let mut provider_error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.to_string()),
            "state" => state = Some(value.to_string()),
            "error" => provider_error = Some(value.to_string()),
            _ => {}
        }
    }

    if let Some(error) = provider_error {
        return Err(Error::MalformedCallback(format!(
            "provider returned error: {error}"
        )));
    }
    let code = code.ok_or_else(|| Error::MalformedCallback("missing code parameter".into()))?;
    let state = state.ok_or_else(|| Error::MalformedCallback("missing state parameter".into()))?;
    Ok(CallbackQuery { code, state })
}
