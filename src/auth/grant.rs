//! Interactive browser-based authorization-code grant.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use rand::RngCore;
use subtle::ConstantTimeEq;
use url::Url;

use super::callback::CallbackListener;
use crate::{Error, Result};

/// Collaborator that opens a URL in the user's environment.
///
/// The default implementation launches the system browser. Tests inject an
/// opener that drives the callback themselves, so the grant flow runs
/// without any real browser or OS process.
pub trait UrlOpener: Send + Sync {
    /// Open the URL, typically in the default browser.
    fn open_url(&self, url: &Url) -> Result<()>;
}

/// Opens URLs in the system default browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl UrlOpener for SystemBrowser {
    fn open_url(&self, url: &Url) -> Result<()> {
        open::that(url.as_str())?;
        Ok(())
    }
}

/// Obtains a fresh authorization code via user interaction.
///
/// One call to [`authorize`](CredentialGrant::authorize) is one attempt: a
/// new CSRF token is generated, the provider's authorize URL is opened in
/// the browser, and a one-shot localhost listener waits for the redirect.
/// There is no retry and no timeout - the flow is paced by the human
/// completing it, and a failed attempt requires fresh interaction anyway.
pub struct CredentialGrant {
    opener: Box<dyn UrlOpener>,
}

impl CredentialGrant {
    /// Grant flow using the system browser.
    pub fn new() -> Self {
        Self::with_opener(SystemBrowser)
    }

    /// Grant flow using a custom URL opener.
    pub fn with_opener(opener: impl UrlOpener + 'static) -> Self {
        Self {
            opener: Box::new(opener),
        }
    }

    /// Run one interactive authorization attempt and return the code.
    ///
    /// The callback listener binds before the browser launches, so the
    /// provider can never redirect into a closed port. A `callback_port` of
    /// `0` picks a free port; the redirect URI always reflects the port
    /// actually bound.
    ///
    /// # Errors
    ///
    /// [`Error::CsrfMismatch`] when the echoed `state` does not decode to
    /// exactly the token generated for this attempt - the returned code is
    /// discarded without being exchanged. [`Error::MalformedCallback`] when
    /// the redirect is missing required parameters.
    pub async fn authorize(
        &self,
        app_key: &str,
        auth_base: &Url,
        callback_port: u16,
    ) -> Result<String> {
        let csrf_token = generate_csrf_token();
        let state = STANDARD.encode(&csrf_token);

        let listener = CallbackListener::bind(callback_port).await?;
        let redirect_uri = format!("http://localhost:{}/", listener.port());
        let url = authorization_url(auth_base, app_key, &state, &redirect_uri)?;

        tracing::debug!(port = listener.port(), "launching browser for authorization");
        self.opener.open_url(&url)?;

        let callback = listener.recv().await?;
        verify_state(&callback.state, &csrf_token)?;
        Ok(callback.code)
    }
}

impl Default for CredentialGrant {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CredentialGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialGrant").finish_non_exhaustive()
    }
}

/// A fresh single-use CSRF token: 32 random bytes as base64url text.
fn generate_csrf_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn authorization_url(
    auth_base: &Url,
    app_key: &str,
    state: &str,
    redirect_uri: &str,
) -> Result<Url> {
    let mut url = Url::parse(&format!(
        "{}/authorize",
        auth_base.as_str().trim_end_matches('/')
    ))?;
    url.query_pairs_mut()
        .append_pair("client_id", app_key)
        .append_pair("response_type", "code")
        .append_pair("state", state)
        .append_pair("redirect_uri", redirect_uri);
    Ok(url)
}

/// Compare the echoed `state` against the token generated for this attempt.
///
/// A state that does not even decode cannot correspond to our token, so it
/// is reported as the same mismatch. The comparison itself is constant
/// time.
fn verify_state(echoed_state: &str, csrf_token: &str) -> Result<()> {
    let decoded = STANDARD.decode(echoed_state).map_err(|_| Error::CsrfMismatch)?;
    if bool::from(decoded.ct_eq(csrf_token.as_bytes())) {
        Ok(())
    } else {
        Err(Error::CsrfMismatch)
    }
}
