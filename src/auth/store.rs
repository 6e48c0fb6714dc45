//! Durable persistence of session tokens.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::tokens::SessionTokens;
use crate::Result;

/// On-disk persistence for session tokens.
///
/// The store owns a single JSON document keyed by application key, so one
/// OAuth client can run several isolated sessions against the same file.
/// Every save reads the whole document, replaces one entry and writes the
/// whole document back; entries for other application keys survive.
///
/// The file is assumed to have a single writer per machine. Concurrent
/// writes from independent processes can interleave and corrupt entries;
/// that is a documented limitation, not a handled case. The file contents
/// are owned by this store - hand-edited records are out of contract.
///
/// # Example
///
/// ```no_run
/// use saxo_rs::auth::TokenStore;
///
/// let store = TokenStore::new("/home/trader/.saxo/tokens.json");
/// let stored = store.load("my-app-key")?;
/// # Ok::<(), saxo_rs::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

/// Serialized form of one token pair.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTokens {
    access_token: String,
    access_token_expires_at: DateTime<Utc>,
    refresh_token: String,
    refresh_token_expires_at: DateTime<Utc>,
}

impl From<&SessionTokens> for StoredTokens {
    fn from(tokens: &SessionTokens) -> Self {
        Self {
            access_token: tokens.access_token().expose_secret().to_string(),
            access_token_expires_at: tokens.access_token_expires_at(),
            refresh_token: tokens.refresh_token().expose_secret().to_string(),
            refresh_token_expires_at: tokens.refresh_token_expires_at(),
        }
    }
}

impl From<StoredTokens> for SessionTokens {
    fn from(stored: StoredTokens) -> Self {
        SessionTokens::from_parts(
            SecretString::from(stored.access_token),
            stored.access_token_expires_at,
            SecretString::from(stored.refresh_token),
            stored.refresh_token_expires_at,
        )
    }
}

impl TokenStore {
    /// Create a store backed by the given file path.
    ///
    /// The file does not need to exist yet; parent directories are created
    /// on the first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file path this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the tokens stored for an application key.
    ///
    /// An absent file or an absent entry is `Ok(None)`; an unreadable or
    /// unparseable file is an error.
    pub fn load(&self, app_key: &str) -> Result<Option<SessionTokens>> {
        let mut records = self.read_records()?;
        Ok(records.remove(app_key).map(SessionTokens::from))
    }

    /// Persist the tokens for an application key.
    ///
    /// Entries for other application keys are preserved.
    pub fn save(&self, app_key: &str, tokens: &SessionTokens) -> Result<()> {
        let mut records = self.read_records()?;
        records.insert(app_key.to_string(), StoredTokens::from(tokens));

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(&records)?)?;
        tracing::debug!(path = %self.path.display(), app_key, "persisted session tokens");
        Ok(())
    }

    fn read_records(&self) -> Result<BTreeMap<String, StoredTokens>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_str(&raw)?)
    }
}
