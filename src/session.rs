//! Session store and durable credential storage.
//!
//! [`SessionStore`] owns the in-memory [`Session`] and mirrors the credential
//! (never the identity) into a [`CredentialStore`] so it survives restarts.
//! The file-backed store keeps a small JSON object on disk with the token
//! under the fixed key [`STORAGE_KEY`]:
//!
//! ```json
//! { "auth_token": "eyJhbGciOi..." }
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::models::{Credential, Identity, Session};

/// Key the credential is stored under.
pub const STORAGE_KEY: &str = "auth_token";

/// Durable storage for a single credential string.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, credential: &str) -> Result<()>;
    fn remove(&self) -> Result<()>;
}

/// Credential persisted as JSON on disk.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_map(&self) -> Result<serde_json::Map<String, serde_json::Value>> {
        if !self.path.exists() {
            return Ok(serde_json::Map::new());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session file: {}", self.path.display()))?;
        if raw.trim().is_empty() {
            return Ok(serde_json::Map::new());
        }
        let value: serde_json::Value = serde_json::from_str(&raw)
            .with_context(|| format!("Corrupt session file: {}", self.path.display()))?;
        match value {
            serde_json::Value::Object(map) => Ok(map),
            _ => anyhow::bail!("Corrupt session file: {}", self.path.display()),
        }
    }

    fn write_map(&self, map: &serde_json::Map<String, serde_json::Value>) -> Result<()> {
        if map.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path).with_context(|| {
                    format!("Failed to remove session file: {}", self.path.display())
                })?;
            }
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write session file: {}", self.path.display()))?;
        restrict_permissions(&self.path)?;
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<String>> {
        let map = self.read_map()?;
        Ok(map
            .get(STORAGE_KEY)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string))
    }

    fn save(&self, credential: &str) -> Result<()> {
        let mut map = self.read_map().unwrap_or_default();
        map.insert(
            STORAGE_KEY.to_string(),
            serde_json::Value::String(credential.to_string()),
        );
        self.write_map(&map)
    }

    fn remove(&self) -> Result<()> {
        let mut map = self.read_map().unwrap_or_default();
        map.remove(STORAGE_KEY);
        self.write_map(&map)
    }
}

/// In-process store. Clones share the slot, which lets a test "reload" by
/// opening a second [`SessionStore`] over the same storage.
#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<String>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("credential slot poisoned"))?;
        Ok(slot.clone())
    }

    fn save(&self, credential: &str) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("credential slot poisoned"))?;
        *slot = Some(credential.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("credential slot poisoned"))?;
        *slot = None;
        Ok(())
    }
}

/// Holds the current session and keeps the persisted credential in sync.
pub struct SessionStore {
    storage: Box<dyn CredentialStore>,
    session: Session,
}

impl SessionStore {
    /// Opens the store, restoring a persisted credential if there is one.
    /// A restored session has no identity. Unreadable storage starts an
    /// anonymous session; the next save or remove overwrites it.
    pub fn open(storage: Box<dyn CredentialStore>) -> Self {
        let session = match storage.load() {
            Ok(Some(token)) => Session::Authenticated {
                credential: Credential::new(token),
                identity: None,
            },
            Ok(None) => Session::Anonymous,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable session storage");
                Session::Anonymous
            }
        };
        Self { storage, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn current_credential(&self) -> Option<&Credential> {
        self.session.credential()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.session.identity()
    }

    /// Replaces the session. The in-memory state is updated even when
    /// persisting fails; the error is returned for the caller to report.
    pub fn set_session(&mut self, credential: Credential, identity: Identity) -> Result<()> {
        let persisted = self.storage.save(credential.as_str());
        self.session = Session::Authenticated {
            credential,
            identity: Some(identity),
        };
        persisted
    }

    /// Attaches identity to an authenticated session. Returns `false` when
    /// there is no credential to attach it to.
    pub fn set_identity(&mut self, identity: Identity) -> bool {
        match &mut self.session {
            Session::Authenticated { identity: slot, .. } => {
                *slot = Some(identity);
                true
            }
            Session::Anonymous => false,
        }
    }

    /// Erases credential and identity, in memory and on disk.
    pub fn clear_session(&mut self) -> Result<()> {
        self.session = Session::Anonymous;
        self.storage.remove()
    }
}
