//! Local refresh-token cache: one JSON file mapping email to
//! `{ refresh_token, login_type }`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::SdkResult;

pub const CONFIG_FILE_NAME: &str = ".inferhost.config.json";
pub const DEFAULT_LOGIN_TYPE: &str = "inferhost";

/// Serializes every read and write of the cache file within this process.
/// Separate processes can still race on the file.
static FILE_LOCK: Mutex<()> = Mutex::new(());

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct StoredCredential {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default = "default_login_type")]
    login_type: String,
}

fn default_login_type() -> String {
    DEFAULT_LOGIN_TYPE.to_string()
}

#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.inferhost.config.json`, if a home directory is known.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn refresh_token(&self, email: &str) -> SdkResult<Option<String>> {
        let _guard = FILE_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let entries = self.read_entries()?;
        Ok(entries.get(email).and_then(|c| c.refresh_token.clone()))
    }

    pub fn login_type(&self, email: &str) -> SdkResult<Option<String>> {
        let _guard = FILE_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let entries = self.read_entries()?;
        Ok(entries.get(email).map(|c| c.login_type.clone()))
    }

    /// Store `refresh_token` for `email`, rewriting the whole file. An
    /// existing entry keeps its login type.
    pub fn write_refresh_token(
        &self,
        email: &str,
        refresh_token: &str,
        login_type: &str,
    ) -> SdkResult<()> {
        let _guard = FILE_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.read_entries()?;
        let entry = entries
            .entry(email.to_string())
            .or_insert_with(|| StoredCredential {
                refresh_token: None,
                login_type: login_type.to_string(),
            });
        entry.refresh_token = Some(refresh_token.to_string());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_vec(&entries)?)?;
        tracing::debug!(path=%self.path.display(), "refresh token cached");
        Ok(())
    }

    /// Caller must hold `FILE_LOCK`.
    fn read_entries(&self) -> SdkResult<BTreeMap<String, StoredCredential>> {
        match std::fs::read(&self.path) {
            Ok(raw) if raw.iter().all(u8::is_ascii_whitespace) => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_slice(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}
