//! Credential Storage
//!
//! A small key-value secret store plus the API key resolution chain:
//! environment variable → stored credential → interactive prompt (saved).
//!
//! The file store keeps a flat JSON object in the user config directory,
//! readable only by its owner. A missing file is an empty store.

use secrecy::{ExposeSecret, SecretString};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::ConfigLoader;
use crate::constants::credentials;
use crate::types::{BundleError, IoContext, Result};

/// Secret key-value capability
pub trait SecretStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<SecretString>>;

    fn set(&self, key: &str, value: &SecretString) -> Result<()>;

    /// Remove a key; returns whether it was present
    fn clear(&self, key: &str) -> Result<bool>;
}

/// JSON file store
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/bundlegen/credentials.json`
    pub fn default_path() -> Option<PathBuf> {
        ConfigLoader::global_dir().map(|dir| dir.join(credentials::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No credentials file yet");
                Ok(BTreeMap::new())
            }
            Err(e) => Err(BundleError::IoAt {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).at_path(parent)?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        write_private(&self.path, json.as_bytes())
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, key: &str) -> Result<Option<SecretString>> {
        Ok(self
            .read_all()?
            .remove(key)
            .filter(|v| !v.is_empty())
            .map(SecretString::from))
    }

    fn set(&self, key: &str, value: &SecretString) -> Result<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.expose_secret().to_string());
        self.write_all(&entries)
    }

    fn clear(&self, key: &str) -> Result<bool> {
        let mut entries = self.read_all()?;
        let removed = entries.remove(key).is_some();
        if removed {
            self.write_all(&entries)?;
        }
        Ok(removed)
    }
}

/// Write a file readable only by its owner
#[cfg(unix)]
fn write_private(path: &Path, bytes: &[u8]) -> Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .at_path(path)?;
    // An existing file keeps its old mode on open
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).at_path(path)?;
    file.write_all(bytes).at_path(path)?;
    Ok(())
}

#[cfg(not(unix))]
fn write_private(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).at_path(path)
}

// =============================================================================
// API Key Resolution
// =============================================================================

/// Where the API key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Environment,
    Store,
    Prompt,
}

impl std::fmt::Display for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Environment => write!(f, "environment"),
            Self::Store => write!(f, "credential store"),
            Self::Prompt => write!(f, "prompt"),
        }
    }
}

/// Resolve the API key: environment, then store, then `prompt`
///
/// A prompted key is saved to the store. An empty prompt answer is a
/// credentials error.
pub fn resolve_api_key<F>(
    env_value: Option<String>,
    store: &dyn SecretStore,
    prompt: F,
) -> Result<(SecretString, KeySource)>
where
    F: FnOnce() -> Result<Option<String>>,
{
    if let Some(value) = env_value.filter(|v| !v.trim().is_empty()) {
        return Ok((SecretString::from(value.trim().to_string()), KeySource::Environment));
    }

    if let Some(value) = store.get(credentials::API_KEY_ENTRY)? {
        return Ok((value, KeySource::Store));
    }

    let entered = prompt()?
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| BundleError::Credentials("An API key is required".to_string()))?;

    let secret = SecretString::from(entered);
    store.set(credentials::API_KEY_ENTRY, &secret)?;
    info!("API key saved to credential store");
    Ok((secret, KeySource::Prompt))
}
