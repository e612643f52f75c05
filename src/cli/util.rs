//! CLI Common Utilities
//!
//! Shared settings and catalog loading for command handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::catalog::SectionCatalog;
use crate::config::{ConfigLoader, Settings};
use crate::secrets::FileSecretStore;
use crate::types::{BundleError, Result};

/// Command execution context
#[derive(Clone)]
pub struct CommandContext {
    pub settings: Settings,
    pub catalog: Arc<SectionCatalog>,
}

impl CommandContext {
    /// Load settings (an explicit file replaces the global/project lookup) and the section catalog
    pub fn load(config_file: Option<&Path>, sections_file: Option<&Path>) -> Result<Self> {
        let settings = load_settings(config_file)?;
        let catalog = match sections_file.or(settings.sections.catalog_file.as_deref()) {
            Some(path) => SectionCatalog::load(path)?,
            None => SectionCatalog::builtin(),
        };

        Ok(Self {
            settings,
            catalog: Arc::new(catalog),
        })
    }

    pub fn secret_store(&self) -> Result<FileSecretStore> {
        credentials_path(&self.settings).map(FileSecretStore::new)
    }
}

pub fn load_settings(config_file: Option<&Path>) -> Result<Settings> {
    match config_file {
        Some(path) => {
            let mut settings = ConfigLoader::load_from_file(path)?;
            settings.apply_env(|key| std::env::var(key).ok());
            Ok(settings)
        }
        None => ConfigLoader::load(),
    }
}

/// Configured credentials file, else the per-user default
pub fn credentials_path(settings: &Settings) -> Result<PathBuf> {
    settings
        .credentials_file
        .clone()
        .or_else(FileSecretStore::default_path)
        .ok_or_else(|| {
            BundleError::Credentials(
                "Cannot determine a credentials location; set credentials_file".to_string(),
            )
        })
}
