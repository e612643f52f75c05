//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (`<config dir>/bundlegen/config.toml`)
//! 3. Project config (`./bundlegen.toml`)
//! 4. Environment variables (`BUNDLEGEN_*`, `__` separates nesting)
//! 5. Dedicated overrides (`BUNDLEGEN_MODEL`, `BUNDLEGEN_OUTPUT_DIR`)

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Settings;
use crate::constants::env as env_constants;
use crate::types::{BundleError, IoContext, Result};

const PROJECT_CONFIG_FILE: &str = "bundlegen.toml";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Settings> {
        let figment = Self::file_layers(
            Self::global_config_path().as_deref(),
            &Self::project_config_path(),
        )
        .merge(Env::prefixed(env_constants::CONFIG_PREFIX).split("__"));

        let mut settings: Settings = figment
            .extract()
            .map_err(|e| BundleError::Config(format!("Configuration error: {}", e)))?;
        settings.apply_env(|key| std::env::var(key).ok());

        Ok(settings)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Settings> {
        if !path.is_file() {
            return Err(BundleError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| BundleError::Config(format!("Configuration error: {}", e)))
    }

    fn file_layers(global: Option<&Path>, project: &Path) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Settings::default()));

        if let Some(global_path) = global
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(global_path));
        }

        if project.exists() {
            debug!("Loading project config from: {}", project.display());
            figment = figment.merge(Toml::file(project));
        }

        figment
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Per-user config directory (`~/.config/bundlegen` on Linux)
    pub fn global_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "bundlegen").map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    pub fn project_config_path() -> PathBuf {
        PathBuf::from(PROJECT_CONFIG_FILE)
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path(credentials: &Path) {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:      {} {}", exists, global.display());
        } else {
            println!("  Global:      (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project:     {} {}", exists, project.display());

        let exists = if credentials.exists() { "✓" } else { "✗" };
        println!("  Credentials: {} {}", exists, credentials.display());
    }

    /// Render effective configuration as TOML or JSON
    pub fn render(settings: &Settings, as_json: bool) -> Result<String> {
        if as_json {
            Ok(serde_json::to_string_pretty(settings)?)
        } else {
            toml::to_string_pretty(settings).map_err(|e| BundleError::Config(e.to_string()))
        }
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Write a commented default config; existing files are kept unless `force`
    pub fn init(path: &Path, force: bool) -> Result<bool> {
        if path.exists() && !force {
            info!("Config exists: {}", path.display());
            return Ok(false);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).at_path(parent)?;
        }
        fs::write(path, Self::default_config()).at_path(path)?;
        info!("Created config: {}", path.display());
        Ok(true)
    }

    fn default_config() -> String {
        r##"# bundlegen configuration
# Project settings in ./bundlegen.toml override the user-wide file.
# Any key can also be set as BUNDLEGEN_<SECTION>__<KEY>, e.g. BUNDLEGEN_GENERATION__MAX_TOKENS=2000

[generation]
model = "gpt-4o-mini"
temperature = 0.7
max_tokens = 4000
max_retries = 3
retry_delay_ms = 2000

[output]
dir = "output"
root_folder = "content-bundle"
generate_pdfs = false
compression_level = 9
# readme = "README.md"
# license = "LICENSE"

[sections]
# Empty selects every section in the catalog
selected = []
# catalog_file = "sections.yaml"

[sections.chunk_overrides]
# ebook = 3

[branding]
company_name = ""
primary_color = "#2563eb"
secondary_color = "#1e40af"
footer_text = ""
# logo_url = "assets/logo.png"
logo_is_local = false

[provider]
provider = "openai"
timeout_secs = 300
# api_base = "https://api.openai.com/v1"

[render]
command = "wkhtmltopdf"
timeout_secs = 120
page_size = "A4"
"##
        .to_string()
    }
}
