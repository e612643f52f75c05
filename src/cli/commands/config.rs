//! Config Command
//!
//! Manage bundlegen configuration.
//!
//! Usage:
//!   bundlegen config show [-f json]
//!   bundlegen config path
//!   bundlegen config init [-g] [--force]

use std::path::Path;

use crate::cli::ui::Output;
use crate::cli::util::{credentials_path, load_settings};
use crate::config::ConfigLoader;
use crate::types::{BundleError, Result};

/// Show the effective configuration (merged from all sources)
pub fn show(config_file: Option<&Path>, format: &str) -> Result<()> {
    let as_json = match format {
        "json" => true,
        "toml" | "text" => false,
        other => {
            return Err(BundleError::Config(format!(
                "Unknown format '{}'. Valid values: toml, json",
                other
            )));
        }
    };
    let settings = load_settings(config_file)?;
    println!("{}", ConfigLoader::render(&settings, as_json)?);
    Ok(())
}

/// Show configuration paths
pub fn path(config_file: Option<&Path>) -> Result<()> {
    let settings = load_settings(config_file)?;
    ConfigLoader::show_path(&credentials_path(&settings)?);
    Ok(())
}

/// Write a default config file, project-level unless `global`
pub fn init(global: bool, force: bool) -> Result<()> {
    let path = if global {
        ConfigLoader::global_config_path().ok_or_else(|| {
            BundleError::Config("Cannot determine the user config directory".to_string())
        })?
    } else {
        ConfigLoader::project_config_path()
    };

    let output = Output::default();
    if ConfigLoader::init(&path, force)? {
        output.success(&format!("Created {}", path.display()));
    } else {
        output.warning(&format!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        ));
    }
    Ok(())
}
