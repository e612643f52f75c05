//! Configuration Types
//!
//! File- and environment-shaped settings with sensible defaults.
//! Supports global (`<config dir>/bundlegen/config.toml`) and project
//! (`./bundlegen.toml`) level configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::Branding;
use crate::ai::provider::ProviderConfig;
use crate::constants::{env as env_constants, generation as gen_constants, output};
use crate::render::RenderConfig;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Model and retry settings
    pub generation: GenerationConfig,

    /// Output layout and packaging
    pub output: OutputConfig,

    /// Section selection
    pub sections: SectionsConfig,

    /// Brand applied to prompts and PDFs
    pub branding: Branding,

    /// Completion API
    pub provider: ProviderConfig,

    /// HTML-to-PDF command
    pub render: RenderConfig,

    /// Credential file location (defaults to the user config directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_file: Option<PathBuf>,
}

impl Settings {
    /// Apply the dedicated environment overrides (`BUNDLEGEN_MODEL`, `BUNDLEGEN_OUTPUT_DIR`)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup(env_constants::MODEL).filter(|v| !v.trim().is_empty()) {
            self.generation.model = model.trim().to_string();
        }
        if let Some(dir) = lookup(env_constants::OUTPUT_DIR).filter(|v| !v.trim().is_empty()) {
            self.output.dir = PathBuf::from(dir.trim());
        }
    }
}

// =============================================================================
// Generation Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Attempts per chunk
    pub max_retries: u32,
    /// Base backoff delay in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: gen_constants::DEFAULT_MODEL.to_string(),
            temperature: gen_constants::DEFAULT_TEMPERATURE,
            max_tokens: gen_constants::DEFAULT_MAX_TOKENS,
            max_retries: gen_constants::DEFAULT_MAX_RETRIES,
            retry_delay_ms: gen_constants::DEFAULT_RETRY_DELAY_MS,
        }
    }
}

// =============================================================================
// Output Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Folder created inside `dir`; also names the master archive
    pub root_folder: String,
    pub generate_pdfs: bool,
    /// Deflate level 0-9 (0 stores)
    pub compression_level: i64,
    /// Added to the master archive as README.md when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme: Option<PathBuf>,
    /// Added to the master archive as LICENSE when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(output::DEFAULT_OUTPUT_DIR),
            root_folder: output::DEFAULT_ROOT_FOLDER.to_string(),
            generate_pdfs: false,
            compression_level: output::DEFAULT_COMPRESSION_LEVEL,
            readme: None,
            license: None,
        }
    }
}

// =============================================================================
// Sections Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionsConfig {
    /// Section ids in processing order; empty selects the whole catalog
    pub selected: Vec<String>,
    /// Per-section chunk counts replacing the catalog default
    pub chunk_overrides: BTreeMap<String, u32>,
    /// YAML catalog replacing the built-in sections
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.generation.model, "gpt-4o-mini");
        assert_eq!(settings.generation.max_retries, 3);
        assert_eq!(settings.output.root_folder, "content-bundle");
        assert_eq!(settings.output.compression_level, 9);
        assert!(!settings.output.generate_pdfs);
        assert!(settings.sections.selected.is_empty());
    }

    #[test]
    fn test_apply_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("BUNDLEGEN_MODEL", "gpt-4"),
            ("BUNDLEGEN_OUTPUT_DIR", "/tmp/bundles"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.apply_env(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(settings.generation.model, "gpt-4");
        assert_eq!(settings.output.dir, PathBuf::from("/tmp/bundles"));
    }

    #[test]
    fn test_blank_env_values_ignored() {
        let mut settings = Settings::default();
        settings.apply_env(|_| Some("  ".to_string()));
        assert_eq!(settings.generation.model, "gpt-4o-mini");
        assert_eq!(settings.output.dir, PathBuf::from("output"));
    }

    #[test]
    fn test_toml_roundtrip_keeps_partial_sections() {
        let settings: Settings = toml::from_str(
            "[generation]\nmodel = \"gpt-4\"\n\n[sections]\nselected = [\"ebook\"]\n\n[sections.chunk_overrides]\nebook = 2\n",
        )
        .unwrap();
        assert_eq!(settings.generation.model, "gpt-4");
        assert_eq!(settings.generation.max_tokens, 4000);
        assert_eq!(settings.sections.selected, vec!["ebook"]);
        assert_eq!(settings.sections.chunk_overrides.get("ebook"), Some(&2));
    }
}
