//! Resolved Build Configuration
//!
//! `BuildConfig` is the single immutable input of a build run. It is
//! resolved once from [`Settings`] plus command-line overrides and validated
//! against the section catalog before any network or disk work starts.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use super::{Branding, Settings};
use crate::catalog::{Section, SectionCatalog};
use crate::generation::GenerationSettings;
use crate::types::{BundleError, Result};

/// Command-line values that take precedence over settings
#[derive(Debug, Clone, Default)]
pub struct BuildOverrides {
    pub sections: Vec<String>,
    pub chunk_overrides: Vec<(String, u32)>,
    pub model: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub root_folder: Option<String>,
    pub generate_pdfs: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildConfig {
    pub root_folder: String,
    pub output_dir: PathBuf,
    pub generation: GenerationSettings,
    pub generate_pdfs: bool,
    pub branding: Branding,
    /// Processing order, without duplicates
    pub selected_sections: Vec<String>,
    pub chunk_overrides: BTreeMap<String, u32>,
    pub compression_level: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<PathBuf>,
}

impl BuildConfig {
    /// Merge settings with overrides; an empty selection means the whole catalog
    pub fn resolve(settings: &Settings, overrides: &BuildOverrides, catalog: &SectionCatalog) -> Self {
        let requested = if !overrides.sections.is_empty() {
            overrides.sections.clone()
        } else if !settings.sections.selected.is_empty() {
            settings.sections.selected.clone()
        } else {
            catalog.ids()
        };

        let mut selected_sections: Vec<String> = Vec::with_capacity(requested.len());
        for id in requested {
            let id = id.trim().to_string();
            if !selected_sections.contains(&id) {
                selected_sections.push(id);
            }
        }

        let mut chunk_overrides = settings.sections.chunk_overrides.clone();
        chunk_overrides.extend(overrides.chunk_overrides.iter().cloned());

        let generation = &settings.generation;
        Self {
            root_folder: overrides
                .root_folder
                .as_deref()
                .unwrap_or(&settings.output.root_folder)
                .trim()
                .to_string(),
            output_dir: overrides
                .output_dir
                .clone()
                .unwrap_or_else(|| settings.output.dir.clone()),
            generation: GenerationSettings {
                model: overrides
                    .model
                    .clone()
                    .unwrap_or_else(|| generation.model.clone()),
                temperature: generation.temperature,
                max_tokens: generation.max_tokens,
                max_retries: generation.max_retries,
                retry_delay: Duration::from_millis(generation.retry_delay_ms),
            },
            generate_pdfs: overrides
                .generate_pdfs
                .unwrap_or(settings.output.generate_pdfs),
            branding: settings.branding.clone(),
            selected_sections,
            chunk_overrides,
            compression_level: settings.output.compression_level,
            readme: settings.output.readme.clone(),
            license: settings.output.license.clone(),
        }
    }

    /// Validate values and section references
    pub fn validate(&self, catalog: &SectionCatalog) -> Result<()> {
        let generation = &self.generation;
        if !(0.0..=2.0).contains(&generation.temperature) {
            return Err(BundleError::Config(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                generation.temperature
            )));
        }
        if generation.max_tokens == 0 {
            return Err(BundleError::Config(
                "max_tokens must be greater than 0".to_string(),
            ));
        }
        if generation.model.trim().is_empty() {
            return Err(BundleError::Config("model must not be empty".to_string()));
        }
        if !(0..=9).contains(&self.compression_level) {
            return Err(BundleError::Config(format!(
                "compression_level must be between 0 and 9, got {}",
                self.compression_level
            )));
        }
        if !is_safe_folder_name(&self.root_folder) {
            return Err(BundleError::Config(format!(
                "root_folder must be a plain folder name, got '{}'",
                self.root_folder
            )));
        }

        self.branding.validate()?;

        if self.selected_sections.is_empty() {
            return Err(BundleError::Config(
                "At least one section must be selected".to_string(),
            ));
        }
        for id in &self.selected_sections {
            catalog.require(id)?;
        }
        for (id, chunks) in &self.chunk_overrides {
            if !self.selected_sections.contains(id) {
                return Err(BundleError::Config(format!(
                    "Chunk override for '{}' which is not a selected section",
                    id
                )));
            }
            if *chunks == 0 {
                return Err(BundleError::Config(format!(
                    "Chunk override for '{}' must be at least 1",
                    id
                )));
            }
        }

        Ok(())
    }

    /// Chunk count for a section: override if present, else the catalog default
    pub fn effective_chunks(&self, section: &Section) -> u32 {
        self.chunk_overrides
            .get(&section.id)
            .copied()
            .unwrap_or(section.default_chunks)
    }

    /// `<output_dir>/<root_folder>`
    pub fn root_dir(&self) -> PathBuf {
        self.output_dir.join(&self.root_folder)
    }

    /// `<output_dir>/<root_folder>/<section_id>`
    pub fn section_dir(&self, section_id: &str) -> PathBuf {
        self.root_dir().join(section_id)
    }
}

fn is_safe_folder_name(name: &str) -> bool {
    !name.is_empty()
        && name.trim() == name
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.chars().any(|c| c.is_control())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> SectionCatalog {
        SectionCatalog::new(vec![
            Section::new("a", "A", "first", 2),
            Section::new("b", "B", "second", 3),
        ])
        .unwrap()
    }

    fn config(overrides: BuildOverrides) -> BuildConfig {
        BuildConfig::resolve(&Settings::default(), &overrides, &catalog())
    }

    #[test]
    fn test_empty_selection_uses_catalog() {
        let config = config(BuildOverrides::default());
        assert_eq!(config.selected_sections, vec!["a", "b"]);
        assert!(config.validate(&catalog()).is_ok());
    }

    #[test]
    fn test_overrides_take_precedence() {
        let mut settings = Settings::default();
        settings.sections.selected = vec!["a".to_string()];
        settings.sections.chunk_overrides.insert("a".to_string(), 5);

        let config = BuildConfig::resolve(
            &settings,
            &BuildOverrides {
                sections: vec!["b".to_string(), "a".to_string(), "b".to_string()],
                chunk_overrides: vec![("b".to_string(), 1)],
                model: Some("gpt-4".to_string()),
                generate_pdfs: Some(true),
                ..Default::default()
            },
            &catalog(),
        );

        assert_eq!(config.selected_sections, vec!["b", "a"]);
        assert_eq!(config.generation.model, "gpt-4");
        assert!(config.generate_pdfs);
        let catalog = catalog();
        assert_eq!(config.effective_chunks(catalog.require("a").unwrap()), 5);
        assert_eq!(config.effective_chunks(catalog.require("b").unwrap()), 1);
    }

    #[test]
    fn test_unknown_section_rejected() {
        let config = config(BuildOverrides {
            sections: vec!["a".to_string(), "zzz".to_string()],
            ..Default::default()
        });
        assert!(matches!(
            config.validate(&catalog()),
            Err(BundleError::UnknownSection(id)) if id == "zzz"
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let base = config(BuildOverrides::default());
        let catalog = catalog();

        let mut hot = base.clone();
        hot.generation.temperature = 2.5;
        assert!(hot.validate(&catalog).is_err());

        let mut no_tokens = base.clone();
        no_tokens.generation.max_tokens = 0;
        assert!(no_tokens.validate(&catalog).is_err());

        let mut level = base.clone();
        level.compression_level = 10;
        assert!(level.validate(&catalog).is_err());

        let mut color = base.clone();
        color.branding.primary_color = "#zzzzzz".to_string();
        assert!(color.validate(&catalog).is_err());

        for folder in ["", "..", "a/b", "a\\b"] {
            let mut root = base.clone();
            root.root_folder = folder.to_string();
            assert!(root.validate(&catalog).is_err(), "accepted {:?}", folder);
        }
    }

    #[test]
    fn test_bad_chunk_overrides_rejected() {
        let catalog = catalog();

        let zero = config(BuildOverrides {
            chunk_overrides: vec![("a".to_string(), 0)],
            ..Default::default()
        });
        assert!(zero.validate(&catalog).is_err());

        let unselected = config(BuildOverrides {
            sections: vec!["a".to_string()],
            chunk_overrides: vec![("b".to_string(), 2)],
            ..Default::default()
        });
        assert!(unselected.validate(&catalog).is_err());
    }

    #[test]
    fn test_output_layout() {
        let config = config(BuildOverrides {
            output_dir: Some(PathBuf::from("/out")),
            root_folder: Some("bundle".to_string()),
            ..Default::default()
        });
        assert_eq!(config.root_dir(), PathBuf::from("/out/bundle"));
        assert_eq!(config.section_dir("a"), PathBuf::from("/out/bundle/a"));
    }

    #[test]
    fn test_root_folder_trimmed() {
        let config = config(BuildOverrides {
            output_dir: Some(PathBuf::from("/out")),
            root_folder: Some(" bundle ".to_string()),
            ..Default::default()
        });
        assert_eq!(config.root_folder, "bundle");
        assert_eq!(config.root_dir(), PathBuf::from("/out/bundle"));
        assert!(config.validate(&catalog()).is_ok());

        let mut padded = config.clone();
        padded.root_folder = " bundle ".to_string();
        assert!(padded.validate(&catalog()).is_err());
    }
}
