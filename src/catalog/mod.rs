//! Section Catalog
//!
//! Read-only table of the content sections a bundle can contain. Each
//! section carries its label, a description, an optional instruction
//! template and the number of chunks generated by default.
//!
//! The built-in catalog covers a typical digital-product bundle. A YAML
//! file can replace it:
//!
//! ```yaml
//! sections:
//!   - id: guide
//!     label: Quick Start Guide
//!     description: A short getting-started guide
//!     prompt_template: Write a friendly walkthrough...
//!     default_chunks: 2
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::types::{BundleError, IoContext, Result};

fn default_chunks() -> u32 {
    1
}

/// One content section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Unique key, also used as directory and archive name
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,
    #[serde(default = "default_chunks")]
    pub default_chunks: u32,
}

impl Section {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
        default_chunks: u32,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: description.into(),
            prompt_template: None,
            default_chunks,
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = Some(template.into());
        self
    }

    /// Instruction text for the model; the description stands in for a missing template
    pub fn instructions(&self) -> &str {
        match self.prompt_template.as_deref() {
            Some(template) if !template.trim().is_empty() => template,
            _ => &self.description,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    sections: Vec<Section>,
}

/// Ordered, immutable section lookup table
#[derive(Debug, Clone)]
pub struct SectionCatalog {
    sections: Vec<Section>,
}

impl SectionCatalog {
    /// Build a catalog, rejecting duplicate ids, unsafe ids and zero chunk counts
    pub fn new(sections: Vec<Section>) -> Result<Self> {
        let mut seen = HashSet::new();
        for section in &sections {
            if !is_valid_id(&section.id) {
                return Err(BundleError::Config(format!(
                    "Invalid section id '{}': use letters, digits, '-' or '_'",
                    section.id
                )));
            }
            if !seen.insert(section.id.as_str()) {
                return Err(BundleError::Config(format!(
                    "Duplicate section id: {}",
                    section.id
                )));
            }
            if section.default_chunks == 0 {
                return Err(BundleError::Config(format!(
                    "Section '{}' must have default_chunks >= 1",
                    section.id
                )));
            }
        }
        Ok(Self { sections })
    }

    /// Load a catalog from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).at_path(path)?;
        let file: CatalogFile = serde_yaml::from_str(&raw)?;
        Self::new(file.sections)
    }

    /// Built-in catalog
    pub fn builtin() -> Self {
        Self {
            sections: builtin_sections(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Look up a section or fail with `UnknownSection`
    pub fn require(&self, id: &str) -> Result<&Section> {
        self.get(id)
            .ok_or_else(|| BundleError::UnknownSection(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn ids(&self) -> Vec<String> {
        self.sections.iter().map(|s| s.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl Default for SectionCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn builtin_sections() -> Vec<Section> {
    vec![
        Section::new(
            "ebook",
            "eBook",
            "A comprehensive guide that teaches the core topic step by step",
            5,
        )
        .with_template(
            "Write a chapter of an in-depth eBook. Use clear headings, short paragraphs, \
             concrete examples and actionable takeaways at the end of each chapter.",
        ),
        Section::new(
            "workbook",
            "Workbook",
            "Exercises and reflection prompts that help readers apply the material",
            3,
        )
        .with_template(
            "Write workbook exercises. Each exercise has a goal, step-by-step instructions \
             and space-filling reflection questions.",
        ),
        Section::new(
            "checklists",
            "Checklists",
            "Printable checklists that break key processes into concrete steps",
            2,
        )
        .with_template(
            "Write practical checklists. Group items under headings and start each item \
             with a verb.",
        ),
        Section::new(
            "templates",
            "Templates",
            "Fill-in-the-blank templates readers can copy and adapt",
            2,
        )
        .with_template(
            "Write ready-to-use templates with clearly marked placeholders in [BRACKETS] \
             and a short note explaining when to use each one.",
        ),
        Section::new(
            "email-sequence",
            "Email Sequence",
            "A welcome and nurture email sequence for new customers",
            2,
        )
        .with_template(
            "Write marketing emails. Give every email a subject line, preview text, body \
             and a single call to action.",
        ),
        Section::new(
            "social-media",
            "Social Media Kit",
            "Short posts and captions for promoting the product",
            1,
        )
        .with_template(
            "Write social media posts for several platforms. Keep each post within the \
             platform's length limits and suggest hashtags.",
        ),
        Section::new(
            "faq",
            "FAQ",
            "Answers to the questions customers ask most often",
            1,
        ),
        Section::new(
            "bonus-guide",
            "Bonus Guide",
            "A short quick-win guide delivered as a bonus",
            1,
        ),
    ]
}
