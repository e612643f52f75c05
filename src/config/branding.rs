//! Branding
//!
//! Colors, footer and logo applied to generated prompts and PDF documents.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use tracing::warn;
use url::Url;

use crate::types::{BundleError, Result};

/// `#RRGGBB` or `#RGB`
static HEX_COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{6}|[0-9a-fA-F]{3})$").expect("HEX_COLOR_RE regex should compile")
});

pub fn is_hex_color(value: &str) -> bool {
    HEX_COLOR_RE.is_match(value)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Branding {
    pub company_name: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub footer_text: String,
    /// Remote URL, or a filesystem path when `logo_is_local`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub logo_is_local: bool,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            company_name: String::new(),
            primary_color: "#2563eb".to_string(),
            secondary_color: "#1e40af".to_string(),
            footer_text: String::new(),
            logo_url: None,
            logo_is_local: false,
        }
    }
}

impl Branding {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("primary_color", &self.primary_color),
            ("secondary_color", &self.secondary_color),
        ] {
            if !is_hex_color(value) {
                return Err(BundleError::Config(format!(
                    "branding.{} must be a hex color like #1a2b3c, got '{}'",
                    field, value
                )));
            }
        }
        Ok(())
    }

    /// Logo reference usable from a rendered document
    ///
    /// Local logos become `file://` URLs. A local logo that does not exist
    /// degrades to no logo with a warning.
    pub fn resolve_logo(&self) -> Option<String> {
        let logo = self.logo_url.as_deref()?.trim();
        if logo.is_empty() {
            return None;
        }
        if !self.logo_is_local {
            return Some(logo.to_string());
        }

        let path = Path::new(logo);
        let absolute = match path.canonicalize() {
            Ok(p) => p,
            Err(e) => {
                warn!(logo = %path.display(), error = %e, "Logo file not found, continuing without logo");
                return None;
            }
        };

        match Url::from_file_path(&absolute) {
            Ok(url) => Some(url.to_string()),
            Err(()) => {
                warn!(logo = %absolute.display(), "Logo path cannot be expressed as a URL, continuing without logo");
                None
            }
        }
    }
}
