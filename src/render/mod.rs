//! PDF Rendering
//!
//! The pipeline only sees [`PdfRenderer`]: given an HTML document and a
//! target path, produce a PDF there. [`CommandRenderer`] drives an external
//! HTML-to-PDF tool; tests substitute their own implementation.

mod command;
pub mod html;

pub use command::CommandRenderer;
pub use html::{DocumentMeta, section_document};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::constants::render as render_constants;
use crate::types::Result;

/// Page options passed to the renderer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Falls back to the renderer's configured page size when unset
    pub page_size: Option<String>,
    pub title: String,
}

/// HTML-to-PDF capability
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    /// Render `html` to a PDF at `output_path`, overwriting it
    async fn render(&self, html: &str, output_path: &Path, options: &RenderOptions) -> Result<()>;

    /// Renderer name for logging
    fn name(&self) -> &str;

    /// Whether the renderer can run at all; checked before a build starts
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

pub type SharedRenderer = Arc<dyn PdfRenderer>;

/// External renderer settings
///
/// `args` may contain `{output}`, `{page_size}` and `{title}` placeholders.
/// The HTML document is written to the command's stdin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub command: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
    pub page_size: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            command: render_constants::DEFAULT_COMMAND.to_string(),
            args: [
                "--quiet",
                "--enable-local-file-access",
                "--page-size",
                "{page_size}",
                "--title",
                "{title}",
                "-",
                "{output}",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            timeout_secs: render_constants::DEFAULT_TIMEOUT_SECS,
            page_size: "A4".to_string(),
        }
    }
}

pub fn create_renderer(config: &RenderConfig) -> SharedRenderer {
    Arc::new(CommandRenderer::new(config.clone()))
}
