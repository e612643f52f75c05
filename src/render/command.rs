//! External command renderer (wkhtmltopdf by default)

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use super::{PdfRenderer, RenderConfig, RenderOptions};
use crate::ai::timeout::with_timeout;
use crate::types::{BundleError, Result};

pub struct CommandRenderer {
    config: RenderConfig,
}

impl CommandRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    fn expand_args(&self, output_path: &Path, options: &RenderOptions) -> Vec<String> {
        let output = output_path.to_string_lossy();
        let page_size = options
            .page_size
            .as_deref()
            .filter(|size| !size.trim().is_empty())
            .unwrap_or(&self.config.page_size);
        self.config
            .args
            .iter()
            .map(|arg| {
                arg.replace("{output}", &output)
                    .replace("{page_size}", page_size)
                    .replace("{title}", &options.title)
            })
            .collect()
    }
}

#[async_trait]
impl PdfRenderer for CommandRenderer {
    async fn render(&self, html: &str, output_path: &Path, options: &RenderOptions) -> Result<()> {
        let start_time = Instant::now();
        let args = self.expand_args(output_path, options);

        debug!(
            command = %self.config.command,
            output = %output_path.display(),
            html_bytes = html.len(),
            "Rendering PDF"
        );

        let mut child = Command::new(&self.config.command)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                BundleError::Render(format!(
                    "Failed to spawn '{}': {}. Is it installed?",
                    self.config.command, e
                ))
            })?;

        // Feed stdin and drain stdout/stderr together so a renderer that
        // stops reading cannot stall the run past the timeout.
        let stdin = child.stdin.take();
        let (written, output) = with_timeout(
            Duration::from_secs(self.config.timeout_secs),
            async {
                let write = async {
                    match stdin {
                        Some(mut stdin) => {
                            let result = stdin.write_all(html.as_bytes()).await;
                            drop(stdin);
                            result
                        }
                        None => Ok(()),
                    }
                };
                let wait = async {
                    child
                        .wait_with_output()
                        .await
                        .map_err(|e| BundleError::Render(format!("Renderer execution failed: {}", e)))
                };
                let (written, output) = tokio::join!(write, wait);
                Ok((written, output?))
            },
            "PDF render",
        )
        .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = if stderr.trim().is_empty() {
                "Process exited with non-zero status".to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(BundleError::Render(format!(
                "{} failed ({}): {}",
                self.config.command, output.status, detail
            )));
        }

        written
            .map_err(|e| BundleError::Render(format!("Failed to send HTML to renderer: {}", e)))?;

        if !output_path.is_file() {
            return Err(BundleError::Render(format!(
                "{} produced no file at {}",
                self.config.command,
                output_path.display()
            )));
        }

        debug!(
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "PDF rendered"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        &self.config.command
    }

    async fn health_check(&self) -> Result<bool> {
        let output = Command::new(&self.config.command)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                BundleError::Render(format!("{} not found: {}", self.config.command, e))
            })?;

        if output.status.success() {
            let version = String::from_utf8_lossy(&output.stdout);
            info!("Renderer available: {}", version.trim());
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn shell(script: &str, extra: &[&str]) -> CommandRenderer {
        let mut args = vec!["-c".to_string(), script.to_string()];
        args.extend(extra.iter().map(|s| s.to_string()));
        CommandRenderer::new(RenderConfig {
            command: "sh".to_string(),
            args,
            timeout_secs: 10,
            ..Default::default()
        })
    }

    #[test]
    fn test_configured_page_size_used_when_unset() {
        let renderer = CommandRenderer::new(RenderConfig {
            page_size: "Letter".to_string(),
            ..Default::default()
        });
        let args = renderer.expand_args(
            Path::new("/tmp/out.pdf"),
            &RenderOptions {
                title: "Guide".to_string(),
                ..Default::default()
            },
        );
        let pos = args.iter().position(|a| a == "--page-size").unwrap();
        assert_eq!(args[pos + 1], "Letter");
    }

    #[test]
    fn test_expand_placeholders() {
        let renderer = CommandRenderer::new(RenderConfig::default());
        let args = renderer.expand_args(
            Path::new("/tmp/out.pdf"),
            &RenderOptions {
                page_size: Some("Letter".to_string()),
                title: "Guide".to_string(),
            },
        );
        assert!(args.contains(&"/tmp/out.pdf".to_string()));
        assert!(args.contains(&"Letter".to_string()));
        assert!(args.contains(&"Guide".to_string()));
        assert!(!args.iter().any(|a| a.contains('{')));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_render_pipes_html_to_output() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("doc.pdf");
        let renderer = shell("cat > \"$0\"", &["{output}"]);

        renderer
            .render("<p>hello</p>", &out, &RenderOptions::default())
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "<p>hello</p>");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_render_error() {
        let dir = TempDir::new().unwrap();
        let renderer = shell("cat > /dev/null; echo boom >&2; exit 3", &[]);

        let err = renderer
            .render("<p></p>", &dir.path().join("x.pdf"), &RenderOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BundleError::Render(ref msg) if msg.contains("boom")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_output_is_render_error() {
        let dir = TempDir::new().unwrap();
        let renderer = shell("cat > /dev/null", &[]);

        let err = renderer
            .render("<p></p>", &dir.path().join("x.pdf"), &RenderOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("produced no file"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_covers_unread_stdin() {
        let dir = TempDir::new().unwrap();
        let renderer = CommandRenderer::new(RenderConfig {
            command: "sh".to_string(),
            args: vec!["-c".to_string(), "sleep 8".to_string()],
            timeout_secs: 1,
            ..Default::default()
        });
        let html = "x".repeat(1024 * 1024);

        let started = Instant::now();
        let err = renderer
            .render(&html, &dir.path().join("x.pdf"), &RenderOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BundleError::Timeout { .. }), "got {err}");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_health_check_missing_command() {
        let renderer = CommandRenderer::new(RenderConfig {
            command: "definitely-not-a-real-renderer".to_string(),
            ..Default::default()
        });
        assert!(matches!(
            renderer.health_check().await,
            Err(BundleError::Render(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_command_is_render_error() {
        let renderer = CommandRenderer::new(RenderConfig {
            command: "definitely-not-a-real-renderer".to_string(),
            ..Default::default()
        });
        let err = renderer
            .render("<p></p>", Path::new("/tmp/never.pdf"), &RenderOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BundleError::Render(_)));
    }
}
