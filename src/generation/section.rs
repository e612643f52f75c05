//! Section Orchestrator
//!
//! Generates the chunks of one section strictly in order. Each chunk is
//! handed to the progress callback before the next request is issued, so a
//! caller can persist it incrementally.

use std::sync::Arc;
use tracing::info;

use super::{ChunkGenerator, ChunkRequest, GenerationSettings};
use crate::ai::provider::TokenUsage;
use crate::catalog::SectionCatalog;
use crate::config::Branding;
use crate::types::Result;

/// Ordered chunk texts of one section plus their summed usage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionOutput {
    pub chunks: Vec<String>,
    pub total_usage: TokenUsage,
}

pub struct SectionGenerator {
    chunks: ChunkGenerator,
    catalog: Arc<SectionCatalog>,
}

impl SectionGenerator {
    pub fn new(chunks: ChunkGenerator, catalog: Arc<SectionCatalog>) -> Self {
        Self { chunks, catalog }
    }

    /// Generate `num_chunks` chunks for a section
    ///
    /// `on_progress(chunk_index, content, usage)` runs after every chunk; an
    /// error from it aborts the section like a generation failure. Fails with
    /// `UnknownSection` before any request when the id is not in the catalog.
    pub async fn generate_section<F>(
        &self,
        section_id: &str,
        num_chunks: u32,
        settings: &GenerationSettings,
        branding: &Branding,
        mut on_progress: F,
    ) -> Result<SectionOutput>
    where
        F: FnMut(u32, &str, &TokenUsage) -> Result<()>,
    {
        let section = self.catalog.require(section_id)?;

        info!(section = %section.id, chunks = num_chunks, "Generating section");

        let mut output = SectionOutput {
            chunks: Vec::with_capacity(num_chunks as usize),
            total_usage: TokenUsage::default(),
        };

        for chunk_index in 0..num_chunks {
            let response = self
                .chunks
                .generate(&ChunkRequest {
                    settings,
                    section,
                    chunk_index,
                    total_chunks: num_chunks,
                    branding,
                })
                .await?;

            on_progress(chunk_index, &response.content, &response.usage)?;

            output.total_usage += response.usage;
            output.chunks.push(response.content);
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::LlmResponse;
    use crate::catalog::Section;
    use crate::generation::testing::{RecordingSleeper, ScriptedProvider};
    use crate::types::BundleError;
    use std::time::Duration;

    fn generator(provider: Arc<ScriptedProvider>) -> SectionGenerator {
        let catalog = SectionCatalog::new(vec![Section::new("guide", "Guide", "A guide", 3)]).unwrap();
        SectionGenerator::new(
            ChunkGenerator::new(provider).with_sleeper(Arc::new(RecordingSleeper::default())),
            Arc::new(catalog),
        )
    }

    fn settings() -> GenerationSettings {
        GenerationSettings {
            max_retries: 1,
            retry_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_chunks_in_order_with_summed_usage() {
        let provider = Arc::new(ScriptedProvider::new(|call| {
            let n = call as u64;
            Ok(LlmResponse::new(
                format!("chunk {}", call),
                TokenUsage::new(n * 10, n, n * 11),
            ))
        }));
        let mut progress = Vec::new();

        let output = generator(provider.clone())
            .generate_section("guide", 3, &settings(), &Branding::default(), |i, content, usage| {
                progress.push((i, content.to_string(), *usage));
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(output.chunks, vec!["chunk 1", "chunk 2", "chunk 3"]);
        assert_eq!(output.total_usage, TokenUsage::new(60, 6, 66));
        assert_eq!(
            progress.iter().map(|(i, _, _)| *i).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(progress[1].1, "chunk 2");
        assert_eq!(progress[2].2, TokenUsage::new(30, 3, 33));
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_unknown_section_fails_before_any_call() {
        let provider = Arc::new(ScriptedProvider::echo());

        let err = generator(provider.clone())
            .generate_section("missing", 2, &settings(), &Branding::default(), |_, _, _| Ok(()))
            .await
            .unwrap_err();

        assert!(matches!(err, BundleError::UnknownSection(ref id) if id == "missing"));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_chunk_failure_aborts_remaining_chunks() {
        let provider = Arc::new(ScriptedProvider::new(|call| match call {
            2 => Ok(LlmResponse::new("", TokenUsage::default())),
            n => Ok(LlmResponse::new(format!("chunk {}", n), TokenUsage::default())),
        }));
        let mut seen = 0;

        let err = generator(provider.clone())
            .generate_section("guide", 3, &settings(), &Branding::default(), |_, _, _| {
                seen += 1;
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, BundleError::RetriesExhausted { .. }));
        assert_eq!(seen, 1);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_progress_error_aborts_section() {
        let provider = Arc::new(ScriptedProvider::echo());

        let err = generator(provider.clone())
            .generate_section("guide", 3, &settings(), &Branding::default(), |_, _, _| {
                Err(BundleError::Config("disk full".to_string()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, BundleError::Config(_)));
        assert_eq!(provider.calls(), 1);
    }
}
