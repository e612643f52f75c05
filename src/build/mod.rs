//! Build Coordinator
//!
//! Drives one run: `Init → Section(0..n) → MasterArchive → Done`, with
//! `Failed` reachable from every state. Sections and their chunks are
//! processed strictly one at a time. A failure aborts the run and leaves
//! everything written so far on disk.

mod observer;
mod report;

pub use observer::{BuildObserver, NoopObserver};
pub use report::{BuildPlan, BuildReport, PlannedSection, SectionResult};

use chrono::Utc;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument};

use crate::ai::pricing::{CostTracker, PricingTable};
use crate::archive::{
    MasterExtras, SectionArchiveOptions, create_master_archive, create_section_archive,
    directory_size,
};
use crate::catalog::{Section, SectionCatalog};
use crate::config::BuildConfig;
use crate::constants::output;
use crate::generation::{ChunkGenerator, SectionGenerator};
use crate::render::{DocumentMeta, RenderOptions, SharedRenderer, section_document};
use crate::types::{BundleError, IoContext, Result, RunId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Init,
    /// Processing the section at `index` in selection order
    Section { index: usize },
    MasterArchive,
    Done,
    Failed,
}

pub struct BuildCoordinator {
    config: BuildConfig,
    catalog: Arc<SectionCatalog>,
    sections: SectionGenerator,
    renderer: Option<SharedRenderer>,
    cost: CostTracker,
    state: BuildState,
    run_id: RunId,
}

impl BuildCoordinator {
    pub fn new(
        config: BuildConfig,
        catalog: Arc<SectionCatalog>,
        chunks: ChunkGenerator,
        pricing: Arc<PricingTable>,
    ) -> Self {
        let cost = CostTracker::new(config.generation.model.clone(), pricing);
        Self {
            sections: SectionGenerator::new(chunks, Arc::clone(&catalog)),
            config,
            catalog,
            renderer: None,
            cost,
            state: BuildState::Init,
            run_id: RunId::generate(),
        }
    }

    /// Required when `generate_pdfs` is set
    pub fn with_renderer(mut self, renderer: SharedRenderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Execute the run once; a coordinator cannot be restarted
    #[instrument(skip_all, fields(run_id = %self.run_id))]
    pub async fn run(&mut self, observer: &mut dyn BuildObserver) -> Result<BuildReport> {
        if self.state != BuildState::Init {
            return Err(BundleError::Config(format!(
                "Build already ran (state: {:?})",
                self.state
            )));
        }

        match self.execute(observer).await {
            Ok(report) => {
                self.state = BuildState::Done;
                info!(
                    sections = report.total_sections,
                    chunks = report.total_chunks,
                    bytes = report.output_size_bytes,
                    duration_ms = report.duration_ms,
                    "Build complete"
                );
                Ok(report)
            }
            Err(e) => {
                error!(state = ?self.state, error = %e, "Build failed");
                self.state = BuildState::Failed;
                Err(e)
            }
        }
    }

    async fn execute(&mut self, observer: &mut dyn BuildObserver) -> Result<BuildReport> {
        let started = Instant::now();
        let plan = BuildPlan::new(&self.config, &self.catalog)?;
        if self.config.generate_pdfs && self.renderer.is_none() {
            return Err(BundleError::Config(
                "PDF generation is enabled but no renderer is configured".to_string(),
            ));
        }

        info!(
            sections = plan.sections.len(),
            chunks = plan.total_chunks,
            model = %plan.model,
            root = %plan.root_dir.display(),
            "Starting build"
        );
        observer.build_started(&plan);
        fs::create_dir_all(&plan.root_dir).at_path(&plan.root_dir)?;

        let total = plan.sections.len();
        let mut results: Vec<SectionResult> = Vec::with_capacity(total);
        for (index, planned) in plan.sections.iter().enumerate() {
            self.state = BuildState::Section { index };
            let result = self.process_section(index, total, planned, observer).await?;
            observer.archive_written(&result.archive_path);
            observer.section_completed(&result);
            results.push(result);
        }

        self.state = BuildState::MasterArchive;
        let section_archives: Vec<PathBuf> =
            results.iter().map(|r| r.archive_path.clone()).collect();
        let master_archive = create_master_archive(
            &section_archives,
            &plan.master_archive,
            MasterExtras {
                readme: self.config.readme.as_deref(),
                license: self.config.license.as_deref(),
            },
            self.config.compression_level,
        )?;
        observer.archive_written(&master_archive);

        let output_size_bytes = directory_size(&plan.root_dir)?;

        Ok(BuildReport {
            run_id: self.run_id.clone(),
            generated_at: Utc::now(),
            total_sections: results.len(),
            total_chunks: plan.total_chunks,
            sections: results,
            output_size_bytes,
            duration_ms: started.elapsed().as_millis() as u64,
            master_archive,
            cost: self.cost.summary(),
        })
    }

    async fn process_section(
        &mut self,
        index: usize,
        total: usize,
        planned: &PlannedSection,
        observer: &mut dyn BuildObserver,
    ) -> Result<SectionResult> {
        let catalog = Arc::clone(&self.catalog);
        let section = catalog.require(&planned.id)?;
        let section_dir = &planned.dir;
        fs::create_dir_all(section_dir).at_path(section_dir)?;

        info!(
            section = %section.id,
            position = index + 1,
            total,
            chunks = planned.chunks,
            "Processing section"
        );
        observer.section_started(index, total, section, planned.chunks);

        // Chunks land in the part file as they arrive; the final name appears only once complete.
        let text_path = section_dir.join(format!("{}.txt", section.id));
        let part_path = section_dir.join(format!("{}.txt.{}", section.id, output::PARTIAL_SUFFIX));
        let mut part = File::create(&part_path).at_path(&part_path)?;

        let cost = &mut self.cost;
        let generated = self
            .sections
            .generate_section(
                &section.id,
                planned.chunks,
                &self.config.generation,
                &self.config.branding,
                |chunk_index, content, usage| {
                    if chunk_index > 0 {
                        part.write_all(output::CHUNK_SEPARATOR.as_bytes())
                            .at_path(&part_path)?;
                    }
                    part.write_all(content.as_bytes()).at_path(&part_path)?;
                    cost.add_usage(usage);
                    observer.chunk_completed(
                        section,
                        chunk_index,
                        planned.chunks,
                        usage,
                        cost.total_cost(),
                    );
                    Ok(())
                },
            )
            .await?;

        part.sync_all().at_path(&part_path)?;
        drop(part);
        fs::rename(&part_path, &text_path).at_path(&text_path)?;
        debug!(path = %text_path.display(), "Combined text written");

        let pdf_path = if self.config.generate_pdfs {
            let combined = generated.chunks.join(output::CHUNK_SEPARATOR);
            Some(self.render_pdf(section, &combined, section_dir).await?)
        } else {
            None
        };

        let archive_path = create_section_archive(
            &section.id,
            section_dir,
            &self.config.root_dir(),
            &SectionArchiveOptions {
                include_source_files: false,
                include_pdfs: true,
                compression_level: self.config.compression_level,
            },
        )?;

        Ok(SectionResult {
            section_id: section.id.clone(),
            section_label: section.label.clone(),
            num_chunks: planned.chunks,
            combined_text_path: text_path,
            pdf_path,
            archive_path,
            usage: generated.total_usage,
        })
    }

    async fn render_pdf(
        &self,
        section: &Section,
        text: &str,
        section_dir: &Path,
    ) -> Result<PathBuf> {
        let renderer = self.renderer.as_ref().ok_or_else(|| {
            BundleError::Config("PDF generation is enabled but no renderer is configured".to_string())
        })?;

        let pdf_path = section_dir.join(format!("{}.pdf", section.id));
        let html = section_document(
            text,
            &self.config.branding,
            &DocumentMeta {
                title: section.label.clone(),
                subtitle: Some(section.description.clone()).filter(|d| !d.trim().is_empty()),
                generated_at: Some(Utc::now().format("%Y-%m-%d").to_string()),
            },
        );

        renderer
            .render(
                &html,
                &pdf_path,
                &RenderOptions {
                    title: section.label.clone(),
                    ..Default::default()
                },
            )
            .await?;
        info!(section = %section.id, renderer = renderer.name(), path = %pdf_path.display(), "PDF rendered");
        Ok(pdf_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::{LlmResponse, TokenUsage};
    use crate::archive::{extract, stats};
    use crate::config::{BuildOverrides, Settings};
    use crate::generation::testing::{RecordingSleeper, ScriptedProvider};
    use crate::render::PdfRenderer;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct FakeRenderer {
        documents: Mutex<Vec<String>>,
    }

    impl FakeRenderer {
        fn new() -> Self {
            Self {
                documents: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PdfRenderer for FakeRenderer {
        async fn render(&self, html: &str, output_path: &Path, _options: &RenderOptions) -> Result<()> {
            self.documents.lock().unwrap().push(html.to_string());
            fs::write(output_path, b"%PDF-1.4 fake").at_path(output_path)
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Vec<String>,
        costs: Vec<f64>,
    }

    impl BuildObserver for RecordingObserver {
        fn build_started(&mut self, plan: &BuildPlan) {
            self.events.push(format!("start {}", plan.total_chunks));
        }

        fn section_started(&mut self, index: usize, total: usize, section: &Section, chunks: u32) {
            self.events
                .push(format!("section {} {}/{} x{}", section.id, index + 1, total, chunks));
        }

        fn chunk_completed(
            &mut self,
            section: &Section,
            chunk_index: u32,
            total_chunks: u32,
            _usage: &TokenUsage,
            running_cost: f64,
        ) {
            self.events.push(format!(
                "chunk {} {}/{}",
                section.id,
                chunk_index + 1,
                total_chunks
            ));
            self.costs.push(running_cost);
        }

        fn section_completed(&mut self, result: &SectionResult) {
            self.events.push(format!("done {}", result.section_id));
        }

        fn archive_written(&mut self, path: &Path) {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            self.events.push(format!("archive {}", name));
        }
    }

    fn catalog() -> Arc<SectionCatalog> {
        Arc::new(
            SectionCatalog::new(vec![
                Section::new("guide", "Guide", "A practical guide", 2),
                Section::new("faq", "FAQ", "Common questions", 1),
            ])
            .unwrap(),
        )
    }

    fn coordinator(
        dir: &Path,
        provider: Arc<ScriptedProvider>,
        overrides: BuildOverrides,
    ) -> BuildCoordinator {
        let mut settings = Settings::default();
        settings.output.dir = dir.to_path_buf();
        settings.generation.max_retries = 1;
        settings.generation.retry_delay_ms = 0;

        let catalog = catalog();
        let config = BuildConfig::resolve(&settings, &overrides, &catalog);
        BuildCoordinator::new(
            config,
            catalog,
            ChunkGenerator::new(provider).with_sleeper(Arc::new(RecordingSleeper::default())),
            Arc::new(PricingTable::builtin()),
        )
    }

    fn only(id: &str) -> BuildOverrides {
        BuildOverrides {
            sections: vec![id.to_string()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_single_section_without_pdfs() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::echo());
        let mut coordinator = coordinator(dir.path(), provider.clone(), only("guide"));

        let report = coordinator.run(&mut NoopObserver).await.unwrap();
        assert_eq!(coordinator.state(), BuildState::Done);
        assert_eq!(provider.calls(), 2);

        let root = dir.path().join("content-bundle");
        let text = fs::read_to_string(root.join("guide").join("guide.txt")).unwrap();
        assert_eq!(text, "content 1\n\n---\n\ncontent 2");
        assert!(!root.join("guide").join("guide.txt.part").exists());

        let section_zip = root.join("guide.zip");
        assert_eq!(stats(&section_zip).unwrap().file_count, 0);

        let master = root.join("content-bundle_complete.zip");
        assert_eq!(report.master_archive, master);
        let master_stats = stats(&master).unwrap();
        let names: Vec<_> = master_stats.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["guide.zip"]);

        let unpacked = TempDir::new().unwrap();
        let files = extract(&master, unpacked.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(
            fs::read(&files[0]).unwrap(),
            fs::read(&section_zip).unwrap()
        );

        assert_eq!(report.total_sections, 1);
        assert_eq!(report.total_chunks, 2);
        assert_eq!(report.sections[0].pdf_path, None);
        assert_eq!(report.sections[0].usage, TokenUsage::new(20, 10, 30));
        assert_eq!(report.cost.usage, TokenUsage::new(20, 10, 30));
        assert!(report.output_size_bytes > 0);
    }

    #[tokio::test]
    async fn test_section_failure_aborts_run() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::new(|call| match call {
            1 => Ok(LlmResponse::new("faq text", TokenUsage::new(1, 1, 2))),
            _ => Ok(LlmResponse::new("   ", TokenUsage::default())),
        }));
        let mut coordinator = coordinator(
            dir.path(),
            provider.clone(),
            BuildOverrides {
                sections: vec!["faq".to_string(), "guide".to_string()],
                ..Default::default()
            },
        );

        let err = coordinator.run(&mut NoopObserver).await.unwrap_err();
        assert!(matches!(err, BundleError::RetriesExhausted { attempts: 1, .. }));
        assert_eq!(coordinator.state(), BuildState::Failed);
        assert_eq!(provider.calls(), 2);

        let root = dir.path().join("content-bundle");
        assert!(root.join("faq.zip").exists());
        assert!(root.join("faq").join("faq.txt").exists());
        assert!(root.join("guide").join("guide.txt.part").exists());
        assert!(!root.join("guide").join("guide.txt").exists());
        assert!(!root.join("guide.zip").exists());
        assert!(!root.join("content-bundle_complete.zip").exists());

        let rerun = coordinator.run(&mut NoopObserver).await;
        assert!(matches!(rerun, Err(BundleError::Config(_))));
    }

    #[tokio::test]
    async fn test_pdf_is_the_only_archived_file() {
        let dir = TempDir::new().unwrap();
        let renderer = Arc::new(FakeRenderer::new());
        let mut coordinator = coordinator(
            dir.path(),
            Arc::new(ScriptedProvider::echo()),
            BuildOverrides {
                sections: vec!["guide".to_string()],
                generate_pdfs: Some(true),
                ..Default::default()
            },
        )
        .with_renderer(renderer.clone());

        let report = coordinator.run(&mut NoopObserver).await.unwrap();

        let root = dir.path().join("content-bundle");
        let pdf = root.join("guide").join("guide.pdf");
        assert_eq!(report.sections[0].pdf_path.as_deref(), Some(pdf.as_path()));

        let section_stats = stats(&root.join("guide.zip")).unwrap();
        let names: Vec<_> = section_stats.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["guide/guide.pdf"]);

        let documents = renderer.documents.lock().unwrap();
        assert_eq!(documents.len(), 1);
        assert!(documents[0].contains("content 1"));
        assert!(documents[0].contains("content 2"));
    }

    #[tokio::test]
    async fn test_pdfs_without_renderer_fail_before_generation() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::echo());
        let mut coordinator = coordinator(
            dir.path(),
            provider.clone(),
            BuildOverrides {
                generate_pdfs: Some(true),
                ..Default::default()
            },
        );

        let err = coordinator.run(&mut NoopObserver).await.unwrap_err();
        assert!(matches!(err, BundleError::Config(_)));
        assert_eq!(provider.calls(), 0);
        assert!(!dir.path().join("content-bundle").exists());
    }

    #[tokio::test]
    async fn test_observer_sees_events_in_order() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator(
            dir.path(),
            Arc::new(ScriptedProvider::echo()),
            BuildOverrides {
                chunk_overrides: vec![("faq".to_string(), 2)],
                ..Default::default()
            },
        );
        let mut observer = RecordingObserver::default();

        coordinator.run(&mut observer).await.unwrap();

        assert_eq!(
            observer.events,
            vec![
                "start 4",
                "section guide 1/2 x2",
                "chunk guide 1/2",
                "chunk guide 2/2",
                "archive guide.zip",
                "done guide",
                "section faq 2/2 x2",
                "chunk faq 1/2",
                "chunk faq 2/2",
                "archive faq.zip",
                "done faq",
                "archive content-bundle_complete.zip",
            ]
        );
        assert_eq!(observer.costs.len(), 4);
        assert!(observer.costs.windows(2).all(|w| w[0] <= w[1]));
        assert!(observer.costs[0] > 0.0);
    }
}
