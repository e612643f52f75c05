//! Build plan and results

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

use crate::ai::pricing::CostSummary;
use crate::ai::provider::TokenUsage;
use crate::archive::master_archive_path;
use crate::catalog::SectionCatalog;
use crate::config::BuildConfig;
use crate::types::{Result, RunId};

/// One section as it will be processed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedSection {
    pub id: String,
    pub label: String,
    pub chunks: u32,
    pub dir: PathBuf,
}

/// Validated, ordered work list for a run
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    pub model: String,
    pub root_dir: PathBuf,
    pub master_archive: PathBuf,
    pub generate_pdfs: bool,
    pub sections: Vec<PlannedSection>,
    pub total_chunks: u32,
}

impl BuildPlan {
    pub fn new(config: &BuildConfig, catalog: &SectionCatalog) -> Result<Self> {
        config.validate(catalog)?;

        let sections = config
            .selected_sections
            .iter()
            .map(|id| {
                let section = catalog.require(id)?;
                Ok(PlannedSection {
                    id: section.id.clone(),
                    label: section.label.clone(),
                    chunks: config.effective_chunks(section),
                    dir: config.section_dir(&section.id),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let root_dir = config.root_dir();
        Ok(Self {
            model: config.generation.model.clone(),
            master_archive: master_archive_path(&root_dir, &config.root_folder),
            root_dir,
            generate_pdfs: config.generate_pdfs,
            total_chunks: sections.iter().map(|s| s.chunks).sum(),
            sections,
        })
    }
}

/// Outcome of one successfully processed section; never mutated after creation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionResult {
    pub section_id: String,
    pub section_label: String,
    pub num_chunks: u32,
    pub combined_text_path: PathBuf,
    pub pdf_path: Option<PathBuf>,
    pub archive_path: PathBuf,
    pub usage: TokenUsage,
}

/// Final statistics of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub run_id: RunId,
    pub generated_at: DateTime<Utc>,
    pub sections: Vec<SectionResult>,
    pub total_sections: usize,
    pub total_chunks: u32,
    pub output_size_bytes: u64,
    pub duration_ms: u64,
    pub master_archive: PathBuf,
    pub cost: CostSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Section;
    use crate::config::{BuildOverrides, Settings};
    use crate::types::BundleError;

    fn catalog() -> SectionCatalog {
        SectionCatalog::new(vec![
            Section::new("intro", "Intro", "Opening", 2),
            Section::new("faq", "FAQ", "Questions", 1),
        ])
        .unwrap()
    }

    fn config(overrides: BuildOverrides) -> BuildConfig {
        let mut settings = Settings::default();
        settings.output.dir = PathBuf::from("/out");
        BuildConfig::resolve(&settings, &overrides, &catalog())
    }

    #[test]
    fn test_plan_uses_effective_chunks() {
        let plan = BuildPlan::new(
            &config(BuildOverrides {
                sections: vec!["faq".to_string(), "intro".to_string()],
                chunk_overrides: vec![("faq".to_string(), 4)],
                ..Default::default()
            }),
            &catalog(),
        )
        .unwrap();

        let ids: Vec<_> = plan.sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["faq", "intro"]);
        assert_eq!(plan.sections[0].chunks, 4);
        assert_eq!(plan.sections[1].chunks, 2);
        assert_eq!(plan.total_chunks, 6);
        assert_eq!(plan.sections[1].dir, PathBuf::from("/out/content-bundle/intro"));
        assert_eq!(
            plan.master_archive,
            PathBuf::from("/out/content-bundle/content-bundle_complete.zip")
        );
    }

    #[test]
    fn test_plan_rejects_invalid_config() {
        let result = BuildPlan::new(
            &config(BuildOverrides {
                sections: vec!["nope".to_string()],
                ..Default::default()
            }),
            &catalog(),
        );
        assert!(matches!(result, Err(BundleError::UnknownSection(_))));
    }
}
