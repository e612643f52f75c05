//! Build Command
//!
//! Generate every selected section, render optional PDFs and package the
//! bundle.
//!
//! Usage:
//!   bundlegen build [--sections a,b] [--chunks a=3] [--pdf] [--dry-run]

use secrecy::ExposeSecret;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Runtime;
use tracing::info;

use super::key::prompt_api_key;
use crate::ai::pricing::{PricingTable, format_cost};
use crate::ai::provider::create_provider;
use crate::build::{BuildCoordinator, BuildPlan, BuildReport};
use crate::cli::progress::{ConsoleProgress, format_bytes, format_duration};
use crate::cli::ui::Output;
use crate::cli::util::CommandContext;
use crate::config::{BuildConfig, BuildOverrides};
use crate::constants::env as env_constants;
use crate::generation::ChunkGenerator;
use crate::render::create_renderer;
use crate::secrets::resolve_api_key;
use crate::types::{BundleError, Result};

/// Build run options (consolidated parameters)
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub config_file: Option<PathBuf>,
    pub sections_file: Option<PathBuf>,
    pub overrides: BuildOverrides,
    /// Print the plan without generating anything
    pub dry_run: bool,
    pub quiet: bool,
}

pub fn run(options: BuildOptions) -> Result<()> {
    let output = Output::new(options.quiet);
    let context = CommandContext::load(
        options.config_file.as_deref(),
        options.sections_file.as_deref(),
    )?;

    let config = BuildConfig::resolve(&context.settings, &options.overrides, &context.catalog);
    let plan = BuildPlan::new(&config, &context.catalog)?;

    if options.dry_run {
        print_plan(&output, &plan, &config);
        return Ok(());
    }

    let store = context.secret_store()?;
    let (api_key, source) = resolve_api_key(
        std::env::var(env_constants::API_KEY).ok(),
        &store,
        prompt_api_key,
    )?;
    info!(source = %source, "API key resolved");

    let mut provider_config = context.settings.provider.clone();
    provider_config.api_key = Some(api_key.expose_secret().to_string());
    let provider = create_provider(&provider_config)?;
    let chunks = ChunkGenerator::new(provider)
        .with_request_timeout(Duration::from_secs(provider_config.timeout_secs));

    let rt = Runtime::new()?;

    let mut coordinator = BuildCoordinator::new(
        config.clone(),
        Arc::clone(&context.catalog),
        chunks,
        Arc::new(PricingTable::builtin()),
    );
    if config.generate_pdfs {
        let renderer = create_renderer(&context.settings.render);
        if !rt.block_on(renderer.health_check())? {
            return Err(BundleError::Render(format!(
                "{} is installed but not working; check `{} --version`",
                renderer.name(),
                renderer.name()
            )));
        }
        coordinator = coordinator.with_renderer(renderer);
    }

    let mut progress = ConsoleProgress::new(options.quiet);
    let report = rt.block_on(coordinator.run(&mut progress))?;

    print_report(&output, &report);
    Ok(())
}

fn print_plan(output: &Output, plan: &BuildPlan, config: &BuildConfig) {
    output.section("Build plan (dry run)");
    output.field("Model", &plan.model);
    output.field("Output", plan.root_dir.display());
    output.field("Master", plan.master_archive.display());
    output.field("PDFs", if plan.generate_pdfs { "yes" } else { "no" });
    output.field("Compression", config.compression_level);

    output.section("Sections");
    for section in &plan.sections {
        output.field(&section.id, format!("{} ({} chunks)", section.label, section.chunks));
    }
    output.info(&format!(
        "{} sections, {} chunks in total",
        plan.sections.len(),
        plan.total_chunks
    ));
}

fn print_report(output: &Output, report: &BuildReport) {
    output.section("Build complete");
    output.field("Sections", report.total_sections);
    output.field("Chunks", report.total_chunks);
    output.field("Output size", format_bytes(report.output_size_bytes));
    output.field("Duration", format_duration(report.duration_ms / 1000));
    output.field(
        "Tokens",
        format!(
            "{} (prompt: {}, completion: {})",
            report.cost.usage.total_tokens,
            report.cost.usage.prompt_tokens,
            report.cost.usage.completion_tokens
        ),
    );
    output.field("Cost", format_cost(report.cost.cost));
    output.success(&format!("Bundle ready: {}", report.master_archive.display()));
}
