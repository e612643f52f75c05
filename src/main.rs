use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bundlegen::config::BuildOverrides;
use bundlegen::constants::env as env_constants;

/// Parse a `section=chunks` override
fn parse_chunk_override(s: &str) -> Result<(String, u32), String> {
    let (id, count) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid chunk override '{}'. Expected <section>=<chunks>", s))?;
    let count: u32 = count
        .trim()
        .parse()
        .map_err(|_| format!("Invalid chunk count in '{}'", s))?;
    if count == 0 {
        return Err(format!("Chunk count for '{}' must be at least 1", id.trim()));
    }
    Ok((id.trim().to_string(), count))
}

#[derive(Parser)]
#[command(name = "bundlegen")]
#[command(
    version,
    about = "AI-generated digital content bundles, packaged as PDFs and ZIP archives"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, global = true, help = "Use this config file instead of global/project lookup")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate and package the content bundle
    Build {
        #[arg(long, short, value_delimiter = ',', help = "Section ids in processing order (default: all)")]
        sections: Vec<String>,
        #[arg(long = "chunks", value_parser = parse_chunk_override, help = "Chunk count override, e.g. ebook=3")]
        chunks: Vec<(String, u32)>,
        #[arg(long, short, help = "Model to use")]
        model: Option<String>,
        #[arg(long, short, help = "Output directory")]
        output_dir: Option<PathBuf>,
        #[arg(long, help = "Bundle folder name inside the output directory")]
        root_folder: Option<String>,
        #[arg(long, conflicts_with = "no_pdf", help = "Render a branded PDF per section")]
        pdf: bool,
        #[arg(long, help = "Skip PDF rendering")]
        no_pdf: bool,
        #[arg(long, help = "YAML section catalog replacing the built-in sections")]
        sections_file: Option<PathBuf>,
        #[arg(long = "dry-run", help = "Show the build plan only, don't generate")]
        dry_run: bool,
    },

    /// List available sections
    Sections {
        #[arg(long, help = "YAML section catalog replacing the built-in sections")]
        sections_file: Option<PathBuf>,
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Manage the stored API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(
            short = 'f',
            long,
            default_value = "toml",
            help = "Output format: toml, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

#[derive(Subcommand)]
enum KeyAction {
    /// Prompt for an API key and store it
    Set,
    /// Remove the stored API key
    Clear,
    /// Show the credentials file location
    Path,
}

fn main() -> ExitCode {
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", console::style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let verbose_env = std::env::var(env_constants::VERBOSE).is_ok_and(|v| v == "true");
    let filter = if cli.verbose || verbose_env {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Build {
            sections,
            chunks,
            model,
            output_dir,
            root_folder,
            pdf,
            no_pdf,
            sections_file,
            dry_run,
        } => {
            use bundlegen::cli::commands::build::BuildOptions;

            let generate_pdfs = match (pdf, no_pdf) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };

            bundlegen::cli::commands::build::run(BuildOptions {
                config_file: cli.config.clone(),
                sections_file,
                overrides: BuildOverrides {
                    sections,
                    chunk_overrides: chunks,
                    model,
                    output_dir,
                    root_folder,
                    generate_pdfs,
                },
                dry_run,
                quiet: cli.quiet,
            })?;
        }
        Commands::Sections {
            sections_file,
            json,
        } => {
            bundlegen::cli::commands::sections::run(config, sections_file.as_deref(), json)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                bundlegen::cli::commands::config::show(config, &format)?;
            }
            ConfigAction::Path => {
                bundlegen::cli::commands::config::path(config)?;
            }
            ConfigAction::Init { global, force } => {
                bundlegen::cli::commands::config::init(global, force)?;
            }
        },
        Commands::Key { action } => match action {
            KeyAction::Set => bundlegen::cli::commands::key::set(config)?,
            KeyAction::Clear => bundlegen::cli::commands::key::clear(config)?,
            KeyAction::Path => bundlegen::cli::commands::key::path(config)?,
        },
    }

    Ok(())
}
