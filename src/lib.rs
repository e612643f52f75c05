//! bundlegen - AI-Generated Digital Content Bundles
//!
//! Walks a catalog of content sections, requests generated text for each in
//! sequential chunks, optionally renders branded PDFs, and packages the
//! results as per-section ZIP archives rolled into one master archive.
//!
//! ## Core Features
//!
//! - **Chunked generation**: ordered requests per section with linear and
//!   rate-limit backoff
//! - **Cost accounting**: versioned pricing table with longest-prefix model lookup
//! - **Layered packaging**: section archives embedded in a master archive
//! - **Incremental persistence**: each chunk is on disk before the next request
//!
//! ## Quick Start
//!
//! ```ignore
//! use bundlegen::{BuildCoordinator, BuildConfig, NoopObserver, SectionCatalog};
//!
//! let catalog = Arc::new(SectionCatalog::builtin());
//! let config = BuildConfig::resolve(&settings, &BuildOverrides::default(), &catalog);
//! let mut coordinator = BuildCoordinator::new(
//!     config,
//!     catalog,
//!     ChunkGenerator::new(provider),
//!     Arc::new(PricingTable::builtin()),
//! );
//! let report = coordinator.run(&mut NoopObserver).await?;
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: completion provider, prompts, pricing, timeouts
//! - [`generation`]: chunk retry policy and section orchestration
//! - [`archive`]: ZIP assembly, stats and extraction
//! - [`build`]: the run state machine
//! - [`render`]: HTML documents and the PDF renderer capability
//! - [`config`]: layered settings and the resolved build configuration

pub mod ai;
pub mod archive;
pub mod build;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod constants;
pub mod generation;
pub mod render;
pub mod secrets;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Branding, BuildConfig, BuildOverrides, ConfigLoader, Settings};

// Error Types
pub use types::error::{BundleError, ErrorCategory, Result};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use build::{
    BuildCoordinator, BuildObserver, BuildPlan, BuildReport, BuildState, NoopObserver,
    SectionResult,
};
pub use catalog::{Section, SectionCatalog};
pub use generation::{ChunkGenerator, GenerationSettings, SectionGenerator};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    CostSummary, CostTracker, LlmProvider, LlmResponse, PricingTable, TimeoutConfig, TokenUsage,
    format_cost, with_timeout,
};
