//! Configuration Management
//!
//! Hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (`<config dir>/bundlegen/config.toml`)
//! 3. Project config (`./bundlegen.toml`)
//! 4. Environment variables (`BUNDLEGEN_*`)
//! 5. CLI arguments (highest priority, via [`BuildOverrides`])

mod branding;
mod build;
mod loader;
mod types;

pub use branding::{Branding, is_hex_color};
pub use build::{BuildConfig, BuildOverrides};
pub use loader::ConfigLoader;
pub use types::*;
