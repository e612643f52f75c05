//! Sections Command
//!
//! List the section catalog.

use std::path::Path;

use crate::cli::util::CommandContext;
use crate::types::Result;

pub fn run(config_file: Option<&Path>, sections_file: Option<&Path>, as_json: bool) -> Result<()> {
    let context = CommandContext::load(config_file, sections_file)?;

    if as_json {
        let sections: Vec<_> = context.catalog.iter().collect();
        println!("{}", serde_json::to_string_pretty(&sections)?);
        return Ok(());
    }

    let width = context
        .catalog
        .iter()
        .map(|s| s.id.len())
        .max()
        .unwrap_or(0)
        .max(2);
    println!("{:<width$}  {:>6}  LABEL", "ID", "CHUNKS", width = width);
    for section in context.catalog.iter() {
        println!(
            "{:<width$}  {:>6}  {}",
            section.id,
            section.default_chunks,
            section.label,
            width = width
        );
    }
    Ok(())
}
