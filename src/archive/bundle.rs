//! Section and master archives
//!
//! Each section directory is packaged into `<sectionId>.zip`; the master
//! archive then embeds every section archive as an opaque entry.

use ignore::WalkBuilder;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use super::{Archive, TreeOptions};
use crate::constants::output;
use crate::types::{BundleError, IoContext, Result};

#[derive(Debug, Clone, Copy)]
pub struct SectionArchiveOptions {
    /// Include `.txt` files
    pub include_source_files: bool,
    /// Include `.pdf` files
    pub include_pdfs: bool,
    pub compression_level: i64,
}

impl Default for SectionArchiveOptions {
    fn default() -> Self {
        Self {
            include_source_files: false,
            include_pdfs: true,
            compression_level: output::DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

/// Optional extra files for the master archive; paths that do not exist are skipped
#[derive(Debug, Clone, Copy, Default)]
pub struct MasterExtras<'a> {
    pub readme: Option<&'a Path>,
    pub license: Option<&'a Path>,
}

/// Package the top level of `section_dir` into `<output_dir>/<section_id>.zip`
///
/// Files are stored under `<section_id>/`. With both filters off the
/// archive is still written, with no entries.
pub fn create_section_archive(
    section_id: &str,
    section_dir: &Path,
    output_dir: &Path,
    options: &SectionArchiveOptions,
) -> Result<PathBuf> {
    let mut extensions = Vec::new();
    if options.include_source_files {
        extensions.push("txt");
    }
    if options.include_pdfs {
        extensions.push("pdf");
    }

    let mut archive = Archive::new();
    let added = archive.add_tree(section_dir, section_id, &TreeOptions::flat(&extensions))?;

    let archive_path = output_dir.join(format!("{}.{}", section_id, output::ARCHIVE_EXTENSION));
    let bytes = archive.write_to(&archive_path, options.compression_level)?;

    info!(
        section = section_id,
        files = added,
        bytes,
        path = %archive_path.display(),
        "Section archive created"
    );
    Ok(archive_path)
}

/// Embed each section archive, by base file name and in input order, into one archive
pub fn create_master_archive(
    section_archives: &[PathBuf],
    output_path: &Path,
    extras: MasterExtras<'_>,
    compression_level: i64,
) -> Result<PathBuf> {
    let mut archive = Archive::new();

    for path in section_archives {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                BundleError::Config(format!(
                    "Section archive path has no file name: {}",
                    path.display()
                ))
            })?;
        archive.add_file(name, path)?;
    }

    for (name, path) in [("README.md", extras.readme), ("LICENSE", extras.license)] {
        if let Some(path) = path.filter(|p| p.is_file()) {
            archive.add_file(name, path)?;
        }
    }

    let bytes = archive.write_to(output_path, compression_level)?;
    info!(
        sections = section_archives.len(),
        entries = archive.len(),
        bytes,
        path = %output_path.display(),
        "Master archive created"
    );
    Ok(output_path.to_path_buf())
}

/// Master archive path: `<root_dir>/<root_folder>_complete.zip`
pub fn master_archive_path(root_dir: &Path, root_folder: &str) -> PathBuf {
    root_dir.join(format!(
        "{}{}.{}",
        root_folder,
        output::MASTER_ARCHIVE_SUFFIX,
        output::ARCHIVE_EXTENSION
    ))
}

/// Total size of all files below `dir`
pub fn directory_size(dir: &Path) -> Result<u64> {
    fs::metadata(dir).at_path(dir)?;

    let walk_error = |e: ignore::Error| BundleError::IoAt {
        path: dir.to_path_buf(),
        source: io::Error::other(e),
    };

    let mut total = 0;
    for entry in WalkBuilder::new(dir)
        .standard_filters(false)
        .follow_links(false)
        .build()
    {
        let entry = entry.map_err(walk_error)?;
        if entry.file_type().is_some_and(|t| t.is_file()) {
            total += entry.metadata().map_err(walk_error)?.len();
        }
    }
    Ok(total)
}
