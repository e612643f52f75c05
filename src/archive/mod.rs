//! Archive Builder
//!
//! In-memory ZIP assembly plus read-only inspection of finished archives.
//!
//! ## Lifecycle
//!
//! ```text
//! Archive::new() → add_entry / add_file / add_tree → finalize | write_to
//!                                                     ↓
//!                                          stats / extract (read-only)
//! ```
//!
//! Entry names are `/`-separated paths. Adding a name twice keeps the
//! original position and the latest content.

mod bundle;

pub use bundle::{
    MasterExtras, SectionArchiveOptions, create_master_archive, create_section_archive,
    directory_size, master_archive_path,
};

use ignore::WalkBuilder;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::types::{BundleError, IoContext, Result};

/// Options for [`Archive::add_tree`]
#[derive(Debug, Clone, Default)]
pub struct TreeOptions {
    /// Allowed extensions (case-insensitive, with or without the dot); `None` includes everything
    pub extensions: Option<Vec<String>>,
    pub recursive: bool,
}

impl TreeOptions {
    pub fn flat(extensions: &[&str]) -> Self {
        Self {
            extensions: Some(extensions.iter().map(|e| e.to_string()).collect()),
            recursive: false,
        }
    }

    fn allows(&self, path: &Path) -> bool {
        let Some(allowed) = &self.extensions else {
            return true;
        };
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        allowed
            .iter()
            .any(|a| a.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

/// Ordered set of named byte entries
#[derive(Debug, Clone, Default)]
pub struct Archive {
    entries: Vec<(String, Vec<u8>)>,
    index: HashMap<String, usize>,
}

impl Archive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an entry
    pub fn add_entry(&mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) {
        let name = name.into();
        let content = content.into();
        match self.index.get(&name) {
            Some(&pos) => self.entries[pos].1 = content,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, content));
            }
        }
    }

    /// Add a file from disk under `name`
    pub fn add_file(&mut self, name: impl Into<String>, path: &Path) -> Result<()> {
        let content = fs::read(path).at_path(path)?;
        self.add_entry(name, content);
        Ok(())
    }

    /// Add the files of a directory under `prefix/relative/path`
    ///
    /// Returns the number of files added. A missing directory is an error.
    pub fn add_tree(&mut self, source_dir: &Path, prefix: &str, options: &TreeOptions) -> Result<usize> {
        let metadata = fs::metadata(source_dir).at_path(source_dir)?;
        if !metadata.is_dir() {
            return Err(BundleError::IoAt {
                path: source_dir.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
            });
        }

        let mut builder = WalkBuilder::new(source_dir);
        builder
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b));
        if !options.recursive {
            builder.max_depth(Some(1));
        }

        let mut added = 0;
        for entry in builder.build() {
            let entry = entry.map_err(|e| BundleError::IoAt {
                path: source_dir.to_path_buf(),
                source: io::Error::other(e),
            })?;
            let path = entry.path();

            if !entry.file_type().is_some_and(|t| t.is_file()) || !options.allows(path) {
                continue;
            }

            let Ok(relative) = path.strip_prefix(source_dir) else {
                continue;
            };
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let name = if prefix.is_empty() {
                relative
            } else {
                format!("{}/{}", prefix.trim_end_matches('/'), relative)
            };

            self.add_file(name, path)?;
            added += 1;
        }

        debug!(dir = %source_dir.display(), added, "Added directory to archive");
        Ok(added)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Encode the archive; level 0 stores entries uncompressed
    pub fn finalize(&self, compression_level: i64) -> Result<Vec<u8>> {
        let options = if compression_level == 0 {
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
        } else {
            SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(compression_level))
        };

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in &self.entries {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(content)?;
        }
        Ok(writer.finish()?.into_inner())
    }

    /// Finalize and write to `path`, creating parent directories
    pub fn write_to(&self, path: &Path, compression_level: i64) -> Result<u64> {
        let bytes = self.finalize(compression_level)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).at_path(parent)?;
        }
        fs::write(path, &bytes).at_path(path)?;
        debug!(path = %path.display(), entries = self.len(), bytes = bytes.len(), "Wrote archive");
        Ok(bytes.len() as u64)
    }
}

// =============================================================================
// Inspection
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryStats {
    pub name: String,
    pub size: u64,
    pub compressed_size: u64,
    pub is_dir: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveStats {
    /// Sum of entry compressed sizes
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    /// Non-directory entries
    pub file_count: usize,
    pub entries: Vec<EntryStats>,
    /// Percentage saved; 0 when there is nothing uncompressed
    pub compression_ratio: f64,
}

fn open_archive(path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(path).at_path(path)?;
    Ok(ZipArchive::new(file)?)
}

/// Read entry sizes without extracting
pub fn stats(archive_path: &Path) -> Result<ArchiveStats> {
    let mut archive = open_archive(archive_path)?;
    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let file = archive.by_index_raw(i)?;
        entries.push(EntryStats {
            name: file.name().to_string(),
            size: file.size(),
            compressed_size: file.compressed_size(),
            is_dir: file.is_dir(),
        });
    }

    let compressed_size = entries.iter().map(|e| e.compressed_size).sum();
    let uncompressed_size: u64 = entries.iter().map(|e| e.size).sum();
    let compression_ratio = if uncompressed_size > 0 {
        (1.0 - compressed_size as f64 / uncompressed_size as f64) * 100.0
    } else {
        0.0
    };

    Ok(ArchiveStats {
        compressed_size,
        uncompressed_size,
        file_count: entries.iter().filter(|e| !e.is_dir).count(),
        entries,
        compression_ratio,
    })
}

/// Extract under `output_dir`, returning the extracted file paths in entry order
///
/// Directory entries are created but not returned. Entry names that would
/// escape `output_dir` are rejected.
pub fn extract(archive_path: &Path, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut archive = open_archive(archive_path)?;
    fs::create_dir_all(output_dir).at_path(output_dir)?;

    let mut extracted = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let relative = file.enclosed_name().ok_or_else(|| BundleError::IoAt {
            path: archive_path.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unsafe entry name '{}'", file.name()),
            ),
        })?;
        let target = output_dir.join(relative);

        if file.is_dir() {
            fs::create_dir_all(&target).at_path(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).at_path(parent)?;
        }
        let mut out = File::create(&target).at_path(&target)?;
        io::copy(&mut file, &mut out).at_path(&target)?;
        extracted.push(target);
    }

    Ok(extracted)
}
