// src/output/mod.rs

//! Output directory layout and writers
//!
//! The output directory mirrors the input classpath:
//!
//! ```text
//! <output>/
//! ├── foo.jar               one archive per input archive, same file name
//! ├── bar.jar
//! └── chasm-added-files/    loose output: directory resources and classes
//!     └── com/example/Bar.class   without an archive provenance
//! ```
//!
//! The directory is deleted and rebuilt on every run.

mod container;
mod router;

pub use container::{ArchiveContainer, FlushStats, WriteJob};
pub use router::{Destination, OutputRouter, RouteStats};

use crate::error::{Error, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Default name of the loose output subdirectory
pub const DEFAULT_LOOSE_DIR: &str = "chasm-added-files";

/// Paths making up one pipeline's output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
    loose_dir_name: String,
}

impl OutputLayout {
    /// Create a layout with the default loose directory name
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            loose_dir_name: DEFAULT_LOOSE_DIR.to_string(),
        }
    }

    /// Set the loose output subdirectory name
    pub fn with_loose_dir_name(mut self, name: impl Into<String>) -> Self {
        self.loose_dir_name = name.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loose output directory
    pub fn loose_dir(&self) -> PathBuf {
        self.root.join(&self.loose_dir_name)
    }

    /// Output path of an archive
    ///
    /// Archives sit directly in the output directory, so `name` must be a
    /// single file name. Anything else is a path traversal error.
    pub fn archive_path(&self, name: &str) -> Result<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(file)), None) if file == name => Ok(self.root.join(name)),
            _ => Err(Error::PathTraversal(format!("archive name '{}'", name))),
        }
    }

    /// Target path of a loose file, rejecting paths that would escape
    pub fn loose_path(&self, relative: &str) -> Result<PathBuf> {
        Ok(self.loose_dir().join(sanitize_path(relative)?))
    }

    /// Delete the output directory and recreate it empty
    pub fn reset(&self) -> Result<()> {
        if self.root.exists() {
            debug!("Deleting previous output {}", self.root.display());
            fs::remove_dir_all(&self.root).map_err(|e| Error::io_at(&self.root, e))?;
        }
        fs::create_dir_all(&self.root).map_err(|e| Error::io_at(&self.root, e))?;
        Ok(())
    }

    /// Classpath to hand to downstream build steps
    ///
    /// Every regular file directly inside the output directory, sorted by
    /// name, followed by the loose directory.
    pub fn classpath(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        if self.root.is_dir() {
            for entry in fs::read_dir(&self.root).map_err(|e| Error::io_at(&self.root, e))? {
                let entry = entry.map_err(|e| Error::io_at(&self.root, e))?;
                if entry.path().is_file() {
                    files.push(entry.path());
                }
            }
        }
        files.sort();
        files.push(self.loose_dir());
        Ok(files)
    }
}

/// Normalize an untrusted relative path
///
/// Rejects `..` components, drops `.` components and leading slashes, and
/// rejects paths that end up empty.
pub fn sanitize_path(path: &str) -> Result<PathBuf> {
    let relative = path.trim_start_matches('/');
    let mut normalized = PathBuf::new();

    for component in Path::new(relative).components() {
        match component {
            Component::Normal(c) => normalized.push(c),
            Component::CurDir => {}
            Component::ParentDir => return Err(Error::PathTraversal(path.to_string())),
            Component::Prefix(_) | Component::RootDir => {}
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(Error::PathTraversal(format!("empty path '{}'", path)));
    }

    Ok(normalized)
}
