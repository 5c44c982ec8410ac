// src/classpath/mod.rs

//! Classpath elements and their entries
//!
//! A classpath is an ordered list of directories and archives. This module
//! detects what each element is, walks it into a uniform stream of
//! [`SourceEntry`] values, and classifies each entry.
//!
//! # Usage
//!
//! ```ignore
//! use chasm_classpath::classpath::{ClasspathElement, SourceWalker};
//!
//! let element = ClasspathElement::detect("libs/foo.jar");
//! for entry in SourceWalker::walk(&element)? {
//!     let entry = entry?;
//!     println!("{} ({})", entry.path, entry.kind);
//! }
//! ```

mod classifier;
mod walker;

pub use classifier::{
    CLASS_SUFFIX, EntryClassifier, EntryKind, SCRIPT_SUFFIX, TRANSFORMER_NAMESPACE,
};
pub use walker::{SourceEntries, SourceWalker};

use crate::provenance::ArchiveHandle;
use std::path::{Path, PathBuf};

/// File name suffix of archives accepted on the classpath
pub const ARCHIVE_SUFFIX: &str = ".jar";

/// What a classpath element turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// A directory tree of loose files
    Directory,
    /// A jar archive
    Archive,
    /// Anything else; skipped without error
    Unsupported,
}

impl ElementKind {
    /// Get a human-readable name for the kind
    pub fn name(&self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::Archive => "archive",
            Self::Unsupported => "unsupported",
        }
    }
}

/// One input of the classpath
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClasspathElement {
    pub path: PathBuf,
    pub kind: ElementKind,
}

impl ClasspathElement {
    /// Detect the kind of a classpath path
    ///
    /// Directories are recognized by the filesystem, archives by their
    /// `.jar` suffix. A missing `.jar` is still an archive so that opening
    /// it fails loudly; anything else is unsupported.
    pub fn detect(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let kind = if path.is_dir() {
            ElementKind::Directory
        } else if is_archive_name(path) {
            ElementKind::Archive
        } else {
            ElementKind::Unsupported
        };

        Self {
            path: path.to_path_buf(),
            kind,
        }
    }

    /// Handle of the output archive mirroring this element
    ///
    /// `None` unless the element is an archive. The handle is the archive's
    /// file name, so `libs/foo.jar` maps to `<output>/foo.jar`.
    pub fn archive_handle(&self) -> Option<ArchiveHandle> {
        if self.kind != ElementKind::Archive {
            return None;
        }
        self.path
            .file_name()
            .map(|name| ArchiveHandle::new(name.to_string_lossy()))
    }
}

fn is_archive_name(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(ARCHIVE_SUFFIX))
        .unwrap_or(false)
}

/// Container an entry was read from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryOrigin {
    /// A directory classpath element
    Directory,
    /// An archive classpath element
    Archive(ArchiveHandle),
}

/// A regular entry read from a classpath element
#[derive(Debug, Clone)]
pub struct SourceEntry {
    /// `/`-separated path relative to the element root
    pub path: String,
    /// Classification of `path`
    pub kind: EntryKind,
    /// Raw content
    pub bytes: Vec<u8>,
    /// Container the entry came from
    pub origin: EntryOrigin,
    /// Whether the archive stored this entry uncompressed
    pub stored: bool,
}
