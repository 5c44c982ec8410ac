// src/classpath/walker.rs

//! Lazy enumeration of classpath element entries
//!
//! Directories are walked recursively in lexical order, archives in their
//! native entry order. Both yield the same [`SourceEntry`] shape.
//!
//! Multi-release jars are not resolved: entries under `META-INF/versions/`
//! are yielded at their stored paths like any other entry.

use super::{ClasspathElement, ElementKind, EntryClassifier, EntryOrigin, SourceEntry};
use crate::error::{Error, Result};
use crate::provenance::ArchiveHandle;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;
use zip::{CompressionMethod, ZipArchive};

/// Upper bound on the buffer reserved from an entry's declared size
const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

/// Walks classpath elements into entry streams
pub struct SourceWalker;

impl SourceWalker {
    /// Start walking a classpath element
    ///
    /// Opening an archive happens here, so a missing or corrupt jar fails
    /// before any entry is produced. Unsupported elements yield nothing.
    pub fn walk(element: &ClasspathElement) -> Result<SourceEntries> {
        match element.kind {
            ElementKind::Directory => {
                debug!("Walking directory {}", element.path.display());
                let walker = WalkDir::new(&element.path)
                    .sort_by_file_name()
                    .into_iter();
                Ok(SourceEntries::Directory {
                    root: element.path.clone(),
                    walker,
                })
            }
            ElementKind::Archive => {
                let handle = element.archive_handle().ok_or_else(|| {
                    Error::Config(format!(
                        "archive path has no file name: {}",
                        element.path.display()
                    ))
                })?;
                debug!("Reading archive {}", element.path.display());
                let file =
                    File::open(&element.path).map_err(|e| Error::io_at(&element.path, e))?;
                let archive = ZipArchive::new(BufReader::new(file))
                    .map_err(|e| Error::archive(handle.name(), e))?;
                Ok(SourceEntries::Archive {
                    handle,
                    archive,
                    next: 0,
                })
            }
            ElementKind::Unsupported => {
                debug!(
                    "Skipping unsupported classpath element {}",
                    element.path.display()
                );
                Ok(SourceEntries::Empty)
            }
        }
    }
}

/// Iterator over the regular entries of one classpath element
pub enum SourceEntries {
    Directory {
        root: PathBuf,
        walker: walkdir::IntoIter,
    },
    Archive {
        handle: ArchiveHandle,
        archive: ZipArchive<BufReader<File>>,
        next: usize,
    },
    Empty,
}

impl Iterator for SourceEntries {
    type Item = Result<SourceEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Directory { root, walker } => loop {
                let entry = match walker.next()? {
                    Ok(entry) => entry,
                    Err(e) => return Some(Err(e.into())),
                };
                if !is_regular_file(&entry) {
                    continue;
                }
                return Some(read_directory_entry(root, entry.path()));
            },
            Self::Archive {
                handle,
                archive,
                next,
            } => loop {
                if *next >= archive.len() {
                    return None;
                }
                let index = *next;
                *next += 1;

                match read_archive_entry(handle, archive, index) {
                    Ok(Some(entry)) => return Some(Ok(entry)),
                    Ok(None) => continue,
                    Err(e) => return Some(Err(e)),
                }
            },
            Self::Empty => None,
        }
    }
}

/// Regular files, including symlinks that resolve to one
fn is_regular_file(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
}

fn read_directory_entry(root: &Path, path: &Path) -> Result<SourceEntry> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| Error::Config(format!("{} escapes {}", path.display(), root.display())))?;
    let relative = relative_path_string(relative);
    let bytes = fs::read(path).map_err(|e| Error::io_at(path, e))?;

    Ok(SourceEntry {
        kind: EntryClassifier::classify(&relative),
        path: relative,
        bytes,
        origin: EntryOrigin::Directory,
        stored: false,
    })
}

/// Returns `Ok(None)` for directory markers
fn read_archive_entry(
    handle: &ArchiveHandle,
    archive: &mut ZipArchive<BufReader<File>>,
    index: usize,
) -> Result<Option<SourceEntry>> {
    let mut file = archive
        .by_index(index)
        .map_err(|e| Error::archive(handle.name(), e))?;

    if file.is_dir() {
        return Ok(None);
    }

    let path = file.name().to_string();
    let stored = file.compression() == CompressionMethod::Stored;
    // The declared size comes from the archive and may be corrupt
    let mut bytes = Vec::with_capacity(file.size().min(MAX_PREALLOC) as usize);
    file.read_to_end(&mut bytes)
        .map_err(|e| Error::archive(handle.name(), e.into()))?;

    Ok(Some(SourceEntry {
        kind: EntryClassifier::classify(&path),
        path,
        bytes,
        origin: EntryOrigin::Archive(handle.clone()),
        stored,
    }))
}

/// Join path components with `/` regardless of platform
fn relative_path_string(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
