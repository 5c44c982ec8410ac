// src/output/container.rs

//! Batched archive writer
//!
//! An output archive collects write jobs for the whole run and is written in
//! one pass at the end, since the final entry names of transformed classes
//! are only known once the engine has finished.

use crate::error::{Error, Result};
use crate::provenance::ArchiveHandle;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// One pending archive entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteJob {
    /// Entry name inside the archive
    pub path: String,
    pub bytes: Vec<u8>,
    pub compression: CompressionMethod,
}

impl WriteJob {
    /// Job for a resource copied from an input archive
    pub fn resource(path: impl Into<String>, bytes: Vec<u8>, stored: bool) -> Self {
        Self {
            path: path.into(),
            bytes,
            compression: if stored {
                CompressionMethod::Stored
            } else {
                CompressionMethod::Deflated
            },
        }
    }

    /// Job for a class payload returned by the engine
    pub fn class(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            bytes,
            compression: CompressionMethod::Deflated,
        }
    }
}

/// Outcome of flushing one archive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    pub entries_written: usize,
    pub duplicates_skipped: usize,
}

/// Writer state for one output archive
#[derive(Debug)]
pub struct ArchiveContainer {
    handle: ArchiveHandle,
    jobs: Vec<WriteJob>,
}

impl ArchiveContainer {
    pub fn new(handle: ArchiveHandle) -> Self {
        Self {
            handle,
            jobs: Vec::new(),
        }
    }

    /// Append a job to the queue
    pub fn queue(&mut self, job: WriteJob) {
        self.jobs.push(job);
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Write every queued job to `path` and finalize the archive
    ///
    /// Jobs are written in queue order. When several jobs target the same
    /// entry name the first one is written and the rest are skipped.
    /// Consuming `self` guarantees the archive is written at most once.
    pub fn flush(self, path: &Path) -> Result<FlushStats> {
        let name = self.handle.name().to_string();
        if self.is_empty() {
            debug!("Writing empty archive {}", name);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io_at(parent, e))?;
        }

        let file = File::create(path).map_err(|e| Error::io_at(path, e))?;
        let mut writer = ZipWriter::new(BufWriter::new(file));
        let mut written: HashSet<String> = HashSet::with_capacity(self.jobs.len());
        let mut stats = FlushStats::default();

        for job in self.jobs {
            if written.contains(&job.path) {
                warn!(
                    "Skipping duplicate entry {} in {} (first queued entry kept)",
                    job.path, name
                );
                stats.duplicates_skipped += 1;
                continue;
            }

            // Fixed timestamps keep repeated runs byte-identical
            let options = SimpleFileOptions::default()
                .compression_method(job.compression)
                .last_modified_time(DateTime::default());
            writer
                .start_file(job.path.as_str(), options)
                .map_err(|e| Error::archive(&name, e))?;
            writer
                .write_all(&job.bytes)
                .map_err(|e| Error::archive(&name, e.into()))?;

            written.insert(job.path);
            stats.entries_written += 1;
        }

        let mut inner = writer.finish().map_err(|e| Error::archive(&name, e))?;
        inner.flush().map_err(|e| Error::io_at(path, e))?;

        debug!(
            "Wrote {} entries to {}",
            stats.entries_written,
            path.display()
        );
        Ok(stats)
    }
}
