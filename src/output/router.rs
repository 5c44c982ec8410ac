// src/output/router.rs

//! Routing of resources and class payloads to output containers

use super::container::{ArchiveContainer, WriteJob};
use super::OutputLayout;
use crate::class_file::ClassHeader;
use crate::classpath::{EntryOrigin, SourceEntry};
use crate::engine::ClassPayload;
use crate::error::{Error, Result};
use crate::provenance::ArchiveHandle;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Where a routed payload ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Written to this file under the loose output directory
    Loose(PathBuf),
    /// Queued as `path` in the named output archive
    Archive { handle: ArchiveHandle, path: String },
}

/// Counters gathered while routing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteStats {
    pub resources_copied: usize,
    pub loose_classes: usize,
    pub archived_classes: usize,
    pub archives_written: usize,
    pub archive_entries_written: usize,
    pub duplicates_skipped: usize,
}

/// Owns every output container for one run
///
/// Archive containers are keyed by handle, so two input archives with the
/// same file name share one output archive. Archives are flushed in handle
/// order.
pub struct OutputRouter {
    layout: OutputLayout,
    archives: BTreeMap<ArchiveHandle, ArchiveContainer>,
    loose_resources: Vec<(String, Vec<u8>)>,
    stats: RouteStats,
}

impl OutputRouter {
    pub fn new(layout: OutputLayout) -> Self {
        Self {
            layout,
            archives: BTreeMap::new(),
            loose_resources: Vec::new(),
            stats: RouteStats::default(),
        }
    }

    /// Get the container for `handle`, opening it if needed
    ///
    /// Fails if the handle is not a plain file name, since the archive would
    /// land outside the output directory.
    pub fn open_archive(&mut self, handle: &ArchiveHandle) -> Result<&mut ArchiveContainer> {
        self.layout.archive_path(handle.name())?;
        Ok(self.archives.entry(handle.clone()).or_insert_with(|| {
            debug!("Opened output archive {}", handle);
            ArchiveContainer::new(handle.clone())
        }))
    }

    /// Handles of all open archive containers, in flush order
    pub fn archive_handles(&self) -> Vec<&ArchiveHandle> {
        self.archives.keys().collect()
    }

    /// Total jobs queued across all archives
    pub fn queued_archive_jobs(&self) -> usize {
        self.archives.values().map(ArchiveContainer::len).sum()
    }

    /// Queue a resource against the container it was read from
    ///
    /// Bytes are kept verbatim. Directory resources are written to the loose
    /// directory by [`write_loose_resources`](Self::write_loose_resources).
    pub fn queue_resource(&mut self, entry: SourceEntry) -> Result<()> {
        match entry.origin {
            EntryOrigin::Directory => self.loose_resources.push((entry.path, entry.bytes)),
            EntryOrigin::Archive(handle) => {
                self.open_archive(&handle)?
                    .queue(WriteJob::resource(entry.path, entry.bytes, entry.stored));
            }
        }
        self.stats.resources_copied += 1;
        Ok(())
    }

    /// Write queued directory resources under the loose directory
    pub fn write_loose_resources(&mut self) -> Result<usize> {
        let resources = std::mem::take(&mut self.loose_resources);
        let count = resources.len();
        for (path, bytes) in resources {
            self.write_loose(&path, &bytes)?;
        }
        Ok(count)
    }

    /// Route one class payload returned by the engine
    ///
    /// The entry path comes from the class's own binary name. Unassigned
    /// payloads are written to the loose directory immediately; archive
    /// payloads are queued on their container, which is opened lazily.
    pub fn route_class(&mut self, payload: ClassPayload) -> Result<Destination> {
        let path = ClassHeader::parse(&payload.bytes)?.entry_path();

        match payload.provenance.archive() {
            None => {
                let target = self.write_loose(&path, &payload.bytes)?;
                self.stats.loose_classes += 1;
                Ok(Destination::Loose(target))
            }
            Some(handle) => {
                let handle = handle.clone();
                self.open_archive(&handle)?
                    .queue(WriteJob::class(path.clone(), payload.bytes));
                self.stats.archived_classes += 1;
                Ok(Destination::Archive { handle, path })
            }
        }
    }

    fn write_loose(&self, relative: &str, bytes: &[u8]) -> Result<PathBuf> {
        let target = self.layout.loose_path(relative)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io_at(parent, e))?;
        }
        fs::write(&target, bytes).map_err(|e| Error::io_at(&target, e))?;
        Ok(target)
    }

    /// Write and close every archive, consuming the router
    pub fn flush(mut self) -> Result<RouteStats> {
        let archives = std::mem::take(&mut self.archives);
        for (handle, container) in archives {
            let path = self.layout.archive_path(handle.name())?;
            let flushed = container.flush(&path)?;
            self.stats.archives_written += 1;
            self.stats.archive_entries_written += flushed.entries_written;
            self.stats.duplicates_skipped += flushed.duplicates_skipped;
        }
        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_file::tests::class_bytes;
    use crate::classpath::EntryClassifier;
    use crate::provenance::Provenance;
    use std::fs::File;
    use zip::ZipArchive;

    fn resource(path: &str, bytes: &[u8], origin: EntryOrigin) -> SourceEntry {
        SourceEntry {
            path: path.to_string(),
            kind: EntryClassifier::classify(path),
            bytes: bytes.to_vec(),
            origin,
            stored: false,
        }
    }

    fn archive_names(path: &std::path::Path) -> Vec<String> {
        let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        archive.file_names().map(str::to_string).collect()
    }

    #[test]
    fn test_route_unassigned_class_to_loose() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = OutputRouter::new(OutputLayout::new(dir.path()));

        let bytes = class_bytes("com/example/Bar");
        let destination = router
            .route_class(ClassPayload::new(bytes.clone(), Provenance::Unassigned))
            .unwrap();

        let expected = dir.path().join("chasm-added-files/com/example/Bar.class");
        assert_eq!(destination, Destination::Loose(expected.clone()));
        assert_eq!(fs::read(&expected).unwrap(), bytes);
    }

    #[test]
    fn test_route_archive_class_uses_binary_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = OutputRouter::new(OutputLayout::new(dir.path()));
        let handle = ArchiveHandle::new("foo.jar");

        // Payload path comes from the class header, not from any input path
        let destination = router
            .route_class(ClassPayload::new(
                class_bytes("renamed/Foo2"),
                Provenance::Archive(handle.clone()),
            ))
            .unwrap();
        assert_eq!(
            destination,
            Destination::Archive {
                handle: handle.clone(),
                path: "renamed/Foo2.class".to_string()
            }
        );

        // Archive opened lazily, nothing written yet
        assert_eq!(router.archive_handles(), vec![&handle]);
        assert!(!dir.path().join("foo.jar").exists());

        let stats = router.flush().unwrap();
        assert_eq!(stats.archives_written, 1);
        assert_eq!(
            archive_names(&dir.path().join("foo.jar")),
            vec!["renamed/Foo2.class"]
        );
    }

    #[test]
    fn test_resources_routed_to_origin() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = OutputRouter::new(OutputLayout::new(dir.path()));
        let handle = ArchiveHandle::new("lib.jar");

        let archived = resource("README.md", b"jar readme", EntryOrigin::Archive(handle.clone()));
        router.queue_resource(archived).unwrap();
        router
            .queue_resource(resource("data/info.txt", b"dir info", EntryOrigin::Directory))
            .unwrap();
        assert_eq!(router.queued_archive_jobs(), 1);

        // Directory resources are not written until asked
        let loose = dir.path().join("chasm-added-files/data/info.txt");
        assert!(!loose.exists());
        assert_eq!(router.write_loose_resources().unwrap(), 1);
        assert_eq!(fs::read(&loose).unwrap(), b"dir info");

        let stats = router.flush().unwrap();
        assert_eq!(stats.resources_copied, 2);
        assert_eq!(archive_names(&dir.path().join("lib.jar")), vec!["README.md"]);
    }

    #[test]
    fn test_invalid_class_payload_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = OutputRouter::new(OutputLayout::new(dir.path()));
        let payload = ClassPayload::new(vec![0, 1, 2], Provenance::Unassigned);
        let result = router.route_class(payload);
        assert!(matches!(result, Err(Error::ClassFormat(_))));
    }

    #[test]
    fn test_class_name_cannot_escape_loose_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = OutputRouter::new(OutputLayout::new(dir.path().join("out")));
        let result = router.route_class(ClassPayload::new(
            class_bytes("../../Evil"),
            Provenance::Unassigned,
        ));
        assert!(matches!(result, Err(Error::PathTraversal(_))));
    }

    #[test]
    fn test_same_handle_shares_container() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = OutputRouter::new(OutputLayout::new(dir.path()));
        let handle = ArchiveHandle::new("same.jar");
        router.open_archive(&handle).unwrap();
        for name in ["a.txt", "b.txt"] {
            let entry = resource(name, b"x", EntryOrigin::Archive(handle.clone()));
            router.queue_resource(entry).unwrap();
        }

        assert_eq!(router.archive_handles().len(), 1);
        let stats = router.flush().unwrap();
        assert_eq!(stats.archive_entries_written, 2);
    }

    #[test]
    fn test_archive_handle_cannot_escape_output() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("work/out");
        let mut router = OutputRouter::new(OutputLayout::new(&root));

        for name in ["../../escaped.jar", "/tmp/abs.jar", "nested/inner.jar"] {
            let result = router.route_class(ClassPayload::new(
                class_bytes("Gen"),
                Provenance::Archive(ArchiveHandle::new(name)),
            ));
            assert!(
                matches!(result, Err(Error::PathTraversal(_))),
                "accepted handle '{}'",
                name
            );
        }

        let stats = router.flush().unwrap();
        assert_eq!(stats.archives_written, 0);
        assert!(!dir.path().join("escaped.jar").exists());
    }
}
