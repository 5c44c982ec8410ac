// src/provenance.rs

//! Provenance tags carried by class payloads
//!
//! A class read from an archive remembers which output archive it belongs
//! to; a class read from a directory remembers nothing. The tag travels
//! through the rewrite engine as plain data and is only resolved to a live
//! archive writer when output is routed.

use crate::classpath::EntryOrigin;
use serde::Serialize;

/// Identifies one output archive
///
/// The handle is the file name of the input archive it mirrors. Output
/// archives are written to `<output>/<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ArchiveHandle(String);

impl ArchiveHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// File name of the output archive
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ArchiveHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Destination metadata of a class payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// No container recorded; routed to the loose output directory
    #[default]
    Unassigned,
    /// Routed into the named output archive
    Archive(ArchiveHandle),
}

impl Provenance {
    /// Provenance for a class read from the given container
    pub fn from_origin(origin: &EntryOrigin) -> Self {
        match origin {
            EntryOrigin::Directory => Self::Unassigned,
            EntryOrigin::Archive(handle) => Self::Archive(handle.clone()),
        }
    }

    /// The archive this payload routes to, if any
    pub fn archive(&self) -> Option<&ArchiveHandle> {
        match self {
            Self::Unassigned => None,
            Self::Archive(handle) => Some(handle),
        }
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unassigned => write!(f, "loose"),
            Self::Archive(handle) => write!(f, "archive:{}", handle),
        }
    }
}
