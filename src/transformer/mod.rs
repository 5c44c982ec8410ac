// src/transformer/mod.rs

//! Transformer discovery and registration order
//!
//! Transformers come from three places and are registered with the engine
//! in this fixed group order:
//!
//! | Group | Source | Name |
//! |-------|--------|------|
//! | 1 | scripts in directory classpath elements | relative path |
//! | 2 | scripts in archive classpath elements | entry name |
//! | 3 | explicitly configured script files | file path |
//!
//! Within a group, scripts keep the order they were discovered in. The
//! engine may resolve overlapping rewrites by registration order, so this
//! order must be reproducible run to run.

mod script;

pub use script::{ParsedScript, ScriptParser, StructuralParser};

use crate::classpath::{EntryKind, EntryOrigin, SourceEntry};
use crate::engine::RewriteEngine;
use crate::error::{Error, Result};
use std::path::Path;
use tracing::debug;

/// Where a transformer was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScriptOrigin {
    Directory,
    Archive,
    Explicit,
}

impl ScriptOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::Archive => "archive",
            Self::Explicit => "explicit",
        }
    }
}

/// A parsed transformer waiting to be registered
#[derive(Debug, Clone)]
pub struct TransformerRegistration<S> {
    pub name: String,
    pub origin: ScriptOrigin,
    pub script: S,
}

/// Ordered collection of discovered transformers
#[derive(Debug)]
pub struct TransformerRegistry<S> {
    directory: Vec<TransformerRegistration<S>>,
    archive: Vec<TransformerRegistration<S>>,
    explicit: Vec<TransformerRegistration<S>>,
}

impl<S> Default for TransformerRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> TransformerRegistry<S> {
    pub fn new() -> Self {
        Self {
            directory: Vec::new(),
            archive: Vec::new(),
            explicit: Vec::new(),
        }
    }

    /// Parse a transformer script found on the classpath
    ///
    /// Entries that are not transformer scripts are ignored. Returns whether
    /// the entry was registered.
    pub fn discover<P>(&mut self, parser: &P, entry: &SourceEntry) -> Result<bool>
    where
        P: ScriptParser<Script = S>,
    {
        if entry.kind != EntryKind::TransformerScript {
            return Ok(false);
        }

        let script = parser.parse(&entry.path, &entry.bytes)?;
        let (origin, group) = match entry.origin {
            EntryOrigin::Directory => (ScriptOrigin::Directory, &mut self.directory),
            EntryOrigin::Archive(_) => (ScriptOrigin::Archive, &mut self.archive),
        };
        debug!("Discovered {} transformer {}", origin.as_str(), entry.path);
        group.push(TransformerRegistration {
            name: entry.path.clone(),
            origin,
            script,
        });
        Ok(true)
    }

    /// Read and parse an explicitly configured transformer file
    pub fn add_explicit<P>(&mut self, parser: &P, path: &Path) -> Result<()>
    where
        P: ScriptParser<Script = S>,
    {
        let source = std::fs::read(path).map_err(|e| Error::io_at(path, e))?;
        let name = path.to_string_lossy().into_owned();
        let script = parser.parse(&name, &source)?;
        debug!("Added explicit transformer {}", name);
        self.explicit.push(TransformerRegistration {
            name,
            origin: ScriptOrigin::Explicit,
            script,
        });
        Ok(())
    }

    /// Registrations in engine order
    pub fn iter(&self) -> impl Iterator<Item = &TransformerRegistration<S>> {
        self.directory
            .iter()
            .chain(self.archive.iter())
            .chain(self.explicit.iter())
    }

    /// Script names in engine order
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.directory.len() + self.archive.len() + self.explicit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hand every transformer to the engine, consuming the registry
    ///
    /// Returns the number of transformers registered.
    pub fn register_with<E>(self, engine: &mut E) -> usize
    where
        E: RewriteEngine<Script = S>,
    {
        let count = self.len();
        for registration in self
            .directory
            .into_iter()
            .chain(self.archive)
            .chain(self.explicit)
        {
            engine.register_transformer(&registration.name, registration.script);
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::EntryClassifier;
    use crate::engine::PassthroughEngine;
    use crate::provenance::ArchiveHandle;

    fn entry(path: &str, origin: EntryOrigin) -> SourceEntry {
        SourceEntry {
            path: path.to_string(),
            kind: EntryClassifier::classify(path),
            bytes: b"{ }".to_vec(),
            origin,
            stored: false,
        }
    }

    fn archive() -> EntryOrigin {
        EntryOrigin::Archive(ArchiveHandle::new("lib.jar"))
    }

    #[test]
    fn test_group_order_independent_of_discovery_order() {
        let parser = StructuralParser::new();
        let mut registry = TransformerRegistry::new();

        // Archive scripts discovered before directory scripts
        registry
            .discover(&parser, &entry("org/quiltmc/chasm/transformers/j1.chasm", archive()))
            .unwrap();
        registry
            .discover(
                &parser,
                &entry("org/quiltmc/chasm/transformers/d1.chasm", EntryOrigin::Directory),
            )
            .unwrap();
        registry
            .discover(&parser, &entry("org/quiltmc/chasm/transformers/j2.chasm", archive()))
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("explicit.chasm");
        std::fs::write(&explicit, b"{ id: \"x\" }").unwrap();
        registry.add_explicit(&parser, &explicit).unwrap();

        let names = registry.names();
        assert_eq!(
            names,
            vec![
                "org/quiltmc/chasm/transformers/d1.chasm",
                "org/quiltmc/chasm/transformers/j1.chasm",
                "org/quiltmc/chasm/transformers/j2.chasm",
                explicit.to_str().unwrap(),
            ]
        );
        let origins: Vec<ScriptOrigin> = registry.iter().map(|r| r.origin).collect();
        assert_eq!(
            origins,
            vec![
                ScriptOrigin::Directory,
                ScriptOrigin::Archive,
                ScriptOrigin::Archive,
                ScriptOrigin::Explicit
            ]
        );
    }

    #[test]
    fn test_non_scripts_ignored() {
        let parser = StructuralParser::new();
        let mut registry = TransformerRegistry::new();
        assert!(!registry.discover(&parser, &entry("README.md", archive())).unwrap());
        assert!(
            !registry
                .discover(&parser, &entry("org/quiltmc/chasm/transformers/A.class", archive()))
                .unwrap()
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_malformed_script_fails() {
        let parser = StructuralParser::new();
        let mut registry = TransformerRegistry::new();
        let mut bad = entry("org/quiltmc/chasm/transformers/bad.chasm", archive());
        bad.bytes = b"{ unclosed".to_vec();

        let err = registry.discover(&parser, &bad).unwrap_err();
        match err {
            Error::ScriptParse { name, .. } => {
                assert_eq!(name, "org/quiltmc/chasm/transformers/bad.chasm")
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let parser = StructuralParser::new();
        let mut registry: TransformerRegistry<ParsedScript> = TransformerRegistry::new();
        let result = registry.add_explicit(&parser, Path::new("/nonexistent/x.chasm"));
        assert!(matches!(result, Err(Error::PathIo { .. })));
    }

    #[test]
    fn test_register_with_engine() {
        let parser = StructuralParser::new();
        let mut registry = TransformerRegistry::new();
        registry
            .discover(&parser, &entry("org/quiltmc/chasm/transformers/j.chasm", archive()))
            .unwrap();
        registry
            .discover(
                &parser,
                &entry("org/quiltmc/chasm/transformers/d.chasm", EntryOrigin::Directory),
            )
            .unwrap();

        let mut engine = PassthroughEngine::new();
        assert_eq!(registry.register_with(&mut engine), 2);
        assert_eq!(
            engine.transformer_names(),
            vec![
                "org/quiltmc/chasm/transformers/d.chasm",
                "org/quiltmc/chasm/transformers/j.chasm"
            ]
        );
    }
}
