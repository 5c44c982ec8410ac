// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use chasm_classpath::{ClassPayload, ParsedScript, Provenance, RewriteEngine};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive};

/// Smallest class file whose header names `name`
pub fn class_bytes(name: &str) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
    bytes.extend_from_slice(&0u16.to_be_bytes());
    bytes.extend_from_slice(&52u16.to_be_bytes());
    bytes.extend_from_slice(&3u16.to_be_bytes());
    bytes.push(1);
    bytes.extend_from_slice(&(name.len() as u16).to_be_bytes());
    bytes.extend_from_slice(name.as_bytes());
    bytes.push(7);
    bytes.extend_from_slice(&1u16.to_be_bytes());
    bytes.extend_from_slice(&0x0021u16.to_be_bytes());
    bytes.extend_from_slice(&2u16.to_be_bytes());
    bytes
}

/// Write a jar with the given deflated entries, in order, plus a leading
/// directory marker
pub fn write_jar(path: &Path, entries: &[(&str, &[u8])]) {
    let entries: Vec<_> = entries
        .iter()
        .map(|(name, bytes)| (*name, *bytes, CompressionMethod::Deflated))
        .collect();
    write_jar_with_methods(path, &entries);
}

/// Write a jar choosing the compression method of each entry
pub fn write_jar_with_methods(path: &Path, entries: &[(&str, &[u8], CompressionMethod)]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
    writer
        .add_directory("META-INF/", SimpleFileOptions::default())
        .unwrap();
    for (name, bytes, method) in entries {
        let options = SimpleFileOptions::default().compression_method(*method);
        writer.start_file(*name, options).unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap();
}

/// Write a file, creating parent directories
pub fn write_file(path: &Path, bytes: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bytes).unwrap();
}

/// All entries of a jar, in archive order
pub fn read_jar(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes).unwrap();
            (file.name().to_string(), bytes)
        })
        .collect()
}

/// Compression method of every entry in a jar
pub fn jar_methods(path: &Path) -> BTreeMap<String, CompressionMethod> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| {
            let file = archive.by_index(i).unwrap();
            (file.name().to_string(), file.compression())
        })
        .collect()
}

/// Every file under `root`, keyed by `/`-separated relative path
pub fn snapshot_dir(root: &Path) -> BTreeMap<String, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let relative = e
                .path()
                .strip_prefix(root)
                .unwrap()
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            (relative, fs::read(e.path()).unwrap())
        })
        .collect()
}

/// What an engine saw, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Transformer(String),
    Class(Provenance),
    Process,
}

type Rewrite = Box<dyn FnMut(ClassPayload) -> Vec<ClassPayload>>;

/// Engine that records every call and applies an optional rewrite
pub struct RecordingEngine {
    pub events: Vec<EngineEvent>,
    classes: Vec<ClassPayload>,
    rewrite: Rewrite,
    fail: bool,
}

impl RecordingEngine {
    /// Identity engine
    pub fn new() -> Self {
        Self::with_rewrite(|payload| vec![payload])
    }

    /// Engine mapping each class to zero or more output classes
    pub fn with_rewrite(rewrite: impl FnMut(ClassPayload) -> Vec<ClassPayload> + 'static) -> Self {
        Self {
            events: Vec::new(),
            classes: Vec::new(),
            rewrite: Box::new(rewrite),
            fail: false,
        }
    }

    /// Engine whose `process` call fails
    pub fn failing() -> Self {
        let mut engine = Self::new();
        engine.fail = true;
        engine
    }

    pub fn transformer_names(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::Transformer(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn processed(&self) -> bool {
        self.events.contains(&EngineEvent::Process)
    }
}

impl RewriteEngine for RecordingEngine {
    type Script = ParsedScript;

    fn register_transformer(&mut self, name: &str, _script: ParsedScript) {
        self.events.push(EngineEvent::Transformer(name.to_string()));
    }

    fn register_class(&mut self, payload: ClassPayload) {
        self.events.push(EngineEvent::Class(payload.provenance.clone()));
        self.classes.push(payload);
    }

    fn process(&mut self) -> anyhow::Result<Vec<ClassPayload>> {
        self.events.push(EngineEvent::Process);
        if self.fail {
            anyhow::bail!("engine failure requested by test");
        }
        let classes = std::mem::take(&mut self.classes);
        Ok(classes.into_iter().flat_map(&mut self.rewrite).collect())
    }
}
