// src/lib.rs

//! Chasm classpath transformation
//!
//! Rewrites a build classpath through a pluggable class rewrite engine while
//! keeping its shape: every input archive comes back as an output archive of
//! the same name, and everything read from directories lands in one loose
//! output directory.
//!
//! # Architecture
//!
//! - `classpath`: element detection, entry walking and classification
//! - `provenance`: which output container a class belongs to
//! - `transformer`: script discovery, parsing and registration order
//! - `engine`: the rewrite engine interface and an identity engine
//! - `output`: loose directory writes and batched archive writers
//! - `pipeline`: the run itself, `Init -> Discover -> Process -> Route -> Flush`

pub mod class_file;
pub mod classpath;
pub mod config;
pub mod engine;
mod error;
pub mod output;
pub mod pipeline;
pub mod provenance;
pub mod transformer;

pub use classpath::{ClasspathElement, ElementKind, EntryClassifier, EntryKind, SourceEntry};
pub use config::{PipelineConfig, task_name};
pub use engine::{ClassPayload, PassthroughEngine, RewriteEngine};
pub use error::{Error, Result};
pub use output::{Destination, OutputLayout, OutputRouter};
pub use pipeline::{Pipeline, PipelineStage, RunSummary, run};
pub use provenance::{ArchiveHandle, Provenance};
pub use transformer::{ParsedScript, ScriptParser, StructuralParser, TransformerRegistry};
