// src/pipeline.rs

//! The classpath transformation pipeline
//!
//! A run moves through a fixed sequence of stages:
//!
//! ```text
//! Init -> Discover -> Process -> Route -> Flush -> Closed
//! ```
//!
//! - **Init**: validate the configuration, delete and recreate the output
//!   directory.
//! - **Discover**: walk every classpath element, classify entries, parse
//!   transformer scripts, queue resources, then register transformers and
//!   classes with the engine.
//! - **Process**: one blocking engine call.
//! - **Route**: write directory resources and unassigned classes to the
//!   loose directory, queue archive classes.
//! - **Flush**: write and close every output archive.
//!
//! Any failure aborts the run. Nothing is written before Route, so a failed
//! discovery or engine call leaves the output directory empty.

use crate::classpath::{ClasspathElement, ElementKind, SourceWalker};
use crate::config::PipelineConfig;
use crate::engine::{ClassPayload, RewriteEngine};
use crate::error::{Error, Result};
use crate::output::OutputRouter;
use crate::provenance::Provenance;
use crate::transformer::{ScriptParser, TransformerRegistry};
use serde::Serialize;
use tracing::{debug, info};

/// Stage of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineStage {
    Init,
    Discover,
    Process,
    Route,
    Flush,
    Closed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Discover => "discover",
            Self::Process => "process",
            Self::Route => "route",
            Self::Flush => "flush",
            Self::Closed => "closed",
        }
    }

    /// The stage that follows this one
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Init => Some(Self::Discover),
            Self::Discover => Some(Self::Process),
            Self::Process => Some(Self::Route),
            Self::Route => Some(Self::Flush),
            Self::Flush => Some(Self::Closed),
            Self::Closed => None,
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statistics of a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub elements_walked: usize,
    pub elements_skipped: usize,
    pub entries_read: usize,
    pub transformers_registered: usize,
    pub classes_registered: usize,
    pub classes_returned: usize,
    pub resources_copied: usize,
    pub loose_classes: usize,
    pub archived_classes: usize,
    pub archives_written: usize,
    pub archive_entries_written: usize,
    pub duplicates_skipped: usize,
}

/// One run of the pipeline over a configuration
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    stage: PipelineStage,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self {
            config,
            stage: PipelineStage::Init,
        }
    }

    /// Current stage; `Closed` after a successful run
    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    fn advance(&mut self) {
        if let Some(next) = self.stage.next() {
            debug!("Pipeline stage {} -> {}", self.stage, next);
            self.stage = next;
        }
    }

    /// Execute the run
    ///
    /// On error the stage stays at the stage that failed.
    pub fn run<P, E>(&mut self, parser: &P, engine: &mut E) -> Result<RunSummary>
    where
        P: ScriptParser,
        E: RewriteEngine<Script = P::Script>,
    {
        if self.stage != PipelineStage::Init {
            return Err(Error::Config(format!(
                "pipeline already ran (stage {})",
                self.stage
            )));
        }

        let mut summary = RunSummary::default();

        // Init
        self.config.validate()?;
        let layout = self.config.layout();
        layout.reset()?;
        info!(
            "Transforming {} classpath elements into {}",
            self.config.classpath.len(),
            layout.root().display()
        );
        let mut router = OutputRouter::new(layout);
        self.advance();

        // Discover
        let mut registry = TransformerRegistry::new();
        let mut classes = Vec::new();

        for path in &self.config.classpath {
            let element = ClasspathElement::detect(path);
            debug!("Classpath element {} is {}", path.display(), element.kind.name());
            if element.kind == ElementKind::Unsupported {
                summary.elements_skipped += 1;
                continue;
            }
            summary.elements_walked += 1;

            // Mirror every input archive, even one with no entries
            if let Some(handle) = element.archive_handle() {
                router.open_archive(&handle)?;
            }

            for entry in SourceWalker::walk(&element)? {
                let entry = entry?;
                summary.entries_read += 1;

                if entry.kind.is_copied() {
                    registry.discover(parser, &entry)?;
                    router.queue_resource(entry)?;
                } else {
                    let provenance = Provenance::from_origin(&entry.origin);
                    classes.push(ClassPayload::new(entry.bytes, provenance));
                }
            }
        }

        for path in &self.config.transformers {
            registry.add_explicit(parser, path)?;
        }

        debug!(
            "Queued {} archive jobs before processing",
            router.queued_archive_jobs()
        );

        debug!("Transformer order: {:?}", registry.names());
        summary.transformers_registered = registry.register_with(engine);
        summary.classes_registered = classes.len();
        for payload in classes {
            engine.register_class(payload);
        }
        info!(
            "Registered {} transformers and {} classes",
            summary.transformers_registered, summary.classes_registered
        );
        self.advance();

        // Process
        let results = engine.process().map_err(Error::Engine)?;
        summary.classes_returned = results.len();
        self.advance();

        // Route
        router.write_loose_resources()?;
        for payload in results {
            router.route_class(payload)?;
        }
        debug!(
            "Queued {} archive jobs after routing classes, flushing {:?}",
            router.queued_archive_jobs(),
            router.archive_handles()
        );
        self.advance();

        // Flush
        let routed = router.flush()?;
        summary.resources_copied = routed.resources_copied;
        summary.loose_classes = routed.loose_classes;
        summary.archived_classes = routed.archived_classes;
        summary.archives_written = routed.archives_written;
        summary.archive_entries_written = routed.archive_entries_written;
        summary.duplicates_skipped = routed.duplicates_skipped;
        self.advance();

        info!(
            "Wrote {} archives and {} loose classes ({} resources copied)",
            summary.archives_written, summary.loose_classes, summary.resources_copied
        );
        Ok(summary)
    }
}

/// Run the pipeline once over `config`
pub fn run<P, E>(config: &PipelineConfig, parser: &P, engine: &mut E) -> Result<RunSummary>
where
    P: ScriptParser,
    E: RewriteEngine<Script = P::Script>,
{
    Pipeline::new(config).run(parser, engine)
}
