// src/commands.rs
//! Command handlers for the chasm-classpath CLI

use anyhow::{Context, Result};
use chasm_classpath::output::{DEFAULT_LOOSE_DIR, OutputLayout};
use chasm_classpath::{PassthroughEngine, PipelineConfig, RunSummary, StructuralParser};
use std::path::PathBuf;
use tracing::info;

/// Options for the `run` command
pub struct RunOptions {
    pub config: Option<PathBuf>,
    pub classpath: Vec<PathBuf>,
    pub transformers: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub loose_dir: Option<String>,
    pub json: bool,
}

/// Merge a config file (if any) with command-line flags
///
/// Flags override scalar settings and append to the classpath and
/// transformer lists.
pub fn build_config(options: &RunOptions) -> Result<PipelineConfig> {
    let mut config = match (&options.config, &options.output) {
        (Some(path), _) => PipelineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        (None, Some(output)) => PipelineConfig::new(output),
        (None, None) => anyhow::bail!("either --config or --output is required"),
    };

    if let Some(output) = &options.output {
        config.output_dir = output.clone();
    }
    if let Some(loose_dir) = &options.loose_dir {
        config.loose_dir = loose_dir.clone();
    }
    config.classpath.extend(options.classpath.iter().cloned());
    config.transformers.extend(options.transformers.iter().cloned());

    Ok(config)
}

pub fn cmd_run(options: RunOptions) -> Result<()> {
    let config = build_config(&options)?;
    info!("Running chasm over {} classpath elements", config.classpath.len());

    let mut engine = PassthroughEngine::new();
    let summary = chasm_classpath::run(&config, &StructuralParser::new(), &mut engine)
        .context("Classpath transformation failed")?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&config, &summary);
    }
    Ok(())
}

fn print_summary(config: &PipelineConfig, summary: &RunSummary) {
    println!("Transformed classpath into {}", config.output_dir.display());
    println!(
        "  Elements: {} walked, {} skipped",
        summary.elements_walked, summary.elements_skipped
    );
    println!("  Transformers: {}", summary.transformers_registered);
    println!(
        "  Classes: {} in, {} out ({} loose, {} archived)",
        summary.classes_registered,
        summary.classes_returned,
        summary.loose_classes,
        summary.archived_classes
    );
    println!("  Resources copied: {}", summary.resources_copied);
    println!(
        "  Archives: {} ({} entries)",
        summary.archives_written, summary.archive_entries_written
    );
    if summary.duplicates_skipped > 0 {
        println!(
            "  Duplicate archive entries skipped: {}",
            summary.duplicates_skipped
        );
    }
}

pub fn cmd_classpath(output: PathBuf, loose_dir: Option<String>) -> Result<()> {
    let layout = OutputLayout::new(output)
        .with_loose_dir_name(loose_dir.unwrap_or_else(|| DEFAULT_LOOSE_DIR.to_string()));
    for entry in layout.classpath()? {
        println!("{}", entry.display());
    }
    Ok(())
}
