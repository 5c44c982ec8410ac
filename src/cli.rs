// src/cli.rs
//! CLI definitions for chasm-classpath
//!
//! This module contains the command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chasm-classpath")]
#[command(version)]
#[command(about = "Transform a build classpath through the chasm rewrite engine")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transform a classpath into an output directory
    Run {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Classpath element (directory or jar); repeatable, appended to the config
        #[arg(long = "classpath", value_name = "PATH")]
        classpath: Vec<PathBuf>,

        /// Extra transformer script; repeatable, appended to the config
        #[arg(short, long = "transformer", value_name = "FILE")]
        transformers: Vec<PathBuf>,

        /// Output directory (deleted and rebuilt)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Name of the loose output subdirectory
        #[arg(long)]
        loose_dir: Option<String>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the transformed classpath of an output directory
    Classpath {
        /// Output directory of a previous run
        #[arg(short, long)]
        output: PathBuf,

        /// Name of the loose output subdirectory
        #[arg(long)]
        loose_dir: Option<String>,
    },
}
