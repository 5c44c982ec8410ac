// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run {
            config,
            classpath,
            transformers,
            output,
            loose_dir,
            json,
        }) => commands::cmd_run(commands::RunOptions {
            config,
            classpath,
            transformers,
            output,
            loose_dir,
            json,
        }),
        Some(Commands::Classpath { output, loose_dir }) => {
            commands::cmd_classpath(output, loose_dir)
        }
        None => {
            // No command provided, show help
            println!("chasm-classpath v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'chasm-classpath --help' for usage information");
            Ok(())
        }
    }
}
