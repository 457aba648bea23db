use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use weld::di;

#[derive(Parser)]
#[command(name = "weld")]
#[command(about = "Generate dependency wiring functions for Go", long_about = None)]
struct Cli {
    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a provider graph and generate the function that builds it
    Di(di::Command),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug { "trace" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(cli.debug)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Di(command) => handle_di(command),
    }
}

fn handle_di(command: di::Command) -> Result<()> {
    let generated = command.run()?;

    if let Some(tree) = &generated.tree {
        eprintln!("{}", tree);
    }

    let output = generated.output();
    match &command.output {
        Some(path) => {
            fs::write(path, &output).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(output.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
