//! `routenet`: replay route network event files and build walks of interest.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use routenet_core::{
    CoreConfig, RegisterWalkOfInterest, RouteNetworkCore, RouteNetworkEditOperationOccurred,
};
use serde_json::Value;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "routenet", version, about = "Route network topology tools")]
struct Cli {
    /// JSON core config file (log level, log dir, journal path)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply edit-operation files to the graph and print a summary
    Replay {
        /// Files holding one message or an array of messages
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Replay files, then build a walk from segment ids
    Walk {
        /// Files holding one message or an array of messages
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Segment id, in walk order (repeatable)
        #[arg(long = "segment", required = true)]
        segments: Vec<Uuid>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    };
    let mut core = RouteNetworkCore::open(&config).context("failed to open route network core")?;

    match cli.command {
        Commands::Replay { files } => {
            replay_files(&mut core, &files)?;
            let snapshot = core.store().snapshot();
            println!(
                "version={} nodes={} segments={}",
                snapshot.version(),
                snapshot.node_count(),
                snapshot.segment_count()
            );
            Ok(())
        }
        Commands::Walk { files, segments } => {
            replay_files(&mut core, &files)?;
            let command = RegisterWalkOfInterest::new(Uuid::new_v4(), segments);
            let result = core
                .walk_service()
                .register_walk_of_interest(&command)
                .context("walk of interest rejected")?;
            for id in result.walk {
                println!("{id}");
            }
            Ok(())
        }
    }
}

fn replay_files(core: &mut RouteNetworkCore, files: &[PathBuf]) -> Result<()> {
    for path in files {
        for message in read_messages(path)? {
            let report = core
                .projector_mut()
                .apply(&message)
                .with_context(|| format!("failed to apply message from {}", path.display()))?;
            if report.rejected > 0 {
                eprintln!(
                    "warning: {}: {} event(s) rejected",
                    path.display(),
                    report.rejected
                );
            }
        }
    }
    Ok(())
}

fn read_messages(path: &Path) -> Result<Vec<RouteNetworkEditOperationOccurred>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let document: Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    let messages = match document {
        Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<_>, _>>(),
        single => serde_json::from_value(single).map(|message| vec![message]),
    };
    messages.with_context(|| format!("{} does not hold edit-operation messages", path.display()))
}
