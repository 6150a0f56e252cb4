//! XDP Lab CLI
//!
//! Replays captured frames through one of the lab programs.
//!
//! # Usage
//!
//! ```bash
//! xdplab programs
//! xdplab check -c lab.yaml
//! xdplab run -p vlan -c lab.yaml -f frames.txt
//! xdplab run -p hhd-v2 -c lab.yaml -f frames.txt --workers 4 --format json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use xdplab_dataplane::programs::{self, ProgramKind};
use xdplab_dataplane::{Engine, EngineConfig, Frame, LabConfig, Tables};

mod frames;
mod output;

use output::{FrameReport, InterfaceReport, OutputFormat, Summary};

#[derive(Parser)]
#[command(name = "xdplab")]
#[command(version)]
#[command(about = "Replay frames through XDP lab programs", long_about = None)]
struct Cli {
    /// Lab configuration (YAML or JSON)
    #[arg(long, short, global = true, env = "XDPLAB_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available programs
    Programs,
    /// Validate the configuration and report table sizes
    Check,
    /// Run a frames file through a program
    Run {
        /// Program to attach
        #[arg(long, short)]
        program: ProgramKind,

        /// Frames file: `<ifindex> <hex bytes>` per line
        #[arg(long, short)]
        frames: String,

        /// Worker threads (defaults to available CPUs)
        #[arg(long, short)]
        workers: Option<usize>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Programs => {
            for kind in ProgramKind::ALL {
                println!("{}", kind);
            }
            Ok(())
        }
        Commands::Check => {
            let config = load_config(cli.config.as_ref())?;
            let tables = Tables::from_config(&config).context("invalid configuration")?;
            println!(
                "ok: {} interfaces, {} routes, {} thresholds, sketch {} x {}",
                config.interfaces.len(),
                tables.forwarding.route_count(),
                tables.thresholds.len(),
                config.sketch.entries,
                config.sketch.threshold
            );
            Ok(())
        }
        Commands::Run {
            program,
            frames,
            workers,
        } => {
            let config = load_config(cli.config.as_ref())?;
            run(&config, program, &frames, workers, cli.format)
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<LabConfig> {
    match path {
        Some(path) => LabConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => {
            tracing::info!("no config given, using defaults");
            Ok(LabConfig::default())
        }
    }
}

fn run(
    config: &LabConfig,
    kind: ProgramKind,
    frames_path: &str,
    workers: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let tables = Tables::from_config(config).context("invalid configuration")?;
    let program = programs::build(kind, config, &tables)
        .with_context(|| format!("cannot build program {}", kind))?;

    let records = frames::load(frames_path)?;
    let mut frames = Vec::with_capacity(records.len());
    for record in &records {
        let frame = Frame::from_bytes(record.ingress, &record.bytes)
            .with_context(|| format!("line {}: frame does not fit", record.line))?;
        frames.push(frame);
    }
    tracing::info!(program = %kind, frames = frames.len(), "replaying");

    let mut engine_config = EngineConfig::default();
    if let Some(workers) = workers {
        engine_config.workers = workers;
    }
    let engine = Engine::start(program, engine_config)?;
    let verdicts = engine.run_to_completion(frames)?;

    // Verdicts come back in submission order, one per record
    let reports: Vec<FrameReport> = records
        .iter()
        .zip(verdicts.iter())
        .map(|(record, verdict)| FrameReport {
            line: record.line,
            ingress: record.ingress,
            action: verdict.action,
            len: verdict.frame.len(),
            frame: hex::encode(verdict.frame.data()),
        })
        .collect();
    for report in &reports {
        format.print_frame(report);
    }

    let summary = Summary {
        program: kind.as_str(),
        engine: engine.stats(),
        interfaces: tables
            .stats
            .active()
            .into_iter()
            .map(|(ifindex, stats)| InterfaceReport { ifindex, stats })
            .collect(),
    };
    format.print_summary(&summary, &reports);

    Ok(())
}
