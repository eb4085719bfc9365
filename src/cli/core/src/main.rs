/* src/cli/core/src/main.rs */

mod coordinator;
mod logging;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use seam_export::{
  BatchPayload, DEFAULT_CONCURRENCY, MessageSink, OutboundMessage, StdoutSink, Worker, WorkerExit,
};
use tokio::io::AsyncReadExt;

use coordinator::RunArgs;

#[derive(Parser)]
#[command(name = "seam-export", about = "SeamJS static exporter")]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Export one batch read from stdin, reporting progress as JSON lines on stdout
  Worker,
  /// Export a route list with a single worker process
  Run {
    /// Path to seam.toml (auto-detected if omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// JSON file with the routes to export
    #[arg(short, long)]
    routes: PathBuf,
    /// JSON file with site-wide data embedded into every page
    #[arg(long)]
    site_data: Option<PathBuf>,
    /// Client build stats (defaults to client-stats.json in the assets dir)
    #[arg(long)]
    client_stats: Option<PathBuf>,
    /// Routes exported concurrently when seam.toml sets no output_file_rate
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    rate: usize,
  },
}

async fn run_worker() -> Result<WorkerExit> {
  let mut input = Vec::new();
  tokio::io::stdin().read_to_end(&mut input).await.context("failed to read batch from stdin")?;

  let sink = Arc::new(StdoutSink);
  let payload = match BatchPayload::decode(&input) {
    Ok(payload) => payload,
    Err(err) => {
      tracing::error!(error = %err, "rejected batch");
      sink.send(OutboundMessage::error(&err))?;
      return Ok(WorkerExit::Fatal);
    }
  };

  let mut worker = Worker::new(sink);
  Ok(worker.handle_batch(payload).await)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
  logging::init();
  let cli = Cli::parse();

  match cli.command {
    Command::Worker => {
      let exit = run_worker().await?;
      if exit == WorkerExit::Fatal {
        std::process::exit(exit.code());
      }
    }
    Command::Run { config, routes, site_data, client_stats, rate } => {
      let args = RunArgs { config, routes, site_data, client_stats, default_rate: rate };
      coordinator::run_export(&args).await?;
    }
  }

  Ok(())
}
