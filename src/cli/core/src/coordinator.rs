/* src/cli/core/src/coordinator.rs */

// Single-worker driver: the coordinator side of the export protocol.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use anyhow::{Context, Result, bail};
use seam_export::{
  BatchPayload, ClientStats, ErrorPayload, OutboundMessage, Route, find_seam_config,
  load_export_config,
};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::Command;

use crate::ui;

/// Stats file looked up in the assets directory when `--client-stats` is absent.
const CLIENT_STATS_FILE: &str = "client-stats.json";

pub(crate) struct RunArgs {
  pub config: Option<PathBuf>,
  pub routes: PathBuf,
  pub site_data: Option<PathBuf>,
  pub client_stats: Option<PathBuf>,
  pub default_rate: usize,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
  let content = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read {what} at {}", path.display()))?;
  serde_json::from_str(&content)
    .with_context(|| format!("failed to parse {what} at {}", path.display()))
}

/// Resolve seam.toml and the input files into the batch sent to the worker.
pub(crate) fn build_payload(args: &RunArgs, cwd: &Path) -> Result<BatchPayload> {
  let config_path = match &args.config {
    Some(p) => p.clone(),
    None => find_seam_config(cwd)?,
  };
  let config = load_export_config(&config_path)?;
  let routes: Vec<Route> = read_json(&args.routes, "routes")?;
  let site_data = match &args.site_data {
    Some(path) => read_json(path, "site data")?,
    None => Value::Null,
  };
  let client_stats = match &args.client_stats {
    Some(path) => ClientStats::from_file(path)?,
    None => {
      let fallback = config.assets_dir().join(CLIENT_STATS_FILE);
      if fallback.is_file() { ClientStats::from_file(&fallback)? } else { ClientStats::default() }
    }
  };
  Ok(BatchPayload {
    config,
    routes,
    default_output_file_rate: args.default_rate,
    site_data,
    client_stats,
  })
}

/// What the worker reported before its stdout closed.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct BatchOutcome {
  pub ticks: usize,
  pub error: Option<ErrorPayload>,
  pub done: bool,
}

/// Decode worker messages until stdout closes.
pub(crate) async fn read_messages<R: AsyncRead + Unpin>(
  reader: R,
  mut on_tick: impl FnMut(usize),
) -> Result<BatchOutcome> {
  let mut outcome = BatchOutcome::default();
  let mut lines = BufReader::new(reader).lines();
  while let Some(line) = lines.next_line().await.context("failed to read from export worker")? {
    if line.trim().is_empty() {
      continue;
    }
    match OutboundMessage::decode(&line)? {
      OutboundMessage::Tick => {
        outcome.ticks += 1;
        on_tick(outcome.ticks);
      }
      OutboundMessage::Error { err } => outcome.error = Some(err),
      OutboundMessage::Done => outcome.done = true,
    }
  }
  Ok(outcome)
}

/// Turn the worker's report and exit status into the run result.
pub(crate) fn finish(outcome: BatchOutcome, status: ExitStatus) -> Result<usize> {
  if let Some(err) = outcome.error {
    bail!("{} ({} error)", err.message, err.kind);
  }
  if !status.success() {
    bail!("export worker exited with status {status}");
  }
  if !outcome.done {
    bail!("export worker exited before finishing the batch");
  }
  Ok(outcome.ticks)
}

/// Spawn this binary as a worker, feed it the batch and follow its progress.
pub(crate) async fn run_export(args: &RunArgs) -> Result<()> {
  let cwd = std::env::current_dir().context("failed to get cwd")?;
  let payload = build_payload(args, &cwd)?;
  let total = payload.routes.len();
  let dist = payload.config.dist.clone();
  let input = serde_json::to_vec(&payload).context("failed to encode batch")?;

  ui::banner("export");
  ui::arrow(&format!("exporting {total} routes to {}", dist.display()));

  let exe = std::env::current_exe().context("failed to locate current executable")?;
  let mut child = Command::new(&exe)
    .arg("worker")
    .current_dir(&cwd)
    .stdin(Stdio::piped())
    .stdout(Stdio::piped())
    .stderr(Stdio::inherit())
    .kill_on_drop(true)
    .spawn()
    .with_context(|| format!("failed to start {}", exe.display()))?;

  let mut stdin = child.stdin.take().context("worker stdin unavailable")?;
  let stdout = child.stdout.take().context("worker stdout unavailable")?;
  let writer = async move {
    stdin.write_all(&input).await.context("failed to send batch to worker")?;
    stdin.shutdown().await.context("failed to close worker stdin")
  };
  let (written, outcome) = tokio::join!(writer, read_messages(stdout, |n| ui::progress(n, total)));
  let status = child.wait().await.context("failed to wait for export worker")?;
  let outcome = outcome?;

  match finish(outcome, status) {
    Ok(ticks) => {
      written?;
      ui::ok(&format!("exported {ticks} routes"));
      ui::blank();
      Ok(())
    }
    Err(e) => {
      ui::fail("export failed");
      ui::detail(&format!("{e:#}"));
      Err(e)
    }
  }
}
