/* src/cli/export/src/render/command.rs */

// Render artifacts produced by the frontend bundler run under a JS runtime.
// One process per render: request JSON on stdin, `{html, head, chunks}` on stdout.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::Deserialize;

use super::{RenderCollector, RenderFn, RenderRequest};
use crate::config::ExportConfig;
use crate::head::HeadMetadata;

/// Produces the render function for a batch.
pub trait RenderLoader: Send + Sync {
  fn load(&self, config: &ExportConfig) -> Result<Arc<dyn RenderFn>>;
}

impl<F> RenderLoader for F
where
  F: Fn(&ExportConfig) -> Result<Arc<dyn RenderFn>> + Send + Sync,
{
  fn load(&self, config: &ExportConfig) -> Result<Arc<dyn RenderFn>> {
    self(config)
  }
}

/// Loads the bundler's server build: `export.render_entry` when set,
/// otherwise the first `static.<hash>.js` in the assets directory.
pub struct ArtifactLoader;

impl RenderLoader for ArtifactLoader {
  fn load(&self, config: &ExportConfig) -> Result<Arc<dyn RenderFn>> {
    let entry = match &config.render_entry {
      Some(entry) if entry.is_file() => entry.clone(),
      Some(entry) => bail!("render entry not found: {}", entry.display()),
      None => discover_artifact(config.assets_dir())?,
    };
    let runtime = config.runtime.clone().unwrap_or_else(|| default_runtime().to_string());
    let cwd = config
      .config_file
      .as_deref()
      .and_then(Path::parent)
      .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    tracing::debug!(entry = %entry.display(), %runtime, "loaded render artifact");
    Ok(Arc::new(CommandRenderer { runtime, entry, cwd }))
  }
}

fn artifact_pattern() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"^static\.[A-Za-z0-9_-]+\.js$").unwrap())
}

/// Find the server render bundle (`static.<hash>.js`) inside `dir`.
pub fn discover_artifact(dir: &Path) -> Result<PathBuf> {
  let entries =
    std::fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
  let mut matches: Vec<PathBuf> = entries
    .filter_map(|e| e.ok())
    .filter(|e| e.file_name().to_str().is_some_and(|n| artifact_pattern().is_match(n)))
    .map(|e| e.path())
    .collect();
  matches.sort();
  match matches.into_iter().next() {
    Some(path) => Ok(path),
    None => bail!("no render artifact matching static.<hash>.js in {}", dir.display()),
  }
}

/// Check if a command exists on PATH.
fn which_exists(cmd: &str) -> bool {
  Command::new("which")
    .arg(cmd)
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .status()
    .map(|s| s.success())
    .unwrap_or(false)
}

fn default_runtime() -> &'static str {
  if which_exists("bun") { "bun" } else { "node" }
}

#[derive(Deserialize)]
struct ArtifactOutput {
  html: String,
  #[serde(default)]
  head: HeadMetadata,
  #[serde(default)]
  chunks: Vec<String>,
}

/// Runs `<runtime> <entry>` once per render.
pub struct CommandRenderer {
  pub runtime: String,
  pub entry: PathBuf,
  pub cwd: PathBuf,
}

impl RenderFn for CommandRenderer {
  fn render(&self, request: &RenderRequest<'_>, collector: &mut RenderCollector) -> Result<String> {
    let input = serde_json::to_vec(&serde_json::json!({
      "props": request.props(),
      "routeInfo": request.route_info,
      "staticURL": request.static_url,
    }))?;

    let mut child = Command::new(&self.runtime)
      .arg(&self.entry)
      .current_dir(&self.cwd)
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .spawn()
      .with_context(|| format!("failed to spawn {} for rendering", self.runtime))?;

    let mut stdin = child.stdin.take().context("render artifact stdin unavailable")?;
    // stdin is written on its own thread while stdout drains
    let (output, written) = std::thread::scope(|s| {
      let writer = s.spawn(move || stdin.write_all(&input));
      let output = child.wait_with_output();
      let written = writer.join().map_err(|_| anyhow::anyhow!("render stdin writer panicked"))?;
      Ok::<_, anyhow::Error>((output.context("failed to wait for render artifact")?, written))
    })?;

    // a crashed artifact usually closes stdin early; its stderr is the real error
    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      bail!("render artifact exited with status {}:\n{}", output.status, stderr.trim_end());
    }
    written.context("failed to send render request")?;

    let parsed: ArtifactOutput =
      serde_json::from_slice(&output.stdout).context("failed to parse render artifact output JSON")?;
    collector.add_head(parsed.head);
    for chunk in parsed.chunks {
      collector.report_chunk(chunk);
    }
    Ok(parsed.html)
  }
}
