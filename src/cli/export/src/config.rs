/* src/cli/export/src/config.rs */

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

pub const PUBLIC_PATH_ENV: &str = "SEAM_PUBLIC_PATH";
pub const DISABLE_ROUTE_PREFIXING_ENV: &str = "SEAM_DISABLE_ROUTE_PREFIXING";

/// `[export]` section of seam.toml, also sent inline in the batch payload.
/// Serialised camelCase like the rest of the payload; the snake_case
/// spellings used in seam.toml are accepted as aliases.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportConfig {
  /// seam.toml this config was loaded from; workers reload it on every batch.
  #[serde(default, skip_serializing_if = "Option::is_none", alias = "config_file")]
  pub config_file: Option<PathBuf>,
  #[serde(default = "default_dist")]
  pub dist: PathBuf,
  /// Directory holding build artifacts; defaults to `dist`.
  #[serde(default)]
  pub assets: Option<PathBuf>,
  #[serde(default, alias = "base_path")]
  pub base_path: Option<String>,
  /// Routes exported concurrently per worker; 0 or absent uses the batch default.
  #[serde(default, alias = "output_file_rate")]
  pub output_file_rate: Option<usize>,
  #[serde(default, alias = "inline_css")]
  pub inline_css: bool,
  /// Explicit render artifact; otherwise discovered in `assets`.
  #[serde(default, alias = "render_entry")]
  pub render_entry: Option<PathBuf>,
  /// JS runtime used to execute the render artifact (`bun` or `node`).
  #[serde(default)]
  pub runtime: Option<String>,
  /// Document template file containing a `<!--seam:outlet-->` marker.
  #[serde(default)]
  pub document: Option<PathBuf>,
}

fn default_dist() -> PathBuf {
  PathBuf::from("dist")
}

impl Default for ExportConfig {
  fn default() -> Self {
    Self {
      config_file: None,
      dist: default_dist(),
      assets: None,
      base_path: None,
      output_file_rate: None,
      inline_css: false,
      render_entry: None,
      runtime: None,
      document: None,
    }
  }
}

#[derive(Debug, Default, Deserialize)]
struct SeamFile {
  #[serde(default)]
  export: ExportConfig,
}

impl ExportConfig {
  pub fn assets_dir(&self) -> &Path {
    self.assets.as_deref().unwrap_or(&self.dist)
  }

  /// Base path without surrounding slashes; empty when unset.
  pub fn base_path(&self) -> &str {
    self.base_path.as_deref().map_or("", |b| b.trim_matches('/'))
  }

  pub fn concurrency(&self, batch_default: usize) -> usize {
    self.output_file_rate.filter(|n| *n > 0).unwrap_or(batch_default)
  }

  pub fn validate(&self) -> Result<()> {
    if self.dist.as_os_str().is_empty() {
      bail!("export.dist must not be empty");
    }
    if self.base_path().contains("//") {
      bail!("export.base_path \"{}\" contains an empty segment", self.base_path());
    }
    Ok(())
  }

  /// Re-resolve the config inside a worker: reload from seam.toml when the
  /// coordinator loaded it from one, otherwise validate the inline copy.
  pub fn reresolve(&self) -> Result<Self> {
    match &self.config_file {
      Some(path) => load_export_config(path),
      None => {
        self.validate()?;
        Ok(self.clone())
      }
    }
  }

  fn resolve_relative(mut self, base_dir: &Path) -> Self {
    let join = |p: &Path| if p.is_absolute() { p.to_path_buf() } else { base_dir.join(p) };
    self.dist = join(&self.dist);
    self.assets = self.assets.as_deref().map(join);
    self.render_entry = self.render_entry.as_deref().map(join);
    self.document = self.document.as_deref().map(join);
    self
  }
}

/// Walk upward from `start` to find `seam.toml`, like Cargo.toml discovery
pub fn find_seam_config(start: &Path) -> Result<PathBuf> {
  let mut dir =
    start.canonicalize().with_context(|| format!("failed to canonicalize {}", start.display()))?;
  loop {
    let candidate = dir.join("seam.toml");
    if candidate.is_file() {
      return Ok(candidate);
    }
    if !dir.pop() {
      bail!("seam.toml not found (searched upward from {})", start.display());
    }
  }
}

/// Parse the `[export]` section; relative paths resolve against the file's directory.
pub fn load_export_config(path: &Path) -> Result<ExportConfig> {
  let content =
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
  let file: SeamFile =
    toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))?;
  let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
  let mut config = file.export.resolve_relative(base_dir);
  config.config_file = Some(path.to_path_buf());
  config.validate()?;
  Ok(config)
}

/// Environment switches for the URL rewrite pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
  pub public_path: String,
  /// `false` when href prefixing is disabled; src prefixing always runs.
  pub prefix_hrefs: bool,
  pub base_path: String,
}

impl Default for RewriteOptions {
  fn default() -> Self {
    Self { public_path: "/".to_string(), prefix_hrefs: true, base_path: String::new() }
  }
}

impl RewriteOptions {
  pub fn from_env() -> Self {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
    let public_path =
      lookup(PUBLIC_PATH_ENV).filter(|p| !p.is_empty()).unwrap_or_else(|| "/".to_string());
    let prefix_hrefs = lookup(DISABLE_ROUTE_PREFIXING_ENV).as_deref() != Some("true");
    Self { public_path, prefix_hrefs, base_path: String::new() }
  }

  pub fn with_base_path(mut self, base_path: &str) -> Self {
    self.base_path = base_path.trim_matches('/').to_string();
    self
  }
}
