/* src/cli/export/src/assets.rs */

// Resolve the chunk names reported during a render into the script and
// stylesheet files the document has to reference.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Files emitted for one chunk; bundlers write either a single name or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChunkFiles {
  One(String),
  Many(Vec<String>),
}

impl ChunkFiles {
  fn iter(&self) -> impl Iterator<Item = &str> {
    let files: &[String] = match self {
      Self::One(f) => std::slice::from_ref(f),
      Self::Many(fs) => fs,
    };
    files.iter().map(String::as_str)
  }
}

/// Client build stats produced by the bundler. `publicPath` is ignored:
/// asset URLs come out root-relative and the rewrite pass prefixes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientStats {
  pub assets_by_chunk_name: BTreeMap<String, ChunkFiles>,
  /// Chunks loaded before any route chunk (runtime, vendor).
  pub bootstrap: Vec<String>,
  /// Chunks loaded after the route chunks (the app entry).
  pub entrypoints: Vec<String>,
  /// Stylesheet contents keyed by file, for inline CSS.
  pub css_contents: BTreeMap<String, String>,
}

impl Default for ClientStats {
  fn default() -> Self {
    Self {
      assets_by_chunk_name: BTreeMap::new(),
      bootstrap: vec!["bootstrap".to_string(), "vendor".to_string()],
      entrypoints: vec!["main".to_string()],
      css_contents: BTreeMap::new(),
    }
  }
}

/// Script and stylesheet references needed by one rendered route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClientAssets {
  pub scripts: Vec<String>,
  pub stylesheets: Vec<String>,
  pub css: BTreeMap<String, String>,
}

impl ClientAssets {
  /// All known stylesheet contents concatenated in stylesheet order.
  pub fn inline_css(&self) -> Option<String> {
    let parts: Vec<&str> =
      self.stylesheets.iter().filter_map(|s| self.css.get(s).map(String::as_str)).collect();
    if parts.is_empty() { None } else { Some(parts.concat()) }
  }
}

impl ClientStats {
  pub fn from_file(path: &Path) -> Result<Self> {
    let content = std::fs::read_to_string(path)
      .with_context(|| format!("failed to read client stats at {}", path.display()))?;
    serde_json::from_str(&content)
      .with_context(|| format!("failed to parse client stats at {}", path.display()))
  }

  /// Resolve bootstrap chunks, then the chunks used by the render, then the
  /// entry chunks. Unknown chunk names are skipped; each file appears once.
  pub fn resolve<S: AsRef<str>>(&self, used_chunks: &[S]) -> ClientAssets {
    let order = self
      .bootstrap
      .iter()
      .map(String::as_str)
      .chain(used_chunks.iter().map(AsRef::as_ref))
      .chain(self.entrypoints.iter().map(String::as_str));

    let mut seen = HashSet::new();
    let mut assets = ClientAssets::default();
    for chunk in order {
      let Some(files) = self.assets_by_chunk_name.get(chunk) else {
        continue;
      };
      for file in files.iter() {
        if is_ignored_file(file) || !seen.insert(file) {
          continue;
        }
        if file.ends_with(".js") {
          assets.scripts.push(file.to_string());
        } else if file.ends_with(".css") {
          if let Some(content) = self.css_contents.get(file) {
            assets.css.insert(file.to_string(), content.clone());
          }
          assets.stylesheets.push(file.to_string());
        }
      }
    }
    assets
  }
}

fn is_ignored_file(file: &str) -> bool {
  file.ends_with(".map") || file.contains(".hot-update.")
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn stats() -> ClientStats {
    serde_json::from_value(json!({
      "assetsByChunkName": {
        "bootstrap": "bootstrap.1a.js",
        "main": ["main.2b.js", "main.2b.css", "main.2b.js.map"],
        "src/containers/Post": ["post.3c.js", "post.3c.css"],
        "src/containers/About": "about.4d.js",
      },
      "cssContents": { "post.3c.css": ".post{color:red}" },
    }))
    .unwrap()
  }

  #[test]
  fn bundler_public_path_does_not_leak_into_assets() {
    let stats: ClientStats = serde_json::from_value(json!({
      "publicPath": "https://cdn.example.com/",
      "assetsByChunkName": { "main": "main.2b.js" },
    }))
    .unwrap();
    assert_eq!(stats.resolve::<&str>(&[]).scripts, vec!["main.2b.js"]);
  }

  #[test]
  fn defaults_apply_when_fields_missing() {
    let stats = stats();
    assert_eq!(stats.bootstrap, vec!["bootstrap", "vendor"]);
    assert_eq!(stats.entrypoints, vec!["main"]);
  }

  #[test]
  fn orders_bootstrap_used_then_entry() {
    let assets = stats().resolve(&["src/containers/Post"]);
    assert_eq!(assets.scripts, vec!["bootstrap.1a.js", "post.3c.js", "main.2b.js"]);
    assert_eq!(assets.stylesheets, vec!["post.3c.css", "main.2b.css"]);
  }

  #[test]
  fn skips_source_maps_and_unknown_chunks() {
    let assets = stats().resolve(&["does/not/exist"]);
    assert!(!assets.scripts.iter().any(|s| s.ends_with(".map")));
    assert_eq!(assets.scripts, vec!["bootstrap.1a.js", "main.2b.js"]);
  }

  #[test]
  fn dedupes_repeated_chunks() {
    let assets = stats().resolve(&["src/containers/About", "src/containers/About", "main"]);
    assert_eq!(assets.scripts, vec!["bootstrap.1a.js", "about.4d.js", "main.2b.js"]);
  }

  #[test]
  fn css_contents_follow_used_stylesheets() {
    let assets = stats().resolve(&["src/containers/Post"]);
    assert_eq!(assets.css.len(), 1);
    assert_eq!(assets.inline_css().as_deref(), Some(".post{color:red}"));
    assert!(stats().resolve::<&str>(&[]).inline_css().is_none());
  }

  #[test]
  fn empty_stats_resolve_to_nothing() {
    let assets = ClientStats::default().resolve(&["anything"]);
    assert_eq!(assets, ClientAssets::default());
  }
}
