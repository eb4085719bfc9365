/* src/cli/export/src/error.rs */

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop a route (or a whole batch) from being exported.
#[derive(Debug, Error)]
pub enum ExportError {
  /// The render function failed for one route.
  #[error("Failed exporting HTML for URL {route_path} ({component}): {message}")]
  Render { route_path: String, component: String, message: String },

  /// Writing one of the route's output files failed.
  #[error("failed to write {}: {message}", path.display())]
  Write { path: PathBuf, message: String },

  /// Batch-level setup (config re-resolution, render/document loading) failed.
  #[error("export setup failed: {0}")]
  Setup(String),

  /// A protocol message could not be decoded or sent.
  #[error("protocol error: {0}")]
  Protocol(String),
}

impl ExportError {
  pub fn render(route_path: &str, component: &str, err: &anyhow::Error) -> Self {
    Self::Render {
      route_path: route_path.to_string(),
      component: component.to_string(),
      message: format!("{err:#}"),
    }
  }

  pub fn write(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
    Self::Write { path: path.into(), message: err.to_string() }
  }

  pub fn setup(msg: impl Into<String>) -> Self {
    Self::Setup(msg.into())
  }

  /// Short machine-readable tag carried in the protocol's error payload.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Render { .. } => "render",
      Self::Write { .. } => "write",
      Self::Setup(_) => "setup",
      Self::Protocol(_) => "protocol",
    }
  }

  /// Setup failures are reported but do not terminate the worker process.
  pub fn is_fatal(&self) -> bool {
    !matches!(self, Self::Setup(_))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn render_error_carries_route_context() {
    let err = ExportError::render("blog/post", "Post", &anyhow::anyhow!("props.title is undefined"));
    assert_eq!(
      err.to_string(),
      "Failed exporting HTML for URL blog/post (Post): props.title is undefined"
    );
    assert_eq!(err.kind(), "render");
    assert!(err.is_fatal());
  }

  #[test]
  fn render_error_keeps_context_chain() {
    let inner = anyhow::anyhow!("exit status 1").context("render artifact failed");
    let err = ExportError::render("/", "Home", &inner);
    assert!(err.to_string().contains("render artifact failed: exit status 1"));
  }

  #[test]
  fn write_error_names_path() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err = ExportError::write("/tmp/dist/a/index.html", &io);
    assert_eq!(err.to_string(), "failed to write /tmp/dist/a/index.html: denied");
    assert_eq!(err.kind(), "write");
  }

  #[test]
  fn setup_error_is_not_fatal() {
    let err = ExportError::setup("render artifact not found");
    assert_eq!(err.kind(), "setup");
    assert!(!err.is_fatal());
  }
}
