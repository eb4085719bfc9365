/* src/cli/export/src/output.rs */

use std::path::{Component, Path, PathBuf};

use crate::error::ExportError;
use crate::route::{Route, RouteInfo};

/// Where a route's files land under `dist`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
  pub html: PathBuf,
  /// `None` for redirects, which persist no route info.
  pub route_info: Option<PathBuf>,
}

impl OutputPaths {
  pub fn for_route(dist: &Path, route: &Route) -> Result<Self, ExportError> {
    let relative = route.path.trim_matches('/');
    let dir = dist.join(relative);
    if Path::new(relative).components().any(|c| !matches!(c, Component::Normal(_))) {
      return Err(ExportError::Write {
        path: dir,
        message: format!("route path {:?} escapes the output directory", route.path),
      });
    }
    let html = if route.is_not_found() { dist.join("404.html") } else { dir.join("index.html") };
    let route_info = (!route.is_redirect()).then(|| dir.join("routeInfo.json"));
    Ok(Self { html, route_info })
  }
}

async fn write_file(path: &Path, contents: &[u8]) -> Result<(), ExportError> {
  if let Some(parent) = path.parent() {
    tokio::fs::create_dir_all(parent).await.map_err(|e| ExportError::write(parent, &e))?;
  }
  tokio::fs::write(path, contents).await.map_err(|e| ExportError::write(path, &e))
}

/// Write `index.html` (or `404.html`) and, for non-redirects, `routeInfo.json`.
pub async fn write_route_output(
  dist: &Path,
  route: &Route,
  html: &str,
  route_info: &RouteInfo,
) -> Result<OutputPaths, ExportError> {
  let paths = OutputPaths::for_route(dist, route)?;
  let html_write = write_file(&paths.html, html.as_bytes());
  match &paths.route_info {
    Some(info_path) => {
      let json = serde_json::to_vec(route_info).map_err(|e| ExportError::Write {
        path: info_path.clone(),
        message: e.to_string(),
      })?;
      tokio::try_join!(html_write, write_file(info_path, &json))?;
    }
    None => html_write.await?,
  }
  Ok(paths)
}

#[cfg(test)]
mod tests {
  use serde_json::Value;

  use super::*;
  use crate::route::test_route;

  #[tokio::test]
  async fn writes_html_and_route_info() {
    let dist = tempfile::tempdir().unwrap();
    let route = test_route("/blog/post-1/");
    let info = RouteInfo::from(&route);
    write_route_output(dist.path(), &route, "<p>x</p>", &info).await.unwrap();

    let dir = dist.path().join("blog/post-1");
    assert_eq!(std::fs::read_to_string(dir.join("index.html")).unwrap(), "<p>x</p>");
    let saved: Value =
      serde_json::from_str(&std::fs::read_to_string(dir.join("routeInfo.json")).unwrap()).unwrap();
    assert_eq!(saved["templateID"], "tmpl-0");
    assert_eq!(saved["localProps"]["slug"], "/blog/post-1/");
    assert!(saved.get("allProps").is_none());
  }

  #[tokio::test]
  async fn not_found_route_writes_top_level_file() {
    let dist = tempfile::tempdir().unwrap();
    let route = test_route("404");
    let paths = write_route_output(dist.path(), &route, "nope", &RouteInfo::from(&route))
      .await
      .unwrap();
    assert_eq!(paths.html, dist.path().join("404.html"));
    assert_eq!(std::fs::read_to_string(dist.path().join("404.html")).unwrap(), "nope");
    assert!(!dist.path().join("404/index.html").exists());
    assert!(dist.path().join("404/routeInfo.json").exists());
  }

  #[tokio::test]
  async fn redirect_route_skips_route_info() {
    let dist = tempfile::tempdir().unwrap();
    let mut route = test_route("old");
    route.redirect = Some("/new".into());
    write_route_output(dist.path(), &route, "redirect", &RouteInfo::from(&route)).await.unwrap();
    assert!(dist.path().join("old/index.html").exists());
    assert!(!dist.path().join("old/routeInfo.json").exists());
  }

  #[tokio::test]
  async fn root_route_writes_into_dist() {
    let dist = tempfile::tempdir().unwrap();
    let route = test_route("/");
    write_route_output(dist.path(), &route, "home", &RouteInfo::from(&route)).await.unwrap();
    assert_eq!(std::fs::read_to_string(dist.path().join("index.html")).unwrap(), "home");
    assert!(dist.path().join("routeInfo.json").exists());
  }

  #[tokio::test]
  async fn parent_segments_are_rejected() {
    let dist = tempfile::tempdir().unwrap();
    let route = test_route("../outside");
    let err =
      write_route_output(dist.path(), &route, "x", &RouteInfo::from(&route)).await.unwrap_err();
    assert_eq!(err.kind(), "write");
    assert!(!dist.path().parent().unwrap().join("outside").exists());
  }

  #[tokio::test]
  async fn unwritable_destination_is_a_write_error() {
    let dist = tempfile::tempdir().unwrap();
    std::fs::write(dist.path().join("blocker"), "file").unwrap();
    let route = test_route("blocker/page");
    let err =
      write_route_output(dist.path(), &route, "x", &RouteInfo::from(&route)).await.unwrap_err();
    assert_eq!(err.kind(), "write");
  }
}
