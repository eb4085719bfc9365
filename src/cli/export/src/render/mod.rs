/* src/cli/export/src/render/mod.rs */

// Per-route render pipeline: render the route's markup, then drain the
// head metadata and used chunks recorded by that render.

mod command;


use serde_json::{Map, Value};

use crate::assets::{ClientAssets, ClientStats};
use crate::error::ExportError;
use crate::escape::{escape_html, escape_json_for_script};
use crate::head::{HeadMetadata, HeadTag};
use crate::route::{EmbeddedRouteInfo, Route};

pub use command::{ArtifactLoader, CommandRenderer, RenderLoader, discover_artifact};

/// Everything a render function may read for one route.
pub struct RenderRequest<'a> {
  pub route: &'a Route,
  pub route_info: &'a EmbeddedRouteInfo,
  /// `/` for the root route, `/<path>` otherwise.
  pub static_url: String,
}

impl RenderRequest<'_> {
  pub fn props(&self) -> &Map<String, Value> {
    &self.route.all_props
  }
}

/// Per-render sink for head tags and code-split chunk names.
///
/// A fresh collector is handed to every render call and drained right after
/// it returns, so concurrent exports never observe each other's metadata.
#[derive(Debug, Default)]
pub struct RenderCollector {
  head: HeadMetadata,
  chunks: Vec<String>,
}

impl RenderCollector {
  pub fn report_chunk(&mut self, name: impl Into<String>) {
    self.chunks.push(name.into());
  }

  pub fn head_mut(&mut self) -> &mut HeadMetadata {
    &mut self.head
  }

  pub fn add_head(&mut self, head: HeadMetadata) {
    self.head.merge(head);
  }

  fn drain(&mut self) -> (HeadMetadata, Vec<String>) {
    (std::mem::take(&mut self.head), std::mem::take(&mut self.chunks))
  }
}

/// The compiled render entry point: props in, markup out.
pub trait RenderFn: Send + Sync {
  fn render(
    &self,
    request: &RenderRequest<'_>,
    collector: &mut RenderCollector,
  ) -> anyhow::Result<String>;
}

impl<F> RenderFn for F
where
  F: for<'r> Fn(&RenderRequest<'r>, &mut RenderCollector) -> anyhow::Result<String> + Send + Sync,
{
  fn render(
    &self,
    request: &RenderRequest<'_>,
    collector: &mut RenderCollector,
  ) -> anyhow::Result<String> {
    self(request, collector)
  }
}

/// One render-and-extract step, handed to a [`RenderHook`].
pub struct RenderPass<'a> {
  render: &'a dyn RenderFn,
  request: &'a RenderRequest<'a>,
  client_stats: &'a ClientStats,
  extracted: Option<(HeadMetadata, ClientAssets)>,
}

impl<'a> RenderPass<'a> {
  fn new(
    render: &'a dyn RenderFn,
    request: &'a RenderRequest<'a>,
    client_stats: &'a ClientStats,
  ) -> Self {
    Self { render, request, client_stats, extracted: None }
  }

  pub fn request(&self) -> &RenderRequest<'a> {
    self.request
  }

  /// Render to markup, then extract head metadata and client assets before
  /// returning. The latest call's extraction is the one kept.
  pub fn render(&mut self) -> anyhow::Result<String> {
    let mut collector = RenderCollector::default();
    let markup = self.render.render(self.request, &mut collector)?;
    let (head, chunks) = collector.drain();
    let assets = self.client_stats.resolve(&chunks);
    self.extracted = Some((head, assets));
    Ok(markup)
  }
}

/// Custom rendering strategy wrapped around the render pass.
pub trait RenderHook: Send + Sync {
  fn render_to_html(
    &self,
    pass: &mut RenderPass<'_>,
    render_meta: &mut Map<String, Value>,
    client_stats: &ClientStats,
  ) -> anyhow::Result<String>;
}

pub struct DefaultRenderHook;

impl RenderHook for DefaultRenderHook {
  fn render_to_html(
    &self,
    pass: &mut RenderPass<'_>,
    _render_meta: &mut Map<String, Value>,
    _client_stats: &ClientStats,
  ) -> anyhow::Result<String> {
    pass.render()
  }
}

/// Output of the render pipeline for one route.
#[derive(Debug, Clone, Default)]
pub struct RenderedRoute {
  pub markup: String,
  pub head: HeadMetadata,
  pub assets: ClientAssets,
  /// Free-form data a hook recorded for the document template.
  pub render_meta: Map<String, Value>,
}

impl RenderedRoute {
  /// Placeholder document content that sends the browser from `from` to `to`.
  pub fn redirect(from: &str, to: &str) -> Self {
    let target = redirect_target(to);
    let escaped = escape_html(&target);
    let mut head = HeadMetadata::default();
    head.meta.push(HeadTag::new([
      ("http-equiv", "refresh".to_string()),
      ("content", format!("0; url={target}")),
    ]));
    let location = escape_json_for_script(&Value::String(target.clone()).to_string());
    let markup = format!(
      r#"<p>Redirecting from {} to <a href="{escaped}">{escaped}</a></p><script>window.location.replace({location})</script>"#,
      escape_html(from),
    );
    Self { markup, head, ..Default::default() }
  }
}

fn redirect_target(to: &str) -> String {
  if to.starts_with('/') || to.contains("://") {
    to.to_string()
  } else {
    format!("/{to}")
  }
}

/// Run the render pipeline for one route. Redirect routes skip rendering.
pub fn render_route(
  render: &dyn RenderFn,
  hook: &dyn RenderHook,
  route: &Route,
  route_info: &EmbeddedRouteInfo,
  client_stats: &ClientStats,
) -> Result<RenderedRoute, ExportError> {
  if let Some(to) = &route.redirect {
    return Ok(RenderedRoute::redirect(&route.path, to));
  }

  let request = RenderRequest { route, route_info, static_url: route.static_url() };
  let mut pass = RenderPass::new(render, &request, client_stats);
  let mut render_meta = Map::new();
  let markup = hook
    .render_to_html(&mut pass, &mut render_meta, client_stats)
    .map_err(|e| ExportError::render(&route.path, &route.component, &e))?;
  let (head, assets) = pass.extracted.unwrap_or_default();

  Ok(RenderedRoute { markup, head, assets, render_meta })
}
