/* src/cli/export/src/document/mod.rs */

// Wrap rendered markup into a complete HTML document through a
// user-replaceable template.

mod regions;


use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde_json::{Map, Value};

use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::render::RenderedRoute;
use crate::route::EmbeddedRouteInfo;

pub use regions::{Body, Head, Html};

const OUTLET_MARKER: &str = "<!--seam:outlet-->";
const HEAD_MARKER: &str = "<!--seam:head-->";

/// Props passed to a [`DocumentTemplate`].
pub struct DocumentProps<'a> {
  pub html: Html<'a>,
  pub head: Head<'a>,
  pub body: Body<'a>,
  pub site_data: &'a Value,
  pub route_info: &'a EmbeddedRouteInfo,
  pub render_meta: &'a Map<String, Value>,
  /// `<div id="root">` holding the rendered markup.
  pub children: String,
}

/// Produces the document markup (without doctype) from its regions.
pub trait DocumentTemplate: Send + Sync {
  fn render(&self, props: &DocumentProps<'_>) -> String;
}

impl<F> DocumentTemplate for F
where
  F: for<'p> Fn(&DocumentProps<'p>) -> String + Send + Sync,
{
  fn render(&self, props: &DocumentProps<'_>) -> String {
    self(props)
  }
}

/// Built-in template: charset and viewport, children straight into body.
pub struct DefaultDocument;

impl DocumentTemplate for DefaultDocument {
  fn render(&self, props: &DocumentProps<'_>) -> String {
    let head = props.head.wrap(concat!(
      r#"<meta charset="UTF-8">"#,
      r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#
    ));
    let body = props.body.wrap(&props.children);
    props.html.wrap(&format!("{head}{body}"))
  }
}

/// Template read from disk. Everything before `<!--seam:head-->` is the body
/// layout and must contain `<!--seam:outlet-->`; everything after it is
/// appended to the head.
#[derive(Debug, Clone)]
pub struct FileDocument {
  layout: String,
  head: String,
}

impl FileDocument {
  pub fn parse(source: &str) -> anyhow::Result<Self> {
    let (layout, head) = match source.split_once(HEAD_MARKER) {
      Some((layout, head)) => (layout.trim(), head.trim()),
      None => (source.trim(), ""),
    };
    if !layout.contains(OUTLET_MARKER) {
      anyhow::bail!("document template is missing the {OUTLET_MARKER} marker");
    }
    Ok(Self { layout: layout.to_string(), head: head.to_string() })
  }

  pub fn load(path: &Path) -> Result<Self, ExportError> {
    std::fs::read_to_string(path)
      .with_context(|| format!("failed to read document template {}", path.display()))
      .and_then(|source| Self::parse(&source))
      .map_err(|e| ExportError::setup(format!("{e:#}")))
  }
}

impl DocumentTemplate for FileDocument {
  fn render(&self, props: &DocumentProps<'_>) -> String {
    let head = props.head.wrap(&self.head);
    let body = props.body.wrap(&self.layout.replacen(OUTLET_MARKER, &props.children, 1));
    props.html.wrap(&format!("{head}{body}"))
  }
}

/// Template named by `export.document`, or the built-in one.
pub fn load_document(config: &ExportConfig) -> Result<Arc<dyn DocumentTemplate>, ExportError> {
  match &config.document {
    Some(path) => Ok(Arc::new(FileDocument::load(path)?)),
    None => Ok(Arc::new(DefaultDocument)),
  }
}

/// Everything the assembler needs for one route.
pub struct DocumentInput<'a> {
  pub rendered: &'a RenderedRoute,
  pub route_info: &'a EmbeddedRouteInfo,
  pub site_data: &'a Value,
  pub inline_css: bool,
  /// Redirect documents carry no route info and no client scripts.
  pub redirect: bool,
}

/// Build the final `<!DOCTYPE html>` document for one route.
pub fn assemble_document(
  template: &dyn DocumentTemplate,
  input: &DocumentInput<'_>,
) -> anyhow::Result<String> {
  let rendered = input.rendered;
  let route_info_json = if input.redirect {
    None
  } else {
    Some(serde_json::to_string(input.route_info).context("failed to serialize route info")?)
  };

  let props = DocumentProps {
    html: Html { attributes: &rendered.head.html_attributes },
    head: Head { head: &rendered.head, assets: &rendered.assets, inline_css: input.inline_css },
    body: Body {
      attributes: &rendered.head.body_attributes,
      route_info_json,
      scripts: &rendered.assets.scripts,
    },
    site_data: input.site_data,
    route_info: input.route_info,
    render_meta: &rendered.render_meta,
    children: format!(r#"<div id="root">{}</div>"#, rendered.markup),
  };

  Ok(format!("<!DOCTYPE html>{}", template.render(&props)))
}
