/* src/cli/export/src/document/regions.rs */

// The three document regions handed to a template. Each one knows how to
// wrap template-supplied content with the route's metadata and assets.

use crate::assets::ClientAssets;
use crate::escape::{escape_html, escape_json_for_script};
use crate::head::{Attributes, HeadMetadata, render_attributes};

/// `<html>` wrapper carrying the html-tag attributes collected during render.
pub struct Html<'a> {
  pub(super) attributes: &'a Attributes,
}

impl Html<'_> {
  pub fn wrap(&self, inner: &str) -> String {
    format!("<html{}>{inner}</html>", render_attributes(self.attributes))
  }
}

/// `<head>` with the collected tags, asset links and template head content.
pub struct Head<'a> {
  pub(super) head: &'a HeadMetadata,
  pub(super) assets: &'a ClientAssets,
  pub(super) inline_css: bool,
}

impl Head<'_> {
  pub fn wrap(&self, inner: &str) -> String {
    let head = self.head;
    let mut out = String::from("<head>");
    out.push_str(&head.render_base());
    out.push_str(&head.render_title());
    out.push_str(&head.render_meta());
    for script in &self.assets.scripts {
      out.push_str(&format!(r#"<link rel="preload" as="script" href="{}">"#, asset_href(script)));
    }
    match self.assets.inline_css().filter(|_| self.inline_css) {
      Some(css) => out.push_str(&format!("<style>{css}</style>")),
      None => {
        for sheet in &self.assets.stylesheets {
          out.push_str(&format!(r#"<link rel="stylesheet" href="{}">"#, asset_href(sheet)));
        }
      }
    }
    out.push_str(&head.render_link());
    out.push_str(&head.render_noscript());
    out.push_str(&head.render_script());
    out.push_str(&head.render_style());
    out.push_str(inner);
    out.push_str("</head>");
    out
  }
}

/// `<body>` with the template children, then the bootstrap scripts.
pub struct Body<'a> {
  pub(super) attributes: &'a Attributes,
  /// Serialised embedded route info; `None` for redirect documents.
  pub(super) route_info_json: Option<String>,
  pub(super) scripts: &'a [String],
}

impl Body<'_> {
  pub fn wrap(&self, inner: &str) -> String {
    let mut out = format!("<body{}>{inner}", render_attributes(self.attributes));
    if let Some(json) = &self.route_info_json {
      out.push_str(&format!(
        r#"<script type="text/javascript">window.__routeInfo = {};</script>"#,
        escape_json_for_script(json)
      ));
      for script in self.scripts {
        out.push_str(&format!(
          r#"<script defer type="text/javascript" src="{}"></script>"#,
          asset_href(script)
        ));
      }
    }
    out.push_str("</body>");
    out
  }
}

// Root-relative; the URL rewriter applies the public path afterwards.
fn asset_href(file: &str) -> String {
  escape_html(&format!("/{}", file.trim_start_matches('/')))
}
