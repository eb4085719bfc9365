/* src/cli/export/src/head.rs */

// Head metadata gathered during one render pass: document-level attributes
// plus the tags that belong in <head>.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::escape::escape_html;

pub type Attributes = BTreeMap<String, String>;

/// One head element: its attributes plus optional inner content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadTag {
  #[serde(default)]
  pub attributes: Attributes,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub content: Option<String>,
}

impl HeadTag {
  pub fn new<K, V>(attrs: impl IntoIterator<Item = (K, V)>) -> Self
  where
    K: Into<String>,
    V: Into<String>,
  {
    Self {
      attributes: attrs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
      content: None,
    }
  }

  pub fn with_content(mut self, content: impl Into<String>) -> Self {
    self.content = Some(content.into());
    self
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeadMetadata {
  pub html_attributes: Attributes,
  pub body_attributes: Attributes,
  pub base: Vec<HeadTag>,
  pub link: Vec<HeadTag>,
  pub meta: Vec<HeadTag>,
  pub noscript: Vec<HeadTag>,
  pub script: Vec<HeadTag>,
  pub style: Vec<HeadTag>,
  pub title: Vec<HeadTag>,
}

impl HeadMetadata {
  /// Fold another collection into this one; later attributes win.
  pub fn merge(&mut self, other: HeadMetadata) {
    self.html_attributes.extend(other.html_attributes);
    self.body_attributes.extend(other.body_attributes);
    self.base.extend(other.base);
    self.link.extend(other.link);
    self.meta.extend(other.meta);
    self.noscript.extend(other.noscript);
    self.script.extend(other.script);
    self.style.extend(other.style);
    self.title.extend(other.title);
  }

  pub fn is_empty(&self) -> bool {
    *self == Self::default()
  }

  pub fn render_base(&self) -> String {
    render_void_tags("base", &self.base)
  }

  /// Only the last title wins, matching browser behaviour for nested heads.
  pub fn render_title(&self) -> String {
    match self.title.last() {
      Some(tag) => format!(
        "<title{}>{}</title>",
        render_attributes(&tag.attributes),
        escape_html(tag.content.as_deref().unwrap_or_default())
      ),
      None => String::new(),
    }
  }

  pub fn render_meta(&self) -> String {
    render_void_tags("meta", &self.meta)
  }

  pub fn render_link(&self) -> String {
    render_void_tags("link", &self.link)
  }

  pub fn render_noscript(&self) -> String {
    render_raw_tags("noscript", &self.noscript)
  }

  pub fn render_script(&self) -> String {
    render_raw_tags("script", &self.script)
  }

  pub fn render_style(&self) -> String {
    render_raw_tags("style", &self.style)
  }
}

/// Render an attribute map as ` name="value"` pairs; empty values render bare.
pub fn render_attributes(attrs: &Attributes) -> String {
  let mut out = String::new();
  for (name, value) in attrs {
    out.push(' ');
    out.push_str(name);
    if !value.is_empty() {
      out.push_str("=\"");
      out.push_str(&escape_html(value));
      out.push('"');
    }
  }
  out
}

fn render_void_tags(name: &str, tags: &[HeadTag]) -> String {
  tags.iter().map(|t| format!("<{name}{}>", render_attributes(&t.attributes))).collect()
}

// script/style/noscript bodies are raw text; escaping would corrupt them.
fn render_raw_tags(name: &str, tags: &[HeadTag]) -> String {
  tags
    .iter()
    .map(|t| {
      format!(
        "<{name}{}>{}</{name}>",
        render_attributes(&t.attributes),
        t.content.as_deref().unwrap_or_default()
      )
    })
    .collect()
}
