/* src/cli/export/src/route.rs */

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One exportable URL path, as produced by the route-graph generator.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Route {
  pub path: String,
  #[serde(rename = "templateID")]
  pub template_id: String,
  #[serde(rename = "sharedPropsHashes", default)]
  pub shared_props_hashes: BTreeMap<String, String>,
  #[serde(rename = "localProps", default)]
  pub local_props: serde_json::Map<String, Value>,
  /// Shared data merged into `local_props`; used for the first render only.
  #[serde(rename = "allProps", default)]
  pub all_props: serde_json::Map<String, Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub redirect: Option<String>,
  #[serde(default)]
  pub component: String,
}

impl Route {
  pub fn is_redirect(&self) -> bool {
    self.redirect.is_some()
  }

  pub fn is_not_found(&self) -> bool {
    self.path == "404"
  }

  /// URL the route is served from: `/` stays `/`, everything else gets one leading slash.
  pub fn static_url(&self) -> String {
    let trimmed = self.path.trim_start_matches('/');
    if trimmed.is_empty() { "/".to_string() } else { format!("/{trimmed}") }
  }
}

/// Persisted next to the HTML. Only hashes and local props, so shared data
/// can be re-resolved later instead of being duplicated per route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteInfo {
  pub path: String,
  #[serde(rename = "templateID")]
  pub template_id: String,
  #[serde(rename = "sharedPropsHashes")]
  pub shared_props_hashes: BTreeMap<String, String>,
  #[serde(rename = "localProps")]
  pub local_props: serde_json::Map<String, Value>,
}

impl From<&Route> for RouteInfo {
  fn from(route: &Route) -> Self {
    Self {
      path: route.path.clone(),
      template_id: route.template_id.clone(),
      shared_props_hashes: route.shared_props_hashes.clone(),
      local_props: route.local_props.clone(),
    }
  }
}

/// Inlined into the document for client bootstrap. Carries the fully
/// resolved props; `localProps` is always serialised as `null`.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddedRouteInfo {
  pub path: String,
  #[serde(rename = "templateID")]
  pub template_id: String,
  #[serde(rename = "sharedPropsHashes")]
  pub shared_props_hashes: BTreeMap<String, String>,
  #[serde(rename = "localProps")]
  local_props: Option<()>,
  #[serde(rename = "allProps")]
  pub all_props: serde_json::Map<String, Value>,
  #[serde(rename = "siteData")]
  pub site_data: Value,
}

impl EmbeddedRouteInfo {
  pub fn new(route: &Route, site_data: &Value) -> Self {
    Self {
      path: route.path.clone(),
      template_id: route.template_id.clone(),
      shared_props_hashes: route.shared_props_hashes.clone(),
      local_props: None,
      all_props: route.all_props.clone(),
      site_data: site_data.clone(),
    }
  }
}

#[cfg(test)]
pub(crate) fn test_route(path: &str) -> Route {
  serde_json::from_value(serde_json::json!({
    "path": path,
    "templateID": "tmpl-0",
    "sharedPropsHashes": { "posts": "a1b2c3" },
    "localProps": { "slug": path },
    "allProps": { "slug": path, "posts": [{ "title": "Hello" }] },
    "component": "src/containers/Post",
  }))
  .expect("valid test route")
}
