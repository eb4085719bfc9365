/* src/cli/export/src/rewrite.rs */

// Prefix root-relative href/src values in the final document with the
// public asset path.

use crate::config::RewriteOptions;

/// Rewrite `href` (unless disabled) and then `src` attribute values.
pub fn rewrite_urls(html: &str, options: &RewriteOptions) -> String {
  let public = normalize_public_path(&options.public_path);
  if public == "/" {
    return html.to_string();
  }
  let mut out = if options.prefix_hrefs {
    rewrite_attribute(html, "href", &public, &options.base_path)
  } else {
    html.to_string()
  };
  out = rewrite_attribute(&out, "src", &public, &options.base_path);
  out
}

fn normalize_public_path(public: &str) -> String {
  if public.ends_with('/') { public.to_string() } else { format!("{public}/") }
}

fn rewrite_attribute(html: &str, name: &str, public: &str, base: &str) -> String {
  let bytes = html.as_bytes();
  let mut out = String::with_capacity(html.len());
  let mut copied = 0;
  let mut search = 0;

  while let Some(found) = html[search..].find(name) {
    let start = search + found;
    search = start + name.len();

    // name must be a whole attribute: whitespace before, `="` or `='` after
    let preceded = start > 0 && bytes[start - 1].is_ascii_whitespace();
    let after = start + name.len();
    if !preceded || bytes.get(after) != Some(&b'=') {
      continue;
    }
    let quote = match bytes.get(after + 1) {
      Some(q @ (b'"' | b'\'')) => *q as char,
      _ => continue,
    };
    let value_start = after + 2;
    let Some(len) = html[value_start..].find(quote) else {
      break;
    };
    let value_end = value_start + len;
    search = value_end + 1;

    if let Some(rewritten) = rewrite_value(&html[value_start..value_end], public, base) {
      out.push_str(&html[copied..value_start]);
      out.push_str(&rewritten);
      copied = value_end;
    }
  }

  out.push_str(&html[copied..]);
  out
}

fn rewrite_value(value: &str, public: &str, base: &str) -> Option<String> {
  let rest = value.strip_prefix('/')?;
  if rest.is_empty() || rest.starts_with('/') {
    return None;
  }
  if public.starts_with('/') && value.starts_with(public) {
    return None;
  }
  let (segment, remainder) = match rest.strip_prefix(base).and_then(|r| r.strip_prefix('/')) {
    Some(remainder) if !base.is_empty() => (&rest[..base.len() + 1], remainder),
    _ => ("", rest),
  };
  if remainder.is_empty() || remainder.starts_with('/') {
    return None;
  }
  Some(format!("{public}{segment}{remainder}"))
}
