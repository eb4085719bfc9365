/* src/cli/export/src/worker/tests.rs */

use std::path::Path;

use serde_json::{Value, json};

use super::*;
use crate::document::DocumentProps;
use crate::protocol::{ErrorPayload, MemorySink};
use crate::render::{RenderCollector, RenderRequest};
use crate::route::test_route;

fn render_page(req: &RenderRequest<'_>, c: &mut RenderCollector) -> anyhow::Result<String> {
  if req.route.path == "c" {
    anyhow::bail!("boom");
  }
  c.report_chunk("page");
  Ok(format!(r#"<a href="/next">{}</a>"#, req.static_url))
}

fn page_loader(_: &ExportConfig) -> anyhow::Result<Arc<dyn RenderFn>> {
  Ok(Arc::new(render_page))
}

fn worker(sink: &Arc<MemorySink>) -> Worker {
  Worker::new(sink.clone())
    .with_loader(page_loader)
    .with_rewrite_options(RewriteOptions::default())
}

fn batch(dist: &Path, routes: Vec<Route>, rate: Option<usize>) -> BatchPayload {
  BatchPayload {
    config: ExportConfig { dist: dist.to_path_buf(), output_file_rate: rate, ..Default::default() },
    routes,
    default_output_file_rate: 4,
    site_data: json!({ "title": "Blog" }),
    client_stats: ClientStats::default(),
  }
}

fn redirect(path: &str, to: &str) -> Route {
  let mut route = test_route(path);
  route.redirect = Some(to.into());
  route
}

#[tokio::test]
async fn exports_page_and_redirect() {
  let tmp = tempfile::tempdir().unwrap();
  let dist = tmp.path().join("dist");
  let sink = Arc::new(MemorySink::default());
  let mut worker = worker(&sink);
  assert_eq!(worker.state(), WorkerState::Idle);

  let payload = batch(&dist, vec![test_route("/a"), redirect("/b", "/a")], Some(1));
  let exit = worker.handle_batch(payload).await;

  assert_eq!(exit, WorkerExit::Done);
  assert_eq!(worker.state(), WorkerState::Completed);
  assert_eq!(
    sink.messages(),
    vec![OutboundMessage::Tick, OutboundMessage::Tick, OutboundMessage::Done]
  );

  let page = std::fs::read_to_string(dist.join("a/index.html")).unwrap();
  assert!(page.starts_with("<!DOCTYPE html><html>"));
  assert!(page.contains(r#"<div id="root"><a href="/next">/a</a></div>"#));
  assert!(dist.join("a/routeInfo.json").exists());

  let moved = std::fs::read_to_string(dist.join("b/index.html")).unwrap();
  assert!(moved.contains("Redirecting from /b"));
  assert!(moved.contains(r#"<a href="/a">/a</a>"#));
  assert!(!dist.join("b/routeInfo.json").exists());
}

#[tokio::test]
async fn route_info_and_embedded_info_stay_separate() {
  let tmp = tempfile::tempdir().unwrap();
  let sink = Arc::new(MemorySink::default());
  let payload = batch(tmp.path(), vec![test_route("post")], None);
  worker(&sink).handle_batch(payload).await;

  let saved: Value =
    serde_json::from_str(&std::fs::read_to_string(tmp.path().join("post/routeInfo.json")).unwrap())
      .unwrap();
  assert!(saved.get("allProps").is_none());
  assert_eq!(saved["localProps"]["slug"], "post");

  let page = std::fs::read_to_string(tmp.path().join("post/index.html")).unwrap();
  assert!(page.contains(r#""localProps":null"#));
  assert!(page.contains(r#""allProps":{"posts":[{"title":"Hello"}],"slug":"post"}"#));
  assert!(page.contains(r#""siteData":{"title":"Blog"}"#));
}

#[tokio::test]
async fn first_failure_is_fatal_and_stops_the_batch() {
  let tmp = tempfile::tempdir().unwrap();
  let sink = Arc::new(MemorySink::default());
  let mut worker = worker(&sink);
  let routes = ["a", "b", "c", "d", "e"].into_iter().map(test_route).collect();

  let exit = worker.handle_batch(batch(tmp.path(), routes, Some(1))).await;

  assert_eq!(exit, WorkerExit::Fatal);
  assert_eq!(exit.code(), 1);
  assert_eq!(worker.state(), WorkerState::Failed);
  let messages = sink.messages();
  assert_eq!(messages.len(), 3);
  assert_eq!(messages[..2], [OutboundMessage::Tick, OutboundMessage::Tick]);
  assert_eq!(
    messages[2],
    OutboundMessage::Error {
      err: ErrorPayload {
        kind: "render".into(),
        message: "Failed exporting HTML for URL c (src/containers/Post): boom".into(),
      },
    }
  );
  assert!(!messages.contains(&OutboundMessage::Done));
  assert!(!tmp.path().join("d/index.html").exists());
  assert!(!tmp.path().join("e/index.html").exists());
}

#[tokio::test]
async fn setup_failure_reports_error_then_done() {
  let tmp = tempfile::tempdir().unwrap();
  let sink = Arc::new(MemorySink::default());
  let mut worker = Worker::new(sink.clone())
    .with_loader(|_: &ExportConfig| -> anyhow::Result<Arc<dyn RenderFn>> {
      anyhow::bail!("no render artifact matching static.<hash>.js")
    })
    .with_rewrite_options(RewriteOptions::default());

  let exit = worker.handle_batch(batch(tmp.path(), vec![test_route("a")], None)).await;

  assert_eq!(exit, WorkerExit::Done);
  assert_eq!(worker.state(), WorkerState::Failed);
  let messages = sink.messages();
  assert_eq!(messages.len(), 2);
  assert!(matches!(&messages[0], OutboundMessage::Error { err } if err.kind == "setup"));
  assert_eq!(messages[1], OutboundMessage::Done);
  assert!(!tmp.path().join("a/index.html").exists());
}

#[tokio::test]
async fn invalid_inline_config_is_a_setup_failure() {
  let sink = Arc::new(MemorySink::default());
  let mut payload = batch(Path::new(""), vec![test_route("a")], None);
  payload.config.dist = Default::default();
  let exit = worker(&sink).handle_batch(payload).await;
  assert_eq!(exit, WorkerExit::Done);
  assert!(matches!(&sink.messages()[0], OutboundMessage::Error { err } if err.kind == "setup"));
}

#[tokio::test]
async fn rewrites_urls_with_public_and_base_path() {
  let tmp = tempfile::tempdir().unwrap();
  let sink = Arc::new(MemorySink::default());
  let mut payload = batch(tmp.path(), vec![test_route("a")], None);
  payload.config.base_path = Some("/docs/".into());
  let rewrite = RewriteOptions { public_path: "https://cdn.example.com/".into(), ..Default::default() };
  let render = |_: &RenderRequest<'_>, _: &mut RenderCollector| -> anyhow::Result<String> {
    Ok(r#"<a href="/docs/intro">i</a><img src="/logo.png">"#.into())
  };
  let loader = move |_: &ExportConfig| -> anyhow::Result<Arc<dyn RenderFn>> { Ok(Arc::new(render)) };

  Worker::new(sink.clone())
    .with_loader(loader)
    .with_rewrite_options(rewrite)
    .handle_batch(payload)
    .await;

  let page = std::fs::read_to_string(tmp.path().join("a/index.html")).unwrap();
  assert!(page.contains(r#"href="https://cdn.example.com/docs/intro""#));
  assert!(page.contains(r#"src="https://cdn.example.com/logo.png""#));
}

#[tokio::test]
async fn document_override_wins_over_config() {
  let tmp = tempfile::tempdir().unwrap();
  let sink = Arc::new(MemorySink::default());
  let mut payload = batch(tmp.path(), vec![test_route("a")], None);
  payload.config.document = Some(tmp.path().join("missing.html"));
  let template = |props: &DocumentProps<'_>| format!("<main>{}</main>", props.children);

  let exit = worker(&sink).with_document(template).handle_batch(payload).await;

  assert_eq!(exit, WorkerExit::Done);
  let page = std::fs::read_to_string(tmp.path().join("a/index.html")).unwrap();
  assert_eq!(page, r#"<!DOCTYPE html><main><div id="root"><a href="/next">/a</a></div></main>"#);
}

#[tokio::test]
async fn write_failure_is_fatal() {
  let tmp = tempfile::tempdir().unwrap();
  std::fs::write(tmp.path().join("blocker"), "").unwrap();
  let sink = Arc::new(MemorySink::default());
  let exit = worker(&sink)
    .handle_batch(batch(tmp.path(), vec![test_route("blocker/a")], None))
    .await;
  assert_eq!(exit, WorkerExit::Fatal);
  assert!(matches!(&sink.messages()[..], [OutboundMessage::Error { err }] if err.kind == "write"));
}

#[tokio::test]
async fn hook_and_render_meta_reach_the_document() {
  struct ThemeHook;
  impl RenderHook for ThemeHook {
    fn render_to_html(
      &self,
      pass: &mut crate::render::RenderPass<'_>,
      render_meta: &mut serde_json::Map<String, Value>,
      _client_stats: &ClientStats,
    ) -> anyhow::Result<String> {
      render_meta.insert("theme".into(), json!("dark"));
      pass.render()
    }
  }
  let tmp = tempfile::tempdir().unwrap();
  let sink = Arc::new(MemorySink::default());
  let template = |props: &DocumentProps<'_>| {
    let theme = props.render_meta["theme"].as_str().unwrap_or_default().to_string();
    props.html.wrap(&props.body.wrap(&format!("<div class=\"{theme}\">{}</div>", props.children)))
  };
  worker(&sink)
    .with_hook(ThemeHook)
    .with_document(template)
    .handle_batch(batch(tmp.path(), vec![test_route("a")], None))
    .await;
  let page = std::fs::read_to_string(tmp.path().join("a/index.html")).unwrap();
  assert!(page.contains(r#"<div class="dark"><div id="root">"#));
}
