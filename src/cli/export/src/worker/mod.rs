/* src/cli/export/src/worker/mod.rs */

// Worker side of the export protocol: take one batch, export every route
// through the pool, report progress to the coordinator.

#[cfg(test)]
mod tests;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::assets::ClientStats;
use crate::config::{ExportConfig, RewriteOptions};
use crate::document::{DocumentInput, DocumentTemplate, assemble_document, load_document};
use crate::error::ExportError;
use crate::output::write_route_output;
use crate::pool::pool_all;
use crate::protocol::{BatchPayload, MessageSink, OutboundMessage};
use crate::render::{ArtifactLoader, DefaultRenderHook, RenderFn, RenderHook, RenderLoader, render_route};
use crate::rewrite::rewrite_urls;
use crate::route::{EmbeddedRouteInfo, Route, RouteInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
  Idle,
  Processing,
  Completed,
  Failed,
}

/// How the hosting process should end after a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
  /// `done` was sent; exit with status 0.
  Done,
  /// A route failed after `error` was sent; exit with status 1, no `done`.
  Fatal,
}

impl WorkerExit {
  pub fn code(self) -> i32 {
    match self {
      Self::Done => 0,
      Self::Fatal => 1,
    }
  }
}

pub struct Worker {
  sink: Arc<dyn MessageSink>,
  loader: Arc<dyn RenderLoader>,
  hook: Arc<dyn RenderHook>,
  document: Option<Arc<dyn DocumentTemplate>>,
  rewrite: RewriteOptions,
  state: WorkerState,
}

/// Everything resolved once per batch and shared by its route exports.
struct BatchContext {
  config: ExportConfig,
  render: Arc<dyn RenderFn>,
  hook: Arc<dyn RenderHook>,
  document: Arc<dyn DocumentTemplate>,
  rewrite: RewriteOptions,
  site_data: Value,
  client_stats: ClientStats,
  sink: Arc<dyn MessageSink>,
}

impl Worker {
  /// Worker with the artifact loader, default hook and template, and
  /// rewrite options read from the environment.
  pub fn new(sink: Arc<dyn MessageSink>) -> Self {
    Self {
      sink,
      loader: Arc::new(ArtifactLoader),
      hook: Arc::new(DefaultRenderHook),
      document: None,
      rewrite: RewriteOptions::from_env(),
      state: WorkerState::Idle,
    }
  }

  pub fn with_loader(mut self, loader: impl RenderLoader + 'static) -> Self {
    self.loader = Arc::new(loader);
    self
  }

  pub fn with_hook(mut self, hook: impl RenderHook + 'static) -> Self {
    self.hook = Arc::new(hook);
    self
  }

  /// Overrides the template from `export.document` for every batch.
  pub fn with_document(mut self, document: impl DocumentTemplate + 'static) -> Self {
    self.document = Some(Arc::new(document));
    self
  }

  pub fn with_rewrite_options(mut self, rewrite: RewriteOptions) -> Self {
    self.rewrite = rewrite;
    self
  }

  pub fn state(&self) -> WorkerState {
    self.state
  }

  /// Export one batch. Never returns an error: failures are reported to
  /// the coordinator and reflected in the returned exit.
  pub async fn handle_batch(&mut self, payload: BatchPayload) -> WorkerExit {
    self.state = WorkerState::Processing;
    let BatchPayload { config, routes, default_output_file_rate, site_data, client_stats } = payload;

    let ctx = match self.prepare(&config, site_data, client_stats) {
      Ok(ctx) => ctx,
      Err(err) => return self.fail(&err),
    };

    let concurrency = ctx.config.concurrency(default_output_file_rate);
    info!(routes = routes.len(), concurrency, dist = %ctx.config.dist.display(), "exporting batch");

    let ctx = &ctx;
    let tasks = routes.iter().map(|route| move || export_route(ctx, route));
    match pool_all(tasks, Some(concurrency)).await {
      Ok(done) => {
        info!(routes = done.len(), "batch exported");
        self.send(OutboundMessage::Done);
        self.state = WorkerState::Completed;
        WorkerExit::Done
      }
      Err(err) => self.fail(&err),
    }
  }

  /// Report `err` once. Non-fatal (setup) failures still close the batch
  /// with `done` and let the process exit cleanly.
  fn fail(&mut self, err: &ExportError) -> WorkerExit {
    error!(error = %err, kind = err.kind(), "batch failed");
    self.send(OutboundMessage::error(err));
    self.state = WorkerState::Failed;
    if err.is_fatal() {
      WorkerExit::Fatal
    } else {
      self.send(OutboundMessage::Done);
      WorkerExit::Done
    }
  }

  fn prepare(
    &self,
    config: &ExportConfig,
    site_data: Value,
    client_stats: ClientStats,
  ) -> Result<BatchContext, ExportError> {
    let setup = |e: anyhow::Error| ExportError::setup(format!("{e:#}"));
    let config = config.reresolve().map_err(setup)?;
    let render = self.loader.load(&config).map_err(setup)?;
    let document = match &self.document {
      Some(document) => document.clone(),
      None => load_document(&config)?,
    };
    let rewrite = self.rewrite.clone().with_base_path(config.base_path());
    Ok(BatchContext {
      config,
      render,
      hook: self.hook.clone(),
      document,
      rewrite,
      site_data,
      client_stats,
      sink: self.sink.clone(),
    })
  }

  fn send(&self, msg: OutboundMessage) {
    if let Err(e) = self.sink.send(msg) {
      warn!(error = %e, "failed to report to coordinator");
    }
  }
}

async fn export_route(ctx: &BatchContext, route: &Route) -> Result<(), ExportError> {
  let embedded = EmbeddedRouteInfo::new(route, &ctx.site_data);
  let rendered = render_route(
    ctx.render.as_ref(),
    ctx.hook.as_ref(),
    route,
    &embedded,
    &ctx.client_stats,
  )?;

  let input = DocumentInput {
    rendered: &rendered,
    route_info: &embedded,
    site_data: &ctx.site_data,
    inline_css: ctx.config.inline_css,
    redirect: route.is_redirect(),
  };
  let html = assemble_document(ctx.document.as_ref(), &input)
    .map_err(|e| ExportError::render(&route.path, &route.component, &e))?;
  let html = rewrite_urls(&html, &ctx.rewrite);

  let paths = write_route_output(&ctx.config.dist, route, &html, &RouteInfo::from(route)).await?;
  debug!(path = %route.path, html = %paths.html.display(), "exported route");
  ctx.sink.send(OutboundMessage::Tick)
}
