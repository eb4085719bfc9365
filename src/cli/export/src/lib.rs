/* src/cli/export/src/lib.rs */

// Static export worker: turns a batch of routes into one HTML document and
// one routeInfo.json per route, reporting progress over a line protocol.

pub mod assets;
pub mod config;
pub mod document;
pub mod error;
pub mod escape;
pub mod head;
pub mod output;
pub mod pool;
pub mod protocol;
pub mod render;
pub mod rewrite;
pub mod route;
pub mod worker;

pub use assets::{ClientAssets, ClientStats};
pub use config::{ExportConfig, RewriteOptions, find_seam_config, load_export_config};
pub use document::{
  DefaultDocument, DocumentInput, DocumentProps, DocumentTemplate, FileDocument, assemble_document,
  load_document,
};
pub use error::ExportError;
pub use head::{HeadMetadata, HeadTag};
pub use output::{OutputPaths, write_route_output};
pub use pool::{DEFAULT_CONCURRENCY, pool_all};
pub use protocol::{BatchPayload, ErrorPayload, MemorySink, MessageSink, OutboundMessage, StdoutSink};
pub use render::{
  ArtifactLoader, CommandRenderer, DefaultRenderHook, RenderCollector, RenderFn, RenderHook,
  RenderLoader, RenderPass, RenderRequest, RenderedRoute, render_route,
};
pub use rewrite::rewrite_urls;
pub use route::{EmbeddedRouteInfo, Route, RouteInfo};
pub use worker::{Worker, WorkerExit, WorkerState};
