/* src/cli/export/src/protocol.rs */

// Coordinator <-> worker messages. One batch document flows in on stdin;
// JSON lines flow back on stdout.

use std::io::Write;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assets::ClientStats;
use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::route::Route;

/// The single inbound message: a batch of routes to export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPayload {
  pub config: ExportConfig,
  pub routes: Vec<Route>,
  /// Used when `config.output_file_rate` is absent or zero.
  pub default_output_file_rate: usize,
  #[serde(default)]
  pub site_data: Value,
  #[serde(default)]
  pub client_stats: ClientStats,
}

impl BatchPayload {
  pub fn decode(input: &[u8]) -> Result<Self, ExportError> {
    serde_json::from_slice(input)
      .map_err(|e| ExportError::Protocol(format!("invalid batch payload: {e}")))
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
  pub kind: String,
  pub message: String,
}

impl From<&ExportError> for ErrorPayload {
  fn from(err: &ExportError) -> Self {
    Self { kind: err.kind().to_string(), message: err.to_string() }
  }
}

/// Messages a worker sends back to its coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundMessage {
  /// One route has been written.
  Tick,
  /// The batch failed; sent at most once.
  Error { err: ErrorPayload },
  /// The batch has been attempted.
  Done,
}

impl OutboundMessage {
  pub fn error(err: &ExportError) -> Self {
    Self::Error { err: err.into() }
  }

  pub fn encode(&self) -> Result<String, ExportError> {
    serde_json::to_string(self).map_err(|e| ExportError::Protocol(e.to_string()))
  }

  pub fn decode(line: &str) -> Result<Self, ExportError> {
    serde_json::from_str(line)
      .map_err(|e| ExportError::Protocol(format!("invalid worker message {line:?}: {e}")))
  }
}

/// Destination for outbound messages.
pub trait MessageSink: Send + Sync {
  fn send(&self, msg: OutboundMessage) -> Result<(), ExportError>;
}

/// One JSON document per line on stdout, flushed per message.
pub struct StdoutSink;

impl MessageSink for StdoutSink {
  fn send(&self, msg: OutboundMessage) -> Result<(), ExportError> {
    let line = msg.encode()?;
    let mut out = std::io::stdout().lock();
    writeln!(out, "{line}")
      .and_then(|()| out.flush())
      .map_err(|e| ExportError::Protocol(format!("failed to write to coordinator: {e}")))
  }
}

/// Keeps every message in memory; used by embedders and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
  messages: Mutex<Vec<OutboundMessage>>,
}

impl MemorySink {
  pub fn messages(&self) -> Vec<OutboundMessage> {
    self.messages.lock().map(|m| m.clone()).unwrap_or_default()
  }
}

impl MessageSink for MemorySink {
  fn send(&self, msg: OutboundMessage) -> Result<(), ExportError> {
    self
      .messages
      .lock()
      .map_err(|_| ExportError::Protocol("message sink poisoned".into()))?
      .push(msg);
    Ok(())
  }
}
