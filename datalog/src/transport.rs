//! The downstream transport contract and the transports shipped with the crate.
//!
//! A transport is an opaque sink that can register a typed entry for a path
//! and append timestamped values to it. The [`SinkAdapter`](crate::sink::SinkAdapter)
//! owns the handles a transport hands out and decides when to create them.

pub mod channel;
pub mod jsonl;
pub mod memory;

use std::fmt;
use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::value::{Value, ValueKind};

pub use channel::{ChannelTransport, LiveEvent, LiveReceiver};
pub use jsonl::JsonLinesTransport;
pub use memory::{MemoryTransport, RecordedEntry, RecordedSample};

/// The default provenance tag attached to every handle.
pub const DEFAULT_SOURCE: &str = "fibre_datalog";

/// A failure reported by a transport.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
  message: String,
  #[source]
  source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl TransportError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      source: None,
    }
  }

  pub fn with_source(
    message: impl Into<String>,
    source: impl std::error::Error + Send + Sync + 'static,
  ) -> Self {
    Self {
      message: message.into(),
      source: Some(Box::new(source)),
    }
  }

  pub fn message(&self) -> &str {
    &self.message
  }
}

impl From<io::Error> for TransportError {
  fn from(error: io::Error) -> Self {
    TransportError::with_source("I/O error", error)
  }
}

impl From<serde_json::Error> for TransportError {
  fn from(error: serde_json::Error) -> Self {
    TransportError::with_source("failed to encode record", error)
  }
}

/// Fixed provenance metadata attached once to every handle a sink creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
  pub source: String,
}

impl Metadata {
  pub fn new(source: impl Into<String>) -> Self {
    Self {
      source: source.into(),
    }
  }

  /// The metadata as a compact JSON object, e.g. `{"source":"fibre_datalog"}`.
  pub fn to_json(&self) -> String {
    // A struct of one string field cannot fail to serialize.
    serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"source\":{:?}}}", self.source))
  }
}

impl Default for Metadata {
  fn default() -> Self {
    Self::new(DEFAULT_SOURCE)
  }
}

impl fmt::Display for Metadata {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.to_json())
  }
}

/// A downstream sink capable of registering typed entries and appending to them.
///
/// Implementations must be cheap to call from a control loop: both methods are
/// synchronous and are invoked with the owning cache slot locked.
pub trait Transport: Send + Sync + 'static {
  /// A transport-specific write handle bound to one path and one kind.
  type Handle: Send + 'static;

  /// Registers a new entry for `path` and returns its handle.
  ///
  /// `metadata` is attached here, exactly once per handle. Transports that
  /// model metadata as separate properties (a live topic, for instance) apply
  /// them before returning.
  fn create(
    &self,
    kind: ValueKind,
    path: &str,
    metadata: &Metadata,
    timestamp: u64,
  ) -> Result<Self::Handle, TransportError>;

  /// Appends `value` to an existing entry at `timestamp` (microseconds).
  ///
  /// The value's kind always matches the kind the handle was created with.
  fn append(
    &self,
    handle: &mut Self::Handle,
    value: &Value,
    timestamp: u64,
  ) -> Result<(), TransportError>;
}
