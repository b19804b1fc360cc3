use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{Metadata, Transport, TransportError};
use crate::value::{Value, ValueKind};

/// An entry registered with a [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEntry {
  pub id: usize,
  pub kind: ValueKind,
  pub path: String,
  pub metadata: Metadata,
  pub timestamp: u64,
}

/// A value appended through a [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSample {
  pub entry: usize,
  pub path: String,
  pub timestamp: u64,
  pub value: Value,
}

/// The handle type of a [`MemoryTransport`].
#[derive(Debug)]
pub struct MemoryHandle {
  id: usize,
  path: Arc<str>,
}

impl MemoryHandle {
  pub fn id(&self) -> usize {
    self.id
  }

  pub fn path(&self) -> &str {
    &self.path
  }
}

#[derive(Debug, Default)]
struct MemoryLog {
  entries: Vec<RecordedEntry>,
  samples: Vec<RecordedSample>,
  failing_paths: HashSet<String>,
  fail_appends: bool,
}

/// An in-process transport that records every interaction.
///
/// Clones share the same log, so a caller can hand one clone to a logger and
/// keep another to inspect what was written. Failures can be injected per
/// path (creation) or globally (appends).
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
  log: Arc<Mutex<MemoryLog>>,
}

impl MemoryTransport {
  pub fn new() -> Self {
    Self::default()
  }

  /// All entries created so far, in creation order.
  pub fn entries(&self) -> Vec<RecordedEntry> {
    self.log.lock().entries.clone()
  }

  /// All samples appended so far, in append order.
  pub fn samples(&self) -> Vec<RecordedSample> {
    self.log.lock().samples.clone()
  }

  /// The `(timestamp, value)` pairs appended under `path`.
  pub fn samples_for(&self, path: &str) -> Vec<(u64, Value)> {
    self
      .log
      .lock()
      .samples
      .iter()
      .filter(|sample| sample.path == path)
      .map(|sample| (sample.timestamp, sample.value.clone()))
      .collect()
  }

  /// The paths of all created entries, in creation order.
  pub fn paths(&self) -> Vec<String> {
    self.log.lock().entries.iter().map(|e| e.path.clone()).collect()
  }

  /// The total number of creations plus appends.
  pub fn interaction_count(&self) -> usize {
    let log = self.log.lock();
    log.entries.len() + log.samples.len()
  }

  /// Makes every future `create` for `path` fail until [`heal`](Self::heal) is called.
  pub fn fail_creation(&self, path: impl Into<String>) {
    self.log.lock().failing_paths.insert(path.into());
  }

  /// Makes every future `append` fail (or succeed again).
  pub fn fail_appends(&self, fail: bool) {
    self.log.lock().fail_appends = fail;
  }

  /// Clears all injected failures.
  pub fn heal(&self) {
    let mut log = self.log.lock();
    log.failing_paths.clear();
    log.fail_appends = false;
  }

  /// Forgets everything recorded so far. Injected failures are kept.
  pub fn clear(&self) {
    let mut log = self.log.lock();
    log.entries.clear();
    log.samples.clear();
  }
}

impl Transport for MemoryTransport {
  type Handle = MemoryHandle;

  fn create(
    &self,
    kind: ValueKind,
    path: &str,
    metadata: &Metadata,
    timestamp: u64,
  ) -> Result<Self::Handle, TransportError> {
    let mut log = self.log.lock();
    if log.failing_paths.contains(path) {
      return Err(TransportError::new(format!("entry '{}' rejected", path)));
    }

    let id = log.entries.len();
    log.entries.push(RecordedEntry {
      id,
      kind,
      path: path.to_owned(),
      metadata: metadata.clone(),
      timestamp,
    });

    Ok(MemoryHandle {
      id,
      path: Arc::from(path),
    })
  }

  fn append(
    &self,
    handle: &mut Self::Handle,
    value: &Value,
    timestamp: u64,
  ) -> Result<(), TransportError> {
    let mut log = self.log.lock();
    if log.fail_appends {
      return Err(TransportError::new(format!(
        "append to '{}' rejected",
        handle.path
      )));
    }

    log.samples.push(RecordedSample {
      entry: handle.id,
      path: handle.path.to_string(),
      timestamp,
      value: value.clone(),
    });
    Ok(())
  }
}
