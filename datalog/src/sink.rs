//! The per-key handle cache shared by both sinks.
//!
//! A [`SinkAdapter`] wraps one [`Transport`] and amortizes handle creation:
//! the first write of a `(key, kind)` pair registers an entry with the
//! transport, every later write appends to the cached handle.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::transport::{Metadata, Transport};
use crate::value::{Value, ValueKind};

/// The name reported by the persistent sink in errors and logs.
pub const PERSISTENT_SINK: &str = "persistent";
/// The name reported by the live sink in errors and logs.
pub const LIVE_SINK: &str = "live";

type KindCache<H> = Mutex<AHashMap<String, H>>;

/// A transport plus one handle cache per [`ValueKind`].
///
/// The caches are independent: a key written under two kinds ends up with two
/// handles that share a path. Each cache is guarded by its own mutex, held for
/// the whole lookup-or-create-then-append sequence, so concurrent writers can
/// never create two handles for the same `(key, kind)`.
pub struct SinkAdapter<T: Transport> {
  name: &'static str,
  root: String,
  metadata: Metadata,
  transport: T,
  caches: [KindCache<T::Handle>; ValueKind::COUNT],
  handles_created: AtomicU64,
}

impl<T: Transport> fmt::Debug for SinkAdapter<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SinkAdapter")
      .field("name", &self.name)
      .field("root", &self.root)
      .field("metadata", &self.metadata)
      .field("handles_created", &self.handles_created())
      .finish_non_exhaustive()
  }
}

impl<T: Transport> SinkAdapter<T> {
  /// Creates an adapter writing under `root` (e.g. `"/Robot"`).
  pub fn new(name: &'static str, transport: T, root: impl Into<String>, metadata: Metadata) -> Self {
    Self {
      name,
      root: root.into(),
      metadata,
      transport,
      caches: std::array::from_fn(|_| Mutex::new(AHashMap::new())),
      handles_created: AtomicU64::new(0),
    }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  pub fn transport(&self) -> &T {
    &self.transport
  }

  /// Writes one value, creating the handle on first use.
  ///
  /// `namespace` only affects handles created by this call; a cached handle
  /// keeps the path it was created with.
  pub fn write(
    &self,
    timestamp: u64,
    key: &str,
    value: &Value,
    namespace: Option<&str>,
  ) -> Result<()> {
    let kind = value.kind();
    let mut cache = self.caches[kind.index()].lock();

    if let Some(handle) = cache.get_mut(key) {
      return self
        .transport
        .append(handle, value, timestamp)
        .map_err(|source| Error::Append {
          sink: self.name,
          key: key.to_owned(),
          source,
        });
    }

    let path = self.compose_path(namespace, key);
    let mut handle = self
      .transport
      .create(kind, &path, &self.metadata, timestamp)
      .map_err(|source| Error::HandleCreation {
        sink: self.name,
        path: path.clone(),
        source,
      })?;
    self.handles_created.fetch_add(1, Ordering::Relaxed);
    tracing::debug!(sink = self.name, path = %path, kind = %kind, "Created write handle");

    // The handle is kept even if the first append fails so it is never registered twice.
    let appended = self.transport.append(&mut handle, value, timestamp);
    cache.insert(key.to_owned(), handle);

    appended.map_err(|source| Error::Append {
      sink: self.name,
      key: key.to_owned(),
      source,
    })
  }

  /// The full transport path for `key`.
  pub fn compose_path(&self, namespace: Option<&str>, key: &str) -> String {
    match namespace {
      Some(ns) => format!("{}{}/{}", ns, self.root, key),
      None => format!("{}/{}", self.root, key),
    }
  }

  /// Whether a handle for `(kind, key)` is cached.
  pub fn contains(&self, kind: ValueKind, key: &str) -> bool {
    self.caches[kind.index()].lock().contains_key(key)
  }

  /// The number of handles currently cached across all kinds.
  pub fn handle_count(&self) -> usize {
    self.caches.iter().map(|cache| cache.lock().len()).sum()
  }

  /// The number of handles ever created by this adapter.
  pub fn handles_created(&self) -> u64 {
    self.handles_created.load(Ordering::Relaxed)
  }
}

/// The object-safe view of a [`SinkAdapter`] the logger holds.
pub(crate) trait Sink: Send + Sync {
  fn write(&self, timestamp: u64, key: &str, value: &Value, namespace: Option<&str>) -> Result<()>;
  fn handles_created(&self) -> u64;
}

impl<T: Transport> Sink for SinkAdapter<T> {
  fn write(&self, timestamp: u64, key: &str, value: &Value, namespace: Option<&str>) -> Result<()> {
    SinkAdapter::write(self, timestamp, key, value, namespace)
  }

  fn handles_created(&self) -> u64 {
    SinkAdapter::handles_created(self)
  }
}
