use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crossbeam_utils::CachePadded;

/// A thread-safe, internal metrics collector for the logger.
/// All fields are atomic to allow for lock-free updates.
#[derive(Debug)]
pub(crate) struct Metrics {
  // --- Writes ---
  pub(crate) writes: CachePadded<AtomicU64>,
  pub(crate) measurements: CachePadded<AtomicU64>,
  pub(crate) transport_errors: CachePadded<AtomicU64>,

  // --- Extras ---
  pub(crate) extras_runs: CachePadded<AtomicU64>,
  pub(crate) extras_writes: CachePadded<AtomicU64>,
  pub(crate) extras_failures: CachePadded<AtomicU64>,

  created_at: Instant,
}

impl Default for Metrics {
  fn default() -> Self {
    Self {
      writes: CachePadded::new(AtomicU64::new(0)),
      measurements: CachePadded::new(AtomicU64::new(0)),
      transport_errors: CachePadded::new(AtomicU64::new(0)),
      extras_runs: CachePadded::new(AtomicU64::new(0)),
      extras_writes: CachePadded::new(AtomicU64::new(0)),
      extras_failures: CachePadded::new(AtomicU64::new(0)),
      created_at: Instant::now(),
    }
  }
}

impl Metrics {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub(crate) fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
  }

  /// Creates a point-in-time snapshot. Handle counts live in the sinks and
  /// are filled in by the caller.
  pub(crate) fn snapshot(&self, persistent_handles: u64, live_handles: u64) -> MetricsSnapshot {
    MetricsSnapshot {
      writes: self.writes.load(Ordering::Relaxed),
      measurements: self.measurements.load(Ordering::Relaxed),
      persistent_handles,
      live_handles,
      transport_errors: self.transport_errors.load(Ordering::Relaxed),
      extras_runs: self.extras_runs.load(Ordering::Relaxed),
      extras_writes: self.extras_writes.load(Ordering::Relaxed),
      extras_failures: self.extras_failures.load(Ordering::Relaxed),
      uptime_secs: self.created_at.elapsed().as_secs(),
    }
  }
}

/// A point-in-time, public-facing snapshot of the logger's metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
  /// Writes accepted while enabled, measurements and extras included.
  pub writes: u64,
  /// How many of those writes were unit-tagged measurements.
  pub measurements: u64,
  /// Handles created by the persistent sink.
  pub persistent_handles: u64,
  /// Handles created by the live sink.
  pub live_handles: u64,
  /// Writes where at least one sink reported a failure.
  pub transport_errors: u64,
  /// Extras runs that found a power source to sample.
  pub extras_runs: u64,
  /// Writes issued by extras runs.
  pub extras_writes: u64,
  /// Extras runs that reported a failure.
  pub extras_failures: u64,
  /// The number of seconds the logger has been running.
  pub uptime_secs: u64,
}
