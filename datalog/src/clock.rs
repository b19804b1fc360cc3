use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::Lazy;

// The single reference point for every `MonotonicClock`.
// It is initialized lazily on its first use.
static LOGGER_EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// A source of sample timestamps, in microseconds.
pub trait Clock: Send + Sync + 'static {
  fn now_micros(&self) -> u64;
}

/// Microseconds since the process-wide logger epoch. Never goes backwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
  #[inline]
  fn now_micros(&self) -> u64 {
    Instant::now()
      .saturating_duration_since(*LOGGER_EPOCH)
      .as_micros() as u64
  }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
  now: Arc<AtomicU64>,
}

impl ManualClock {
  pub fn new(start_micros: u64) -> Self {
    Self {
      now: Arc::new(AtomicU64::new(start_micros)),
    }
  }

  pub fn set(&self, micros: u64) {
    self.now.store(micros, Ordering::SeqCst);
  }

  pub fn advance(&self, micros: u64) {
    self.now.fetch_add(micros, Ordering::SeqCst);
  }
}

impl Clock for ManualClock {
  fn now_micros(&self) -> u64 {
    self.now.load(Ordering::SeqCst)
  }
}
