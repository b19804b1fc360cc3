use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::logger::LoggerShared;
use crate::metrics::Metrics;

const EXTRAS_THREAD_NAME: &str = "fibre-datalog-extras";

/// Wakes the extras thread early when it must stop.
#[derive(Default)]
struct StopSignal {
  stopped: Mutex<bool>,
  condvar: Condvar,
}

/// The background task that samples the power source on a fixed period,
/// independent of the caller's control loop.
pub(crate) struct ExtrasTask {
  handle: Option<JoinHandle<()>>, // When the task is dropped, the thread is stopped and joined
  signal: Arc<StopSignal>,
  period: Duration,
}

impl ExtrasTask {
  /// Spawns a new extras thread. The first run happens one period from now.
  pub(crate) fn spawn(shared: Arc<LoggerShared>, period: Duration) -> io::Result<Self> {
    let signal = Arc::new(StopSignal::default());
    let signal_clone = signal.clone();

    let handle = thread::Builder::new()
      .name(EXTRAS_THREAD_NAME.to_string())
      .spawn(move || {
        let mut deadline = Instant::now() + period;
        loop {
          {
            let mut stopped = signal_clone.stopped.lock();
            while !*stopped {
              if signal_clone.condvar.wait_until(&mut stopped, deadline).timed_out() {
                break;
              }
            }
            // Checked under the lock so no run can begin once `stop` has set the flag.
            if *stopped {
              break;
            }
          }

          if let Err(e) = shared.log_extras() {
            Metrics::bump(&shared.metrics.extras_failures);
            tracing::warn!(error = %e, "Power distribution extras failed");
          }

          // Skip ticks missed while a run overran.
          deadline += period;
          let now = Instant::now();
          if deadline <= now {
            deadline = now + period;
          }
        }
        tracing::debug!("Extras task exited");
      })?;

    tracing::debug!(period = ?period, "Extras task started");
    Ok(Self {
      handle: Some(handle),
      signal,
      period,
    })
  }

  pub(crate) fn period(&self) -> Duration {
    self.period
  }

  /// Stops the task. Once this returns no further run will begin; a run
  /// already in flight is allowed to finish first.
  pub(crate) fn stop(mut self) {
    self.shutdown();
  }

  fn shutdown(&mut self) {
    let handle = match self.handle.take() {
      Some(handle) => handle,
      None => return,
    };

    *self.signal.stopped.lock() = true;
    self.signal.condvar.notify_all();

    // Joining from the task's own thread would never return.
    if handle.thread().id() == thread::current().id() {
      return;
    }
    if let Err(e) = handle.join() {
      tracing::warn!("Extras task panicked: {:?}", e);
    }
  }
}

impl Drop for ExtrasTask {
  fn drop(&mut self) {
    self.shutdown();
  }
}
