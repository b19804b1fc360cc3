//! The [`DataLogger`] facade: the public write API over the persistent and
//! live sinks.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::clock::{Clock, MonotonicClock};
use crate::config::{Config, Options};
use crate::error::{Error, Result};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::power::{ExtrasSample, PowerSnapshot, PowerSource};
use crate::sink::{Sink, SinkAdapter, LIVE_SINK, PERSISTENT_SINK};
use crate::task::extras::ExtrasTask;
use crate::transport::{Metadata, Transport};
use crate::value::{resolve_measure, Measure, Value};

/// The internal, thread-safe core of the logger, shared with the extras task.
pub(crate) struct LoggerShared {
  enabled: AtomicBool,
  options: RwLock<Options>,
  live_namespace: String,
  persistent: Box<dyn Sink>,
  live: Option<Box<dyn Sink>>,
  power: Mutex<Option<Arc<dyn PowerSource>>>,
  clock: Box<dyn Clock>,
  last_timestamp: AtomicU64,
  pub(crate) metrics: Metrics,
}

impl LoggerShared {
  #[inline]
  fn is_enabled(&self) -> bool {
    self.enabled.load(Ordering::Relaxed)
  }

  /// A timestamp that never goes backwards, even if the clock does.
  fn next_timestamp(&self) -> u64 {
    let now = self.clock.now_micros();
    let previous = self.last_timestamp.fetch_max(now, Ordering::AcqRel);
    previous.max(now)
  }

  /// Fans one value out to the sinks. The caller has already checked `enabled`.
  fn write_value(&self, key: &str, value: Value) -> Result<()> {
    let options = *self.options.read();
    let timestamp = self.next_timestamp();

    let namespace = if options.persist_with_live_prefix {
      Some(self.live_namespace.as_str())
    } else {
      None
    };

    // Both sinks are attempted even if the first fails.
    let persisted = self.persistent.write(timestamp, key, &value, namespace);
    let published = match &self.live {
      Some(live) if options.publish_live => live.write(timestamp, key, &value, None),
      _ => Ok(()),
    };

    Metrics::bump(&self.metrics.writes);
    let result = persisted.and(published);
    if result.is_err() {
      Metrics::bump(&self.metrics.transport_errors);
    }
    result
  }

  fn write_measure<M: Measure + ?Sized>(&self, key: &str, measure: &M) -> Result<()> {
    let (decorated, value) = resolve_measure(key, measure);
    Metrics::bump(&self.metrics.measurements);
    self.write_value(&decorated, value)
  }

  /// Samples the power source, if any, and writes the extras battery.
  /// Returns the number of writes issued.
  pub(crate) fn log_extras(&self) -> Result<usize> {
    if !self.is_enabled() {
      return Ok(0);
    }

    // The lock covers only the field reads, never the writes below.
    let snapshot = {
      let power = self.power.lock();
      match power.as_deref() {
        Some(source) => PowerSnapshot::capture(source),
        None => return Ok(0),
      }
    };
    Metrics::bump(&self.metrics.extras_runs);

    let mut first_error = None;
    let mut issued = 0;
    for sample in snapshot.samples() {
      // Disabling mid-run drops the rest of the battery.
      if !self.is_enabled() {
        break;
      }
      let result = match sample {
        ExtrasSample::Plain(key, value) => self.write_value(&key, value),
        ExtrasSample::Measured(key, measurement) => self.write_measure(&key, &measurement),
      };
      issued += 1;
      if let Err(e) = result {
        first_error.get_or_insert(e);
      }
    }
    self
      .metrics
      .extras_writes
      .fetch_add(issued as u64, Ordering::Relaxed);

    match first_error {
      Some(e) => Err(e),
      None => Ok(issued),
    }
  }
}

/// The telemetry fan-out logger.
///
/// Every write is recorded by the persistent sink and, when
/// [`Options::publish_live`] is set, mirrored to the live sink with the same
/// timestamp. Handles are created lazily on the first write of each
/// `(key, kind)` pair and reused afterwards.
///
/// The logger is `Sync`; share it by reference or in an `Arc` with the control
/// loop and anything else that logs. Use [`global::install`](crate::global::install)
/// to make one instance process-wide.
pub struct DataLogger {
  shared: Arc<LoggerShared>,
  extras: Mutex<Option<ExtrasTask>>,
}

impl fmt::Debug for DataLogger {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("DataLogger")
      .field("enabled", &self.is_enabled())
      .field("options", &self.options())
      .field("extras_running", &self.is_extras_running())
      .field("metrics", &self.metrics())
      .finish_non_exhaustive()
  }
}

impl Drop for DataLogger {
  fn drop(&mut self) {
    if let Some(task) = self.extras.get_mut().take() {
      task.stop();
    }
  }
}

impl DataLogger {
  pub fn builder() -> DataLoggerBuilder {
    DataLoggerBuilder::new()
  }

  // --- Configuration ---

  /// Replaces the active options as a whole and starts, restarts or stops the
  /// extras task to match. Calling it again with the same options is a no-op
  /// for the task.
  pub fn set_options(&self, options: Options) -> Result<()> {
    options.validate()?;

    // Held across the store so the options and the task never disagree.
    let mut extras = self.extras.lock();
    *self.shared.options.write() = options;
    tracing::debug!(?options, "Data logger options updated");

    if !options.log_extras {
      if let Some(task) = extras.take() {
        task.stop();
      }
      return Ok(());
    }

    if let Some(task) = extras.as_ref() {
      if task.period() == options.extras_period {
        return Ok(());
      }
    }
    if let Some(task) = extras.take() {
      task.stop();
    }
    let task = ExtrasTask::spawn(self.shared.clone(), options.extras_period).map_err(Error::TaskSpawn)?;
    *extras = Some(task);
    Ok(())
  }

  pub fn options(&self) -> Options {
    *self.shared.options.read()
  }

  /// The process-wide kill switch. While disabled every write is dropped
  /// before any sink is touched.
  pub fn set_enabled(&self, enabled: bool) {
    self.shared.enabled.store(enabled, Ordering::Relaxed);
  }

  #[inline]
  pub fn is_enabled(&self) -> bool {
    self.shared.is_enabled()
  }

  // --- Writes ---

  /// Writes one sample under `key`.
  ///
  /// Returns the first transport failure, if any; the other sink is still
  /// written. A disabled logger returns `Ok(())` without doing anything.
  pub fn write(&self, key: &str, value: impl Into<Value>) -> Result<()> {
    if !self.shared.is_enabled() {
      return Ok(());
    }
    self.shared.write_value(key, value.into())
  }

  /// Writes a unit-tagged sample as a float under `key(unit)`.
  pub fn write_measure<M: Measure + ?Sized>(&self, key: &str, measure: &M) -> Result<()> {
    if !self.shared.is_enabled() {
      return Ok(());
    }
    self.shared.write_measure(key, measure)
  }

  // --- Power distribution extras ---

  pub fn set_power_source(&self, source: Arc<dyn PowerSource>) {
    *self.shared.power.lock() = Some(source);
  }

  pub fn clear_power_source(&self) {
    self.shared.power.lock().take();
  }

  pub fn has_power_source(&self) -> bool {
    self.shared.power.lock().is_some()
  }

  /// Runs one round of power distribution extras now. This is what the extras
  /// task calls each period. Returns the number of writes issued, which is
  /// zero when disabled or when no power source is set.
  pub fn log_extras(&self) -> Result<usize> {
    self.shared.log_extras()
  }

  pub fn is_extras_running(&self) -> bool {
    self.extras.lock().is_some()
  }

  /// Stops the extras task, if running. After this returns no further extras
  /// run begins. Setting options with `log_extras` starts it again.
  pub fn shutdown(&self) {
    if let Some(task) = self.extras.lock().take() {
      task.stop();
    }
  }

  // --- Observability ---

  pub fn metrics(&self) -> MetricsSnapshot {
    let live_handles = self.shared.live.as_ref().map_or(0, |live| live.handles_created());
    self
      .shared
      .metrics
      .snapshot(self.shared.persistent.handles_created(), live_handles)
  }
}

type SinkFactory = Box<dyn FnOnce(&Config) -> Box<dyn Sink> + Send>;

/// A builder for [`DataLogger`].
pub struct DataLoggerBuilder {
  config: Config,
  persistent: Option<SinkFactory>,
  live: Option<SinkFactory>,
  clock: Option<Box<dyn Clock>>,
  enabled: bool,
}

impl fmt::Debug for DataLoggerBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("DataLoggerBuilder")
      .field("config", &self.config)
      .field("has_persistent", &self.persistent.is_some())
      .field("has_live", &self.live.is_some())
      .field("enabled", &self.enabled)
      .finish_non_exhaustive()
  }
}

impl Default for DataLoggerBuilder {
  fn default() -> Self {
    Self::new()
  }
}

impl DataLoggerBuilder {
  pub fn new() -> Self {
    Self {
      config: Config::default(),
      persistent: None,
      live: None,
      clock: None,
      enabled: true,
    }
  }

  /// Sets the whole configuration, including the initial options.
  pub fn config(mut self, config: Config) -> Self {
    self.config = config;
    self
  }

  /// Sets the initial options.
  pub fn options(mut self, options: Options) -> Self {
    self.config.options = options;
    self
  }

  /// Sets the transport every write is recorded to. Required.
  pub fn persistent<T: Transport>(mut self, transport: T) -> Self {
    self.persistent = Some(Box::new(move |config: &Config| {
      Box::new(SinkAdapter::new(
        PERSISTENT_SINK,
        transport,
        config.root_table.clone(),
        Metadata::new(config.source.clone()),
      )) as Box<dyn Sink>
    }));
    self
  }

  /// Sets the transport writes are mirrored to when publishing live.
  pub fn live<T: Transport>(mut self, transport: T) -> Self {
    self.live = Some(Box::new(move |config: &Config| {
      Box::new(SinkAdapter::new(
        LIVE_SINK,
        transport,
        config.root_table.clone(),
        Metadata::new(config.source.clone()),
      )) as Box<dyn Sink>
    }));
    self
  }

  /// Sets the timestamp source. Defaults to [`MonotonicClock`].
  pub fn clock(mut self, clock: impl Clock) -> Self {
    self.clock = Some(Box::new(clock));
    self
  }

  /// Sets whether the logger starts enabled. Defaults to `true`.
  pub fn enabled(mut self, enabled: bool) -> Self {
    self.enabled = enabled;
    self
  }

  /// Builds the logger and applies the configured options, starting the
  /// extras task if they ask for it.
  pub fn build(self) -> Result<DataLogger> {
    let config = self.config.validated()?;
    let persistent = self.persistent.ok_or(Error::MissingPersistentTransport)?;

    let shared = LoggerShared {
      enabled: AtomicBool::new(self.enabled),
      options: RwLock::new(config.options),
      live_namespace: config.live_namespace.clone(),
      persistent: persistent(&config),
      live: self.live.map(|factory| factory(&config)),
      power: Mutex::new(None),
      clock: self.clock.unwrap_or_else(|| Box::new(MonotonicClock)),
      last_timestamp: AtomicU64::new(0),
      metrics: Metrics::new(),
    };

    let logger = DataLogger {
      shared: Arc::new(shared),
      extras: Mutex::new(None),
    };
    logger.set_options(config.options)?;
    Ok(logger)
  }
}
