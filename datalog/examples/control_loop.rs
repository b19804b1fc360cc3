//! Runs a simulated 20 ms control loop that logs to a JSON-lines file and
//! streams the same samples to a live consumer thread.
//!
//! Run with `RUST_LOG=fibre_datalog=debug` to see handle registration.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use fibre_datalog::{
  ChannelTransport, DataLogger, JsonLinesTransport, LiveEvent, Measure, Options, PowerSource,
};
use tracing_subscriber::EnvFilter;

const CYCLES: u64 = 50;
const PERIOD: Duration = Duration::from_millis(20);

/// A length in meters, logged in several units.
#[derive(Clone, Copy)]
struct Length {
  meters: f64,
  unit: LengthUnit,
}

#[derive(Clone, Copy)]
enum LengthUnit {
  Meters,
  Inches,
  Feet,
}

impl Length {
  fn meters(meters: f64) -> Self {
    Self {
      meters,
      unit: LengthUnit::Meters,
    }
  }

  fn convert_to(self, unit: LengthUnit) -> Self {
    Self { unit, ..self }
  }
}

impl Measure for Length {
  fn magnitude(&self) -> f64 {
    match self.unit {
      LengthUnit::Meters => self.meters,
      LengthUnit::Inches => self.meters / 0.0254,
      LengthUnit::Feet => self.meters / 0.3048,
    }
  }

  fn abbreviation(&self) -> &str {
    match self.unit {
      LengthUnit::Meters => "m",
      LengthUnit::Inches => "in",
      LengthUnit::Feet => "ft",
    }
  }
}

/// A power distribution hub whose load ramps with the loop.
struct SimulatedHub {
  tick: AtomicU64,
}

impl SimulatedHub {
  fn load(&self) -> f64 {
    (self.tick.load(Ordering::Relaxed) % 10) as f64
  }
}

impl PowerSource for SimulatedHub {
  fn temperature(&self) -> f64 {
    30.0 + self.load() * 0.1
  }

  fn voltage(&self) -> f64 {
    12.6 - self.load() * 0.05
  }

  fn channel_count(&self) -> usize {
    24
  }

  fn channel_current(&self, channel: usize) -> f64 {
    if channel < 4 {
      self.load() * 2.0
    } else {
      0.0
    }
  }

  fn total_current(&self) -> f64 {
    self.load() * 8.0
  }

  fn total_power(&self) -> f64 {
    self.total_current() * self.voltage()
  }

  fn total_energy(&self) -> f64 {
    self.tick.load(Ordering::Relaxed) as f64 * 1.5
  }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let dir = tempfile::tempdir()?;
  let log_path = dir.path().join("control_loop.jsonl");
  let (live, live_rx) = ChannelTransport::channel(256);

  let consumer = thread::spawn(move || {
    let mut announced = 0;
    let mut updates = 0;
    while let Ok(event) = live_rx.recv() {
      match event {
        LiveEvent::Announce { path, kind, .. } => {
          announced += 1;
          tracing::info!(%path, %kind, "live topic announced");
        }
        LiveEvent::Update { .. } => updates += 1,
      }
    }
    (announced, updates)
  });

  let logger = DataLogger::builder()
    .persistent(JsonLinesTransport::open(&log_path)?)
    .live(live)
    .options(Options::default().log_extras(true).extras_period(PERIOD))
    .build()?;

  let hub = Arc::new(SimulatedHub {
    tick: AtomicU64::new(0),
  });
  logger.set_power_source(hub.clone());

  for cycle in 0..CYCLES {
    hub.tick.store(cycle, Ordering::Relaxed);
    let height = Length::meters(0.5 + (cycle as f64 * 0.1).sin() * 0.25);

    logger.write("Elevator/Enabled", cycle % 10 != 0)?;
    logger.write("Loop/Cycle", cycle as i64)?;
    logger.write_measure("Elevator/Height", &height)?;
    logger.write_measure("Elevator/Height", &height.convert_to(LengthUnit::Inches))?;
    logger.write_measure("Elevator/Height", &height.convert_to(LengthUnit::Feet))?;
    logger.write("Drive/Wheels", [0.4, 0.4, 0.38, 0.41])?;
    logger.write("State/Commands", &["Drive", "Elevator"][..])?;

    thread::sleep(PERIOD);
  }

  logger.shutdown();
  let metrics = logger.metrics();
  tracing::info!(?metrics, "control loop finished");

  // Dropping the logger closes the live channel and flushes the file.
  drop(logger);
  let (announced, updates) = consumer.join().map_err(|_| "live consumer panicked")?;
  let lines = std::fs::read_to_string(&log_path)?.lines().count();
  tracing::info!(announced, updates, lines, path = %log_path.display(), "outputs");

  Ok(())
}
