#![allow(dead_code)]

use fibre_datalog::{DataLogger, ManualClock, MemoryTransport, Options, PowerSource};

/// A logger over two recording transports and a manual clock.
pub struct Harness {
  pub logger: DataLogger,
  pub persisted: MemoryTransport,
  pub live: MemoryTransport,
  pub clock: ManualClock,
}

pub fn harness(options: Options) -> Harness {
  let persisted = MemoryTransport::new();
  let live = MemoryTransport::new();
  let clock = ManualClock::new(1_000);

  let logger = DataLogger::builder()
    .persistent(persisted.clone())
    .live(live.clone())
    .clock(clock.clone())
    .options(options)
    .build()
    .unwrap();

  Harness {
    logger,
    persisted,
    live,
    clock,
  }
}

/// A power distribution device reporting fixed readings.
pub struct FixedPower {
  pub temperature: f64,
  pub voltage: f64,
  pub currents: Vec<f64>,
}

impl FixedPower {
  pub fn new(temperature: f64, voltage: f64, currents: Vec<f64>) -> Self {
    Self {
      temperature,
      voltage,
      currents,
    }
  }
}

impl PowerSource for FixedPower {
  fn temperature(&self) -> f64 {
    self.temperature
  }

  fn voltage(&self) -> f64 {
    self.voltage
  }

  fn channel_count(&self) -> usize {
    self.currents.len()
  }

  fn channel_current(&self, channel: usize) -> f64 {
    self.currents[channel]
  }

  fn total_current(&self) -> f64 {
    self.currents.iter().sum()
  }

  fn total_power(&self) -> f64 {
    self.total_current() * self.voltage
  }

  fn total_energy(&self) -> f64 {
    42.0
  }
}
