//! The shared power distribution resource and the extras it feeds.

use crate::value::{Measurement, Value};

/// The key prefix of every extras write.
pub const EXTRAS_PREFIX: &str = "PowerDistribution";

/// The number of writes one extras run issues.
pub const EXTRAS_WRITE_COUNT: usize = 7;

/// A power distribution device the logger samples on its extras timer.
///
/// The logger only reads from it. Implementations are called from the extras
/// thread while the logger's resource lock is held, so reads should be quick.
pub trait PowerSource: Send + Sync {
  /// Device temperature in degrees Celsius.
  fn temperature(&self) -> f64;
  /// Input voltage in volts.
  fn voltage(&self) -> f64;
  /// The number of output channels.
  fn channel_count(&self) -> usize;
  /// The current drawn on `channel`, in amps.
  fn channel_current(&self, channel: usize) -> f64;
  /// The total current drawn across all channels, in amps.
  fn total_current(&self) -> f64;
  /// The total power drawn, in watts.
  fn total_power(&self) -> f64;
  /// The total energy drawn since the device was reset, in joules.
  fn total_energy(&self) -> f64;
}

/// A copy of every field the extras battery writes, taken in one pass so the
/// resource lock is not held while writing.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerSnapshot {
  pub temperature: f64,
  pub voltage: f64,
  pub channel_currents: Vec<f64>,
  pub total_current: f64,
  pub total_power: f64,
  pub total_energy: f64,
}

/// One write of the extras battery.
pub(crate) enum ExtrasSample {
  Plain(String, Value),
  Measured(String, Measurement),
}

impl PowerSnapshot {
  pub fn capture(source: &dyn PowerSource) -> Self {
    let channels = source.channel_count();
    Self {
      temperature: source.temperature(),
      voltage: source.voltage(),
      channel_currents: (0..channels).map(|ch| source.channel_current(ch)).collect(),
      total_current: source.total_current(),
      total_power: source.total_power(),
      total_energy: source.total_energy(),
    }
  }

  /// The battery of writes, in the order they are issued.
  pub(crate) fn samples(self) -> [ExtrasSample; EXTRAS_WRITE_COUNT] {
    let key = |field: &str| format!("{}/{}", EXTRAS_PREFIX, field);
    let channel_count = self.channel_currents.len() as i64;
    [
      ExtrasSample::Measured(key("Temperature"), Measurement::new(self.temperature, "C")),
      ExtrasSample::Measured(key("Voltage"), Measurement::new(self.voltage, "V")),
      ExtrasSample::Plain(key("ChannelCurrents"), Value::FloatArray(self.channel_currents)),
      ExtrasSample::Measured(key("TotalCurrent"), Measurement::new(self.total_current, "A")),
      ExtrasSample::Measured(key("TotalPower"), Measurement::new(self.total_power, "W")),
      ExtrasSample::Measured(key("TotalEnergy"), Measurement::new(self.total_energy, "J")),
      ExtrasSample::Plain(key("ChannelCount"), Value::Int(channel_count)),
    ]
  }
}
