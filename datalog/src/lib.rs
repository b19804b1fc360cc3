//! A telemetry fan-out logger for fixed-period control loops.
//!
//! Every cycle, callers write named, typed samples: booleans, integers, floats,
//! float arrays, text, text arrays and unit-tagged measurements. Each sample is
//! recorded by a persistent sink and, optionally, mirrored to a live sink that
//! external tooling watches.
//!
//! # Features
//! - **Cheap repeated writes**: each sink caches one write handle per key and
//!   kind, so only the first write of a key pays for registering it.
//! - **Correlated sinks**: both sinks receive the same timestamp for a write.
//! - **Kill switch**: a disabled logger drops writes after one flag read.
//! - **Power distribution extras**: an optional background task samples a
//!   shared [`PowerSource`] at a fixed period and logs it through the same path.
//! - **Pluggable transports**: anything implementing [`Transport`] can back a
//!   sink. [`JsonLinesTransport`], [`ChannelTransport`] and
//!   [`MemoryTransport`] ship with the crate.
//!
//! # Quick Start
//!
//! ```
//! use fibre_datalog::{ChannelTransport, DataLogger, Measurement, MemoryTransport, Options};
//!
//! let persisted = MemoryTransport::new();
//! let (live, live_rx) = ChannelTransport::channel(1024);
//!
//! let logger = DataLogger::builder()
//!   .persistent(persisted.clone())
//!   .live(live)
//!   .options(Options::default().publish_live(true))
//!   .build()
//!   .unwrap();
//!
//! // Once per control cycle:
//! logger.write("Drive/Enabled", true).unwrap();
//! logger.write("Drive/Wheels", [0.5, 0.5, 0.4, 0.4]).unwrap();
//! logger.write_measure("Arm/Height", &Measurement::new(0.75, "m")).unwrap();
//!
//! assert_eq!(persisted.paths()[2], "NT/Robot/Arm/Height(m)");
//! assert!(live_rx.try_recv().is_ok());
//! ```

// Public modules that form the API
pub mod clock;
pub mod config;
pub mod error;
pub mod global;
pub mod logger;
pub mod metrics;
pub mod power;
pub mod sink;
pub mod transport;
pub mod value;

// Internal, crate-only modules
mod task;

// Re-export the primary user-facing types for convenience
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{Config, Options};
pub use error::{Error, Result};
pub use logger::{DataLogger, DataLoggerBuilder};
pub use metrics::MetricsSnapshot;
pub use power::{PowerSnapshot, PowerSource};
pub use sink::SinkAdapter;
pub use transport::{
  ChannelTransport, JsonLinesTransport, LiveEvent, LiveReceiver, MemoryTransport, Metadata,
  Transport, TransportError,
};
pub use value::{Measure, Measurement, Value, ValueKind};
