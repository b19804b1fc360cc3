//! The optional process-wide logger instance and access functions.

use once_cell::sync::OnceCell;

use crate::logger::DataLogger;

// The one and only global logger. It is set at most once and lives until the
// process exits.
static GLOBAL_LOGGER: OnceCell<DataLogger> = OnceCell::new();

/// Installs `logger` as the process-wide instance.
///
/// Returns the installed instance, or hands `logger` back if one was already
/// installed. A global logger is never dropped, so call
/// [`DataLogger::shutdown`] to stop its extras task before exiting.
///
/// # Examples
///
/// ```
/// use fibre_datalog::{global, DataLogger, MemoryTransport};
///
/// let logger = DataLogger::builder()
///   .persistent(MemoryTransport::new())
///   .build()
///   .unwrap();
/// global::install(logger).unwrap();
///
/// global::global().unwrap().write("Drive/Enabled", true).unwrap();
/// ```
pub fn install(logger: DataLogger) -> Result<&'static DataLogger, DataLogger> {
  GLOBAL_LOGGER
    .try_insert(logger)
    .map_err(|(_installed, rejected)| rejected)
}

/// Provides a reference to the global logger, if one was installed.
pub fn global() -> Option<&'static DataLogger> {
  GLOBAL_LOGGER.get()
}
