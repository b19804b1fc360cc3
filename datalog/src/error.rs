use std::io;

use thiserror::Error;

use crate::transport::TransportError;

/// The main error type for the `fibre_datalog` library.
#[derive(Debug, Error)]
pub enum Error {
  #[error("{sink} sink failed to create a write handle for '{path}': {source}")]
  HandleCreation {
    sink: &'static str,
    path: String,
    #[source]
    source: TransportError,
  },

  #[error("{sink} sink failed to append to '{key}': {source}")]
  Append {
    sink: &'static str,
    key: String,
    #[source]
    source: TransportError,
  },

  #[error("Failed to read configuration file: {0}")]
  ConfigRead(#[from] io::Error),

  #[error("Failed to parse configuration: {0}")]
  ConfigParse(String),

  #[error("Invalid configuration value for '{field}': {message}")]
  InvalidConfigValue { field: String, message: String },

  #[error("Failed to spawn the extras task: {0}")]
  TaskSpawn(#[source] io::Error),

  #[error("A persistent transport is required to build a data logger")]
  MissingPersistentTransport,
}

impl Error {
  /// Returns `true` if the error came from a transport rather than from
  /// configuration or task management.
  pub fn is_transport(&self) -> bool {
    matches!(self, Error::HandleCreation { .. } | Error::Append { .. })
  }
}

/// A specialized `Result` type for `fibre_datalog` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
