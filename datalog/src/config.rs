//! Logger configuration: the runtime [`Options`] switches and the static
//! [`Config`] a logger is built with, loadable from YAML.

use std::fs::File;
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::transport::DEFAULT_SOURCE;

/// The default table every key is written under.
pub const DEFAULT_ROOT_TABLE: &str = "/Robot";
/// The default namespace the live sink's consumers see its table under.
pub const DEFAULT_LIVE_NAMESPACE: &str = "NT";
/// The default extras period (50 Hz).
pub const DEFAULT_EXTRAS_PERIOD: Duration = Duration::from_millis(20);

/// The runtime switches of a data logger, always applied as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
  /// Mirror every write onto the live sink.
  pub publish_live: bool,
  /// Prefix persisted paths with the live namespace so persisted and live
  /// data line up in viewers. Only affects handles created afterwards.
  pub persist_with_live_prefix: bool,
  /// Run the periodic power distribution extras.
  pub log_extras: bool,
  /// How often the extras run.
  pub extras_period: Duration,
}

impl Default for Options {
  fn default() -> Self {
    Self {
      publish_live: true,
      persist_with_live_prefix: true,
      log_extras: false,
      extras_period: DEFAULT_EXTRAS_PERIOD,
    }
  }
}

impl Options {
  pub fn publish_live(mut self, publish: bool) -> Self {
    self.publish_live = publish;
    self
  }

  pub fn persist_with_live_prefix(mut self, prefix: bool) -> Self {
    self.persist_with_live_prefix = prefix;
    self
  }

  pub fn log_extras(mut self, log_extras: bool) -> Self {
    self.log_extras = log_extras;
    self
  }

  pub fn extras_period(mut self, period: Duration) -> Self {
    self.extras_period = period;
    self
  }

  pub fn validate(&self) -> Result<()> {
    if self.extras_period.is_zero() {
      return Err(Error::InvalidConfigValue {
        field: "options.extras_period".to_string(),
        message: "must be greater than zero".to_string(),
      });
    }
    Ok(())
  }
}

/// The full configuration of a data logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
  /// The table all keys live under, normalized to `/Name` form.
  pub root_table: String,
  /// The namespace prepended to persisted paths when
  /// [`Options::persist_with_live_prefix`] is set.
  pub live_namespace: String,
  /// The provenance tag attached to every handle.
  pub source: String,
  pub options: Options,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      root_table: DEFAULT_ROOT_TABLE.to_string(),
      live_namespace: DEFAULT_LIVE_NAMESPACE.to_string(),
      source: DEFAULT_SOURCE.to_string(),
      options: Options::default(),
    }
  }
}

impl Config {
  pub fn root_table(mut self, root_table: impl Into<String>) -> Self {
    self.root_table = root_table.into();
    self
  }

  pub fn live_namespace(mut self, namespace: impl Into<String>) -> Self {
    self.live_namespace = namespace.into();
    self
  }

  pub fn source(mut self, source: impl Into<String>) -> Self {
    self.source = source.into();
    self
  }

  pub fn options(mut self, options: Options) -> Self {
    self.options = options;
    self
  }

  /// Parses a YAML document.
  pub fn from_yaml_str(yaml: &str) -> Result<Self> {
    let raw: ConfigRaw = serde_yaml::from_str(yaml).map_err(|e| Error::ConfigParse(e.to_string()))?;
    process_raw_config(raw)
  }

  /// Reads and parses a YAML file.
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
    let file = File::open(path.as_ref())?;
    let reader = io::BufReader::new(file);
    let raw: ConfigRaw =
      serde_yaml::from_reader(reader).map_err(|e| Error::ConfigParse(e.to_string()))?;
    process_raw_config(raw)
  }

  /// Checks and normalizes a configuration built in code.
  pub fn validated(mut self) -> Result<Self> {
    self.root_table = normalize_root_table(&self.root_table)?;
    // The root table supplies the separating slash.
    self.live_namespace = self.live_namespace.trim().trim_matches('/').to_string();
    if self.source.trim().is_empty() {
      return Err(Error::InvalidConfigValue {
        field: "source".to_string(),
        message: "must not be empty".to_string(),
      });
    }
    self.options.validate()?;
    Ok(self)
  }
}

fn normalize_root_table(root_table: &str) -> Result<String> {
  let trimmed = root_table.trim().trim_matches('/');
  if trimmed.is_empty() {
    return Err(Error::InvalidConfigValue {
      field: "root_table".to_string(),
      message: "must name a table, e.g. \"/Robot\"".to_string(),
    });
  }
  Ok(format!("/{}", trimmed))
}

// --- Raw YAML structure ---

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct ConfigRaw {
  #[serde(default = "default_root_table")]
  root_table: String,
  #[serde(default = "default_live_namespace")]
  live_namespace: String,
  #[serde(default = "default_source")]
  source: String,
  #[serde(default)]
  options: OptionsRaw,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct OptionsRaw {
  #[serde(default = "default_true")]
  publish_live: bool,
  #[serde(default = "default_true")]
  persist_with_live_prefix: bool,
  #[serde(default)]
  log_extras: bool,
  /// A humantime duration, e.g. "20ms".
  #[serde(default)]
  extras_period: Option<String>,
}

impl Default for OptionsRaw {
  fn default() -> Self {
    Self {
      publish_live: true,
      persist_with_live_prefix: true,
      log_extras: false,
      extras_period: None,
    }
  }
}

fn default_root_table() -> String {
  DEFAULT_ROOT_TABLE.to_string()
}

fn default_live_namespace() -> String {
  DEFAULT_LIVE_NAMESPACE.to_string()
}

fn default_source() -> String {
  DEFAULT_SOURCE.to_string()
}

fn default_true() -> bool {
  true
}

fn process_raw_config(raw: ConfigRaw) -> Result<Config> {
  let extras_period = match raw.options.extras_period.as_deref() {
    Some(text) => humantime::parse_duration(text).map_err(|e| Error::InvalidConfigValue {
      field: "options.extras_period".to_string(),
      message: format!("'{}' is not a duration: {}", text, e),
    })?,
    None => DEFAULT_EXTRAS_PERIOD,
  };

  Config {
    root_table: raw.root_table,
    live_namespace: raw.live_namespace,
    source: raw.source,
    options: Options {
      publish_live: raw.options.publish_live,
      persist_with_live_prefix: raw.options.persist_with_live_prefix,
      log_extras: raw.options.log_extras,
      extras_period,
    },
  }
  .validated()
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn test_empty_document_uses_defaults() {
    let config = Config::from_yaml_str("{}").unwrap();
    assert_eq!(config, Config::default());
  }

  #[test]
  fn test_full_document() {
    let yaml = r#"
root_table: Drivetrain/
live_namespace: Live
source: bench-rig
options:
  publish_live: false
  persist_with_live_prefix: false
  log_extras: true
  extras_period: 100ms
"#;
    let config = Config::from_yaml_str(yaml).unwrap();
    assert_eq!(
      config,
      Config {
        root_table: "/Drivetrain".to_string(),
        live_namespace: "Live".to_string(),
        source: "bench-rig".to_string(),
        options: Options {
          publish_live: false,
          persist_with_live_prefix: false,
          log_extras: true,
          extras_period: Duration::from_millis(100),
        },
      }
    );
  }

  #[test]
  fn test_unknown_field_is_rejected() {
    let err = Config::from_yaml_str("roottable: /Robot").unwrap_err();
    assert!(matches!(err, Error::ConfigParse(_)));
  }

  #[test]
  fn test_bad_period_is_rejected() {
    let err = Config::from_yaml_str("options:\n  extras_period: soon").unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { ref field, .. } if field == "options.extras_period"));

    let err = Config::from_yaml_str("options:\n  extras_period: 0s").unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { .. }));
  }

  #[test]
  fn test_live_namespace_slashes_are_trimmed() {
    let config = Config::default().live_namespace("NT/").validated().unwrap();
    assert_eq!(config.live_namespace, "NT");

    let config = Config::from_yaml_str("live_namespace: /Live/").unwrap();
    assert_eq!(config.live_namespace, "Live");
  }

  #[test]
  fn test_empty_root_table_is_rejected() {
    let err = Config::default().root_table("/").validated().unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { ref field, .. } if field == "root_table"));
  }
}
