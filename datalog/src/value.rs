//! The closed set of sample shapes a data logger accepts.
//!
//! Every write resolves to one [`Value`]. Unit-tagged measurements are not a
//! separate kind: they become a [`Value::Float`] under a key decorated with the
//! unit abbreviation (see [`decorate_key`]).

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;

/// The kind of a [`Value`], used to select the per-kind handle cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
  Bool,
  Int,
  Float,
  FloatArray,
  Text,
  TextArray,
}

impl ValueKind {
  /// The number of distinct kinds.
  pub const COUNT: usize = 6;

  /// Every kind, in cache index order.
  pub const ALL: [ValueKind; ValueKind::COUNT] = [
    ValueKind::Bool,
    ValueKind::Int,
    ValueKind::Float,
    ValueKind::FloatArray,
    ValueKind::Text,
    ValueKind::TextArray,
  ];

  /// A dense index in `0..COUNT`.
  #[inline]
  pub const fn index(self) -> usize {
    match self {
      ValueKind::Bool => 0,
      ValueKind::Int => 1,
      ValueKind::Float => 2,
      ValueKind::FloatArray => 3,
      ValueKind::Text => 4,
      ValueKind::TextArray => 5,
    }
  }

  /// The type name transports use when registering an entry.
  pub const fn type_name(self) -> &'static str {
    match self {
      ValueKind::Bool => "boolean",
      ValueKind::Int => "int64",
      ValueKind::Float => "double",
      ValueKind::FloatArray => "double[]",
      ValueKind::Text => "string",
      ValueKind::TextArray => "string[]",
    }
  }
}

impl fmt::Display for ValueKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.type_name())
  }
}

/// A single sample payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
  Bool(bool),
  Int(i64),
  Float(f64),
  FloatArray(Vec<f64>),
  Text(String),
  TextArray(Vec<String>),
}

impl Value {
  pub fn kind(&self) -> ValueKind {
    match self {
      Value::Bool(_) => ValueKind::Bool,
      Value::Int(_) => ValueKind::Int,
      Value::Float(_) => ValueKind::Float,
      Value::FloatArray(_) => ValueKind::FloatArray,
      Value::Text(_) => ValueKind::Text,
      Value::TextArray(_) => ValueKind::TextArray,
    }
  }
}

// --- Conversions ---

macro_rules! impl_from_scalar {
  ($variant:ident, $target:ty, $($source:ty),+ $(,)?) => {
    $(
      impl From<$source> for Value {
        #[inline]
        fn from(value: $source) -> Self {
          Value::$variant(<$target>::from(value))
        }
      }
    )+
  };
}

impl_from_scalar!(Bool, bool, bool);
impl_from_scalar!(Int, i64, i64, i32, i16, u32, u16, u8);
impl_from_scalar!(Float, f64, f64, f32);

impl From<Vec<f64>> for Value {
  fn from(value: Vec<f64>) -> Self {
    Value::FloatArray(value)
  }
}

impl From<&[f64]> for Value {
  fn from(value: &[f64]) -> Self {
    Value::FloatArray(value.to_vec())
  }
}

impl<const N: usize> From<[f64; N]> for Value {
  fn from(value: [f64; N]) -> Self {
    Value::FloatArray(value.to_vec())
  }
}

impl From<String> for Value {
  fn from(value: String) -> Self {
    Value::Text(value)
  }
}

impl From<&str> for Value {
  fn from(value: &str) -> Self {
    Value::Text(value.to_owned())
  }
}

impl From<&String> for Value {
  fn from(value: &String) -> Self {
    Value::Text(value.clone())
  }
}

impl From<Vec<String>> for Value {
  fn from(value: Vec<String>) -> Self {
    Value::TextArray(value)
  }
}

impl From<&[String]> for Value {
  fn from(value: &[String]) -> Self {
    Value::TextArray(value.to_vec())
  }
}

impl From<&[&str]> for Value {
  fn from(value: &[&str]) -> Self {
    Value::TextArray(value.iter().map(|s| (*s).to_owned()).collect())
  }
}

// --- Measurements ---

/// A numeric value tagged with a physical unit.
///
/// Implement this for the unit types of whatever units library the caller
/// uses; the logger only needs the magnitude and the unit's abbreviation.
pub trait Measure {
  /// The numeric magnitude in the value's own unit.
  fn magnitude(&self) -> f64;

  /// The unit abbreviation, e.g. `"m"` or `"deg"`.
  fn abbreviation(&self) -> &str;
}

/// A plain, owned [`Measure`].
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
  pub value: f64,
  pub unit: Cow<'static, str>,
}

impl Measurement {
  pub fn new(value: f64, unit: impl Into<Cow<'static, str>>) -> Self {
    Self {
      value,
      unit: unit.into(),
    }
  }
}

impl Measure for Measurement {
  fn magnitude(&self) -> f64 {
    self.value
  }

  fn abbreviation(&self) -> &str {
    &self.unit
  }
}

impl<M: Measure + ?Sized> Measure for &M {
  fn magnitude(&self) -> f64 {
    (**self).magnitude()
  }

  fn abbreviation(&self) -> &str {
    (**self).abbreviation()
  }
}

/// Appends a unit abbreviation to a key: `("Arm/Height", "m")` becomes
/// `"Arm/Height(m)"`.
pub fn decorate_key(key: &str, unit: &str) -> String {
  let mut decorated = String::with_capacity(key.len() + unit.len() + 2);
  decorated.push_str(key);
  decorated.push('(');
  decorated.push_str(unit);
  decorated.push(')');
  decorated
}

/// Resolves a measurement into the key and payload actually written.
pub fn resolve_measure<M: Measure + ?Sized>(key: &str, measure: &M) -> (String, Value) {
  (
    decorate_key(key, measure.abbreviation()),
    Value::Float(measure.magnitude()),
  )
}
