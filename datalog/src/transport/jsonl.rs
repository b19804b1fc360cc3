use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;
use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;

use super::{Metadata, Transport, TransportError};
use crate::value::{Value, ValueKind};

/// One line of a JSON-lines data log.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Record<'a> {
  Start {
    entry: u32,
    name: &'a str,
    kind: ValueKind,
    metadata: &'a Metadata,
    timestamp: u64,
  },
  Data {
    entry: u32,
    timestamp: u64,
    #[serde(serialize_with = "serialize_value")]
    value: &'a Value,
  },
}

/// JSON has no literal for non-finite floats, so they are written as the
/// strings `"NaN"`, `"Infinity"` and `"-Infinity"` instead of `null`.
fn serialize_value<S: Serializer>(value: &&Value, serializer: S) -> Result<S::Ok, S::Error> {
  match *value {
    Value::Float(v) => serialize_float(*v, serializer),
    Value::FloatArray(values) => {
      let mut seq = serializer.serialize_seq(Some(values.len()))?;
      for v in values {
        seq.serialize_element(&LoggedFloat(*v))?;
      }
      seq.end()
    }
    other => other.serialize(serializer),
  }
}

struct LoggedFloat(f64);

impl Serialize for LoggedFloat {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serialize_float(self.0, serializer)
  }
}

fn serialize_float<S: Serializer>(v: f64, serializer: S) -> Result<S::Ok, S::Error> {
  if v.is_finite() {
    serializer.serialize_f64(v)
  } else if v.is_nan() {
    serializer.serialize_str("NaN")
  } else if v > 0.0 {
    serializer.serialize_str("Infinity")
  } else {
    serializer.serialize_str("-Infinity")
  }
}

/// The handle type of a [`JsonLinesTransport`].
#[derive(Debug)]
pub struct JsonLinesEntry {
  id: u32,
}

impl JsonLinesEntry {
  pub fn id(&self) -> u32 {
    self.id
  }
}

/// A persistent transport that appends one JSON object per line to a file.
///
/// Creating a handle writes a `start` record naming the entry; every append
/// writes a `data` record referencing the entry id. Records are buffered; call
/// [`flush`](Self::flush) to force them to disk. The buffer is also flushed
/// on drop.
#[derive(Debug)]
pub struct JsonLinesTransport {
  path: PathBuf,
  writer: Mutex<BufWriter<File>>,
  next_entry: AtomicU32,
}

impl JsonLinesTransport {
  /// Opens (or creates) the log file at `path` in append mode, creating
  /// parent directories as needed.
  pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
    let path = path.as_ref();
    if let Some(parent_dir) = path.parent() {
      if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
        fs::create_dir_all(parent_dir)?;
      }
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;

    Ok(Self {
      path: path.to_path_buf(),
      writer: Mutex::new(BufWriter::new(file)),
      next_entry: AtomicU32::new(1),
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn flush(&self) -> io::Result<()> {
    self.writer.lock().flush()
  }

  fn write_record(&self, record: &Record<'_>) -> Result<(), TransportError> {
    let mut line = serde_json::to_vec(record)?;
    line.push(b'\n');
    self.writer.lock().write_all(&line)?;
    Ok(())
  }
}

impl Transport for JsonLinesTransport {
  type Handle = JsonLinesEntry;

  fn create(
    &self,
    kind: ValueKind,
    path: &str,
    metadata: &Metadata,
    timestamp: u64,
  ) -> Result<Self::Handle, TransportError> {
    let id = self.next_entry.fetch_add(1, Ordering::Relaxed);
    self.write_record(&Record::Start {
      entry: id,
      name: path,
      kind,
      metadata,
      timestamp,
    })?;
    Ok(JsonLinesEntry { id })
  }

  fn append(
    &self,
    handle: &mut Self::Handle,
    value: &Value,
    timestamp: u64,
  ) -> Result<(), TransportError> {
    self.write_record(&Record::Data {
      entry: handle.id,
      timestamp,
      value,
    })
  }
}
