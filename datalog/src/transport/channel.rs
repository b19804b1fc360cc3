use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use fibre::mpsc::{self, BoundedReceiver, BoundedSender};
use fibre::TrySendError;

use super::{Metadata, Transport, TransportError};
use crate::value::{Value, ValueKind};

/// A message published by a [`ChannelTransport`].
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
  /// A new topic was registered. Always precedes its first `Update`.
  Announce {
    topic: u32,
    path: String,
    kind: ValueKind,
    /// The topic properties, as a JSON object.
    properties: String,
  },
  /// A new value for a previously announced topic.
  Update {
    topic: u32,
    timestamp: u64,
    value: Value,
  },
}

/// The receiving half handed to live consumers.
pub type LiveReceiver = BoundedReceiver<LiveEvent>;

/// The handle type of a [`ChannelTransport`].
#[derive(Debug)]
pub struct Topic {
  id: u32,
}

impl Topic {
  pub fn id(&self) -> u32 {
    self.id
  }
}

/// A live transport that publishes onto a bounded `fibre` channel.
///
/// Announcements must be delivered: if the channel is full, `create` fails and
/// the next write for that key tries again. Updates are best-effort: a full
/// channel drops the update and bumps [`dropped`](Self::dropped) so a slow
/// consumer never stalls the control loop. A disconnected consumer is an error
/// either way.
pub struct ChannelTransport {
  tx: BoundedSender<LiveEvent>,
  next_topic: AtomicU32,
  dropped: AtomicU64,
}

impl fmt::Debug for ChannelTransport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ChannelTransport")
      .field("next_topic", &self.next_topic)
      .field("dropped", &self.dropped)
      .finish_non_exhaustive()
  }
}

impl ChannelTransport {
  /// Creates a transport and the receiver a live consumer reads from.
  pub fn channel(capacity: usize) -> (Self, LiveReceiver) {
    let (tx, rx) = mpsc::bounded(capacity);
    let transport = Self {
      tx,
      next_topic: AtomicU32::new(0),
      dropped: AtomicU64::new(0),
    };
    (transport, rx)
  }

  /// The number of updates dropped because the channel was full.
  pub fn dropped(&self) -> u64 {
    self.dropped.load(Ordering::Relaxed)
  }
}

impl Transport for ChannelTransport {
  type Handle = Topic;

  fn create(
    &self,
    kind: ValueKind,
    path: &str,
    metadata: &Metadata,
    _timestamp: u64,
  ) -> Result<Self::Handle, TransportError> {
    let id = self.next_topic.fetch_add(1, Ordering::Relaxed);
    let announce = LiveEvent::Announce {
      topic: id,
      path: path.to_owned(),
      kind,
      properties: metadata.to_json(),
    };

    match self.tx.try_send(announce) {
      Ok(()) => Ok(Topic { id }),
      Err(TrySendError::Full(_)) => Err(TransportError::new(format!(
        "live channel full, could not announce '{}'",
        path
      ))),
      Err(_) => Err(TransportError::new("live channel closed")),
    }
  }

  fn append(
    &self,
    handle: &mut Self::Handle,
    value: &Value,
    timestamp: u64,
  ) -> Result<(), TransportError> {
    let update = LiveEvent::Update {
      topic: handle.id,
      timestamp,
      value: value.clone(),
    };

    match self.tx.try_send(update) {
      Ok(()) => Ok(()),
      Err(TrySendError::Full(_)) => {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        Ok(())
      }
      Err(_) => Err(TransportError::new("live channel closed")),
    }
  }
}
