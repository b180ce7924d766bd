//! Registry change stream consumer.
//!
//! Runs on a dedicated OS thread: reads block on the network, and decoded
//! notifications are handed to the coordination loop through a bounded tokio
//! channel. The thread exits once the receiving side is dropped.

use std::io::{BufRead, BufReader, Read};
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::mpsc;

use wikisync_core::error::RegistryError;
use wikisync_core::registry::RegistryClient;

pub const STREAM_CHANNEL_CAPACITY: usize = 8;
pub const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);
/// Pause before reconnecting after the server closed the stream cleanly.
pub const RECONNECT_PAUSE: Duration = Duration::from_secs(1);

const SLEEP_SLICE: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Updated,
    Removed,
}

impl ChangeKind {
    pub fn from_event_name(name: &str) -> Option<Self> {
        match name {
            "package.added" => Some(ChangeKind::Added),
            "package.updated" => Some(ChangeKind::Updated),
            "package.removed" => Some(ChangeKind::Removed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "package.added",
            ChangeKind::Updated => "package.updated",
            ChangeKind::Removed => "package.removed",
        }
    }
}

/// A package change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub package: String,
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventPayload {
    #[serde(default)]
    id: Option<String>,
    identifier: PackageIdentifier,
}

#[derive(Debug, Deserialize)]
struct PackageIdentifier {
    name: String,
}

// ---------------------------------------------------------------------------
// text/event-stream decoding
// ---------------------------------------------------------------------------

/// One dispatched `text/event-stream` message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
    pub id: Option<String>,
}

impl SseFrame {
    /// Interpret the frame as a package notification.
    ///
    /// Unknown event names and payloads without a package identifier yield
    /// `None`.
    pub fn to_change(&self) -> Option<ChangeEvent> {
        let kind = ChangeKind::from_event_name(self.event.as_deref()?)?;
        if self.data.is_empty() {
            return None;
        }
        let payload: EventPayload = serde_json::from_str(&self.data).ok()?;
        if payload.identifier.name.is_empty() {
            return None;
        }
        Some(ChangeEvent {
            kind,
            package: payload.identifier.name,
            id: self.id.clone().or(payload.id).filter(|id| !id.is_empty()),
        })
    }
}

/// Line-oriented decoder. Feed lines without their terminator.
#[derive(Debug, Default)]
pub struct SseDecoder {
    event: Option<String>,
    data: Vec<String>,
    id: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one line; a blank line dispatches the pending frame.
    pub fn push_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            "id" if !value.contains('\0') => self.id = Some(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        let id = self.id.take();
        if self.data.is_empty() && event.is_none() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame { event, data, id })
    }
}

// ---------------------------------------------------------------------------
// Backoff
// ---------------------------------------------------------------------------

/// Doubling reconnect delay with an upper bound.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Backoff {
            initial,
            max,
            current: initial,
        }
    }

    /// Delay to wait now; the following call returns double (capped).
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::new(INITIAL_BACKOFF, MAX_BACKOFF)
    }
}

// ---------------------------------------------------------------------------
// Consumer thread
// ---------------------------------------------------------------------------

/// Something that can open the change stream, resuming after an event id.
pub trait ChangeStreamSource: Send + 'static {
    fn open(&self, last_event_id: Option<&str>) -> Result<Box<dyn Read + Send>, RegistryError>;
}

impl ChangeStreamSource for RegistryClient {
    fn open(&self, last_event_id: Option<&str>) -> Result<Box<dyn Read + Send>, RegistryError> {
        let reader: Box<dyn Read + Send> = self.open_change_stream(last_event_id)?;
        Ok(reader)
    }
}

enum StreamEnd {
    /// Server closed the connection.
    Closed,
    /// The coordination loop is gone.
    ReceiverDropped,
}

/// Consume the change stream until `tx` is closed, reconnecting forever.
///
/// Must run on a thread outside the tokio runtime (`blocking_send`).
pub fn run_change_stream<S: ChangeStreamSource>(source: S, tx: mpsc::Sender<ChangeEvent>) {
    let mut backoff = Backoff::default();
    let mut last_id: Option<String> = None;

    while !tx.is_closed() {
        let delay = match source.open(last_id.as_deref()) {
            Ok(reader) => {
                backoff.reset();
                match pump(reader, &tx, &mut last_id) {
                    Ok(StreamEnd::ReceiverDropped) => break,
                    Ok(StreamEnd::Closed) => {
                        tracing::info!("change stream closed by server, reconnecting");
                        RECONNECT_PAUSE
                    }
                    Err(err) => {
                        let delay = backoff.next_delay();
                        tracing::warn!(error = %err, retry_in_ms = delay.as_millis() as u64, "change stream read failed");
                        delay
                    }
                }
            }
            Err(err) => {
                let delay = backoff.next_delay();
                tracing::warn!(error = %err, retry_in_ms = delay.as_millis() as u64, "change stream connect failed");
                delay
            }
        };
        if !pause(delay, &tx) {
            break;
        }
    }
    tracing::debug!("change stream consumer exiting");
}

fn pump(
    reader: Box<dyn Read + Send>,
    tx: &mpsc::Sender<ChangeEvent>,
    last_id: &mut Option<String>,
) -> std::io::Result<StreamEnd> {
    let mut decoder = SseDecoder::new();
    for line in BufReader::new(reader).lines() {
        let line = line?;
        if tx.is_closed() {
            return Ok(StreamEnd::ReceiverDropped);
        }
        let Some(frame) = decoder.push_line(&line) else {
            continue;
        };
        let Some(change) = frame.to_change() else {
            if let Some(id) = frame.id {
                *last_id = Some(id);
            }
            tracing::debug!(event = ?frame.event, "ignoring stream frame");
            continue;
        };
        if let Some(id) = &change.id {
            *last_id = Some(id.clone());
        }
        tracing::debug!(kind = change.kind.as_str(), package = %change.package, "change notification");
        if tx.blocking_send(change).is_err() {
            return Ok(StreamEnd::ReceiverDropped);
        }
    }
    Ok(StreamEnd::Closed)
}

/// Sleep for `total`, waking early when the receiver goes away.
fn pause(total: Duration, tx: &mpsc::Sender<ChangeEvent>) -> bool {
    let mut remaining = total;
    while !remaining.is_zero() {
        if tx.is_closed() {
            return false;
        }
        let step = remaining.min(SLEEP_SLICE);
        std::thread::sleep(step);
        remaining -= step;
    }
    !tx.is_closed()
}
