use crate::types::{Arm, DeviceEvent, DeviceHandle, EventKind, Pose, XDirection};
use glam::Quat;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::VecDeque;
use thiserror::Error;

/// Envelope tag used by Myo Connect for device events.
const EVENT_TAG: &str = "event";

/// Longest accepted feed line, newline excluded. Longer lines are dropped.
pub const MAX_LINE_LEN: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Feed line is not valid UTF-8")]
    InvalidUtf8,
    #[error("Malformed feed line: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Not a device event (envelope tag {0:?})")]
    NotAnEvent(String),
    #[error("Unsupported event type {0:?}")]
    Unsupported(String),
    #[error("Feed line longer than {} bytes dropped", MAX_LINE_LEN)]
    LineTooLong,
}

#[derive(Debug, Deserialize)]
struct WireQuat {
    w: f32,
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent {
    Paired {
        myo: DeviceHandle,
        #[serde(default, deserialize_with = "timestamp")]
        timestamp: u64,
        #[serde(default)]
        version: Vec<u32>,
    },
    Unpaired {
        myo: DeviceHandle,
        #[serde(default, deserialize_with = "timestamp")]
        timestamp: u64,
    },
    Orientation {
        myo: DeviceHandle,
        #[serde(default, deserialize_with = "timestamp")]
        timestamp: u64,
        orientation: WireQuat,
    },
    Pose {
        myo: DeviceHandle,
        #[serde(default, deserialize_with = "timestamp")]
        timestamp: u64,
        pose: Pose,
    },
    ArmSynced {
        myo: DeviceHandle,
        #[serde(default, deserialize_with = "timestamp")]
        timestamp: u64,
        #[serde(default)]
        arm: Arm,
        #[serde(default)]
        x_direction: XDirection,
    },
    ArmUnsynced {
        myo: DeviceHandle,
        #[serde(default, deserialize_with = "timestamp")]
        timestamp: u64,
    },
    Locked {
        myo: DeviceHandle,
        #[serde(default, deserialize_with = "timestamp")]
        timestamp: u64,
    },
    Unlocked {
        myo: DeviceHandle,
        #[serde(default, deserialize_with = "timestamp")]
        timestamp: u64,
    },
    #[serde(other)]
    Other,
}

/// Myo Connect sends timestamps as decimal strings; recordings use numbers.
fn timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(d)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

impl WireEvent {
    fn into_event(self) -> Option<DeviceEvent> {
        let (device, timestamp, kind) = match self {
            WireEvent::Paired {
                myo,
                timestamp,
                version,
            } => (myo, timestamp, EventKind::Paired { firmware: version }),
            WireEvent::Unpaired { myo, timestamp } => (myo, timestamp, EventKind::Unpaired),
            WireEvent::Orientation {
                myo,
                timestamp,
                orientation: q,
            } => (
                myo,
                timestamp,
                EventKind::Orientation(Quat::from_xyzw(q.x, q.y, q.z, q.w)),
            ),
            WireEvent::Pose {
                myo,
                timestamp,
                pose,
            } => (myo, timestamp, EventKind::Pose(pose)),
            WireEvent::ArmSynced {
                myo,
                timestamp,
                arm,
                x_direction,
            } => (myo, timestamp, EventKind::ArmSynced { arm, x_direction }),
            WireEvent::ArmUnsynced { myo, timestamp } => (myo, timestamp, EventKind::ArmUnsynced),
            WireEvent::Locked { myo, timestamp } => (myo, timestamp, EventKind::Locked),
            WireEvent::Unlocked { myo, timestamp } => (myo, timestamp, EventKind::Unlocked),
            WireEvent::Other => return None,
        };

        Some(DeviceEvent {
            device,
            timestamp,
            kind,
        })
    }
}

/// Streaming parser for the newline-delimited JSON event feed.
///
/// Feed raw bytes via `push_data`, then drain parsed events via `next_event`.
/// Lines may be split across reads at any byte. A line that grows past
/// `MAX_LINE_LEN` is reported once and skipped up to its newline.
pub struct FeedParser {
    buffer: VecDeque<u8>,
    /// Inside an overlong line whose head was already dropped.
    discarding: bool,
}

impl Default for FeedParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedParser {
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::with_capacity(4096),
            discarding: false,
        }
    }

    /// Append received bytes to the internal buffer.
    pub fn push_data(&mut self, data: &[u8]) {
        self.buffer.extend(data);
    }

    /// Try to extract the next event from the buffer.
    /// Returns `None` once no complete line is left. Blank lines are skipped.
    pub fn next_event(&mut self) -> Option<Result<DeviceEvent, ProtocolError>> {
        loop {
            let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') else {
                return self.drop_overlong();
            };
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if std::mem::take(&mut self.discarding) {
                continue;
            }
            if newline > MAX_LINE_LEN {
                return Some(Err(ProtocolError::LineTooLong));
            }
            if let Some(result) = parse_bytes(&line) {
                return Some(result);
            }
        }
    }

    /// Parse whatever is left after the source hit EOF without a final newline.
    pub fn finish(&mut self) -> Option<Result<DeviceEvent, ProtocolError>> {
        let rest: Vec<u8> = self.buffer.drain(..).collect();
        if std::mem::take(&mut self.discarding) {
            return None;
        }
        if rest.len() > MAX_LINE_LEN {
            return Some(Err(ProtocolError::LineTooLong));
        }
        parse_bytes(&rest)
    }

    /// Clear an unterminated line that is already too long. Only the first
    /// drop of a line is reported.
    fn drop_overlong(&mut self) -> Option<Result<DeviceEvent, ProtocolError>> {
        if self.buffer.len() <= MAX_LINE_LEN {
            return None;
        }
        self.buffer.clear();
        if std::mem::replace(&mut self.discarding, true) {
            None
        } else {
            Some(Err(ProtocolError::LineTooLong))
        }
    }
}

fn parse_bytes(line: &[u8]) -> Option<Result<DeviceEvent, ProtocolError>> {
    let text = match std::str::from_utf8(line) {
        Ok(text) => text.trim(),
        Err(_) => return Some(Err(ProtocolError::InvalidUtf8)),
    };
    if text.is_empty() {
        return None;
    }
    Some(parse_line(text))
}

/// Parse one feed line, either a bare event object or `["event", {...}]`.
pub fn parse_line(line: &str) -> Result<DeviceEvent, ProtocolError> {
    let body = match serde_json::from_str::<Value>(line)? {
        Value::Array(items) => unwrap_envelope(items)?,
        other => other,
    };

    let kind = body
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();

    let wire: WireEvent = serde_json::from_value(body)?;
    wire.into_event().ok_or(ProtocolError::Unsupported(kind))
}

fn unwrap_envelope(items: Vec<Value>) -> Result<Value, ProtocolError> {
    let mut items = items.into_iter();
    match (items.next(), items.next(), items.next()) {
        (Some(Value::String(tag)), Some(body), None) if tag == EVENT_TAG => Ok(body),
        (Some(Value::String(tag)), _, _) => Err(ProtocolError::NotAnEvent(tag)),
        _ => Err(ProtocolError::NotAnEvent(String::new())),
    }
}
