pub mod protocol;
pub mod types;

use anyhow::{Context, Result};
use protocol::FeedParser;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, error::TryRecvError};
pub use types::{Arm, DeviceEvent, DeviceHandle, EventKind, Pose, XDirection};

/// Default Myo Connect bridge endpoint.
pub const DEFAULT_FEED_ADDR: &str = "127.0.0.1:10138";

/// Item drained from the feed by the main loop.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedItem {
    Event(DeviceEvent),
    /// The source ended; no further events will arrive.
    Closed,
}

/// Client for an armband event feed.
///
/// A background task reads the source, parses events and forwards them over a
/// channel. The owner drains them with `try_recv` at its own tick rate.
pub struct SensorClient {
    event_rx: mpsc::UnboundedReceiver<DeviceEvent>,
    _task: tokio::task::JoinHandle<()>,
}

impl SensorClient {
    /// Connect to a bridge that streams the feed over TCP.
    pub async fn connect(addr: &str) -> Result<Self> {
        tracing::info!(%addr, "Connecting to armband feed");

        let stream = TcpStream::connect(addr)
            .await
            .with_context(|| format!("connecting to {addr}"))?;
        tracing::info!("Connected to armband feed");

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(feed_read_loop(stream, event_tx));

        Ok(Self {
            event_rx,
            _task: task,
        })
    }

    /// Replay a recorded feed file, pacing events by their timestamps.
    ///
    /// `speed` divides the recorded gaps; `0.0` replays as fast as possible.
    pub async fn replay(path: &Path, speed: f32) -> Result<Self> {
        let contents = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading recording {}", path.display()))?;
        tracing::info!(path = %path.display(), bytes = contents.len(), speed, "Replaying recorded feed");

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(replay_loop(contents, event_tx, speed));

        Ok(Self {
            event_rx,
            _task: task,
        })
    }

    /// Create a feed that never delivers events, for running without hardware.
    pub fn mock() -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            // Keep the sender alive.
            let _tx = event_tx;
            tokio::signal::ctrl_c().await.ok();
        });
        Self {
            event_rx,
            _task: task,
        }
    }

    /// Take the next pending event without waiting.
    pub fn try_recv(&mut self) -> Option<FeedItem> {
        match self.event_rx.try_recv() {
            Ok(event) => Some(FeedItem::Event(event)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(FeedItem::Closed),
        }
    }
}

/// Background task: read the stream, parse lines, forward events.
async fn feed_read_loop<R: AsyncRead + Unpin>(
    mut reader: R,
    event_tx: mpsc::UnboundedSender<DeviceEvent>,
) {
    let mut parser = FeedParser::new();
    let mut buf = [0u8; 4096];
    let mut event_count: u64 = 0;

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                tracing::warn!("Armband feed closed");
                if let Some(result) = parser.finish() {
                    forward(result, &event_tx);
                }
                break;
            }
            Ok(n) => {
                parser.push_data(&buf[..n]);

                // Drain all available events.
                while let Some(result) = parser.next_event() {
                    if !forward(result, &event_tx) {
                        tracing::debug!("Event receiver dropped, reader exiting");
                        return;
                    }
                    event_count += 1;
                    if event_count % 1000 == 0 {
                        tracing::debug!(event_count, "Feed lines processed");
                    }
                }
            }
            Err(e) => {
                tracing::error!(?e, "Armband feed read error");
                break;
            }
        }
    }
}

async fn replay_loop(contents: Vec<u8>, event_tx: mpsc::UnboundedSender<DeviceEvent>, speed: f32) {
    let mut parser = FeedParser::new();
    parser.push_data(&contents);

    let mut last_timestamp: Option<u64> = None;
    while let Some(result) = parser.next_event().or_else(|| parser.finish()) {
        if let Ok(event) = &result {
            if event.timestamp > 0 {
                if let Some(gap) = replay_gap(last_timestamp, event.timestamp, speed) {
                    tokio::time::sleep(gap).await;
                }
                last_timestamp = Some(event.timestamp);
            }
        }

        if !forward(result, &event_tx) {
            return;
        }
    }

    tracing::info!("Recording finished");
}

/// Wall-clock delay before an event recorded at `timestamp` (microseconds).
fn replay_gap(last: Option<u64>, timestamp: u64, speed: f32) -> Option<Duration> {
    if speed <= 0.0 {
        return None;
    }
    let delta = timestamp.saturating_sub(last?);
    if delta == 0 {
        return None;
    }
    Some(Duration::from_micros((delta as f64 / speed as f64) as u64))
}

/// Returns false once the receiver is gone.
fn forward(
    result: Result<DeviceEvent, protocol::ProtocolError>,
    event_tx: &mpsc::UnboundedSender<DeviceEvent>,
) -> bool {
    match result {
        Ok(event) => event_tx.send(event).is_ok(),
        Err(protocol::ProtocolError::NotAnEvent(tag)) => {
            tracing::trace!(%tag, "Skipping non-event message");
            true
        }
        Err(e) => {
            tracing::warn!(%e, "Skipping feed line");
            true
        }
    }
}
