// Feed Connection - Persistent WebSocket consumer for the monitor feed
// Consume-only transport with reconnect and a public health flag

use futures::{SinkExt, StreamExt};
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, Notify, RwLock as AsyncRwLock};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{debug, error, info, warn};

use crate::core::config::FeedConfig;
use crate::core::types::ConnectionStatus;

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("WebSocket transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("Connection already closed")]
    Closed,
}

// ============================================================================
// FeedConnection
// ============================================================================

/// Owns one persistent connection to the monitor feed endpoint.
///
/// Inbound text frames are forwarded in arrival order through an unbounded
/// channel to the single consumer. Transport failures never surface to the
/// caller directly; the shared `ConnectionStatus` flag is the only health
/// signal. `close()` is idempotent and safe at any time: once it returns,
/// `recv()` yields `None` and no further frame is delivered.
pub struct FeedConnection {
    url: String,
    state: Arc<RwLock<ConnectionStatus>>,
    frame_count: Arc<RwLock<u64>>,
    error_count: Arc<RwLock<u64>>,
    frame_rx: AsyncRwLock<Option<mpsc::UnboundedReceiver<String>>>,
    closed: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    max_reconnect_attempts: u32,
    reconnect_max_delay_secs: u64,
}

impl FeedConnection {
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            url: config.endpoint.clone(),
            state: Arc::new(RwLock::new(ConnectionStatus::Disconnected)),
            frame_count: Arc::new(RwLock::new(0)),
            error_count: Arc::new(RwLock::new(0)),
            frame_rx: AsyncRwLock::new(None),
            closed: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(Notify::new()),
            max_reconnect_attempts: config.max_reconnect_attempts,
            reconnect_max_delay_secs: config.reconnect_max_delay_secs,
        }
    }

    /// Begin the handshake and spawn the feed task. Establishment failures
    /// are reported through the status flag, not returned here.
    pub async fn connect(&self) -> Result<(), ConnectionError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ConnectionError::Closed);
        }

        info!(url = %self.url, "Connecting to monitor feed");
        *self.state.write() = ConnectionStatus::Connecting;

        let (frame_tx, frame_rx) = mpsc::unbounded_channel::<String>();
        *self.frame_rx.write().await = Some(frame_rx);

        let url = self.url.clone();
        let state = self.state.clone();
        let frame_count = self.frame_count.clone();
        let error_count = self.error_count.clone();
        let closed = self.closed.clone();
        let shutdown = self.shutdown.clone();
        let max_attempts = self.max_reconnect_attempts;
        let max_delay = self.reconnect_max_delay_secs;

        tokio::spawn(run_feed(
            url,
            state,
            frame_count,
            error_count,
            frame_tx,
            closed,
            shutdown,
            max_attempts,
            max_delay,
        ));

        Ok(())
    }

    /// Receive the next frame in arrival order. Returns `None` once the
    /// connection is closed and the channel is drained or abandoned.
    pub async fn recv(&self) -> Option<String> {
        if self.closed.load(Ordering::SeqCst) {
            return None;
        }

        let mut rx_lock = self.frame_rx.write().await;
        let rx = rx_lock.as_mut()?;
        let frame = rx.recv().await?;

        // A frame already buffered when close() ran must not be dispatched
        if self.closed.load(Ordering::SeqCst) {
            return None;
        }
        Some(frame)
    }

    /// Stop the feed task and release the transport. Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("Feed connection already closed");
            return;
        }
        info!("Closing feed connection");
        self.shutdown.notify_one();
        *self.state.write() = ConnectionStatus::Disconnected;
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.state.read()
    }

    pub fn is_connected(&self) -> bool {
        *self.state.read() == ConnectionStatus::Connected
    }

    pub fn frame_count(&self) -> u64 {
        *self.frame_count.read()
    }

    pub fn error_count(&self) -> u64 {
        *self.error_count.read()
    }

    pub fn stats(&self) -> FeedConnectionStats {
        FeedConnectionStats {
            state: *self.state.read(),
            frame_count: *self.frame_count.read(),
            error_count: *self.error_count.read(),
        }
    }
}

impl Drop for FeedConnection {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        self.shutdown.notify_one();
        *self.state.write() = ConnectionStatus::Disconnected;
        debug!("Feed connection dropped");
    }
}

/// Connection statistics snapshot
#[derive(Debug, Clone)]
pub struct FeedConnectionStats {
    pub state: ConnectionStatus,
    pub frame_count: u64,
    pub error_count: u64,
}

impl fmt::Display for FeedConnectionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FeedConnectionStats(state={:?}, frames={}, errors={})",
            self.state, self.frame_count, self.error_count
        )
    }
}

// ============================================================================
// Feed task
// ============================================================================

enum StreamEnd {
    Shutdown,
    ServerClosed,
}

/// Main feed loop with reconnection and exponential backoff.
#[allow(clippy::too_many_arguments)]
async fn run_feed(
    url: String,
    state: Arc<RwLock<ConnectionStatus>>,
    frame_count: Arc<RwLock<u64>>,
    error_count: Arc<RwLock<u64>>,
    frame_tx: mpsc::UnboundedSender<String>,
    closed: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    max_reconnect_attempts: u32,
    reconnect_max_delay_secs: u64,
) {
    let mut reconnect_attempt = 0u32;

    loop {
        if closed.load(Ordering::SeqCst) {
            break;
        }

        match stream_frames(&url, &state, &frame_count, &frame_tx, &shutdown).await {
            Ok(StreamEnd::Shutdown) => {
                debug!("Feed task shutting down");
                break;
            }
            Ok(StreamEnd::ServerClosed) => {
                info!("Feed connection ended by server");
            }
            Err(e) => {
                error!(error = %e, "Feed connection error");
                *error_count.write() += 1;
            }
        }

        if closed.load(Ordering::SeqCst) {
            break;
        }

        if reconnect_attempt >= max_reconnect_attempts {
            error!(
                max_attempts = max_reconnect_attempts,
                "Max reconnection attempts reached"
            );
            *state.write() = ConnectionStatus::Failed;
            return;
        }

        let delay_secs = std::cmp::min(2_u64.saturating_pow(reconnect_attempt), reconnect_max_delay_secs);
        reconnect_attempt += 1;

        warn!(
            delay_secs = delay_secs,
            attempt = reconnect_attempt,
            max = max_reconnect_attempts,
            "Reconnecting to monitor feed"
        );
        *state.write() = ConnectionStatus::Reconnecting;

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(delay_secs)) => {}
            _ = shutdown.notified() => break,
        }
    }

    *state.write() = ConnectionStatus::Disconnected;
}

/// One connection attempt: handshake, then forward frames until the server
/// closes, the transport fails, or shutdown is requested.
async fn stream_frames(
    url: &str,
    state: &Arc<RwLock<ConnectionStatus>>,
    frame_count: &Arc<RwLock<u64>>,
    frame_tx: &mpsc::UnboundedSender<String>,
    shutdown: &Arc<Notify>,
) -> Result<StreamEnd, ConnectionError> {
    debug!(url = url, "Opening feed transport");

    let (ws_stream, _) = tokio::select! {
        result = connect_async(url) => result?,
        _ = shutdown.notified() => return Ok(StreamEnd::Shutdown),
    };

    info!("Monitor feed connected");
    *state.write() = ConnectionStatus::Connected;

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            msg_result = read.next() => {
                match msg_result {
                    Some(Ok(Message::Text(text))) => {
                        *frame_count.write() += 1;
                        if frame_tx.send(text).is_err() {
                            // Consumer gone, nothing left to feed
                            return Ok(StreamEnd::Shutdown);
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = write.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Binary(data))) => {
                        warn!(bytes = data.len(), "Unexpected binary frame, skipping");
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Feed closed by server");
                        return Ok(StreamEnd::ServerClosed);
                    }
                    Some(Ok(Message::Frame(_))) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => return Ok(StreamEnd::ServerClosed),
                }
            }
            _ = shutdown.notified() => return Ok(StreamEnd::Shutdown),
        }
    }
}
