// Monitor Pipeline - Feed -> Parser -> Session
// One processing task; every frame is handled to completion in arrival order

use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::config::MonitorConfig;
use crate::core::types::{ConnectionStatus, TransactionEvent, UpstreamNotice};
use crate::feed::connection::{ConnectionError, FeedConnection};
use crate::feed::parser::FeedParser;
use crate::monitor::notify::{BellNotifier, LogNotifier, NotificationSink};
use crate::monitor::session::MonitorSession;
use crate::monitor::stats::SessionStats;

/// Pipeline statistics snapshot
#[derive(Debug, Clone)]
pub struct PipelineStats {
    pub status: ConnectionStatus,
    pub frames_received: u64,
    pub frames_processed: u64,
    pub frames_dropped: u64,
    pub session: SessionStats,
}

impl fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pipeline(status={}, received={}, processed={}, dropped={}, {})",
            self.status, self.frames_received, self.frames_processed, self.frames_dropped, self.session
        )
    }
}

/// Owns one feed connection and the session state derived from it.
/// Constructing a new pipeline yields a fresh connection and fresh, zeroed
/// session counters; both die with the pipeline.
pub struct MonitorPipeline {
    connection: Arc<FeedConnection>,
    session: Arc<RwLock<MonitorSession>>,
    frames_processed: Arc<RwLock<u64>>,
    frames_dropped: Arc<RwLock<u64>>,
    processing_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl MonitorPipeline {
    pub fn new(config: &MonitorConfig) -> Self {
        let sink: Box<dyn NotificationSink> = if config.session.bell_on_alert {
            Box::new(BellNotifier)
        } else {
            Box::new(LogNotifier)
        };
        Self::with_sink(config, sink)
    }

    /// Create a pipeline with an injected notification sink.
    pub fn with_sink(config: &MonitorConfig, sink: Box<dyn NotificationSink>) -> Self {
        Self {
            connection: Arc::new(FeedConnection::new(&config.feed)),
            session: Arc::new(RwLock::new(MonitorSession::new(&config.session, sink))),
            frames_processed: Arc::new(RwLock::new(0)),
            frames_dropped: Arc::new(RwLock::new(0)),
            processing_task: Mutex::new(None),
        }
    }

    /// Connect the feed and start the processing loop.
    pub async fn start(&self) -> Result<(), ConnectionError> {
        self.connection.connect().await?;

        let connection = self.connection.clone();
        let session = self.session.clone();
        let frames_processed = self.frames_processed.clone();
        let frames_dropped = self.frames_dropped.clone();

        let handle = tokio::spawn(async move {
            let mut parser = FeedParser::new();

            while let Some(raw) = connection.recv().await {
                // recv() re-checks the closed flag, but a stop() racing the
                // dispatch must still win
                if connection.is_closed() {
                    break;
                }
                match parser.parse(&raw) {
                    Ok(message) => {
                        session.write().handle_message(message);
                        *frames_processed.write() += 1;
                    }
                    Err(e) => {
                        // Malformed frame: log, drop, keep the session alive
                        *frames_dropped.write() += 1;
                        warn!(error = %e, "Dropping malformed frame");
                    }
                }
            }
            debug!("Processing loop ended");
        });

        *self.processing_task.lock() = Some(handle);
        info!("Monitor pipeline started");
        Ok(())
    }

    /// Close the connection and stop the processing loop. Idempotent and
    /// safe at any time: no handler runs after this returns.
    pub fn stop(&self) {
        self.connection.close();
        if let Some(handle) = self.processing_task.lock().take() {
            // Handlers hold no await points, so abort can only land
            // between frames
            handle.abort();
        }
        info!("Monitor pipeline stopped");
    }

    pub fn is_running(&self) -> bool {
        self.processing_task
            .lock()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// The sole externally observable health signal.
    pub fn status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    // ========================================================================
    // Read-only snapshots for the presentation layer
    // ========================================================================

    pub fn transactions(&self) -> Vec<TransactionEvent> {
        self.session.read().transactions()
    }

    pub fn alerts(&self) -> Vec<TransactionEvent> {
        self.session.read().alerts()
    }

    pub fn notices(&self) -> Vec<UpstreamNotice> {
        self.session.read().notices()
    }

    pub fn session_stats(&self) -> SessionStats {
        self.session.read().stats()
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            status: self.connection.status(),
            frames_received: self.connection.frame_count(),
            frames_processed: *self.frames_processed.read(),
            frames_dropped: *self.frames_dropped.read(),
            session: self.session.read().stats(),
        }
    }
}

impl Drop for MonitorPipeline {
    fn drop(&mut self) {
        self.connection.close();
        if let Some(handle) = self.processing_task.lock().take() {
            handle.abort();
        }
    }
}
