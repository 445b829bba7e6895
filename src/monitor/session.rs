// Monitor Session - Per-connection derived state
// Owns the windows, the counters and the notification sink; a new
// connection gets a new, zeroed session

use tracing::{debug, warn};

use crate::core::config::SessionConfig;
use crate::core::types::{TransactionEvent, UpstreamNotice};
use crate::feed::parser::FeedMessage;
use crate::monitor::classifier::classify;
use crate::monitor::notify::NotificationSink;
use crate::monitor::stats::SessionStats;
use crate::monitor::window::WindowBuffer;

/// All state derived from one feed connection: the transaction window, the
/// alert feed, the bounded operator-notice window and the session counters.
/// Each message is handled to completion before the next one arrives.
pub struct MonitorSession {
    transactions: WindowBuffer<TransactionEvent>,
    alert_feed: WindowBuffer<TransactionEvent>,
    notices: WindowBuffer<UpstreamNotice>,
    stats: SessionStats,
    sink: Box<dyn NotificationSink>,
    upstream_errors: u64,
}

impl MonitorSession {
    pub fn new(config: &SessionConfig, sink: Box<dyn NotificationSink>) -> Self {
        Self {
            transactions: WindowBuffer::new(config.transaction_window_cap),
            alert_feed: WindowBuffer::new(config.alert_feed_cap),
            notices: WindowBuffer::new(config.notice_window_cap),
            stats: SessionStats::new(),
            sink,
            upstream_errors: 0,
        }
    }

    /// Handle one parsed frame in arrival order.
    pub fn handle_message(&mut self, message: FeedMessage) {
        match message {
            FeedMessage::Transaction(event) => self.process(event),
            FeedMessage::UpstreamError { message } => self.record_upstream_error(message),
            FeedMessage::Ignored { tag } => {
                debug!(tag = %tag, "Ignoring frame with unknown tag");
            }
        }
    }

    /// Process one transaction: classify, buffer, count, then cue.
    pub fn process(&mut self, event: TransactionEvent) {
        let classification = classify(&event);

        if classification.is_alert {
            self.alert_feed.push(event.clone());
        }
        self.transactions.push(event);
        self.stats.record(&classification);

        if classification.is_alert {
            // The transaction window owns the event now; notify off a borrow
            if let Some(alerted) = self.transactions.front() {
                if let Err(e) = self.sink.notify(alerted) {
                    // Best-effort cue: never let it affect buffers or counters
                    warn!(error = %e, "Alert notification failed");
                }
            }
        }
    }

    /// Surface an explicit error frame as a non-blocking operator notice.
    /// The connection stays up and no buffer or counter changes.
    pub fn record_upstream_error(&mut self, message: String) {
        warn!(message = %message, "Upstream error frame received");
        self.upstream_errors += 1;
        self.notices.push(UpstreamNotice::new(message));
    }

    // ========================================================================
    // Read-only snapshots for the presentation layer
    // ========================================================================

    /// Transaction window contents, newest-first.
    pub fn transactions(&self) -> Vec<TransactionEvent> {
        self.transactions.to_vec()
    }

    /// Alert feed contents, newest-first.
    pub fn alerts(&self) -> Vec<TransactionEvent> {
        self.alert_feed.to_vec()
    }

    /// Operator notices, newest-first.
    pub fn notices(&self) -> Vec<UpstreamNotice> {
        self.notices.to_vec()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn upstream_errors(&self) -> u64 {
        self.upstream_errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::notify::NullNotifier;
    use chrono::Utc;

    fn make_session() -> MonitorSession {
        MonitorSession::new(&SessionConfig::default(), Box::new(NullNotifier))
    }

    fn make_event(id: u64, is_alert: bool, fraud_actual: u8) -> TransactionEvent {
        TransactionEvent {
            id,
            timestamp: Utc::now(),
            sender_id: 100 + id,
            receiver_id: 200 + id,
            amount: 10.0 * id as f64,
            transaction_type: "transfer".to_string(),
            is_alert,
            sender_risk_score: 0.5,
            receiver_risk_score: 0.5,
            fraud_actual,
            threshold: Some(0.75),
        }
    }

    #[test]
    fn test_non_alert_event_only_counts_total() {
        // Empty session, then one non-alerted event
        let mut session = make_session();
        session.process(make_event(1, false, 0));

        let stats = session.stats();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.alerts, 0);
        let tx_ids: Vec<u64> = session.transactions().iter().map(|e| e.id).collect();
        assert_eq!(tx_ids, vec![1]);
        assert!(session.alerts().is_empty());
    }

    #[test]
    fn test_alerted_events_populate_alert_feed() {
        let mut session = make_session();
        session.process(make_event(1, false, 0));
        session.process(make_event(2, true, 1));

        let stats = session.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.alerts, 1);
        assert_eq!(stats.true_positives, 1);
        assert_eq!(stats.false_positives, 0);
        let alert_ids: Vec<u64> = session.alerts().iter().map(|e| e.id).collect();
        assert_eq!(alert_ids, vec![2]);

        session.process(make_event(3, true, 0));

        let stats = session.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.alerts, 2);
        assert_eq!(stats.true_positives, 1);
        assert_eq!(stats.false_positives, 1);
        let alert_ids: Vec<u64> = session.alerts().iter().map(|e| e.id).collect();
        assert_eq!(alert_ids, vec![3, 2]);
    }

    #[test]
    fn test_transaction_window_evicts_beyond_capacity() {
        // 51 distinct events into the 50-cap window: first is gone,
        // last is at the front
        let mut session = make_session();
        for id in 1..=51 {
            session.process(make_event(id, false, 0));
        }

        let transactions = session.transactions();
        assert_eq!(transactions.len(), 50);
        assert_eq!(transactions.first().unwrap().id, 51);
        assert!(transactions.iter().all(|e| e.id != 1));
        assert_eq!(session.stats().total, 51);
    }

    #[test]
    fn test_replayed_event_counts_twice() {
        let mut session = make_session();
        let event = make_event(7, true, 1);
        session.process(event.clone());
        session.process(event);

        let stats = session.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.alerts, 2);
        assert_eq!(stats.true_positives, 2);
    }

    #[test]
    fn test_upstream_error_changes_no_buffer_or_counter() {
        let mut session = make_session();
        session.process(make_event(1, true, 1));

        session.handle_message(FeedMessage::UpstreamError {
            message: "x".to_string(),
        });

        assert_eq!(session.stats().total, 1);
        assert_eq!(session.transactions().len(), 1);
        assert_eq!(session.alerts().len(), 1);
        assert_eq!(session.upstream_errors(), 1);
        assert_eq!(session.notices()[0].message, "x");
    }

    #[test]
    fn test_unknown_frame_is_a_no_op() {
        let mut session = make_session();
        session.handle_message(FeedMessage::Ignored {
            tag: "heartbeat".to_string(),
        });
        assert_eq!(session.stats().total, 0);
        assert!(session.transactions().is_empty());
    }

    #[test]
    fn test_notice_window_is_bounded() {
        let mut session = make_session();
        let cap = SessionConfig::default().notice_window_cap;
        for i in 0..(cap + 5) {
            session.record_upstream_error(format!("notice {}", i));
        }
        assert_eq!(session.notices().len(), cap);
        assert_eq!(session.upstream_errors(), (cap + 5) as u64);
        // Newest notice first
        assert_eq!(session.notices()[0].message, format!("notice {}", cap + 4));
    }
}
