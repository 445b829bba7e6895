// Notification Sink - Best-effort alert cue
// Injectable so tests and headless deployments can substitute a no-op

use std::io::Write;
use thiserror::Error;
use tracing::info;

use crate::core::types::TransactionEvent;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Side-channel cue fired for each alert. Failures must never affect
/// buffer or counter correctness; the session swallows them.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: &TransactionEvent) -> Result<(), NotificationError>;
}

/// Default sink: one structured log line per alert.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&self, event: &TransactionEvent) -> Result<(), NotificationError> {
        info!(
            transaction_id = event.id,
            sender_id = event.sender_id,
            receiver_id = event.receiver_id,
            amount = event.amount,
            peak_risk = event.peak_risk_score(),
            "Fraud alert"
        );
        Ok(())
    }
}

/// Rings the terminal bell in addition to logging.
#[derive(Debug, Default)]
pub struct BellNotifier;

impl NotificationSink for BellNotifier {
    fn notify(&self, event: &TransactionEvent) -> Result<(), NotificationError> {
        LogNotifier.notify(event)?;
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(b"\x07")?;
        stdout.flush()?;
        Ok(())
    }
}

/// No-op sink for tests and embedding hosts that render alerts themselves.
#[derive(Debug, Default)]
pub struct NullNotifier;

impl NotificationSink for NullNotifier {
    fn notify(&self, _event: &TransactionEvent) -> Result<(), NotificationError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_event() -> TransactionEvent {
        TransactionEvent {
            id: 9,
            timestamp: Utc::now(),
            sender_id: 1,
            receiver_id: 2,
            amount: 10.0,
            transaction_type: "transfer".to_string(),
            is_alert: true,
            sender_risk_score: 0.8,
            receiver_risk_score: 0.3,
            fraud_actual: 1,
            threshold: None,
        }
    }

    #[test]
    fn test_sinks_accept_alerts() {
        assert!(LogNotifier.notify(&make_event()).is_ok());
        assert!(NullNotifier.notify(&make_event()).is_ok());
    }
}
