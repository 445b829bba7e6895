// Core Type Definitions for the Fraud Monitor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Enums
// ============================================================================

/// Lifecycle state of the feed connection.
/// This flag is the sole externally observable health signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Failed,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// TransactionEvent
// ============================================================================

/// One transaction from the inference feed. Immutable once parsed; the
/// parse boundary guarantees `amount >= 0`, both risk scores in [0, 1]
/// and `fraud_actual` in {0, 1}.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionEvent {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub sender_id: u64,
    pub receiver_id: u64,
    pub amount: f64,
    pub transaction_type: String,
    pub is_alert: bool,
    pub sender_risk_score: f64,
    pub receiver_risk_score: f64,
    /// Ground-truth label: 1 = fraud, 0 = legitimate.
    pub fraud_actual: u8,
    /// Model alert threshold in effect when this event was scored.
    pub threshold: Option<f64>,
}

impl TransactionEvent {
    /// Highest of the two endpoint risk scores.
    pub fn peak_risk_score(&self) -> f64 {
        self.sender_risk_score.max(self.receiver_risk_score)
    }
}

impl fmt::Display for TransactionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TransactionEvent(id={}, {}->{}, amount={:.2}, alert={}, actual={})",
            self.id, self.sender_id, self.receiver_id, self.amount, self.is_alert, self.fraud_actual
        )
    }
}

// ============================================================================
// UpstreamNotice
// ============================================================================

/// Operator notice produced by an explicit error frame from the feed.
/// Non-blocking: the connection stays up and processing continues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamNotice {
    pub message: String,
    pub received_at: DateTime<Utc>,
}

impl UpstreamNotice {
    pub fn new(message: String) -> Self {
        Self {
            message,
            received_at: Utc::now(),
        }
    }
}

impl fmt::Display for UpstreamNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UpstreamNotice({} at {})", self.message, self.received_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_event(sender_risk: f64, receiver_risk: f64) -> TransactionEvent {
        TransactionEvent {
            id: 1,
            timestamp: Utc::now(),
            sender_id: 10,
            receiver_id: 20,
            amount: 250.0,
            transaction_type: "transfer".to_string(),
            is_alert: true,
            sender_risk_score: sender_risk,
            receiver_risk_score: receiver_risk,
            fraud_actual: 1,
            threshold: Some(0.75),
        }
    }

    #[test]
    fn test_peak_risk_score() {
        let event = make_event(0.3, 0.9);
        assert_eq!(event.peak_risk_score(), 0.9);

        let event = make_event(0.8, 0.2);
        assert_eq!(event.peak_risk_score(), 0.8);
    }

    #[test]
    fn test_display_traits() {
        assert_eq!(format!("{}", ConnectionStatus::Connected), "Connected");
        assert_eq!(format!("{}", ConnectionStatus::Reconnecting), "Reconnecting");

        let event = make_event(0.5, 0.5);
        let rendered = format!("{}", event);
        assert!(rendered.contains("id=1"));
        assert!(rendered.contains("10->20"));
    }
}
