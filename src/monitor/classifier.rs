// Event Classifier - Derives alert/outcome facts from a transaction
// Pure mapping; the alerting decision itself is made upstream

use crate::core::types::TransactionEvent;

/// Derived alert facts for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub is_alert: bool,
    pub is_true_positive: bool,
    pub is_false_positive: bool,
}

/// Classify one event. The upstream alert decision is trusted, never
/// recomputed from the risk scores. Non-alerted events are not scored
/// against the ground truth: true/false negatives are out of scope.
pub fn classify(event: &TransactionEvent) -> Classification {
    let is_alert = event.is_alert;
    Classification {
        is_alert,
        is_true_positive: is_alert && event.fraud_actual == 1,
        is_false_positive: is_alert && event.fraud_actual == 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_event(is_alert: bool, fraud_actual: u8) -> TransactionEvent {
        TransactionEvent {
            id: 1,
            timestamp: Utc::now(),
            sender_id: 2,
            receiver_id: 3,
            amount: 50.0,
            transaction_type: "transfer".to_string(),
            is_alert,
            sender_risk_score: 0.9,
            receiver_risk_score: 0.1,
            fraud_actual,
            threshold: None,
        }
    }

    #[test]
    fn test_alert_with_fraud_is_true_positive() {
        let c = classify(&make_event(true, 1));
        assert!(c.is_alert);
        assert!(c.is_true_positive);
        assert!(!c.is_false_positive);
    }

    #[test]
    fn test_alert_without_fraud_is_false_positive() {
        let c = classify(&make_event(true, 0));
        assert!(c.is_alert);
        assert!(!c.is_true_positive);
        assert!(c.is_false_positive);
    }

    #[test]
    fn test_non_alert_is_never_scored() {
        // High risk scores alone never produce an alert: the upstream
        // decision is the trust boundary
        for fraud_actual in [0, 1] {
            let c = classify(&make_event(false, fraud_actual));
            assert!(!c.is_alert);
            assert!(!c.is_true_positive);
            assert!(!c.is_false_positive);
        }
    }
}
