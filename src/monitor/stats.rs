// Session Statistics - Running counters over the alerted stream
// Increment-only; one zeroed instance per session

use serde::Serialize;
use std::fmt;

use crate::monitor::classifier::Classification;

/// Four monotonic counters scoped to one session. Invariants:
/// `alerts <= total` and `true_positives + false_positives == alerts`
/// (every alert carries a defined ground-truth label).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub total: u64,
    pub alerts: u64,
    pub true_positives: u64,
    pub false_positives: u64,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one classified event. There is no decrement path.
    pub fn record(&mut self, classification: &Classification) {
        self.total += 1;
        if classification.is_alert {
            self.alerts += 1;
        }
        if classification.is_true_positive {
            self.true_positives += 1;
        }
        if classification.is_false_positive {
            self.false_positives += 1;
        }
    }

    /// Share of alerts confirmed by the ground truth.
    pub fn precision(&self) -> f64 {
        if self.alerts > 0 {
            self.true_positives as f64 / self.alerts as f64
        } else {
            0.0
        }
    }

    /// Share of all events that were alerted.
    pub fn alert_rate(&self) -> f64 {
        if self.total > 0 {
            self.alerts as f64 / self.total as f64
        } else {
            0.0
        }
    }
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SessionStats(total={}, alerts={}, tp={}, fp={})",
            self.total, self.alerts, self.true_positives, self.false_positives
        )
    }
}
