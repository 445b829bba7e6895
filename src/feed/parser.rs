// Frame Parser - Decodes monitor feed frames into tagged messages
// One JSON object per frame, discriminated by the "type" field

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::core::types::TransactionEvent;

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid JSON: {0}")]
    Json(String),
    #[error("Invalid frame schema: {0}")]
    Schema(String),
    #[error("Validation failed: {0}")]
    Validation(String),
}

// ============================================================================
// Tagged Message Union
// ============================================================================

/// All frame kinds the feed can deliver. Unknown tags are a defined no-op,
/// not an error.
#[derive(Debug, Clone)]
pub enum FeedMessage {
    Transaction(TransactionEvent),
    UpstreamError { message: String },
    Ignored { tag: String },
}

// ============================================================================
// Serde Structures (Raw Feed JSON)
// ============================================================================

fn default_transaction_type() -> String {
    "normal".to_string()
}

#[derive(Debug, Deserialize)]
struct RawTransaction {
    transaction_id: u64,
    timestamp: String,
    sender_id: u64,
    receiver_id: u64,
    amount: f64,
    is_alert: bool,
    sender_risk_score: f64,
    receiver_risk_score: f64,
    fraud_actual: u8,
    #[serde(default = "default_transaction_type")]
    transaction_type: String,
    #[serde(default)]
    threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawErrorFrame {
    message: String,
}

// ============================================================================
// Parser Statistics
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ParserStats {
    pub frames_parsed: u64,
    pub parse_errors: u64,
    pub validation_failures: u64,
    pub transaction_count: u64,
    pub error_frame_count: u64,
    pub ignored_count: u64,
}

impl ParserStats {
    pub fn error_rate(&self) -> f64 {
        let total = self.frames_parsed + self.parse_errors;
        if total > 0 {
            self.parse_errors as f64 / total as f64
        } else {
            0.0
        }
    }
}

// ============================================================================
// FeedParser - Stateful parser with validation & stats
// ============================================================================

/// Parses raw frames into `FeedMessage`s, enforcing the event invariants at
/// the boundary. Replayed transaction ids are NOT rejected: the feed is a
/// replay stream and every delivery counts.
#[derive(Debug, Default)]
pub struct FeedParser {
    pub stats: ParserStats,
}

impl FeedParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one inbound frame (auto-detects the frame kind).
    pub fn parse(&mut self, raw_json: &str) -> Result<FeedMessage, ProtocolError> {
        let value: serde_json::Value = match serde_json::from_str(raw_json) {
            Ok(v) => v,
            Err(e) => {
                self.stats.parse_errors += 1;
                return Err(ProtocolError::Json(e.to_string()));
            }
        };

        let tag = match value.get("type").and_then(|v| v.as_str()) {
            Some(t) => t.to_string(),
            None => {
                self.stats.parse_errors += 1;
                return Err(ProtocolError::Schema("missing 'type' tag".into()));
            }
        };

        match tag.as_str() {
            "transaction" => self.parse_transaction(value),
            "error" => self.parse_error_frame(value),
            _ => {
                self.stats.frames_parsed += 1;
                self.stats.ignored_count += 1;
                Ok(FeedMessage::Ignored { tag })
            }
        }
    }

    fn parse_transaction(&mut self, value: serde_json::Value) -> Result<FeedMessage, ProtocolError> {
        let raw: RawTransaction = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => {
                self.stats.parse_errors += 1;
                return Err(ProtocolError::Schema(e.to_string()));
            }
        };

        if let Err(e) = validate_transaction(&raw) {
            self.stats.validation_failures += 1;
            return Err(e);
        }

        let timestamp = match parse_timestamp(&raw.timestamp) {
            Ok(ts) => ts,
            Err(e) => {
                self.stats.parse_errors += 1;
                return Err(e);
            }
        };

        self.stats.frames_parsed += 1;
        self.stats.transaction_count += 1;

        Ok(FeedMessage::Transaction(TransactionEvent {
            id: raw.transaction_id,
            timestamp,
            sender_id: raw.sender_id,
            receiver_id: raw.receiver_id,
            amount: raw.amount,
            transaction_type: raw.transaction_type,
            is_alert: raw.is_alert,
            sender_risk_score: raw.sender_risk_score,
            receiver_risk_score: raw.receiver_risk_score,
            fraud_actual: raw.fraud_actual,
            threshold: raw.threshold,
        }))
    }

    fn parse_error_frame(&mut self, value: serde_json::Value) -> Result<FeedMessage, ProtocolError> {
        let raw: RawErrorFrame = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => {
                self.stats.parse_errors += 1;
                return Err(ProtocolError::Schema(e.to_string()));
            }
        };

        self.stats.frames_parsed += 1;
        self.stats.error_frame_count += 1;

        Ok(FeedMessage::UpstreamError { message: raw.message })
    }

    /// Reset all statistics.
    pub fn reset_stats(&mut self) {
        self.stats = ParserStats::default();
    }
}

fn validate_transaction(raw: &RawTransaction) -> Result<(), ProtocolError> {
    if !raw.amount.is_finite() || raw.amount < 0.0 {
        return Err(ProtocolError::Validation(format!(
            "amount must be non-negative, got {}",
            raw.amount
        )));
    }
    for (name, score) in [
        ("sender_risk_score", raw.sender_risk_score),
        ("receiver_risk_score", raw.receiver_risk_score),
    ] {
        if !(0.0..=1.0).contains(&score) {
            return Err(ProtocolError::Validation(format!(
                "{} must be in [0, 1], got {}",
                name, score
            )));
        }
    }
    if raw.fraud_actual > 1 {
        return Err(ProtocolError::Validation(format!(
            "fraud_actual must be 0 or 1, got {}",
            raw.fraud_actual
        )));
    }
    Ok(())
}

/// The generator emits `str(pandas.Timestamp)` ("2024-01-01 00:00:00"),
/// so accept that alongside RFC 3339.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ProtocolError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| ProtocolError::Schema(format!("invalid timestamp '{}'", raw)))
}
