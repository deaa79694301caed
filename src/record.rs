//! Log record types and structural validation.
//!
//! A write request carries arbitrary JSON per record; the only defect this
//! layer detects is a missing required key. Type or value-range problems are
//! left to the store, whose errors the ingestion pipeline records per record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys every candidate record must carry, in the order error messages name them.
pub const REQUIRED_FIELDS: [&str; 4] = ["timestamp", "service", "severity", "message"];

/// A persisted log record as returned by queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    /// Store-assigned surrogate id, strictly increasing in insertion order.
    pub id: i64,

    /// Producer-supplied event time (ISO-8601 expected, not enforced).
    pub timestamp: String,

    /// Service name as declared inside the payload.
    pub service: String,

    /// Severity label (open set; `INFO`, `WARN`, `ERROR` in practice).
    pub severity: String,

    /// Free-text description.
    pub message: String,

    /// Server-assigned arrival time, shared by all records of one batch.
    pub received_at: String,

    /// Raw credential presented for the write, kept for audit.
    pub token_used: String,
}

/// A validated record about to be inserted; everything but the id.
#[derive(Debug, Clone)]
pub struct NewLogRecord {
    pub timestamp: String,
    pub service: String,
    pub severity: String,
    pub message: String,
    pub received_at: String,
    pub token_used: String,
}

impl NewLogRecord {
    /// Build an insertable record from a validated payload object.
    ///
    /// Non-string values for the producer fields are stored via their JSON
    /// rendering; presence is the only guarantee validation gives us.
    pub fn from_payload(fields: &Map<String, Value>, received_at: &str, token_used: &str) -> Self {
        Self {
            timestamp: field_text(fields, "timestamp"),
            service: field_text(fields, "service"),
            severity: field_text(fields, "severity"),
            message: field_text(fields, "message"),
            received_at: received_at.to_string(),
            token_used: token_used.to_string(),
        }
    }
}

fn field_text(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Check a candidate record for structural completeness.
///
/// Returns the payload's object view when all required keys are present,
/// or a human-readable message naming every missing key (not just the
/// first). Non-object payloads are missing all four.
pub fn validate_record(payload: &Value) -> Result<&Map<String, Value>, String> {
    match payload.as_object() {
        Some(fields) => {
            let missing: Vec<&str> = REQUIRED_FIELDS
                .iter()
                .filter(|key| !fields.contains_key(**key))
                .copied()
                .collect();
            if missing.is_empty() {
                Ok(fields)
            } else {
                Err(format!("Missing fields: {}", missing.join(", ")))
            }
        }
        None => Err(format!("Missing fields: {}", REQUIRED_FIELDS.join(", "))),
    }
}
