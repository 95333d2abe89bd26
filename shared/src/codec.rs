//! JSON codec for telemetry bodies and stored rows
//!
//! Telemetry arrives as a flat JSON object:
//! ```text
//! {"temperatura": 21.5, "humedad": 60, "lpg_ppm": 12, ...}
//! ```
//!
//! Rows are persisted one JSON array per line.

use serde_json::Value;
use thiserror::Error;

use crate::{SensorRow, TelemetryRecord};

/// Maximum telemetry body size (64 KiB)
pub const MAX_BODY_SIZE: usize = 64 * 1024;

/// Errors that can occur during encoding/decoding
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Body too large: {0} bytes (max: {1})")]
    BodyTooLarge(usize, usize),

    #[error("Telemetry body must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode a telemetry body using the default size limit
pub fn decode_record(body: &[u8]) -> Result<TelemetryRecord, CodecError> {
    decode_record_limited(body, MAX_BODY_SIZE)
}

/// Decode a telemetry body, rejecting anything larger than `max_len`
///
/// Parsing completes before any row is built, so a failure here never leaves
/// a partial row behind.
pub fn decode_record_limited(body: &[u8], max_len: usize) -> Result<TelemetryRecord, CodecError> {
    if body.len() > max_len {
        return Err(CodecError::BodyTooLarge(body.len(), max_len));
    }

    let value: Value = serde_json::from_slice(body)?;
    if !value.is_object() {
        return Err(CodecError::NotAnObject(json_kind(&value)));
    }

    Ok(serde_json::from_value(value)?)
}

/// Encode a row as a single line (no trailing newline)
pub fn encode_row(row: &SensorRow) -> Result<String, CodecError> {
    Ok(serde_json::to_string(row)?)
}

/// Decode a row from a single stored line
pub fn decode_row(line: &str) -> Result<SensorRow, CodecError> {
    Ok(serde_json::from_str(line.trim())?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cell;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_decode_ignores_unknown_fields() {
        let body = br#"{"temperatura": 21.5, "wind_speed": 3.2}"#;
        let record = decode_record(body).expect("decode failed");

        assert_eq!(record.temperatura, Some(serde_json::json!(21.5)));
        assert!(record.humedad.is_none());
    }

    #[test]
    fn test_decode_accepts_empty_object() {
        let record = decode_record(b"{}").expect("decode failed");
        assert_eq!(record, TelemetryRecord::default());
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let result = decode_record(b"{\"temperatura\": ");
        assert!(matches!(result, Err(CodecError::Json(_))));
    }

    #[test]
    fn test_non_object_is_rejected() {
        let result = decode_record(b"[21.5, 60]");
        assert!(matches!(result, Err(CodecError::NotAnObject("array"))));
    }

    #[test]
    fn test_body_too_large() {
        let body = vec![b' '; 32];
        let result = decode_record_limited(&body, 16);
        assert!(matches!(result, Err(CodecError::BodyTooLarge(32, 16))));
    }

    #[test]
    fn test_row_line_keeps_timestamp_and_gaps() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let row = SensorRow::new(vec![Cell::Timestamp(ts), Cell::Number(21.5), Cell::Empty]);

        let line = encode_row(&row).expect("encode failed");
        assert!(!line.contains('\n'));

        let decoded = decode_row(&line).expect("decode failed");
        assert_eq!(decoded.timestamp(), &Cell::Timestamp(ts));
        assert_eq!(decoded.cell(2), &Cell::Empty);
    }
}
