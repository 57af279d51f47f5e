//! Log record normalization
//!
//! Incoming payloads are loose mappings produced by whatever logging library sits
//! on the other end of the socket. [`LogRecord::from_fields`] pulls the well-known
//! fields out under their accepted aliases and keeps everything else, in arrival
//! order, as extra fields.

use std::fmt::Write as _;

use chrono::{DateTime, Local, Utc};
use serde_json::Value;

/// Ordered key/value mapping (insertion order is preserved)
pub type Fields = serde_json::Map<String, Value>;

/// Key carrying the timestamp of a record whose source had none
pub const CREATED_FALLBACK_KEY: &str = "_created";

/// Key carrying the text of an internal marker record
pub const MARKER_KEY: &str = "_cutelog";

/// Time format used when a configured one cannot be rendered
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

const MESSAGE_KEYS: [&str; 2] = ["message", "msg"];
const LEVEL_KEYS: [&str; 2] = ["levelname", "level"];
const CREATED_KEYS: [&str; 2] = ["created", "time"];
const NAME_KEY: &str = "name";
const EXC_TEXT_KEY: &str = "exc_text";

/// A single log event received from a client or loaded from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Message text (`message`, falling back to `msg`)
    pub message: Option<String>,
    /// Upper-cased level name (`levelname`, falling back to `level`)
    pub level_name: Option<String>,
    /// Seconds since the epoch
    pub created: f64,
    /// Dot-separated logger name
    pub logger_name: Option<String>,
    /// Pre-rendered traceback text
    pub exception_text: Option<String>,
    /// Every other key of the source mapping, in arrival order
    pub extra_fields: Fields,
    /// Whether `created` came from the source mapping rather than the receive time
    pub has_native_timestamp: bool,
    /// Text of an internal marker (e.g. connection closed); never set on wire records
    pub marker: Option<String>,
}

impl LogRecord {
    /// Build a record from a decoded mapping.
    ///
    /// Nested values (arrays, mappings) are flattened to their JSON text so that
    /// every field stays a scalar.
    pub fn from_fields(mut fields: Fields) -> Self {
        for value in fields.values_mut() {
            if value.is_array() || value.is_object() {
                *value = Value::String(value.to_string());
            }
        }

        let message = take_first_text(&mut fields, &MESSAGE_KEYS);
        let level_name = take_first_text(&mut fields, &LEVEL_KEYS).map(|l| l.to_uppercase());
        let logger_name = take_text(&mut fields, NAME_KEY);
        let exception_text = take_text(&mut fields, EXC_TEXT_KEY);
        let marker = take_text(&mut fields, MARKER_KEY);

        let mut created = None;
        let mut has_native_timestamp = false;
        for key in CREATED_KEYS {
            if let Some(value) = fields.shift_remove(key) {
                if created.is_none() {
                    if let Some(ts) = value.as_f64() {
                        created = Some(ts);
                        has_native_timestamp = true;
                    }
                }
            }
        }
        if let Some(value) = fields.shift_remove(CREATED_FALLBACK_KEY) {
            if created.is_none() {
                created = value.as_f64();
            }
        }

        Self {
            message,
            level_name,
            created: created.unwrap_or_else(now_timestamp),
            logger_name,
            exception_text,
            extra_fields: fields,
            has_native_timestamp,
            marker,
        }
    }

    /// Marker appended to a tab when one of its connections finishes.
    pub fn connection_closed(conn_id: impl std::fmt::Display) -> Self {
        Self {
            message: None,
            level_name: None,
            created: now_timestamp(),
            logger_name: None,
            exception_text: None,
            extra_fields: Fields::new(),
            has_native_timestamp: true,
            marker: Some(format!("Connection {} closed", conn_id)),
        }
    }

    /// Whether this is an internal marker rather than a received record
    pub fn is_marker(&self) -> bool {
        self.marker.is_some()
    }

    /// Text shown in the message column
    pub fn display_message(&self) -> Option<&str> {
        self.message.as_deref().or(self.marker.as_deref())
    }

    /// Render `created` in local time.
    ///
    /// Falls back to [`DEFAULT_TIME_FORMAT`] when `format` contains an invalid
    /// specifier, and to the current time when `created` is out of range.
    pub fn asctime(&self, format: &str) -> String {
        let secs = self.created.floor();
        let nanos = ((self.created - secs) * 1e9) as u32;
        let utc = DateTime::<Utc>::from_timestamp(secs as i64, nanos).unwrap_or_else(Utc::now);
        let local = utc.with_timezone(&Local);

        let mut out = String::new();
        if write!(out, "{}", local.format(format)).is_err() {
            out.clear();
            let _ = write!(out, "{}", local.format(DEFAULT_TIME_FORMAT));
        }
        out
    }

    /// Look up a field by its column name.
    ///
    /// Well-known fields answer to their canonical name; anything else is
    /// searched for among the extra fields.
    pub fn field(&self, name: &str, time_format: &str) -> Option<Value> {
        match name {
            "message" | "msg" => self.display_message().map(|m| Value::String(m.to_string())),
            "levelname" | "level" => self.level_name.clone().map(Value::String),
            "name" => self.logger_name.clone().map(Value::String),
            "exc_text" => self.exception_text.clone().map(Value::String),
            "created" => serde_json::Number::from_f64(self.created).map(Value::Number),
            "asctime" => Some(Value::String(self.asctime(time_format))),
            other => self.extra_fields.get(other).cloned(),
        }
    }

    /// Rebuild the mapping form of this record.
    ///
    /// Well-known fields are written under their canonical keys. A record whose
    /// source carried no timestamp keeps it under [`CREATED_FALLBACK_KEY`].
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        if let Some(marker) = &self.marker {
            fields.insert(MARKER_KEY.to_string(), Value::String(marker.clone()));
        }
        if let Some(name) = &self.logger_name {
            fields.insert(NAME_KEY.to_string(), Value::String(name.clone()));
        }
        if let Some(level) = &self.level_name {
            fields.insert("levelname".to_string(), Value::String(level.clone()));
        }
        if let Some(message) = &self.message {
            fields.insert("message".to_string(), Value::String(message.clone()));
        }
        if let Some(exc) = &self.exception_text {
            fields.insert(EXC_TEXT_KEY.to_string(), Value::String(exc.clone()));
        }
        let created_key = if self.has_native_timestamp {
            "created"
        } else {
            CREATED_FALLBACK_KEY
        };
        if let Some(ts) = serde_json::Number::from_f64(self.created) {
            fields.insert(created_key.to_string(), Value::Number(ts));
        }
        for (key, value) in &self.extra_fields {
            fields.insert(key.clone(), value.clone());
        }
        fields
    }
}

/// Current time as seconds since the epoch
pub fn now_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Render a scalar field value the way it is displayed
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn take_text(fields: &mut Fields, key: &str) -> Option<String> {
    fields.shift_remove(key).as_ref().and_then(value_to_text)
}

fn take_first_text(fields: &mut Fields, keys: &[&str]) -> Option<String> {
    let mut found = None;
    for key in keys {
        let text = take_text(fields, key);
        if found.is_none() {
            found = text;
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_from_fields_well_known_keys() {
        let record = LogRecord::from_fields(fields(json!({
            "name": "app.db",
            "levelname": "warning",
            "msg": "slow query",
            "created": 1_700_000_000.25,
            "exc_text": "Traceback",
            "lineno": 42
        })));

        assert_eq!(record.logger_name.as_deref(), Some("app.db"));
        assert_eq!(record.level_name.as_deref(), Some("WARNING"));
        assert_eq!(record.message.as_deref(), Some("slow query"));
        assert_eq!(record.created, 1_700_000_000.25);
        assert!(record.has_native_timestamp);
        assert_eq!(record.exception_text.as_deref(), Some("Traceback"));
        assert_eq!(record.extra_fields.len(), 1);
        assert_eq!(record.extra_fields["lineno"], json!(42));
    }

    #[test]
    fn test_message_preferred_over_msg() {
        let record = LogRecord::from_fields(fields(json!({"msg": "raw %s", "message": "raw x"})));
        assert_eq!(record.message.as_deref(), Some("raw x"));
        assert!(record.extra_fields.is_empty());
    }

    #[test]
    fn test_level_alias_and_time_alias() {
        let record = LogRecord::from_fields(fields(json!({"level": "info", "time": 12.5})));
        assert_eq!(record.level_name.as_deref(), Some("INFO"));
        assert_eq!(record.created, 12.5);
    }

    #[test]
    fn test_non_numeric_created_falls_back_to_now() {
        let before = now_timestamp();
        let record = LogRecord::from_fields(fields(json!({"created": "yesterday"})));
        assert!(record.created >= before);
        assert!(!record.has_native_timestamp);
    }

    #[test]
    fn test_fallback_created_key() {
        let record = LogRecord::from_fields(fields(json!({"_created": 99.0, "msg": "m"})));
        assert_eq!(record.created, 99.0);
        assert!(!record.has_native_timestamp);
        assert!(!record.extra_fields.contains_key(CREATED_FALLBACK_KEY));
        assert!(record.to_fields().contains_key(CREATED_FALLBACK_KEY));
    }

    #[test]
    fn test_extra_fields_keep_arrival_order() {
        let record = LogRecord::from_fields(fields(json!({
            "zeta": 1, "msg": "x", "alpha": 2, "mid": 3
        })));
        let keys: Vec<&str> = record.extra_fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_extra_order_with_known_keys_interleaved() {
        let record = LogRecord::from_fields(fields(json!({
            "name": "app", "lineno": 10, "levelname": "INFO", "created": 1.0,
            "funcName": "run", "msg": "x", "exc_text": null, "trace_id": "t"
        })));
        let keys: Vec<&str> = record.extra_fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["lineno", "funcName", "trace_id"]);
    }

    #[test]
    fn test_nested_values_are_stringified() {
        let record = LogRecord::from_fields(fields(json!({"args": [1, 2], "ctx": {"k": "v"}})));
        assert_eq!(record.extra_fields["args"], json!("[1,2]"));
        assert_eq!(record.extra_fields["ctx"], json!("{\"k\":\"v\"}"));
    }

    #[test]
    fn test_connection_closed_marker() {
        let record = LogRecord::connection_closed(3);
        assert!(record.is_marker());
        assert!(record.logger_name.is_none());
        assert!(record.level_name.is_none());
        assert_eq!(record.display_message(), Some("Connection 3 closed"));

        let restored = LogRecord::from_fields(record.to_fields());
        assert_eq!(restored.marker, record.marker);
    }

    #[test]
    fn test_asctime_falls_back_on_bad_format() {
        let record = LogRecord::from_fields(fields(json!({"created": 0.5})));
        let good = record.asctime("%Y");
        assert!(good.starts_with("19"));
        let fallback = record.asctime("%Q%");
        assert!(!fallback.is_empty());
    }

    #[test]
    fn test_field_lookup() {
        let record = LogRecord::from_fields(fields(json!({
            "name": "a", "msg": "hello", "funcName": "main"
        })));
        assert_eq!(record.field("message", DEFAULT_TIME_FORMAT), Some(json!("hello")));
        assert_eq!(record.field("name", DEFAULT_TIME_FORMAT), Some(json!("a")));
        assert_eq!(record.field("funcName", DEFAULT_TIME_FORMAT), Some(json!("main")));
        assert_eq!(record.field("missing", DEFAULT_TIME_FORMAT), None);
    }
}
