//! Typed values produced by a successful load.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Timelike};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;

const AWARE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
];

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// A point in time parsed from ISO-8601 text.
///
/// Offset-aware input stays offset-aware; input without an offset stays
/// naive. Nothing is converted to a local timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    Aware(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

impl Timestamp {
    /// Parse an ISO-8601 date-time.
    ///
    /// Accepts `T` or a single space between date and time, optional
    /// seconds and fractional seconds, and an optional `Z` or `±HH:MM`
    /// (`±HHMM`) offset.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.len() < 16 || !input.is_char_boundary(10) {
            return None;
        }

        let mut normalized = input.to_string();
        if normalized.as_bytes()[10] == b' ' {
            normalized.replace_range(10..11, "T");
        }

        if let Ok(parsed) = DateTime::parse_from_rfc3339(&normalized) {
            return Some(Self::Aware(parsed));
        }

        let with_offset = match normalized.strip_suffix('Z') {
            Some(rest) => format!("{rest}+00:00"),
            None => normalized.clone(),
        };
        for format in AWARE_FORMATS {
            if let Ok(parsed) = DateTime::parse_from_str(&with_offset, format) {
                return Some(Self::Aware(parsed));
            }
        }

        for format in NAIVE_FORMATS {
            if let Ok(parsed) = NaiveDateTime::parse_from_str(&normalized, format) {
                return Some(Self::Naive(parsed));
            }
        }

        None
    }

    /// Render as ISO-8601, with microseconds only when they are non-zero.
    pub fn to_iso8601(&self) -> String {
        match self {
            Self::Aware(dt) => {
                if dt.nanosecond() == 0 {
                    dt.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
                } else {
                    dt.format("%Y-%m-%dT%H:%M:%S%.6f%:z").to_string()
                }
            }
            Self::Naive(dt) => {
                if dt.nanosecond() == 0 {
                    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
                } else {
                    dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
                }
            }
        }
    }

    /// The offset-aware value, if the input carried an offset.
    pub fn aware(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Self::Aware(dt) => Some(dt),
            Self::Naive(_) => None,
        }
    }

    /// The wall-clock date-time, dropping any offset.
    pub fn naive(&self) -> NaiveDateTime {
        match self {
            Self::Aware(dt) => dt.naive_local(),
            Self::Naive(dt) => *dt,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

/// A deserialized value.
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    DateTime(Timestamp),
    List(Vec<Loaded>),
    Object(BTreeMap<String, Loaded>),
}

impl Loaded {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&Timestamp> {
        match self {
            Self::DateTime(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Loaded]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Loaded>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key of an object value.
    pub fn get(&self, key: &str) -> Option<&Loaded> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Number of characters, items or entries; `None` for unsized values.
    pub fn size(&self) -> Option<usize> {
        match self {
            Self::Str(v) => Some(v.chars().count()),
            Self::List(items) => Some(items.len()),
            Self::Object(map) => Some(map.len()),
            _ => None,
        }
    }

    /// Whether any object at any depth carries `key`.
    pub fn contains_key_deep(&self, key: &str) -> bool {
        match self {
            Self::Object(map) => {
                map.contains_key(key) || map.values().any(|v| v.contains_key_deep(key))
            }
            Self::List(items) => items.iter().any(|v| v.contains_key_deep(key)),
            _ => false,
        }
    }

    /// Plain JSON rendering. Timestamps become ISO-8601 strings.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(v) => Value::Bool(*v),
            Self::Int(v) => Value::from(*v),
            Self::Float(v) => serde_json::Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Str(v) => Value::String(v.clone()),
            Self::DateTime(v) => Value::String(v.to_iso8601()),
            Self::List(items) => Value::Array(items.iter().map(Loaded::to_json).collect()),
            Self::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<&Value> for Loaded {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(v) => Self::Bool(*v),
            Value::Number(n) => match n.as_i64() {
                Some(v) => Self::Int(v),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(v) => Self::Str(v.clone()),
            Value::Array(items) => Self::List(items.iter().map(Loaded::from).collect()),
            Value::Object(map) => Self::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), Loaded::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for Loaded {
    fn from(value: Value) -> Self {
        Self::from(&value)
    }
}

impl Serialize for Loaded {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::Str(v) => serializer.serialize_str(v),
            Self::DateTime(v) => serializer.serialize_str(&v.to_iso8601()),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_naive_with_micros() {
        let ts = Timestamp::parse("2024-05-01T12:30:45.123456").unwrap();
        assert!(matches!(ts, Timestamp::Naive(_)));
        assert_eq!(ts.naive().year(), 2024);
        assert_eq!(ts.naive().nanosecond(), 123_456_000);
        assert_eq!(ts.to_iso8601(), "2024-05-01T12:30:45.123456");
    }

    #[test]
    fn parses_offsets_and_zulu() {
        let zulu = Timestamp::parse("2024-05-01T12:30:45Z").unwrap();
        assert_eq!(zulu.to_iso8601(), "2024-05-01T12:30:45+00:00");

        let offset = Timestamp::parse("2024-05-01T12:30+02:00").unwrap();
        assert_eq!(offset.aware().unwrap().offset().local_minus_utc(), 7200);

        let compact = Timestamp::parse("2024-05-01T12:30:45.5+0530").unwrap();
        assert!(compact.aware().is_some());
    }

    #[test]
    fn accepts_space_separator_and_minutes_only() {
        let ts = Timestamp::parse("2024-05-01 08:15").unwrap();
        assert_eq!(ts.to_iso8601(), "2024-05-01T08:15:00");
    }

    #[test]
    fn rejects_garbage() {
        assert!(Timestamp::parse("not a date").is_none());
        assert!(Timestamp::parse("2024-13-01T00:00:00").is_none());
        assert!(Timestamp::parse("2024-05-01").is_none());
        assert!(Timestamp::parse("").is_none());
    }

    #[test]
    fn raw_json_conversion_keeps_shape() {
        let raw = json!({"a": [1, 2.5, "x", null, true]});
        let loaded = Loaded::from(&raw);
        assert_eq!(loaded.to_json(), raw);
        assert_eq!(serde_json::to_value(&loaded).unwrap(), raw);
    }

    #[test]
    fn deep_key_search() {
        let loaded = Loaded::from(json!([{"outer": {"inner": 1}}]));
        assert!(loaded.contains_key_deep("inner"));
        assert!(!loaded.contains_key_deep("_toplevel"));
    }

    #[test]
    fn length_counts_chars() {
        assert_eq!(Loaded::Str("héllo".into()).size(), Some(5));
        assert_eq!(Loaded::Int(3).size(), None);
    }
}
