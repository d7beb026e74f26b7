//! Structured validation error reports.
//!
//! A report maps field names (or list indices) to either a list of
//! human-readable messages or a nested report. An empty report means the
//! input was valid.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// Key under which errors that belong to a whole schema are stored.
pub const SCHEMA_KEY: &str = "_schema";

/// Where an error was found: a named field or a position in a list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorKey {
    Index(usize),
    Field(String),
}

impl fmt::Display for ErrorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Field(name) => f.write_str(name),
        }
    }
}

impl From<usize> for ErrorKey {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for ErrorKey {
    fn from(name: &str) -> Self {
        Self::Field(name.to_string())
    }
}

impl From<String> for ErrorKey {
    fn from(name: String) -> Self {
        Self::Field(name)
    }
}

impl Serialize for ErrorKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Index(index) => serializer.serialize_u64(*index as u64),
            Self::Field(name) => serializer.serialize_str(name),
        }
    }
}

/// Errors recorded for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorNode {
    /// Messages from the field itself (type errors, validators).
    Messages(Vec<String>),
    /// Errors from inside a nested object or list.
    Nested(ErrorReport),
}

impl ErrorNode {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Messages(vec![message.into()])
    }

    pub fn messages(&self) -> Option<&[String]> {
        match self {
            Self::Messages(messages) => Some(messages),
            Self::Nested(_) => None,
        }
    }

    pub fn nested(&self) -> Option<&ErrorReport> {
        match self {
            Self::Nested(report) => Some(report),
            Self::Messages(_) => None,
        }
    }

    fn merge(self, other: ErrorNode) -> ErrorNode {
        match (self, other) {
            (Self::Messages(mut left), Self::Messages(right)) => {
                left.extend(right);
                Self::Messages(left)
            }
            (Self::Nested(mut left), Self::Nested(right)) => {
                left.extend(right);
                Self::Nested(left)
            }
            (Self::Nested(mut report), Self::Messages(messages))
            | (Self::Messages(messages), Self::Nested(mut report)) => {
                report.insert(SCHEMA_KEY, Self::Messages(messages));
                Self::Nested(report)
            }
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Messages(messages) => {
                Value::Array(messages.iter().cloned().map(Value::String).collect())
            }
            Self::Nested(report) => report.to_json(),
        }
    }
}

impl Serialize for ErrorNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Messages(messages) => messages.serialize(serializer),
            Self::Nested(report) => report.serialize(serializer),
        }
    }
}

/// Ordered error report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorReport {
    entries: BTreeMap<ErrorKey, ErrorNode>,
}

impl ErrorReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report holding a single entry.
    pub fn single(key: impl Into<ErrorKey>, node: ErrorNode) -> Self {
        let mut report = Self::new();
        report.insert(key, node);
        report
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Record errors under `key`, merging with anything already there.
    pub fn insert(&mut self, key: impl Into<ErrorKey>, node: ErrorNode) {
        let key = key.into();
        let merged = match self.entries.remove(&key) {
            Some(existing) => existing.merge(node),
            None => node,
        };
        self.entries.insert(key, merged);
    }

    /// Record one message under `key`.
    pub fn push(&mut self, key: impl Into<ErrorKey>, message: impl Into<String>) {
        self.insert(key, ErrorNode::message(message));
    }

    /// Merge every entry of `other` into this report.
    pub fn extend(&mut self, other: ErrorReport) {
        for (key, node) in other.entries {
            self.insert(key, node);
        }
    }

    pub fn get(&self, key: &ErrorKey) -> Option<&ErrorNode> {
        self.entries.get(key)
    }

    /// Errors recorded for a named field.
    pub fn field(&self, name: &str) -> Option<&ErrorNode> {
        self.entries.get(&ErrorKey::Field(name.to_string()))
    }

    /// Errors recorded for a list position.
    pub fn index(&self, index: usize) -> Option<&ErrorNode> {
        self.entries.get(&ErrorKey::Index(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ErrorKey, &ErrorNode)> {
        self.entries.iter()
    }

    /// JSON rendering; list indices become string keys.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(key, node)| (key.to_string(), node.to_json()))
                .collect(),
        )
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for ErrorReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, node) in &self.entries {
            map.serialize_entry(key, node)?;
        }
        map.end()
    }
}

impl IntoIterator for ErrorReport {
    type Item = (ErrorKey, ErrorNode);
    type IntoIter = std::collections::btree_map::IntoIter<ErrorKey, ErrorNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
