use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::Partial;
use crate::report::{ErrorNode, ErrorReport, SCHEMA_KEY};
use crate::schema::Schema;
use crate::validator::Validator;
use crate::value::{Loaded, Timestamp};

pub const MISSING: &str = "Missing data for required field.";
pub const NULL: &str = "Field may not be null.";
pub const INVALID_BOOL: &str = "Not a valid boolean.";
pub const INVALID_INT: &str = "Not a valid integer.";
pub const INVALID_NUMBER: &str = "Not a valid number.";
pub const SPECIAL_NUMBER: &str = "Special numeric values (nan or infinity) are not permitted.";
pub const INVALID_STRING: &str = "Not a valid string.";
pub const INVALID_DATETIME: &str = "Not a valid datetime.";
pub const INVALID_LIST: &str = "Not a valid list.";
pub const INVALID_INPUT_TYPE: &str = "Invalid input type.";

/// How a field turns raw JSON into a [`Loaded`] value.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Any JSON value, passed through.
    Raw,
    Bool,
    /// `strict` rejects floats and numeric strings.
    Int {
        strict: bool,
    },
    Float,
    Str,
    /// ISO-8601 date-time string.
    DateTime,
    /// Homogeneous list; item errors are keyed by index.
    List(Box<Field>),
    /// Object (or list of objects) loaded by another schema.
    Nested {
        schema: Arc<Schema>,
        many: bool,
    },
}

/// A declared field: kind, presence rules and validators.
#[derive(Debug, Clone)]
pub struct Field {
    kind: FieldKind,
    required: bool,
    allow_none: bool,
    load_default: Option<Value>,
    data_key: Option<String>,
    validators: Vec<Validator>,
}

impl Field {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            allow_none: false,
            load_default: None,
            data_key: None,
            validators: Vec::new(),
        }
    }

    pub fn raw() -> Self {
        Self::new(FieldKind::Raw)
    }

    pub fn boolean() -> Self {
        Self::new(FieldKind::Bool)
    }

    pub fn int() -> Self {
        Self::new(FieldKind::Int { strict: false })
    }

    pub fn float() -> Self {
        Self::new(FieldKind::Float)
    }

    pub fn string() -> Self {
        Self::new(FieldKind::Str)
    }

    pub fn datetime() -> Self {
        Self::new(FieldKind::DateTime)
    }

    pub fn list(items: Field) -> Self {
        Self::new(FieldKind::List(Box::new(items)))
    }

    pub fn nested(schema: impl Into<Arc<Schema>>) -> Self {
        Self::new(FieldKind::Nested {
            schema: schema.into(),
            many: false,
        })
    }

    pub fn nested_many(schema: impl Into<Arc<Schema>>) -> Self {
        Self::new(FieldKind::Nested {
            schema: schema.into(),
            many: true,
        })
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn allow_none(mut self) -> Self {
        self.allow_none = true;
        self
    }

    /// Only integer fields have a strict mode; other kinds are unchanged.
    pub fn strict(mut self) -> Self {
        if let FieldKind::Int { strict } = &mut self.kind {
            *strict = true;
        }
        self
    }

    /// Value used when the key is absent; it is loaded like regular input.
    pub fn load_default(mut self, value: impl Into<Value>) -> Self {
        self.load_default = Some(value.into());
        self
    }

    /// Read and write this field under a different external key.
    pub fn data_key(mut self, key: impl Into<String>) -> Self {
        self.data_key = Some(key.into());
        self
    }

    pub fn validate(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn allows_none(&self) -> bool {
        self.allow_none
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.load_default.as_ref()
    }

    pub fn external_key(&self) -> Option<&str> {
        self.data_key.as_deref()
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    /// Handle an absent key. `Ok(None)` leaves the field out of the output.
    pub(crate) fn load_missing(
        &self,
        skip_required: bool,
        partial: &Partial,
        context: &Map<String, Value>,
    ) -> Result<Option<Loaded>, ErrorNode> {
        if let Some(default) = &self.load_default {
            return self.load_value(default, partial, context).map(Some);
        }
        if self.required && !skip_required {
            return Err(ErrorNode::message(MISSING));
        }
        Ok(None)
    }

    /// Deserialize a present value and run the validators on it.
    ///
    /// `context` is the context of the schema the load started from; custom
    /// validators at every depth see the same map.
    pub(crate) fn load_value(
        &self,
        value: &Value,
        partial: &Partial,
        context: &Map<String, Value>,
    ) -> Result<Loaded, ErrorNode> {
        if value.is_null() {
            return if self.allow_none {
                Ok(Loaded::Null)
            } else {
                Err(ErrorNode::message(NULL))
            };
        }

        let loaded = self.deserialize(value, partial, context)?;

        let messages: Vec<String> = self
            .validators
            .iter()
            .filter_map(|validator| validator.check_in(&loaded, context).err())
            .collect();
        if messages.is_empty() {
            Ok(loaded)
        } else {
            Err(ErrorNode::Messages(messages))
        }
    }

    fn deserialize(
        &self,
        value: &Value,
        partial: &Partial,
        context: &Map<String, Value>,
    ) -> Result<Loaded, ErrorNode> {
        match &self.kind {
            FieldKind::Raw => Ok(Loaded::from(value)),
            FieldKind::Bool => deserialize_bool(value).map(Loaded::Bool),
            FieldKind::Int { strict } => deserialize_int(value, *strict).map(Loaded::Int),
            FieldKind::Float => deserialize_float(value).map(Loaded::Float),
            FieldKind::Str => match value {
                Value::String(text) => Ok(Loaded::Str(text.clone())),
                _ => Err(ErrorNode::message(INVALID_STRING)),
            },
            FieldKind::DateTime => value
                .as_str()
                .and_then(Timestamp::parse)
                .map(Loaded::DateTime)
                .ok_or_else(|| ErrorNode::message(INVALID_DATETIME)),
            FieldKind::List(items) => {
                let Value::Array(values) = value else {
                    return Err(ErrorNode::message(INVALID_LIST));
                };
                let mut loaded = Vec::with_capacity(values.len());
                let mut errors = ErrorReport::new();
                for (index, item) in values.iter().enumerate() {
                    match items.load_value(item, partial, context) {
                        Ok(item) => loaded.push(item),
                        Err(node) => errors.insert(index, node),
                    }
                }
                if errors.is_empty() {
                    Ok(Loaded::List(loaded))
                } else {
                    Err(ErrorNode::Nested(errors))
                }
            }
            FieldKind::Nested { schema, many: false } => {
                let (loaded, errors) =
                    schema.load_object(value, partial, schema.options().unknown, context);
                if errors.is_empty() {
                    Ok(Loaded::Object(loaded))
                } else {
                    Err(ErrorNode::Nested(errors))
                }
            }
            FieldKind::Nested { schema, many: true } => {
                let Value::Array(values) = value else {
                    return Err(ErrorNode::Nested(ErrorReport::single(
                        SCHEMA_KEY,
                        ErrorNode::message(INVALID_INPUT_TYPE),
                    )));
                };
                let mut loaded = Vec::with_capacity(values.len());
                let mut errors = ErrorReport::new();
                for (index, item) in values.iter().enumerate() {
                    let (object, item_errors) =
                        schema.load_object(item, partial, schema.options().unknown, context);
                    if item_errors.is_empty() {
                        loaded.push(Loaded::Object(object));
                    } else {
                        errors.insert(index, ErrorNode::Nested(item_errors));
                    }
                }
                if errors.is_empty() {
                    Ok(Loaded::List(loaded))
                } else {
                    Err(ErrorNode::Nested(errors))
                }
            }
        }
    }

    /// Serialize a loaded value back to JSON under this field's rules.
    pub(crate) fn dump_value(&self, value: &Loaded) -> Value {
        match (&self.kind, value) {
            (_, Loaded::Null) => Value::Null,
            (FieldKind::List(items), Loaded::List(values)) => {
                Value::Array(values.iter().map(|item| items.dump_value(item)).collect())
            }
            (FieldKind::Nested { schema, many: false }, Loaded::Object(map)) => {
                schema.dump_object(map)
            }
            (FieldKind::Nested { schema, many: true }, Loaded::List(values)) => Value::Array(
                values
                    .iter()
                    .map(|item| match item {
                        Loaded::Object(map) => schema.dump_object(map),
                        other => other.to_json(),
                    })
                    .collect(),
            ),
            (_, other) => other.to_json(),
        }
    }
}

fn deserialize_bool(value: &Value) -> Result<bool, ErrorNode> {
    let parsed = match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(n) => match n.as_f64() {
            Some(v) if v == 1.0 => Some(true),
            Some(v) if v == 0.0 => Some(false),
            _ => None,
        },
        Value::String(text) => match text.to_ascii_lowercase().as_str() {
            "t" | "true" | "on" | "y" | "yes" | "1" => Some(true),
            "f" | "false" | "off" | "n" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed.ok_or_else(|| ErrorNode::message(INVALID_BOOL))
}

fn deserialize_int(value: &Value, strict: bool) -> Result<i64, ErrorNode> {
    let invalid = || ErrorNode::message(INVALID_INT);
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                return Ok(v);
            }
            if strict || n.is_u64() {
                return Err(invalid());
            }
            n.as_f64().and_then(integral).ok_or_else(invalid)
        }
        Value::String(text) if !strict => {
            let text = text.trim();
            if let Ok(v) = text.parse::<i64>() {
                return Ok(v);
            }
            text.parse::<f64>().ok().and_then(integral).ok_or_else(invalid)
        }
        _ => Err(invalid()),
    }
}

fn integral(v: f64) -> Option<i64> {
    if v.is_finite() && v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

fn deserialize_float(value: &Value) -> Result<f64, ErrorNode> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        Some(_) => Err(ErrorNode::message(SPECIAL_NUMBER)),
        None => Err(ErrorNode::message(INVALID_NUMBER)),
    }
}
