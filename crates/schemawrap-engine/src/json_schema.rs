//! JSON Schema (2020-12) export.
//!
//! The exported document accepts what `load` accepts for well-typed input.
//! Lenient coercions (numeric strings for integers, truthy strings for
//! booleans) are not represented, and custom validators are skipped.

use serde_json::{json, Map, Value};

use crate::config::UnknownPolicy;
use crate::field::{Field, FieldKind};
use crate::schema::Schema;
use crate::validator::Validator;

/// Dialect URI written into exported root documents.
pub const DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

impl Field {
    /// JSON Schema describing the values this field loads.
    pub fn json_schema(&self) -> Value {
        let mut out = match self.kind() {
            FieldKind::Raw => Map::new(),
            FieldKind::Bool => typed("boolean"),
            FieldKind::Int { .. } => typed("integer"),
            FieldKind::Float => typed("number"),
            FieldKind::Str => typed("string"),
            FieldKind::DateTime => {
                let mut map = typed("string");
                map.insert("format".to_string(), json!("date-time"));
                map
            }
            FieldKind::List(items) => {
                let mut map = typed("array");
                map.insert("items".to_string(), items.json_schema());
                map
            }
            FieldKind::Nested {
                schema,
                many: false,
            } => schema.object_json_schema(),
            FieldKind::Nested { schema, many: true } => {
                let mut map = typed("array");
                map.insert("items".to_string(), Value::Object(schema.object_json_schema()));
                map
            }
        };

        for validator in self.validators() {
            apply_validator(&mut out, self.kind(), validator);
        }

        if self.allows_none() {
            allow_null(&mut out);
        }

        Value::Object(out)
    }
}

impl Schema {
    /// Root JSON Schema document for this schema's load input.
    pub fn json_schema(&self) -> Value {
        let body = if self.options().many {
            let mut map = typed("array");
            map.insert("items".to_string(), Value::Object(self.object_json_schema()));
            map
        } else {
            self.object_json_schema()
        };
        root_document(Value::Object(body))
    }

    /// Compile [`Schema::json_schema`] with the `jsonschema` crate.
    #[cfg(feature = "jsonschema")]
    pub fn compile_json_schema(&self) -> crate::error::Result<jsonschema::Validator> {
        compile(&self.json_schema())
    }

    pub(crate) fn object_json_schema(&self) -> Map<String, Value> {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for name in self.load_field_names() {
            let Some(field) = self.declared_fields().get(name) else {
                continue;
            };
            let key = field.external_key().unwrap_or(name);
            properties.insert(key.to_string(), field.json_schema());
            if field.is_required() && field.default_value().is_none() {
                required.push(Value::String(key.to_string()));
            }
        }

        let mut out = typed("object");
        out.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            out.insert("required".to_string(), Value::Array(required));
        }
        if self.options().unknown == UnknownPolicy::Raise {
            out.insert("additionalProperties".to_string(), Value::Bool(false));
        }
        out
    }
}

/// Add the `$schema` dialect marker to a schema body.
pub fn root_document(body: Value) -> Value {
    match body {
        Value::Object(mut map) => {
            map.insert("$schema".to_string(), json!(DIALECT));
            Value::Object(map)
        }
        other => other,
    }
}

/// Compile an exported document into a reusable validator.
#[cfg(feature = "jsonschema")]
pub fn compile(document: &Value) -> crate::error::Result<jsonschema::Validator> {
    jsonschema::validator_for(document)
        .map_err(|err| crate::error::SchemaError::CompileFailed(err.to_string()))
}

fn typed(kind: &str) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("type".to_string(), json!(kind));
    map
}

fn apply_validator(out: &mut Map<String, Value>, kind: &FieldKind, validator: &Validator) {
    match validator {
        Validator::Length { min, max, equal } => {
            let Some((min_key, max_key)) = length_keywords(kind) else {
                return;
            };
            let (min, max) = match equal {
                Some(equal) => (Some(*equal), Some(*equal)),
                None => (*min, *max),
            };
            if let Some(min) = min {
                out.insert(min_key.to_string(), json!(min));
            }
            if let Some(max) = max {
                out.insert(max_key.to_string(), json!(max));
            }
        }
        Validator::Range {
            min,
            max,
            min_inclusive,
            max_inclusive,
        } => {
            if let Some(min) = min {
                let key = if *min_inclusive {
                    "minimum"
                } else {
                    "exclusiveMinimum"
                };
                out.insert(key.to_string(), json!(min));
            }
            if let Some(max) = max {
                let key = if *max_inclusive {
                    "maximum"
                } else {
                    "exclusiveMaximum"
                };
                out.insert(key.to_string(), json!(max));
            }
        }
        Validator::OneOf(choices) => {
            out.insert("enum".to_string(), Value::Array(choices.clone()));
        }
        Validator::Custom { .. } => {}
    }
}

fn length_keywords(kind: &FieldKind) -> Option<(&'static str, &'static str)> {
    match kind {
        FieldKind::Str => Some(("minLength", "maxLength")),
        FieldKind::List(_) | FieldKind::Nested { many: true, .. } => {
            Some(("minItems", "maxItems"))
        }
        FieldKind::Nested { many: false, .. } => Some(("minProperties", "maxProperties")),
        _ => None,
    }
}

fn allow_null(out: &mut Map<String, Value>) {
    if let Some(Value::String(kind)) = out.get("type").cloned() {
        out.insert("type".to_string(), json!([kind, "null"]));
    }
    if let Some(Value::Array(choices)) = out.get_mut("enum") {
        if !choices.contains(&Value::Null) {
            choices.push(Value::Null);
        }
    }
}
