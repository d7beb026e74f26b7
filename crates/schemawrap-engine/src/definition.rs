//! Declarative field definitions read from JSON.
//!
//! ```json
//! {
//!   "type": "nested",
//!   "many": true,
//!   "required": true,
//!   "validate": [{"kind": "length", "min": 1, "max": 10}],
//!   "fields": {
//!     "id": {"type": "int", "strict": true, "required": true},
//!     "timestamp": {"type": "datetime", "required": true}
//!   }
//! }
//! ```

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::config::{SchemaOptions, UnknownPolicy};
use crate::error::{Result, SchemaError};
use crate::field::{Field, FieldKind};
use crate::schema::Schema;
use crate::validator::Validator;

/// A field as written in a definition document.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDef {
    #[serde(flatten)]
    pub kind: KindDef,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub allow_none: bool,
    #[serde(default)]
    pub data_key: Option<String>,
    #[serde(default)]
    pub load_default: Option<Value>,
    #[serde(default)]
    pub validate: Vec<ValidatorDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KindDef {
    Raw,
    Bool,
    Int {
        #[serde(default)]
        strict: bool,
    },
    Float,
    String,
    Datetime,
    List {
        items: Box<FieldDef>,
    },
    Nested {
        fields: FieldDefs,
        #[serde(default)]
        many: bool,
        #[serde(default)]
        unknown: UnknownPolicy,
    },
}

/// A `{name: field definition}` map in document order.
///
/// Repeated names are kept so that building a schema from them reports the
/// duplicate instead of keeping only the last entry.
#[derive(Debug, Clone, Default)]
pub struct FieldDefs(pub Vec<(String, FieldDef)>);

impl<'de> Deserialize<'de> for FieldDefs {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DefsVisitor;

        impl<'de> Visitor<'de> for DefsVisitor {
            type Value = FieldDefs;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to field definitions")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<FieldDefs, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut defs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, FieldDef>()? {
                    defs.push(entry);
                }
                Ok(FieldDefs(defs))
            }
        }

        deserializer.deserialize_map(DefsVisitor)
    }
}

impl FieldDefs {
    /// Convert every definition, keeping names and order.
    pub fn into_fields(self) -> Result<Vec<(String, Field)>> {
        self.0
            .into_iter()
            .map(|(name, def)| def.into_field().map(|field| (name, field)))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidatorDef {
    Length {
        min: Option<usize>,
        max: Option<usize>,
        equal: Option<usize>,
    },
    Range {
        min: Option<f64>,
        max: Option<f64>,
        #[serde(default = "inclusive")]
        min_inclusive: bool,
        #[serde(default = "inclusive")]
        max_inclusive: bool,
    },
    OneOf {
        choices: Vec<Value>,
    },
}

fn inclusive() -> bool {
    true
}

impl FieldDef {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the engine field this definition describes.
    pub fn into_field(self) -> Result<Field> {
        let kind = match self.kind {
            KindDef::Raw => FieldKind::Raw,
            KindDef::Bool => FieldKind::Bool,
            KindDef::Int { strict } => FieldKind::Int { strict },
            KindDef::Float => FieldKind::Float,
            KindDef::String => FieldKind::Str,
            KindDef::Datetime => FieldKind::DateTime,
            KindDef::List { items } => FieldKind::List(Box::new(items.into_field()?)),
            KindDef::Nested {
                fields,
                many,
                unknown,
            } => {
                let fields = fields.into_fields()?;
                let options = SchemaOptions {
                    unknown,
                    ..SchemaOptions::default()
                };
                let schema = Schema::with_options(fields, options)?;
                FieldKind::Nested {
                    schema: schema.into(),
                    many,
                }
            }
        };

        let mut field = Field::new(kind);
        if self.required {
            field = field.required();
        }
        if self.allow_none {
            field = field.allow_none();
        }
        if let Some(key) = self.data_key {
            field = field.data_key(key);
        }
        if let Some(default) = self.load_default {
            field = field.load_default(default);
        }
        for validator in self.validate {
            field = field.validate(validator.into_validator()?);
        }
        Ok(field)
    }
}

impl ValidatorDef {
    pub fn into_validator(self) -> Result<Validator> {
        match self {
            Self::Length { min, max, equal } => {
                if min.is_none() && max.is_none() && equal.is_none() {
                    return Err(SchemaError::InvalidDefinition(
                        "length validator needs min, max or equal".to_string(),
                    ));
                }
                if let (Some(min), Some(max)) = (min, max) {
                    if min > max {
                        return Err(SchemaError::InvalidDefinition(format!(
                            "length min {min} exceeds max {max}"
                        )));
                    }
                }
                Ok(Validator::Length { min, max, equal })
            }
            Self::Range {
                min,
                max,
                min_inclusive,
                max_inclusive,
            } => {
                if min.is_none() && max.is_none() {
                    return Err(SchemaError::InvalidDefinition(
                        "range validator needs min or max".to_string(),
                    ));
                }
                if let (Some(min), Some(max)) = (min, max) {
                    if min > max {
                        return Err(SchemaError::InvalidDefinition(format!(
                            "range min {min} exceeds max {max}"
                        )));
                    }
                }
                Ok(Validator::range_with(min, max, min_inclusive, max_inclusive))
            }
            Self::OneOf { choices } => {
                if choices.is_empty() {
                    return Err(SchemaError::InvalidDefinition(
                        "one_of validator needs at least one choice".to_string(),
                    ));
                }
                Ok(Validator::OneOf(choices))
            }
        }
    }
}

/// Parse a `{name: field definition}` document into engine fields.
///
/// Entries come back in document order, repeated names included.
pub fn fields_from_json(json: &str) -> Result<Vec<(String, Field)>> {
    let defs: FieldDefs = serde_json::from_str(json)?;
    defs.into_fields()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::LoadOptions;
    use crate::value::Loaded;

    #[test]
    fn nested_definition_loads() {
        let field = FieldDef::from_json(
            r#"{
                "type": "nested",
                "many": true,
                "required": true,
                "validate": [{"kind": "length", "min": 1, "max": 2}],
                "fields": {
                    "id": {"type": "int", "strict": true, "required": true},
                    "tags": {"type": "list", "items": {"type": "string"}, "load_default": []}
                }
            }"#,
        )
        .unwrap()
        .into_field()
        .unwrap();
        assert!(field.is_required());

        let schema = Schema::new([("items", field)]).unwrap();
        let loaded = schema
            .load(&json!({"items": [{"id": 1}]}), &LoadOptions::new())
            .unwrap();
        let items = loaded.get("items").and_then(Loaded::as_list).unwrap();
        assert_eq!(items[0].get("tags"), Some(&Loaded::List(Vec::new())));

        let report = schema.validate(&json!({"items": []}), &LoadOptions::new());
        assert_eq!(
            report.to_json(),
            json!({"items": ["Length must be between 1 and 2."]})
        );
    }

    #[test]
    fn range_defaults_to_inclusive() {
        let field = FieldDef::from_json(
            r#"{"type": "int", "validate": [{"kind": "range", "min": 0, "max": 100}]}"#,
        )
        .unwrap()
        .into_field()
        .unwrap();
        assert!(matches!(
            field.validators(),
            [Validator::Range {
                min_inclusive: true,
                max_inclusive: true,
                ..
            }]
        ));
    }

    #[test]
    fn rejects_inconsistent_validators() {
        let err = FieldDef::from_json(
            r#"{"type": "string", "validate": [{"kind": "length", "min": 5, "max": 1}]}"#,
        )
        .unwrap()
        .into_field()
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefinition(_)));

        let err = FieldDef::from_json(r#"{"type": "string", "validate": [{"kind": "length"}]}"#)
            .unwrap()
            .into_field()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefinition(_)));
    }

    #[test]
    fn rejects_unknown_type_and_bad_json() {
        assert!(matches!(
            FieldDef::from_json(r#"{"type": "decimal"}"#),
            Err(SchemaError::InvalidJson(_))
        ));
        assert!(matches!(
            fields_from_json("{not json"),
            Err(SchemaError::InvalidJson(_))
        ));
    }

    #[test]
    fn fields_document_keeps_every_entry() {
        let fields =
            fields_from_json(r#"{"a": {"type": "bool"}, "b": {"type": "float"}}"#).unwrap();
        let names: Vec<&str> = fields.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);

        let repeated =
            fields_from_json(r#"{"a": {"type": "bool"}, "a": {"type": "int"}}"#).unwrap();
        assert_eq!(repeated.len(), 2);
    }

    #[test]
    fn nested_definition_rejects_repeated_names() {
        let err = FieldDef::from_json(
            r#"{
                "type": "nested",
                "fields": {
                    "id": {"type": "string"},
                    "id": {"type": "int"}
                }
            }"#,
        )
        .unwrap()
        .into_field()
        .unwrap_err();
        assert!(matches!(
            err,
            SchemaError::DuplicateField { name } if name == "id"
        ));
    }
}
