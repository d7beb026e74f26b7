use std::collections::BTreeMap;

use schemawrap_engine::json_schema::root_document;
use schemawrap_engine::{
    fields_from_json, ErrorReport, Field, LoadOptions, Loaded, Schema, SchemaOptions,
    ValidationError,
};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::{DefinitionError, Result};

/// Field name every top-level schema uses unless told otherwise.
pub const DEFAULT_SENTINEL: &str = "_toplevel";

/// Schema for a bare top-level value (a list or scalar).
///
/// Holds exactly one field, named after the sentinel. Each call wraps the
/// raw value as `{sentinel: value}`, hands the container to the engine and
/// unwraps the result: `load` returns the value without the sentinel key,
/// while `validate` returns the engine's report keyed by the sentinel.
///
/// When the sole field declares a `data_key`, that key is used for the
/// container instead of the sentinel.
#[derive(Debug, Clone)]
pub struct ToplevelSchema {
    sentinel: String,
    container_key: String,
    many_by_default: bool,
    field: Field,
    single: Schema,
    many: Schema,
}

impl ToplevelSchema {
    /// Define a schema from `{DEFAULT_SENTINEL: field}`.
    pub fn new<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Field)>,
        S: Into<String>,
    {
        Self::with_sentinel(DEFAULT_SENTINEL, fields, SchemaOptions::default())
    }

    /// Define a schema with engine options.
    pub fn with_options<I, S>(fields: I, options: SchemaOptions) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Field)>,
        S: Into<String>,
    {
        Self::with_sentinel(DEFAULT_SENTINEL, fields, options)
    }

    /// Define a schema whose single field is named `sentinel`.
    ///
    /// `options` go to the engine unchanged, except `many`, which becomes
    /// this schema's default for [`LoadOptions::many`].
    pub fn with_sentinel<I, S>(
        sentinel: impl Into<String>,
        fields: I,
        options: SchemaOptions,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Field)>,
        S: Into<String>,
    {
        let sentinel = sentinel.into();
        // Every declaration counts, so a repeated name is still two fields.
        let fields: Vec<(String, Field)> = fields
            .into_iter()
            .map(|(name, field)| (name.into(), field))
            .collect();

        let field = sole_field(&sentinel, fields)?;

        let container_key = field
            .external_key()
            .unwrap_or(sentinel.as_str())
            .to_string();
        let many_by_default = options.many;
        let engine_options = SchemaOptions {
            many: false,
            ..options
        };

        let mut item_list = Field::list(field.clone()).required();
        if let Some(key) = field.external_key() {
            item_list = item_list.data_key(key);
        }

        let single = Schema::with_options(
            [(sentinel.clone(), field.clone())],
            engine_options.clone(),
        )?;
        let many = Schema::with_options([(sentinel.clone(), item_list)], engine_options)?;

        if !loads_sentinel(&single, &sentinel) {
            return Err(DefinitionError::SentinelNotLoaded { sentinel });
        }

        debug!(sentinel = %sentinel, many_by_default, "top-level schema defined");
        Ok(Self {
            sentinel,
            container_key,
            many_by_default,
            field,
            single,
            many,
        })
    }

    /// Define a schema from a JSON document `{"_toplevel": <field definition>}`.
    pub fn from_definition_json(json: &str) -> Result<Self> {
        Self::from_definition_json_with(DEFAULT_SENTINEL, json, SchemaOptions::default())
    }

    /// Like [`ToplevelSchema::from_definition_json`] with a custom sentinel
    /// and options.
    pub fn from_definition_json_with(
        sentinel: impl Into<String>,
        json: &str,
        options: SchemaOptions,
    ) -> Result<Self> {
        let fields = fields_from_json(json)?;
        Self::with_sentinel(sentinel, fields, options)
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    /// The single declared field.
    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Whether calls treat the raw value as a list of items by default.
    pub fn is_many(&self) -> bool {
        self.many_by_default
    }

    /// Engine schema that receives the wrapped container.
    pub fn engine_schema(&self) -> &Schema {
        &self.single
    }

    pub fn options(&self) -> &SchemaOptions {
        self.single.options()
    }

    /// Load `raw` and return the deserialized value, unwrapped.
    ///
    /// Engine failures are returned unchanged; their report is keyed by the
    /// sentinel.
    pub fn load(
        &self,
        raw: &Value,
        options: &LoadOptions,
    ) -> std::result::Result<Loaded, ValidationError> {
        let (many, schema, forwarded) = self.resolve(options);
        debug!(sentinel = %self.sentinel, many, "loading top-level value");

        let loaded = schema.load(&self.wrap(raw), &forwarded)?;
        Ok(self.unwrap_loaded(loaded))
    }

    /// Validate `raw`; an empty report means it is valid.
    ///
    /// The report is returned as the engine produced it, keyed by the
    /// sentinel.
    pub fn validate(&self, raw: &Value, options: &LoadOptions) -> ErrorReport {
        let (many, schema, forwarded) = self.resolve(options);
        let report = schema.validate(&self.wrap(raw), &forwarded);
        debug!(
            sentinel = %self.sentinel,
            many,
            valid = report.is_empty(),
            "validated top-level value"
        );
        report
    }

    /// Serialize a value produced by [`ToplevelSchema::load`] back to JSON.
    pub fn dump(&self, value: &Loaded) -> Value {
        let schema = if self.many_by_default {
            &self.many
        } else {
            &self.single
        };
        self.dump_with(schema, value)
    }

    /// Serialize a list of values loaded with `many` enabled.
    pub fn dump_many(&self, values: &[Loaded]) -> Value {
        self.dump_with(&self.many, &Loaded::List(values.to_vec()))
    }

    /// JSON Schema (2020-12) of the bare top-level value.
    pub fn json_schema(&self) -> Value {
        let item = self.field().json_schema();
        let body = if self.many_by_default {
            serde_json::json!({"type": "array", "items": item})
        } else {
            item
        };
        root_document(body)
    }

    /// Compile [`ToplevelSchema::json_schema`] with the `jsonschema` crate.
    #[cfg(feature = "jsonschema")]
    pub fn compile_json_schema(&self) -> Result<jsonschema::Validator> {
        Ok(schemawrap_engine::json_schema::compile(&self.json_schema())?)
    }

    fn resolve(&self, options: &LoadOptions) -> (bool, &Schema, LoadOptions) {
        let many = options.many.unwrap_or(self.many_by_default);
        let schema = if many { &self.many } else { &self.single };
        // The container is always a single object; item handling for `many`
        // lives in the list-wrapped schema.
        let forwarded = LoadOptions {
            many: Some(false),
            partial: options.partial.clone(),
            unknown: options.unknown,
        };
        (many, schema, forwarded)
    }

    fn wrap(&self, raw: &Value) -> Value {
        trace!(key = %self.container_key, "wrapping top-level value");
        let mut container = Map::new();
        container.insert(self.container_key.clone(), raw.clone());
        Value::Object(container)
    }

    fn unwrap_loaded(&self, loaded: Loaded) -> Loaded {
        match loaded {
            Loaded::Object(mut map) => map.remove(&self.sentinel).unwrap_or(Loaded::Null),
            other => other,
        }
    }

    fn dump_with(&self, schema: &Schema, value: &Loaded) -> Value {
        let mut container = BTreeMap::new();
        container.insert(self.sentinel.clone(), value.clone());
        match schema.dump(&Loaded::Object(container)) {
            Value::Object(mut map) => map.remove(&self.container_key).unwrap_or(Value::Null),
            other => other,
        }
    }
}

fn sole_field(sentinel: &str, fields: Vec<(String, Field)>) -> Result<Field> {
    if fields.is_empty() {
        return Err(DefinitionError::NoFields {
            sentinel: sentinel.to_string(),
        });
    }
    if fields.len() > 1 {
        return Err(DefinitionError::TooManyFields {
            count: fields.len(),
        });
    }

    let mut fields = fields.into_iter();
    match fields.next() {
        Some((name, field)) if name == sentinel => Ok(field),
        Some((name, _)) => Err(DefinitionError::WrongFieldName {
            sentinel: sentinel.to_string(),
            found: name,
        }),
        None => Err(DefinitionError::NoFields {
            sentinel: sentinel.to_string(),
        }),
    }
}

fn loads_sentinel(schema: &Schema, sentinel: &str) -> bool {
    let options = schema.options();
    options
        .only
        .as_ref()
        .is_none_or(|only| only.contains(sentinel))
        && !options.exclude.contains(sentinel)
        && !options.dump_only.contains(sentinel)
}
