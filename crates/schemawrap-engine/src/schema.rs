use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::config::{LoadOptions, Partial, SchemaOptions, UnknownPolicy};
use crate::error::{Result, SchemaError, ValidationError};
use crate::field::{Field, INVALID_INPUT_TYPE};
use crate::report::{ErrorNode, ErrorReport, SCHEMA_KEY};
use crate::value::Loaded;

pub const UNKNOWN_FIELD: &str = "Unknown field.";

/// An object schema: named fields plus definition-time options.
///
/// Schemas are immutable once built and can be shared across threads.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: BTreeMap<String, Field>,
    options: SchemaOptions,
    load_fields: Vec<String>,
    dump_fields: Vec<String>,
}

impl Schema {
    /// Build a schema with default options.
    pub fn new<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Field)>,
        S: Into<String>,
    {
        Self::with_options(fields, SchemaOptions::default())
    }

    /// Build a schema with explicit options.
    ///
    /// Each name may be declared once; a repeated name is an error rather
    /// than a silent replacement.
    pub fn with_options<I, S>(fields: I, options: SchemaOptions) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Field)>,
        S: Into<String>,
    {
        let mut declared: BTreeMap<String, Field> = BTreeMap::new();
        for (name, field) in fields {
            match declared.entry(name.into()) {
                Entry::Occupied(entry) => {
                    return Err(SchemaError::DuplicateField {
                        name: entry.key().clone(),
                    });
                }
                Entry::Vacant(entry) => {
                    entry.insert(field);
                }
            }
        }
        let fields = declared;

        if let Some(only) = &options.only {
            check_declared(&fields, "only", only)?;
        }
        check_declared(&fields, "exclude", &options.exclude)?;
        check_declared(&fields, "load_only", &options.load_only)?;
        check_declared(&fields, "dump_only", &options.dump_only)?;

        let selected = |name: &String| {
            options.only.as_ref().is_none_or(|only| only.contains(name))
                && !options.exclude.contains(name)
        };
        let load_fields = fields
            .keys()
            .filter(|name| selected(*name) && !options.dump_only.contains(*name))
            .cloned()
            .collect();
        let dump_fields = fields
            .keys()
            .filter(|name| selected(*name) && !options.load_only.contains(*name))
            .cloned()
            .collect();

        debug!(fields = fields.len(), many = options.many, "schema built");
        Ok(Self {
            fields,
            options,
            load_fields,
            dump_fields,
        })
    }

    /// All declared fields, including ones filtered out by the options.
    pub fn declared_fields(&self) -> &BTreeMap<String, Field> {
        &self.fields
    }

    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }

    pub fn context(&self) -> &Map<String, Value> {
        &self.options.context
    }

    /// Deserialize and validate `data`.
    pub fn load(
        &self,
        data: &Value,
        options: &LoadOptions,
    ) -> std::result::Result<Loaded, ValidationError> {
        let many = options.many.unwrap_or(self.options.many);
        let partial = options.partial.as_ref().unwrap_or(&self.options.partial);
        let unknown = options.unknown.unwrap_or(self.options.unknown);

        let (loaded, errors) = if many {
            self.load_many(data, partial, unknown)
        } else {
            let (object, errors) =
                self.load_object(data, partial, unknown, &self.options.context);
            (Loaded::Object(object), errors)
        };

        if errors.is_empty() {
            debug!(many, "load succeeded");
            Ok(loaded)
        } else {
            debug!(many, error_keys = errors.len(), "load rejected input");
            Err(ValidationError::new(errors, Some(loaded)))
        }
    }

    /// Validate `data` without keeping the loaded result.
    ///
    /// An empty report means `data` is valid.
    pub fn validate(&self, data: &Value, options: &LoadOptions) -> ErrorReport {
        match self.load(data, options) {
            Ok(_) => ErrorReport::new(),
            Err(err) => err.into_report(),
        }
    }

    /// Serialize a loaded value back to JSON.
    pub fn dump(&self, value: &Loaded) -> Value {
        match value {
            Loaded::List(items) if self.options.many => Value::Array(
                items
                    .iter()
                    .map(|item| match item {
                        Loaded::Object(map) => self.dump_object(map),
                        other => other.to_json(),
                    })
                    .collect(),
            ),
            Loaded::Object(map) => self.dump_object(map),
            other => other.to_json(),
        }
    }

    fn load_many(
        &self,
        data: &Value,
        partial: &Partial,
        unknown: UnknownPolicy,
    ) -> (Loaded, ErrorReport) {
        let Value::Array(items) = data else {
            return (
                Loaded::List(Vec::new()),
                ErrorReport::single(SCHEMA_KEY, ErrorNode::message(INVALID_INPUT_TYPE)),
            );
        };

        let mut loaded = Vec::with_capacity(items.len());
        let mut errors = ErrorReport::new();
        for (index, item) in items.iter().enumerate() {
            let (object, item_errors) =
                self.load_object(item, partial, unknown, &self.options.context);
            if !item_errors.is_empty() {
                errors.insert(index, ErrorNode::Nested(item_errors));
            }
            loaded.push(Loaded::Object(object));
        }
        (Loaded::List(loaded), errors)
    }

    /// Load one object, returning whatever loaded alongside the errors.
    pub(crate) fn load_object(
        &self,
        data: &Value,
        partial: &Partial,
        unknown: UnknownPolicy,
        context: &Map<String, Value>,
    ) -> (BTreeMap<String, Loaded>, ErrorReport) {
        let mut loaded = BTreeMap::new();
        let mut errors = ErrorReport::new();

        let Value::Object(input) = data else {
            errors.push(SCHEMA_KEY, INVALID_INPUT_TYPE);
            return (loaded, errors);
        };

        let mut known_keys = BTreeSet::new();
        for name in &self.load_fields {
            let Some(field) = self.fields.get(name) else {
                continue;
            };
            let key = field.external_key().unwrap_or(name);
            known_keys.insert(key);

            let nested_partial = partial.descend(name);
            let outcome = match input.get(key) {
                Some(raw) => field.load_value(raw, &nested_partial, context).map(Some),
                None => field.load_missing(partial.skips(name), &nested_partial, context),
            };
            match outcome {
                Ok(Some(value)) => {
                    loaded.insert(name.clone(), value);
                }
                Ok(None) => {}
                Err(node) => errors.insert(key, node),
            }
        }

        for (key, value) in input {
            if known_keys.contains(key.as_str()) {
                continue;
            }
            trace!(key = %key, ?unknown, "undeclared input key");
            match unknown {
                UnknownPolicy::Raise => errors.push(key.as_str(), UNKNOWN_FIELD),
                UnknownPolicy::Include => {
                    loaded.insert(key.clone(), Loaded::from(value));
                }
                UnknownPolicy::Exclude => {}
            }
        }

        (loaded, errors)
    }

    pub(crate) fn dump_object(&self, object: &BTreeMap<String, Loaded>) -> Value {
        let mut out = Map::new();
        for name in &self.dump_fields {
            let (Some(field), Some(value)) = (self.fields.get(name), object.get(name)) else {
                continue;
            };
            let key = field.external_key().unwrap_or(name);
            out.insert(key.to_string(), field.dump_value(value));
        }
        Value::Object(out)
    }

    pub(crate) fn load_field_names(&self) -> impl Iterator<Item = &str> {
        self.load_fields.iter().map(String::as_str)
    }
}

fn check_declared(
    fields: &BTreeMap<String, Field>,
    option: &'static str,
    names: &BTreeSet<String>,
) -> Result<()> {
    let invalid: Vec<String> = names
        .iter()
        .filter(|name| !fields.contains_key(*name))
        .cloned()
        .collect();
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::InvalidFields {
            option,
            names: invalid,
        })
    }
}
