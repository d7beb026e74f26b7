//! Field-level deserialization and validation of JSON documents.
//!
//! A [`Schema`] is a set of named [`Field`]s. Loading a JSON object through
//! it coerces every field to a typed [`Loaded`] value, runs the field's
//! [`Validator`]s and reports every problem at once in an [`ErrorReport`]
//! keyed by field name (and by list index inside lists).
//!
//! Reports use fixed, human-readable messages such as
//! `"Missing data for required field."` or
//! `"Length must be between 1 and 10."`.

pub mod config;
pub mod definition;
pub mod error;
pub mod field;
pub mod json_schema;
pub mod report;
pub mod schema;
pub mod validator;
pub mod value;

pub use config::{LoadOptions, Partial, SchemaOptions, UnknownPolicy};
pub use definition::{fields_from_json, FieldDef, FieldDefs};
pub use error::{Result, SchemaError, ValidationError};
pub use field::{Field, FieldKind};
pub use report::{ErrorKey, ErrorNode, ErrorReport, SCHEMA_KEY};
pub use schema::Schema;
pub use validator::Validator;
pub use value::{Loaded, Timestamp};
