//! Validate and load bare top-level JSON values.
//!
//! Object schemas describe named fields, so a document that is just a list
//! (or a single scalar) has nothing to attach a field to. [`ToplevelSchema`]
//! closes that gap: it holds exactly one field, named by a sentinel
//! (default [`DEFAULT_SENTINEL`]), and wraps each raw value as
//! `{sentinel: value}` before handing it to the engine.
//!
//! ```
//! use schemawrap_engine::{Field, LoadOptions, Validator};
//! use schemawrap_toplevel::{ToplevelSchema, DEFAULT_SENTINEL};
//! use serde_json::json;
//!
//! let schema = ToplevelSchema::new([(
//!     DEFAULT_SENTINEL,
//!     Field::list(Field::int().strict()).validate(Validator::length(1, 10)),
//! )])
//! .unwrap();
//!
//! let report = schema.validate(&json!([]), &LoadOptions::new());
//! assert_eq!(
//!     report.to_json(),
//!     json!({"_toplevel": ["Length must be between 1 and 10."]})
//! );
//! assert!(schema.load(&json!([1, 2]), &LoadOptions::new()).is_ok());
//! ```

pub mod error;
pub mod schema;

pub use error::{DefinitionError, Result};
pub use schema::{ToplevelSchema, DEFAULT_SENTINEL};
