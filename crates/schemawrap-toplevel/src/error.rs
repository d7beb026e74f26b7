use schemawrap_engine::SchemaError;

/// A top-level schema definition is malformed.
///
/// Construction fails permanently for the given definition; fix the
/// definition and build it again.
#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    /// No field was declared.
    #[error("ToplevelSchema should have exactly one field with name: {sentinel}")]
    NoFields { sentinel: String },

    /// More than one field was declared.
    #[error("ToplevelSchema can contain only one field")]
    TooManyFields { count: usize },

    /// The single declared field is not named after the sentinel.
    #[error("The only field in ToplevelSchema should have name: {sentinel}")]
    WrongFieldName { sentinel: String, found: String },

    /// The schema options keep the sentinel field from being loaded.
    #[error("field {sentinel} is removed from loading by the schema options")]
    SentinelNotLoaded { sentinel: String },

    /// The underlying engine rejected the definition.
    #[error(transparent)]
    Engine(#[from] SchemaError),
}

pub type Result<T> = std::result::Result<T, DefinitionError>;
