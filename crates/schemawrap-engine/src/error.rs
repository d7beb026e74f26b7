use crate::report::ErrorReport;
use crate::value::Loaded;

/// Errors raised while building a schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// An option names fields the schema does not declare.
    #[error("invalid fields for `{option}`: {}", .names.join(", "))]
    InvalidFields {
        option: &'static str,
        names: Vec<String>,
    },

    /// The same field name was declared more than once.
    #[error("field `{name}` is declared more than once")]
    DuplicateField { name: String },

    /// A declarative field definition could not be turned into a field.
    #[error("invalid field definition: {0}")]
    InvalidDefinition(String),

    /// The definition document is not valid JSON.
    #[error("definition is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The exported JSON Schema could not be compiled.
    #[error("failed to compile schema: {0}")]
    CompileFailed(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;

/// A load rejected the input.
///
/// Carries the full error report plus whatever part of the input did load.
#[derive(Debug, Clone, thiserror::Error)]
#[error("validation failed: {report}")]
pub struct ValidationError {
    report: ErrorReport,
    valid_data: Option<Loaded>,
}

impl ValidationError {
    pub(crate) fn new(report: ErrorReport, valid_data: Option<Loaded>) -> Self {
        Self { report, valid_data }
    }

    /// The per-field error report.
    pub fn report(&self) -> &ErrorReport {
        &self.report
    }

    /// Fields that loaded successfully before the failure was reported.
    pub fn valid_data(&self) -> Option<&Loaded> {
        self.valid_data.as_ref()
    }

    pub fn into_report(self) -> ErrorReport {
        self.report
    }
}
