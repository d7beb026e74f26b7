//! Schema validation for JSON documents, including bare top-level values.
//!
//! schemawrap loads JSON through declared field schemas: type coercion,
//! validators, nested objects and structured error reports. The `toplevel`
//! layer lets a single field's schema apply to a document that is a plain
//! list or scalar rather than an object.
//!
//! # Crate Structure
//!
//! - [`engine`] - Field kinds, validators, object schemas and error reports
//! - [`toplevel`] - Single-field schemas for bare values (behind `toplevel` feature)
//! - [`logging`] - `tracing` subscriber setup (behind `logging` feature)

/// Re-export engine types.
pub mod engine {
    pub use schemawrap_engine::*;
}

/// Re-export top-level schema types (requires `toplevel` feature).
#[cfg(feature = "toplevel")]
pub mod toplevel {
    pub use schemawrap_toplevel::*;
}

#[cfg(feature = "logging")]
pub mod logging;
