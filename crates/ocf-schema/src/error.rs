//! Schema-layer error types.
//!
//! These are failures of the validator itself. Findings about a document
//! are report entries, never errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    /// A bundled schema is not valid JSON.
    #[error("failed to load schema {schema_id}: {reason}")]
    SchemaLoad { schema_id: String, reason: String },

    /// A schema could not be compiled into a validator.
    #[error("failed to compile schema {schema_id}: {reason}")]
    SchemaCompile { schema_id: String, reason: String },

    /// No bundled schema for the requested document-model version.
    #[error("unsupported schema version {requested:?} (available: {available})")]
    UnknownVersion { requested: String, available: String },
}
