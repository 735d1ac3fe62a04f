//! Engine-level errors.
//!
//! Findings about a document are never errors here: they are entries in a
//! [`ValidationRun`](crate::ValidationRun). These variants cover failures to
//! build or operate the engine itself.

use thiserror::Error;

use crate::config::ConfigError;
use crate::run::RunError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("content error: {0}")]
    Content(#[from] ocf_catalog::CatalogError),

    #[error("schema error: {0}")]
    Schema(#[from] ocf_schema::SchemaError),

    #[error("schema version {requested} is not bundled (available: {available})")]
    UnsupportedSchemaVersion { requested: String, available: String },

    #[error("run state error: {0}")]
    Run(#[from] RunError),
}
