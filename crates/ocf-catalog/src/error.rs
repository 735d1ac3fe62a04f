//! Catalog-layer error types.
//!
//! [`CatalogError`] covers loading content from disk and building the
//! immutable snapshot. [`ProfileResolutionError`] covers the profile
//! interpreter and is `Clone` so a cached failure can be handed to every
//! caller that asks for the same baseline.

use std::path::PathBuf;

use ocf_core::{CatalogRef, ControlId, ProfileId};
use thiserror::Error;

/// Errors that can occur while loading catalogs, profiles and the registry.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// YAML parsing failed.
    #[error("failed to parse YAML at {path}: {source}")]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// JSON parsing failed.
    #[error("failed to parse JSON at {path}: {source}")]
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A required file was not found.
    #[error("required file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// File extension is not one of yaml, yml, json.
    #[error("unsupported content file {path}: expected .yaml, .yml or .json")]
    UnsupportedFile { path: PathBuf },

    /// The same control identifier appears twice inside one catalog.
    #[error("catalog {catalog} defines control {control} more than once")]
    DuplicateControl { catalog: CatalogRef, control: ControlId },

    /// Two catalog files declare the same name and version.
    #[error("catalog {0} is defined more than once")]
    DuplicateCatalog(CatalogRef),

    /// Two profile files declare the same name and version.
    #[error("profile {0} is defined more than once")]
    DuplicateProfile(ProfileId),

    /// Identifier failed validation.
    #[error("identifier error: {0}")]
    Identifier(#[from] ocf_core::IdentifierError),

    /// Canonicalization error (delegated from ocf-core).
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] ocf_core::CanonicalizationError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Why a profile could not be resolved into a baseline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileResolutionError {
    /// An `import` names a catalog that is not loaded.
    #[error("profile {profile} imports {catalog}, which is not loaded")]
    MissingCatalog { profile: ProfileId, catalog: CatalogRef },

    /// An `add` collides with a control already in the working set, or a
    /// catalog import collides with an added control.
    #[error("control {control} is already present in the working set")]
    DuplicateControl { control: ControlId },

    /// An operation names a control that is not in the working set or catalog.
    #[error("{operation} names unknown control {control}")]
    UnknownControl { operation: String, control: ControlId },

    /// Two imports define the same control under `error-on-conflict`.
    #[error("control {control} is defined by both {first} and {second}")]
    MergeConflict {
        control: ControlId,
        first: CatalogRef,
        second: CatalogRef,
    },

    /// An `alter` targets a parameter the control does not declare.
    #[error("control {control} has no parameter {param}")]
    UnknownParameter { control: ControlId, param: String },

    /// A parameter value lies outside its allowed choices.
    #[error("parameter {param} of {control}: value {value:?} is not one of {allowed:?}")]
    ParameterConstraint {
        control: ControlId,
        param: String,
        value: String,
        allowed: Vec<String>,
    },

    /// No loaded profile matches the requested baseline.
    #[error("unknown baseline {profile:?}: {reason}")]
    UnknownProfile { profile: String, reason: String },
}
