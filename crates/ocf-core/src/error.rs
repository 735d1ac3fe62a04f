//! # Error Hierarchy
//!
//! Structured error types shared across the engine, built with `thiserror`.
//! Subsystem crates define their own enums (catalog loading, profile
//! resolution, conversion) and wrap these where they cross a boundary.

use thiserror::Error;

/// Top-level error type for the core crate.
#[derive(Error, Debug)]
pub enum OcfError {
    /// Canonicalization failure during digest computation.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Identifier or path failed validation.
    #[error("identifier error: {0}")]
    Identifier(#[from] IdentifierError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JSON serialization failed during canonicalization.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Validation errors for identifier newtypes and field paths.
///
/// Each carries the rejected input so operators can see exactly which
/// catalog entry or profile line is malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// Control identifier is empty or contains characters outside
    /// `[A-Za-z0-9._()-]`.
    #[error("invalid control identifier: \"{0}\" (expected e.g. ac-2, AC-2(1), ac-2.1)")]
    InvalidControlId(String),

    /// Catalog or profile reference is not `name@version`.
    #[error("invalid content reference \"{input}\": {reason}")]
    InvalidContentRef {
        /// The string that failed to parse.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Field path or path pattern failed to parse.
    #[error("invalid field path \"{input}\": {reason}")]
    InvalidPath {
        /// The string that failed to parse.
        input: String,
        /// Why it was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_control_id_display_carries_input() {
        let err = IdentifierError::InvalidControlId("ac 2".to_string());
        let msg = err.to_string();
        assert!(msg.contains("ac 2"));
        assert!(msg.contains("expected"));
    }

    #[test]
    fn content_ref_display() {
        let err = IdentifierError::InvalidContentRef {
            input: "nist".to_string(),
            reason: "missing @version".to_string(),
        };
        assert!(err.to_string().contains("missing @version"));
    }

    #[test]
    fn ocf_error_from_identifier() {
        let err: OcfError = IdentifierError::InvalidControlId(String::new()).into();
        assert!(matches!(err, OcfError::Identifier(_)));
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = OcfError::from(io_err);
        assert!(format!("{err}").contains("gone"));
    }
}
