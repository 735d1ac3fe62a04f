//! Conversion error types.
//!
//! Every variant is fatal to the conversion call. No partial output is ever
//! returned alongside an error.

use ocf_core::ContentDigest;
use thiserror::Error;

use crate::encoding::Encoding;

#[derive(Error, Debug)]
pub enum ConversionError {
    /// The input bytes are not a well-formed document in the declared encoding.
    #[error("failed to parse {encoding} input: {reason}")]
    ParseFailure { encoding: Encoding, reason: String },

    /// The converted output does not carry the same semantic tree as the input.
    #[error("semantic drift converting to {target} (source {source_digest}): {detail}")]
    SemanticDrift {
        target: Encoding,
        source_digest: ContentDigest,
        target_digest: Option<ContentDigest>,
        detail: String,
    },

    /// The encoding name, extension or media type is not supported.
    #[error("unsupported encoding: {0:?} (expected json, yaml or xml)")]
    UnsupportedEncoding(String),

    /// Writing the target encoding failed.
    #[error("failed to write {encoding} output: {reason}")]
    Serialize { encoding: Encoding, reason: String },

    /// Canonicalization error (delegated from ocf-core).
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] ocf_core::CanonicalizationError),
}

impl ConversionError {
    pub(crate) fn parse(encoding: Encoding, reason: impl ToString) -> Self {
        Self::ParseFailure {
            encoding,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn serialize(encoding: Encoding, reason: impl ToString) -> Self {
        Self::Serialize {
            encoding,
            reason: reason.to_string(),
        }
    }
}
