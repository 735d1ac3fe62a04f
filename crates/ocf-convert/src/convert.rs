//! Digest-verified conversion between encodings.
//!
//! A conversion is only accepted when re-reading the produced bytes yields
//! the same semantic tree as the input, compared by [`semantic_digest`].

use std::time::Instant;

use ocf_core::{semantic_digest, ContentDigest};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::encoding::Encoding;
use crate::error::ConversionError;
use crate::{json, xml, yaml};

/// Parse `bytes` in the given encoding into a document tree.
pub fn decode(bytes: &[u8], encoding: Encoding) -> Result<Value, ConversionError> {
    match encoding {
        Encoding::Json => json::decode(bytes),
        Encoding::Yaml => yaml::decode(bytes),
        Encoding::Xml => xml::decode(bytes),
    }
}

/// Write a document tree in the given encoding.
pub fn encode(value: &Value, encoding: Encoding) -> Result<Vec<u8>, ConversionError> {
    match encoding {
        Encoding::Json => json::encode(value),
        Encoding::Yaml => yaml::encode(value),
        Encoding::Xml => xml::encode(value),
    }
}

/// Evidence that a conversion preserved document semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConversionRecord {
    pub source_encoding: Encoding,
    pub target_encoding: Encoding,
    pub source_digest: ContentDigest,
    pub target_digest: ContentDigest,
    pub equivalence_verified: bool,
    pub source_bytes: usize,
    pub target_bytes: usize,
}

/// Convert `bytes` from `source` to `target` encoding.
///
/// Returns the converted bytes together with a [`ConversionRecord`]. Any
/// difference between the semantic digests of input and re-read output is a
/// [`ConversionError::SemanticDrift`]; no output is returned in that case.
pub fn convert(
    bytes: &[u8],
    source: Encoding,
    target: Encoding,
) -> Result<(Vec<u8>, ConversionRecord), ConversionError> {
    let started = Instant::now();
    let result = convert_inner(bytes, source, target);
    let outcome = match &result {
        Ok(_) => "ok",
        Err(ConversionError::SemanticDrift { .. }) => "drift",
        Err(_) => "error",
    };
    metrics::counter!("ocf_conversions_total", "outcome" => outcome).increment(1);

    match &result {
        Ok((_, record)) => tracing::info!(
            source = %source,
            target = %target,
            digest = %record.source_digest,
            source_bytes = record.source_bytes,
            target_bytes = record.target_bytes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "conversion verified"
        ),
        Err(e) => tracing::warn!(source = %source, target = %target, error = %e, "conversion failed"),
    }
    result
}

fn convert_inner(
    bytes: &[u8],
    source: Encoding,
    target: Encoding,
) -> Result<(Vec<u8>, ConversionRecord), ConversionError> {
    let tree = decode(bytes, source)?;
    let source_digest = semantic_digest(&tree)?;

    let output = encode(&tree, target)?;

    let reread = decode(&output, target).map_err(|e| ConversionError::SemanticDrift {
        target,
        source_digest: source_digest.clone(),
        target_digest: None,
        detail: format!("converted output does not parse: {e}"),
    })?;
    let target_digest = semantic_digest(&reread)?;

    if target_digest != source_digest {
        return Err(ConversionError::SemanticDrift {
            target,
            source_digest,
            detail: format!("converted output digests to {target_digest}"),
            target_digest: Some(target_digest),
        });
    }

    tracing::debug!(source = %source, target = %target, "semantic digests match");
    let record = ConversionRecord {
        source_encoding: source,
        target_encoding: target,
        source_digest,
        target_digest,
        equivalence_verified: true,
        source_bytes: bytes.len(),
        target_bytes: output.len(),
    };
    Ok((output, record))
}
