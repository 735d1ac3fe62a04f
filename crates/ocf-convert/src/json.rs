//! JSON codec.

use serde_json::Value;

use crate::encoding::Encoding;
use crate::error::ConversionError;

const BOM: &[u8] = b"\xEF\xBB\xBF";

pub fn decode(bytes: &[u8]) -> Result<Value, ConversionError> {
    let bytes = bytes.strip_prefix(BOM).unwrap_or(bytes);
    serde_json::from_slice(bytes).map_err(|e| ConversionError::parse(Encoding::Json, e))
}

/// Pretty-printed with a trailing newline.
pub fn encode(value: &Value) -> Result<Vec<u8>, ConversionError> {
    let mut out = serde_json::to_vec_pretty(value).map_err(|e| ConversionError::serialize(Encoding::Json, e))?;
    out.push(b'\n');
    Ok(out)
}
