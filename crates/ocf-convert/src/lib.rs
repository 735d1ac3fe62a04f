//! # ocf-convert: Document Codecs and Verified Conversion
//!
//! Reads and writes compliance documents as JSON, YAML or XML, all mapped
//! onto one document tree (`serde_json::Value`). [`convert`] re-reads its own
//! output and refuses to return bytes whose semantic digest differs from the
//! input's.
//!
//! ## Crate Policy
//!
//! - Depends only on `ocf-core` internally.
//! - Pure functions over byte slices; no file I/O.

pub mod convert;
pub mod encoding;
pub mod error;
pub mod json;
pub mod xml;
pub mod yaml;

pub use convert::{convert, decode, encode, ConversionRecord};
pub use encoding::Encoding;
pub use error::ConversionError;
