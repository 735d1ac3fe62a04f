//! # ocf-schema: Structural Validation
//!
//! Validates candidate documents against the bundled, versioned
//! document-model schemas. Independent of baselines and the registry.
//!
//! ## Modules
//!
//! - **kind**: document model detection from the root key.
//! - **validate**: [`StructureValidator`] and `check_structure`.
//!
//! ## Crate Policy
//!
//! - Schemas are compiled into the binary; validation never touches disk or
//!   network.
//! - Structural findings are data, not errors.

pub mod error;
pub mod kind;
pub mod validate;

pub use error::SchemaError;
pub use kind::DocumentKind;
pub use validate::{StructureValidator, DEFAULT_SCHEMA_VERSION, KNOWN_SECTIONS};
