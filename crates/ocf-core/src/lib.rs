//! # ocf-core: Foundational Types for the Compliance Engine
//!
//! Leaf crate of the engine workspace. Every other `ocf-*` crate depends on
//! it; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `ControlId`, `CatalogRef`,
//!    `ProfileId`, `RunId` are distinct types with validated constructors.
//!    A control identifier is never a bare string once it enters the engine.
//!
//! 2. **`CanonicalBytes` newtype.** Every semantic digest flows through
//!    `CanonicalBytes::new()`. No raw `serde_json::to_vec()` for digests.
//!
//! 3. **`sha256_digest()` accepts only `&CanonicalBytes`.** Compile-time
//!    enforcement that the converter and the resolver hash the semantic tree,
//!    never encoding-specific bytes.
//!
//! 4. **One path language.** Report entries, registry patterns and the
//!    constraint engine all address document fields through [`FieldPath`] and
//!    [`PathPattern`].
//!
//! ## Crate Policy
//!
//! - No dependencies on other `ocf-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod path;
pub mod report;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use canonical::{semantic_digest, CanonicalBytes};
pub use digest::{sha256_digest, sha256_hex, ContentDigest, DigestAlgorithm};
pub use error::{CanonicalizationError, IdentifierError, OcfError};
pub use identity::{CatalogRef, ControlId, ProfileId, RunId};
pub use path::{leaves, FieldPath, PathPattern, PathSegment, PatternSegment};
pub use report::{codes, Advisory, Expected, RuleClass, Severity, ValidationError};
pub use temporal::Timestamp;
