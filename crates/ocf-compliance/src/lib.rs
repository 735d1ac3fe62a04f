//! # ocf-compliance: Validation Orchestration
//!
//! Ties the workspace together: a document is decoded by `ocf-convert`,
//! checked structurally by `ocf-schema`, evaluated against a baseline
//! resolved by `ocf-catalog`, and summarized as one [`ValidationRun`].
//!
//! ## Pipeline
//!
//! ```text
//! PENDING -> STRUCTURAL_CHECK -> BASELINE_RESOLVED -> CONSTRAINT_CHECK -> COMPLETED(pass|fail)
//!                  |
//!                  +-> INVALID          (document malformed)
//!                  +-> COMPLETED(fail)  (baseline could not be resolved)
//! ```
//!
//! Structural errors short-circuit: constraint rules never see a document
//! that failed the structural check.
//!
//! ## Crate Policy
//!
//! - Document findings are data in the run, never `Err`.
//! - No `.unwrap()` outside tests.

pub mod batch;
pub mod config;
pub mod document;
pub mod error;
pub mod orchestrator;
pub mod rules;
pub mod run;

pub use batch::{validate_batch, validate_batch_with, BatchItem, BatchOptions, BatchOutcome, BatchResult};
pub use config::{ConfigError, EngineConfig};
pub use document::SspDocument;
pub use error::EngineError;
pub use orchestrator::Engine;
pub use rules::{ConstraintEngine, ConstraintEvaluator};
pub use run::{RunError, RunOutcome, RunState, RunTracker, SeverityCounts, ValidationRun, Verdict};
