//! # Constraint Rules
//!
//! Baseline-specific semantic checks over a structurally valid SSP. The four
//! rule classes are evaluated independently and in a fixed order, and every
//! finding is reported:
//!
//! 1. [`coverage`]: every baseline control has an implemented requirement.
//! 2. [`registry`]: registered fields hold permitted values.
//! 3. [`roles`]: every required role is assigned to an existing party.
//! 4. [`xref`]: references resolve to entries defined in the document.
//!
//! [`advisory`] produces non-failing observations alongside.

pub mod advisory;
pub mod coverage;
pub mod registry;
pub mod roles;
pub mod xref;

use ocf_catalog::{Registry, ResolvedBaseline};
use ocf_core::ValidationError;
use serde_json::Value;

use crate::document::SspDocument;

/// Evaluates baseline constraints against a document.
///
/// Implementations must be pure: the same inputs always yield the same
/// findings in the same order.
pub trait ConstraintEvaluator: Send + Sync {
    fn evaluate(
        &self,
        doc: &Value,
        baseline: &ResolvedBaseline,
        registry: &Registry,
    ) -> Vec<ValidationError>;
}

/// The standard evaluator running all four rule classes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintEngine;

impl ConstraintEvaluator for ConstraintEngine {
    fn evaluate(
        &self,
        doc: &Value,
        baseline: &ResolvedBaseline,
        registry: &Registry,
    ) -> Vec<ValidationError> {
        let Some(ssp) = SspDocument::new(doc) else {
            return Vec::new();
        };
        let mut errors = coverage::check(&ssp, baseline);
        errors.extend(registry::check(&ssp, baseline, registry));
        errors.extend(roles::check(&ssp, baseline));
        errors.extend(xref::check(&ssp));
        tracing::debug!(
            baseline = %baseline.profile,
            errors = errors.len(),
            "constraint rules evaluated"
        );
        errors
    }
}
