//! Coverage: every control of the baseline needs an implemented requirement.

use std::collections::HashSet;

use ocf_catalog::ResolvedBaseline;
use ocf_core::{codes, ControlId, Expected, FieldPath, RuleClass, Severity, ValidationError};

use crate::document::SspDocument;

/// One error per baseline control without a matching `control-id`, in
/// baseline order. The error path is the control id itself.
pub fn check(doc: &SspDocument<'_>, baseline: &ResolvedBaseline) -> Vec<ValidationError> {
    // Unparseable ids cannot match any control; structural checks own them.
    let implemented: HashSet<ControlId> = doc
        .implemented_control_ids()
        .into_iter()
        .filter_map(|(_, id)| ControlId::new(id).ok())
        .collect();

    baseline
        .control_ids()
        .filter(|id| !implemented.contains(*id))
        .map(|id| {
            ValidationError::new(
                Severity::Constraint,
                RuleClass::Coverage,
                codes::MISSING_REQUIRED_CONTROL,
                FieldPath::from_key(id.as_str()),
                format!(
                    "control {id} required by baseline {} has no implemented requirement",
                    baseline.profile
                ),
            )
            .with_expected(Expected::Rule(format!(
                "an implemented-requirements entry with control-id {id}"
            )))
        })
        .collect()
}
