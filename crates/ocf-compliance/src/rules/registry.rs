//! Registry conformance: registered fields must hold a permitted value.

use ocf_catalog::{Registry, ResolvedBaseline};
use ocf_core::{codes, leaves, Expected, RuleClass, Severity, ValidationError};

use crate::document::SspDocument;

/// One error per scalar field whose path matches an entry applicable to the
/// baseline and whose value the entry does not permit. When several entries
/// match a path, the first one in the registry decides.
pub fn check(
    doc: &SspDocument<'_>,
    baseline: &ResolvedBaseline,
    registry: &Registry,
) -> Vec<ValidationError> {
    leaves(doc.tree())
        .into_iter()
        .filter_map(|(path, value)| {
            let entry = registry.entry_for_path(&baseline.profile, &path)?;
            if entry.permits(value) {
                return None;
            }
            let message = format!(
                "value {value} at {path} is not one of the permitted values: {}",
                entry.allowed.join(", ")
            );
            Some(
                ValidationError::new(Severity::Registry, RuleClass::Registry, codes::REGISTRY_VALUE, path, message)
                    .with_value(value.clone())
                    .with_expected(Expected::OneOf(entry.allowed.clone())),
            )
        })
        .collect()
}
