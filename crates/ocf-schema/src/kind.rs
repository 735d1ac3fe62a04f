//! Document model detection.
//!
//! OSCAL documents carry their model as the single top-level key.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The OSCAL model a document claims to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    SystemSecurityPlan,
    Catalog,
    Profile,
    ComponentDefinition,
    AssessmentPlan,
    AssessmentResults,
    PlanOfActionAndMilestones,
    Unknown,
}

impl DocumentKind {
    const ALL: [(DocumentKind, &'static str); 7] = [
        (Self::SystemSecurityPlan, "system-security-plan"),
        (Self::Catalog, "catalog"),
        (Self::Profile, "profile"),
        (Self::ComponentDefinition, "component-definition"),
        (Self::AssessmentPlan, "assessment-plan"),
        (Self::AssessmentResults, "assessment-results"),
        (Self::PlanOfActionAndMilestones, "plan-of-action-and-milestones"),
    ];

    /// Detect the model from the document root.
    ///
    /// Anything other than an object with exactly one known key is `Unknown`.
    pub fn detect(doc: &Value) -> Self {
        let Some(map) = doc.as_object() else {
            return Self::Unknown;
        };
        if map.len() != 1 {
            return Self::Unknown;
        }
        map.keys()
            .next()
            .and_then(|k| Self::ALL.iter().find(|(_, name)| name == k))
            .map(|(kind, _)| *kind)
            .unwrap_or(Self::Unknown)
    }

    /// The top-level key for this model.
    pub fn root_key(&self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(kind, _)| kind == self)
            .map(|(_, name)| *name)
            .unwrap_or("unknown")
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.root_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_known_models() {
        assert_eq!(
            DocumentKind::detect(&json!({"system-security-plan": {}})),
            DocumentKind::SystemSecurityPlan
        );
        assert_eq!(DocumentKind::detect(&json!({"catalog": {}})), DocumentKind::Catalog);
        assert_eq!(
            DocumentKind::detect(&json!({"plan-of-action-and-milestones": {}})),
            DocumentKind::PlanOfActionAndMilestones
        );
    }

    #[test]
    fn ambiguous_or_foreign_roots_are_unknown() {
        assert_eq!(DocumentKind::detect(&json!([])), DocumentKind::Unknown);
        assert_eq!(DocumentKind::detect(&json!({})), DocumentKind::Unknown);
        assert_eq!(
            DocumentKind::detect(&json!({"catalog": {}, "profile": {}})),
            DocumentKind::Unknown
        );
        assert_eq!(DocumentKind::detect(&json!({"spreadsheet": {}})), DocumentKind::Unknown);
    }

    #[test]
    fn display_is_root_key() {
        assert_eq!(DocumentKind::SystemSecurityPlan.to_string(), "system-security-plan");
        assert_eq!(DocumentKind::Unknown.to_string(), "unknown");
    }
}
