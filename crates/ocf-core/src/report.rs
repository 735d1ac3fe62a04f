//! # Validation Report Entries
//!
//! The structured error and advisory records produced by a validation run.
//! Every entry carries a stable machine-readable `code`, the field path it
//! concerns, and a human-readable message.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path::FieldPath;

/// Stable error codes emitted in reports.
pub mod codes {
    pub const SCHEMA_VIOLATION: &str = "OCF_SCHEMA_VIOLATION";
    pub const UNKNOWN_SECTION: &str = "OCF_UNKNOWN_SECTION";
    pub const DOCUMENT_PARSE: &str = "OCF_DOCUMENT_PARSE";
    pub const MISSING_REQUIRED_CONTROL: &str = "OCF_MISSING_REQUIRED_CONTROL";
    pub const REGISTRY_VALUE: &str = "OCF_REGISTRY_VALUE";
    pub const MISSING_ROLE: &str = "OCF_MISSING_ROLE";
    pub const DANGLING_REFERENCE: &str = "OCF_DANGLING_REFERENCE";
    pub const BASELINE_RESOLUTION: &str = "OCF_BASELINE_RESOLUTION";

    pub const MISSING_VERSION: &str = "OCF_ADVISORY_MISSING_VERSION";
    pub const MISSING_LAST_MODIFIED: &str = "OCF_ADVISORY_MISSING_LAST_MODIFIED";
    pub const NO_PARTIES: &str = "OCF_ADVISORY_NO_PARTIES";
    pub const MISSING_AUTHORIZATION_BOUNDARY: &str = "OCF_ADVISORY_MISSING_AUTHORIZATION_BOUNDARY";
    pub const BRIEF_AUTHORIZATION_BOUNDARY: &str = "OCF_ADVISORY_BRIEF_AUTHORIZATION_BOUNDARY";
    pub const MISSING_NETWORK_ARCHITECTURE: &str = "OCF_ADVISORY_MISSING_NETWORK_ARCHITECTURE";
    pub const MISSING_STATEMENTS: &str = "OCF_ADVISORY_MISSING_STATEMENTS";
    pub const MISSING_RESPONSIBLE_ROLES: &str = "OCF_ADVISORY_MISSING_RESPONSIBLE_ROLES";
    pub const MISSING_DATA_FLOW: &str = "OCF_ADVISORY_MISSING_DATA_FLOW";
    pub const MISSING_ARTIFACT: &str = "OCF_ADVISORY_MISSING_ARTIFACT";
}

/// How an error was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    /// The document does not conform to the schema. Blocks constraint checks.
    Structural,
    /// A baseline constraint is not satisfied.
    Constraint,
    /// A field value is outside its registered allowed set.
    Registry,
    /// The requested baseline could not be resolved.
    Resolution,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Structural => "structural",
            Self::Constraint => "constraint",
            Self::Registry => "registry",
            Self::Resolution => "resolution",
        };
        f.write_str(s)
    }
}

/// Which rule family produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleClass {
    Schema,
    Coverage,
    Registry,
    Role,
    CrossReference,
    Resolution,
}

/// What was expected at the failing location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum Expected {
    /// The value must be one of these.
    OneOf(Vec<String>),
    /// Free-form description of the rule.
    Rule(String),
}

/// One failed check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub severity: Severity,
    pub rule: RuleClass,
    /// Stable code from [`codes`].
    pub code: String,
    /// Where in the document. Coverage errors use the control id as a
    /// single-key path.
    pub path: FieldPath,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offending_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Expected>,
}

impl ValidationError {
    pub fn new(
        severity: Severity,
        rule: RuleClass,
        code: &str,
        path: FieldPath,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            rule,
            code: code.to_string(),
            path,
            message: message.into(),
            offending_value: None,
            expected: None,
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.offending_value = Some(value);
        self
    }

    pub fn with_expected(mut self, expected: Expected) -> Self {
        self.expected = Some(expected);
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {} at {}: {}", self.severity, self.code, self.path, self.message)
    }
}

/// Non-blocking observation. Advisories never change the outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub code: String,
    pub path: FieldPath,
    pub message: String,
}

impl Advisory {
    pub fn new(code: &str, path: FieldPath, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            path,
            message: message.into(),
        }
    }
}
