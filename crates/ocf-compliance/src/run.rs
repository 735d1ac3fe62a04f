//! # Validation Run State Machine
//!
//! ```text
//! Pending ──▶ StructuralCheck ──▶ Invalid (terminal)
//!                   │
//!                   ├──▶ Completed(fail)           baseline did not resolve
//!                   ▼
//!            BaselineResolved ──▶ ConstraintCheck ──▶ Completed(pass | fail)
//! ```
//!
//! [`RunTracker`] enforces the edges while a run is in flight and records
//! every state it passes through. [`RunTracker::finish`] seals it into an
//! immutable [`ValidationRun`], the terminal object returned to callers.

use std::time::Instant;

use ocf_catalog::ResolvedBaseline;
use ocf_convert::Encoding;
use ocf_core::{Advisory, ContentDigest, ProfileId, RunId, Severity, Timestamp, ValidationError};
use ocf_schema::DocumentKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Final judgement of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    Pass,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunState {
    Pending,
    StructuralCheck,
    /// The document is malformed. Terminal.
    Invalid,
    BaselineResolved,
    ConstraintCheck,
    /// Terminal.
    Completed(Verdict),
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Invalid | Self::Completed(_))
    }

    /// Whether `self -> to` is an edge of the machine.
    pub fn can_transition_to(&self, to: RunState) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::StructuralCheck)
                | (Self::StructuralCheck, Self::Invalid)
                | (Self::StructuralCheck, Self::BaselineResolved)
                | (Self::StructuralCheck, Self::Completed(Verdict::Fail))
                | (Self::BaselineResolved, Self::ConstraintCheck)
                | (Self::ConstraintCheck, Self::Completed(_))
        )
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => f.write_str("PENDING"),
            Self::StructuralCheck => f.write_str("STRUCTURAL_CHECK"),
            Self::Invalid => f.write_str("INVALID"),
            Self::BaselineResolved => f.write_str("BASELINE_RESOLVED"),
            Self::ConstraintCheck => f.write_str("CONSTRAINT_CHECK"),
            Self::Completed(Verdict::Pass) => f.write_str("COMPLETED_PASS"),
            Self::Completed(Verdict::Fail) => f.write_str("COMPLETED_FAIL"),
        }
    }
}

/// Coarse outcome used in reports and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunOutcome {
    Pass,
    Fail,
    Invalid,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Invalid => "invalid",
        }
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    #[error("invalid run transition: {from} -> {to}")]
    InvalidTransition { from: RunState, to: RunState },

    #[error("run finished in non-terminal state {0}")]
    NotTerminal(RunState),
}

/// Error counts per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub structural: usize,
    pub constraint: usize,
    pub registry: usize,
    pub resolution: usize,
}

impl SeverityCounts {
    pub fn tally(errors: &[ValidationError]) -> Self {
        errors.iter().fold(Self::default(), |mut c, e| {
            match e.severity {
                Severity::Structural => c.structural += 1,
                Severity::Constraint => c.constraint += 1,
                Severity::Registry => c.registry += 1,
                Severity::Resolution => c.resolution += 1,
            }
            c
        })
    }

    pub fn total(&self) -> usize {
        self.structural + self.constraint + self.registry + self.resolution
    }
}

/// The terminal record of one validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ValidationRun {
    pub run_id: RunId,
    /// Baseline reference as requested by the caller.
    pub baseline: String,
    /// Identity the reference resolved to, when resolution succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_id: Option<ProfileId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_digest: Option<ContentDigest>,
    /// Semantic digest of the document; absent when it did not parse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_digest: Option<ContentDigest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_kind: Option<DocumentKind>,
    pub encoding: Encoding,
    pub schema_version: String,
    /// Digest of the content snapshot the run was evaluated against.
    pub content_digest: ContentDigest,
    pub state: RunState,
    pub outcome: RunOutcome,
    pub pass: bool,
    pub started_at: Timestamp,
    pub completed_at: Timestamp,
    pub duration_ms: u64,
    pub errors: Vec<ValidationError>,
    pub advisories: Vec<Advisory>,
    pub counts: SeverityCounts,
    /// Every state the run passed through, in order.
    pub transitions: Vec<RunState>,
}

impl ValidationRun {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

/// A run in flight.
#[derive(Debug)]
pub struct RunTracker {
    run_id: RunId,
    state: RunState,
    transitions: Vec<RunState>,
    started_at: Timestamp,
    clock: Instant,
    baseline: String,
    encoding: Encoding,
    schema_version: String,
    content_digest: ContentDigest,
    baseline_id: Option<ProfileId>,
    baseline_digest: Option<ContentDigest>,
    document_digest: Option<ContentDigest>,
    document_kind: Option<DocumentKind>,
    errors: Vec<ValidationError>,
    advisories: Vec<Advisory>,
}

impl RunTracker {
    pub fn new(baseline: &str, encoding: Encoding, schema_version: &str, content_digest: ContentDigest) -> Self {
        Self {
            run_id: RunId::new(),
            state: RunState::Pending,
            transitions: vec![RunState::Pending],
            started_at: Timestamp::now(),
            clock: Instant::now(),
            baseline: baseline.to_string(),
            encoding,
            schema_version: schema_version.to_string(),
            content_digest,
            baseline_id: None,
            baseline_digest: None,
            document_digest: None,
            document_kind: None,
            errors: Vec::new(),
            advisories: Vec::new(),
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, to: RunState) -> Result<(), RunError> {
        if !self.state.can_transition_to(to) {
            return Err(RunError::InvalidTransition { from: self.state, to });
        }
        tracing::debug!(run_id = %self.run_id, from = %self.state, to = %to, "run transition");
        self.state = to;
        self.transitions.push(to);
        Ok(())
    }

    /// PENDING -> STRUCTURAL_CHECK.
    pub fn begin_structural_check(&mut self) -> Result<(), RunError> {
        self.transition(RunState::StructuralCheck)
    }

    pub fn record_document(&mut self, digest: Option<ContentDigest>, kind: Option<DocumentKind>) {
        self.document_digest = digest;
        self.document_kind = kind;
    }

    pub fn add_advisories(&mut self, advisories: Vec<Advisory>) {
        self.advisories.extend(advisories);
    }

    /// STRUCTURAL_CHECK -> INVALID, keeping the structural findings.
    pub fn structurally_invalid(&mut self, errors: Vec<ValidationError>) -> Result<(), RunError> {
        self.transition(RunState::Invalid)?;
        self.errors = errors;
        Ok(())
    }

    /// STRUCTURAL_CHECK -> BASELINE_RESOLVED.
    pub fn baseline_resolved(&mut self, baseline: &ResolvedBaseline, digest: ContentDigest) -> Result<(), RunError> {
        self.transition(RunState::BaselineResolved)?;
        self.baseline_id = Some(baseline.profile.clone());
        self.baseline_digest = Some(digest);
        Ok(())
    }

    /// STRUCTURAL_CHECK -> COMPLETED(fail) with a single resolution error.
    pub fn resolution_failed(&mut self, error: ValidationError) -> Result<(), RunError> {
        self.transition(RunState::Completed(Verdict::Fail))?;
        self.errors = vec![error];
        Ok(())
    }

    /// BASELINE_RESOLVED -> CONSTRAINT_CHECK.
    pub fn begin_constraint_check(&mut self) -> Result<(), RunError> {
        self.transition(RunState::ConstraintCheck)
    }

    /// CONSTRAINT_CHECK -> COMPLETED; passes iff `errors` is empty.
    pub fn constraints_evaluated(&mut self, errors: Vec<ValidationError>) -> Result<(), RunError> {
        let verdict = if errors.is_empty() { Verdict::Pass } else { Verdict::Fail };
        self.transition(RunState::Completed(verdict))?;
        self.errors = errors;
        Ok(())
    }

    /// Seal the run. Fails unless the tracker is in a terminal state.
    pub fn finish(self) -> Result<ValidationRun, RunError> {
        let outcome = match self.state {
            RunState::Invalid => RunOutcome::Invalid,
            RunState::Completed(Verdict::Pass) => RunOutcome::Pass,
            RunState::Completed(Verdict::Fail) => RunOutcome::Fail,
            other => return Err(RunError::NotTerminal(other)),
        };
        let counts = SeverityCounts::tally(&self.errors);
        Ok(ValidationRun {
            run_id: self.run_id,
            baseline: self.baseline,
            baseline_id: self.baseline_id,
            baseline_digest: self.baseline_digest,
            document_digest: self.document_digest,
            document_kind: self.document_kind,
            encoding: self.encoding,
            schema_version: self.schema_version,
            content_digest: self.content_digest,
            state: self.state,
            outcome,
            pass: outcome == RunOutcome::Pass,
            started_at: self.started_at,
            completed_at: Timestamp::now(),
            duration_ms: self.clock.elapsed().as_millis() as u64,
            errors: self.errors,
            advisories: self.advisories,
            counts,
            transitions: self.transitions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocf_core::{codes, DigestAlgorithm, FieldPath, RuleClass};

    fn tracker() -> RunTracker {
        RunTracker::new(
            "moderate",
            Encoding::Json,
            "1.1.2",
            ContentDigest::new(DigestAlgorithm::Sha256, [7u8; 32]),
        )
    }

    fn error(severity: Severity) -> ValidationError {
        ValidationError::new(severity, RuleClass::Coverage, codes::MISSING_REQUIRED_CONTROL, FieldPath::from_key("ac-1"), "x")
    }

    #[test]
    fn edges() {
        use RunState::*;
        assert!(Pending.can_transition_to(StructuralCheck));
        assert!(StructuralCheck.can_transition_to(Invalid));
        assert!(StructuralCheck.can_transition_to(Completed(Verdict::Fail)));
        assert!(!StructuralCheck.can_transition_to(Completed(Verdict::Pass)));
        assert!(!Pending.can_transition_to(ConstraintCheck));
        assert!(!Invalid.can_transition_to(BaselineResolved));
        assert!(!Completed(Verdict::Pass).can_transition_to(Pending));
        assert!(Invalid.is_terminal());
        assert!(!ConstraintCheck.is_terminal());
    }

    #[test]
    fn structural_failure_is_terminal() {
        let mut t = tracker();
        t.begin_structural_check().unwrap();
        t.structurally_invalid(vec![error(Severity::Structural)]).unwrap();
        assert!(matches!(
            t.begin_constraint_check(),
            Err(RunError::InvalidTransition { from: RunState::Invalid, .. })
        ));
        let run = t.finish().unwrap();
        assert_eq!(run.outcome, RunOutcome::Invalid);
        assert!(!run.pass);
        assert_eq!(run.counts.structural, 1);
        assert_eq!(
            run.transitions,
            vec![RunState::Pending, RunState::StructuralCheck, RunState::Invalid]
        );
    }

    #[test]
    fn constraint_path_passes_when_empty() {
        let mut t = tracker();
        t.begin_structural_check().unwrap();
        let baseline = crate::rules::fixtures::baseline(&["ac-1"], &[]);
        t.baseline_resolved(&baseline, ContentDigest::new(DigestAlgorithm::Sha256, [1u8; 32]))
            .unwrap();
        t.begin_constraint_check().unwrap();
        t.constraints_evaluated(Vec::new()).unwrap();
        let run = t.finish().unwrap();
        assert!(run.pass);
        assert_eq!(run.state, RunState::Completed(Verdict::Pass));
        assert_eq!(run.baseline_id.unwrap().name, "moderate");
    }

    #[test]
    fn unfinished_run_cannot_be_sealed() {
        let mut t = tracker();
        t.begin_structural_check().unwrap();
        assert_eq!(t.finish().unwrap_err(), RunError::NotTerminal(RunState::StructuralCheck));
    }

    #[test]
    fn counts_tally_by_severity() {
        let counts = SeverityCounts::tally(&[
            error(Severity::Constraint),
            error(Severity::Registry),
            error(Severity::Constraint),
        ]);
        assert_eq!(counts.constraint, 2);
        assert_eq!(counts.registry, 1);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn run_serializes_kebab_case() {
        let mut t = tracker();
        t.begin_structural_check().unwrap();
        t.structurally_invalid(Vec::new()).unwrap();
        let v = serde_json::to_value(t.finish().unwrap()).unwrap();
        assert_eq!(v["outcome"], "invalid");
        assert_eq!(v["state"], "invalid");
        assert!(v.get("run-id").is_some());
        assert!(v.get("baseline-id").is_none());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_state() -> impl Strategy<Value = RunState> {
        prop_oneof![
            Just(RunState::Pending),
            Just(RunState::StructuralCheck),
            Just(RunState::Invalid),
            Just(RunState::BaselineResolved),
            Just(RunState::ConstraintCheck),
            Just(RunState::Completed(Verdict::Pass)),
            Just(RunState::Completed(Verdict::Fail)),
        ]
    }

    proptest! {
        #[test]
        fn terminal_states_have_no_exits(from in arb_state(), to in arb_state()) {
            if from.is_terminal() {
                prop_assert!(!from.can_transition_to(to));
            }
        }

        #[test]
        fn nothing_returns_to_pending(from in arb_state()) {
            prop_assert!(!from.can_transition_to(RunState::Pending));
        }

        #[test]
        fn only_structural_check_reaches_invalid(from in arb_state()) {
            prop_assert_eq!(
                from.can_transition_to(RunState::Invalid),
                from == RunState::StructuralCheck
            );
        }
    }
}
