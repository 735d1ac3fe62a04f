//! # Validation Orchestrator
//!
//! The public entry point. [`Engine::validate`] sequences the structural
//! check, baseline resolution (cached per content snapshot) and the
//! constraint rules, and returns one [`ValidationRun`].
//!
//! Each run pins the content snapshot current when it starts, so a reload
//! in the middle of a run does not change what that run sees.

use std::sync::Arc;

use ocf_catalog::{ContentSnapshot, ContentStore, ProfileResolutionError, ResolvedBaseline};
use ocf_convert::{ConversionError, ConversionRecord, Encoding};
use ocf_core::{codes, semantic_digest, Expected, FieldPath, RuleClass, Severity, ValidationError};
use ocf_schema::{DocumentKind, StructureValidator};
use serde_json::Value;

use crate::config::EngineConfig;
use crate::document::SspDocument;
use crate::error::EngineError;
use crate::rules::{advisory, ConstraintEngine, ConstraintEvaluator};
use crate::run::{RunTracker, ValidationRun};

pub struct Engine {
    config: EngineConfig,
    store: ContentStore,
    structure: StructureValidator,
    evaluator: Arc<dyn ConstraintEvaluator>,
}

impl Engine {
    /// Load content from `config.content_dir` and compile the bundled schemas.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let snapshot = ContentSnapshot::load_dir(&config.content_dir, config.resolve_options())?;
        Self::with_snapshot(config, snapshot)
    }

    /// Build an engine over content that is already loaded.
    pub fn with_snapshot(config: EngineConfig, snapshot: ContentSnapshot) -> Result<Self, EngineError> {
        config.validate()?;
        let structure = StructureValidator::bundled()?;
        if !structure.supports(&config.schema_version) {
            return Err(EngineError::UnsupportedSchemaVersion {
                requested: config.schema_version.clone(),
                available: structure.versions().join(", "),
            });
        }
        Ok(Self {
            config,
            store: ContentStore::new(snapshot),
            structure,
            evaluator: Arc::new(ConstraintEngine),
        })
    }

    /// Replace the constraint evaluator.
    pub fn with_evaluator(mut self, evaluator: Arc<dyn ConstraintEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    /// Reload content from the configured directory and swap it in. Runs
    /// already in flight finish against the snapshot they started with.
    pub fn reload(&self) -> Result<Arc<ContentSnapshot>, EngineError> {
        Ok(self.store.reload(&self.config.content_dir)?)
    }

    /// Resolve a baseline by `name@version` or unique name.
    pub fn resolve_baseline(&self, profile: &str) -> Result<Arc<ResolvedBaseline>, ProfileResolutionError> {
        let snapshot = self.store.snapshot();
        let (result, cache) = snapshot.baseline(profile);
        match &result {
            Ok(baseline) => tracing::debug!(
                profile,
                cache = cache.as_str(),
                controls = baseline.len(),
                "baseline resolved"
            ),
            Err(e) => tracing::warn!(profile, cache = cache.as_str(), error = %e, "baseline resolution failed"),
        }
        result
    }

    /// Convert a document between encodings, verifying semantic equivalence.
    pub fn convert(
        &self,
        bytes: &[u8],
        source: Encoding,
        target: Encoding,
    ) -> Result<(Vec<u8>, ConversionRecord), ConversionError> {
        ocf_convert::convert(bytes, source, target)
    }

    /// Validate a serialized document against a baseline.
    ///
    /// Problems with the document or the baseline are reported inside the
    /// returned run. `Err` is reserved for faults of the engine itself.
    pub fn validate(&self, bytes: &[u8], encoding: Encoding, baseline: &str) -> Result<ValidationRun, EngineError> {
        let (snapshot, mut tracker) = self.start_run(baseline, encoding);
        let span = tracing::info_span!("validate", run_id = %tracker.run_id(), baseline);
        let _entered = span.enter();

        tracker.begin_structural_check()?;
        let doc = match ocf_convert::decode(bytes, encoding) {
            Ok(doc) => doc,
            Err(e) => {
                let error = ValidationError::new(
                    Severity::Structural,
                    RuleClass::Schema,
                    codes::DOCUMENT_PARSE,
                    FieldPath::root(),
                    e.to_string(),
                )
                .with_expected(Expected::Rule(format!("a well-formed {encoding} document")));
                tracker.structurally_invalid(vec![error])?;
                return self.finish(tracker);
            }
        };
        self.evaluate_document(&snapshot, tracker, &doc, baseline)
    }

    /// Validate an already parsed document tree. The run records the JSON
    /// encoding.
    pub fn validate_value(&self, doc: &Value, baseline: &str) -> Result<ValidationRun, EngineError> {
        let (snapshot, mut tracker) = self.start_run(baseline, Encoding::Json);
        let span = tracing::info_span!("validate", run_id = %tracker.run_id(), baseline);
        let _entered = span.enter();

        tracker.begin_structural_check()?;
        self.evaluate_document(&snapshot, tracker, doc, baseline)
    }

    /// Pin the current snapshot and open a tracker for one run.
    fn start_run(&self, baseline: &str, encoding: Encoding) -> (Arc<ContentSnapshot>, RunTracker) {
        let snapshot = self.store.snapshot();
        let tracker = RunTracker::new(
            baseline,
            encoding,
            &self.config.schema_version,
            snapshot.content_digest().clone(),
        );
        (snapshot, tracker)
    }

    fn evaluate_document(
        &self,
        snapshot: &ContentSnapshot,
        mut tracker: RunTracker,
        doc: &Value,
        baseline: &str,
    ) -> Result<ValidationRun, EngineError> {
        tracker.record_document(semantic_digest(doc).ok(), Some(DocumentKind::detect(doc)));
        if let Some(ssp) = SspDocument::new(doc) {
            tracker.add_advisories(advisory::check(&ssp));
        }

        let structural = self
            .structure
            .check_structure(doc, &self.config.schema_version, self.config.strict_mode)?;
        if !structural.is_empty() {
            tracker.structurally_invalid(structural)?;
            return self.finish(tracker);
        }

        let (resolved, cache) = snapshot.baseline(baseline);
        tracing::debug!(cache = cache.as_str(), "baseline lookup");
        let resolved = match resolved {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::warn!(baseline, error = %e, "baseline resolution failed");
                tracker.resolution_failed(resolution_error(baseline, &e))?;
                return self.finish(tracker);
            }
        };
        let digest = match resolved.digest() {
            Ok(digest) => digest,
            Err(e) => {
                tracker.resolution_failed(
                    ValidationError::new(
                        Severity::Resolution,
                        RuleClass::Resolution,
                        codes::BASELINE_RESOLUTION,
                        FieldPath::root(),
                        format!("baseline {baseline} could not be digested: {e}"),
                    ),
                )?;
                return self.finish(tracker);
            }
        };
        tracker.baseline_resolved(&resolved, digest)?;
        if let Some(ssp) = SspDocument::new(doc) {
            tracker.add_advisories(advisory::check_baseline(&ssp, &resolved));
        }

        tracker.begin_constraint_check()?;
        let errors = self.evaluator.evaluate(doc, &resolved, snapshot.registry());
        tracker.constraints_evaluated(errors)?;
        self.finish(tracker)
    }

    fn finish(&self, tracker: RunTracker) -> Result<ValidationRun, EngineError> {
        let run = tracker.finish()?;
        metrics::counter!("ocf_validation_runs_total", "outcome" => run.outcome.as_str()).increment(1);
        metrics::histogram!("ocf_validation_duration_ms").record(run.duration_ms as f64);
        tracing::info!(
            run_id = %run.run_id,
            baseline = %run.baseline,
            outcome = %run.outcome,
            error_count = run.errors.len(),
            duration_ms = run.duration_ms,
            "validation run completed"
        );
        Ok(run)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

fn resolution_error(baseline: &str, error: &ProfileResolutionError) -> ValidationError {
    ValidationError::new(
        Severity::Resolution,
        RuleClass::Resolution,
        codes::BASELINE_RESOLUTION,
        FieldPath::root(),
        format!("baseline {baseline} could not be resolved: {error}"),
    )
    .with_value(Value::String(baseline.to_string()))
}
