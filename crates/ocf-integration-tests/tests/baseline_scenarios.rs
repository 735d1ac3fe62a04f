//! End-to-end validation scenarios against the bundled content.
//!
//! Every test builds an engine over `content/` at the workspace root and
//! drives it through the public `Engine::validate` entry point.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ocf_catalog::{Registry, ResolvedBaseline};
use ocf_compliance::{ConstraintEvaluator, Engine, EngineConfig, RunOutcome, RunState, Verdict};
use ocf_convert::Encoding;
use ocf_core::{codes, ControlId, Expected, RuleClass, Severity, ValidationError};
use serde_json::{json, Value};

fn content_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../content")
}

fn engine() -> Engine {
    Engine::new(EngineConfig {
        content_dir: content_dir(),
        ..EngineConfig::default()
    })
    .unwrap()
}

fn sample(name: &str) -> Value {
    let path = content_dir().join("samples").join(name);
    let bytes = std::fs::read(&path).unwrap();
    ocf_convert::decode(&bytes, Encoding::from_path(&path).unwrap()).unwrap()
}

fn json_bytes(doc: &Value) -> Vec<u8> {
    serde_json::to_vec(doc).unwrap()
}

/// Drop the implemented requirement for `control_id`.
fn without_control(mut doc: Value, control_id: &str) -> Value {
    let reqs = doc
        .pointer_mut("/system-security-plan/control-implementation/implemented-requirements")
        .and_then(Value::as_array_mut)
        .unwrap();
    reqs.retain(|r| r["control-id"] != control_id);
    doc
}

// =========================================================================
// The moderate scenario
// =========================================================================

#[test]
fn moderate_resolves_to_three_controls() {
    let baseline = engine().resolve_baseline("moderate").unwrap();
    let ids: Vec<&str> = baseline.control_ids().map(ControlId::as_str).collect();
    assert_eq!(ids, vec!["AC-1", "AC-2", "AU-2"]);
    assert_eq!(baseline.required_roles, vec!["system-owner"]);
}

#[test]
fn moderate_incomplete_document_has_exactly_two_errors() {
    let engine = engine();
    let bytes = std::fs::read(content_dir().join("samples/ssp-moderate-incomplete.yaml")).unwrap();
    let run = engine.validate(&bytes, Encoding::Yaml, "moderate").unwrap();

    assert!(!run.pass);
    assert_eq!(run.state, RunState::Completed(Verdict::Fail));
    assert_eq!(run.errors.len(), 2, "{:#?}", run.errors);

    let coverage = &run.errors[0];
    assert_eq!(coverage.rule, RuleClass::Coverage);
    assert_eq!(coverage.severity, Severity::Constraint);
    assert_eq!(coverage.path.to_string(), "AC-2");

    let role = &run.errors[1];
    assert_eq!(role.rule, RuleClass::Role);
    assert_eq!(role.code, codes::MISSING_ROLE);
    assert_eq!(role.offending_value, Some(json!("system-owner")));
}

#[test]
fn compliant_document_passes_in_every_encoding() {
    let engine = engine();
    let doc = sample("ssp-moderate.json");
    for encoding in Encoding::ALL {
        let bytes = ocf_convert::encode(&doc, encoding).unwrap();
        let run = engine.validate(&bytes, encoding, "moderate@1.0").unwrap();
        assert!(run.pass, "{encoding}: {:#?}", run.errors);
        assert_eq!(run.encoding, encoding);
    }
}

// =========================================================================
// Coverage completeness
// =========================================================================

#[test]
fn dropping_one_control_yields_one_coverage_error() {
    let engine = engine();
    let baseline = engine.resolve_baseline("moderate").unwrap();
    for missing in baseline.control_ids() {
        let doc = without_control(sample("ssp-moderate.json"), &missing.as_str().to_ascii_lowercase());
        let run = engine.validate(&json_bytes(&doc), Encoding::Json, "moderate").unwrap();
        let coverage: Vec<&ValidationError> = run.errors.iter().filter(|e| e.rule == RuleClass::Coverage).collect();
        assert_eq!(coverage.len(), 1, "missing {missing}: {:#?}", run.errors);
        assert_eq!(coverage[0].path.to_string(), missing.to_string());
    }
}

// =========================================================================
// Registry rejection
// =========================================================================

#[test]
fn unregistered_value_yields_one_registry_error() {
    let mut doc = sample("ssp-moderate.json");
    doc["system-security-plan"]["system-implementation"]["components"][0]["type"] = json!("spaceship");

    let run = engine().validate(&json_bytes(&doc), Encoding::Json, "moderate").unwrap();
    assert_eq!(run.errors.len(), 1, "{:#?}", run.errors);
    let error = &run.errors[0];
    assert_eq!(error.severity, Severity::Registry);
    assert_eq!(error.code, codes::REGISTRY_VALUE);
    assert_eq!(
        error.path.to_string(),
        "system-security-plan.system-implementation.components[0].type"
    );
    assert_eq!(error.offending_value, Some(json!("spaceship")));
    match &error.expected {
        Some(Expected::OneOf(allowed)) => assert!(allowed.iter().any(|v| v == "this-system")),
        other => panic!("expected permitted set, got {other:?}"),
    }
}

#[test]
fn baseline_scoped_registry_entry_only_applies_to_its_baselines() {
    let mut doc = sample("ssp-moderate.json");
    doc["system-security-plan"]["system-characteristics"]["security-sensitivity-level"] = json!("fips-199-low");
    let engine = engine();

    let moderate = engine.validate(&json_bytes(&doc), Encoding::Json, "moderate").unwrap();
    assert_eq!(moderate.counts.registry, 1);

    let low = engine.validate(&json_bytes(&doc), Encoding::Json, "low").unwrap();
    assert_eq!(low.counts.registry, 0);
}

// =========================================================================
// Cross references and roles
// =========================================================================

#[test]
fn dangling_party_reference_reported_at_referring_path() {
    let mut doc = sample("ssp-moderate.json");
    doc["system-security-plan"]["metadata"]["responsible-parties"][1]["party-uuids"][0] =
        json!("00000000-0000-4000-8000-000000000000");

    let run = engine().validate(&json_bytes(&doc), Encoding::Json, "moderate").unwrap();
    assert_eq!(run.errors.len(), 1, "{:#?}", run.errors);
    assert_eq!(run.errors[0].rule, RuleClass::CrossReference);
    assert_eq!(
        run.errors[0].path.to_string(),
        "system-security-plan.metadata.responsible-parties[1].party-uuids[0]"
    );
}

#[test]
fn all_rule_classes_reported_together_in_fixed_order() {
    let mut doc = without_control(sample("ssp-moderate.json"), "au-2");
    let ssp = &mut doc["system-security-plan"];
    ssp["system-characteristics"]["status"]["state"] = json!("retired");
    ssp["metadata"]["responsible-parties"]
        .as_array_mut()
        .unwrap()
        .retain(|rp| rp["role-id"] != "system-owner");
    ssp["control-implementation"]["implemented-requirements"][0]["by-components"][0]["component-uuid"] =
        json!("11111111-1111-4111-8111-111111111111");

    let run = engine().validate(&json_bytes(&doc), Encoding::Json, "moderate").unwrap();
    let rules: Vec<RuleClass> = run.errors.iter().map(|e| e.rule).collect();
    assert_eq!(
        rules,
        vec![
            RuleClass::Coverage,
            RuleClass::Registry,
            RuleClass::Role,
            RuleClass::CrossReference
        ]
    );
}

// =========================================================================
// Fatal short-circuits
// =========================================================================

#[derive(Default)]
struct CountingEvaluator {
    calls: AtomicUsize,
}

impl ConstraintEvaluator for CountingEvaluator {
    fn evaluate(&self, _: &Value, _: &ResolvedBaseline, _: &Registry) -> Vec<ValidationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Vec::new()
    }
}

#[test]
fn structurally_invalid_document_never_reaches_constraints() {
    let counter = Arc::new(CountingEvaluator::default());
    let engine = engine().with_evaluator(counter.clone());

    let mut missing_metadata = sample("ssp-moderate.json");
    missing_metadata["system-security-plan"]
        .as_object_mut()
        .unwrap()
        .remove("metadata");
    let wrong_model = json!({"catalog": {"uuid": "x"}});

    for doc in [missing_metadata, wrong_model] {
        let run = engine.validate(&json_bytes(&doc), Encoding::Json, "moderate").unwrap();
        assert_eq!(run.outcome, RunOutcome::Invalid);
        assert!(!run.pass);
        assert!(run.errors.iter().all(|e| e.severity == Severity::Structural));
        assert!(run.baseline_digest.is_none());
    }
    assert_eq!(counter.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn unresolvable_baseline_is_single_top_level_error() {
    let counter = Arc::new(CountingEvaluator::default());
    let engine = engine().with_evaluator(counter.clone());
    let bytes = json_bytes(&sample("ssp-moderate.json"));

    for baseline in ["moderate@9.9", "nonexistent"] {
        let run = engine.validate(&bytes, Encoding::Json, baseline).unwrap();
        assert_eq!(run.state, RunState::Completed(Verdict::Fail));
        assert_eq!(run.errors.len(), 1);
        assert_eq!(run.errors[0].severity, Severity::Resolution);
        assert!(run.errors[0].path.is_root());
    }
    assert_eq!(counter.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn strict_mode_reports_unknown_sections() {
    let mut doc = sample("ssp-moderate.json");
    doc["system-security-plan"]["homegrown-extras"] = json!({"note": "x"});
    let bytes = json_bytes(&doc);

    let lenient = engine().validate(&bytes, Encoding::Json, "moderate").unwrap();
    let strict = Engine::new(EngineConfig {
        content_dir: content_dir(),
        strict_mode: true,
        ..EngineConfig::default()
    })
    .unwrap()
    .validate(&bytes, Encoding::Json, "moderate")
    .unwrap();

    assert_eq!(strict.outcome, RunOutcome::Invalid);
    assert!(strict.errors.iter().any(|e| e.code == codes::UNKNOWN_SECTION));
    assert_ne!(lenient.outcome, RunOutcome::Invalid);
}

// =========================================================================
// Advisories
// =========================================================================

#[test]
fn advisories_never_change_the_verdict() {
    let mut doc = sample("ssp-moderate.json");
    let metadata = doc["system-security-plan"]["metadata"].as_object_mut().unwrap();
    metadata.remove("version");
    metadata.remove("last-modified");

    let run = engine().validate(&json_bytes(&doc), Encoding::Json, "moderate").unwrap();
    assert!(run.pass, "{:#?}", run.errors);
    let codes_found: Vec<&str> = run.advisories.iter().map(|a| a.code.as_str()).collect();
    assert!(codes_found.contains(&codes::MISSING_VERSION));
    assert!(codes_found.contains(&codes::MISSING_LAST_MODIFIED));
}

#[test]
fn compliant_document_carries_no_advisories() {
    let run = engine()
        .validate(&json_bytes(&sample("ssp-moderate.json")), Encoding::Json, "moderate")
        .unwrap();
    assert!(run.advisories.is_empty(), "{:#?}", run.advisories);
}

#[test]
fn data_flow_advisory_depends_on_the_baseline() {
    let mut doc = sample("ssp-moderate.json");
    doc["system-security-plan"]["system-characteristics"]
        .as_object_mut()
        .unwrap()
        .remove("data-flow");
    let bytes = json_bytes(&doc);
    let engine = engine();

    let data_flow = |baseline: &str| -> Vec<String> {
        let run = engine.validate(&bytes, Encoding::Json, baseline).unwrap();
        run.advisories
            .into_iter()
            .filter(|a| a.code == codes::MISSING_DATA_FLOW)
            .map(|a| {
                assert_eq!(a.path.to_string(), "system-security-plan.system-characteristics.data-flow");
                a.message
            })
            .collect()
    };

    assert!(data_flow("low").is_empty());
    let moderate = data_flow("moderate");
    assert_eq!(moderate.len(), 1);
    assert!(moderate[0].contains("recommended"));
    let high = data_flow("high");
    assert_eq!(high.len(), 1);
    assert!(high[0].contains("required"));
}

#[test]
fn high_baseline_expects_more_artifacts_than_moderate() {
    let engine = engine();
    let bytes = json_bytes(&sample("ssp-moderate.json"));
    let missing = |baseline: &str| {
        engine
            .validate(&bytes, Encoding::Json, baseline)
            .unwrap()
            .advisories
            .iter()
            .filter(|a| a.code == codes::MISSING_ARTIFACT)
            .count()
    };
    assert_eq!(missing("moderate"), 0);
    assert_eq!(missing("low"), 0);
    assert_eq!(missing("high"), 3);
}
