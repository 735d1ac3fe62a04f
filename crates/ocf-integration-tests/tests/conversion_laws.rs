//! Round-trip law for the converter, exercised on real documents and on
//! generated trees.

use std::path::PathBuf;
use std::sync::OnceLock;

use ocf_compliance::{Engine, EngineConfig};
use ocf_convert::{convert, decode, ConversionError, Encoding};
use ocf_core::semantic_digest;
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn content_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../content")
}

#[test]
fn sample_documents_round_trip_through_every_pair() {
    for name in ["ssp-moderate.json", "ssp-moderate-incomplete.yaml"] {
        let path = content_dir().join("samples").join(name);
        let bytes = std::fs::read(&path).unwrap();
        let source = Encoding::from_path(&path).unwrap();
        let original = decode(&bytes, source).unwrap();

        for a in Encoding::ALL {
            let (in_a, _) = convert(&bytes, source, a).unwrap();
            for b in Encoding::ALL {
                let (in_b, record) = convert(&in_a, a, b).unwrap();
                let (back, _) = convert(&in_b, b, a).unwrap();
                assert!(record.equivalence_verified);
                assert_eq!(decode(&back, a).unwrap(), original, "{name}: {a} -> {b} -> {a}");
            }
        }
    }
}

#[test]
fn converted_document_validates_identically() {
    let engine = Engine::new(EngineConfig {
        content_dir: content_dir(),
        ..EngineConfig::default()
    })
    .unwrap();
    let bytes = std::fs::read(content_dir().join("samples/ssp-moderate-incomplete.yaml")).unwrap();
    let (xml, record) = convert(&bytes, Encoding::Yaml, Encoding::Xml).unwrap();

    let from_yaml = engine.validate(&bytes, Encoding::Yaml, "moderate").unwrap();
    let from_xml = engine.validate(&xml, Encoding::Xml, "moderate").unwrap();
    assert_eq!(from_yaml.errors, from_xml.errors);
    assert_eq!(from_yaml.document_digest, from_xml.document_digest);
    assert_eq!(from_xml.document_digest, Some(record.target_digest));
}

#[test]
fn xml_preserves_scalar_types_and_awkward_keys() {
    let doc = json!({
        "numbers": [0, -7, 2.5, 1e100],
        "flags": {"on": true, "off": false, "nothing": null},
        "strings": ["", "  padded  ", "42", "true", "null", "<&>\"'"],
        "keys": {"1st": 1, "has space": 2, "xml-reserved": 3, "": 4, "ünïcode": 5},
        "empty": {"object": {}, "array": []}
    });
    let bytes = serde_json::to_vec(&doc).unwrap();
    let (xml, _) = convert(&bytes, Encoding::Json, Encoding::Xml).unwrap();
    assert_eq!(decode(&xml, Encoding::Xml).unwrap(), doc);
}

#[test]
fn conversion_failure_returns_no_bytes() {
    let result = convert(b"a: [unclosed", Encoding::Yaml, Encoding::Json);
    assert!(matches!(result, Err(ConversionError::ParseFailure { .. })));
}

fn shared_engine() -> &'static Engine {
    static ENGINE: OnceLock<Engine> = OnceLock::new();
    ENGINE.get_or_init(|| {
        Engine::new(EngineConfig {
            content_dir: content_dir(),
            ..EngineConfig::default()
        })
        .unwrap()
    })
}

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[ a-zA-Z0-9<>&'.,-]{0,12}".prop_map(Value::String),
    ]
}

fn arb_tree() -> impl Strategy<Value = Value> {
    arb_scalar().prop_recursive(3, 32, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-zA-Z0-9 _.-]{0,8}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<String, Value>>())),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Arbitrary back-matter content survives JSON -> XML -> JSON and never
    /// changes what the document validates to.
    #[test]
    fn conversion_never_changes_the_verdict(extra in arb_tree()) {
        let path = content_dir().join("samples/ssp-moderate.json");
        let mut doc: Value = serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        doc["system-security-plan"]["back-matter"] = json!({ "extra": extra });
        let bytes = serde_json::to_vec(&doc).unwrap();

        let (xml, forward) = convert(&bytes, Encoding::Json, Encoding::Xml).unwrap();
        let (back, reverse) = convert(&xml, Encoding::Xml, Encoding::Json).unwrap();
        prop_assert_eq!(&forward.source_digest, &reverse.target_digest);
        prop_assert_eq!(decode(&back, Encoding::Json).unwrap(), doc.clone());
        prop_assert_eq!(semantic_digest(&doc).unwrap(), forward.target_digest.clone());

        let engine = shared_engine();
        let from_json = engine.validate(&bytes, Encoding::Json, "moderate").unwrap();
        let from_xml = engine.validate(&xml, Encoding::Xml, "moderate").unwrap();
        prop_assert!(from_json.pass);
        prop_assert_eq!(from_json.errors, from_xml.errors);
        prop_assert_eq!(from_json.document_digest, from_xml.document_digest);
    }
}
