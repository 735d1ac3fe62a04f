//! YAML codec.
//!
//! Decoding goes through `serde_yaml::Value` and is then mapped onto the
//! JSON value model. Non-string scalar mapping keys are stringified. Tagged
//! nodes and non-finite floats have no JSON representation and fail the
//! decode.

use serde_json::{Number, Value};

use crate::encoding::Encoding;
use crate::error::ConversionError;

pub fn decode(bytes: &[u8]) -> Result<Value, ConversionError> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_slice(bytes).map_err(|e| ConversionError::parse(Encoding::Yaml, e))?;
    yaml_to_json_value(yaml)
}

pub fn encode(value: &Value) -> Result<Vec<u8>, ConversionError> {
    serde_yaml::to_string(value)
        .map(String::into_bytes)
        .map_err(|e| ConversionError::serialize(Encoding::Yaml, e))
}

fn yaml_to_json_value(yaml: serde_yaml::Value) -> Result<Value, ConversionError> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(b)),
        serde_yaml::Value::Number(n) => yaml_number(&n).map(Value::Number),
        serde_yaml::Value::String(s) => Ok(Value::String(s)),
        serde_yaml::Value::Sequence(seq) => {
            let items: Result<Vec<Value>, _> = seq.into_iter().map(yaml_to_json_value).collect();
            Ok(Value::Array(items?))
        }
        serde_yaml::Value::Mapping(map) => {
            let mut obj = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    serde_yaml::Value::Null => "null".to_string(),
                    other => {
                        return Err(ConversionError::parse(
                            Encoding::Yaml,
                            format!("unsupported mapping key {other:?}"),
                        ))
                    }
                };
                if obj.contains_key(&key) {
                    return Err(ConversionError::parse(
                        Encoding::Yaml,
                        format!("duplicate mapping key {key:?}"),
                    ));
                }
                obj.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(obj))
        }
        serde_yaml::Value::Tagged(tagged) => Err(ConversionError::parse(
            Encoding::Yaml,
            format!("tagged node {} has no JSON representation", tagged.tag),
        )),
    }
}

fn yaml_number(n: &serde_yaml::Number) -> Result<Number, ConversionError> {
    if let Some(i) = n.as_i64() {
        return Ok(Number::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Ok(Number::from(u));
    }
    n.as_f64()
        .and_then(Number::from_f64)
        .ok_or_else(|| ConversionError::parse(Encoding::Yaml, format!("number {n} has no JSON representation")))
}
