use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::sentence_pairs::{HYPOTHESIS_FIELD, LABEL_FIELD, PREMISE_FIELD};
use crate::errors::FieldError;

pub use crate::types::{FieldName, Label};

/// One parsed line of input: field name to value, in source order.
pub type Record = Map<String, Value>;

/// Look up a field that must be present.
pub fn require<'a>(record: &'a Record, field: &str) -> Result<&'a Value, FieldError> {
    record
        .get(field)
        .ok_or_else(|| FieldError::Missing(field.to_string()))
}

/// Look up a field that must be present and string-valued.
pub fn require_str<'a>(record: &'a Record, field: &str) -> Result<&'a str, FieldError> {
    require(record, field)?
        .as_str()
        .ok_or_else(|| FieldError::Type {
            field: field.to_string(),
            expected: "a string",
        })
}

/// Quota bucket discriminant extracted from a record.
///
/// Numbers compare by value: an integral float such as `5.0` is the same key
/// as the integer `5`, so scores written either way land in one bucket.
/// Booleans are numbers here too, `true` keying as `1` and `false` as `0`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClassKey {
    Null,
    Int(i64),
    /// Non-integral float, stored by bit pattern.
    Float(u64),
    Text(String),
}

impl ClassKey {
    /// Convert a JSON value into a key; containers cannot be keys.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(ClassKey::Null),
            Value::Bool(flag) => Some(ClassKey::from(*flag)),
            Value::String(text) => Some(ClassKey::Text(text.clone())),
            Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    Some(ClassKey::Int(int))
                } else {
                    number.as_f64().map(ClassKey::from)
                }
            }
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Extract the key stored under `field`.
    pub fn from_record(record: &Record, field: &str) -> Result<Self, FieldError> {
        Self::from_value(require(record, field)?).ok_or_else(|| FieldError::Type {
            field: field.to_string(),
            expected: "a scalar class value",
        })
    }
}

impl From<i64> for ClassKey {
    fn from(value: i64) -> Self {
        ClassKey::Int(value)
    }
}

impl From<i32> for ClassKey {
    fn from(value: i32) -> Self {
        ClassKey::Int(i64::from(value))
    }
}

impl From<f64> for ClassKey {
    fn from(value: f64) -> Self {
        const BOUND: f64 = 9_223_372_036_854_775_808.0; // 2^63
        if value.fract() == 0.0 && (-BOUND..BOUND).contains(&value) {
            ClassKey::Int(value as i64)
        } else {
            ClassKey::Float(value.to_bits())
        }
    }
}

impl From<bool> for ClassKey {
    fn from(value: bool) -> Self {
        ClassKey::Int(i64::from(value))
    }
}

impl From<&str> for ClassKey {
    fn from(value: &str) -> Self {
        ClassKey::Text(value.to_string())
    }
}

impl From<String> for ClassKey {
    fn from(value: String) -> Self {
        ClassKey::Text(value)
    }
}

impl fmt::Display for ClassKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassKey::Null => f.write_str("null"),
            ClassKey::Int(int) => write!(f, "{int}"),
            ClassKey::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
            ClassKey::Text(text) => write!(f, "{text:?}"),
        }
    }
}

/// Typed premise/hypothesis pair with its gold label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentencePair {
    /// Premise text.
    pub sentence1: String,
    /// Hypothesis text.
    pub sentence2: String,
    /// Gold label (`entailment`, `neutral`, `contradiction`, or `-`).
    pub gold_label: Label,
}

impl SentencePair {
    /// Build a pair from a record holding the three canonical fields.
    pub fn from_record(record: &Record) -> Result<Self, FieldError> {
        Ok(Self {
            sentence1: require_str(record, PREMISE_FIELD)?.to_string(),
            sentence2: require_str(record, HYPOTHESIS_FIELD)?.to_string(),
            gold_label: require_str(record, LABEL_FIELD)?.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn integral_floats_share_a_key_with_integers() {
        assert_eq!(ClassKey::from_value(&json!(5.0)), Some(ClassKey::Int(5)));
        assert_eq!(ClassKey::from(5), ClassKey::from(5.0));
        assert_ne!(ClassKey::from(4.5), ClassKey::from(4));
        assert_eq!(ClassKey::from(-0.0), ClassKey::Int(0));
    }

    #[test]
    fn booleans_share_keys_with_zero_and_one() {
        assert_eq!(ClassKey::from_value(&json!(true)), Some(ClassKey::Int(1)));
        assert_eq!(ClassKey::from_value(&json!(false)), Some(ClassKey::from(0)));
        assert_eq!(ClassKey::from(true), ClassKey::from(1.0));
    }

    #[test]
    fn containers_are_not_class_keys() {
        assert_eq!(ClassKey::from_value(&json!([1, 2])), None);
        let rec = record(json!({"overall": {"score": 5}}));
        assert_eq!(
            ClassKey::from_record(&rec, "overall"),
            Err(FieldError::Type {
                field: "overall".into(),
                expected: "a scalar class value",
            })
        );
    }

    #[test]
    fn class_key_from_record_reports_missing_field() {
        let rec = record(json!({"reviewText": "fine"}));
        assert_eq!(
            ClassKey::from_record(&rec, "overall"),
            Err(FieldError::Missing("overall".into()))
        );
    }

    #[test]
    fn require_str_distinguishes_missing_and_mistyped() {
        let rec = record(json!({"a": "x", "b": 3}));
        assert_eq!(require_str(&rec, "a"), Ok("x"));
        assert!(matches!(require_str(&rec, "b"), Err(FieldError::Type { .. })));
        assert_eq!(require_str(&rec, "c"), Err(FieldError::Missing("c".into())));
    }

    #[test]
    fn sentence_pair_from_record_reads_canonical_fields() {
        let rec = record(json!({
            "gold_label": "neutral",
            "sentence1": "A dog runs.",
            "sentence2": "An animal moves.",
            "pairID": "123"
        }));
        let pair = SentencePair::from_record(&rec).unwrap();
        assert_eq!(pair.gold_label, "neutral");
        assert_eq!(pair.sentence1, "A dog runs.");
        assert_eq!(pair.sentence2, "An animal moves.");
    }

    #[test]
    fn class_key_display_is_readable() {
        assert_eq!(ClassKey::from(5).to_string(), "5");
        assert_eq!(ClassKey::from(2.5).to_string(), "2.5");
        assert_eq!(ClassKey::from("pos").to_string(), "\"pos\"");
    }
}
