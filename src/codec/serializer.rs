//! Wire codec: typed values to/from the strings stored in record hashes.
//!
//! The serialized form doubles as the input to the content hasher, so it has
//! to be canonical: one value, one byte sequence. Numbers ride on
//! `serde_json::Number` (integers render without a fractional part, floats
//! shortest round-trip), and json values are encoded with key-sorted maps
//! (serde_json's default `Map`), so semantically equal values always
//! serialize identically.
//!
//! The store follows a uniform policy for missing data: empty or null values
//! on a non-required attribute mean "field absent". Nothing is ever written
//! as a literal sentinel, and clearing a value deletes the field.

use std::collections::BTreeMap;

use thiserror::Error;

use super::value::{Record, Value};
use crate::schema::{AttrType, TableSchema};

/// Codec errors.
#[derive(Debug, Error)]
pub enum CodecError {
    /// null/absent/empty input on a required attribute.
    #[error("invalid empty value, expected a {attr_type} type")]
    Required { attr_type: AttrType },

    /// A value (or stored token) that does not fit the declared type.
    #[error("invalid value \"{value}\" for type \"{attr_type}\"")]
    Type { attr_type: AttrType, value: String },

    /// A record key matching neither an attribute name nor a storage column.
    #[error("the key \"{0}\" found on a record is not present on the model definition")]
    UnknownAttribute(String),

    /// A value-level error, annotated with the attribute it occurred on.
    #[error("attribute \"{attr}\": {source}")]
    Attribute {
        attr: String,
        #[source]
        source: Box<CodecError>,
    },
}

impl CodecError {
    fn for_attribute(self, attr: &str) -> Self {
        match self {
            CodecError::Attribute { .. } => self,
            other => CodecError::Attribute {
                attr: attr.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The underlying error, unwrapping attribute annotation.
    pub fn root(&self) -> &CodecError {
        match self {
            CodecError::Attribute { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Serialize a single typed value into its stored string form.
///
/// Returns `Ok(None)` when the field must be omitted from storage: the value
/// is absent, or it is the empty form of its type (empty string, json null)
/// on a non-required attribute.
pub fn serialize_value(
    attr_type: AttrType,
    value: Option<&Value>,
    required: bool,
) -> Result<Option<String>, CodecError> {
    let value = match value {
        Some(v) if !v.is_empty() => v,
        _ => {
            if required {
                return Err(CodecError::Required { attr_type });
            }
            return Ok(None);
        }
    };

    if !attr_type.matches(value) {
        return Err(CodecError::Type {
            attr_type,
            value: value.to_string(),
        });
    }

    let raw = match value {
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Str(s) => s.clone(),
        // key-sorted by serde_json's default map, hence canonical
        Value::Json(v) => serde_json::to_string(v).expect("json values always encode"),
    };

    Ok(Some(raw))
}

/// Unserialize a stored string back into a typed value.
///
/// An absent or empty field yields `Ok(None)` on non-required attributes and
/// `E_REQUIRED` on required ones. Tokens are parsed strictly: booleans accept
/// only `true`/`false`, numbers only the JSON number grammar.
pub fn unserialize_value(
    attr_type: AttrType,
    raw: Option<&str>,
    required: bool,
) -> Result<Option<Value>, CodecError> {
    let raw = match raw {
        Some(r) if !r.is_empty() => r,
        _ => {
            if required {
                return Err(CodecError::Required { attr_type });
            }
            return Ok(None);
        }
    };

    let invalid = || CodecError::Type {
        attr_type,
        value: raw.to_string(),
    };

    let value = match attr_type {
        AttrType::Boolean => match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => return Err(invalid()),
        },
        AttrType::Number => {
            let n: serde_json::Number = serde_json::from_str(raw).map_err(|_| invalid())?;
            Value::Number(n)
        }
        AttrType::String => Value::Str(raw.to_string()),
        AttrType::Json => {
            let v: serde_json::Value = serde_json::from_str(raw).map_err(|_| invalid())?;
            if v.is_null() {
                // stored json null normalizes to an absent field
                if required {
                    return Err(CodecError::Required { attr_type });
                }
                return Ok(None);
            }
            Value::Json(v)
        }
    };

    Ok(Some(value))
}

/// Serialize a record sparsely, keyed by storage column.
///
/// `None` entries mark fields being cleared (absent or empty input on a
/// non-required attribute); [`serialize_record`] filters them out, the update
/// path uses them to know which fields to delete. Collection attributes are
/// skipped entirely; keys matching no attribute fail.
pub fn serialize_fields(
    schema: &TableSchema,
    record: &Record,
) -> Result<BTreeMap<String, Option<String>>, CodecError> {
    let mut fields = BTreeMap::new();

    for (key, value) in record {
        let attr = schema
            .resolve(key)
            .ok_or_else(|| CodecError::UnknownAttribute(key.clone()))?;

        if attr.is_collection() {
            continue;
        }

        let raw = serialize_value(attr.attr_type, Some(value), attr.required)
            .map_err(|e| e.for_attribute(&attr.name))?;
        fields.insert(attr.column().to_string(), raw);
    }

    Ok(fields)
}

/// Serialize a record into the column-to-string map written to storage.
/// Cleared/absent fields are omitted.
pub fn serialize_record(
    schema: &TableSchema,
    record: &Record,
) -> Result<BTreeMap<String, String>, CodecError> {
    let fields = serialize_fields(schema, record)?;
    Ok(fields
        .into_iter()
        .filter_map(|(column, raw)| raw.map(|raw| (column, raw)))
        .collect())
}

/// Unserialize stored fields (keyed by storage column) back into a typed
/// record keyed by attribute name. Empty stored values on non-required
/// attributes are dropped from the result.
pub fn unserialize_record(
    schema: &TableSchema,
    fields: &BTreeMap<String, String>,
) -> Result<Record, CodecError> {
    let mut record = Record::new();

    for (column, raw) in fields {
        let attr = schema
            .resolve(column)
            .ok_or_else(|| CodecError::UnknownAttribute(column.clone()))?;

        if attr.is_collection() {
            continue;
        }

        let value = unserialize_value(attr.attr_type, Some(raw), attr.required)
            .map_err(|e| e.for_attribute(&attr.name))?;

        if let Some(value) = value {
            record.insert(attr.name.clone(), value);
        }
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeDef, SchemaBuilder};
    use serde_json::json;

    fn user_schema() -> TableSchema {
        SchemaBuilder::new("users")
            .attribute(AttributeDef::new("id", AttrType::String).required())
            .attribute(AttributeDef::new("active", AttrType::Boolean))
            .attribute(AttributeDef::new("firstName", AttrType::String).indexed())
            .add_attribute("lastName", AttrType::String)
            .add_attribute("age", AttrType::Number)
            .add_attribute("data", AttrType::Json)
            .attribute(AttributeDef::new("pets", AttrType::Json).collection_of("pet"))
            .primary_key("id")
            .build()
            .unwrap()
    }

    fn ada() -> Record {
        Record::from([
            ("id".to_string(), Value::from("123i9213123")),
            ("active".to_string(), Value::from(true)),
            ("firstName".to_string(), Value::from("Ada")),
            ("lastName".to_string(), Value::from("Lovelace")),
            ("age".to_string(), Value::from(36)),
            (
                "data".to_string(),
                Value::Json(json!({"some": "Data", "a": "b"})),
            ),
        ])
    }

    #[test]
    fn test_serialize_record() {
        let fields = serialize_record(&user_schema(), &ada()).unwrap();

        assert_eq!(fields["id"], "123i9213123");
        assert_eq!(fields["active"], "true");
        assert_eq!(fields["firstName"], "Ada");
        assert_eq!(fields["lastName"], "Lovelace");
        assert_eq!(fields["age"], "36");
        // canonical: keys sorted regardless of construction order
        assert_eq!(fields["data"], r#"{"a":"b","some":"Data"}"#);
    }

    #[test]
    fn test_unserialize_record() {
        let schema = user_schema();
        let fields = serialize_record(&schema, &ada()).unwrap();
        let record = unserialize_record(&schema, &fields).unwrap();
        assert_eq!(record, ada());
    }

    #[test]
    fn test_round_trip_every_type() {
        let cases = [
            (AttrType::Boolean, Value::from(false)),
            (AttrType::Number, Value::from(36)),
            (AttrType::Number, Value::from(-7i64)),
            (AttrType::Number, Value::float(3.25).unwrap()),
            (AttrType::String, Value::from("Grace")),
            (AttrType::Json, Value::Json(json!([1, "two", {"three": 3}]))),
        ];

        for (attr_type, value) in cases {
            let raw = serialize_value(attr_type, Some(&value), true).unwrap().unwrap();
            let back = unserialize_value(attr_type, Some(&raw), true).unwrap().unwrap();
            assert_eq!(back, value, "round trip failed for {attr_type}");
        }

        // absent round-trips to absent on non-required attributes
        for attr_type in [AttrType::Boolean, AttrType::Number, AttrType::String, AttrType::Json] {
            let raw = serialize_value(attr_type, None, false).unwrap();
            assert_eq!(raw, None);
            assert_eq!(unserialize_value(attr_type, None, false).unwrap(), None);
        }
    }

    #[test]
    fn test_canonical_json_is_order_independent() {
        let a = Value::Json(json!({"x": 1, "y": {"b": 2, "a": 1}}));
        let b = Value::Json(json!({"y": {"a": 1, "b": 2}, "x": 1}));
        assert_eq!(
            serialize_value(AttrType::Json, Some(&a), false).unwrap(),
            serialize_value(AttrType::Json, Some(&b), false).unwrap(),
        );
    }

    #[test]
    fn test_required_rejects_empty_forms() {
        assert!(matches!(
            serialize_value(AttrType::String, None, true),
            Err(CodecError::Required { .. })
        ));
        assert!(matches!(
            serialize_value(AttrType::String, Some(&Value::from("")), true),
            Err(CodecError::Required { .. })
        ));
        assert!(matches!(
            serialize_value(AttrType::Json, Some(&Value::Json(json!(null))), true),
            Err(CodecError::Required { .. })
        ));
    }

    #[test]
    fn test_empty_forms_are_omitted() {
        assert_eq!(
            serialize_value(AttrType::String, Some(&Value::from("")), false).unwrap(),
            None
        );
        assert_eq!(
            serialize_value(AttrType::Json, Some(&Value::Json(json!(null))), false).unwrap(),
            None
        );
        // and on the way back in
        assert_eq!(unserialize_value(AttrType::String, Some(""), false).unwrap(), None);
        assert_eq!(unserialize_value(AttrType::Json, Some("null"), false).unwrap(), None);
    }

    #[test]
    fn test_type_mismatch() {
        assert!(matches!(
            serialize_value(AttrType::Boolean, Some(&Value::from("true")), false),
            Err(CodecError::Type { .. })
        ));
        assert!(matches!(
            serialize_value(AttrType::Number, Some(&Value::from("36")), false),
            Err(CodecError::Type { .. })
        ));
        assert!(matches!(
            serialize_value(AttrType::Json, Some(&Value::from(1)), false),
            Err(CodecError::Type { .. })
        ));
    }

    #[test]
    fn test_strict_token_parsing() {
        assert!(matches!(
            unserialize_value(AttrType::Boolean, Some("yes"), false),
            Err(CodecError::Type { .. })
        ));
        // the legacy "null" sentinel is not a boolean token
        assert!(matches!(
            unserialize_value(AttrType::Boolean, Some("null"), false),
            Err(CodecError::Type { .. })
        ));
        assert!(matches!(
            unserialize_value(AttrType::Number, Some("thirty"), false),
            Err(CodecError::Type { .. })
        ));
        assert!(matches!(
            unserialize_value(AttrType::Json, Some("{broken"), false),
            Err(CodecError::Type { .. })
        ));
    }

    #[test]
    fn test_unknown_attribute() {
        let mut record = ada();
        record.insert("nickname".to_string(), Value::from("ada"));

        let err = serialize_record(&user_schema(), &record).unwrap_err();
        assert!(matches!(err, CodecError::UnknownAttribute(ref k) if k == "nickname"));
    }

    #[test]
    fn test_collections_are_skipped() {
        let mut record = ada();
        record.insert("pets".to_string(), Value::Json(json!(["rex", "bella"])));

        let fields = serialize_record(&user_schema(), &record).unwrap();
        assert!(!fields.contains_key("pets"));
    }

    #[test]
    fn test_column_name_mapping() {
        let schema = SchemaBuilder::new("people")
            .attribute(
                AttributeDef::new("firstName", AttrType::String).with_column("first_name"),
            )
            .build()
            .unwrap();

        let record = Record::from([("firstName".to_string(), Value::from("Ada"))]);
        let fields = serialize_record(&schema, &record).unwrap();
        assert_eq!(fields.get("first_name").map(String::as_str), Some("Ada"));
        assert!(!fields.contains_key("firstName"));

        let back = unserialize_record(&schema, &fields).unwrap();
        assert_eq!(back.get("firstName"), Some(&Value::from("Ada")));
    }

    #[test]
    fn test_serialize_fields_keeps_clears() {
        let schema = user_schema();
        let changes = Record::from([
            ("lastName".to_string(), Value::from("")),
            ("age".to_string(), Value::from(22)),
        ]);

        let fields = serialize_fields(&schema, &changes).unwrap();
        assert_eq!(fields.get("lastName"), Some(&None));
        assert_eq!(fields.get("age"), Some(&Some("22".to_string())));
    }

    #[test]
    fn test_error_carries_attribute() {
        let schema = user_schema();
        let record = Record::from([
            ("id".to_string(), Value::from("x")),
            ("age".to_string(), Value::from("not-a-number")),
        ]);

        let err = serialize_record(&schema, &record).unwrap_err();
        match err {
            CodecError::Attribute { ref attr, .. } => {
                assert_eq!(attr, "age");
                assert!(matches!(err.root(), CodecError::Type { .. }));
            }
            other => panic!("expected attribute error, got {other:?}"),
        }
    }
}
