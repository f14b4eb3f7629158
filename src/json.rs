//! Thin facade over `serde_json` for embedded JSON columns

use crate::error::{MapError, Result};
use crate::shape::FieldType;
use crate::types::MappedValue;
use serde::Serialize;
use serde_json::{Map, Value};

/// A parsed JSON object taken from one cell
#[derive(Debug, Clone, PartialEq)]
pub struct JsonDocument {
    object: Map<String, Value>,
}

impl JsonDocument {
    /// Parse the blob stored in `column`
    pub fn parse(column: &str, text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(|source| MapError::Parse {
            column: column.to_string(),
            source,
        })?;

        match value {
            Value::Object(object) => Ok(JsonDocument { object }),
            _ => Err(MapError::NotAnObject {
                column: column.to_string(),
            }),
        }
    }

    /// Look up `key` and convert it to `field_type`.
    ///
    /// `None` means the key is absent; an explicit JSON null gives
    /// `Some(MappedValue::Null)`.
    pub fn extract(&self, key: &str, field_type: &FieldType, ignore_case: bool) -> Result<Option<MappedValue>> {
        match self.object.get(key) {
            Some(value) => convert(key, value, field_type, ignore_case).map(Some),
            None => Ok(None),
        }
    }
}

fn convert(key: &str, value: &Value, field_type: &FieldType, ignore_case: bool) -> Result<MappedValue> {
    let coercion_error = || MapError::Coercion {
        field: key.to_string(),
        value: value.to_string(),
        target: field_type.describe(),
    };

    if value.is_null() {
        return Ok(MappedValue::Null);
    }

    // Scalars convert across JSON types where the conversion is lossless;
    // objects and arrays only fit `Json`.
    let converted = match field_type {
        FieldType::Json => Some(MappedValue::Json(value.clone())),
        FieldType::Bool => match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) => parse_bool(s),
            _ => None,
        }
        .map(MappedValue::Bool),
        FieldType::Int => match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
        .map(MappedValue::Int),
        FieldType::Float => match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .map(MappedValue::Float),
        FieldType::Text => match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
        .map(MappedValue::Text),
        FieldType::Enum(table) => match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().and_then(integral))
                .and_then(|v| table.by_value(v)),
            Value::String(s) => table.parse_stored(s, ignore_case),
            _ => None,
        }
        .map(|m| MappedValue::Enum {
            name: m.name.clone(),
            value: m.value,
        }),
    };

    converted.ok_or_else(coercion_error)
}

fn parse_bool(s: &str) -> Option<bool> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// An `f64` with no fractional part that fits in `i64`
fn integral(x: f64) -> Option<i64> {
    if x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64 {
        Some(x as i64)
    } else {
        None
    }
}

/// Serialize any value to compact JSON text
pub fn serialize<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::EnumTable;
    use serde_json::json;

    #[test]
    fn test_absent_and_null_are_distinct() {
        let doc = JsonDocument::parse("Meta", r#"{"Level": null}"#).unwrap();

        assert_eq!(doc.extract("Level", &FieldType::Text, false).unwrap(), Some(MappedValue::Null));
        assert_eq!(doc.extract("Other", &FieldType::Text, false).unwrap(), None);
    }

    #[test]
    fn test_typed_extraction() {
        let doc = JsonDocument::parse("Meta", r#"{"n": 3, "x": 1.5, "ok": true, "tags": ["a"]}"#).unwrap();

        assert_eq!(doc.extract("n", &FieldType::Int, false).unwrap(), Some(MappedValue::Int(3)));
        assert_eq!(doc.extract("n", &FieldType::Float, false).unwrap(), Some(MappedValue::Float(3.0)));
        assert_eq!(doc.extract("x", &FieldType::Float, false).unwrap(), Some(MappedValue::Float(1.5)));
        assert_eq!(doc.extract("ok", &FieldType::Bool, false).unwrap(), Some(MappedValue::Bool(true)));
        assert_eq!(
            doc.extract("tags", &FieldType::Json, false).unwrap(),
            Some(MappedValue::Json(json!(["a"])))
        );
        assert!(matches!(
            doc.extract("x", &FieldType::Int, false),
            Err(MapError::Coercion { .. })
        ));
    }

    #[test]
    fn test_scalars_convert_across_json_types() {
        let doc = JsonDocument::parse(
            "Meta",
            r#"{"num": 5, "flt": 2.5, "whole": 3.0, "flag": true, "int_str": " 7 ", "flt_str": "1.25", "yes": "True", "no": "false"}"#,
        ).unwrap();

        assert_eq!(doc.extract("num", &FieldType::Text, false).unwrap(), Some(MappedValue::Text("5".to_string())));
        assert_eq!(doc.extract("flt", &FieldType::Text, false).unwrap(), Some(MappedValue::Text("2.5".to_string())));
        assert_eq!(doc.extract("flag", &FieldType::Text, false).unwrap(), Some(MappedValue::Text("true".to_string())));

        assert_eq!(doc.extract("int_str", &FieldType::Int, false).unwrap(), Some(MappedValue::Int(7)));
        assert_eq!(doc.extract("whole", &FieldType::Int, false).unwrap(), Some(MappedValue::Int(3)));

        assert_eq!(doc.extract("flt_str", &FieldType::Float, false).unwrap(), Some(MappedValue::Float(1.25)));
        assert_eq!(doc.extract("int_str", &FieldType::Float, false).unwrap(), Some(MappedValue::Float(7.0)));

        assert_eq!(doc.extract("yes", &FieldType::Bool, false).unwrap(), Some(MappedValue::Bool(true)));
        assert_eq!(doc.extract("no", &FieldType::Bool, false).unwrap(), Some(MappedValue::Bool(false)));
    }

    #[test]
    fn test_unconvertible_values_still_fail() {
        let doc = JsonDocument::parse(
            "Meta",
            r#"{"obj": {"a": 1}, "arr": [1], "word": "many", "flag": true, "num": 1}"#,
        ).unwrap();

        for (key, ty) in [
            ("obj", FieldType::Text),
            ("arr", FieldType::Text),
            ("word", FieldType::Int),
            ("word", FieldType::Float),
            ("word", FieldType::Bool),
            ("flag", FieldType::Int),
            ("num", FieldType::Bool),
        ] {
            assert!(
                matches!(doc.extract(key, &ty, false), Err(MapError::Coercion { .. })),
                "{} as {:?}",
                key,
                ty
            );
        }
    }

    #[test]
    fn test_enum_extraction() {
        let table = EnumTable::new("Level").member("Low", 0).member("High", 1);
        let ty = FieldType::Enum(table);
        let doc = JsonDocument::parse("Meta", r#"{"a": 1, "b": " Low ", "c": "high", "d": "7"}"#).unwrap();

        assert_eq!(
            doc.extract("a", &ty, false).unwrap(),
            Some(MappedValue::Enum { name: "High".to_string(), value: 1 })
        );
        assert_eq!(
            doc.extract("b", &ty, false).unwrap(),
            Some(MappedValue::Enum { name: "Low".to_string(), value: 0 })
        );
        assert!(doc.extract("c", &ty, false).is_err());
        assert!(doc.extract("c", &ty, true).unwrap().is_some());
        assert!(doc.extract("d", &ty, false).is_err());
    }

    #[test]
    fn test_malformed_and_non_object() {
        assert!(matches!(
            JsonDocument::parse("Meta", "{not json"),
            Err(MapError::Parse { .. })
        ));
        assert!(matches!(
            JsonDocument::parse("Meta", "[1, 2]"),
            Err(MapError::NotAnObject { .. })
        ));
    }

    #[test]
    fn test_serialize() {
        assert_eq!(serialize(&json!({"a": 1})).unwrap(), r#"{"a":1}"#);
    }
}
