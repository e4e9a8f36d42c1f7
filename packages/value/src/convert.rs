//! Conversions between Value and serde_json types.

use base64::Engine;

use crate::{Error, Map, Value};

/// Convert our Value to serde_json::Value.
///
/// Fails on NaN and infinite floats, which JSON cannot represent.
pub fn value_to_json(value: Value) -> Result<serde_json::Value, Error> {
    Ok(match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(b),
        Value::Integer(i) => serde_json::Value::Number(i.into()),
        Value::Float(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .ok_or(Error::NonFiniteFloat { value: f })?,
        Value::String(s) => serde_json::Value::String(s),
        // JSON doesn't have bytes, so we base64 encode
        Value::Binary(b) => serde_json::Value::String(encode_base64(&b.data)),
        Value::Array(arr) => serde_json::Value::Array(
            arr.into_iter()
                .map(value_to_json)
                .collect::<Result<_, _>>()?,
        ),
        Value::Map(map) => serde_json::Value::Object(map_to_json(map)?),
    })
}

/// Convert a record to a JSON object.
pub fn map_to_json(map: Map) -> Result<serde_json::Map<String, serde_json::Value>, Error> {
    map.into_iter()
        .map(|(k, v)| Ok((k, value_to_json(v)?)))
        .collect()
}

/// Render a leaf as the flat string used in query items and header values.
///
/// Nested arrays and records render as compact JSON. Returns `None` for
/// null, which means "no entry".
pub fn to_flat_string(value: &Value) -> Result<Option<String>, Error> {
    let text = match value {
        Value::Null => return Ok(None),
        Value::Bool(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::String(s) => s.clone(),
        Value::Binary(b) => encode_base64(&b.data),
        Value::Array(_) | Value::Map(_) => serde_json::to_string(&value_to_json(value.clone())?)
            .map_err(|e| Error::Custom {
                message: e.to_string(),
            })?,
    };
    Ok(Some(text))
}

fn encode_base64(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Binary;

    #[test]
    fn value_to_json_arrays() {
        let value = Value::Array(vec![
            Value::Integer(1),
            Value::Integer(2),
            Value::Integer(3),
        ]);

        let json = value_to_json(value).unwrap();
        assert_eq!(json, serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        assert!(matches!(
            value_to_json(Value::Float(f64::NAN)),
            Err(Error::NonFiniteFloat { .. })
        ));

        let mut map = Map::new();
        map.insert("ok", Value::Float(1.5));
        map.insert("ratio", Value::Float(f64::NEG_INFINITY));
        assert_eq!(
            map_to_json(map),
            Err(Error::NonFiniteFloat {
                value: f64::NEG_INFINITY
            })
        );
    }

    #[test]
    fn nested_non_finite_float_fails_flat_rendering() {
        let value = Value::from(vec![Value::from(1), Value::Float(f64::INFINITY)]);
        assert!(matches!(
            to_flat_string(&value),
            Err(Error::NonFiniteFloat { .. })
        ));
    }

    #[test]
    fn value_to_json_binary() {
        let value = Value::Binary(Binary::new(vec![1, 2, 3, 4]));
        let json = value_to_json(value).unwrap();

        // Should be base64 encoded
        if let serde_json::Value::String(s) = json {
            let decoded = base64::engine::general_purpose::STANDARD
                .decode(&s)
                .unwrap();
            assert_eq!(decoded, vec![1, 2, 3, 4]);
        } else {
            panic!("expected string");
        }
    }

    #[test]
    fn value_to_json_map() {
        let mut map = Map::new();
        map.insert("key", Value::String("value".to_string()));
        map.insert("num", Value::Integer(42));

        let json = value_to_json(Value::Map(map)).unwrap();
        assert_eq!(json, serde_json::json!({"key": "value", "num": 42}));
    }

    #[test]
    fn flat_strings_for_leaves() {
        assert_eq!(to_flat_string(&Value::Null).unwrap(), None);
        assert_eq!(
            to_flat_string(&Value::Bool(false)).unwrap().as_deref(),
            Some("false")
        );
        assert_eq!(
            to_flat_string(&Value::Integer(-12)).unwrap().as_deref(),
            Some("-12")
        );
        assert_eq!(
            to_flat_string(&Value::Float(2.5)).unwrap().as_deref(),
            Some("2.5")
        );
        assert_eq!(
            to_flat_string(&Value::from("dune")).unwrap().as_deref(),
            Some("dune")
        );
    }

    #[test]
    fn flat_strings_for_containers_are_json() {
        let value = Value::from(vec![Value::from(1), Value::from("x")]);
        assert_eq!(
            to_flat_string(&value).unwrap().as_deref(),
            Some(r#"[1,"x"]"#)
        );
    }
}
