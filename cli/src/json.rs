//! JSON interchange for the command line: expected/input values come in as
//! a JSON array in definition order, decoded messages go out as an object.

use anyhow::{anyhow, bail, Context, Result};
use brine_fields::{FieldDescriptor, FieldKind, ParseResult, PrimitiveType, Value};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value as Json;

/// Converts a JSON array into one [`Value`] per field.
///
/// Extra or missing elements are passed through so that the engine reports
/// the count mismatch itself.
pub fn values_from_json(fields: &[FieldDescriptor], json: &Json) -> Result<Vec<Value>> {
    let Json::Array(items) = json else {
        bail!("expected a JSON array of values, found {}", kind(json));
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| match fields.get(i) {
            Some(field) => {
                field_value(field, item).with_context(|| format!("field {}", field.name))
            }
            None => scalar(item),
        })
        .collect()
}

fn field_value(field: &FieldDescriptor, json: &Json) -> Result<Value> {
    match field.kind {
        FieldKind::Scalar { .. } => scalar(json),
        FieldKind::Variable { .. }
        | FieldKind::Array {
            ty: PrimitiveType::Byte,
            ..
        } => buffer(json),
        FieldKind::Array { ty, .. } => match json {
            Json::Null => Ok(Value::Null),
            Json::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let value = scalar(item)?;
                    ty.coerce(&value)
                        .with_context(|| format!("element {}", i))
                })
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            other => bail!("expected an array of {}, found {}", ty, kind(other)),
        },
    }
}

fn scalar(json: &Json) -> Result<Value> {
    match json {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Bool(*b)),
        Json::String(s) => Ok(Value::String(s.clone())),
        Json::Number(n) => n
            .as_i64()
            .map(Value::Long)
            .or_else(|| n.as_u64().map(Value::ULong))
            .or_else(|| n.as_f64().map(Value::Double))
            .ok_or_else(|| anyhow!("unsupported number {}", n)),
        other => bail!("expected a scalar, found {}", kind(other)),
    }
}

/// Byte buffers accept an array of byte values or a string, taken as UTF-8.
fn buffer(json: &Json) -> Result<Value> {
    match json {
        Json::Null => Ok(Value::Null),
        Json::String(s) => Ok(Value::Bytes(s.as_bytes().to_vec())),
        Json::Array(items) => items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|n| u8::try_from(n).ok())
                    .ok_or_else(|| anyhow!("{} is not a byte", item))
            })
            .collect::<Result<Vec<u8>>>()
            .map(Value::Bytes),
        other => bail!("expected bytes, found {}", kind(other)),
    }
}

fn kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

/// Serializes a successful read as `{ "name": value, ... }` in definition order.
pub struct Decoded<'a>(pub &'a ParseResult);

impl Serialize for Decoded<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.values.len()))?;
        for (name, value) in self.0.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brine_fields::compiler::compile_definition;
    use serde_json::json;

    #[test]
    fn converts_by_field_kind() {
        let fields =
            compile_definition("[id:int][n:byte][name:n][xs:short:2][tag:byte:2]").unwrap();
        let values = values_from_json(
            &fields,
            &json!([42, 5, "Alice", [1, -2], [7, 8]]),
        )
        .unwrap();
        assert_eq!(
            values,
            vec![
                Value::Long(42),
                Value::Long(5),
                Value::Bytes(b"Alice".to_vec()),
                Value::Array(vec![Value::Short(1), Value::Short(-2)]),
                Value::Bytes(vec![7, 8]),
            ]
        );
    }

    #[test]
    fn rejects_bad_shapes() {
        let fields = compile_definition("[tag:byte:2]").unwrap();
        assert!(values_from_json(&fields, &json!([[1, 256]])).is_err());
        assert!(values_from_json(&fields, &json!({ "tag": [1, 2] })).is_err());

        let fields = compile_definition("[xs:short:2]").unwrap();
        assert!(values_from_json(&fields, &json!([[1, 70000]])).is_err());
    }

    #[test]
    fn extra_values_pass_through() {
        let fields = compile_definition("[a:int]").unwrap();
        let values = values_from_json(&fields, &json!([1, 2.5])).unwrap();
        assert_eq!(values, vec![Value::Long(1), Value::Double(2.5)]);
    }
}
