use std::collections::HashMap;
use std::fmt;

use brine_fields_schema::{ErrorCode, FromValue, Value};
use serde::Serialize;

use crate::error::FieldError;

/// Outcome of [`crate::FieldCodec::read`].
///
/// On success `values` holds one entry per field in definition order and
/// `field_index` maps each name to its position. On failure both are empty
/// and `error_code`/`error` say why.
#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    pub success:     bool,
    pub values:      Vec<Value>,
    pub field_index: HashMap<String, usize>,
    pub error_code:  Option<ErrorCode>,
    pub error:       Option<String>,
}

impl ParseResult {
    pub(crate) fn ok(values: Vec<Value>, field_index: HashMap<String, usize>) -> ParseResult {
        ParseResult {
            success: true,
            values,
            field_index,
            error_code: None,
            error: None,
        }
    }

    pub(crate) fn failed(error: &FieldError) -> ParseResult {
        ParseResult {
            success:     false,
            values:      Vec::new(),
            field_index: HashMap::new(),
            error_code:  Some(error.code()),
            error:       Some(error.to_string()),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.field_index.get(name).and_then(|&i| self.values.get(i))
    }

    /// Typed access through the same conversions the write path uses.
    /// `None` if the field is absent or does not convert.
    pub fn get_as<T: FromValue>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(|v| T::from_value(v).ok())
    }

    /// `(name, value)` pairs in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        let mut names: Vec<(&str, usize)> = self
            .field_index
            .iter()
            .map(|(name, &i)| (name.as_str(), i))
            .collect();
        names.sort_by_key(|&(_, i)| i);
        names
            .into_iter()
            .filter_map(move |(name, i)| self.values.get(i).map(|v| (name, v)))
    }
}

/// One mismatch or read failure found by a verify pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// Byte offset at which the field begins.
    pub stream_offset:    u64,
    /// The field's clause, e.g. `[id:int]`.
    pub field_definition: String,
    pub field_type:       String,
    pub actual_value:     Option<Value>,
    pub expected_value:   Option<Value>,
    pub message:          String,
    pub code:             ErrorCode,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "offset {}: {} ({}): {}",
            self.stream_offset, self.field_definition, self.field_type, self.message
        )
    }
}

/// Outcome of [`crate::FieldCodec::verify`]: `success` is true exactly when
/// `errors` is empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifyReport {
    pub success: bool,
    pub errors:  Vec<ValidationError>,
}

impl VerifyReport {
    pub(crate) fn from_errors(errors: Vec<ValidationError>) -> VerifyReport {
        VerifyReport {
            success: errors.is_empty(),
            errors,
        }
    }
}

impl From<VerifyReport> for (bool, Vec<ValidationError>) {
    fn from(report: VerifyReport) -> Self {
        (report.success, report.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParseResult {
        let mut index = HashMap::new();
        index.insert("id".to_string(), 0);
        index.insert("name".to_string(), 1);
        ParseResult::ok(vec![Value::Int(42), Value::Bytes(b"Alice".to_vec())], index)
    }

    #[test]
    fn typed_access() {
        let result = sample();
        assert_eq!(result.get_as::<i32>("id"), Some(42));
        assert_eq!(result.get_as::<u8>("id"), Some(42));
        assert_eq!(result.get_as::<Vec<u8>>("name"), Some(b"Alice".to_vec()));
        assert_eq!(result.get_as::<i32>("name"), None);
        assert_eq!(result.get_as::<i32>("missing"), None);
    }

    #[test]
    fn iterates_in_definition_order() {
        let sample = sample();
        let names: Vec<&str> = sample.iter().map(|(n, _)| n).collect::<Vec<_>>();
        assert_eq!(names, ["id", "name"]);
    }

    #[test]
    fn failed_result_carries_the_code() {
        let result = ParseResult::failed(&FieldError::Cancelled);
        assert!(!result.success);
        assert!(result.values.is_empty());
        assert_eq!(result.error_code, Some(ErrorCode::OperationCancelled));
        assert_eq!(result.error.as_deref(), Some("Operation cancelled"));
    }

    #[test]
    fn report_converts_to_tuple() {
        let (ok, errors): (bool, Vec<ValidationError>) = VerifyReport::from_errors(vec![]).into();
        assert!(ok);
        assert!(errors.is_empty());
    }
}
