use brine_fields_schema::ErrorCode;
use thiserror::Error;

use crate::utils::quote;

/// Everything that can go wrong while compiling a field definition.
/// Columns are 1-based character positions of the offending clause's `[`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("Field definition is empty")]
    EmptyDefinition,

    #[error("Mismatched brackets at column {column}: {msg}")]
    MismatchedBrackets { msg: String, column: usize },

    #[error("Empty field name in {clause} at column {column}")]
    EmptyFieldName { clause: String, column: usize },

    #[error("Empty type or length in {clause} at column {column}")]
    EmptyTypeOrLength { clause: String, column: usize },

    #[error("No valid field patterns found in definition")]
    NoValidFieldPatterns,

    #[error("The field name {} is reserved (column {column})", quote(.name))]
    ReservedFieldName { name: String, column: usize },

    #[error(
        "The field {} is defined twice (column {column}, first defined at column {first_column})",
        quote(.name)
    )]
    DuplicateFieldName {
        name:         String,
        column:       usize,
        first_column: usize,
    },

    #[error("Invalid field format {clause} at column {column}: {reason}")]
    InvalidFieldFormat {
        clause: String,
        column: usize,
        reason: String,
    },

    #[error("Unsupported array element type {} in {clause} at column {column}", quote(.type_name))]
    UnsupportedType {
        type_name: String,
        clause:    String,
        column:    usize,
    },
}

impl CompileError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CompileError::EmptyDefinition => ErrorCode::EmptyDefinition,
            CompileError::MismatchedBrackets { .. } => ErrorCode::MismatchedBrackets,
            CompileError::EmptyFieldName { .. } => ErrorCode::EmptyFieldName,
            CompileError::EmptyTypeOrLength { .. } => ErrorCode::EmptyTypeOrLength,
            CompileError::NoValidFieldPatterns => ErrorCode::NoValidFieldPatterns,
            CompileError::ReservedFieldName { .. } => ErrorCode::ReservedFieldName,
            CompileError::DuplicateFieldName { .. } => ErrorCode::DuplicateFieldName,
            CompileError::InvalidFieldFormat { .. } => ErrorCode::InvalidFieldFormat,
            CompileError::UnsupportedType { .. } => ErrorCode::UnsupportedType,
        }
    }
}
