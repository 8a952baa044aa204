use std::io;

use brine_fields_compiler::{utils::quote, CompileError};
use brine_fields_schema::{CodecError, CoerceError, ErrorCode};
use thiserror::Error;

/// Failure of a read, write or verify call.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("Expected {expected} values but got {actual}")]
    ValueCountMismatch { expected: usize, actual: usize },

    #[error("Field {} takes its length from {}, which is not an earlier field", quote(.field), quote(.reference))]
    MissingVariableReference { field: String, reference: String },

    #[error("Field {}: {source}", quote(.field))]
    Coerce {
        field:  String,
        #[source]
        source: CoerceError,
    },

    #[error("Field {}: expected {expected} but found {found}", quote(.field))]
    WrongVariableType {
        field:    String,
        expected: String,
        found:    &'static str,
    },

    #[error("Field {} is null", quote(.field))]
    NullValue { field: String },

    #[error("Field {}: {reason}", quote(.field))]
    InvalidDataLength { field: String, reason: String },

    #[error("Field {}: expected {expected} elements but got {actual}", quote(.field))]
    ArrayLengthMismatch {
        field:    String,
        expected: usize,
        actual:   usize,
    },

    #[error("Field {}: stream closed before {needed} bytes could be read", quote(.field))]
    StreamClosed { field: String, needed: usize },

    #[error("Field {}: read failed: {source}", quote(.field))]
    Read {
        field:  String,
        #[source]
        source: io::Error,
    },

    #[error("Field {}: invalid data: {source}", quote(.field))]
    Decode {
        field:  String,
        #[source]
        source: CodecError,
    },

    #[error("Field {}: cannot encode: {source}", quote(.field))]
    Encode {
        field:  String,
        #[source]
        source: CodecError,
    },

    #[error("Field {}: write failed: {source}", quote(.field))]
    Write {
        field:  String,
        #[source]
        source: io::Error,
    },

    #[error("Flush failed: {0}")]
    Flush(#[source] io::Error),

    #[error("Operation cancelled")]
    Cancelled,
}

impl FieldError {
    pub fn code(&self) -> ErrorCode {
        match self {
            FieldError::Compile(e) => e.code(),
            FieldError::ValueCountMismatch { .. } => ErrorCode::InvalidDataLength,
            FieldError::MissingVariableReference { .. } => ErrorCode::MissingVariableReference,
            FieldError::Coerce { source, .. } => source.code(),
            FieldError::WrongVariableType { .. } | FieldError::Encode { .. } => {
                ErrorCode::WrongVariableType
            }
            FieldError::NullValue { .. } => ErrorCode::NullValue,
            FieldError::InvalidDataLength { .. } => ErrorCode::InvalidDataLength,
            FieldError::ArrayLengthMismatch { .. } => ErrorCode::ArrayLengthMismatch,
            FieldError::StreamClosed { .. } => ErrorCode::StreamClosed,
            FieldError::Read { .. } | FieldError::Decode { .. } => ErrorCode::StreamReadError,
            FieldError::Write { .. } | FieldError::Flush(_) => ErrorCode::StreamWriteError,
            FieldError::Cancelled => ErrorCode::OperationCancelled,
        }
    }

    /// The field the error is about, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            FieldError::MissingVariableReference { field, .. }
            | FieldError::Coerce { field, .. }
            | FieldError::WrongVariableType { field, .. }
            | FieldError::NullValue { field }
            | FieldError::InvalidDataLength { field, .. }
            | FieldError::ArrayLengthMismatch { field, .. }
            | FieldError::StreamClosed { field, .. }
            | FieldError::Read { field, .. }
            | FieldError::Decode { field, .. }
            | FieldError::Encode { field, .. }
            | FieldError::Write { field, .. } => Some(field),
            _ => None,
        }
    }
}
