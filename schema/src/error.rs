use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Every failure the compiler and the engine can report, as a closed set.
///
/// Compile-time errors come first, then data-binding errors, then I/O and
/// operational errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCode {
    EmptyDefinition,
    MismatchedBrackets,
    EmptyFieldName,
    EmptyTypeOrLength,
    NoValidFieldPatterns,
    ReservedFieldName,
    DuplicateFieldName,
    InvalidFieldFormat,
    UnsupportedType,

    MissingVariableReference,
    WrongVariableType,
    NullValue,
    InvalidDataLength,
    ArrayLengthMismatch,
    ValueMismatch,

    StreamReadError,
    StreamWriteError,
    StreamClosed,
    OperationCancelled,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Failure of a registry encode/decode.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("Unexpected end of buffer: needed {needed} bytes, {available} available")]
    UnexpectedEnd { needed: usize, available: usize },

    #[error("Expected a {expected} value but found {found}")]
    WrongVariant {
        expected: &'static str,
        found:    &'static str,
    },

    #[error("Code unit {0:#06x} is not a valid char")]
    InvalidCharacter(u16),
}

/// Failure of a lenient value conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoerceError {
    #[error("Value is null")]
    Null,

    #[error("Cannot convert {from} to {to}")]
    Incompatible {
        from: &'static str,
        to:   &'static str,
    },

    #[error("Value {value} is out of range for {to}")]
    OutOfRange { value: String, to: &'static str },

    #[error("Cannot parse {text:?} as {to}")]
    Unparsable { text: String, to: &'static str },
}

impl CoerceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CoerceError::Null => ErrorCode::NullValue,
            _ => ErrorCode::WrongVariableType,
        }
    }
}
