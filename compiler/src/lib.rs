//! brine-fields-compiler
//!
//! This crate implements:
//!  1) A bracket-pair tokenizer for field definitions such as
//!     `[id:int][name_length:byte][name:name_length]`,
//!  2) A parser splitting each clause into `name:type[:count]`,
//!  3) A verifier (reserved names, duplicates, array counts and types),
//!  4) `compile_definition` tying the three together, and
//!  5) Error types (`CompileError`).

pub mod error;
pub mod types;
pub mod utils;
pub mod tokenizer;
pub mod parser;
pub mod verifier;
pub mod compiler;

pub use compiler::{compile_definition, fixed_size, render_definition};
pub use error::CompileError;
pub use types::{FieldDescriptor, FieldKind};
