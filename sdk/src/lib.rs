//! brine-fields
//!
//! Runtime for bracketed field definitions such as
//! `[id:int][name_length:byte][name:name_length]`.
//!
//! - [`FieldCodec`] compiles a definition once and then reads, writes or
//!   verifies messages on any tokio stream.
//! - Reads return a [`ParseResult`] with typed access to the decoded values.
//! - Verification keeps going past mismatches and reports each one with its
//!   byte offset in a [`VerifyReport`].
//! - [`TrackedStream`] counts bytes so a verify pass can report absolute
//!   offsets.
//!
//! ```no_run
//! use brine_fields::{CancellationToken, FieldCodec, Value};
//!
//! # async fn run() -> Result<(), brine_fields::FieldError> {
//! let codec = FieldCodec::new("[id:int][name_length:byte][name:name_length]")?;
//! let cancel = CancellationToken::new();
//!
//! let mut buf = Vec::new();
//! let values = [Value::Int(42), Value::Byte(5), Value::from(&b"Alice"[..])];
//! codec.write(&values, &mut buf, &cancel).await?;
//!
//! let result = codec.read(&mut buf.as_slice(), &cancel).await;
//! assert_eq!(result.get_as::<i32>("id"), Some(42));
//! # Ok(())
//! # }
//! ```

mod config;
mod engine;
mod error;
mod result;
mod store;
mod stream;
mod verify;

pub use config::{CodecConfig, DEFAULT_MAX_VARIABLE_LENGTH};
pub use engine::FieldCodec;
pub use error::FieldError;
pub use result::{ParseResult, ValidationError, VerifyReport};
pub use stream::TrackedStream;

pub use brine_fields_compiler::{CompileError, FieldDescriptor, FieldKind};
pub use brine_fields_schema::{ErrorCode, FromValue, PrimitiveType, Value};
pub use tokio_util::sync::CancellationToken;

pub mod compiler {
    pub use brine_fields_compiler::{compile_definition, fixed_size, render_definition};
}

pub mod schema {
    pub use brine_fields_schema::{is_reserved_name, CoerceError, CodecError, TypeInfo};
}
