use std::collections::HashMap;

use brine_fields_compiler::{
    compile_definition, render_definition, utils::quote, CompileError, FieldDescriptor, FieldKind,
};
use brine_fields_schema::{ByteBuffer, ByteBufferMut, CodecError, PrimitiveType, Value};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::{
    config::CodecConfig,
    error::FieldError,
    result::ParseResult,
    store::ParsedValues,
    stream,
};

/// A compiled field definition, ready to read, write and verify messages.
///
/// The codec is immutable once built and can be shared between tasks by
/// reference. Each call makes one sequential pass over the stream it is given.
#[derive(Debug, Clone)]
pub struct FieldCodec {
    definition: String,
    fields:     Vec<FieldDescriptor>,
    positions:  HashMap<String, usize>,
    config:     CodecConfig,
}

impl FieldCodec {
    /// Compiles `definition` with the default [`CodecConfig`].
    pub fn new(definition: &str) -> Result<FieldCodec, CompileError> {
        FieldCodec::with_config(definition, CodecConfig::default())
    }

    pub fn with_config(definition: &str, config: CodecConfig) -> Result<FieldCodec, CompileError> {
        let fields = compile_definition(definition)?;
        Ok(FieldCodec::build(definition.to_string(), fields, config))
    }

    /// Builds a codec from already compiled descriptors. Names are assumed
    /// unique, as [`compile_definition`] guarantees.
    pub fn from_fields(fields: Vec<FieldDescriptor>, config: CodecConfig) -> FieldCodec {
        FieldCodec::build(render_definition(&fields), fields, config)
    }

    fn build(definition: String, fields: Vec<FieldDescriptor>, config: CodecConfig) -> FieldCodec {
        let positions = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        FieldCodec {
            definition,
            fields,
            positions,
            config,
        }
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Reads one message. The first failure aborts the pass and is reported
    /// through `ParseResult::error_code`; nothing partial is returned.
    pub async fn read<R>(&self, stream: &mut R, cancel: &CancellationToken) -> ParseResult
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        match self.read_fields(stream, cancel).await {
            Ok(store) => {
                let (values, index) = store.into_parts();
                ParseResult::ok(values, index)
            }
            Err(e) => {
                warn!(error = %e, code = %e.code(), "read failed");
                ParseResult::failed(&e)
            }
        }
    }

    async fn read_fields<R>(
        &self,
        stream: &mut R,
        cancel: &CancellationToken,
    ) -> Result<ParsedValues, FieldError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut store = ParsedValues::with_capacity(self.fields.len());
        let mut offset = 0u64;

        for field in &self.fields {
            let len = match field.fixed_width() {
                Some(width) => width,
                None => {
                    let reference = field.reference().unwrap_or_default();
                    let value = store.get(reference).ok_or_else(|| {
                        FieldError::MissingVariableReference {
                            field:     field.name.clone(),
                            reference: reference.to_string(),
                        }
                    })?;
                    resolve_length(field, reference, value, &self.config)?
                }
            };

            debug!(field = %field.name, offset, width = len, "reading field");
            let bytes = stream::read_exact(stream, len, &field.name, cancel).await?;
            let value = decode_field(field, &bytes).map_err(|source| FieldError::Decode {
                field: field.name.clone(),
                source,
            })?;
            store.push(&field.name, value);
            offset += len as u64;
        }

        trace!(bytes = offset, "read complete");
        Ok(store)
    }

    /// Writes one message, `values` in definition order.
    ///
    /// Every value is checked and encoded before the first byte is written.
    /// A failure after that point (I/O or cancellation) leaves the bytes
    /// already written in the stream.
    pub async fn write<W>(
        &self,
        values: &[Value],
        stream: &mut W,
        cancel: &CancellationToken,
    ) -> Result<(), FieldError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let result = self.write_fields(values, stream, cancel).await;
        if let Err(e) = &result {
            warn!(error = %e, code = %e.code(), "write failed");
        }
        result
    }

    async fn write_fields<W>(
        &self,
        values: &[Value],
        stream: &mut W,
        cancel: &CancellationToken,
    ) -> Result<(), FieldError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let bound = self.bind(values)?;
        self.check_buffer_lengths(&bound)?;

        let encoded = self
            .fields
            .iter()
            .zip(&bound)
            .map(|(field, value)| {
                encode_field(field, value).map_err(|source| FieldError::Encode {
                    field: field.name.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut offset = 0u64;
        for (field, bytes) in self.fields.iter().zip(&encoded) {
            debug!(field = %field.name, offset, width = bytes.len(), "writing field");
            stream::write_all(stream, bytes, &field.name, cancel).await?;
            offset += bytes.len() as u64;
        }

        if self.config.flush_after_write {
            stream::flush(stream, cancel).await?;
        }
        trace!(bytes = offset, "write complete");
        Ok(())
    }

    /// Position of the earlier field `field_index` takes its length from.
    pub(crate) fn reference_position(&self, field_index: usize) -> Option<usize> {
        let reference = self.fields.get(field_index)?.reference()?;
        self.positions
            .get(reference)
            .copied()
            .filter(|&j| j < field_index)
    }

    /// Checks caller values against the fields and normalizes them: scalars
    /// are coerced, arrays and buffers must already have the exact shape.
    /// Does not compare variable buffer lengths with their length fields.
    pub(crate) fn bind(&self, values: &[Value]) -> Result<Vec<Value>, FieldError> {
        if values.len() != self.fields.len() {
            return Err(FieldError::ValueCountMismatch {
                expected: self.fields.len(),
                actual:   values.len(),
            });
        }

        for (i, field) in self.fields.iter().enumerate() {
            if let Some(reference) = field.reference() {
                if self.reference_position(i).is_none() {
                    return Err(FieldError::MissingVariableReference {
                        field:     field.name.clone(),
                        reference: reference.to_string(),
                    });
                }
            }
        }

        self.fields
            .iter()
            .zip(values)
            .map(|(field, value)| bind_field(field, value))
            .collect()
    }

    /// Every variable buffer must be exactly as long as its length field says.
    fn check_buffer_lengths(&self, bound: &[Value]) -> Result<(), FieldError> {
        for (i, field) in self.fields.iter().enumerate() {
            let (Some(reference), Some(j)) = (field.reference(), self.reference_position(i)) else {
                continue;
            };
            let expected = resolve_length(field, reference, &bound[j], &self.config)?;
            let actual = bound[i].as_bytes().map_or(0, <[u8]>::len);
            if actual != expected {
                return Err(FieldError::InvalidDataLength {
                    field:  field.name.clone(),
                    reason: format!(
                        "buffer holds {} bytes but {} is {}",
                        actual,
                        quote(reference),
                        expected
                    ),
                });
            }
        }
        Ok(())
    }
}

fn wrong_shape(field: &FieldDescriptor, expected: String, value: &Value) -> FieldError {
    if value.is_null() {
        FieldError::NullValue {
            field: field.name.clone(),
        }
    } else {
        FieldError::WrongVariableType {
            field: field.name.clone(),
            expected,
            found: value.kind_name(),
        }
    }
}

fn bind_field(field: &FieldDescriptor, value: &Value) -> Result<Value, FieldError> {
    match field.kind {
        FieldKind::Scalar { ty } => ty.coerce(value).map_err(|source| FieldError::Coerce {
            field: field.name.clone(),
            source,
        }),
        FieldKind::Variable { .. } => match value {
            Value::Bytes(_) => Ok(value.clone()),
            other => Err(wrong_shape(field, "bytes".to_string(), other)),
        },
        FieldKind::Array {
            ty: PrimitiveType::Byte,
            count,
        } => match value {
            Value::Bytes(bytes) if bytes.len() == count => Ok(value.clone()),
            Value::Bytes(bytes) => Err(FieldError::ArrayLengthMismatch {
                field:    field.name.clone(),
                expected: count,
                actual:   bytes.len(),
            }),
            other => Err(wrong_shape(field, "bytes".to_string(), other)),
        },
        FieldKind::Array { ty, count } => {
            let Value::Array(items) = value else {
                return Err(wrong_shape(field, format!("{}[{}]", ty, count), value));
            };
            if items.len() != count {
                return Err(FieldError::ArrayLengthMismatch {
                    field:    field.name.clone(),
                    expected: count,
                    actual:   items.len(),
                });
            }
            if let Some(item) = items.iter().find(|v| v.primitive_type() != Some(ty)) {
                return Err(wrong_shape(field, ty.name().to_string(), item));
            }
            Ok(value.clone())
        }
    }
}

/// Turns the value of a length field into a buffer length for `field`.
pub(crate) fn resolve_length(
    field: &FieldDescriptor,
    reference: &str,
    value: &Value,
    config: &CodecConfig,
) -> Result<usize, FieldError> {
    let invalid = |reason: String| FieldError::InvalidDataLength {
        field: field.name.clone(),
        reason,
    };
    let len = value.as_length().ok_or_else(|| {
        invalid(format!(
            "length field {} holds {}, not a non-negative integer",
            quote(reference),
            value
        ))
    })?;
    if len > config.max_variable_length {
        return Err(invalid(format!(
            "length {} exceeds the maximum of {}",
            len, config.max_variable_length
        )));
    }
    usize::try_from(len).map_err(|_| invalid(format!("length {} does not fit in memory", len)))
}

/// Decodes the bytes of one field, which must be exactly its wire size.
pub(crate) fn decode_field(field: &FieldDescriptor, bytes: &[u8]) -> Result<Value, CodecError> {
    match field.kind {
        FieldKind::Scalar { ty } => ty.decode(bytes),
        FieldKind::Variable { .. }
        | FieldKind::Array {
            ty: PrimitiveType::Byte,
            ..
        } => Ok(Value::Bytes(bytes.to_vec())),
        FieldKind::Array { ty, count } => {
            let mut bb = ByteBuffer::new(bytes);
            (0..count)
                .map(|_| ty.decode_from(&mut bb))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
    }
}

/// Encodes one bound value.
pub(crate) fn encode_field(field: &FieldDescriptor, value: &Value) -> Result<Vec<u8>, CodecError> {
    match field.kind {
        FieldKind::Scalar { ty } => ty.encode(value),
        FieldKind::Variable { .. }
        | FieldKind::Array {
            ty: PrimitiveType::Byte,
            ..
        } => match value {
            Value::Bytes(bytes) => Ok(bytes.clone()),
            other => Err(CodecError::WrongVariant {
                expected: "bytes",
                found:    other.kind_name(),
            }),
        },
        FieldKind::Array { ty, count } => {
            let mut bb = ByteBufferMut::with_capacity(ty.width() * count);
            for item in value.as_array().unwrap_or_default() {
                ty.encode_into(item, &mut bb)?;
            }
            Ok(bb.data())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brine_fields_schema::ErrorCode;

    fn codec(definition: &str) -> FieldCodec {
        FieldCodec::new(definition).unwrap()
    }

    async fn encode(codec: &FieldCodec, values: &[Value]) -> Result<Vec<u8>, FieldError> {
        let mut out = Vec::new();
        codec
            .write(values, &mut out, &CancellationToken::new())
            .await
            .map(|()| out)
    }

    #[tokio::test]
    async fn writes_little_endian_scalars() {
        let codec = codec("[a:int][b:byte][c:short]");
        let bytes = encode(&codec, &[1000i32.into(), 50u8.into(), 300i16.into()])
            .await
            .unwrap();
        assert_eq!(bytes, [0xe8, 0x03, 0x00, 0x00, 0x32, 0x2c, 0x01]);
    }

    #[tokio::test]
    async fn scalars_are_coerced_on_write() {
        let codec = codec("[a:short][b:bool][c:double]");
        let bytes = encode(&codec, &["300".into(), 1i32.into(), 2i64.into()])
            .await
            .unwrap();
        assert_eq!(&bytes[..3], [0x2c, 0x01, 0x01]);
        assert_eq!(&bytes[3..], 2.0f64.to_le_bytes());
    }

    #[tokio::test]
    async fn count_mismatch_writes_nothing() {
        let codec = codec("[a:int][b:int]");
        let mut out = Vec::new();
        let err = codec
            .write(&[1i32.into()], &mut out, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidDataLength);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn forward_reference_fails_before_io() {
        let codec = codec("[data:len][len:byte]");
        let err = encode(&codec, &[b"ab".as_slice().into(), 2u8.into()])
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::MissingVariableReference);
    }

    #[tokio::test]
    async fn buffer_length_must_match_length_field() {
        let codec = codec("[len:byte][data:len]");
        let err = encode(&codec, &[3u8.into(), b"ab".as_slice().into()])
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidDataLength);

        let err = encode(&codec, &[(-1i32).into(), b"".as_slice().into()])
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::WrongVariableType);
    }

    #[tokio::test]
    async fn arrays_are_not_coerced() {
        let codec = codec("[xs:short:2]");
        let err = encode(&codec, &[Value::Array(vec![1i16.into()])])
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ArrayLengthMismatch);

        let err = encode(&codec, &[Value::Array(vec![1i16.into(), 2i32.into()])])
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::WrongVariableType);

        let err = encode(&codec, &[Value::Null]).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NullValue);

        let bytes = encode(&codec, &[Value::Array(vec![1i16.into(), (-2i16).into()])])
            .await
            .unwrap();
        assert_eq!(bytes, [0x01, 0x00, 0xfe, 0xff]);
    }

    #[tokio::test]
    async fn byte_arrays_take_buffers() {
        let codec = codec("[tag:byte:4]");
        let bytes = encode(&codec, &[b"abcd".as_slice().into()]).await.unwrap();
        assert_eq!(bytes, b"abcd");

        let err = encode(&codec, &[b"abc".as_slice().into()]).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ArrayLengthMismatch);
    }

    #[tokio::test]
    async fn reads_variable_length_fields() {
        let codec = codec("[id:int][name_length:byte][name:name_length]");
        let mut stream: &[u8] = &[42, 0, 0, 0, 5, b'A', b'l', b'i', b'c', b'e'];
        let result = codec.read(&mut stream, &CancellationToken::new()).await;
        assert!(result.success);
        assert_eq!(result.get("id"), Some(&Value::Int(42)));
        assert_eq!(result.get("name_length"), Some(&Value::Byte(5)));
        assert_eq!(result.get_as::<Vec<u8>>("name"), Some(b"Alice".to_vec()));
    }

    #[tokio::test]
    async fn reads_arrays_in_stream_order() {
        let codec = codec("[xs:ushort:3][raw:byte:2]");
        let mut stream: &[u8] = &[1, 0, 2, 0, 3, 0, 9, 8];
        let result = codec.read(&mut stream, &CancellationToken::new()).await;
        assert!(result.success);
        assert_eq!(
            result.get("xs"),
            Some(&Value::Array(vec![
                Value::UShort(1),
                Value::UShort(2),
                Value::UShort(3)
            ]))
        );
        assert_eq!(result.get("raw"), Some(&Value::Bytes(vec![9, 8])));
    }

    #[tokio::test]
    async fn short_stream_fails_the_whole_read() {
        let codec = codec("[a:int][b:int]");
        let mut stream: &[u8] = &[1, 0, 0, 0, 2, 0];
        let result = codec.read(&mut stream, &CancellationToken::new()).await;
        assert!(!result.success);
        assert!(result.values.is_empty());
        assert!(result.field_index.is_empty());
        assert_eq!(result.error_code, Some(ErrorCode::StreamClosed));
    }

    #[tokio::test]
    async fn huge_fixed_array_on_a_short_stream_is_closed() {
        let cancel = CancellationToken::new();
        for definition in ["[a:byte:18446744073709551615]", "[a:long:2000000000000]"] {
            let codec = codec(definition);
            let mut stream: &[u8] = &[1, 2, 3];
            let result = codec.read(&mut stream, &cancel).await;
            assert!(!result.success);
            assert_eq!(result.error_code, Some(ErrorCode::StreamClosed), "{}", definition);
            assert!(stream.is_empty());
        }
    }

    #[tokio::test]
    async fn oversized_length_is_rejected_before_reading() {
        let config = CodecConfig {
            max_variable_length: 4,
            ..CodecConfig::default()
        };
        let codec = FieldCodec::with_config("[len:int][data:len]", config).unwrap();
        let mut stream: &[u8] = &[5, 0, 0, 0, 1, 2, 3, 4, 5];
        let result = codec.read(&mut stream, &CancellationToken::new()).await;
        assert_eq!(result.error_code, Some(ErrorCode::InvalidDataLength));
        assert_eq!(stream.len(), 5);
    }

    #[tokio::test]
    async fn negative_length_is_invalid() {
        let codec = codec("[len:sbyte][data:len]");
        let mut stream: &[u8] = &[0xff, 1, 2];
        let result = codec.read(&mut stream, &CancellationToken::new()).await;
        assert_eq!(result.error_code, Some(ErrorCode::InvalidDataLength));
    }

    #[tokio::test]
    async fn invalid_char_is_a_read_error() {
        let codec = codec("[c:char]");
        let mut stream: &[u8] = &[0x00, 0xd8];
        let result = codec.read(&mut stream, &CancellationToken::new()).await;
        assert_eq!(result.error_code, Some(ErrorCode::StreamReadError));
    }

    #[test]
    fn from_fields_renders_the_definition() {
        let codec = FieldCodec::from_fields(
            vec![
                FieldDescriptor::scalar("len", PrimitiveType::UShort),
                FieldDescriptor::variable("data", "len"),
            ],
            CodecConfig::default(),
        );
        assert_eq!(codec.definition(), "[len:ushort][data:len]");
        assert_eq!(codec.reference_position(1), Some(0));
        assert_eq!(codec.reference_position(0), None);
    }
}
