//! Continue-on-error comparison of a stream against expected values.

use brine_fields_compiler::{utils::quote, FieldDescriptor};
use brine_fields_schema::{ErrorCode, Value};
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    engine::{decode_field, resolve_length, FieldCodec},
    error::FieldError,
    result::{ValidationError, VerifyReport},
    store::ParsedValues,
    stream,
};

impl FieldCodec {
    /// Reads one message and compares it field by field with `expected`,
    /// counting offsets from 0. See [`FieldCodec::verify_at`].
    pub async fn verify<R>(
        &self,
        expected: &[Value],
        stream: &mut R,
        cancel: &CancellationToken,
    ) -> VerifyReport
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        self.verify_at(expected, stream, 0, cancel).await
    }

    /// Reads one message and compares it field by field with `expected`.
    ///
    /// The expected values are checked first, without touching the stream;
    /// a problem there yields a single entry at `base_offset`. Otherwise
    /// every field is read and each mismatch or read failure is recorded
    /// with the offset of the field, and the pass carries on. Cancellation
    /// records one final entry and stops.
    ///
    /// A variable-length field whose length cannot be resolved, or whose
    /// expected buffer disagrees with the decoded length, is skipped without
    /// reading it. The reported offset still advances by the expected length
    /// but the stream does not, so later fields compare bytes from earlier in
    /// the stream than their reported offsets.
    pub async fn verify_at<R>(
        &self,
        expected: &[Value],
        stream: &mut R,
        base_offset: u64,
        cancel: &CancellationToken,
    ) -> VerifyReport
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let bound = match self.bind(expected) {
            Ok(bound) => bound,
            Err(e) => {
                let entry = self.preflight_entry(&e, expected, base_offset);
                warn!(offset = base_offset, error = %e, "expected values rejected");
                return VerifyReport::from_errors(vec![entry]);
            }
        };

        let mut pass = Pass {
            errors: Vec::new(),
            store:  ParsedValues::with_capacity(self.fields().len()),
            offset: base_offset,
        };

        for (field, expected) in self.fields().iter().zip(&bound) {
            if cancel.is_cancelled() {
                pass.cancelled(field);
                break;
            }

            // Bound values of fixed fields always have the declared width, and
            // variable fields are bound to `Bytes`.
            let expected_len = field
                .fixed_width()
                .or_else(|| expected.as_bytes().map(<[u8]>::len))
                .unwrap_or_default();

            if let Some(reference) = field.reference() {
                let Some(length_value) = pass.store.get(reference) else {
                    let message = format!("Length field {} was not decoded", quote(reference));
                    let code = ErrorCode::MissingVariableReference;
                    pass.record(field, None, Some(expected), message, code);
                    pass.offset += expected_len as u64;
                    continue;
                };
                match resolve_length(field, reference, length_value, self.config()) {
                    Ok(len) if len == expected_len => {}
                    Ok(len) => {
                        let message = format!(
                            "Expected a buffer of {} bytes but {} is {}",
                            expected_len,
                            quote(reference),
                            len
                        );
                        let code = ErrorCode::ArrayLengthMismatch;
                        pass.record(field, None, Some(expected), message, code);
                        pass.offset += expected_len as u64;
                        continue;
                    }
                    Err(e) => {
                        pass.record(field, None, Some(expected), e.to_string(), e.code());
                        pass.offset += expected_len as u64;
                        continue;
                    }
                }
            }

            debug!(
                field = %field.name,
                offset = pass.offset,
                width = expected_len,
                "verifying field"
            );
            let bytes = match stream::read_exact(stream, expected_len, &field.name, cancel).await {
                Ok(bytes) => bytes,
                Err(FieldError::Cancelled) => {
                    pass.cancelled(field);
                    break;
                }
                Err(e) => {
                    let message = format!("Read error: {}", e);
                    pass.record(field, None, Some(expected), message, e.code());
                    pass.offset += expected_len as u64;
                    continue;
                }
            };

            match decode_field(field, &bytes) {
                Ok(actual) => {
                    if actual != *expected {
                        let message = format!("Expected {} but found {}", expected, actual);
                        pass.record(
                            field,
                            Some(&actual),
                            Some(expected),
                            message,
                            ErrorCode::ValueMismatch,
                        );
                    }
                    pass.store.push(&field.name, actual);
                }
                Err(e) => {
                    let message = format!("Read error: {}", e);
                    pass.record(field, None, Some(expected), message, ErrorCode::StreamReadError);
                }
            }
            pass.offset += bytes.len() as u64;
        }

        VerifyReport::from_errors(pass.errors)
    }

    fn preflight_entry(&self, error: &FieldError, expected: &[Value], offset: u64) -> ValidationError {
        let position = error
            .field()
            .and_then(|name| self.fields().iter().position(|f| f.name == name));
        let (field_definition, field_type, expected_value) = match position {
            Some(i) => {
                let field = &self.fields()[i];
                (field.to_string(), field.type_name(), expected.get(i).cloned())
            }
            None => (self.definition().to_string(), String::new(), None),
        };
        ValidationError {
            stream_offset: offset,
            field_definition,
            field_type,
            actual_value: None,
            expected_value,
            message: error.to_string(),
            code: error.code(),
        }
    }
}

/// Running state of one verify pass.
struct Pass {
    errors: Vec<ValidationError>,
    store:  ParsedValues,
    offset: u64,
}

impl Pass {
    fn record(
        &mut self,
        field: &FieldDescriptor,
        actual: Option<&Value>,
        expected: Option<&Value>,
        message: String,
        code: ErrorCode,
    ) {
        warn!(field = %field.name, offset = self.offset, %code, "{}", message);
        self.errors.push(ValidationError {
            stream_offset: self.offset,
            field_definition: field.to_string(),
            field_type: field.type_name(),
            actual_value: actual.cloned(),
            expected_value: expected.cloned(),
            message,
            code,
        });
    }

    fn cancelled(&mut self, field: &FieldDescriptor) {
        let message = FieldError::Cancelled.to_string();
        self.record(field, None, None, message, ErrorCode::OperationCancelled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(definition: &str) -> FieldCodec {
        FieldCodec::new(definition).unwrap()
    }

    #[tokio::test]
    async fn reports_every_mismatch_with_its_offset() {
        let codec = codec("[a:int][b:byte][c:short]");
        let mut stream: &[u8] = &[0xe8, 0x03, 0, 0, 50, 0x2c, 0x01];
        let expected: [Value; 3] = [9999i32.into(), 99u8.into(), 999i16.into()];
        let report = codec.verify(&expected, &mut stream, &CancellationToken::new()).await;

        assert!(!report.success);
        let offsets: Vec<u64> = report.errors.iter().map(|e| e.stream_offset).collect();
        assert_eq!(offsets, [0, 4, 5]);
        assert_eq!(report.errors[0].actual_value, Some(Value::Int(1000)));
        assert_eq!(report.errors[0].expected_value, Some(Value::Int(9999)));
        assert_eq!(report.errors[2].field_definition, "[c:short]");
        assert!(report.errors.iter().all(|e| e.code == ErrorCode::ValueMismatch));
    }

    #[tokio::test]
    async fn matching_stream_passes() {
        let codec = codec("[a:int][b:float]");
        let mut stream: &[u8] = &[1, 0, 0, 0, 0, 0, 0xc0, 0x7f];
        let expected = [Value::String("1".into()), Value::Float(f32::NAN)];
        let report = codec.verify(&expected, &mut stream, &CancellationToken::new()).await;
        assert!(report.errors.is_empty());
        assert!(report.success);
    }

    #[tokio::test]
    async fn preflight_failure_is_a_single_entry() {
        let codec = codec("[a:int][b:int]");
        let mut stream: &[u8] = &[0; 8];
        let report = codec
            .verify_at(&[1i32.into()], &mut stream, 16, &CancellationToken::new())
            .await;
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].stream_offset, 16);
        assert_eq!(report.errors[0].code, ErrorCode::InvalidDataLength);
        assert_eq!(report.errors[0].field_definition, "[a:int][b:int]");
        assert_eq!(stream.len(), 8);

        let report = codec
            .verify(&[1i32.into(), Value::Null], &mut stream, &CancellationToken::new())
            .await;
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, ErrorCode::NullValue);
        assert_eq!(report.errors[0].field_definition, "[b:int]");
    }

    #[tokio::test]
    async fn read_failures_do_not_stop_the_pass() {
        let codec = codec("[a:int][b:int]");
        let mut stream: &[u8] = &[1, 0, 0];
        let expected: [Value; 2] = [1i32.into(), 2i32.into()];
        let report = codec.verify(&expected, &mut stream, &CancellationToken::new()).await;
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[0].message.contains("Read error"));
        assert_eq!(report.errors[0].code, ErrorCode::StreamClosed);
        assert_eq!(report.errors[1].stream_offset, 4);
    }

    #[tokio::test]
    async fn buffer_length_disagreement_skips_the_field() {
        let codec = codec("[len:byte][data:len][tail:byte]");
        let mut stream: &[u8] = &[3, b'a', b'b', b'c', 7];
        let expected: [Value; 3] = [3u8.into(), b"ab".as_slice().into(), 7u8.into()];
        let report = codec.verify(&expected, &mut stream, &CancellationToken::new()).await;

        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.errors[0].code, ErrorCode::ArrayLengthMismatch);
        assert_eq!(report.errors[0].stream_offset, 1);
        // The buffer was not consumed: `tail` is reported at offset 3 but
        // compares the byte at stream position 1.
        assert_eq!(report.errors[1].stream_offset, 3);
        assert_eq!(report.errors[1].actual_value, Some(Value::Byte(b'a')));
        assert_eq!(stream, [b'b', b'c', 7]);
    }

    #[tokio::test]
    async fn undecoded_length_field_is_reported() {
        let codec = codec("[len:int][data:len]");
        let mut stream: &[u8] = &[2, 0];
        let expected: [Value; 2] = [2i32.into(), b"hi".as_slice().into()];
        let report = codec.verify(&expected, &mut stream, &CancellationToken::new()).await;

        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.errors[1].code, ErrorCode::MissingVariableReference);
        assert_eq!(report.errors[1].stream_offset, 4);
    }

    #[tokio::test]
    async fn cancellation_ends_the_pass() {
        let codec = codec("[a:int][b:int]");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut stream: &[u8] = &[0; 8];
        let report = codec
            .verify(&[0i32.into(), 0i32.into()], &mut stream, &cancel)
            .await;
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, ErrorCode::OperationCancelled);
        assert_eq!(stream.len(), 8);
    }
}
