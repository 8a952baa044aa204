use serde::{Deserialize, Serialize};

/// Default cap on a variable-length field: 16 MiB.
pub const DEFAULT_MAX_VARIABLE_LENGTH: u64 = 16 * 1024 * 1024;

/// Tunables for a [`crate::FieldCodec`]. Missing keys take their defaults
/// when deserialized, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecConfig {
    /// Largest length a variable-length field may resolve to. Longer lengths
    /// fail with `InvalidDataLength` before the field is read. Fixed-width
    /// arrays are not capped: their declared width is read as the bytes
    /// arrive, and a stream that ends early fails with `StreamClosed`.
    pub max_variable_length: u64,

    /// Flush the stream once at the end of a successful write.
    pub flush_after_write: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        CodecConfig {
            max_variable_length: DEFAULT_MAX_VARIABLE_LENGTH,
            flush_after_write:   true,
        }
    }
}

impl CodecConfig {
    pub fn from_json(text: &str) -> Result<CodecConfig, serde_json::Error> {
        serde_json::from_str(text)
    }
}
