use crate::registry::PrimitiveType;

use serde::ser::{Serialize, SerializeSeq, Serializer};
use std::fmt;

/// This type holds one field's worth of dynamic data.
///
/// The twelve scalar variants mirror the registry's primitive types one to
/// one. [Bytes](#variant.Bytes) carries raw buffers (byte arrays and
/// variable-length fields) and [Array](#variant.Array) carries every other
/// fixed array. [String](#variant.String) and [Null](#variant.Null) only
/// appear as caller input: the engine never decodes them, but the write path
/// accepts a string literal for any scalar and coerces it.
#[derive(Clone, Debug)]
pub enum Value {
    Byte(u8),
    SByte(i8),
    Short(i16),
    UShort(u16),
    Int(i32),
    UInt(u32),
    Long(i64),
    ULong(u64),
    Float(f32),
    Double(f64),
    Char(char),
    Bool(bool),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    String(String),
    Null,
}

impl Value {
    /// Short name of the variant, matching the registry names for scalars.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::String(_) => "string",
            Value::Null => "null",
            scalar => scalar
                .primitive_type()
                .map(PrimitiveType::name)
                .unwrap_or("unknown"),
        }
    }

    /// The registry type this value encodes as, if it is a scalar.
    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        Some(match self {
            Value::Byte(_) => PrimitiveType::Byte,
            Value::SByte(_) => PrimitiveType::SByte,
            Value::Short(_) => PrimitiveType::Short,
            Value::UShort(_) => PrimitiveType::UShort,
            Value::Int(_) => PrimitiveType::Int,
            Value::UInt(_) => PrimitiveType::UInt,
            Value::Long(_) => PrimitiveType::Long,
            Value::ULong(_) => PrimitiveType::ULong,
            Value::Float(_) => PrimitiveType::Float,
            Value::Double(_) => PrimitiveType::Double,
            Value::Char(_) => PrimitiveType::Char,
            Value::Bool(_) => PrimitiveType::Bool,
            _ => return None,
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// A convenience method to borrow the contents of a [Bytes](#variant.Bytes).
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(bytes) => Some(bytes.as_slice()),
            _ => None,
        }
    }

    /// A convenience method to borrow the elements of an [Array](#variant.Array).
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    /// Interprets an integer-typed value as a buffer length. Negative numbers
    /// and non-integer variants yield `None`.
    pub fn as_length(&self) -> Option<u64> {
        match *self {
            Value::Byte(v) => Some(v as u64),
            Value::UShort(v) => Some(v as u64),
            Value::UInt(v) => Some(v as u64),
            Value::ULong(v) => Some(v),
            Value::SByte(v) => u64::try_from(v).ok(),
            Value::Short(v) => u64::try_from(v).ok(),
            Value::Int(v) => u64::try_from(v).ok(),
            Value::Long(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    /// Structural equality, except that two NaNs of the same width are equal.
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::SByte(a), Value::SByte(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::UShort(a), Value::UShort(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::ULong(a), Value::ULong(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Double(a), Value::Double(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Byte(v) => write!(f, "{}", v),
            Value::SByte(v) => write!(f, "{}", v),
            Value::Short(v) => write!(f, "{}", v),
            Value::UShort(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::ULong(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "'{}'", v.escape_debug()),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Bytes(bytes) => {
                f.write_str("0x")?;
                for byte in bytes {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            Value::Array(values) => {
                f.write_str("[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                f.write_str("]")
            }
            Value::String(s) => write!(f, "{:?}", s),
            Value::Null => f.write_str("null"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Byte(v) => serializer.serialize_u8(*v),
            Value::SByte(v) => serializer.serialize_i8(*v),
            Value::Short(v) => serializer.serialize_i16(*v),
            Value::UShort(v) => serializer.serialize_u16(*v),
            Value::Int(v) => serializer.serialize_i32(*v),
            Value::UInt(v) => serializer.serialize_u32(*v),
            Value::Long(v) => serializer.serialize_i64(*v),
            Value::ULong(v) => serializer.serialize_u64(*v),
            Value::Float(v) => serializer.serialize_f32(*v),
            Value::Double(v) => serializer.serialize_f64(*v),
            Value::Char(v) => serializer.serialize_char(*v),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Bytes(bytes) => {
                let mut seq = serializer.serialize_seq(Some(bytes.len()))?;
                for byte in bytes {
                    seq.serialize_element(byte)?;
                }
                seq.end()
            }
            Value::Array(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
            Value::String(s) => serializer.serialize_str(s),
            Value::Null => serializer.serialize_unit(),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Value {
                    Value::$variant(value)
                }
            }
        )*
    };
}

value_from! {
    u8 => Byte,
    i8 => SByte,
    i16 => Short,
    u16 => UShort,
    i32 => Int,
    u32 => UInt,
    i64 => Long,
    u64 => ULong,
    f32 => Float,
    f64 => Double,
    char => Char,
    bool => Bool,
    Vec<u8> => Bytes,
    String => String,
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Value {
        Value::Bytes(value.to_vec())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Value {
        Value::String(value.to_owned())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Value {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_equals_nan() {
        assert_eq!(Value::Double(f64::NAN), Value::Double(f64::NAN));
        assert_eq!(Value::Float(f32::NAN), Value::Float(-f32::NAN));
        assert_ne!(Value::Float(f32::NAN), Value::Double(f64::NAN));
        assert_eq!(Value::Double(0.0), Value::Double(-0.0));
    }

    #[test]
    fn variants_of_different_width_are_distinct() {
        assert_ne!(Value::Int(5), Value::Long(5));
        assert_ne!(Value::Byte(5), Value::SByte(5));
    }

    #[test]
    fn as_length_rejects_negative_and_non_integers() {
        assert_eq!(Value::Byte(5).as_length(), Some(5));
        assert_eq!(Value::Long(1 << 40).as_length(), Some(1 << 40));
        assert_eq!(Value::Int(-1).as_length(), None);
        assert_eq!(Value::Double(5.0).as_length(), None);
        assert_eq!(Value::Bool(true).as_length(), None);
    }

    #[test]
    fn display() {
        assert_eq!(Value::Int(-3).to_string(), "-3");
        assert_eq!(Value::Bytes(b"Al".to_vec()).to_string(), "0x416c");
        assert_eq!(
            Value::Array(vec![Value::Short(1), Value::Short(2)]).to_string(),
            "[1, 2]"
        );
        assert_eq!(Value::Char('x').to_string(), "'x'");
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn from_conversions() {
        assert_eq!(Value::from(42i32), Value::Int(42));
        assert_eq!(Value::from("x"), Value::String("x".into()));
        assert_eq!(Value::from(&b"ab"[..]), Value::Bytes(vec![b'a', b'b']));
        assert_eq!(Value::from(None::<u8>), Value::Null);
    }
}
