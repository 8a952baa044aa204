//! The closed catalog of fixed-width primitive types.
//!
//! Every entry pairs a name and a byte width with an encode/decode function.
//! All multi-byte types are little-endian on the wire, and `char` is a single
//! UTF-16 code unit, so only Basic Multilingual Plane characters can be
//! represented.

use crate::{
    bb::{ByteBuffer, ByteBufferMut},
    error::CodecError,
    value::Value,
};

use serde::Serialize;
use std::fmt;

/// One of the twelve primitive types a field can be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Byte = 0,
    SByte = 1,
    Short = 2,
    UShort = 3,
    Int = 4,
    UInt = 5,
    Long = 6,
    ULong = 7,
    Float = 8,
    Double = 9,
    Char = 10,
    Bool = 11,
}

/// A registry row.
pub struct TypeInfo {
    pub name:   &'static str,
    pub width:  usize,
    pub encode: fn(&Value, &mut ByteBufferMut) -> Result<(), CodecError>,
    pub decode: fn(&mut ByteBuffer<'_>) -> Result<Value, CodecError>,
}

macro_rules! scalar_codec {
    ($encode:ident, $decode:ident, $variant:ident, $write:ident, $read:ident, $name:literal) => {
        fn $encode(value: &Value, bb: &mut ByteBufferMut) -> Result<(), CodecError> {
            match value {
                Value::$variant(v) => {
                    bb.$write(*v);
                    Ok(())
                }
                other => Err(CodecError::WrongVariant {
                    expected: $name,
                    found:    other.kind_name(),
                }),
            }
        }

        fn $decode(bb: &mut ByteBuffer<'_>) -> Result<Value, CodecError> {
            Ok(Value::$variant(bb.$read()?))
        }
    };
}

scalar_codec!(encode_byte, decode_byte, Byte, write_u8, read_u8, "byte");
scalar_codec!(encode_sbyte, decode_sbyte, SByte, write_i8, read_i8, "sbyte");
scalar_codec!(encode_short, decode_short, Short, write_i16, read_i16, "short");
scalar_codec!(encode_ushort, decode_ushort, UShort, write_u16, read_u16, "ushort");
scalar_codec!(encode_int, decode_int, Int, write_i32, read_i32, "int");
scalar_codec!(encode_uint, decode_uint, UInt, write_u32, read_u32, "uint");
scalar_codec!(encode_long, decode_long, Long, write_i64, read_i64, "long");
scalar_codec!(encode_ulong, decode_ulong, ULong, write_u64, read_u64, "ulong");
scalar_codec!(encode_float, decode_float, Float, write_f32, read_f32, "float");
scalar_codec!(encode_double, decode_double, Double, write_f64, read_f64, "double");
scalar_codec!(encode_bool, decode_bool, Bool, write_bool, read_bool, "bool");

fn encode_char(value: &Value, bb: &mut ByteBufferMut) -> Result<(), CodecError> {
    match value {
        Value::Char(c) => {
            if bb.write_char(*c) {
                Ok(())
            } else {
                // Outside the BMP: report the leading surrogate it would need.
                let mut units = [0u16; 2];
                Err(CodecError::InvalidCharacter(c.encode_utf16(&mut units)[0]))
            }
        }
        other => Err(CodecError::WrongVariant {
            expected: "char",
            found:    other.kind_name(),
        }),
    }
}

fn decode_char(bb: &mut ByteBuffer<'_>) -> Result<Value, CodecError> {
    Ok(Value::Char(bb.read_char()?))
}

/// Indexed by `PrimitiveType as usize`.
static REGISTRY: [TypeInfo; 12] = [
    TypeInfo { name: "byte",   width: 1, encode: encode_byte,   decode: decode_byte },
    TypeInfo { name: "sbyte",  width: 1, encode: encode_sbyte,  decode: decode_sbyte },
    TypeInfo { name: "short",  width: 2, encode: encode_short,  decode: decode_short },
    TypeInfo { name: "ushort", width: 2, encode: encode_ushort, decode: decode_ushort },
    TypeInfo { name: "int",    width: 4, encode: encode_int,    decode: decode_int },
    TypeInfo { name: "uint",   width: 4, encode: encode_uint,   decode: decode_uint },
    TypeInfo { name: "long",   width: 8, encode: encode_long,   decode: decode_long },
    TypeInfo { name: "ulong",  width: 8, encode: encode_ulong,  decode: decode_ulong },
    TypeInfo { name: "float",  width: 4, encode: encode_float,  decode: decode_float },
    TypeInfo { name: "double", width: 8, encode: encode_double, decode: decode_double },
    TypeInfo { name: "char",   width: 2, encode: encode_char,   decode: decode_char },
    TypeInfo { name: "bool",   width: 1, encode: encode_bool,   decode: decode_bool },
];

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 12] = [
        PrimitiveType::Byte,
        PrimitiveType::SByte,
        PrimitiveType::Short,
        PrimitiveType::UShort,
        PrimitiveType::Int,
        PrimitiveType::UInt,
        PrimitiveType::Long,
        PrimitiveType::ULong,
        PrimitiveType::Float,
        PrimitiveType::Double,
        PrimitiveType::Char,
        PrimitiveType::Bool,
    ];

    pub fn info(self) -> &'static TypeInfo {
        &REGISTRY[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Encoded size in bytes.
    pub fn width(self) -> usize {
        self.info().width
    }

    /// Looks up a type by its schema name. Names are case-sensitive.
    pub fn from_name(name: &str) -> Option<PrimitiveType> {
        PrimitiveType::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Appends exactly `width()` bytes. The value must already be of this
    /// type's variant; use [`PrimitiveType::coerce`] first for loose input.
    pub fn encode_into(self, value: &Value, bb: &mut ByteBufferMut) -> Result<(), CodecError> {
        (self.info().encode)(value, bb)
    }

    pub fn encode(self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let mut bb = ByteBufferMut::with_capacity(self.width());
        self.encode_into(value, &mut bb)?;
        Ok(bb.data())
    }

    /// Consumes exactly `width()` bytes from the buffer.
    pub fn decode_from(self, bb: &mut ByteBuffer<'_>) -> Result<Value, CodecError> {
        (self.info().decode)(bb)
    }

    /// Decodes the leading `width()` bytes of `bytes`.
    pub fn decode(self, bytes: &[u8]) -> Result<Value, CodecError> {
        self.decode_from(&mut ByteBuffer::new(bytes))
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The type names double as reserved words: no field may use one as its name.
pub fn is_reserved_name(name: &str) -> bool {
    PrimitiveType::from_name(name).is_some()
}
