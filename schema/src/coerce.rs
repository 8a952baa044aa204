//! Lenient conversion of caller-supplied values into a field's declared type.
//!
//! Integers accept any numeric input that fits (floats are rounded to the
//! nearest even integer), booleans and numeric strings. Floats accept any
//! numeric or numeric string. Booleans accept `"true"`/`"false"` and treat
//! numbers as zero/non-zero. Chars accept a one-character string or an
//! integer code unit.

use crate::{error::CoerceError, registry::PrimitiveType, value::Value};

/// Conversion from a dynamic [`Value`] into a concrete Rust type.
pub trait FromValue: Sized {
    /// Name of the target, used in error messages.
    const TARGET: &'static str;

    fn from_value(value: &Value) -> Result<Self, CoerceError>;
}

fn incompatible(value: &Value, to: &'static str) -> CoerceError {
    CoerceError::Incompatible {
        from: value.kind_name(),
        to,
    }
}

fn float_to_integral(value: f64, to: &'static str) -> Result<i128, CoerceError> {
    if !value.is_finite() {
        return Err(CoerceError::OutOfRange {
            value: value.to_string(),
            to,
        });
    }
    // i128 covers every integer target, anything beyond saturates and is
    // rejected by the range check afterwards.
    Ok(value.round_ties_even() as i128)
}

fn integral(value: &Value, to: &'static str) -> Result<i128, CoerceError> {
    match *value {
        Value::Byte(v) => Ok(v as i128),
        Value::SByte(v) => Ok(v as i128),
        Value::Short(v) => Ok(v as i128),
        Value::UShort(v) => Ok(v as i128),
        Value::Int(v) => Ok(v as i128),
        Value::UInt(v) => Ok(v as i128),
        Value::Long(v) => Ok(v as i128),
        Value::ULong(v) => Ok(v as i128),
        Value::Float(v) => float_to_integral(v as f64, to),
        Value::Double(v) => float_to_integral(v, to),
        Value::Char(c) => Ok(c as u32 as i128),
        Value::Bool(b) => Ok(b as i128),
        Value::String(ref s) => {
            let text = s.trim();
            match text.parse::<i128>() {
                Ok(n) => Ok(n),
                Err(_) => match text.parse::<f64>() {
                    Ok(f) => float_to_integral(f, to),
                    Err(_) => Err(CoerceError::Unparsable {
                        text: s.clone(),
                        to,
                    }),
                },
            }
        }
        Value::Null => Err(CoerceError::Null),
        Value::Bytes(_) | Value::Array(_) => Err(incompatible(value, to)),
    }
}

fn floating(value: &Value, to: &'static str) -> Result<f64, CoerceError> {
    match *value {
        Value::Byte(v) => Ok(v as f64),
        Value::SByte(v) => Ok(v as f64),
        Value::Short(v) => Ok(v as f64),
        Value::UShort(v) => Ok(v as f64),
        Value::Int(v) => Ok(v as f64),
        Value::UInt(v) => Ok(v as f64),
        Value::Long(v) => Ok(v as f64),
        Value::ULong(v) => Ok(v as f64),
        Value::Float(v) => Ok(v as f64),
        Value::Double(v) => Ok(v),
        Value::Bool(b) => Ok(if b { 1.0 } else { 0.0 }),
        Value::String(ref s) => s.trim().parse::<f64>().map_err(|_| CoerceError::Unparsable {
            text: s.clone(),
            to,
        }),
        Value::Null => Err(CoerceError::Null),
        Value::Char(_) | Value::Bytes(_) | Value::Array(_) => Err(incompatible(value, to)),
    }
}

macro_rules! integer_from_value {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl FromValue for $ty {
                const TARGET: &'static str = $name;

                fn from_value(value: &Value) -> Result<Self, CoerceError> {
                    let n = integral(value, Self::TARGET)?;
                    <$ty>::try_from(n).map_err(|_| CoerceError::OutOfRange {
                        value: n.to_string(),
                        to:    Self::TARGET,
                    })
                }
            }
        )*
    };
}

integer_from_value! {
    u8 => "byte",
    i8 => "sbyte",
    i16 => "short",
    u16 => "ushort",
    i32 => "int",
    u32 => "uint",
    i64 => "long",
    u64 => "ulong",
}

impl FromValue for f64 {
    const TARGET: &'static str = "double";

    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        floating(value, Self::TARGET)
    }
}

impl FromValue for f32 {
    const TARGET: &'static str = "float";

    /// Narrowing from `double` keeps the nearest representable value and
    /// saturates to infinity.
    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        match *value {
            Value::Float(v) => Ok(v),
            _ => floating(value, Self::TARGET).map(|v| v as f32),
        }
    }
}

impl FromValue for bool {
    const TARGET: &'static str = "bool";

    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        match *value {
            Value::Bool(b) => Ok(b),
            Value::Float(v) => Ok(v != 0.0),
            Value::Double(v) => Ok(v != 0.0),
            Value::String(ref s) => {
                let text = s.trim();
                if text.eq_ignore_ascii_case("true") {
                    Ok(true)
                } else if text.eq_ignore_ascii_case("false") {
                    Ok(false)
                } else if let Ok(n) = text.parse::<i128>() {
                    Ok(n != 0)
                } else if let Ok(f) = text.parse::<f64>() {
                    Ok(f != 0.0)
                } else {
                    Err(CoerceError::Unparsable {
                        text: s.clone(),
                        to:   Self::TARGET,
                    })
                }
            }
            Value::Char(_) => Err(incompatible(value, Self::TARGET)),
            _ => integral(value, Self::TARGET).map(|n| n != 0),
        }
    }
}

impl FromValue for char {
    const TARGET: &'static str = "char";

    /// Only Basic Multilingual Plane characters fit the two-byte wire form.
    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        let c = match *value {
            Value::Char(c) => c,
            Value::String(ref s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => c,
                    _ => {
                        return Err(CoerceError::Unparsable {
                            text: s.clone(),
                            to:   Self::TARGET,
                        })
                    }
                }
            }
            Value::Byte(_)
            | Value::SByte(_)
            | Value::Short(_)
            | Value::UShort(_)
            | Value::Int(_)
            | Value::UInt(_)
            | Value::Long(_)
            | Value::ULong(_) => {
                let n = integral(value, Self::TARGET)?;
                u16::try_from(n)
                    .ok()
                    .and_then(|unit| char::from_u32(unit as u32))
                    .ok_or_else(|| CoerceError::OutOfRange {
                        value: n.to_string(),
                        to:    Self::TARGET,
                    })?
            }
            Value::Null => return Err(CoerceError::Null),
            _ => return Err(incompatible(value, Self::TARGET)),
        };
        if c.len_utf16() != 1 {
            return Err(CoerceError::OutOfRange {
                value: c.escape_unicode().to_string(),
                to:    Self::TARGET,
            });
        }
        Ok(c)
    }
}

impl PrimitiveType {
    /// Converts `value` into this type's [`Value`] variant.
    pub fn coerce(self, value: &Value) -> Result<Value, CoerceError> {
        Ok(match self {
            PrimitiveType::Byte => Value::Byte(u8::from_value(value)?),
            PrimitiveType::SByte => Value::SByte(i8::from_value(value)?),
            PrimitiveType::Short => Value::Short(i16::from_value(value)?),
            PrimitiveType::UShort => Value::UShort(u16::from_value(value)?),
            PrimitiveType::Int => Value::Int(i32::from_value(value)?),
            PrimitiveType::UInt => Value::UInt(u32::from_value(value)?),
            PrimitiveType::Long => Value::Long(i64::from_value(value)?),
            PrimitiveType::ULong => Value::ULong(u64::from_value(value)?),
            PrimitiveType::Float => Value::Float(f32::from_value(value)?),
            PrimitiveType::Double => Value::Double(f64::from_value(value)?),
            PrimitiveType::Char => Value::Char(char::from_value(value)?),
            PrimitiveType::Bool => Value::Bool(bool::from_value(value)?),
        })
    }
}

impl FromValue for Vec<u8> {
    const TARGET: &'static str = "bytes";

    /// Buffers are never coerced: only [`Value::Bytes`] converts.
    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::Bytes(bytes) => Ok(bytes.clone()),
            Value::Null => Err(CoerceError::Null),
            other => Err(incompatible(other, Self::TARGET)),
        }
    }
}

impl FromValue for Value {
    const TARGET: &'static str = "value";

    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        Ok(value.clone())
    }
}
