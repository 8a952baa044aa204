use brine_fields_schema::{PrimitiveType, Value};
use proptest::prelude::*;

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<u8>().prop_map(Value::Byte),
        any::<i8>().prop_map(Value::SByte),
        any::<i16>().prop_map(Value::Short),
        any::<u16>().prop_map(Value::UShort),
        any::<i32>().prop_map(Value::Int),
        any::<u32>().prop_map(Value::UInt),
        any::<i64>().prop_map(Value::Long),
        any::<u64>().prop_map(Value::ULong),
        any::<f32>().prop_map(Value::Float),
        any::<f64>().prop_map(Value::Double),
        any::<char>()
            .prop_filter("BMP only", |c| c.len_utf16() == 1)
            .prop_map(Value::Char),
        any::<bool>().prop_map(Value::Bool),
    ]
}

fn roundtrip(value: &Value) -> Value {
    let ty = value.primitive_type().unwrap();
    let bytes = ty.encode(value).unwrap();
    assert_eq!(bytes.len(), ty.width());
    ty.decode(&bytes).unwrap()
}

proptest! {
    #[test]
    fn decode_inverts_encode(value in scalar()) {
        prop_assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn floats_keep_their_bits(bits in any::<u64>()) {
        let value = f64::from_bits(bits);
        match roundtrip(&Value::Double(value)) {
            Value::Double(back) => prop_assert_eq!(back.to_bits(), bits),
            other => prop_assert!(false, "decoded {:?}", other),
        }
    }

    #[test]
    fn coerce_then_encode_has_declared_width(n in any::<u8>()) {
        for ty in PrimitiveType::ALL {
            let coerced = ty.coerce(&Value::Byte(n)).unwrap();
            prop_assert_eq!(ty.encode(&coerced).unwrap().len(), ty.width());
        }
    }
}

#[test]
fn extremes_roundtrip() {
    let values = [
        Value::Byte(u8::MIN),
        Value::Byte(u8::MAX),
        Value::SByte(i8::MIN),
        Value::SByte(i8::MAX),
        Value::Short(i16::MIN),
        Value::UShort(u16::MAX),
        Value::Int(i32::MIN),
        Value::Int(i32::MAX),
        Value::UInt(u32::MAX),
        Value::Long(i64::MIN),
        Value::ULong(u64::MAX),
        Value::Float(f32::MIN),
        Value::Float(f32::MAX),
        Value::Float(f32::INFINITY),
        Value::Float(f32::NEG_INFINITY),
        Value::Double(f64::MIN_POSITIVE),
        Value::Double(f64::NEG_INFINITY),
        Value::Char('\0'),
        Value::Char('\u{ffff}'),
        Value::Bool(true),
    ];
    for value in &values {
        assert_eq!(&roundtrip(value), value);
    }
}

#[test]
fn signed_zero_and_nan_roundtrip() {
    match roundtrip(&Value::Double(-0.0)) {
        Value::Double(v) => assert!(v == 0.0 && v.is_sign_negative()),
        other => panic!("decoded {:?}", other),
    }
    match roundtrip(&Value::Float(0.0)) {
        Value::Float(v) => assert!(v == 0.0 && v.is_sign_positive()),
        other => panic!("decoded {:?}", other),
    }
    match roundtrip(&Value::Float(f32::NAN)) {
        Value::Float(v) => assert!(v.is_nan()),
        other => panic!("decoded {:?}", other),
    }
    match roundtrip(&Value::Double(f64::NAN)) {
        Value::Double(v) => assert!(v.is_nan()),
        other => panic!("decoded {:?}", other),
    }
}
