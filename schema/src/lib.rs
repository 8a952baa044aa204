//! The leaf crate of brine-fields: the closed catalog of fixed-width
//! primitive types, the dynamic [`Value`] they decode into, and the lenient
//! coercion rules applied to caller input before encoding.
//!
//! ```
//! use brine_fields_schema::*;
//!
//! let ty = PrimitiveType::from_name("short").unwrap();
//! assert_eq!(ty.width(), 2);
//!
//! let value = ty.coerce(&Value::from("300")).unwrap();
//! assert_eq!(value, Value::Short(300));
//! assert_eq!(ty.encode(&value).unwrap(), [0x2c, 0x01]);
//! assert_eq!(ty.decode(&[0x2c, 0x01]).unwrap(), value);
//! ```

pub mod bb;
pub mod coerce;
pub mod error;
pub mod registry;
pub mod value;

pub use bb::*;
pub use coerce::FromValue;
pub use error::{CodecError, CoerceError, ErrorCode};
pub use registry::{is_reserved_name, PrimitiveType, TypeInfo};
pub use value::Value;
