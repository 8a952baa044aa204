use crate::error::CodecError;

/// A fixed-width byte buffer meant for reading. Every multi-byte value is
/// little-endian.
///
/// Example usage:
///
/// ```
/// let mut bb = brine_fields_schema::ByteBuffer::new(&[42, 0, 0, 0, 0x2c, 0x01]);
/// assert_eq!(bb.read_i32(), Ok(42));
/// assert_eq!(bb.read_u16(), Ok(300));
/// assert!(bb.read_u8().is_err());
/// ```
///
pub struct ByteBuffer<'a> {
    data: &'a [u8],
    index: usize,
}

impl<'a> ByteBuffer<'a> {
    /// Create a new ByteBuffer that wraps the provided byte slice. The lifetime
    /// of the returned ByteBuffer must not outlive the lifetime of the byte
    /// slice.
    pub fn new(data: &'a [u8]) -> ByteBuffer<'a> {
        ByteBuffer { data, index: 0 }
    }

    /// Retrieves the underlying byte slice.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Retrieves the current index into the underlying byte slice. This starts
    /// off as 0 and ends up as `self.data().len()` when everything has been
    /// read.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.index
    }

    /// Try to read `N` bytes starting at the current index.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Try to read `len` raw bytes starting at the current index.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if len > self.remaining() {
            return Err(CodecError::UnexpectedEnd {
                needed:    len,
                available: self.remaining(),
            });
        }
        let value = &self.data[self.index..self.index + len];
        self.index += len;
        Ok(value)
    }

    /// Try to read a boolean. Any non-zero byte is `true`.
    pub fn read_bool(&mut self) -> Result<bool, CodecError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, CodecError> {
        Ok(i8::from_le_bytes(self.read_array()?))
    }

    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16, CodecError> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64, CodecError> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    /// Floats are read bit-exactly, so NaN payloads survive.
    pub fn read_f32(&mut self) -> Result<f32, CodecError> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, CodecError> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Try to read one UTF-16 code unit as a `char`. Surrogate halves are
    /// rejected since they do not name a scalar value on their own.
    pub fn read_char(&mut self) -> Result<char, CodecError> {
        let unit = self.read_u16()?;
        char::from_u32(unit as u32).ok_or(CodecError::InvalidCharacter(unit))
    }
}

/// A fixed-width byte buffer meant for writing. Every multi-byte value is
/// little-endian.
///
/// Example usage:
///
/// ```
/// let mut bb = brine_fields_schema::ByteBufferMut::new();
/// bb.write_i32(42);
/// bb.write_u16(300);
/// assert_eq!(bb.data(), [42, 0, 0, 0, 0x2c, 0x01]);
/// ```
///
#[derive(Default)]
pub struct ByteBufferMut {
    data: Vec<u8>,
}

impl ByteBufferMut {
    /// Creates an empty ByteBufferMut ready for writing.
    pub fn new() -> ByteBufferMut {
        ByteBufferMut { data: vec![] }
    }

    /// Creates an empty buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> ByteBufferMut {
        ByteBufferMut {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Consumes this buffer and returns the underlying backing store. Use this
    /// to get the data out when you're done writing to the buffer.
    pub fn data(self) -> Vec<u8> {
        self.data
    }

    /// Returns the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Write a boolean value as `0x00` or `0x01`.
    pub fn write_bool(&mut self, value: bool) {
        self.data.push(if value { 1 } else { 0 });
    }

    /// Write a raw byte slice to the end of the buffer.
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.data.extend_from_slice(value);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.data.push(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_i16(&mut self, value: i16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.write_u32(value.to_bits());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.write_u64(value.to_bits());
    }

    /// Write a `char` as one UTF-16 code unit. Returns `false` (and writes
    /// nothing) for characters outside the Basic Multilingual Plane.
    pub fn write_char(&mut self, value: char) -> bool {
        let mut units = [0u16; 2];
        match value.encode_utf16(&mut units) {
            [unit] => {
                self.write_u16(*unit);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
fn write_once(cb: fn(&mut ByteBufferMut)) -> Vec<u8> {
    let mut bb = ByteBufferMut::new();
    cb(&mut bb);
    bb.data()
}

#[test]
fn read_bool() {
    let mut bb = ByteBuffer::new(&[0, 1, 2]);
    assert_eq!(bb.read_bool(), Ok(false));
    assert_eq!(bb.read_bool(), Ok(true));
    assert_eq!(bb.read_bool(), Ok(true));
    assert!(bb.read_bool().is_err());
}

#[test]
fn read_bytes() {
    let data = [1, 2, 3, 4, 5];
    let mut bb = ByteBuffer::new(&data);
    assert_eq!(bb.read_bytes(2), Ok(&data[0..2]));
    assert_eq!(bb.read_bytes(0), Ok(&data[2..2]));
    assert_eq!(bb.read_bytes(3), Ok(&data[2..5]));
    assert_eq!(
        bb.read_bytes(1),
        Err(CodecError::UnexpectedEnd { needed: 1, available: 0 })
    );
    assert_eq!(bb.index(), 5);
}

#[test]
fn read_little_endian_integers() {
    let mut bb = ByteBuffer::new(&[
        0xe8, 0x03, 0x00, 0x00, // 1000
        0xff, 0xff, // -1
        0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x80, // i64::MIN + 1
    ]);
    assert_eq!(bb.read_i32(), Ok(1000));
    assert_eq!(bb.read_i16(), Ok(-1));
    assert_eq!(bb.read_i64(), Ok(i64::MIN + 1));
    assert_eq!(bb.remaining(), 0);
}

#[test]
fn read_partial_value_does_not_advance() {
    let mut bb = ByteBuffer::new(&[1, 2, 3]);
    assert_eq!(
        bb.read_u32(),
        Err(CodecError::UnexpectedEnd { needed: 4, available: 3 })
    );
    assert_eq!(bb.index(), 0);
    assert_eq!(bb.read_u16(), Ok(0x0201));
}

#[test]
fn read_char() {
    let mut bb = ByteBuffer::new(&[0x41, 0x00, 0xac, 0x20, 0x00, 0xd8]);
    assert_eq!(bb.read_char(), Ok('A'));
    assert_eq!(bb.read_char(), Ok('€'));
    assert_eq!(bb.read_char(), Err(CodecError::InvalidCharacter(0xd800)));
}

#[test]
fn write_integers() {
    assert_eq!(write_once(|bb| bb.write_i32(1000)), [0xe8, 0x03, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_i8(-2)), [0xfe]);
    assert_eq!(write_once(|bb| bb.write_u16(300)), [0x2c, 0x01]);
    assert_eq!(
        write_once(|bb| bb.write_u64(u64::MAX)),
        [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
    );
}

#[test]
fn write_floats() {
    assert_eq!(write_once(|bb| bb.write_f32(1.0)), [0, 0, 0x80, 0x3f]);
    assert_eq!(write_once(|bb| bb.write_f32(-0.0)), [0, 0, 0, 0x80]);
    assert_eq!(
        write_once(|bb| bb.write_f64(f64::INFINITY)),
        [0, 0, 0, 0, 0, 0, 0xf0, 0x7f]
    );
}

#[test]
fn write_char() {
    assert_eq!(write_once(|bb| assert!(bb.write_char('A'))), [0x41, 0]);
    assert_eq!(write_once(|bb| assert!(!bb.write_char('🍕'))), Vec::<u8>::new());
}

#[test]
fn write_sequence() {
    let mut bb = ByteBufferMut::new();
    bb.write_bool(true);
    bb.write_u8(5);
    bb.write_bytes(b"Alice");
    assert_eq!(bb.len(), 7);
    assert_eq!(bb.data(), [1, 5, b'A', b'l', b'i', b'c', b'e']);
}
