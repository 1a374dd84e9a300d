//! Frame encoding/decoding utilities.
//!
//! Every frame on the link is a single characteristic write or notification,
//! so there is no outer length prefix: the identifier byte comes first and the
//! payload runs to the end of the buffer.
//!
//! ```text
//! +--------+------------------------------------+
//! |   id   | field 0 | field 1 | ... | field N  |
//! +--------+------------------------------------+
//! ```
//!
//! Multi-byte integers are big-endian. Strings are written as a one byte
//! length followed by UTF-8 bytes.

use bytes::BufMut;

use crate::error::{ProtocolError, Result};

/// Minimum size of any frame: the identifier byte.
pub const MIN_FRAME_SIZE: usize = 1;

/// A single typed payload field of an outgoing frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// Unsigned byte.
    U8(u8),
    /// Signed byte.
    I8(i8),
    /// Big-endian u16.
    U16(u16),
    /// Big-endian u32.
    U32(u32),
    /// Fixed-length raw block, written as-is.
    Block(Vec<u8>),
    /// Length-prefixed UTF-8 string with a declared maximum length.
    Str {
        /// String contents.
        value: String,
        /// Maximum encoded length in bytes (at most 255).
        max_len: usize,
    },
}

impl Field {
    /// Convenience constructor for a bounded string field.
    pub fn str(value: impl Into<String>, max_len: usize) -> Self {
        Field::Str {
            value: value.into(),
            max_len,
        }
    }

    /// Number of bytes this field occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        match self {
            Field::U8(_) | Field::I8(_) => 1,
            Field::U16(_) => 2,
            Field::U32(_) => 4,
            Field::Block(b) => b.len(),
            Field::Str { value, .. } => 1 + value.len(),
        }
    }

    fn validate(&self) -> Result<()> {
        if let Field::Str { value, max_len } = self {
            let max = (*max_len).min(u8::MAX as usize);
            if value.len() > max {
                return Err(ProtocolError::FieldTooLong {
                    max,
                    actual: value.len(),
                });
            }
        }
        Ok(())
    }

    fn write(&self, buf: &mut Vec<u8>) {
        match self {
            Field::U8(v) => buf.put_u8(*v),
            Field::I8(v) => buf.put_i8(*v),
            Field::U16(v) => buf.put_u16(*v),
            Field::U32(v) => buf.put_u32(*v),
            Field::Block(b) => buf.extend_from_slice(b),
            Field::Str { value, .. } => {
                buf.put_u8(value.len() as u8);
                buf.extend_from_slice(value.as_bytes());
            }
        }
    }
}

/// An outgoing command: identifier plus ordered payload fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    id: u8,
    fields: Vec<Field>,
}

impl CommandFrame {
    /// Start a frame for the given command identifier.
    pub fn new(id: u8) -> Self {
        CommandFrame {
            id,
            fields: Vec::new(),
        }
    }

    /// Append a field.
    pub fn with(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Append an unsigned byte.
    pub fn u8(self, v: u8) -> Self {
        self.with(Field::U8(v))
    }

    /// Append a signed byte.
    pub fn i8(self, v: i8) -> Self {
        self.with(Field::I8(v))
    }

    /// Append a big-endian u16.
    pub fn u16(self, v: u16) -> Self {
        self.with(Field::U16(v))
    }

    /// Append a big-endian u32.
    pub fn u32(self, v: u32) -> Self {
        self.with(Field::U32(v))
    }

    /// Append a boolean as a 0/1 byte.
    pub fn flag(self, v: bool) -> Self {
        self.with(Field::U8(v as u8))
    }

    /// Append a raw block.
    pub fn block(self, data: impl Into<Vec<u8>>) -> Self {
        self.with(Field::Block(data.into()))
    }

    /// Append a length-prefixed string.
    pub fn string(self, value: impl Into<String>, max_len: usize) -> Self {
        self.with(Field::str(value, max_len))
    }

    /// The command identifier.
    pub fn id(&self) -> u8 {
        self.id
    }

    /// The payload fields in order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Total encoded size including the identifier.
    pub fn encoded_len(&self) -> usize {
        MIN_FRAME_SIZE + self.fields.iter().map(Field::encoded_len).sum::<usize>()
    }

    /// Serialize the frame.
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode(self.id, &self.fields)
    }
}

/// Encode an identifier and fields into a frame.
///
/// All fields are validated before anything is written.
pub fn encode(id: u8, fields: &[Field]) -> Result<Vec<u8>> {
    for field in fields {
        field.validate()?;
    }
    let len = MIN_FRAME_SIZE + fields.iter().map(Field::encoded_len).sum::<usize>();
    let mut buf = Vec::with_capacity(len);
    buf.put_u8(id);
    for field in fields {
        field.write(&mut buf);
    }
    Ok(buf)
}

/// Split an inbound buffer into identifier and payload window.
pub fn decode(bytes: &[u8]) -> Result<ResponseFrame<'_>> {
    ResponseFrame::decode(bytes)
}

/// A received frame: identifier and a borrowed payload window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseFrame<'a> {
    id: u8,
    payload: &'a [u8],
}

impl<'a> ResponseFrame<'a> {
    /// Decode a frame from raw bytes.
    pub fn decode(bytes: &'a [u8]) -> Result<Self> {
        match bytes.split_first() {
            Some((&id, payload)) => Ok(ResponseFrame { id, payload }),
            None => Err(ProtocolError::InvalidData(format!(
                "frame shorter than {} byte",
                MIN_FRAME_SIZE
            ))),
        }
    }

    /// The command identifier.
    pub fn id(&self) -> u8 {
        self.id
    }

    /// The payload bytes after the identifier.
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// A bounds-checked reader over the payload.
    pub fn reader(&self) -> PayloadReader<'a> {
        PayloadReader::new(self.payload)
    }
}

/// Bounds-checked cursor over a payload window.
///
/// Every read checks the remaining length first and reports
/// [`ProtocolError::FrameTooShort`] instead of reading past the window.
#[derive(Debug, Clone)]
pub struct PayloadReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> PayloadReader<'a> {
    /// Create a reader over `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        PayloadReader { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Current offset into the window.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Fail unless at least `n` more bytes are available.
    pub fn require(&self, n: usize) -> Result<()> {
        if self.remaining() < n {
            return Err(ProtocolError::FrameTooShort {
                expected: self.pos + n,
                actual: self.buf.len(),
            });
        }
        Ok(())
    }

    /// Read `n` raw bytes.
    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.require(n)?;
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    /// Read an unsigned byte.
    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.bytes(1)?[0])
    }

    /// Read a signed byte.
    pub fn i8(&mut self) -> Result<i8> {
        Ok(self.u8()? as i8)
    }

    /// Read a 0/1 byte as bool (any non-zero is true).
    pub fn bool(&mut self) -> Result<bool> {
        Ok(self.u8()? != 0)
    }

    /// Read a big-endian u16.
    pub fn u16(&mut self) -> Result<u16> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Read a big-endian u32.
    pub fn u32(&mut self) -> Result<u32> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a length-prefixed UTF-8 string of at most `max_len` bytes.
    pub fn string(&mut self, max_len: usize) -> Result<String> {
        let len = self.u8()? as usize;
        if len > max_len {
            return Err(ProtocolError::FieldTooLong {
                max: max_len,
                actual: len,
            });
        }
        let raw = self.bytes(len)?;
        std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| ProtocolError::InvalidUtf8)
    }

    /// Consume and return everything left.
    pub fn rest(&mut self) -> &'a [u8] {
        let out = &self.buf[self.pos..];
        self.pos = self.buf.len();
        out
    }
}
