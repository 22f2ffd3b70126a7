//! Fixed-width primitive codecs.
//!
//! Every wire primitive is big-endian and fixed-width. Reads go through a
//! [`Reader`], a cursor over a borrowed buffer that only advances once the
//! whole primitive is available. Writes go through [`bytes::BufMut`] so
//! any growable buffer can be the target.

use bytes::BufMut;

use crate::{ProtocolError, Value};

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// A read cursor over a byte buffer.
///
/// Every read either consumes exactly the bytes it needs and advances
/// the offset, or returns [`ProtocolError::InsufficientData`] and leaves
/// the offset where it was.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a reader positioned at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Creates a reader positioned at `offset`.
    ///
    /// An offset past the end behaves like an exhausted buffer.
    pub fn at(buf: &'a [u8], offset: usize) -> Self {
        Self {
            buf,
            pos: offset.min(buf.len()),
        }
    }

    /// The offset the next read starts from.
    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// The unread tail of the buffer.
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    /// Consumes exactly `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        let available = self.remaining();
        if available < n {
            return Err(ProtocolError::InsufficientData {
                needed: n - available,
            });
        }
        let start = self.pos;
        self.pos += n;
        Ok(&self.buf[start..self.pos])
    }

    /// Consumes exactly `N` bytes into an array.
    pub fn take_array<const N: usize>(&mut self) -> Result<[u8; N], ProtocolError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Returns the next byte without consuming it.
    pub fn peek_u8(&self) -> Result<u8, ProtocolError> {
        self.buf
            .get(self.pos)
            .copied()
            .ok_or(ProtocolError::InsufficientData { needed: 1 })
    }

    pub fn read_u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(u8::from_be_bytes(self.take_array()?))
    }

    pub fn read_i8(&mut self) -> Result<i8, ProtocolError> {
        Ok(i8::from_be_bytes(self.take_array()?))
    }

    pub fn read_u16(&mut self) -> Result<u16, ProtocolError> {
        Ok(u16::from_be_bytes(self.take_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16, ProtocolError> {
        Ok(i16::from_be_bytes(self.take_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, ProtocolError> {
        Ok(u32::from_be_bytes(self.take_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, ProtocolError> {
        Ok(i32::from_be_bytes(self.take_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, ProtocolError> {
        Ok(u64::from_be_bytes(self.take_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64, ProtocolError> {
        Ok(i64::from_be_bytes(self.take_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32, ProtocolError> {
        Ok(f32::from_be_bytes(self.take_array()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, ProtocolError> {
        Ok(f64::from_be_bytes(self.take_array()?))
    }
}

// ---------------------------------------------------------------------------
// Integer kinds
// ---------------------------------------------------------------------------

/// The fixed-width integer types used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Int {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
}

impl Int {
    /// Width in bytes.
    pub const fn width(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 => 4,
            Self::U64 | Self::I64 => 8,
        }
    }

    pub const fn is_signed(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    /// Reads one integer as an `i128`, wide enough for every kind.
    pub fn read_raw(self, r: &mut Reader<'_>) -> Result<i128, ProtocolError> {
        Ok(match self {
            Self::U8 => i128::from(r.read_u8()?),
            Self::I8 => i128::from(r.read_i8()?),
            Self::U16 => i128::from(r.read_u16()?),
            Self::I16 => i128::from(r.read_i16()?),
            Self::U32 => i128::from(r.read_u32()?),
            Self::I32 => i128::from(r.read_i32()?),
            Self::U64 => i128::from(r.read_u64()?),
            Self::I64 => i128::from(r.read_i64()?),
        })
    }

    /// Reads one integer as a [`Value`] of matching signedness.
    pub fn decode(self, r: &mut Reader<'_>) -> Result<Value, ProtocolError> {
        Ok(match self {
            Self::U8 => Value::from(r.read_u8()?),
            Self::I8 => Value::from(r.read_i8()?),
            Self::U16 => Value::from(r.read_u16()?),
            Self::I16 => Value::from(r.read_i16()?),
            Self::U32 => Value::from(r.read_u32()?),
            Self::I32 => Value::from(r.read_i32()?),
            Self::U64 => Value::from(r.read_u64()?),
            Self::I64 => Value::from(r.read_i64()?),
        })
    }

    /// Writes `value`, failing if it does not fit this width.
    pub fn write_raw(
        self,
        field: &'static str,
        value: i128,
        buf: &mut impl BufMut,
    ) -> Result<(), ProtocolError> {
        let out_of_range = || ProtocolError::OutOfRange {
            field,
            value: value.to_string(),
        };
        match self {
            Self::U8 => buf.put_u8(u8::try_from(value).map_err(|_| out_of_range())?),
            Self::I8 => buf.put_i8(i8::try_from(value).map_err(|_| out_of_range())?),
            Self::U16 => buf.put_u16(u16::try_from(value).map_err(|_| out_of_range())?),
            Self::I16 => buf.put_i16(i16::try_from(value).map_err(|_| out_of_range())?),
            Self::U32 => buf.put_u32(u32::try_from(value).map_err(|_| out_of_range())?),
            Self::I32 => buf.put_i32(i32::try_from(value).map_err(|_| out_of_range())?),
            Self::U64 => buf.put_u64(u64::try_from(value).map_err(|_| out_of_range())?),
            Self::I64 => buf.put_i64(i64::try_from(value).map_err(|_| out_of_range())?),
        }
        Ok(())
    }

    /// Writes an integer [`Value`] of either signedness.
    pub fn encode(
        self,
        field: &'static str,
        value: &Value,
        buf: &mut impl BufMut,
    ) -> Result<(), ProtocolError> {
        let raw = int_of(field, value)?;
        self.write_raw(field, raw, buf)
    }
}

/// Extracts an integer from a value of either signedness.
pub(crate) fn int_of(field: &'static str, value: &Value) -> Result<i128, ProtocolError> {
    match *value {
        Value::Int(v) => Ok(i128::from(v)),
        Value::UInt(v) => Ok(i128::from(v)),
        _ => Err(ProtocolError::TypeMismatch {
            field,
            expected: "an integer",
        }),
    }
}

// ---------------------------------------------------------------------------
// Float kinds
// ---------------------------------------------------------------------------

/// IEEE-754 float widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Float {
    F32,
    F64,
}

impl Float {
    pub fn decode(self, r: &mut Reader<'_>) -> Result<Value, ProtocolError> {
        Ok(match self {
            Self::F32 => Value::from(r.read_f32()?),
            Self::F64 => Value::from(r.read_f64()?),
        })
    }

    pub fn encode(
        self,
        field: &'static str,
        value: &Value,
        buf: &mut impl BufMut,
    ) -> Result<(), ProtocolError> {
        // Integers are accepted for convenience; they convert like `as`.
        let v = match *value {
            Value::Float(v) => v,
            Value::Int(v) => v as f64,
            Value::UInt(v) => v as f64,
            _ => {
                return Err(ProtocolError::TypeMismatch {
                    field,
                    expected: "a float",
                });
            }
        };
        match self {
            Self::F32 => buf.put_f32(v as f32),
            Self::F64 => buf.put_f64(v),
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Flags and bit splits
// ---------------------------------------------------------------------------

/// Decodes a one-byte flag. Zero is false; every other byte is true.
pub fn decode_flag(r: &mut Reader<'_>) -> Result<bool, ProtocolError> {
    Ok(r.read_u8()? != 0)
}

pub fn encode_flag(value: bool, buf: &mut impl BufMut) {
    buf.put_u8(u8::from(value));
}

/// Splits a byte into its high 3 bits and low 5 bits.
pub const fn split_3_5(byte: u8) -> (u8, u8) {
    (byte >> 5, byte & 0x1f)
}

/// Packs a 3-bit high part and 5-bit low part into one byte.
///
/// Out-of-range inputs are masked.
pub const fn join_3_5(high: u8, low: u8) -> u8 {
    ((high & 0x07) << 5) | (low & 0x1f)
}
