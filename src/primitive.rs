//! Primitive field kinds and the values read out of them.
//!
//! Every head field is one of a small set of little-endian, packed primitives. Scalars are
//! copied out of the buffer (copying eight bytes is not the "no copy" the spec cares about);
//! fixed arrays are handed back as borrows of the original buffer.

/// The kind of a single head field, per the spec's `{name, primitive_kind, offset, width}` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    U8,
    U16,
    U32,
    U64,
    /// A fixed-length run of raw bytes.
    FixedBytes(usize),
    /// A fixed-length run of bytes intended to be read as text.
    FixedChars(usize),
}

impl PrimitiveKind {
    /// Width in bytes of a field of this kind.
    pub const fn width(&self) -> usize {
        match self {
            PrimitiveKind::U8 => 1,
            PrimitiveKind::U16 => 2,
            PrimitiveKind::U32 => 4,
            PrimitiveKind::U64 => 8,
            PrimitiveKind::FixedBytes(n) | PrimitiveKind::FixedChars(n) => *n,
        }
    }
}

/// An owned scalar value, used both as a read result and as a `set` input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
}

impl Scalar {
    /// Widens the scalar to `u64`, for use as a CDR-map runtime count or an index comparison.
    pub const fn as_u64(&self) -> u64 {
        match *self {
            Scalar::U8(v) => v as u64,
            Scalar::U16(v) => v as u64,
            Scalar::U32(v) => v as u64,
            Scalar::U64(v) => v,
        }
    }

    pub(crate) fn encode_into(&self, dst: &mut [u8]) {
        match *self {
            Scalar::U8(v) => dst.copy_from_slice(&v.to_le_bytes()),
            Scalar::U16(v) => dst.copy_from_slice(&v.to_le_bytes()),
            Scalar::U32(v) => dst.copy_from_slice(&v.to_le_bytes()),
            Scalar::U64(v) => dst.copy_from_slice(&v.to_le_bytes()),
        }
    }

    pub(crate) fn matches_kind(&self, kind: PrimitiveKind) -> bool {
        matches!(
            (self, kind),
            (Scalar::U8(_), PrimitiveKind::U8)
                | (Scalar::U16(_), PrimitiveKind::U16)
                | (Scalar::U32(_), PrimitiveKind::U32)
                | (Scalar::U64(_), PrimitiveKind::U64)
        )
    }
}

/// The result of reading a head field: either a scalar, copied out, or a borrowed byte run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'buf> {
    Scalar(Scalar),
    Bytes(&'buf [u8]),
}

impl<'buf> FieldValue<'buf> {
    /// Lossily decodes a `Bytes` value as UTF-8 text. Returns `None` for scalar values.
    pub fn as_str_lossy(&self) -> Option<std::borrow::Cow<'buf, str>> {
        match self {
            FieldValue::Bytes(bytes) => Some(String::from_utf8_lossy(bytes)),
            FieldValue::Scalar(_) => None,
        }
    }

    /// Widens a scalar value to `u64`. Returns `None` for `Bytes` values.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::Scalar(s) => Some(s.as_u64()),
            FieldValue::Bytes(_) => None,
        }
    }
}
