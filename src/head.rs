//! Read-only and in-place-mutable projection of a pair's fixed-layout head.

use std::rc::Rc;

use crate::error::ParseError;
use crate::layout::HeadLayout;
use crate::primitive::{FieldValue, PrimitiveKind, Scalar};

/// A view over the head bytes of a single pair, borrowed from the pair's buffer.
///
/// Holds its layout by `Rc` (cheap to clone, shared with the owning `Pair`) rather than by
/// reference, so a `HeadView` can outlive the call that produced it without tying its lifetime
/// to anything shorter than the buffer itself.
#[derive(Clone)]
pub struct HeadView<'buf> {
    layout: Rc<HeadLayout>,
    bytes: &'buf [u8],
}

impl<'buf> HeadView<'buf> {
    pub(crate) fn new(layout: Rc<HeadLayout>, bytes: &'buf [u8]) -> Self {
        debug_assert!(bytes.len() >= layout.size);
        Self { layout, bytes }
    }

    pub fn layout_name(&self) -> &'static str {
        self.layout.name
    }

    /// Reads a named field out of this head. Errors if `name` is not a head field of this layout;
    /// the caller (a `Pair`) is responsible for then trying the tail chain.
    pub fn get(&self, name: &str) -> Result<FieldValue<'buf>, ParseError> {
        let field = self
            .layout
            .field(name)
            .ok_or_else(|| ParseError::UnknownField {
                layout: self.layout.name,
                name: name.to_string(),
            })?;
        Ok(self.read_field(field.kind, field.offset))
    }

    fn read_field(&self, kind: PrimitiveKind, offset: usize) -> FieldValue<'buf> {
        let width = kind.width();
        let raw = &self.bytes[offset..offset + width];
        match kind {
            PrimitiveKind::U8 => FieldValue::Scalar(Scalar::U8(raw[0])),
            PrimitiveKind::U16 => {
                FieldValue::Scalar(Scalar::U16(u16::from_le_bytes(raw.try_into().unwrap())))
            }
            PrimitiveKind::U32 => {
                FieldValue::Scalar(Scalar::U32(u32::from_le_bytes(raw.try_into().unwrap())))
            }
            PrimitiveKind::U64 => {
                FieldValue::Scalar(Scalar::U64(u64::from_le_bytes(raw.try_into().unwrap())))
            }
            PrimitiveKind::FixedBytes(_) | PrimitiveKind::FixedChars(_) => FieldValue::Bytes(raw),
        }
    }

    /// Overwrites a named scalar field in place.
    ///
    /// The pair-chain contract gives the caller exclusive access to the underlying buffer for the
    /// duration of a `set`; the same assumption the rest of the chain relies on when it later
    /// re-reads this head. Byte-array fields are not mutable through this path.
    pub fn set(&self, name: &str, value: Scalar) -> Result<(), ParseError> {
        let field = self
            .layout
            .field(name)
            .ok_or_else(|| ParseError::UnknownField {
                layout: self.layout.name,
                name: name.to_string(),
            })?;
        let width = field.kind.width();
        if !value.matches_kind(field.kind) {
            return Err(ParseError::ValueOutOfRange {
                name: name.to_string(),
                width,
            });
        }

        // SAFETY: `offset + width <= layout.size <= bytes.len()` was checked at construction of
        // the owning pair, and the caller holds exclusive access to the buffer for this call.
        // `bytes` aliases the pair's shared `&[u8]`, so this is the one place the chain reaches
        // through its own immutability; every other path only ever reads.
        unsafe {
            let ptr = self.bytes.as_ptr().add(field.offset) as *mut u8;
            let dst = std::slice::from_raw_parts_mut(ptr, width);
            value.encode_into(dst);
        }
        Ok(())
    }

    pub(crate) fn layout_rc_eq(&self, other: &Rc<HeadLayout>) -> bool {
        Rc::ptr_eq(&self.layout, other)
    }
}
