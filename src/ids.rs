//! Element ID classes and reserved-pattern validation.
//!
//! An element ID is a vint like any other, but EBML additionally classifies
//! it by encoded width (Class A/B/C/D = 1/2/3/4 bytes) and reserves two bit
//! patterns within each class: all payload bits zero, and all payload bits
//! one. Both patterns are invalid IDs in every class, including Class A.

use crate::base::VInt64;
use crate::error::Error;
use crate::functional::{BufMut, Decode, Encode};
use crate::io::ReadExt;
use crate::io::blocking::ReadFrom;

/// The encoded byte-width class of an element ID.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IdClass {
    /// 1-byte encoded ID.
    A,
    /// 2-byte encoded ID.
    B,
    /// 3-byte encoded ID.
    C,
    /// 4-byte encoded ID.
    D,
}

/// A validated EBML element ID.
///
/// Unlike a plain size vint, an ID vint rejects the reserved all-zero and
/// all-one payload patterns within its class.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub VInt64);

impl ElementId {
    /// Build a validated element ID from a raw decoded value, checking it
    /// against the reserved patterns for its class.
    pub fn new(value: VInt64) -> crate::Result<Self> {
        validate(value)?;
        Ok(Self(value))
    }

    /// The class (encoded byte width) of this ID.
    pub fn class(&self) -> IdClass {
        class_of(VInt64::encode_size(self.0.value))
    }

    /// The decoded (class-marker-stripped) value.
    pub fn value(&self) -> u64 {
        self.0.value
    }
}

fn class_of(width: usize) -> IdClass {
    match width {
        1 => IdClass::A,
        2 => IdClass::B,
        3 => IdClass::C,
        _ => IdClass::D,
    }
}

fn validate(v: VInt64) -> crate::Result<()> {
    let width = VInt64::encode_size(v.value);
    let payload_bits = 7 * width;
    let max_payload = if payload_bits >= 64 {
        u64::MAX
    } else {
        (1u64 << payload_bits) - 1
    };
    if v.value == 0 || v.value == max_payload {
        return Err(Error::InvalidEbmlId {
            id: v.as_encoded(),
        });
    }
    Ok(())
}

impl ReadFrom for ElementId {
    fn read_from<R: std::io::Read>(r: &mut R) -> crate::Result<Self> {
        let v = VInt64::read_from(r)?;
        ElementId::new(v)
    }
}

impl Decode for ElementId {
    fn decode(buf: &mut &[u8]) -> crate::Result<Self> {
        let v = VInt64::decode(buf)?;
        ElementId::new(v)
    }
}

impl Encode for ElementId {
    fn encode<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
        self.0.encode(buf)
    }
}
