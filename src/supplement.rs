use std::ops::Deref;

use crate::base::VInt64;
use crate::element::Element;
use crate::functional::*;

/// Ebml Void element, used for padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Void {
    /// Size of the void element in bytes.
    pub size: u64,
}
impl Element for Void {
    const ID: VInt64 = VInt64::from_encoded(0xEC);
    fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
        let len = buf.len() as u64;
        buf.advance(buf.len());
        Ok(Self { size: len })
    }
    fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
        buf.append_slice(&vec![0; self.size as usize]);
        Ok(())
    }
}

/// CRC-32 element, used for integrity checking.
///
/// The value is the IEEE CRC-32 (poly `0xEDB88320`, init/final `0xFFFFFFFF`)
/// of the sibling elements that follow it within the same parent, stored
/// little-endian. [`crate::master`]'s master-element decoder verifies this
/// value against the bytes it actually read, and its encoder recomputes it
/// from the bytes it's about to write — this type itself is just the wire
/// representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc32(pub u32);
impl Deref for Crc32 {
    type Target = u32;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl Element for Crc32 {
    const ID: VInt64 = VInt64::from_encoded(0xBF);
    fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
        let bytes = <[u8; 4]>::decode_exact(buf, 4)?;
        Ok(Self(u32::from_le_bytes(bytes)))
    }
    fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
        buf.append_slice(&self.0.to_le_bytes());
        Ok(())
    }
}

impl Crc32 {
    /// Compute the CRC-32 a `Crc32` element covering `data` should carry.
    pub fn compute(data: &[u8]) -> Self {
        Self(crc32fast::hash(data))
    }

    /// Check that this value matches the CRC-32 of `data`.
    pub fn matches(&self, data: &[u8]) -> bool {
        self.0 == crc32fast::hash(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc32_matches_known_data() {
        let data = b"123456789";
        let crc = Crc32::compute(data);
        assert!(crc.matches(data));
        assert!(!crc.matches(b"123456788"));
    }
}
