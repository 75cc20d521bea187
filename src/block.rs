//! Block payload codec: track number, relative timecode, flags and one or
//! more laced frames.
//!
//! `SimpleBlock` and the `Block` child of `BlockGroup` share this exact
//! payload layout; the two leaf elements in [`crate::leaf`] just wrap raw
//! bytes and hand them here. Flag bit 4 (0x10) marks a frame invisible; bits
//! 6-5 (mask 0x60) select the lacing mode — `00` none, `10` fixed, `11`
//! EBML, `01` reserved. Any other bits (e.g. SimpleBlock's keyframe bit,
//! 0x80) are caller-supplied and round-tripped verbatim.

use crate::base::VInt64;
use crate::error::Error;
use crate::functional::{BufMut, Decode, Encode};
use crate::lacer::Lacer;

const FLAG_INVISIBLE: u8 = 0x10;
const FLAG_LACING_MASK: u8 = 0x60;
const FLAG_LACING_NONE: u8 = 0x00;
const FLAG_LACING_FIXED: u8 = 0x40;
const FLAG_LACING_EBML: u8 = 0x60;
const FLAG_LACING_RESERVED: u8 = 0x20;

/// The lacing mode of a Block payload.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Lacing {
    /// A single frame, no lacing header.
    None,
    /// Multiple frames of identical size.
    Fixed,
    /// Multiple frames of varying size, sizes stored as biased deltas.
    Ebml,
}

/// A decoded Block payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPayload {
    /// Track this block belongs to.
    pub track_number: u64,
    /// Timecode relative to the enclosing Cluster's timestamp.
    pub timecode: i16,
    /// Whether the block is marked invisible.
    pub invisible: bool,
    /// Lacing mode used.
    pub lacing: Lacing,
    /// Any flag bits outside the invisible/lacing bits (e.g. keyframe).
    pub extra_flags: u8,
    /// The frames carried by this block, in order.
    pub frames: Vec<Vec<u8>>,
}

impl BlockPayload {
    /// Validate the invariants a Block must hold before it can be encoded:
    /// no empty frames, `None` lacing implies exactly one frame, `Fixed`
    /// lacing implies all frames share one size.
    pub fn validate(&self) -> crate::Result<()> {
        if self.frames.iter().any(|f| f.is_empty()) {
            return Err(Error::EmptyFrame);
        }
        match self.lacing {
            Lacing::None if self.frames.len() != 1 => {
                return Err(Error::MalformedLacingData);
            }
            Lacing::Fixed => {
                let first = self.frames[0].len();
                if self.frames.iter().any(|f| f.len() != first) {
                    return Err(Error::BadLacedFrameSize {
                        observed: first as i64,
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Encode this payload to its wire form.
    pub fn encode<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
        self.validate()?;
        VInt64::new(self.track_number).encode(buf)?;
        self.timecode.encode(buf)?;

        let lacing_bits = match self.lacing {
            Lacing::None => FLAG_LACING_NONE,
            Lacing::Fixed => FLAG_LACING_FIXED,
            Lacing::Ebml => FLAG_LACING_EBML,
        };
        let flags = self.extra_flags
            | lacing_bits
            | if self.invisible { FLAG_INVISIBLE } else { 0 };
        flags.encode(buf)?;

        match self.lacing {
            Lacing::None => {
                buf.append_slice(&self.frames[0]);
            }
            Lacing::Fixed => {
                ((self.frames.len() - 1) as u8).encode(buf)?;
                let refs: Vec<&[u8]> = self.frames.iter().map(|f| f.as_slice()).collect();
                let laced = Lacer::FixedSize.lace(&refs)?;
                buf.append_slice(&laced);
            }
            Lacing::Ebml => {
                ((self.frames.len() - 1) as u8).encode(buf)?;
                let refs: Vec<&[u8]> = self.frames.iter().map(|f| f.as_slice()).collect();
                let laced = Lacer::Ebml.lace(&refs)?;
                buf.append_slice(&laced);
            }
        }
        Ok(())
    }

    /// Decode a Block payload from its raw body bytes.
    pub fn decode(body: &[u8]) -> crate::Result<Self> {
        let mut cursor = body;
        let track_number = *VInt64::decode(&mut cursor)?;
        let timecode = i16::decode(&mut cursor)?;
        let flags = u8::decode(&mut cursor)?;

        let invisible = flags & FLAG_INVISIBLE != 0;
        let lacing_bits = flags & FLAG_LACING_MASK;
        let extra_flags = flags & !(FLAG_INVISIBLE | FLAG_LACING_MASK);

        let (lacing, frames) = match lacing_bits {
            FLAG_LACING_NONE => (Lacing::None, vec![cursor.to_vec()]),
            FLAG_LACING_RESERVED => return Err(Error::MalformedLacingData),
            FLAG_LACING_FIXED => {
                let count = u8::decode(&mut cursor)? as usize + 1;
                let frames = Lacer::FixedSize.delace(cursor, count)?;
                (Lacing::Fixed, frames.into_iter().map(|f| f.to_vec()).collect())
            }
            FLAG_LACING_EBML => {
                let count = u8::decode(&mut cursor)? as usize + 1;
                let frames = Lacer::Ebml.delace(cursor, count)?;
                (Lacing::Ebml, frames.into_iter().map(|f| f.to_vec()).collect())
            }
            _ => unreachable!("mask limits lacing_bits to the four cases above"),
        };

        Ok(Self {
            track_number,
            timecode,
            invisible,
            lacing,
            extra_flags,
            frames,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_lacing_round_trip() {
        let block = BlockPayload {
            track_number: 1,
            timecode: -5,
            invisible: false,
            lacing: Lacing::None,
            extra_flags: 0x80,
            frames: vec![vec![1, 2, 3]],
        };
        let mut buf = vec![];
        block.encode(&mut buf).unwrap();
        let decoded = BlockPayload::decode(&buf).unwrap();
        assert_eq!(decoded, block);
    }

    #[test]
    fn ebml_lacing_round_trip() {
        let block = BlockPayload {
            track_number: 2,
            timecode: 10,
            invisible: true,
            lacing: Lacing::Ebml,
            extra_flags: 0,
            frames: vec![vec![9; 20], vec![9; 5], vec![9; 45]],
        };
        let mut buf = vec![];
        block.encode(&mut buf).unwrap();
        let decoded = BlockPayload::decode(&buf).unwrap();
        assert_eq!(decoded, block);
        assert!(decoded.invisible);
    }

    #[test]
    fn rejects_empty_frame() {
        let block = BlockPayload {
            track_number: 1,
            timecode: 0,
            invisible: false,
            lacing: Lacing::None,
            extra_flags: 0,
            frames: vec![vec![]],
        };
        assert!(matches!(block.validate(), Err(Error::EmptyFrame)));
    }
}
