//! Lacing and delacing of multiple frames into a single Block payload.
//!
//! Three lacing modes are supported: `None` (a single frame), `Fixed` (every
//! frame the same size, so only a count is stored) and `Ebml` (frame sizes
//! stored as a plain vint for the first frame, then signed biased deltas for
//! the rest). Xiph-style lacing is not part of this format.

use crate::Error;
use crate::base::VInt64;
use crate::functional::{BufMut, Decode, Encode};

/// Handler for lacing and delacing operations on frame data.
pub enum Lacer {
    /// Fixed-size lacing: every frame in the lace has the same size.
    FixedSize,
    /// EBML lacing: first frame's absolute size, then signed biased deltas.
    Ebml,
}

/// The bias added to a frame-size delta before it is written as an EBML
/// signed integer of width `w`, so the stored value is always non-negative
/// on the wire: `u = s + (2^(7w-1) - 1)`.
fn ebml_lacing_bias(width: usize) -> i64 {
    (1i64 << (7 * width - 1)) - 1
}

/// Width, in bytes, a signed delta `delta` needs under EBML lacing's biased
/// encoding: the bias itself depends on the chosen width, so this searches
/// for the smallest width whose bias keeps the biased value representable
/// as an unsigned vint of that same width.
fn ebml_lacing_width(delta: i64) -> usize {
    for width in 1..=8 {
        let bias = ebml_lacing_bias(width);
        let biased = delta + bias;
        if biased >= 0 && (biased as u64) < (1u64 << (7 * width)) {
            return width;
        }
    }
    8
}

impl Lacer {
    /// Encode multiple frames into a single laced block payload (the lacing
    /// head plus concatenated frame data; the caller is responsible for the
    /// frame-count byte used by fixed/EBML lacing headers being written
    /// ahead of this, per the Block wire layout in `crate::block`).
    pub fn lace(&self, frames: &[&[u8]]) -> crate::Result<Vec<u8>> {
        if frames.iter().any(|f| f.is_empty()) {
            return Err(Error::EmptyFrame);
        }
        match self {
            Lacer::FixedSize => {
                let first_size = frames[0].len();
                if frames.iter().any(|f| f.len() != first_size) {
                    return Err(Error::BadLacedFrameSize {
                        observed: first_size as i64,
                    });
                }
                let mut output = vec![];
                for frame in frames {
                    output.extend_from_slice(frame);
                }
                Ok(output)
            }
            Lacer::Ebml => {
                let mut output = vec![];
                if let Some(first) = frames.first() {
                    VInt64::new(first.len() as u64).encode(&mut output)?;
                }
                // Only the first frame's size is absolute and the last frame's
                // size is inferred from what remains, so only the frames in
                // between need a delta: frame_count - 2 of them.
                if !frames.is_empty() {
                    for pair in frames[..frames.len() - 1].windows(2) {
                        let delta = pair[1].len() as i64 - pair[0].len() as i64;
                        let width = ebml_lacing_width(delta);
                        let biased = (delta + ebml_lacing_bias(width)) as u64;
                        VInt64::new(biased).encode_sized(&mut output, Some(width))?;
                    }
                }
                for frame in frames {
                    output.extend_from_slice(frame);
                }
                Ok(output)
            }
        }
    }

    /// Decode a laced block payload (everything after the frame-count byte)
    /// into individual frames, given the number of frames the caller already
    /// read from the lacing head.
    pub fn delace<'a>(&self, data: &'a [u8], frame_count: usize) -> crate::Result<Vec<&'a [u8]>> {
        if frame_count == 0 {
            return Ok(vec![]);
        }
        match self {
            Lacer::FixedSize => {
                if frame_count == 0 || data.len() % frame_count != 0 {
                    return Err(Error::MalformedLacingData);
                }
                let size = data.len() / frame_count;
                Ok(data.chunks(size).collect())
            }
            Lacer::Ebml => {
                let mut cursor = data;
                let first_size = VInt64::decode(&mut cursor)? .value as usize;
                let mut sizes = Vec::with_capacity(frame_count);
                sizes.push(first_size);
                for _ in 0..frame_count.saturating_sub(2) {
                    let biased = VInt64::decode(&mut cursor)?;
                    let width = VInt64::encode_size(biased.value).max(1);
                    let delta = biased.value as i64 - ebml_lacing_bias(width);
                    let prev = *sizes.last().unwrap() as i64;
                    let next = prev + delta;
                    if next < 0 {
                        return Err(Error::MalformedLacingData);
                    }
                    sizes.push(next as usize);
                }
                let consumed: usize = sizes.iter().sum();
                if frame_count >= 2 {
                    let remaining = cursor.len();
                    if remaining < consumed {
                        return Err(Error::MalformedLacingData);
                    }
                    sizes.push(remaining - consumed);
                }
                let mut out = Vec::with_capacity(frame_count);
                let mut start = 0;
                for size in sizes {
                    let end = start + size;
                    out.push(cursor.get(start..end).ok_or(Error::MalformedLacingData)?);
                    start = end;
                }
                Ok(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_lacing_round_trip() {
        let f0 = vec![1u8; 10];
        let f1 = vec![2u8; 10];
        let f2 = vec![3u8; 10];
        let laced = Lacer::FixedSize.lace(&[&f0, &f1, &f2]).unwrap();
        let frames = Lacer::FixedSize.delace(&laced, 3).unwrap();
        assert_eq!(frames, vec![&f0[..], &f1[..], &f2[..]]);
    }

    #[test]
    fn fixed_lacing_rejects_nonuniform() {
        let f0 = vec![1u8; 10];
        let f1 = vec![2u8; 11];
        let err = Lacer::FixedSize.lace(&[&f0, &f1]).unwrap_err();
        assert!(matches!(err, Error::BadLacedFrameSize { .. }));
    }

    #[test]
    fn ebml_lacing_round_trip() {
        let f0 = vec![1u8; 100];
        let f1 = vec![2u8; 50];
        let f2 = vec![3u8; 200];
        let f3 = vec![4u8; 40];
        let laced = Lacer::Ebml.lace(&[&f0, &f1, &f2, &f3]).unwrap();
        let frames = Lacer::Ebml.delace(&laced, 4).unwrap();
        assert_eq!(frames, vec![&f0[..], &f1[..], &f2[..], &f3[..]]);
    }

    #[test]
    fn ebml_lacing_two_frames_has_no_delta_byte() {
        let f0 = vec![1u8; 30];
        let f1 = vec![2u8; 70];
        let laced = Lacer::Ebml.lace(&[&f0, &f1]).unwrap();
        // Only the first frame's absolute size is stored; the second's size
        // is deduced from what remains.
        let mut cursor = &laced[..];
        let first = VInt64::decode(&mut cursor).unwrap();
        assert_eq!(*first, 30);
        assert_eq!(cursor.len(), 100);
        let frames = Lacer::Ebml.delace(&laced, 2).unwrap();
        assert_eq!(frames, vec![&f0[..], &f1[..]]);
    }

    #[test]
    fn rejects_empty_frame() {
        let f0 = vec![1u8; 10];
        let empty: Vec<u8> = vec![];
        let err = Lacer::FixedSize.lace(&[&f0, &empty]).unwrap_err();
        assert!(matches!(err, Error::EmptyFrame));
    }
}
