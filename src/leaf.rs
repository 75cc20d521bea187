//! Leaf (non-master) elements.
//!
//! Each of these used to come from a `build.rs` step that read a Matroska
//! schema XML and generated one struct per element. That XML asset isn't
//! available here, and fabricating it would mean inventing a dependency, so
//! the generated types are hand-written instead, using macros that follow
//! the same per-kind encoding rules the generator used: unsigned/signed
//! integers are minimum-width two's complement (`crate::ebml_int`), floats
//! are 0/4/8 bytes, text is UTF-8 right-padded with NUL bytes to a settable
//! minimum length, dates are an 8-byte nanosecond offset from
//! 2001-01-01T00:00:00Z, and binary is raw bytes.

use crate::element::Element;
use crate::error::Error;
use crate::functional::{Buf, BufMut, Decode};
use crate::{base::VInt64, ebml_int};
use std::ops::Deref;

macro_rules! unsigned_element {
    ($(#[$meta:meta])* $name:ident = $id:expr) => {
        unsigned_element!(@def $(#[$meta])* $name = $id, default = 0u64, has_default = false);
    };
    ($(#[$meta:meta])* $name:ident = $id:expr, default = $default:expr) => {
        unsigned_element!(@def $(#[$meta])* $name = $id, default = $default, has_default = true);
    };
    (@def $(#[$meta:meta])* $name:ident = $id:expr, default = $default:expr, has_default = $has_default:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);
        impl Deref for $name {
            type Target = u64;
            fn deref(&self) -> &u64 { &self.0 }
        }
        impl Default for $name {
            fn default() -> Self { Self($default) }
        }
        impl Element for $name {
            const ID: VInt64 = VInt64::from_encoded($id);
            const HAS_DEFAULT_VALUE: bool = $has_default;
            fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
                let body = *buf;
                buf.advance(body.len());
                Ok(Self(ebml_int::decode_u(body)?))
            }
            fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
                ebml_int::encode_u(self.0, buf)
            }
        }
    };
}

macro_rules! signed_element {
    ($(#[$meta:meta])* $name:ident = $id:expr) => {
        signed_element!(@def $(#[$meta])* $name = $id, default = 0i64, has_default = false);
    };
    ($(#[$meta:meta])* $name:ident = $id:expr, default = $default:expr) => {
        signed_element!(@def $(#[$meta])* $name = $id, default = $default, has_default = true);
    };
    (@def $(#[$meta:meta])* $name:ident = $id:expr, default = $default:expr, has_default = $has_default:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub i64);
        impl Deref for $name {
            type Target = i64;
            fn deref(&self) -> &i64 { &self.0 }
        }
        impl Default for $name {
            fn default() -> Self { Self($default) }
        }
        impl Element for $name {
            const ID: VInt64 = VInt64::from_encoded($id);
            const HAS_DEFAULT_VALUE: bool = $has_default;
            fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
                let body = *buf;
                buf.advance(body.len());
                Ok(Self(ebml_int::decode_s(body)?))
            }
            fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
                ebml_int::encode_s(self.0, buf)
            }
        }
    };
}

macro_rules! float_element {
    ($(#[$meta:meta])* $name:ident = $id:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
        pub struct $name(pub f64);
        impl Deref for $name {
            type Target = f64;
            fn deref(&self) -> &f64 { &self.0 }
        }
        impl Default for $name {
            fn default() -> Self { Self(0.0) }
        }
        impl Element for $name {
            const ID: VInt64 = VInt64::from_encoded($id);
            fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
                match buf.len() {
                    0 => { buf.advance(0); Ok(Self(0.0)) }
                    4 => {
                        let v = f32::from_be_bytes(<[u8; 4]>::decode(buf)?);
                        Ok(Self(v as f64))
                    }
                    8 => {
                        let v = f64::from_be_bytes(<[u8; 8]>::decode(buf)?);
                        Ok(Self(v))
                    }
                    n => Err(Error::BadElementLength { id: Self::ID, observed: n, allowed: &[0, 4, 8] }),
                }
            }
            fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
                // Use the narrower 4-byte form when it round-trips exactly.
                if self.0 as f32 as f64 == self.0 {
                    buf.append_slice(&(self.0 as f32).to_be_bytes());
                } else {
                    buf.append_slice(&self.0.to_be_bytes());
                }
                Ok(())
            }
        }
    };
}

macro_rules! text_element {
    ($(#[$meta:meta])* $name:ident = $id:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name {
            /// The text value, already stripped of any trailing NUL padding.
            pub value: String,
            /// Minimum on-wire body length; `value` is padded on the right
            /// with 0x00 up to this many bytes. Set to the body length
            /// observed on read, so re-encoding preserves it.
            pub padding: usize,
        }
        impl $name {
            /// Build a value with no padding beyond its own UTF-8 length.
            pub fn new(value: impl Into<String>) -> Self {
                Self { value: value.into(), padding: 0 }
            }
        }
        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str { &self.value }
        }
        impl Element for $name {
            const ID: VInt64 = VInt64::from_encoded($id);
            fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
                let body = *buf;
                buf.advance(body.len());
                let trimmed = match body.iter().position(|&b| b == 0) {
                    Some(i) => &body[..i],
                    None => body,
                };
                let s = std::str::from_utf8(trimmed)
                    .map_err(|_| Error::ValueOutOfRange { id: Self::ID })?;
                Ok(Self { value: s.to_owned(), padding: body.len() })
            }
            fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
                let bytes = self.value.as_bytes();
                buf.append_slice(bytes);
                let target = self.padding.max(bytes.len());
                if target > bytes.len() {
                    buf.append_slice(&vec![0u8; target - bytes.len()]);
                }
                Ok(())
            }
        }
    };
}

macro_rules! binary_element {
    ($(#[$meta:meta])* $name:ident = $id:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub Vec<u8>);
        impl Deref for $name {
            type Target = [u8];
            fn deref(&self) -> &[u8] { &self.0 }
        }
        impl Element for $name {
            const ID: VInt64 = VInt64::from_encoded($id);
            fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
                let body = buf.to_vec();
                buf.advance(body.len());
                Ok(Self(body))
            }
            fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
                buf.append_slice(&self.0);
                Ok(())
            }
        }
    };
}

/// The offset, in seconds, of the Matroska date epoch (2001-01-01T00:00:00Z)
/// from the Unix epoch.
const DATE_EPOCH_UNIX_SECONDS: i64 = 978_307_200;

fn date_epoch() -> time::OffsetDateTime {
    time::OffsetDateTime::from_unix_timestamp(DATE_EPOCH_UNIX_SECONDS)
        .expect("constant epoch is in range")
}

macro_rules! date_element {
    ($(#[$meta:meta])* $name:ident = $id:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name(pub time::OffsetDateTime);
        impl Default for $name {
            fn default() -> Self { Self(date_epoch()) }
        }
        impl Deref for $name {
            type Target = time::OffsetDateTime;
            fn deref(&self) -> &time::OffsetDateTime { &self.0 }
        }
        impl Element for $name {
            const ID: VInt64 = VInt64::from_encoded($id);
            fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
                let n = buf.len();
                if n != 8 {
                    return Err(Error::BadElementLength { id: Self::ID, observed: n, allowed: &[8] });
                }
                let ns = i64::from_be_bytes(<[u8; 8]>::decode(buf)?);
                Ok(Self(date_epoch() + time::Duration::nanoseconds(ns)))
            }
            fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
                let ns = (self.0 - date_epoch()).whole_nanoseconds() as i64;
                buf.append_slice(&ns.to_be_bytes());
                Ok(())
            }
        }
    };
}

// --- EBML header elements ---

unsigned_element!(
    /// The version of EBML used in this document.
    EbmlVersion = 0x4286,
    default = 1
);
unsigned_element!(
    /// The minimum EBML version a parser needs to support to read this document.
    EbmlReadVersion = 0x42F7,
    default = 1
);
unsigned_element!(
    /// The maximum encoded width, in bytes, of any element ID in this document.
    EbmlMaxIdLength = 0x42F2,
    default = 4
);
unsigned_element!(
    /// The maximum encoded width, in bytes, of any element size in this document.
    EbmlMaxSizeLength = 0x42F3,
    default = 8
);
text_element!(
    /// The document type identifier, e.g. "matroska" or "webm".
    DocType = 0x4282
);
unsigned_element!(
    /// The version of the document type.
    DocTypeVersion = 0x4287,
    default = 1
);
unsigned_element!(
    /// The minimum document type version a parser needs to read this document.
    DocTypeReadVersion = 0x4285,
    default = 1
);

// --- SeekHead / Seek ---

binary_element!(
    /// The EBML ID of the Top-Level Element this entry points to.
    SeekId = 0x53AB
);
unsigned_element!(
    /// Segment-relative byte offset of the Top-Level Element this entry points to.
    SeekPosition = 0x53AC
);

// --- Segment Info ---

binary_element!(
    /// Unique ID identifying this Segment (128 bits).
    SegmentUuid = 0x73A4
);
text_element!(
    /// Filename corresponding to this Segment.
    SegmentFilename = 0x7384
);
binary_element!(
    /// Unique ID of the previous Segment of a Linked Segment.
    PrevUuid = 0x3CB923
);
text_element!(
    /// Filename of the previous Segment of a Linked Segment.
    PrevFilename = 0x3C83AB
);
binary_element!(
    /// Unique ID of the next Segment of a Linked Segment.
    NextUuid = 0x3EB923
);
text_element!(
    /// Filename of the next Segment of a Linked Segment.
    NextFilename = 0x3E83BB
);
binary_element!(
    /// Unique ID shared by every Segment of a Linked Segment.
    SegmentFamily = 0x4444
);
binary_element!(
    /// Chapter-codec-specific identifier for this Segment.
    ChapterTranslateId = 0x69A5
);
unsigned_element!(
    /// The chapter codec this `ChapterTranslate` applies to.
    ChapterTranslateCodec = 0x69BF
);
unsigned_element!(
    /// A chapter edition UID this `ChapterTranslate` applies to.
    ChapterTranslateEditionUid = 0x69FC
);
unsigned_element!(
    /// Base unit, in nanoseconds, for Segment Ticks and Track Ticks.
    TimestampScale = 0x2AD7B1,
    default = 1_000_000
);
float_element!(
    /// Duration of the Segment, in Segment Ticks.
    Duration = 0x4489
);
date_element!(
    /// The date and time the Segment was created.
    DateUtc = 0x4461
);
text_element!(
    /// General name of the Segment.
    Title = 0x7BA9
);
text_element!(
    /// Muxing application or library that created this Segment.
    MuxingApp = 0x4D80
);
text_element!(
    /// Writing application that created this Segment.
    WritingApp = 0x5741
);

// --- Cluster / Block ---

unsigned_element!(
    /// Absolute timestamp of the Cluster.
    Timestamp = 0xE7
);
unsigned_element!(
    /// Segment-relative byte position of this Cluster.
    Position = 0xA7
);
unsigned_element!(
    /// Size, in bytes, of the previous Cluster.
    PrevSize = 0xAB
);
binary_element!(
    /// A laced or unlaced Block with no extra BlockGroup metadata.
    SimpleBlock = 0xA3
);
binary_element!(
    /// A laced or unlaced Block, the payload of a BlockGroup.
    Block = 0xA1
);
unsigned_element!(
    /// Cache priority of the frame(s) in this BlockGroup.
    ReferencePriority = 0xFA,
    default = 0
);
signed_element!(
    /// Timestamp, relative to this Block, of another frame this Block depends on.
    ReferenceBlock = 0xFB
);
binary_element!(
    /// Codec-private state to apply starting at this Block.
    CodecState = 0xA4
);
signed_element!(
    /// Duration of silence added to this Block's decoded output, in nanoseconds.
    DiscardPadding = 0x75A2
);
unsigned_element!(
    /// Duration of the Block, in Track Ticks.
    BlockDuration = 0x9B
);
binary_element!(
    /// Codec-interpreted additional data for a Block.
    BlockAdditional = 0xA5
);
unsigned_element!(
    /// Identifies how to interpret a BlockAdditional's data.
    BlockAddId = 0xEE,
    default = 1
);

// --- Tracks ---

unsigned_element!(
    /// The track number referenced by Blocks belonging to this track.
    TrackNumber = 0xD7
);
unsigned_element!(
    /// A unique ID for this track (128 bits' worth of entropy recommended).
    TrackUid = 0x73C5
);
unsigned_element!(
    /// The track's media type.
    TrackType = 0x83
);
unsigned_element!(
    /// Whether the track is usable during playback.
    FlagEnabled = 0xB9,
    default = 1
);
unsigned_element!(
    /// Whether this track is eligible for automatic selection by a player.
    FlagDefault = 0x88,
    default = 1
);
unsigned_element!(
    /// Whether this track was forced to be selected by the content creator.
    FlagForced = 0x55AA,
    default = 0
);
unsigned_element!(
    /// Whether Blocks on this track may be laced.
    FlagLacing = 0x9C,
    default = 1
);
text_element!(
    /// The language of this track, per RFC 5646/BCP 47 or ISO 639-2.
    Language = 0x22B59C
);
text_element!(
    /// An ID identifying the codec used for this track.
    CodecId = 0x86
);
binary_element!(
    /// Private codec-specific initialization data for this track.
    CodecPrivate = 0x63A2
);
unsigned_element!(
    /// Default duration, in nanoseconds, of a single frame on this track.
    DefaultDuration = 0x23E383
);
text_element!(
    /// A human-readable name for this track.
    Name = 0x536E
);

// --- Attachments ---

text_element!(
    /// A human-readable description of the attached file.
    FileDescription = 0x467E
);
text_element!(
    /// The attached file's filename.
    FileName = 0x466E
);
text_element!(
    /// The attached file's MIME type.
    FileMimeType = 0x4660
);
binary_element!(
    /// The attached file's raw content.
    FileData = 0x465C
);
unsigned_element!(
    /// A unique ID for this attached file.
    FileUid = 0x46AE
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_round_trip() {
        for &v in &[0u64, 1, 255, 256, u64::MAX] {
            let el = TrackNumber(v);
            let mut buf = vec![];
            el.encode_body(&mut buf).unwrap();
            let decoded = TrackNumber::decode_body(&mut &buf[..]).unwrap();
            assert_eq!(decoded.0, v);
        }
    }

    #[test]
    fn default_value_used_when_missing() {
        assert_eq!(EbmlVersion::default().0, 1);
        assert!(EbmlVersion::HAS_DEFAULT_VALUE);
        assert!(!TrackNumber::HAS_DEFAULT_VALUE);
    }

    #[test]
    fn text_trims_trailing_nul() {
        let decoded = DocType::decode_body(&mut &b"matroska\0"[..]).unwrap();
        assert_eq!(decoded.value, "matroska");
        assert_eq!(decoded.padding, 9);
    }

    #[test]
    fn text_padding_round_trips() {
        let el = DocType { value: "webm".to_string(), padding: 8 };
        let mut buf = vec![];
        el.encode_body(&mut buf).unwrap();
        assert_eq!(buf, b"webm\0\0\0\0");
        let decoded = DocType::decode_body(&mut &buf[..]).unwrap();
        assert_eq!(decoded, el);
    }

    #[test]
    fn text_new_has_no_padding() {
        let mut buf = vec![];
        DocType::new("matroska").encode_body(&mut buf).unwrap();
        assert_eq!(buf, b"matroska");
    }

    #[test]
    fn float_prefers_narrow_encoding() {
        let mut buf = vec![];
        Duration(1.5).encode_body(&mut buf).unwrap();
        assert_eq!(buf.len(), 4);
        let decoded = Duration::decode_body(&mut &buf[..]).unwrap();
        assert_eq!(decoded.0, 1.5);

        let mut buf = vec![];
        Duration(0.1).encode_body(&mut buf).unwrap();
        assert_eq!(buf.len(), 8);
    }

    #[test]
    fn date_round_trip_at_epoch() {
        let mut buf = vec![];
        DateUtc(date_epoch()).encode_body(&mut buf).unwrap();
        assert_eq!(buf, [0u8; 8]);
        let decoded = DateUtc::decode_body(&mut &buf[..]).unwrap();
        assert_eq!(decoded.0, date_epoch());
    }

    #[test]
    fn date_rejects_bad_length() {
        let err = DateUtc::decode_body(&mut &[0u8; 4][..]).unwrap_err();
        assert!(matches!(err, Error::BadElementLength { .. }));
    }
}
