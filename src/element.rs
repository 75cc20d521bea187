use crate::base::*;
use crate::error::Error;
use crate::functional::*;
use crate::io::Sink;
use crate::io::blocking::ReadFrom;

/// A full EBML element: a stable ID plus an in-memory body codec.
///
/// This is the single-pass case — decode and encode a complete body in one
/// call. Streaming writers that need to reserve a size field and back-patch
/// it later (clusters, segments) use [`TwoPhaseWrite`] instead, built on top
/// of the same `encode_body`.
pub trait Element: Sized {
    /// The element's EBML ID.
    const ID: VInt64;
    /// Whether a missing occurrence of this element implies a documented
    /// default value rather than an error.
    const HAS_DEFAULT_VALUE: bool = false;
    /// Decode this element's body (the bytes after id+size) from a buffer.
    fn decode_body(buf: &mut &[u8]) -> crate::Result<Self>;
    /// Encode this element's body to a buffer.
    fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()>;
}

impl<T: Element> Decode for T {
    fn decode(buf: &mut &[u8]) -> crate::Result<Self> {
        let header = Header::decode(buf)?;
        if header.id != Self::ID {
            return Err(Error::InvalidChildId {
                child: header.id,
                parent: Self::ID,
                position: 0,
            });
        }
        T::decode_element(&header, buf)
    }
}

impl<T: Element> Encode for T {
    fn encode<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
        let mut body_buf = Vec::new();
        self.encode_body(&mut body_buf)?;
        let header = Header {
            id: T::ID,
            size: VInt64::new(body_buf.len() as u64),
        };
        header.encode(buf)?;
        buf.append_slice(&body_buf);
        Ok(())
    }
}

impl<T: Element> ReadFrom for T {
    fn read_from<R: std::io::Read>(r: &mut R) -> crate::Result<Self> {
        let header = Header::read_from(r)?;
        let body = header.read_body(r)?;
        match T::decode_body(&mut &body[..]) {
            Ok(e) => Ok(e),
            Err(Error::OutOfBounds) => Err(Error::OverDecode(Self::ID)),
            Err(Error::ShortRead) => Err(Error::UnderDecode(Self::ID)),
            Err(e) => Err(e),
        }
    }
}

/// Reserved width, in bytes, of the size vint a two-phase writer leaves for
/// itself to back-patch (8 bytes holds any `u64` body size).
pub const RESERVED_SIZE_WIDTH: usize = 8;

/// A started-but-not-finished write of an element whose final body size is
/// not known upfront.
///
/// This mirrors the `start_write`/`finish_write` pair of the original
/// CRTP element base: `start_write` records where the size vint landed and
/// writes a reserved-width placeholder; callers then stream body content
/// directly to the same sink; `finish_write` seeks back and overwrites the
/// placeholder with the true size, preserving its reserved width so nothing
/// downstream shifts.
pub struct TwoPhaseWrite {
    /// Stream offset of the first byte of the size vint.
    size_field_at: u64,
    /// Stream offset of the first byte of the body.
    body_start_at: u64,
}

impl TwoPhaseWrite {
    /// Begin a two-phase write: write `id` followed by a reserved-width
    /// placeholder size, and record offsets for the later back-patch.
    pub fn start<W: Sink>(w: &mut W, id: VInt64) -> crate::Result<Self> {
        write_through(w, |sink| id.encode(sink))?;
        let size_field_at = w.stream_position()?;
        write_through(w, |sink| {
            VInt64::new(0).encode_sized(sink, Some(RESERVED_SIZE_WIDTH))
        })?;
        let body_start_at = w.stream_position()?;
        Ok(Self {
            size_field_at,
            body_start_at,
        })
    }

    /// Back-patch the true body size now that every byte of the body has
    /// been written to `w`. `w`'s stream position after this call is
    /// restored to just past the body, ready for a sibling element.
    pub fn finish<W: Sink>(&self, w: &mut W) -> crate::Result<()> {
        let end = w.stream_position()?;
        let body_len = end - self.body_start_at;
        w.seek(std::io::SeekFrom::Start(self.size_field_at))?;
        write_through(w, |sink| {
            VInt64::new(body_len).encode_sized(sink, Some(RESERVED_SIZE_WIDTH))
        })?;
        w.seek(std::io::SeekFrom::Start(end))?;
        Ok(())
    }

    /// Offset of the first byte of this element's body, for callers that
    /// need to record a seek-head entry.
    pub fn body_start_at(&self) -> u64 {
        self.body_start_at
    }
}

/// Run `f` against a [`SinkBuf`] wrapping `w`, then surface any I/O error
/// `f` swallowed as `()` through [`BufMut::append_slice`]'s infallible
/// signature.
fn write_through<W: Sink>(
    w: &mut W,
    f: impl FnOnce(&mut SinkBuf<'_, W>) -> crate::Result<()>,
) -> crate::Result<()> {
    let mut sink = SinkBuf::new(w);
    f(&mut sink)?;
    sink.into_result()
}

/// Adapts a [`Sink`] to [`BufMut`] so [`Encode`] impls can write straight
/// through to a file/stream during a two-phase write.
///
/// Only `append_slice` is ever exercised here: the vint/primitive `Encode`
/// impls used during `start`/`finish` never need the random-access
/// `set_slice`/`offset_within` operations that back-patching at the
/// in-memory `Vec<u8>` level relies on. `BufMut::append_slice` itself
/// returns `()`, so a real write failure from the underlying stream is
/// captured in `error` instead of being dropped, and surfaced afterward via
/// [`SinkBuf::into_result`].
struct SinkBuf<'a, W: Sink> {
    inner: &'a mut W,
    error: Option<std::io::Error>,
}

impl<'a, W: Sink> SinkBuf<'a, W> {
    fn new(inner: &'a mut W) -> Self {
        Self { inner, error: None }
    }

    fn into_result(self) -> crate::Result<()> {
        match self.error {
            Some(e) => Err(Error::Io(e)),
            None => Ok(()),
        }
    }
}

impl<W: Sink> std::fmt::Debug for SinkBuf<'_, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SinkBuf")
    }
}

impl<W: Sink> BufMut for SinkBuf<'_, W> {
    fn len(&self) -> usize {
        0
    }
    fn append_slice(&mut self, val: &[u8]) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = std::io::Write::write_all(self.inner, val) {
            self.error = Some(e);
        }
    }
    fn set_slice(&mut self, _pos: usize, _val: &[u8]) {
        unreachable!("SinkBuf does not support random-access overwrite")
    }
    fn offset_within(&mut self, _src: impl std::ops::RangeBounds<usize>, _offset: usize) {
        unreachable!("SinkBuf does not support random-access overwrite")
    }
}
