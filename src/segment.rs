//! Streaming Segment writer.
//!
//! Encoding a whole [`Segment`](crate::master::Segment) in one shot (as its
//! [`Element`] impl does) requires every cluster to already be in memory.
//! `SegmentWrite` instead streams a segment's children straight to the
//! output as they become available, using an 8-byte reserved size vint for
//! the segment body (the same [`TwoPhaseWrite`] mechanism
//! [`FileCluster`](crate::cluster::FileCluster) uses) and padding the
//! `Info` element and seek head with `Void` so their final, fully-known
//! values can be back-patched in place without shifting anything written
//! after them.

use crate::base::{Header, VInt64};
use crate::cluster::FileCluster;
use crate::element::{Element, TwoPhaseWrite};
use crate::error::Error;
use crate::frame::ClusterBlock;
use crate::functional::*;
use crate::io::Sink;
use crate::io::blocking::WriteTo;
use crate::master::{Attachments, Info, Segment, SeekHead, Tracks};
use crate::supplement::Void;
use std::io::{Seek, SeekFrom, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteState {
    Writing,
    Finalised,
}

/// Compute the `Void` body size that pads `without_void` already-encoded
/// bytes up to exactly `reserved` total bytes, accounting for the void
/// element's own id+size overhead. `Ok(None)` means no padding is needed.
///
/// The overhead depends on the void body's own vint width, which is itself
/// a function of the body size being solved for; this converges by
/// iterating a handful of times, since the width only takes one of eight
/// discrete values.
fn fill_void(without_void: usize, reserved: u64, id: VInt64) -> crate::Result<Option<Void>> {
    let without_void = without_void as u64;
    if without_void > reserved {
        return Err(Error::BodySizeOverflow { id });
    }
    let gap = reserved - without_void;
    if gap == 0 {
        return Ok(None);
    }
    let mut body = gap.saturating_sub(2);
    for _ in 0..16 {
        let overhead = 1 + VInt64::encode_size(body) as u64;
        if gap <= overhead {
            return Err(Error::BodySizeOverflow { id });
        }
        let candidate = gap - overhead;
        if candidate == body {
            return Ok(Some(Void { size: candidate }));
        }
        body = candidate;
    }
    Err(Error::BodySizeOverflow { id })
}

/// (Re-)write `info` at stream offset `at`, as a fixed-width element of
/// exactly `reserved` body bytes (header + `reserved` never changes size
/// between the initial and the finalising call), padding the gap with a
/// trailing `Void`.
fn write_padded_info<W: Sink>(w: &mut W, at: u64, info: &Info, reserved: u64) -> crate::Result<()> {
    let mut info = info.clone();
    info.void = None;
    let mut body = Vec::new();
    info.encode_body(&mut body)?;
    let void = fill_void(body.len(), reserved, Info::ID)?;

    w.seek(SeekFrom::Start(at))?;
    Header {
        id: Info::ID,
        size: VInt64::new(reserved),
    }
    .write_to(w)?;
    w.write_all(&body)?;
    if let Some(v) = void {
        v.write_to(w)?;
    }
    Ok(())
}

/// The streaming state machine behind a [`Segment`]'s write: start, push
/// clusters as they're written, finish.
///
/// This type doesn't own the output stream (every method takes it
/// explicitly), matching [`FileCluster`]'s style; [`SegmentWriter`] wraps
/// it in an RAII guard that does own the stream, for callers who want
/// finalisation to happen automatically on drop.
#[derive(Debug)]
pub struct SegmentWrite {
    state: WriteState,
    write: TwoPhaseWrite,
    segment_data_start: u64,
    seek_head_at: u64,
    seek_head_reserved: u64,
    info_at: u64,
    info_reserved: u64,
    tracks_at: u64,
    attachments_at: Option<u64>,
    first_cluster_at: Option<u64>,
}

impl SegmentWrite {
    /// Begin streaming a segment to `w`.
    ///
    /// Writes the segment ID and reserved size placeholder, a `Void`
    /// reservation for the seek head, the padded `Info`, `Tracks`, and the
    /// optional `Attachments`, in that order.
    /// `reserved_seek_head_bytes` and `reserved_info_padding` bound how
    /// large the finalised seek head and `Info` may grow to; exceeding
    /// either fails finalisation with [`Error::BodySizeOverflow`].
    pub fn start_write<W: Sink>(
        w: &mut W,
        info: &Info,
        tracks: &Tracks,
        attachments: Option<&Attachments>,
        reserved_seek_head_bytes: u64,
        reserved_info_padding: u64,
    ) -> crate::Result<Self> {
        let write = TwoPhaseWrite::start(w, Segment::ID)?;
        let segment_data_start = write.body_start_at();

        let seek_head_at = w.stream_position()?;
        if let Some(placeholder) = fill_void(0, reserved_seek_head_bytes, SeekHead::ID)? {
            placeholder.write_to(w)?;
        }

        let info_at = w.stream_position()?;
        write_padded_info(w, info_at, info, reserved_info_padding)?;

        let tracks_at = w.stream_position()?;
        tracks.write_to(w)?;

        let attachments_at = match attachments {
            Some(a) => {
                let at = w.stream_position()?;
                a.write_to(w)?;
                Some(at)
            }
            None => None,
        };

        Ok(Self {
            state: WriteState::Writing,
            write,
            segment_data_start,
            seek_head_at,
            seek_head_reserved: reserved_seek_head_bytes,
            info_at,
            info_reserved: reserved_info_padding,
            tracks_at,
            attachments_at,
            first_cluster_at: None,
        })
    }

    /// Whether this segment is still accepting writes.
    pub fn is_writing(&self) -> bool {
        self.state == WriteState::Writing
    }

    /// Record a cluster's absolute stream position for the seek head. Only
    /// the first call's position is kept, so a reader can jump straight to
    /// tracks and the first cluster without indexing every one.
    pub fn push_cluster(&mut self, cluster_absolute_position: u64) -> crate::Result<()> {
        if self.state != WriteState::Writing {
            return Err(Error::NotWriting);
        }
        if self.first_cluster_at.is_none() {
            self.first_cluster_at = Some(cluster_absolute_position - self.segment_data_start);
        }
        Ok(())
    }

    /// Finalise: back-patch `Info` with its final values, rebuild the seek
    /// head from the recorded offsets, and back-patch the segment's body
    /// size. `w`'s position must be at the true end of the document (i.e.
    /// just past the last cluster written).
    pub fn finish_write<W: Sink>(&mut self, w: &mut W, final_info: Info) -> crate::Result<()> {
        if self.state != WriteState::Writing {
            return Err(Error::NotWriting);
        }
        let end = w.stream_position()?;

        write_padded_info(w, self.info_at, &final_info, self.info_reserved)?;

        let mut seek_head = SeekHead::default();
        seek_head.insert(Info::ID, self.info_at - self.segment_data_start);
        seek_head.insert(Tracks::ID, self.tracks_at - self.segment_data_start);
        if let Some(at) = self.attachments_at {
            seek_head.insert(Attachments::ID, at - self.segment_data_start);
        }
        if let Some(at) = self.first_cluster_at {
            seek_head.insert(crate::master::MemoryCluster::ID, at);
        }
        let mut sh_bytes = Vec::new();
        seek_head.encode(&mut sh_bytes)?;
        let trailing_void = fill_void(sh_bytes.len(), self.seek_head_reserved, SeekHead::ID)?;

        w.seek(SeekFrom::Start(self.seek_head_at))?;
        w.write_all(&sh_bytes)?;
        if let Some(v) = trailing_void {
            v.write_to(w)?;
        }

        w.seek(SeekFrom::Start(end))?;
        self.write.finish(w)?;
        self.state = WriteState::Finalised;
        Ok(())
    }
}

/// Scoped RAII guard around [`SegmentWrite`]: starts writing on
/// construction and calls `finish_write` on drop if still in the Writing
/// state, with whatever `Info` was last supplied via
/// [`SegmentWriter::set_final_info`] (the segment's original `Info` if
/// never updated).
pub struct SegmentWriter<'w, W: Sink> {
    w: &'w mut W,
    write: SegmentWrite,
    final_info: Info,
}

impl<'w, W: Sink> SegmentWriter<'w, W> {
    /// Begin streaming a segment to `w`, matching [`SegmentWrite::start_write`].
    pub fn start(
        w: &'w mut W,
        info: Info,
        tracks: &Tracks,
        attachments: Option<&Attachments>,
        reserved_seek_head_bytes: u64,
        reserved_info_padding: u64,
    ) -> crate::Result<Self> {
        let write = SegmentWrite::start_write(
            w,
            &info,
            tracks,
            attachments,
            reserved_seek_head_bytes,
            reserved_info_padding,
        )?;
        Ok(Self {
            w,
            write,
            final_info: info,
        })
    }

    /// Update the `Info` to back-patch in at finalisation (notably
    /// `duration`, unknown until all clusters are written).
    pub fn set_final_info(&mut self, info: Info) {
        self.final_info = info;
    }

    /// Start a cluster as a child of this segment, recording its position
    /// for the seek head. The returned guard must be driven to completion
    /// (explicitly via `finish`, or implicitly on drop) before starting
    /// another cluster.
    pub fn write_cluster(&mut self, timestamp: u64) -> crate::Result<ClusterWriter<'_, W>> {
        let started_at = self.w.stream_position()?;
        self.write.push_cluster(started_at)?;
        ClusterWriter::start(&mut *self.w, timestamp)
    }

    /// Finalise explicitly, observing the result (as opposed to letting
    /// `Drop` swallow it).
    pub fn finish(mut self) -> crate::Result<()> {
        let info = self.final_info.clone();
        self.write.finish_write(self.w, info)
    }
}

impl<W: Sink> Drop for SegmentWriter<'_, W> {
    fn drop(&mut self) {
        if self.write.is_writing() {
            let _ = self.write.finish_write(self.w, self.final_info.clone());
        }
    }
}

/// Scoped RAII guard around [`FileCluster`]: starts writing on
/// construction and calls `finish_write` on drop if still in the Writing
/// state, so a panic or early return between `start_write` and
/// `finish_write` can't leave a cluster's reserved size un-patched.
pub struct ClusterWriter<'w, W: Sink> {
    w: &'w mut W,
    cluster: FileCluster,
    started_at: u64,
}

impl<'w, W: Sink> ClusterWriter<'w, W> {
    /// Start writing a new cluster with the given timestamp to `w`.
    pub fn start(w: &'w mut W, timestamp: u64) -> crate::Result<Self> {
        let started_at = w.stream_position()?;
        let mut cluster = FileCluster::new(timestamp);
        cluster.start_write(w)?;
        Ok(Self {
            w,
            cluster,
            started_at,
        })
    }

    /// The stream position at which this cluster's element began.
    pub fn started_at(&self) -> u64 {
        self.started_at
    }

    /// Append one block to the cluster.
    pub fn push_back(&mut self, block: impl Into<ClusterBlock>) -> crate::Result<()> {
        self.cluster.push_back(self.w, block)
    }

    /// Recover from a partial write failure during `push_back`.
    pub fn recover(&mut self) -> crate::Result<()> {
        self.cluster.recover(self.w)
    }

    /// Finalise explicitly, observing the result.
    pub fn finish(mut self) -> crate::Result<()> {
        self.cluster.finish_write(self.w)
    }
}

impl<W: Sink> Drop for ClusterWriter<'_, W> {
    fn drop(&mut self) {
        if self.cluster.is_writing() {
            let _ = self.cluster.finish_write(self.w);
        }
    }
}
