//! Streaming (file-backed) cluster writer and reader.
//!
//! [`MemoryCluster`](crate::master::MemoryCluster) materializes every block
//! up front; `FileCluster` instead streams blocks straight to (or from) a
//! live `Read + Write + Seek` byte stream, one at a time, at the cost of a
//! slower per-block lookup. Both share the same `0x1F43B675` on-wire
//! representation, so a document written with one can be read back with
//! the other.

use crate::base::Header;
use crate::element::{Element, TwoPhaseWrite};
use crate::error::Error;
use crate::frame::ClusterBlock;
use crate::io::Sink;
use crate::io::blocking::{ReadElement, ReadFrom, WriteTo};
use crate::leaf::{PrevSize, Position, SimpleBlock, Timestamp};
use crate::master::{BlockGroup, MemoryCluster};
use std::io::{Read, Seek, SeekFrom};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteState {
    Idle,
    Writing,
    Finalised,
}

/// Recorded location of one block inside a `FileCluster` that was opened
/// for reading: its header (so the reader knows which variant to decode
/// without re-reading bytes) and the stream offset of the header itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockOffset {
    header: Header,
    offset: u64,
}

/// A file-backed Cluster that streams its blocks instead of holding them in memory.
///
/// This stores only the cluster's metadata in memory. When reading, each
/// block is left in the file until [`FileCluster::blocks`] dereferences it.
/// When writing, blocks are pushed straight to the stream as they become
/// available via [`FileCluster::push_back`].
#[derive(Debug)]
pub struct FileCluster {
    timestamp: u64,
    position: Option<u64>,
    prev_size: Option<u64>,
    state: WriteState,
    write: Option<TwoPhaseWrite>,
    last_good: u64,
    block_offsets: Vec<BlockOffset>,
}

impl FileCluster {
    /// Construct a new, not-yet-written cluster with the given timestamp.
    pub fn new(timestamp: u64) -> Self {
        Self {
            timestamp,
            position: None,
            prev_size: None,
            state: WriteState::Idle,
            write: None,
            last_good: 0,
            block_offsets: Vec::new(),
        }
    }

    /// This cluster's timestamp, in the timescale of the enclosing
    /// Segment's `Info::timestamp_scale`.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// This cluster's Segment-relative byte position, if known (populated
    /// by [`FileCluster::open`], never set by the writer side).
    pub fn position(&self) -> Option<u64> {
        self.position
    }

    /// Whether [`FileCluster::push_back`] would currently succeed.
    pub fn is_writing(&self) -> bool {
        self.state == WriteState::Writing
    }

    /// Begin streaming this cluster to `w`: Idle -> Writing.
    ///
    /// Emits the cluster ID, an 8-byte-wide reserved size vint, and the
    /// `Timestamp` child, then records the stream position for later
    /// `push_back` calls.
    pub fn start_write<W: Sink>(&mut self, w: &mut W) -> crate::Result<()> {
        if self.state != WriteState::Idle {
            return Err(Error::NotWriting);
        }
        let write = TwoPhaseWrite::start(w, MemoryCluster::ID)?;
        Timestamp(self.timestamp).write_to(w)?;
        self.last_good = w.stream_position()?;
        self.write = Some(write);
        self.state = WriteState::Writing;
        Ok(())
    }

    /// Append one block, writing it immediately to `w`. Valid only while
    /// `Writing`.
    pub fn push_back<W: Sink>(
        &mut self,
        w: &mut W,
        block: impl Into<ClusterBlock>,
    ) -> crate::Result<()> {
        if self.state != WriteState::Writing {
            return Err(Error::NotWriting);
        }
        block.into().write_to(w)?;
        self.last_good = w.stream_position()?;
        Ok(())
    }

    /// Recover from a partial write failure during `push_back` by seeking
    /// `w` back to the offset just after the last fully-written block,
    /// discarding whatever incomplete tail was left on the wire.
    pub fn recover<W: Sink>(&self, w: &mut W) -> crate::Result<()> {
        if self.state != WriteState::Writing {
            return Err(Error::NotWriting);
        }
        w.seek(SeekFrom::Start(self.last_good))?;
        Ok(())
    }

    /// Back-patch the reserved body size: Writing -> Finalised. Seeks `w`
    /// back to just past the body, ready for a sibling element.
    pub fn finish_write<W: Sink>(&mut self, w: &mut W) -> crate::Result<()> {
        let write = match (&self.write, self.state) {
            (Some(write), WriteState::Writing) => write,
            _ => return Err(Error::NotWriting),
        };
        write.finish(w)?;
        self.write = None;
        self.state = WriteState::Finalised;
        Ok(())
    }

    /// Open an already-written cluster for reading: scans the body for
    /// child headers, recording each block's offset without reading its
    /// bytes, and decoding the small metadata children eagerly.
    ///
    /// `r` must be positioned at the start of the cluster's body (i.e.
    /// just after `header` was read).
    pub fn open<R: Read + Seek>(header: &Header, r: &mut R) -> crate::Result<Self> {
        if header.id != MemoryCluster::ID {
            return Err(Error::InvalidChildId {
                child: header.id,
                parent: MemoryCluster::ID,
                position: 0,
            });
        }
        if header.size.is_unknown {
            return Err(Error::ElementBodySizeUnknown(header.id));
        }
        let body_end = r.stream_position()? + *header.size;

        let mut timestamp = None;
        let mut position = None;
        let mut prev_size = None;
        let mut block_offsets = Vec::new();

        while r.stream_position()? < body_end {
            let child_start = r.stream_position()?;
            let child_header = Header::read_from(r)?;
            match child_header.id {
                Timestamp::ID => {
                    timestamp = Some(Timestamp::read_element(&child_header, r)?);
                }
                Position::ID => {
                    position = Some(Position::read_element(&child_header, r)?);
                }
                PrevSize::ID => {
                    prev_size = Some(PrevSize::read_element(&child_header, r)?);
                }
                SimpleBlock::ID | BlockGroup::ID => {
                    block_offsets.push(BlockOffset {
                        header: child_header,
                        offset: child_start,
                    });
                    r.seek(SeekFrom::Current(*child_header.size as i64))?;
                }
                _ => {
                    log::warn!(
                        "Skipped unknown child {} in file cluster at position {}",
                        child_header.id,
                        child_start
                    );
                    r.seek(SeekFrom::Current(*child_header.size as i64))?;
                }
            }
        }

        let timestamp = timestamp.ok_or(Error::MissingElement(Timestamp::ID))?;
        Ok(Self {
            timestamp: *timestamp,
            position: position.map(|p| *p),
            prev_size: prev_size.map(|p| *p),
            state: WriteState::Finalised,
            write: None,
            last_good: 0,
            block_offsets,
        })
    }

    /// The number of blocks recorded by [`FileCluster::open`].
    ///
    /// Always `0` for a cluster that was constructed with `new` and never
    /// opened for reading, regardless of how many blocks were pushed to
    /// it, since the writer side does not keep its own blocks in memory.
    pub fn block_count(&self) -> usize {
        self.block_offsets.len()
    }

    /// Whether `open` recorded no blocks.
    pub fn is_empty(&self) -> bool {
        self.block_offsets.is_empty()
    }

    /// A forward iterator over this cluster's blocks, reading each one
    /// from `r` at its recorded offset as the iterator advances.
    pub fn blocks<'r, R: Read + Seek>(
        &'r self,
        r: &'r mut R,
    ) -> impl Iterator<Item = crate::Result<ClusterBlock>> + 'r {
        self.block_offsets.iter().map(move |block| -> crate::Result<ClusterBlock> {
            r.seek(SeekFrom::Start(block.offset))?;
            match block.header.id {
                SimpleBlock::ID => Ok(ClusterBlock::Simple(SimpleBlock::read_element(
                    &block.header,
                    r,
                )?)),
                BlockGroup::ID => Ok(ClusterBlock::Group(BlockGroup::read_element(
                    &block.header,
                    r,
                )?)),
                _ => unreachable!("block_offsets only ever records Simple/Group block ids"),
            }
        })
    }
}
