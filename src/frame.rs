use crate::{
    block::BlockPayload,
    functional::Encode,
    leaf::SimpleBlock,
    master::{BlockGroup, MemoryCluster},
};

const FLAG_KEYFRAME: u8 = 0x80;
const FLAG_DISCARDABLE: u8 = 0x01;

/// A single decoded frame, delaced and resolved to an absolute timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The frame's encoded payload.
    pub data: Vec<u8>,
    /// whether the frame is a keyframe
    pub is_keyframe: bool,
    /// whether the frame is invisible (mostly for subtitle tracks)
    pub is_invisible: bool,
    /// whether the frame is discardable (for video tracks, e.g. non-reference frames)
    pub is_discardable: bool,
    /// track number the frame belongs to
    pub track_number: u64,
    /// timestamp of the frame, in the same timescale as the Cluster timestamp
    pub timestamp: i64,
}

/// A block in a Cluster, either a SimpleBlock or a BlockGroup.
///
/// This is a convenience enum to allow handling both types of blocks uniformly.
/// * when reading: often we just want to iterate over all blocks in a cluster, regardless of type.
/// * when writing: we may want to write a list of blocks of mixed types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterBlock {
    /// A SimpleBlock
    Simple(SimpleBlock),
    /// A BlockGroup
    Group(BlockGroup),
}

impl From<SimpleBlock> for ClusterBlock {
    fn from(b: SimpleBlock) -> Self {
        ClusterBlock::Simple(b)
    }
}
impl From<BlockGroup> for ClusterBlock {
    fn from(b: BlockGroup) -> Self {
        ClusterBlock::Group(b)
    }
}

impl Encode for ClusterBlock {
    fn encode<B: crate::functional::BufMut>(&self, buf: &mut B) -> crate::Result<()> {
        match self {
            ClusterBlock::Simple(b) => b.encode(buf),
            ClusterBlock::Group(b) => b.encode(buf),
        }
    }
}

fn simple_block_frames(block: &SimpleBlock, cluster_ts: u64) -> crate::Result<Vec<Frame>> {
    let payload = BlockPayload::decode(block)?;
    let is_keyframe = payload.extra_flags & FLAG_KEYFRAME != 0;
    let is_discardable = payload.extra_flags & FLAG_DISCARDABLE != 0;
    let timestamp = cluster_ts as i64 + payload.timecode as i64;
    Ok(payload
        .frames
        .into_iter()
        .map(|data| Frame {
            data,
            is_keyframe,
            is_invisible: payload.invisible,
            is_discardable,
            track_number: payload.track_number,
            timestamp,
        })
        .collect())
}

fn block_group_frames(group: &BlockGroup, cluster_ts: u64) -> crate::Result<Vec<Frame>> {
    let payload = BlockPayload::decode(&group.block)?;
    let is_keyframe = group.reference_block.is_empty();
    let timestamp = cluster_ts as i64 + payload.timecode as i64;
    Ok(payload
        .frames
        .into_iter()
        .map(|data| Frame {
            data,
            is_keyframe,
            is_invisible: payload.invisible,
            is_discardable: false,
            track_number: payload.track_number,
            timestamp,
        })
        .collect())
}

impl MemoryCluster {
    /// frames in the cluster.
    pub fn frames(&self) -> impl Iterator<Item = crate::Result<Frame>> + '_ {
        let ts = *self.timestamp;
        let simple = self
            .simple_block
            .iter()
            .flat_map(move |b| match simple_block_frames(b, ts) {
                Ok(frames) => frames.into_iter().map(Ok).collect::<Vec<_>>(),
                Err(e) => vec![Err(e)],
            });
        let grouped = self
            .block_group
            .iter()
            .flat_map(move |g| match block_group_frames(g, ts) {
                Ok(frames) => frames.into_iter().map(Ok).collect::<Vec<_>>(),
                Err(e) => vec![Err(e)],
            });
        simple.chain(grouped)
    }
}
