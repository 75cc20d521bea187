use crate::Error;
use crate::base::*;
use crate::element::*;
use crate::functional::*;
use crate::leaf::*;
use crate::supplement::*;

// A helper for generating nested (master) elements: a macro because every
// master element needs the same CRC-32/Void bookkeeping and the same
// required/optional/multiple child dispatch, differing only in which
// children it accepts.
/* example:
nested! {
    required: [ EbmlMaxIdLength, EbmlMaxSizeLength ],
    optional: [ EbmlVersion, EbmlReadVersion, DocType, DocTypeVersion, DocTypeReadVersion ],
    multiple: [ ],
};
*/
macro_rules! nested {
    (required: [$($required:ident),*$(,)?], optional: [$($optional:ident),*$(,)?], multiple: [$($multiple:ident),*$(,)?],) => {
        paste::paste! {
            fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
                // The CRC-32, if present, is always the first child and
                // covers every byte that follows it in this element's body.
                let crc32 = {
                    let mut peek = *buf;
                    match Header::decode(&mut peek) {
                        Ok(h) if h.id == Crc32::ID => {
                            let header = Header::decode(buf)?;
                            Some(Crc32::decode_element(&header, buf)?)
                        }
                        _ => None,
                    }
                };
                let crc_checked_region: &[u8] = *buf;

                $( let mut [<$required:snake>] = None;)*
                $( let mut [<$optional:snake>] = None;)*
                $( let mut [<$multiple:snake>] = Vec::new();)*
                let mut void: Option<Void> = None;

                while buf.has_remaining() {
                    let header = Header::decode(buf)?;
                    match header.id {
                        $( $required::ID => {
                            if [<$required:snake>].is_some() {
                                return Err(Error::DuplicateElement { id: header.id, parent: Self::ID });
                            } else {
                                [<$required:snake>] = Some($required::decode_element(&header, buf)?)
                            }
                        } )*
                        $( $optional::ID => {
                            if [<$optional:snake>].is_some() {
                                return Err(Error::DuplicateElement { id: header.id, parent: Self::ID });
                            } else {
                                [<$optional:snake>] = Some($optional::decode_element(&header, buf)?)
                            }
                        } )*
                        $( $multiple::ID => {
                            [<$multiple:snake>].push($multiple::decode_element(&header, buf)?);
                        } )*
                        Void::ID => {
                            let v = Void::decode_element(&header, buf)?;
                            if let Some(previous) = void {
                                void = Some(Void { size: previous.size + v.size });
                            } else {
                                void = Some(v);
                            }
                            log::info!("Skipping Void element in Element {}, size: {}B", Self::ID, *header.size);
                        }
                        _ => {
                            buf.advance(*header.size as usize);
                            log::warn!("Unknown element {}({}b) in Element({})", header.id, *header.size, Self::ID);
                        }
                    }
                }

                if let Some(crc) = crc32 {
                    if !crc.matches(crc_checked_region) {
                        return Err(Error::BadCrc { id: Self::ID });
                    }
                }

                Ok(Self {
                    crc32,
                    $( [<$required:snake>]: [<$required:snake>].or(if $required::HAS_DEFAULT_VALUE { Some($required::default()) } else { None }).ok_or(Error::MissingElement($required::ID))?, )*
                    $( [<$optional:snake>], )*
                    $( [<$multiple:snake>], )*
                    void,
                })
            }
            fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
                let mut children = Vec::new();
                $( self.[<$required:snake>].encode(&mut children)?; )*
                $( self.[<$optional:snake>].encode(&mut children)?; )*
                $( self.[<$multiple:snake>].encode(&mut children)?; )*
                self.void.encode(&mut children)?;

                if self.crc32.is_some() {
                    Crc32::compute(&children).encode(buf)?;
                }
                buf.append_slice(&children);

                Ok(())
            }
        }
    };
}

/// EBML element, the first top-level element in a document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ebml {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// EBMLVersion element, indicates the version of EBML used.
    pub ebml_version: Option<EbmlVersion>,
    /// EBMLReadVersion element, indicates the minimum version of EBML required to read the file.
    pub ebml_read_version: Option<EbmlReadVersion>,
    /// EBMLMaxIDLength element, indicates the maximum length of an EBML ID in bytes.
    pub ebml_max_id_length: EbmlMaxIdLength,
    /// EBMLMaxSizeLength element, indicates the maximum length of an EBML size in bytes.
    pub ebml_max_size_length: EbmlMaxSizeLength,
    /// DocType element, indicates the type of document.
    pub doc_type: Option<DocType>,
    /// DocTypeVersion element, indicates the version of the document type.
    pub doc_type_version: Option<DocTypeVersion>,
    /// DocTypeReadVersion element, indicates the minimum version of the document type required to read the file.
    pub doc_type_read_version: Option<DocTypeReadVersion>,
}

impl Ebml {
    /// Whether a CRC-32 child is present on read, or will be emitted on write.
    pub fn crc_enabled(&self) -> bool {
        self.crc32.is_some()
    }
}

impl Element for Ebml {
    const ID: VInt64 = VInt64::from_encoded(0x1A45_DFA3);
    nested! {
        required: [ EbmlMaxIdLength, EbmlMaxSizeLength ],
        optional: [ EbmlVersion, EbmlReadVersion, DocType, DocTypeVersion, DocTypeReadVersion ],
        multiple: [ ],
    }
}

/// The Root Element that contains all other Top-Level Elements.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Contains seeking information of Top-Level Elements.
    pub seek_head: Vec<SeekHead>,
    /// Contains general information about the Segment.
    pub info: Info,
    /// Describes every track carried by this Segment.
    pub tracks: Tracks,
    /// Files attached to this Segment.
    pub attachments: Option<Attachments>,
    /// The Top-Level Elements containing the Block structure.
    pub memory_cluster: Vec<MemoryCluster>,
}

impl Segment {
    /// Whether a CRC-32 child is present on read, or will be emitted on write.
    pub fn crc_enabled(&self) -> bool {
        self.crc32.is_some()
    }
}

impl Element for Segment {
    const ID: VInt64 = VInt64::from_encoded(0x18538067);
    nested! {
      required: [ Info, Tracks ],
      optional: [ Attachments ],
      multiple: [ SeekHead, MemoryCluster ],
    }
}

/// Contains seeking information of Top-Level Elements.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeekHead {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Contains a single seek entry to an EBML Element.
    pub seek: Vec<Seek>,
}

/// Decode a `SeekId`'s raw big-endian bytes back into the vint it came from.
fn seek_id_to_vint(seek_id: &SeekId) -> VInt64 {
    let encoded = seek_id.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64);
    VInt64::from_encoded(encoded)
}

/// Encode a vint's on-wire bytes (id + marker bit) as a `SeekId`'s raw body.
fn vint_to_seek_id(id: VInt64) -> SeekId {
    let width = VInt64::encode_size(*id);
    let encoded = id.as_encoded();
    SeekId(encoded.to_be_bytes()[8 - width..].to_vec())
}

impl SeekHead {
    /// Look up the segment-relative offset of the Top-Level Element with
    /// the given ID, if this seek head has an entry for it.
    pub fn find(&self, id: VInt64) -> Option<u64> {
        self.seek
            .iter()
            .find(|s| seek_id_to_vint(&s.seek_id) == id)
            .map(|s| *s.seek_position)
    }

    /// Remove any entry for the given ID, returning whether one was removed.
    pub fn erase(&mut self, id: VInt64) -> bool {
        let before = self.seek.len();
        self.seek.retain(|s| seek_id_to_vint(&s.seek_id) != id);
        self.seek.len() != before
    }

    /// Record a seek entry pointing `id` at `position`, replacing any
    /// existing entry for the same ID.
    pub fn insert(&mut self, id: VInt64, position: u64) {
        self.erase(id);
        self.seek.push(Seek {
            crc32: None,
            void: None,
            seek_id: vint_to_seek_id(id),
            seek_position: SeekPosition(position),
        });
    }
}

impl SeekHead {
    /// Whether a CRC-32 child is present on read, or will be emitted on write.
    pub fn crc_enabled(&self) -> bool {
        self.crc32.is_some()
    }
}

impl Element for SeekHead {
    const ID: VInt64 = VInt64::from_encoded(0x114D9B74);
    nested! {
      required: [ ],
      optional: [ ],
      multiple: [ Seek ],
    }
}

/// Contains a single seek entry to an EBML Element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seek {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// The binary EBML ID of a Top-Level Element.
    pub seek_id: SeekId,
    /// The Segment Position of a Top-Level Element.
    pub seek_position: SeekPosition,
}

impl Seek {
    /// Whether a CRC-32 child is present on read, or will be emitted on write.
    pub fn crc_enabled(&self) -> bool {
        self.crc32.is_some()
    }
}

impl Element for Seek {
    const ID: VInt64 = VInt64::from_encoded(0x4DBB);
    nested! {
      required: [ SeekId, SeekPosition ],
      optional: [ ],
      multiple: [ ],
    }
}

/// Contains general information about the Segment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Info {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// A randomly generated unique ID to identify the Segment amongst many others.
    pub segment_uuid: Option<SegmentUuid>,
    /// A filename corresponding to this Segment.
    pub segment_filename: Option<SegmentFilename>,
    /// An ID to identify the previous Segment of a Linked Segment.
    pub prev_uuid: Option<PrevUuid>,
    /// A filename corresponding to the previous Linked Segment.
    pub prev_filename: Option<PrevFilename>,
    /// An ID to identify the next Segment of a Linked Segment.
    pub next_uuid: Option<NextUuid>,
    /// A filename corresponding to the next Linked Segment.
    pub next_filename: Option<NextFilename>,
    /// A unique ID that all Segments of a Linked Segment must share.
    pub segment_family: Vec<SegmentFamily>,
    /// The mapping between this Segment and a chapter codec's segment value.
    pub chapter_translate: Vec<ChapterTranslate>,
    /// Base unit for Segment Ticks and Track Ticks, in nanoseconds.
    pub timestamp_scale: TimestampScale,
    /// Duration of the Segment, in Segment Ticks.
    pub duration: Option<Duration>,
    /// The date and time the Segment was created.
    pub date_utc: Option<DateUtc>,
    /// General name of the Segment.
    pub title: Option<Title>,
    /// Muxing application or library.
    pub muxing_app: MuxingApp,
    /// Writing application.
    pub writing_app: WritingApp,
}

impl Info {
    /// Whether a CRC-32 child is present on read, or will be emitted on write.
    pub fn crc_enabled(&self) -> bool {
        self.crc32.is_some()
    }
}

impl Element for Info {
    const ID: VInt64 = VInt64::from_encoded(0x1549A966);
    nested! {
      required: [ TimestampScale, MuxingApp, WritingApp ],
      optional: [ SegmentUuid, SegmentFilename, PrevUuid, PrevFilename, NextUuid, NextFilename, Duration, DateUtc, Title ],
      multiple: [ SegmentFamily, ChapterTranslate ],
    }
}

/// The mapping between this Segment and a segment value in a given Chapter Codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterTranslate {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// The binary value used to represent this Segment in the chapter codec data.
    pub chapter_translate_id: ChapterTranslateId,
    /// This ChapterTranslate applies to this chapter codec of the given chapter edition(s).
    pub chapter_translate_codec: ChapterTranslateCodec,
    /// Chapter edition UID(s) this ChapterTranslate applies to.
    pub chapter_translate_edition_uid: Vec<ChapterTranslateEditionUid>,
}

impl ChapterTranslate {
    /// Whether a CRC-32 child is present on read, or will be emitted on write.
    pub fn crc_enabled(&self) -> bool {
        self.crc32.is_some()
    }
}

impl Element for ChapterTranslate {
    const ID: VInt64 = VInt64::from_encoded(0x6924);
    nested! {
        required: [ ChapterTranslateId, ChapterTranslateCodec ],
        optional: [ ],
        multiple: [ ChapterTranslateEditionUid ],
    }
}

/// A Top-Level Element describing every track carried by the Segment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tracks {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Describes a single track.
    pub track_entry: Vec<TrackEntry>,
}

impl Tracks {
    /// Whether a CRC-32 child is present on read, or will be emitted on write.
    pub fn crc_enabled(&self) -> bool {
        self.crc32.is_some()
    }
}

impl Element for Tracks {
    const ID: VInt64 = VInt64::from_encoded(0x1654AE6B);
    nested! {
        required: [ ],
        optional: [ ],
        multiple: [ TrackEntry ],
    }
}

/// Describes a single track: its identity, type, codec and behavioural flags.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackEntry {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// The track number referenced by Blocks belonging to this track.
    pub track_number: TrackNumber,
    /// A unique ID for this track.
    pub track_uid: TrackUid,
    /// The track's media type.
    pub track_type: TrackType,
    /// Whether the track is usable during playback.
    pub flag_enabled: FlagEnabled,
    /// Whether this track is eligible for automatic selection by a player.
    pub flag_default: FlagDefault,
    /// Whether this track was forced to be selected by the content creator.
    pub flag_forced: FlagForced,
    /// Whether Blocks on this track may be laced.
    pub flag_lacing: FlagLacing,
    /// Default duration, in nanoseconds, of a single frame on this track.
    pub default_duration: Option<DefaultDuration>,
    /// The language of this track.
    pub language: Option<Language>,
    /// An ID identifying the codec used for this track.
    pub codec_id: CodecId,
    /// Private codec-specific initialization data.
    pub codec_private: Option<CodecPrivate>,
    /// A human-readable name for this track.
    pub name: Option<Name>,
}

impl TrackEntry {
    /// Whether a CRC-32 child is present on read, or will be emitted on write.
    pub fn crc_enabled(&self) -> bool {
        self.crc32.is_some()
    }
}

impl Element for TrackEntry {
    const ID: VInt64 = VInt64::from_encoded(0xAE);
    nested! {
        required: [ TrackNumber, TrackUid, TrackType, FlagEnabled, FlagDefault, FlagForced, FlagLacing, CodecId ],
        optional: [ DefaultDuration, Language, CodecPrivate, Name ],
        multiple: [ ],
    }
}

/// A Top-Level Element containing attached files.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Attachments {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// A single attached file.
    pub attached_file: Vec<AttachedFile>,
}

impl Attachments {
    /// Whether a CRC-32 child is present on read, or will be emitted on write.
    pub fn crc_enabled(&self) -> bool {
        self.crc32.is_some()
    }
}

impl Element for Attachments {
    const ID: VInt64 = VInt64::from_encoded(0x1941A469);
    nested! {
        required: [ ],
        optional: [ ],
        multiple: [ AttachedFile ],
    }
}

/// A single attached file: its metadata and raw content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedFile {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// A human-readable description of the attached file.
    pub file_description: Option<FileDescription>,
    /// The attached file's filename.
    pub file_name: FileName,
    /// The attached file's MIME type.
    pub file_mime_type: FileMimeType,
    /// The attached file's raw content.
    pub file_data: FileData,
    /// A unique ID for this attached file.
    pub file_uid: FileUid,
}

impl AttachedFile {
    /// Whether a CRC-32 child is present on read, or will be emitted on write.
    pub fn crc_enabled(&self) -> bool {
        self.crc32.is_some()
    }
}

impl Element for AttachedFile {
    const ID: VInt64 = VInt64::from_encoded(0x61A7);
    nested! {
        required: [ FileName, FileMimeType, FileData, FileUid ],
        optional: [ FileDescription ],
        multiple: [ ],
    }
}

/// The Top-Level Element containing a fully materialised Block structure.
///
/// This is the single-pass cluster representation: every block is built in
/// memory before the cluster is encoded. [`crate::cluster::FileCluster`]
/// covers the incremental, streaming-write case.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryCluster {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Absolute timestamp of the cluster.
    pub timestamp: Timestamp,
    /// The Segment Position of the Cluster in the Segment.
    pub position: Option<Position>,
    /// Size of the previous Cluster, in octets.
    pub prev_size: Option<PrevSize>,
    /// SimpleBlocks in this cluster.
    pub simple_block: Vec<SimpleBlock>,
    /// BlockGroups in this cluster.
    pub block_group: Vec<BlockGroup>,
}

impl MemoryCluster {
    /// This cluster's Segment-relative byte position, if it was recorded
    /// when the cluster was read or written.
    ///
    /// This is read-only by design: a cluster's position is an artefact of
    /// where it physically landed in a document, not something callers
    /// mutate after the fact.
    pub fn position(&self) -> Option<u64> {
        self.position.map(|p| *p)
    }
}

impl MemoryCluster {
    /// Whether a CRC-32 child is present on read, or will be emitted on write.
    pub fn crc_enabled(&self) -> bool {
        self.crc32.is_some()
    }
}

impl Element for MemoryCluster {
    const ID: VInt64 = VInt64::from_encoded(0x1F43B675);
    nested! {
      required: [ Timestamp ],
      optional: [ Position, PrevSize ],
      multiple: [ SimpleBlock, BlockGroup ],
    }
}

/// Basic container of information containing a single Block and information specific to that Block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockGroup {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Block containing the actual data to be rendered and a timestamp relative to the Cluster Timestamp.
    pub block: Block,
    /// Contains additional binary data to complete the main one.
    pub block_additions: Option<BlockAdditions>,
    /// The duration of the Block, in Track Ticks.
    pub block_duration: Option<BlockDuration>,
    /// Cache priority of the frame(s) in this BlockGroup.
    pub reference_priority: ReferencePriority,
    /// Timestamp(s), relative to this Block, of other frames it depends on.
    pub reference_block: Vec<ReferenceBlock>,
    /// The new codec state to use.
    pub codec_state: Option<CodecState>,
    /// Duration of the silent data added to the Block.
    pub discard_padding: Option<DiscardPadding>,
}

impl BlockGroup {
    /// Whether a CRC-32 child is present on read, or will be emitted on write.
    pub fn crc_enabled(&self) -> bool {
        self.crc32.is_some()
    }
}

impl Element for BlockGroup {
    const ID: VInt64 = VInt64::from_encoded(0xA0);
    nested! {
      required: [ Block, ReferencePriority ],
      optional: [ BlockAdditions, BlockDuration, CodecState, DiscardPadding ],
      multiple: [ ReferenceBlock ],
    }
}
/// Contains additional binary data to complete the main one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockAdditions {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Contains the BlockAdditional and some parameters.
    pub block_more: Vec<BlockMore>,
}

impl BlockAdditions {
    /// Whether a CRC-32 child is present on read, or will be emitted on write.
    pub fn crc_enabled(&self) -> bool {
        self.crc32.is_some()
    }
}

impl Element for BlockAdditions {
    const ID: VInt64 = VInt64::from_encoded(0x75A1);
    nested! {
      required: [ ],
      optional: [ ],
      multiple: [ BlockMore ],
    }
}

/// Contains the BlockAdditional and some parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockMore {
    /// Optional CRC-32 element for integrity checking.
    pub crc32: Option<Crc32>,
    /// void element, useful for reserving space during writing.
    pub void: Option<Void>,

    /// Interpreted by the codec as it wishes.
    pub block_additional: BlockAdditional,
    /// An ID to identify how to interpret the BlockAdditional data.
    pub block_add_id: BlockAddId,
}

impl BlockMore {
    /// Whether a CRC-32 child is present on read, or will be emitted on write.
    pub fn crc_enabled(&self) -> bool {
        self.crc32.is_some()
    }
}

impl Element for BlockMore {
    const ID: VInt64 = VInt64::from_encoded(0xA6);
    nested! {
      required: [ BlockAdditional, BlockAddId ],
      optional: [ ],
      multiple: [ ],
    }
}
