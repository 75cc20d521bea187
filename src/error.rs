use crate::base::VInt64;

/// Error types for this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error, from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid variable-length integer encoding, incidicates a vint longer than 8 bytes.
    #[error("Invalid variable-length integer encoding, 8 leading zeros found...")]
    InvalidVInt,

    /// Attempted to read past the end of the buffer.
    #[error("Attempted to read past the end of the buffer")]
    OutOfBounds,

    /// Attempted to read past the end of the buffer during element body decoding.
    #[error("Element body over decode, ID: {0}")]
    OverDecode(VInt64),

    /// Not all bytes were consumed in a element body
    #[error("Short read: not all bytes were consumed")]
    ShortRead,

    /// Not all bytes were consumed in a element body during element body decoding.
    #[error("Element body under decode, ID: {0}")]
    UnderDecode(VInt64),

    /// Missing element.
    #[error("Missing element, ID: {0}")]
    MissingElement(VInt64),

    /// Duplicate element in a master element.
    #[error("Duplicate element {id} in master element {parent}")]
    DuplicateElement {
        /// The duplicate element ID.
        id: VInt64,
        /// The parent master element ID.
        parent: VInt64,
    },

    /// Element body size is unknown.
    #[error("Element body size is unknown, ID: {0}")]
    ElementBodySizeUnknown(VInt64),

    /// Malformed lacing data.
    #[error("Malformed lacing data")]
    MalformedLacingData,

    /// An element ID is reserved or otherwise invalid.
    #[error("Invalid EBML element ID: 0x{id:X}")]
    InvalidEbmlId {
        /// The offending ID, as encoded on the wire.
        id: u64,
    },

    /// A caller-supplied width is smaller than the value's natural width.
    #[error("Required width {required} is too small to hold a value of natural width {natural}")]
    SpecSizeTooSmall {
        /// The natural (minimum) width of the value, in bytes.
        natural: usize,
        /// The width the caller required.
        required: usize,
    },

    /// A static, fixed-size buffer ran out of bytes during decode.
    #[error("Buffer of size {buffer_size} too small, {required} bytes required")]
    BufferTooSmall {
        /// Size of the buffer that was available.
        buffer_size: usize,
        /// Number of bytes that decoding required.
        required: usize,
    },

    /// A fixed-width element (date, float) had an unexpected body size.
    #[error("Element {id} has body length {observed}, expected one of {allowed:?}")]
    BadElementLength {
        /// The element's ID.
        id: VInt64,
        /// The body length actually observed.
        observed: usize,
        /// The body lengths that would have been accepted.
        allowed: &'static [usize],
    },

    /// A master element's body did not consume exactly its declared size.
    #[error(
        "Master element {id} declared body size {declared}, but {actual} bytes were consumed"
    )]
    BadBodySize {
        /// The master element's ID.
        id: VInt64,
        /// The size declared in the element header.
        declared: u64,
        /// The number of bytes actually consumed while parsing children.
        actual: u64,
    },

    /// An unknown child ID was encountered inside a master element.
    #[error("Unknown child {child} in master element {parent} at position {position}")]
    InvalidChildId {
        /// The unrecognised child ID.
        child: VInt64,
        /// The enclosing master element's ID.
        parent: VInt64,
        /// The stream position at which the child header began.
        position: u64,
    },

    /// A required child was absent from a master element's body.
    #[error("Missing required child {child} in master element {parent}")]
    MissingChild {
        /// The missing child's ID.
        child: VInt64,
        /// The enclosing master element's ID.
        parent: VInt64,
    },

    /// A setter or decoder observed a value outside its allowed range.
    #[error("Value out of range for element {id}")]
    ValueOutOfRange {
        /// The element whose value was rejected.
        id: VInt64,
    },

    /// A binary/string child's size is outside its allowed range.
    #[error("Value size out of range for element {id}: {observed} bytes, expected {min}..={max}")]
    ValueSizeOutOfRange {
        /// The element whose value was rejected.
        id: VInt64,
        /// The size actually observed.
        observed: usize,
        /// Minimum allowed size.
        min: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// CRC-32 verification failed on read.
    #[error("CRC-32 mismatch in element {id}")]
    BadCrc {
        /// The element whose CRC-32 sub-element failed to verify.
        id: VInt64,
    },

    /// A block was given an empty frame.
    #[error("Block received an empty frame")]
    EmptyFrame,

    /// Fixed lacing was paired with non-uniform frames, or a laced frame's
    /// computed size was not positive.
    #[error("Bad laced frame size: {observed}")]
    BadLacedFrameSize {
        /// The offending size (may be negative before the check fails).
        observed: i64,
    },

    /// `finish_write` was called on an element that is not in the Writing state.
    #[error("finish_write called on an element that is not writing")]
    NotWriting,

    /// A segment could not be finalised because reserved padding was too small
    /// for the final value.
    #[error("Finalising element {id} would overflow its reserved body size")]
    BodySizeOverflow {
        /// The element being finalised.
        id: VInt64,
    },
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
