#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

/// Error types for this crate.
mod error;
mod functional;
pub use error::*;

/// I/O utilities.
pub mod io;

/// base types for Matroska elements. ie. `VInt64`, `Header`, etc.
mod base;
/// EBML element IDs: class derivation and reserved-pattern validation.
mod ids;
/// EBML integer (signed/unsigned) encoding, distinct from vint coding.
mod ebml_int;
mod frame;
/// Laced and unlaced Block payload codec.
mod block;
/// Lacing and delacing of multiple frames within a Block.
mod lacer;
/// Streaming (file-backed) Cluster read/write, complementing `MemoryCluster`.
mod cluster;
/// Streaming Segment writer: two-phase body size, padded Info/seek head.
mod segment;
/// Leaf elements in Matroska.
mod leaf;
/// Master elements in Matroska.
mod master;
/// Supplementary elements in Matroska. Void elements, CRC-32, etc.
///
/// These elements are not from the Matroska specification, but Matroska specifications inherit them from EBML specifications.
mod supplement;
// Element body definitions and traits.
mod element;
/// Read-only, borrow-friendly views over decoded documents.
pub mod view;

/// A prelude for common types and traits.
pub mod prelude {
    pub use crate::base::*;
    pub use crate::block::*;
    pub use crate::cluster::*;
    pub use crate::element::*;
    pub use crate::frame::*;
    pub use crate::ids::*;
    pub use crate::leaf::*;
    pub use crate::master::*;
    pub use crate::segment::*;
    pub use crate::supplement::*;
    pub use crate::view::*;
}
