//! Buffer and codec primitives shared across the element hierarchy.

mod buf;
mod coding;

pub use buf::*;
pub use coding::*;
