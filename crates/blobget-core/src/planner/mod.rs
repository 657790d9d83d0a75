//! Part planning.
//!
//! Splits `[0, total_size)` into fixed-size parts (the last one may be
//! shorter) and provides the byte-range math used for ranged reads.

mod range;

pub use range::{plan_parts, ByteRange, Part, PartState};
