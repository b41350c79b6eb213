//! The wire codec: pure functions between [`Tag`](crate::tag::Tag) values
//! and their on-wire headers.
//!
//! Nothing in this module touches payload bytes or performs I/O; the writer,
//! reader, and tree parser layer those concerns on top.  The grammar is the
//! MessagePack v5 opcode space with one knob: [`Version::V4`] restricts the
//! encoder to the older raw-string forms (no `str8`, no ext; `bin` degrades
//! to raw).

pub mod encode;
pub mod opcode;
pub mod parse;

pub use encode::{encode_tag, EncodedTag};
pub use opcode::MAX_TAG_BYTES;
pub use parse::{header_len, parse_tag};

/// Wire compatibility level, selected per writer.
///
/// Readers always accept the full v5 grammar; the level only restricts what
/// the encoder emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Version {
    /// Legacy level: no `str8`, no ext forms; `bin` writes degrade to the
    /// raw string headers.
    V4,
    /// Current level (default).
    #[default]
    V5,
}
