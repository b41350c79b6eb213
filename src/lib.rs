// BTF — binary tagged format codec.

pub mod config;
pub mod error;
pub mod read;
pub mod tag;
mod track;
pub mod tree;
pub mod utf8;
pub mod wire;
pub mod write;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level convenience re-exports for the most common API entry points.
// ─────────────────────────────────────────────────────────────────────────────

/// Flat error taxonomy shared by every component.
pub use error::{Error, Result};

/// One value header: kind plus scalar, length, or count.
pub use tag::{Kind, Tag};

/// Timestamp value carried by ext −1.
#[cfg(feature = "ext")]
pub use tag::timestamp::Timestamp;

/// Wire compatibility level selected per writer.
pub use wire::Version;

/// Streaming tag encoder over a bounded or growable buffer.
pub use write::{IoSink, Sink, Writer};

/// Streaming tag reader over a blob or a pull source.
pub use read::{IoSource, Reader, Source};

/// Bounded tree parser and its node handles.
pub use tree::{Limits, Node, Tree};

/// Strict UTF-8 validation predicates.
pub use utf8::{check_utf8, check_utf8_cstr};

// ─────────────────────────────────────────────────────────────────────────────
// Version API
// ─────────────────────────────────────────────────────────────────────────────

pub const BTF_VERSION_MAJOR: i32 = 1;
pub const BTF_VERSION_MINOR: i32 = 1;
pub const BTF_VERSION_RELEASE: i32 = 0;
pub const BTF_VERSION_NUMBER: i32 =
    BTF_VERSION_MAJOR * 100 * 100 + BTF_VERSION_MINOR * 100 + BTF_VERSION_RELEASE;
pub const BTF_VERSION_STRING: &str = "1.1.0";

/// Returns the library version number (e.g. 10100 for v1.1.0).
pub fn version_number() -> i32 {
    BTF_VERSION_NUMBER
}

/// Returns the library version string (e.g. `"1.1.0"`).
pub fn version_string() -> &'static str {
    BTF_VERSION_STRING
}
