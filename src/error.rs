//! BTF error taxonomy.
//!
//! Every fallible surface in this crate reports one of the flat kinds below.
//! Streaming instances (writers, readers, trees) carry a single write-once
//! latch: the first failure is recorded, an optional user hook runs exactly
//! once, and every subsequent operation on the instance is a silent no-op
//! returning zero values.  The latch is never cleared; only destruction
//! releases the instance.

use core::fmt;

/// Flat error kinds shared by every component.
///
/// The discriminants are stable within one release but carry no meaning on
/// the wire; never persist them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Source/sink failure, or an unexpected end of data mid-message.
    Io,
    /// Malformed wire bytes: the reserved opcode, an overlong or otherwise
    /// bad UTF-8 sequence where the wire demands validity, an out-of-range
    /// timestamp, or a truncated pre-loaded blob.
    Invalid,
    /// Well-formed bytes using a disabled feature (an ext opcode with the
    /// `ext` feature off, or a v5-only form requested in v4 mode).
    Unsupported,
    /// The requested type does not match the stored value: getter mismatch,
    /// bad UTF-8 on a checked read, or an embedded NUL in a C-string copy.
    Type,
    /// A value or message exceeds a configured bound: a buffer too small for
    /// a tag, a message over `max_size`, or a tree over `max_nodes`.
    TooBig,
    /// Allocation failure.
    Memory,
    /// Programmer misuse: an unbalanced compound close, a close of the wrong
    /// kind, body bytes past the declared length, or an invalid argument.
    Bug,
    /// Semantic violation at the application layer: a missing or duplicate
    /// map key, or an error flagged explicitly by the caller.
    Data,
    /// Clean end of the source between messages.
    Eof,
}

impl Error {
    /// Stable lowercase name for logs and CLI output.
    pub fn name(&self) -> &'static str {
        match self {
            Error::Io => "io",
            Error::Invalid => "invalid",
            Error::Unsupported => "unsupported",
            Error::Type => "type",
            Error::TooBig => "too_big",
            Error::Memory => "memory",
            Error::Bug => "bug",
            Error::Data => "data",
            Error::Eof => "eof",
        }
    }

    /// One-line description used by `Display`.
    pub fn message(&self) -> &'static str {
        match self {
            Error::Io => "source or sink failed, or data ended mid-message",
            Error::Invalid => "malformed wire bytes",
            Error::Unsupported => "well-formed bytes use a disabled feature",
            Error::Type => "value does not match the requested type",
            Error::TooBig => "value or message exceeds a configured bound",
            Error::Memory => "allocation failed",
            Error::Bug => "component misuse",
            Error::Data => "semantic violation in message data",
            Error::Eof => "clean end of source",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name(), self.message())
    }
}

impl std::error::Error for Error {}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Reports a `bug`-class violation.
///
/// `bug` means the caller broke the API contract.  Development builds log
/// the offending call site at error level (a panic here would make the
/// misuse untestable); release builds latch the error and continue as
/// no-ops either way.
macro_rules! bug {
    ($($why:tt)*) => {{
        if cfg!(debug_assertions) {
            log::error!($($why)*);
        }
        $crate::error::Error::Bug
    }};
}
pub(crate) use bug;
