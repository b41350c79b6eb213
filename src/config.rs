// config.rs — Compile-time tuning constants.
//
// These values must be consistent across a program: two components exchanging
// buffers (for example a reader handed to a tree, or a writer flushing into a
// reader's source) assume the same bounds.

use crate::wire::MAX_TAG_BYTES;

// ---------------------------------------------------------------------------
// Numeric shorthands
// ---------------------------------------------------------------------------
pub const KB: usize = 1 << 10;
pub const MB: usize = 1 << 20;

// ---------------------------------------------------------------------------
// Buffer sizing
// ---------------------------------------------------------------------------

/// Size of temporary on-stack scratch buffers used for small straddling
/// copies (for example a fixstr header plus payload moved in one step).
pub const STACK_BUFFER_SIZE: usize = 256;

/// Default capacity of the internal buffer used by streaming readers,
/// writers, and the tree parser's stream mode when the caller does not
/// specify one.
pub const DEFAULT_BUFFER_SIZE: usize = 4 * KB;

/// Smallest buffer a sink-backed writer accepts.  Must hold the largest
/// tag header and the largest single-copy fixstr (header byte + 31 bytes of
/// payload) so that small strings never straddle.
pub const MIN_WRITER_BUFFER_SIZE: usize = 32;

/// Smallest buffer a source-backed reader accepts.  Anything below the
/// largest tag header would make `ensure` fail on well-formed input.
pub const MIN_READER_BUFFER_SIZE: usize = MAX_TAG_BYTES;

// ---------------------------------------------------------------------------
// Tree sizing
// ---------------------------------------------------------------------------

/// Target byte size of one arena page.  Pages hold `NODE_PAGE_SIZE /
/// size_of::<NodeData>()` node records (256 with 16-byte records).
pub const NODE_PAGE_SIZE: usize = 4 * KB;

/// Initial capacity of the parser's and tracker's level stacks.  The stacks
/// grow on demand; this only sizes the first allocation.
pub const INITIAL_STACK_DEPTH: usize = 32;

/// Depth bound that would apply on a target without a growable stack.  With
/// allocation available (always, here) depth is unbounded; the constant is
/// part of the public contract so embedders porting to fixed-stack builds
/// share one number.
pub const MAX_STACK_DEPTH_WITHOUT_ALLOC: usize = 32;

/// Default cap on the total byte size of one parsed message.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * MB;

/// Default cap on the number of nodes in one parsed message.
pub const DEFAULT_MAX_MESSAGE_NODES: usize = 4 * MB / 16;
