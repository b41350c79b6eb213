//! Opcode bytes and header sizes of the wire grammar.
//!
//! Fix-family opcodes embed their value or length in the opcode byte itself;
//! everything else is an opcode followed by big-endian fields.

// ---------------------------------------------------------------------------
// Fix-range boundaries (value or length lives in the opcode byte)
// ---------------------------------------------------------------------------

/// Positive fixint: `0x00..=0x7f`, value = the byte.
pub const POSFIXINT_MAX: u8 = 0x7f;
/// Fixmap: `0x80..=0x8f`, pair count = low 4 bits.
pub const FIXMAP_BASE: u8 = 0x80;
/// Fixarray: `0x90..=0x9f`, element count = low 4 bits.
pub const FIXARRAY_BASE: u8 = 0x90;
/// Fixstr: `0xa0..=0xbf`, byte length = low 5 bits.
pub const FIXSTR_BASE: u8 = 0xa0;
/// Negative fixint: `0xe0..=0xff`, value = the byte as `i8`.
pub const NEGFIXINT_MIN: u8 = 0xe0;

/// Largest count a fixmap/fixarray opcode can carry.
pub const FIX_COUNT_MAX: u32 = 0x0f;
/// Largest length a fixstr opcode can carry.
pub const FIXSTR_LEN_MAX: u32 = 0x1f;

// ---------------------------------------------------------------------------
// Single-byte opcodes
// ---------------------------------------------------------------------------

pub const NIL: u8 = 0xc0;
/// Reserved; parsing it is always `invalid`.
pub const RESERVED: u8 = 0xc1;
pub const FALSE: u8 = 0xc2;
pub const TRUE: u8 = 0xc3;

// ---------------------------------------------------------------------------
// Length-prefixed families
// ---------------------------------------------------------------------------

pub const BIN8: u8 = 0xc4;
pub const BIN16: u8 = 0xc5;
pub const BIN32: u8 = 0xc6;

pub const EXT8: u8 = 0xc7;
pub const EXT16: u8 = 0xc8;
pub const EXT32: u8 = 0xc9;

pub const FLOAT32: u8 = 0xca;
pub const FLOAT64: u8 = 0xcb;

pub const UINT8: u8 = 0xcc;
pub const UINT16: u8 = 0xcd;
pub const UINT32: u8 = 0xce;
pub const UINT64: u8 = 0xcf;

pub const INT8: u8 = 0xd0;
pub const INT16: u8 = 0xd1;
pub const INT32: u8 = 0xd2;
pub const INT64: u8 = 0xd3;

pub const FIXEXT1: u8 = 0xd4;
pub const FIXEXT2: u8 = 0xd5;
pub const FIXEXT4: u8 = 0xd6;
pub const FIXEXT8: u8 = 0xd7;
pub const FIXEXT16: u8 = 0xd8;

pub const STR8: u8 = 0xd9;
pub const STR16: u8 = 0xda;
pub const STR32: u8 = 0xdb;

pub const ARRAY16: u8 = 0xdc;
pub const ARRAY32: u8 = 0xdd;

pub const MAP16: u8 = 0xde;
pub const MAP32: u8 = 0xdf;

// ---------------------------------------------------------------------------
// Header byte widths (public contract)
// ---------------------------------------------------------------------------

/// Opcode-only headers: fixint, fixstr, fixmap, fixarray, nil, bool.
pub const TAG_SIZE_FIX: usize = 1;
pub const TAG_SIZE_U8: usize = 2;
pub const TAG_SIZE_U16: usize = 3;
pub const TAG_SIZE_U32: usize = 5;
pub const TAG_SIZE_U64: usize = 9;
pub const TAG_SIZE_I8: usize = 2;
pub const TAG_SIZE_I16: usize = 3;
pub const TAG_SIZE_I32: usize = 5;
pub const TAG_SIZE_I64: usize = 9;
pub const TAG_SIZE_FLOAT32: usize = 5;
pub const TAG_SIZE_FLOAT64: usize = 9;
pub const TAG_SIZE_STR8: usize = 2;
pub const TAG_SIZE_STR16: usize = 3;
pub const TAG_SIZE_STR32: usize = 5;
pub const TAG_SIZE_BIN8: usize = 2;
pub const TAG_SIZE_BIN16: usize = 3;
pub const TAG_SIZE_BIN32: usize = 5;
pub const TAG_SIZE_ARRAY16: usize = 3;
pub const TAG_SIZE_ARRAY32: usize = 5;
pub const TAG_SIZE_MAP16: usize = 3;
pub const TAG_SIZE_MAP32: usize = 5;
/// Fixext headers: opcode byte plus the ext type byte.
pub const TAG_SIZE_FIXEXT: usize = 2;
/// Ext headers carry a length field and then the ext type byte.
pub const TAG_SIZE_EXT8: usize = 3;
pub const TAG_SIZE_EXT16: usize = 4;
pub const TAG_SIZE_EXT32: usize = 6;

/// Upper bound on any tag header.  Buffers configured for streaming must
/// meet or exceed this.
pub const MAX_TAG_BYTES: usize = 9;

const _: () = assert!(MAX_TAG_BYTES >= TAG_SIZE_U64);
const _: () = assert!(MAX_TAG_BYTES >= TAG_SIZE_EXT32);
