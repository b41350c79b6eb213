//! Tag parsing: one wire header to a tag.
//!
//! Parsing is a two-step contract shared by the streaming reader and the
//! tree parser: [`header_len`] classifies the first byte so the caller can
//! make the whole header resident, then [`parse_tag`] decodes it.  All
//! multi-byte fields are big-endian, decoded unaligned-safe via `byteorder`.
//! Payload bytes are never touched here.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};
use crate::tag::Tag;
use crate::wire::opcode::*;

/// Header length implied by a first byte.
///
/// The reserved opcode `0xc1` is `invalid`; every ext opcode is
/// `unsupported` unless the `ext` feature is enabled.
pub fn header_len(first: u8) -> Result<usize> {
    Ok(match first {
        // Value or length embedded in the opcode byte.
        0x00..=0x7f | 0x80..=0x8f | 0x90..=0x9f | 0xa0..=0xbf | 0xe0..=0xff => TAG_SIZE_FIX,
        NIL | FALSE | TRUE => TAG_SIZE_FIX,
        RESERVED => return Err(Error::Invalid),
        BIN8 => TAG_SIZE_BIN8,
        BIN16 => TAG_SIZE_BIN16,
        BIN32 => TAG_SIZE_BIN32,
        EXT8 | EXT16 | EXT32 | FIXEXT1 | FIXEXT2 | FIXEXT4 | FIXEXT8 | FIXEXT16 => {
            if cfg!(feature = "ext") {
                match first {
                    EXT8 => TAG_SIZE_EXT8,
                    EXT16 => TAG_SIZE_EXT16,
                    EXT32 => TAG_SIZE_EXT32,
                    _ => TAG_SIZE_FIXEXT,
                }
            } else {
                return Err(Error::Unsupported);
            }
        }
        FLOAT32 => TAG_SIZE_FLOAT32,
        FLOAT64 => TAG_SIZE_FLOAT64,
        UINT8 => TAG_SIZE_U8,
        UINT16 => TAG_SIZE_U16,
        UINT32 => TAG_SIZE_U32,
        UINT64 => TAG_SIZE_U64,
        INT8 => TAG_SIZE_I8,
        INT16 => TAG_SIZE_I16,
        INT32 => TAG_SIZE_I32,
        INT64 => TAG_SIZE_I64,
        STR8 => TAG_SIZE_STR8,
        STR16 => TAG_SIZE_STR16,
        STR32 => TAG_SIZE_STR32,
        ARRAY16 => TAG_SIZE_ARRAY16,
        ARRAY32 => TAG_SIZE_ARRAY32,
        MAP16 => TAG_SIZE_MAP16,
        MAP32 => TAG_SIZE_MAP32,
    })
}

/// Parses one tag from the front of `bytes`, returning it and the number of
/// header bytes consumed.
///
/// `bytes` must begin at a tag boundary.  A prefix shorter than the header
/// the first byte announces is `invalid` (callers that can pull more input
/// use [`header_len`] to make the header resident first).
pub fn parse_tag(bytes: &[u8]) -> Result<(Tag, usize)> {
    let first = *bytes.first().ok_or(Error::Invalid)?;
    let len = header_len(first)?;
    if bytes.len() < len {
        return Err(Error::Invalid);
    }

    let tag = match first {
        0x00..=0x7f => Tag::Uint(first as u64),
        0xe0..=0xff => Tag::Int(first as i8 as i64),
        0x80..=0x8f => Tag::Map((first & 0x0f) as u32),
        0x90..=0x9f => Tag::Array((first & 0x0f) as u32),
        0xa0..=0xbf => Tag::Str((first & 0x1f) as u32),
        NIL => Tag::Nil,
        FALSE => Tag::Bool(false),
        TRUE => Tag::Bool(true),
        BIN8 => Tag::Bin(bytes[1] as u32),
        BIN16 => Tag::Bin(BigEndian::read_u16(&bytes[1..]) as u32),
        BIN32 => Tag::Bin(BigEndian::read_u32(&bytes[1..])),
        FLOAT32 => Tag::F32(f32::from_bits(BigEndian::read_u32(&bytes[1..]))),
        FLOAT64 => Tag::F64(f64::from_bits(BigEndian::read_u64(&bytes[1..]))),
        UINT8 => Tag::Uint(bytes[1] as u64),
        UINT16 => Tag::Uint(BigEndian::read_u16(&bytes[1..]) as u64),
        UINT32 => Tag::Uint(BigEndian::read_u32(&bytes[1..]) as u64),
        UINT64 => Tag::Uint(BigEndian::read_u64(&bytes[1..])),
        INT8 => Tag::Int(bytes[1] as i8 as i64),
        INT16 => Tag::Int(BigEndian::read_i16(&bytes[1..]) as i64),
        INT32 => Tag::Int(BigEndian::read_i32(&bytes[1..]) as i64),
        INT64 => Tag::Int(BigEndian::read_i64(&bytes[1..])),
        STR8 => Tag::Str(bytes[1] as u32),
        STR16 => Tag::Str(BigEndian::read_u16(&bytes[1..]) as u32),
        STR32 => Tag::Str(BigEndian::read_u32(&bytes[1..])),
        ARRAY16 => Tag::Array(BigEndian::read_u16(&bytes[1..]) as u32),
        ARRAY32 => Tag::Array(BigEndian::read_u32(&bytes[1..])),
        MAP16 => Tag::Map(BigEndian::read_u16(&bytes[1..]) as u32),
        MAP32 => Tag::Map(BigEndian::read_u32(&bytes[1..])),
        #[cfg(feature = "ext")]
        FIXEXT1 => Tag::Ext(bytes[1] as i8, 1),
        #[cfg(feature = "ext")]
        FIXEXT2 => Tag::Ext(bytes[1] as i8, 2),
        #[cfg(feature = "ext")]
        FIXEXT4 => Tag::Ext(bytes[1] as i8, 4),
        #[cfg(feature = "ext")]
        FIXEXT8 => Tag::Ext(bytes[1] as i8, 8),
        #[cfg(feature = "ext")]
        FIXEXT16 => Tag::Ext(bytes[1] as i8, 16),
        #[cfg(feature = "ext")]
        EXT8 => Tag::Ext(bytes[2] as i8, bytes[1] as u32),
        #[cfg(feature = "ext")]
        EXT16 => Tag::Ext(bytes[3] as i8, BigEndian::read_u16(&bytes[1..]) as u32),
        #[cfg(feature = "ext")]
        EXT32 => Tag::Ext(bytes[5] as i8, BigEndian::read_u32(&bytes[1..])),
        // RESERVED and (with the feature off) the ext opcodes already
        // failed in header_len.
        _ => unreachable!("unclassified opcode {first:#04x}"),
    };
    Ok((tag, len))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(bytes: &[u8]) -> (Tag, usize) {
        parse_tag(bytes).unwrap()
    }

    #[test]
    fn fixints_decode_from_bit_patterns() {
        assert_eq!(parse(&[0x00]), (Tag::Uint(0), 1));
        assert_eq!(parse(&[0x7f]), (Tag::Uint(127), 1));
        assert_eq!(parse(&[0xff]), (Tag::Int(-1), 1));
        assert_eq!(parse(&[0xe0]), (Tag::Int(-32), 1));
    }

    #[test]
    fn fix_compounds() {
        assert_eq!(parse(&[0x82]), (Tag::Map(2), 1));
        assert_eq!(parse(&[0x93]), (Tag::Array(3), 1));
        assert_eq!(parse(&[0xa5]), (Tag::Str(5), 1));
        assert_eq!(parse(&[0xbf]), (Tag::Str(31), 1));
    }

    #[test]
    fn multibyte_fields_are_big_endian() {
        assert_eq!(parse(&[0xce, 0x00, 0x01, 0x11, 0x70]), (Tag::Uint(70000), 5));
        assert_eq!(parse(&[0xd1, 0xff, 0x7f]), (Tag::Int(-129), 3));
        assert_eq!(
            parse(&[0xcb, 0x3f, 0xf8, 0, 0, 0, 0, 0, 0]),
            (Tag::F64(1.5), 9)
        );
        assert_eq!(parse(&[0xdc, 0x00, 0x10]), (Tag::Array(16), 3));
        assert_eq!(parse(&[0xdf, 0x00, 0x01, 0x00, 0x00]), (Tag::Map(65536), 5));
    }

    /// The reserved opcode is always invalid.
    #[test]
    fn reserved_opcode() {
        assert_eq!(header_len(0xc1), Err(Error::Invalid));
        assert_eq!(parse_tag(&[0xc1]), Err(Error::Invalid));
    }

    /// A header announced longer than the supplied prefix is invalid.
    #[test]
    fn truncated_headers() {
        assert_eq!(parse_tag(&[]), Err(Error::Invalid));
        assert_eq!(parse_tag(&[0xce, 0x00]), Err(Error::Invalid));
        assert_eq!(parse_tag(&[0xcb, 0, 0, 0]), Err(Error::Invalid));
        assert_eq!(parse_tag(&[0xda, 0x01]), Err(Error::Invalid));
    }

    #[cfg(feature = "ext")]
    #[test]
    fn ext_headers() {
        assert_eq!(parse(&[0xd4, 0x05]), (Tag::Ext(5, 1), 2));
        assert_eq!(parse(&[0xd8, 0xff]), (Tag::Ext(-1, 16), 2));
        assert_eq!(parse(&[0xc7, 3, 0xff]), (Tag::Ext(-1, 3), 3));
        assert_eq!(parse(&[0xc8, 0x01, 0x00, 7]), (Tag::Ext(7, 256), 4));
        assert_eq!(
            parse(&[0xc9, 0x00, 0x01, 0x00, 0x00, 7]),
            (Tag::Ext(7, 65536), 6)
        );
    }

    #[cfg(not(feature = "ext"))]
    #[test]
    fn ext_opcodes_unsupported_when_disabled() {
        for op in [0xc7u8, 0xc8, 0xc9, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8] {
            assert_eq!(header_len(op), Err(Error::Unsupported));
            assert_eq!(parse_tag(&[op, 0, 0, 0, 0, 0]), Err(Error::Unsupported));
        }
    }

    /// Every first byte classifies to a length or a deterministic error.
    #[test]
    fn header_len_is_total() {
        for b in 0..=255u8 {
            match header_len(b) {
                Ok(n) => assert!((1..=MAX_TAG_BYTES).contains(&n), "{b:#04x} -> {n}"),
                Err(Error::Invalid) => assert_eq!(b, 0xc1),
                Err(Error::Unsupported) => {
                    assert!(matches!(b, 0xc7..=0xc9 | 0xd4..=0xd8));
                    assert!(!cfg!(feature = "ext"));
                }
                Err(e) => panic!("unexpected error {e} for {b:#04x}"),
            }
        }
    }
}
