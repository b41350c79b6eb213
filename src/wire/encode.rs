//! Tag encoding: one tag to its minimal wire header.
//!
//! Integers always take the smallest form whose range covers the value,
//! using the unsigned families for anything non-negative.  Compound headers
//! step up at the 15/31 (fix) and 65535 (16-bit) thresholds.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{bug, Error, Result};
use crate::tag::Tag;
use crate::wire::opcode::*;
use crate::wire::Version;

/// A fully encoded tag header: at most [`MAX_TAG_BYTES`] bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedTag {
    buf: [u8; MAX_TAG_BYTES],
    len: u8,
}

impl EncodedTag {
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn one(b0: u8) -> EncodedTag {
        let mut buf = [0u8; MAX_TAG_BYTES];
        buf[0] = b0;
        EncodedTag { buf, len: 1 }
    }

    fn two(b0: u8, b1: u8) -> EncodedTag {
        let mut buf = [0u8; MAX_TAG_BYTES];
        buf[0] = b0;
        buf[1] = b1;
        EncodedTag { buf, len: 2 }
    }

    fn with_u16(b0: u8, v: u16) -> EncodedTag {
        let mut buf = [0u8; MAX_TAG_BYTES];
        buf[0] = b0;
        BigEndian::write_u16(&mut buf[1..], v);
        EncodedTag { buf, len: 3 }
    }

    fn with_u32(b0: u8, v: u32) -> EncodedTag {
        let mut buf = [0u8; MAX_TAG_BYTES];
        buf[0] = b0;
        BigEndian::write_u32(&mut buf[1..], v);
        EncodedTag { buf, len: 5 }
    }

    fn with_u64(b0: u8, v: u64) -> EncodedTag {
        let mut buf = [0u8; MAX_TAG_BYTES];
        buf[0] = b0;
        BigEndian::write_u64(&mut buf[1..], v);
        EncodedTag { buf, len: 9 }
    }
}

/// Encodes one tag into its minimal wire header.
///
/// Fails with `bug` for the sentinel kinds (missing, noop) and with
/// `unsupported` for ext under [`Version::V4`] or with the `ext` feature
/// disabled.
pub fn encode_tag(tag: Tag, version: Version) -> Result<EncodedTag> {
    match tag {
        Tag::Nil => Ok(EncodedTag::one(NIL)),
        Tag::Bool(false) => Ok(EncodedTag::one(FALSE)),
        Tag::Bool(true) => Ok(EncodedTag::one(TRUE)),
        Tag::Int(i) => Ok(encode_int(i)),
        Tag::Uint(u) => Ok(encode_uint(u)),
        Tag::F32(f) => Ok(EncodedTag::with_u32(FLOAT32, f.to_bits())),
        Tag::F64(f) => Ok(EncodedTag::with_u64(FLOAT64, f.to_bits())),
        Tag::Str(n) => Ok(encode_str(n, version)),
        Tag::Bin(n) => Ok(match version {
            Version::V5 => encode_bin(n),
            // v4 has no bin family: degrade to the raw string headers.
            Version::V4 => encode_raw_v4(n),
        }),
        Tag::Array(n) => Ok(encode_count(n, FIXARRAY_BASE, ARRAY16, ARRAY32)),
        Tag::Map(n) => Ok(encode_count(n, FIXMAP_BASE, MAP16, MAP32)),
        #[cfg(feature = "ext")]
        Tag::Ext(code, n) => match version {
            Version::V4 => Err(Error::Unsupported),
            Version::V5 => Ok(encode_ext(code, n)),
        },
        #[cfg(not(feature = "ext"))]
        Tag::Ext(..) => Err(Error::Unsupported),
        Tag::Missing | Tag::Noop => {
            Err(bug!("attempted to encode the {} sentinel", tag.kind()))
        }
    }
}

/// Smallest unsigned form covering `u`.
fn encode_uint(u: u64) -> EncodedTag {
    if u <= POSFIXINT_MAX as u64 {
        EncodedTag::one(u as u8)
    } else if u <= u8::MAX as u64 {
        EncodedTag::two(UINT8, u as u8)
    } else if u <= u16::MAX as u64 {
        EncodedTag::with_u16(UINT16, u as u16)
    } else if u <= u32::MAX as u64 {
        EncodedTag::with_u32(UINT32, u as u32)
    } else {
        EncodedTag::with_u64(UINT64, u)
    }
}

/// Smallest form covering `i`; non-negative values use the unsigned path.
fn encode_int(i: i64) -> EncodedTag {
    if i >= 0 {
        return encode_uint(i as u64);
    }
    if i >= -32 {
        EncodedTag::one(i as i8 as u8)
    } else if i >= i8::MIN as i64 {
        EncodedTag::two(INT8, i as i8 as u8)
    } else if i >= i16::MIN as i64 {
        EncodedTag::with_u16(INT16, i as i16 as u16)
    } else if i >= i32::MIN as i64 {
        EncodedTag::with_u32(INT32, i as i32 as u32)
    } else {
        EncodedTag::with_u64(INT64, i as u64)
    }
}

fn encode_str(n: u32, version: Version) -> EncodedTag {
    if n <= FIXSTR_LEN_MAX {
        EncodedTag::one(FIXSTR_BASE | n as u8)
    } else if n <= u8::MAX as u32 && version == Version::V5 {
        // str8 exists only at the v5 level.
        EncodedTag::two(STR8, n as u8)
    } else if n <= u16::MAX as u32 {
        EncodedTag::with_u16(STR16, n as u16)
    } else {
        EncodedTag::with_u32(STR32, n)
    }
}

fn encode_bin(n: u32) -> EncodedTag {
    if n <= u8::MAX as u32 {
        EncodedTag::two(BIN8, n as u8)
    } else if n <= u16::MAX as u32 {
        EncodedTag::with_u16(BIN16, n as u16)
    } else {
        EncodedTag::with_u32(BIN32, n)
    }
}

/// v4 raw headers: fixstr, raw16, raw32 (no 8-bit form).
fn encode_raw_v4(n: u32) -> EncodedTag {
    if n <= FIXSTR_LEN_MAX {
        EncodedTag::one(FIXSTR_BASE | n as u8)
    } else if n <= u16::MAX as u32 {
        EncodedTag::with_u16(STR16, n as u16)
    } else {
        EncodedTag::with_u32(STR32, n)
    }
}

fn encode_count(n: u32, fix_base: u8, op16: u8, op32: u8) -> EncodedTag {
    if n <= FIX_COUNT_MAX {
        EncodedTag::one(fix_base | n as u8)
    } else if n <= u16::MAX as u32 {
        EncodedTag::with_u16(op16, n as u16)
    } else {
        EncodedTag::with_u32(op32, n)
    }
}

#[cfg(feature = "ext")]
fn encode_ext(code: i8, n: u32) -> EncodedTag {
    let type_byte = code as u8;
    match n {
        1 => EncodedTag::two(FIXEXT1, type_byte),
        2 => EncodedTag::two(FIXEXT2, type_byte),
        4 => EncodedTag::two(FIXEXT4, type_byte),
        8 => EncodedTag::two(FIXEXT8, type_byte),
        16 => EncodedTag::two(FIXEXT16, type_byte),
        n if n <= u8::MAX as u32 => {
            let mut buf = [0u8; MAX_TAG_BYTES];
            buf[0] = EXT8;
            buf[1] = n as u8;
            buf[2] = type_byte;
            EncodedTag { buf, len: 3 }
        }
        n if n <= u16::MAX as u32 => {
            let mut buf = [0u8; MAX_TAG_BYTES];
            buf[0] = EXT16;
            BigEndian::write_u16(&mut buf[1..], n as u16);
            buf[3] = type_byte;
            EncodedTag { buf, len: 4 }
        }
        n => {
            let mut buf = [0u8; MAX_TAG_BYTES];
            buf[0] = EXT32;
            BigEndian::write_u32(&mut buf[1..], n);
            buf[5] = type_byte;
            EncodedTag { buf, len: 6 }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enc(tag: Tag) -> Vec<u8> {
        encode_tag(tag, Version::V5).unwrap().as_bytes().to_vec()
    }

    #[test]
    fn scalars() {
        assert_eq!(enc(Tag::Nil), [0xc0]);
        assert_eq!(enc(Tag::Bool(false)), [0xc2]);
        assert_eq!(enc(Tag::Bool(true)), [0xc3]);
    }

    /// Integers pick the smallest covering form.
    #[test]
    fn minimal_integers() {
        assert_eq!(enc(Tag::Uint(1)), [0x01]);
        assert_eq!(enc(Tag::Uint(127)), [0x7f]);
        assert_eq!(enc(Tag::Uint(128)), [0xcc, 0x80]);
        assert_eq!(enc(Tag::Uint(200)), [0xcc, 0xc8]);
        assert_eq!(enc(Tag::Uint(256)), [0xcd, 0x01, 0x00]);
        assert_eq!(enc(Tag::Uint(70000)), [0xce, 0x00, 0x01, 0x11, 0x70]);
        assert_eq!(
            enc(Tag::Uint(u64::MAX)),
            [0xcf, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
        );
        assert_eq!(enc(Tag::Int(-1)), [0xff]);
        assert_eq!(enc(Tag::Int(-32)), [0xe0]);
        assert_eq!(enc(Tag::Int(-33)), [0xd0, 0xdf]);
        assert_eq!(enc(Tag::Int(-128)), [0xd0, 0x80]);
        assert_eq!(enc(Tag::Int(-129)), [0xd1, 0xff, 0x7f]);
        assert_eq!(enc(Tag::Int(-32769)), [0xd2, 0xff, 0xff, 0x7f, 0xff]);
        assert_eq!(
            enc(Tag::Int(i64::MIN)),
            [0xd3, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
        );
        // Non-negative signed values take the unsigned forms.
        assert_eq!(enc(Tag::Int(5)), [0x05]);
        assert_eq!(enc(Tag::Int(300)), [0xcd, 0x01, 0x2c]);
    }

    #[test]
    fn floats_are_big_endian() {
        assert_eq!(enc(Tag::F32(1.0)), [0xca, 0x3f, 0x80, 0x00, 0x00]);
        assert_eq!(
            enc(Tag::F64(1.5)),
            [0xcb, 0x3f, 0xf8, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn str_thresholds() {
        assert_eq!(enc(Tag::Str(0)), [0xa0]);
        assert_eq!(enc(Tag::Str(31)), [0xbf]);
        assert_eq!(enc(Tag::Str(32)), [0xd9, 32]);
        assert_eq!(enc(Tag::Str(255)), [0xd9, 255]);
        assert_eq!(enc(Tag::Str(256)), [0xda, 0x01, 0x00]);
        assert_eq!(enc(Tag::Str(65536)), [0xdb, 0x00, 0x01, 0x00, 0x00]);
    }

    /// v4 has no str8: byte lengths 32..=255 take str16 instead.
    #[test]
    fn str_v4_skips_str8() {
        let e = encode_tag(Tag::Str(40), Version::V4).unwrap();
        assert_eq!(e.as_bytes(), [0xda, 0x00, 40]);
        // fixstr is unchanged.
        let e = encode_tag(Tag::Str(5), Version::V4).unwrap();
        assert_eq!(e.as_bytes(), [0xa5]);
    }

    /// v4 has no bin family: bin degrades to the raw string headers.
    #[test]
    fn bin_v4_degrades_to_raw() {
        let e = encode_tag(Tag::Bin(5), Version::V4).unwrap();
        assert_eq!(e.as_bytes(), [0xa5]);
        let e = encode_tag(Tag::Bin(300), Version::V4).unwrap();
        assert_eq!(e.as_bytes(), [0xda, 0x01, 0x2c]);
    }

    #[test]
    fn bin_v5_thresholds() {
        assert_eq!(enc(Tag::Bin(0)), [0xc4, 0]);
        assert_eq!(enc(Tag::Bin(255)), [0xc4, 255]);
        assert_eq!(enc(Tag::Bin(256)), [0xc5, 0x01, 0x00]);
        assert_eq!(enc(Tag::Bin(65536)), [0xc6, 0x00, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn compound_thresholds() {
        assert_eq!(enc(Tag::Array(15)), [0x9f]);
        assert_eq!(enc(Tag::Array(16)), [0xdc, 0x00, 0x10]);
        assert_eq!(enc(Tag::Array(65536)), [0xdd, 0x00, 0x01, 0x00, 0x00]);
        assert_eq!(enc(Tag::Map(2)), [0x82]);
        assert_eq!(enc(Tag::Map(16)), [0xde, 0x00, 0x10]);
        assert_eq!(enc(Tag::Map(65536)), [0xdf, 0x00, 0x01, 0x00, 0x00]);
    }

    #[cfg(feature = "ext")]
    #[test]
    fn ext_forms() {
        assert_eq!(enc(Tag::Ext(5, 1)), [0xd4, 5]);
        assert_eq!(enc(Tag::Ext(5, 2)), [0xd5, 5]);
        assert_eq!(enc(Tag::Ext(5, 4)), [0xd6, 5]);
        assert_eq!(enc(Tag::Ext(5, 8)), [0xd7, 5]);
        assert_eq!(enc(Tag::Ext(5, 16)), [0xd8, 5]);
        assert_eq!(enc(Tag::Ext(-1, 3)), [0xc7, 3, 0xff]);
        assert_eq!(enc(Tag::Ext(7, 256)), [0xc8, 0x01, 0x00, 7]);
        assert_eq!(enc(Tag::Ext(7, 65536)), [0xc9, 0x00, 0x01, 0x00, 0x00, 7]);
        // Ext is a v5-only family.
        assert_eq!(
            encode_tag(Tag::Ext(1, 4), Version::V4),
            Err(Error::Unsupported)
        );
    }

    #[test]
    fn sentinels_are_bugs() {
        assert_eq!(encode_tag(Tag::Missing, Version::V5), Err(Error::Bug));
        assert_eq!(encode_tag(Tag::Noop, Version::V5), Err(Error::Bug));
    }
}
