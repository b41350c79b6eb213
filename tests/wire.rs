// Unit tests for src/wire — opcode dispatch, minimal encoding, parsing.
//
// Verifies:
//   - the full first-byte opcode table
//   - minimal-form selection for every integer width boundary
//   - encode/parse agreement for every form the encoder can produce

use btf::tag::Tag;
use btf::wire::{encode_tag, header_len, parse_tag, Version, MAX_TAG_BYTES};
use btf::Error;

fn roundtrip(tag: Tag) {
    let encoded = encode_tag(tag, Version::V5).unwrap();
    let (parsed, consumed) = parse_tag(encoded.as_bytes()).unwrap();
    assert_eq!(parsed, tag, "tag {tag:?} did not round-trip");
    assert_eq!(consumed, encoded.len());
}

// ---------------------------------------------------------------------------
// Canonical byte sequences
// ---------------------------------------------------------------------------

/// nil encodes to C0 and parses back with one byte consumed.
#[test]
fn nil_is_c0() {
    let e = encode_tag(Tag::Nil, Version::V5).unwrap();
    assert_eq!(e.as_bytes(), [0xc0]);
    assert_eq!(parse_tag(&[0xc0]).unwrap(), (Tag::Nil, 1));
}

/// u64=1 is a positive fixint; 200 needs u8; 70000 needs u32.
#[test]
fn unsigned_canonical_forms() {
    assert_eq!(encode_tag(Tag::Uint(1), Version::V5).unwrap().as_bytes(), [0x01]);
    assert_eq!(
        encode_tag(Tag::Uint(200), Version::V5).unwrap().as_bytes(),
        [0xcc, 0xc8]
    );
    assert_eq!(
        encode_tag(Tag::Uint(70000), Version::V5).unwrap().as_bytes(),
        [0xce, 0x00, 0x01, 0x11, 0x70]
    );
}

/// "hello"-sized strings are fixstr; the 1.5 f64 bit pattern is exact.
#[test]
fn str_and_float_canonical_forms() {
    assert_eq!(encode_tag(Tag::Str(5), Version::V5).unwrap().as_bytes(), [0xa5]);
    assert_eq!(
        encode_tag(Tag::F64(1.5), Version::V5).unwrap().as_bytes(),
        [0xcb, 0x3f, 0xf8, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
    );
}

// ---------------------------------------------------------------------------
// Minimal encoding property
// ---------------------------------------------------------------------------

/// Every integer takes 1 byte in [-32, 127], else the smallest of 2/3/5/9.
#[test]
fn integer_encoding_is_minimal() {
    let cases: &[(i64, usize)] = &[
        (0, 1),
        (127, 1),
        (-32, 1),
        (-1, 1),
        (128, 2),
        (255, 2),
        (-33, 2),
        (-128, 2),
        (256, 3),
        (65535, 3),
        (-129, 3),
        (-32768, 3),
        (65536, 5),
        (4294967295, 5),
        (-32769, 5),
        (-2147483648, 5),
        (4294967296, 9),
        (i64::MAX, 9),
        (-2147483649, 9),
        (i64::MIN, 9),
    ];
    for &(value, expected) in cases {
        let e = encode_tag(Tag::Int(value), Version::V5).unwrap();
        assert_eq!(e.len(), expected, "int {value}");
    }
    // The unsigned top half only reaches through Uint.
    let e = encode_tag(Tag::Uint(u64::MAX), Version::V5).unwrap();
    assert_eq!(e.len(), 9);
}

/// Compound headers step up at 15 (fix) and 65535 (16-bit).
#[test]
fn compound_header_thresholds() {
    for (tag, len) in [
        (Tag::Array(15), 1),
        (Tag::Array(16), 3),
        (Tag::Array(65535), 3),
        (Tag::Array(65536), 5),
        (Tag::Map(15), 1),
        (Tag::Map(16), 3),
        (Tag::Map(65536), 5),
    ] {
        assert_eq!(encode_tag(tag, Version::V5).unwrap().len(), len, "{tag:?}");
    }
}

// ---------------------------------------------------------------------------
// Encode/parse agreement
// ---------------------------------------------------------------------------

#[test]
fn all_scalar_forms_roundtrip() {
    for v in [0i64, 1, 127, 128, 255, 256, 65535, 65536, -1, -32, -33, -128, -129, i64::MIN] {
        roundtrip(Tag::Int(v));
    }
    for v in [0u64, 127, 128, 65536, u32::MAX as u64, u64::MAX] {
        roundtrip(Tag::Uint(v));
    }
    roundtrip(Tag::Nil);
    roundtrip(Tag::Bool(true));
    roundtrip(Tag::Bool(false));
    for f in [0.0f32, -0.0, 1.5, f32::INFINITY, f32::NAN] {
        roundtrip(Tag::F32(f));
    }
    for f in [0.0f64, -0.0, 1.5, f64::NEG_INFINITY, f64::NAN] {
        roundtrip(Tag::F64(f));
    }
}

#[test]
fn all_compound_forms_roundtrip() {
    for n in [0u32, 1, 15, 16, 31, 32, 255, 256, 65535, 65536, u32::MAX] {
        roundtrip(Tag::Str(n));
        roundtrip(Tag::Bin(n));
        roundtrip(Tag::Array(n));
        roundtrip(Tag::Map(n));
    }
}

#[cfg(feature = "ext")]
#[test]
fn all_ext_forms_roundtrip() {
    for n in [0u32, 1, 2, 3, 4, 8, 16, 17, 255, 256, 65535, 65536] {
        for code in [-128i8, -1, 0, 5, 127] {
            roundtrip(Tag::Ext(code, n));
        }
    }
}

// ---------------------------------------------------------------------------
// Adversarial headers
// ---------------------------------------------------------------------------

/// 0xC1 is reserved and must fail as invalid, not panic or misparse.
#[test]
fn reserved_byte_is_invalid() {
    assert_eq!(header_len(0xc1), Err(Error::Invalid));
    assert_eq!(parse_tag(&[0xc1]), Err(Error::Invalid));
}

/// Truncated multi-byte headers fail as invalid for every opcode family.
#[test]
fn truncated_header_is_invalid() {
    for op in [0xccu8, 0xcd, 0xce, 0xcf, 0xd0, 0xd1, 0xd2, 0xd3, 0xca, 0xcb, 0xd9, 0xda, 0xdb,
               0xc4, 0xc5, 0xc6, 0xdc, 0xdd, 0xde, 0xdf] {
        let needed = header_len(op).unwrap();
        for short in 0..needed {
            let mut bytes = vec![op];
            bytes.resize(short.max(1), 0);
            if bytes.len() < needed {
                assert_eq!(parse_tag(&bytes), Err(Error::Invalid), "op {op:#04x} len {short}");
            }
        }
    }
}

/// No header is ever longer than the published maximum.
#[test]
fn header_lengths_bounded() {
    for b in 0..=255u8 {
        if let Ok(n) = header_len(b) {
            assert!(n <= MAX_TAG_BYTES);
        }
    }
}
