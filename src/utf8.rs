//! Strict UTF-8 validation predicates.
//!
//! Wire strings are length-prefixed byte runs with no terminator; UTF-8
//! validity is only checked on request.  The rules are the strict ones:
//! overlong sequences, surrogate code points, and code points beyond
//! U+10FFFF are all rejected.  `core::str::from_utf8` implements exactly
//! this set, so validation delegates to it.

/// `bytes` as `&str` when it is valid UTF-8, `None` otherwise.
///
/// The single place the crate converts raw payload to text; every other
/// surface routes through this or [`check_utf8`].
pub fn as_utf8(bytes: &[u8]) -> Option<&str> {
    core::str::from_utf8(bytes).ok()
}

/// True iff `bytes` is valid UTF-8.
pub fn check_utf8(bytes: &[u8]) -> bool {
    as_utf8(bytes).is_some()
}

/// True iff `bytes` is valid UTF-8 containing no NUL byte, making it safe
/// to hand to NUL-terminated consumers.
pub fn check_utf8_cstr(bytes: &[u8]) -> bool {
    !bytes.contains(&0) && check_utf8(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ascii_and_multibyte() {
        assert!(check_utf8(b""));
        assert!(check_utf8(b"hello"));
        assert!(check_utf8("héllo δ 漢 🎉".as_bytes()));
    }

    /// Overlong encodings must be rejected even though they decode to
    /// valid code points.
    #[test]
    fn rejects_overlong_sequences() {
        // 2-byte overlong NUL.
        assert!(!check_utf8(&[0xc0, 0x80]));
        // 3-byte overlong '/'.
        assert!(!check_utf8(&[0xe0, 0x80, 0xaf]));
        // 4-byte overlong.
        assert!(!check_utf8(&[0xf0, 0x80, 0x80, 0xaf]));
    }

    /// Surrogate code points (U+D800..U+DFFF) are not scalar values.
    #[test]
    fn rejects_surrogates() {
        assert!(!check_utf8(&[0xed, 0xa0, 0x80])); // U+D800
        assert!(!check_utf8(&[0xed, 0xbf, 0xbf])); // U+DFFF
    }

    #[test]
    fn rejects_beyond_max_code_point() {
        assert!(!check_utf8(&[0xf4, 0x90, 0x80, 0x80])); // U+110000
        assert!(!check_utf8(&[0xf5, 0x80, 0x80, 0x80]));
    }

    #[test]
    fn rejects_truncated_sequences() {
        assert!(!check_utf8(&[0xe2, 0x82]));
        assert!(!check_utf8(&[0xc3]));
        assert!(!check_utf8(&[0x80]));
    }

    #[test]
    fn cstr_additionally_rejects_nul() {
        assert!(check_utf8(b"a\0b"));
        assert!(!check_utf8_cstr(b"a\0b"));
        assert!(check_utf8_cstr(b"ab"));
    }

    #[test]
    fn as_utf8_converts_or_refuses() {
        assert_eq!(as_utf8(b"hello"), Some("hello"));
        assert_eq!(as_utf8(&[0xc3, 0x28]), None);
    }
}
