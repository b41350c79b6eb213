#![no_main]
use libfuzzer_sys::fuzz_target;

use btf::wire::{encode_tag, parse_tag, Version};

fuzz_target!(|data: &[u8]| {
    // Parse one header from arbitrary bytes; when it parses, re-encoding
    // the tag must produce bytes that parse back to the same tag in the
    // same number of bytes or fewer (the encoder is minimal, the input
    // may not be).

    let (tag, consumed) = match parse_tag(data) {
        Ok(parsed) => parsed,
        Err(_) => return,
    };
    let encoded = match encode_tag(tag, Version::V5) {
        Ok(encoded) => encoded,
        Err(_) => return,
    };
    assert!(encoded.len() <= consumed, "encoder produced a larger form");
    let (again, n) = parse_tag(encoded.as_bytes()).expect("re-parse failed");
    assert_eq!(n, encoded.len());
    assert_eq!(again, tag, "round-trip changed the tag");
});
