// Unit tests for src/read — cursor, straddling, tracking, discard.

use btf::read::Source;
use btf::{Error, IoSource, Reader, Result, Tag};

/// A source that hands out its data in fixed-size chunks, forcing
/// straddles at every boundary.
struct Chunked {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
}

impl Chunked {
    fn new(data: &[u8], chunk: usize) -> Chunked {
        Chunked {
            data: data.to_vec(),
            pos: 0,
            chunk,
        }
    }
}

impl Source for Chunked {
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.pos == self.data.len() {
            return Err(Error::Eof);
        }
        let n = self.chunk.min(buf.len()).min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// A seekable source that records how often skip_ahead is used.
struct Skippable {
    inner: Chunked,
    skips: std::rc::Rc<std::cell::Cell<u32>>,
}

impl Source for Skippable {
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.inner.fill(buf)
    }

    fn skip_ahead(&mut self, n: u64) -> Result<bool> {
        self.inner.pos += n as usize;
        self.skips.set(self.skips.get() + 1);
        Ok(true)
    }
}

fn doc() -> Vec<u8> {
    // {"a": 1, "b": true}
    vec![0x82, 0xa1, 0x61, 0x01, 0xa1, 0x62, 0xc3]
}

// ---------------------------------------------------------------------------
// Slice mode
// ---------------------------------------------------------------------------

/// Reading the canonical map document tag by tag.
#[test]
fn reads_map_document() {
    let bytes = doc();
    let mut r = Reader::from_slice(&bytes);
    assert_eq!(r.read_tag(), Tag::Map(2));
    assert_eq!(r.read_tag(), Tag::Str(1));
    assert_eq!(r.read_bytes_inplace(1), b"a");
    r.finish_str();
    assert_eq!(r.read_tag(), Tag::Uint(1));
    assert_eq!(r.read_tag(), Tag::Str(1));
    assert_eq!(r.read_utf8_inplace(1), "b");
    r.finish_str();
    assert_eq!(r.read_tag(), Tag::Bool(true));
    r.finish_map();
    assert!(r.finish().is_ok());
}

/// Peek does not consume: the same tag comes back from read.
#[test]
fn peek_then_read() {
    let bytes = [0xcc, 0xc8];
    let mut r = Reader::from_slice(&bytes);
    assert_eq!(r.peek_tag(), Tag::Uint(200));
    assert_eq!(r.peek_tag(), Tag::Uint(200));
    assert_eq!(r.read_tag(), Tag::Uint(200));
    assert!(r.finish().is_ok());
}

/// The reserved opcode latches invalid; later reads are nil no-ops.
#[test]
fn reserved_byte_latches_invalid() {
    let bytes = [0xc1, 0x01];
    let mut r = Reader::from_slice(&bytes);
    assert_eq!(r.read_tag(), Tag::Nil);
    assert_eq!(r.error(), Some(Error::Invalid));
    assert_eq!(r.read_tag(), Tag::Nil);
    assert_eq!(r.error(), Some(Error::Invalid));
    assert_eq!(r.finish(), Err(Error::Invalid));
}

/// A blob shorter than its own header claims is invalid.
#[test]
fn truncated_blob_is_invalid() {
    let bytes = [0xa5, b'h', b'i']; // fixstr(5) with 2 payload bytes
    let mut r = Reader::from_slice(&bytes);
    assert_eq!(r.read_tag(), Tag::Str(5));
    let mut dst = [0u8; 5];
    r.read_bytes(&mut dst);
    assert_eq!(r.error(), Some(Error::Invalid));
}

/// The error hook fires exactly once.
#[test]
fn error_hook_fires_once() {
    let count = std::cell::Cell::new(0u32);
    let bytes = [0xc1];
    let mut r = Reader::from_slice(&bytes);
    r.set_error_hook(|_| count.set(count.get() + 1));
    r.read_tag();
    r.read_tag();
    drop(r);
    assert_eq!(count.get(), 1);
}

// ---------------------------------------------------------------------------
// Stream mode
// ---------------------------------------------------------------------------

/// One-byte chunks force a straddle on every multi-byte header.
#[test]
fn straddling_fills() {
    let bytes = doc();
    for chunk in 1..=bytes.len() {
        let mut r = Reader::with_source(16, Chunked::new(&bytes, chunk));
        assert_eq!(r.read_tag(), Tag::Map(2), "chunk {chunk}");
        assert_eq!(r.read_tag(), Tag::Str(1));
        let mut k = [0u8; 1];
        r.read_bytes(&mut k);
        assert_eq!(&k, b"a");
        r.finish_str();
        assert_eq!(r.read_tag(), Tag::Uint(1));
        r.discard(); // "b": true key
        r.discard();
        r.finish_map();
        assert!(r.finish().is_ok(), "chunk {chunk}");
    }
}

/// A payload much larger than the buffer reads straight into the caller's
/// destination.
#[test]
fn large_payload_reads_direct() {
    let payload: Vec<u8> = (0..100_000u32).map(|i| i as u8).collect();
    let mut bytes = vec![0xc6];
    bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    bytes.extend_from_slice(&payload);

    let mut r = Reader::with_source(64, Chunked::new(&bytes, 1000));
    assert_eq!(r.read_tag(), Tag::Bin(payload.len() as u32));
    let mut dst = vec![0u8; payload.len()];
    r.read_bytes(&mut dst);
    assert_eq!(dst, payload);
    r.finish_bin();
    assert!(r.finish().is_ok());
}

/// An in-place read can never exceed the buffer.
#[test]
fn inplace_read_bounded_by_buffer() {
    let mut bytes = vec![0xc4, 200];
    bytes.extend_from_slice(&[7u8; 200]);
    let mut r = Reader::with_source(16, Chunked::new(&bytes, 16));
    assert_eq!(r.read_tag(), Tag::Bin(200));
    assert!(r.read_bytes_inplace(200).is_empty());
    assert_eq!(r.error(), Some(Error::TooBig));
}

/// Large skips go through the source's seek capability.
#[test]
fn skip_uses_seek_when_available() {
    let payload = vec![9u8; 10_000];
    let mut bytes = vec![0xc5];
    bytes.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    bytes.extend_from_slice(&payload);
    bytes.push(0xc3); // trailing true

    let skips = std::rc::Rc::new(std::cell::Cell::new(0));
    let src = Skippable {
        inner: Chunked::new(&bytes, 64),
        skips: skips.clone(),
    };
    let mut r = Reader::with_source(64, src);
    assert_eq!(r.read_tag(), Tag::Bin(10_000));
    r.skip_bytes(10_000);
    r.finish_bin();
    assert_eq!(r.read_tag(), Tag::Bool(true));
    assert!(r.finish().is_ok());
    assert!(skips.get() >= 1);
}

/// Without seek support skips fall back to fill-and-drop.
#[test]
fn skip_falls_back_to_fills() {
    let payload = vec![9u8; 5_000];
    let mut bytes = vec![0xc5];
    bytes.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    bytes.extend_from_slice(&payload);
    bytes.push(0xc2);

    let mut r = Reader::with_source(64, Chunked::new(&bytes, 100));
    assert_eq!(r.read_tag(), Tag::Bin(5_000));
    r.skip_bytes(5_000);
    r.finish_bin();
    assert_eq!(r.read_tag(), Tag::Bool(false));
    assert!(r.finish().is_ok());
}

/// A clean end between messages latches eof, not io.
#[test]
fn clean_end_is_eof() {
    let bytes = [0x01];
    let mut r = Reader::with_source(16, Chunked::new(&bytes, 1));
    assert_eq!(r.read_tag(), Tag::Uint(1));
    assert_eq!(r.read_tag(), Tag::Nil);
    assert_eq!(r.error(), Some(Error::Eof));
}

/// An end mid-message latches io.
#[test]
fn mid_message_end_is_io() {
    let bytes = [0xce, 0x00, 0x01]; // u32 header cut short
    let mut r = Reader::with_source(16, Chunked::new(&bytes, 3));
    assert_eq!(r.read_tag(), Tag::Nil);
    assert_eq!(r.error(), Some(Error::Io));
}

/// IoSource adapts std readers.
#[test]
fn io_source_adapter() {
    let bytes = doc();
    let mut r = Reader::from_source(IoSource(std::io::Cursor::new(bytes)));
    assert_eq!(r.read_tag(), Tag::Map(2));
    r.discard(); // key "a"
    r.discard(); // value 1
    r.discard(); // key "b"
    r.discard(); // value true
    r.finish_map();
    assert!(r.finish().is_ok());
}

// ---------------------------------------------------------------------------
// Discard and UTF-8
// ---------------------------------------------------------------------------

/// discard consumes exactly one whole value, however nested.
#[test]
fn discard_whole_values() {
    let mut w = btf::Writer::new();
    w.start_array(3);
    w.start_map(2);
    w.write_str("k1");
    w.start_array(2);
    w.write_int(1);
    w.write_int(2);
    w.finish_array();
    w.write_str("k2");
    w.write_bin(&[1, 2, 3]);
    w.finish_map();
    w.write_nil();
    w.write_uint(7);
    w.finish_array();
    let bytes = w.into_bytes().unwrap();

    let mut r = Reader::from_slice(&bytes);
    assert_eq!(r.read_tag(), Tag::Array(3));
    r.discard(); // the whole map
    r.discard(); // nil
    assert_eq!(r.read_tag(), Tag::Uint(7));
    r.finish_array();
    assert!(r.finish().is_ok());
}

/// Deep nesting does not overflow the call stack during discard.
#[test]
fn discard_survives_deep_nesting() {
    let depth = 100_000;
    let mut bytes = vec![0x91; depth];
    bytes.push(0xc0);
    let mut r = Reader::from_slice(&bytes);
    r.discard();
    assert!(r.finish().is_ok());
}

/// UTF-8 reads reject invalid payload with a type error.
#[test]
fn utf8_read_rejects_bad_bytes() {
    let bytes = [0xa2, 0xc3, 0x28]; // fixstr(2), invalid UTF-8
    let mut r = Reader::from_slice(&bytes);
    assert_eq!(r.read_tag(), Tag::Str(2));
    assert_eq!(r.read_utf8_inplace(2), "");
    assert_eq!(r.error(), Some(Error::Type));
}

/// The copying UTF-8 variant behaves identically.
#[test]
fn utf8_copy_rejects_bad_bytes() {
    let bytes = [0xa2, 0xed, 0xa0]; // truncated surrogate
    let mut r = Reader::from_slice(&bytes);
    assert_eq!(r.read_tag(), Tag::Str(2));
    let mut dst = [0u8; 2];
    r.read_utf8(&mut dst);
    assert_eq!(r.error(), Some(Error::Type));
}

#[cfg(feature = "ext")]
mod ext {
    use super::*;
    use btf::Timestamp;

    /// Timestamps round-trip through the reader.
    #[test]
    fn timestamp_roundtrip() {
        for ts in [
            Timestamp::new(0, 0).unwrap(),
            Timestamp::new(1_700_000_000, 123).unwrap(),
            Timestamp::new(-1, 5).unwrap(),
        ] {
            let mut w = btf::Writer::new();
            w.write_timestamp(ts);
            let bytes = w.into_bytes().unwrap();
            let mut r = Reader::from_slice(&bytes);
            assert_eq!(r.read_timestamp(), ts);
            assert!(r.finish().is_ok());
        }
    }

    /// A wrong payload length is invalid.
    #[test]
    fn timestamp_bad_length() {
        let mut w = btf::Writer::new();
        w.write_ext(-1, &[0u8; 5]);
        let bytes = w.into_bytes().unwrap();
        let mut r = Reader::from_slice(&bytes);
        r.read_timestamp();
        assert_eq!(r.error(), Some(Error::Invalid));
    }

    /// A non-timestamp ext code is invalid for read_timestamp.
    #[test]
    fn timestamp_wrong_code() {
        let mut w = btf::Writer::new();
        w.write_ext(3, &[0u8; 4]);
        let bytes = w.into_bytes().unwrap();
        let mut r = Reader::from_slice(&bytes);
        r.read_timestamp();
        assert_eq!(r.error(), Some(Error::Invalid));
    }
}
