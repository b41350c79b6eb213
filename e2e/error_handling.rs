// e2e/error_handling.rs — the error taxonomy and the latch discipline.
//
// Covers: which kind each failure class maps to, that the first latched
// error wins and persists, that hooks fire exactly once, and that every
// post-error operation is a harmless no-op.

use btf::read::Source;
use btf::tree::Tree;
use btf::{Error, Reader, Result, Tag, Writer};

// ---------------------------------------------------------------------------
// Taxonomy mapping
// ---------------------------------------------------------------------------

/// invalid: malformed wire bytes.
#[test]
fn malformed_bytes_are_invalid() {
    // Reserved opcode.
    let mut tree = Tree::from_slice(&[0xc1]);
    assert_eq!(tree.parse(), Err(Error::Invalid));
    // Truncated blob.
    let mut tree = Tree::from_slice(&[0xcc]);
    assert_eq!(tree.parse(), Err(Error::Invalid));
    // Header lying about its children.
    let mut tree = Tree::from_slice(&[0x84, 0xc0]);
    assert_eq!(tree.parse(), Err(Error::Invalid));
}

/// too_big: configured bounds, not malformed data.
#[test]
fn bounds_are_too_big() {
    let bytes = [0x93, 1, 2, 3];
    let mut tree = Tree::from_slice_with_limits(
        &bytes,
        btf::Limits {
            max_size: 2,
            max_nodes: 64,
        },
    );
    assert_eq!(tree.parse(), Err(Error::TooBig));
}

/// bug: structural misuse by the caller, on both streaming surfaces.
#[test]
fn misuse_is_bug() {
    let mut w = Writer::new();
    w.finish_array();
    assert_eq!(w.error(), Some(Error::Bug));

    let bytes = [0x91, 0xc0];
    let mut r = Reader::from_slice(&bytes);
    assert_eq!(r.read_tag(), Tag::Array(1));
    r.finish_map(); // wrong kind
    assert_eq!(r.error(), Some(Error::Bug));
}

/// data: an application-level abort, latched explicitly.
#[test]
fn explicit_flag_is_data() {
    let bytes = [0x91, 0xc0];
    let mut r = Reader::from_slice(&bytes);
    assert_eq!(r.read_tag(), Tag::Array(1));
    r.flag_error(Error::Data);
    // Destroy does not assert balance once an error is latched.
    assert_eq!(r.finish(), Err(Error::Data));
}

/// eof vs io: clean end between messages vs end inside one.
#[test]
fn eof_vs_io() {
    struct Ends(Vec<u8>, usize);
    impl Source for Ends {
        fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
            if self.1 == self.0.len() {
                return Err(Error::Eof);
            }
            let n = buf.len().min(self.0.len() - self.1);
            buf[..n].copy_from_slice(&self.0[self.1..self.1 + n]);
            self.1 += n;
            Ok(n)
        }
    }

    // Complete message then end: second parse is a clean eof.
    let mut tree = Tree::from_source(Ends(vec![0x01], 0));
    tree.parse().unwrap();
    assert_eq!(tree.parse(), Err(Error::Eof));

    // End inside a message: io.
    let mut tree = Tree::from_source(Ends(vec![0x92, 0x01], 0));
    assert_eq!(tree.parse(), Err(Error::Io));
}

// ---------------------------------------------------------------------------
// Latch discipline (idempotence)
// ---------------------------------------------------------------------------

/// Property: after latching E, every operation is a no-op returning zero
/// values, the hook never re-fires, and error() still reports E.
#[test]
fn writer_latch_is_idempotent() {
    let fired = std::cell::Cell::new(0u32);
    let mut w = Writer::new();
    w.set_error_hook(|_| fired.set(fired.get() + 1));
    w.flag_error(Error::Data);

    let before = w.position();
    w.write_uint(1);
    w.write_str("ignored");
    w.start_map(3);
    w.finish_array();
    w.flag_error(Error::Io); // must not overwrite
    assert_eq!(w.position(), before);
    assert_eq!(w.error(), Some(Error::Data));
    drop(w);
    assert_eq!(fired.get(), 1);
}

#[test]
fn reader_latch_is_idempotent() {
    let fired = std::cell::Cell::new(0u32);
    let bytes = [0xc1, 0x01, 0x02];
    let mut r = Reader::from_slice(&bytes);
    r.set_error_hook(|_| fired.set(fired.get() + 1));

    assert_eq!(r.read_tag(), Tag::Nil);
    assert_eq!(r.error(), Some(Error::Invalid));
    // Every subsequent operation returns zero values.
    assert_eq!(r.read_tag(), Tag::Nil);
    assert_eq!(r.peek_tag(), Tag::Nil);
    assert!(r.read_bytes_inplace(1).is_empty());
    assert_eq!(r.read_utf8_inplace(1), "");
    r.discard();
    assert_eq!(r.error(), Some(Error::Invalid));
    drop(r);
    assert_eq!(fired.get(), 1);
}

#[test]
fn tree_latch_is_idempotent() {
    let fired = std::cell::Cell::new(0u32);
    let mut tree = Tree::from_slice(&[0xc1]);
    tree.set_error_hook(|_| fired.set(fired.get() + 1));

    assert_eq!(tree.parse(), Err(Error::Invalid));
    // Re-parsing after an error is a no-op returning the same error.
    assert_eq!(tree.parse(), Err(Error::Invalid));
    assert_eq!(tree.try_parse(), Err(Error::Invalid));
    assert_eq!(tree.root().unwrap_err(), Error::Invalid);
    assert_eq!(tree.error(), Some(Error::Invalid));
    drop(tree);
    assert_eq!(fired.get(), 1);
}

/// A hook that unwinds must leave the instance destroyable.
#[test]
fn unwinding_hook_leaves_latch_set() {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let mut w = Writer::new();
        w.set_error_hook(|_| panic!("hook unwound"));
        w.flag_error(Error::Data);
    }));
    assert!(result.is_err());
    // A fresh writer still works; nothing global was poisoned.
    let mut w = Writer::new();
    w.write_uint(1);
    assert!(w.into_bytes().is_ok());
}

/// Destroying a writer twice worth of state after an error invokes no
/// further callbacks (drop after finish-by-error).
#[test]
fn destroy_after_error_skips_callbacks() {
    struct CountingSink(std::rc::Rc<std::cell::Cell<u32>>);
    impl btf::Sink for CountingSink {
        fn write_all(&mut self, _data: &[u8]) -> Result<()> {
            Err(Error::Io)
        }
        fn teardown(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    let teardowns = std::rc::Rc::new(std::cell::Cell::new(0u32));
    let mut w = Writer::with_sink(64, CountingSink(teardowns.clone()));
    w.write_bin(&[0u8; 128]); // forces a flush, which fails
    assert_eq!(w.error(), Some(Error::Io));
    drop(w);
    // Teardown runs exactly once even though the sink failed earlier.
    assert_eq!(teardowns.get(), 1);
}

#[cfg(not(feature = "ext"))]
mod ext_disabled {
    use super::*;

    /// unsupported: well-formed ext bytes with the feature off.
    #[test]
    fn ext_is_unsupported() {
        let mut r = Reader::from_slice(&[0xd4, 0x01, 0xaa]);
        assert_eq!(r.read_tag(), Tag::Nil);
        assert_eq!(r.error(), Some(Error::Unsupported));

        let mut w = Writer::new();
        w.write_tag(Tag::Ext(1, 1));
        assert_eq!(w.error(), Some(Error::Unsupported));
    }
}
