// e2e/stream_parse.rs — non-blocking and chunked stream parsing.
//
// Exercises the tree parser's resumable state machine: suspensions at every
// possible byte boundary, cooperative try_parse, and the blocking wrapper.

use btf::read::Source;
use btf::tree::Tree;
use btf::{Error, Result, Writer};

/// Yields scripted slices; an empty script entry means "would block".
struct Scripted {
    steps: Vec<Vec<u8>>,
    next: usize,
}

impl Scripted {
    fn new(steps: Vec<Vec<u8>>) -> Scripted {
        Scripted { steps, next: 0 }
    }
}

impl Source for Scripted {
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.next >= self.steps.len() {
            return Err(Error::Eof);
        }
        let step = &self.steps[self.next];
        if step.is_empty() {
            self.next += 1;
            return Ok(0);
        }
        // Steps are sized below the parser's fill chunk.
        assert!(buf.len() >= step.len(), "fill buffer too small for step");
        buf[..step.len()].copy_from_slice(step);
        self.next += 1;
        Ok(step.len())
    }
}

/// A source that trickles one byte per fill, would-blocking between bytes.
struct Trickle {
    data: Vec<u8>,
    pos: usize,
    ready: bool,
}

impl Source for Trickle {
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.pos == self.data.len() {
            return Err(Error::Eof);
        }
        if !self.ready {
            self.ready = true;
            return Ok(0);
        }
        self.ready = false;
        buf[0] = self.data[self.pos];
        self.pos += 1;
        Ok(1)
    }
}

fn map_doc() -> Vec<u8> {
    vec![0x82, 0xa1, 0x61, 0x01, 0xa1, 0x62, 0xc3]
}

/// The canonical suspension scenario: 3 bytes, a would-block, then the
/// remaining 4.  First try-parse is incomplete without error; the second
/// completes the tree.
#[test]
fn suspend_and_resume_once() {
    let doc = map_doc();
    let src = Scripted::new(vec![doc[..3].to_vec(), vec![], doc[3..].to_vec()]);
    let mut tree = Tree::from_source(src);

    assert_eq!(tree.try_parse(), Ok(false));
    assert_eq!(tree.error(), None);
    assert_eq!(tree.try_parse(), Ok(true));

    let root = tree.root().unwrap();
    assert_eq!(root.map_count().unwrap(), 2);
    assert_eq!(root.map_str("a").unwrap().u64().unwrap(), 1);
    assert!(root.map_str("b").unwrap().bool_value().unwrap());
}

/// Suspending between every single byte still yields the same tree.
#[test]
fn suspend_at_every_byte() {
    let doc = map_doc();
    let mut tree = Tree::from_source(Trickle {
        data: doc,
        pos: 0,
        ready: false,
    });
    let mut rounds = 0;
    loop {
        rounds += 1;
        assert!(rounds < 100, "parser failed to make progress");
        match tree.try_parse() {
            Ok(true) => break,
            Ok(false) => continue,
            Err(e) => panic!("unexpected error {e}"),
        }
    }
    let root = tree.root().unwrap();
    assert_eq!(root.map_str("a").unwrap().u64().unwrap(), 1);
}

/// Every split point of the document works as a two-step delivery.
#[test]
fn all_split_points() {
    let doc = map_doc();
    for split in 1..doc.len() {
        let src = Scripted::new(vec![doc[..split].to_vec(), vec![], doc[split..].to_vec()]);
        let mut tree = Tree::from_source(src);
        // At most one suspension: either the first chunk already finishes
        // the message or the second must.
        let first = tree.try_parse().unwrap();
        if !first {
            assert_eq!(tree.try_parse(), Ok(true), "split {split}");
        }
        let root = tree.root().unwrap();
        assert_eq!(root.map_count().unwrap(), 2, "split {split}");
    }
}

/// The blocking wrapper treats a would-block as an io error.
#[test]
fn blocking_parse_rejects_would_block() {
    let doc = map_doc();
    let src = Scripted::new(vec![doc[..3].to_vec(), vec![]]);
    let mut tree = Tree::from_source(src);
    assert_eq!(tree.parse(), Err(Error::Io));
    assert_eq!(tree.error(), Some(Error::Io));
}

/// A stream that ends mid-message is an io error, not eof.
#[test]
fn stream_truncation_is_io() {
    let doc = map_doc();
    let src = Scripted::new(vec![doc[..5].to_vec()]);
    let mut tree = Tree::from_source(src);
    assert_eq!(tree.parse(), Err(Error::Io));
}

/// A stream that ends cleanly before any message is eof.
#[test]
fn empty_stream_is_eof() {
    let src = Scripted::new(vec![]);
    let mut tree = Tree::from_source(src);
    assert_eq!(tree.parse(), Err(Error::Eof));
}

/// Back-to-back messages across ragged chunk boundaries.
#[test]
fn messages_straddle_chunks() {
    let mut bytes = Vec::new();
    let mut w = Writer::new();
    w.start_array(2);
    w.write_str("first");
    w.write_uint(1);
    w.finish_array();
    bytes.extend(w.into_bytes().unwrap());
    let mut w = Writer::new();
    w.start_map(1);
    w.write_str("second");
    w.write_bool(true);
    w.finish_map();
    bytes.extend(w.into_bytes().unwrap());

    // Deliver in 2-byte chunks with a would-block between each.
    let mut steps = Vec::new();
    for chunk in bytes.chunks(2) {
        steps.push(chunk.to_vec());
        steps.push(vec![]);
    }
    let mut tree = Tree::from_source(Scripted::new(steps));

    let mut parsed = 0;
    while parsed < 2 {
        match tree.try_parse() {
            Ok(true) => {
                parsed += 1;
                let root = tree.root().unwrap();
                if parsed == 1 {
                    assert_eq!(root.array_length().unwrap(), 2);
                    assert_eq!(root.array_at(0).unwrap().as_str().unwrap(), "first");
                } else {
                    assert!(root.map_str("second").unwrap().bool_value().unwrap());
                }
            }
            Ok(false) => {}
            Err(e) => panic!("unexpected error {e}"),
        }
    }
}

/// max_size applies to streams before unbounded buffering can happen.
#[test]
fn stream_max_size_enforced() {
    let huge = vec![0x61u8; 10_000]; // payload bytes for a str16
    let mut bytes = vec![0xda, 0x27, 0x10]; // str16, length 10000
    bytes.extend(huge);
    let steps: Vec<Vec<u8>> = bytes.chunks(128).map(|c| c.to_vec()).collect();
    let mut tree = Tree::from_source_with_limits(
        Scripted::new(steps),
        btf::Limits {
            max_size: 1024,
            max_nodes: 64,
        },
    );
    assert_eq!(tree.parse(), Err(Error::TooBig));
}
