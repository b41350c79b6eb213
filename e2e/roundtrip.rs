// e2e/roundtrip.rs — encode → decode equality across the three surfaces.
//
// Every document the writer can produce must read back identically through
// the streaming reader and materialize identically through the tree parser.

use btf::tree::Tree;
use btf::{Reader, Tag, Writer};

/// Deterministic pseudo-random stream (xorshift); no external seeds so the
/// suite is reproducible.
struct Rng(u64);

impl Rng {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}

/// Writes one pseudo-random value and records the expected tag sequence.
fn write_value(w: &mut Writer, rng: &mut Rng, depth: u32, expect: &mut Vec<Tag>) {
    let choice = if depth >= 4 { rng.below(7) } else { rng.below(9) };
    match choice {
        0 => {
            w.write_nil();
            expect.push(Tag::Nil);
        }
        1 => {
            let b = rng.below(2) == 1;
            w.write_bool(b);
            expect.push(Tag::Bool(b));
        }
        2 => {
            let v = rng.next() as i64;
            w.write_int(v);
            expect.push(if v >= 0 { Tag::Uint(v as u64) } else { Tag::Int(v) });
        }
        3 => {
            let v = rng.next();
            w.write_uint(v);
            expect.push(Tag::Uint(v));
        }
        4 => {
            let v = f32::from_bits(rng.next() as u32);
            w.write_f32(v);
            expect.push(Tag::F32(v));
        }
        5 => {
            let v = f64::from_bits(rng.next());
            w.write_f64(v);
            expect.push(Tag::F64(v));
        }
        6 => {
            let len = rng.below(40) as usize;
            let s: String = (0..len).map(|_| (b'a' + rng.below(26) as u8) as char).collect();
            w.write_str(&s);
            expect.push(Tag::Str(s.len() as u32));
        }
        7 => {
            let n = rng.below(5) as u32;
            w.start_array(n);
            expect.push(Tag::Array(n));
            for _ in 0..n {
                write_value(w, rng, depth + 1, expect);
            }
            w.finish_array();
        }
        _ => {
            let n = rng.below(4) as u32;
            w.start_map(n);
            expect.push(Tag::Map(n));
            for i in 0..n {
                // Unique keys so tree lookups stay well-defined.
                w.write_str(&format!("k{i}"));
                expect.push(Tag::Str(if i < 10 { 2 } else { 3 }));
                write_value(w, rng, depth + 1, expect);
            }
            w.finish_map();
        }
    }
}

/// Reads one value back, comparing each tag against the recorded sequence.
fn read_value(r: &mut Reader, expect: &mut std::vec::IntoIter<Tag>) {
    let tag = r.read_tag();
    let want = expect.next().expect("reader produced more tags than written");
    assert_eq!(tag, want);
    match tag {
        Tag::Str(n) => {
            let got = r.read_bytes_inplace(n as usize).to_vec();
            assert_eq!(got.len(), n as usize);
            r.finish_str();
        }
        Tag::Bin(n) => {
            r.skip_bytes(n as usize);
            r.finish_bin();
        }
        Tag::Array(n) => {
            for _ in 0..n {
                read_value(r, expect);
            }
            r.finish_array();
        }
        Tag::Map(n) => {
            for _ in 0..2 * n {
                read_value(r, expect);
            }
            r.finish_map();
        }
        _ => {}
    }
}

/// Round-trip a few hundred random documents through the reader.
#[test]
fn random_documents_through_reader() {
    let mut rng = Rng(0x9e37_79b9_7f4a_7c15);
    for _ in 0..300 {
        let mut expect = Vec::new();
        let mut w = Writer::new();
        write_value(&mut w, &mut rng, 0, &mut expect);
        let bytes = w.into_bytes().unwrap();

        let mut r = Reader::from_slice(&bytes);
        let mut iter = expect.into_iter();
        read_value(&mut r, &mut iter);
        assert!(iter.next().is_none(), "writer produced extra tags");
        assert!(r.finish().is_ok());
    }
}

/// The same random documents parse into trees without error, and the tree
/// reports exactly the bytes written.
#[test]
fn random_documents_through_tree() {
    let mut rng = Rng(0x2545_f491_4f6c_dd1d);
    for _ in 0..300 {
        let mut expect = Vec::new();
        let mut w = Writer::new();
        write_value(&mut w, &mut rng, 0, &mut expect);
        let bytes = w.into_bytes().unwrap();

        let mut tree = Tree::from_slice(&bytes);
        tree.parse().unwrap();
        assert_eq!(tree.size(), bytes.len());
    }
}

/// Scalar boundary values survive writer → reader intact.
#[test]
fn boundary_scalars_roundtrip() {
    let values: Vec<Tag> = vec![
        Tag::Nil,
        Tag::Bool(false),
        Tag::Bool(true),
        Tag::Uint(0),
        Tag::Uint(127),
        Tag::Uint(128),
        Tag::Uint(255),
        Tag::Uint(256),
        Tag::Uint(65535),
        Tag::Uint(65536),
        Tag::Uint(u32::MAX as u64),
        Tag::Uint(u32::MAX as u64 + 1),
        Tag::Uint(u64::MAX),
        Tag::Int(-1),
        Tag::Int(-32),
        Tag::Int(-33),
        Tag::Int(-128),
        Tag::Int(-129),
        Tag::Int(-32768),
        Tag::Int(-32769),
        Tag::Int(i32::MIN as i64),
        Tag::Int(i32::MIN as i64 - 1),
        Tag::Int(i64::MIN),
        Tag::F32(f32::MIN_POSITIVE),
        Tag::F32(f32::NAN),
        Tag::F64(f64::MAX),
        Tag::F64(f64::NAN),
    ];
    let mut w = Writer::new();
    w.start_array(values.len() as u32);
    for &tag in &values {
        w.write_tag(tag);
    }
    w.finish_array();
    let bytes = w.into_bytes().unwrap();

    let mut r = Reader::from_slice(&bytes);
    assert_eq!(r.read_tag(), Tag::Array(values.len() as u32));
    for &want in &values {
        assert_eq!(r.read_tag(), want);
    }
    r.finish_array();
    assert!(r.finish().is_ok());
}

/// A tree parse of encoder output re-encodes to the identical bytes.
#[test]
fn tree_values_match_written_values() {
    let mut w = Writer::new();
    w.start_map(3);
    w.write_str("numbers");
    w.start_array(4);
    w.write_int(-7);
    w.write_uint(7);
    w.write_f64(3.25);
    w.write_f32(-0.5);
    w.finish_array();
    w.write_str("blob");
    w.write_bin(&[0, 1, 2, 254, 255]);
    w.write_str("flag");
    w.write_bool(false);
    w.finish_map();
    let bytes = w.into_bytes().unwrap();

    let mut tree = Tree::from_slice(&bytes);
    tree.parse().unwrap();
    let root = tree.root().unwrap();
    let numbers = root.map_str("numbers").unwrap();
    assert_eq!(numbers.array_at(0).unwrap().i64().unwrap(), -7);
    assert_eq!(numbers.array_at(1).unwrap().u64().unwrap(), 7);
    assert_eq!(numbers.array_at(2).unwrap().f64_strict().unwrap(), 3.25);
    assert_eq!(numbers.array_at(3).unwrap().f32_strict().unwrap(), -0.5);
    assert_eq!(root.map_str("blob").unwrap().data().unwrap(), &[0, 1, 2, 254, 255]);
    assert!(!root.map_str("flag").unwrap().bool_value().unwrap());
}
