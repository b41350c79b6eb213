#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Feed arbitrary bytes through the tree parser.  Err results are
    // expected and fine; what we verify is no panics, no runaway
    // allocation, and that a successful parse supports every query.

    let limits = btf::Limits {
        max_size: 1 << 20,
        max_nodes: 1 << 16,
    };
    let mut tree = btf::Tree::from_slice_with_limits(data, limits);
    if tree.parse().is_err() {
        return;
    }
    let root = match tree.root() {
        Ok(root) => root,
        Err(_) => return,
    };

    // Walk the whole tree exercising the query surface.
    let mut stack = vec![(root, 0u32)];
    while let Some((node, next)) = stack.pop() {
        use btf::Kind;
        match node.kind() {
            Kind::Array => {
                if next < node.array_length().unwrap_or(0) {
                    stack.push((node, next + 1));
                    if let Ok(child) = node.array_at(next) {
                        stack.push((child, 0));
                    }
                }
            }
            Kind::Map => {
                if next < node.map_count().unwrap_or(0) {
                    stack.push((node, next + 1));
                    if let Ok(k) = node.map_key_at(next) {
                        stack.push((k, 0));
                    }
                    if let Ok(v) = node.map_value_at(next) {
                        stack.push((v, 0));
                    }
                }
            }
            Kind::Str => {
                let _ = node.as_str();
                let _ = node.check_utf8_cstr();
            }
            Kind::Bin => {
                let _ = node.data();
            }
            _ => {
                let _ = node.u64();
                let _ = node.i32();
                let _ = node.f64();
                let _ = node.bool_value();
            }
        }
    }
});
