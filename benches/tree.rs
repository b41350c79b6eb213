//! Criterion benchmarks for the bounded tree parser and node queries.
//!
//! Run with:
//!   cargo bench --bench tree

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use btf::tree::Tree;
use btf::Writer;

fn build_doc(entries: u32) -> Vec<u8> {
    let mut w = Writer::new();
    w.start_array(entries);
    for i in 0..entries {
        w.start_map(3);
        w.write_str("id");
        w.write_uint(i as u64);
        w.write_str("name");
        w.write_str(&format!("record-{i:06}"));
        w.write_str("score");
        w.write_f64(i as f64 / 3.0);
        w.finish_map();
    }
    w.finish_array();
    w.into_bytes().unwrap()
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_parse");

    for &entries in &[100u32, 10_000] {
        let doc = build_doc(entries);
        group.throughput(Throughput::Bytes(doc.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse", entries), &doc, |b, doc| {
            b.iter(|| {
                let mut tree = Tree::from_slice(doc);
                tree.parse().unwrap();
                tree.node_count()
            })
        });
    }

    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_query");

    let doc = build_doc(10_000);
    let mut tree = Tree::from_slice(&doc);
    tree.parse().unwrap();

    // Full traversal with typed getters on every record.
    group.throughput(Throughput::Elements(10_000));
    group.bench_function("visit_all_records", |b| {
        b.iter(|| {
            let root = tree.root().unwrap();
            let mut total = 0u64;
            for i in 0..root.array_length().unwrap() {
                let rec = root.array_at(i).unwrap();
                total += rec.map_str("id").unwrap().u64().unwrap();
                total += rec.map_str("name").unwrap().as_str().unwrap().len() as u64;
            }
            total
        })
    });

    // Linear map lookup cost on a small map.
    group.throughput(Throughput::Elements(1));
    group.bench_function("map_lookup", |b| {
        let root = tree.root().unwrap();
        let rec = root.array_at(5_000).unwrap();
        b.iter(|| rec.map_str("score").unwrap().f64().unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_parse, bench_query);
criterion_main!(benches);
