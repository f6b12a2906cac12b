// ABOUTME: Benchmark suite for PackStream encode/decode and chunked-framing throughput
// ABOUTME: Measures a representative RUN message's round trip at a few sizes

use std::io::Cursor;

use bolt_client::framing::{Outbox, DEFAULT_CAPACITY, DEFAULT_MAX_CHUNK_SIZE};
use bolt_client::packstream::{decode_message, encode_structure, Value, ValueMap};
use bytes::BytesMut;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn run_message(param_count: usize) -> (u8, Vec<Value>) {
    let mut parameters = ValueMap::new();
    for i in 0..param_count {
        parameters.insert(format!("p{i}"), Value::Integer(i as i64));
    }
    let mut extra = ValueMap::new();
    extra.insert("db", Value::String("neo4j".to_string()));
    let fields = vec![
        Value::String("MATCH (n) WHERE n.id = $p0 RETURN n".to_string()),
        Value::Map(parameters),
        Value::Map(extra),
    ];
    (0x10, fields)
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("packstream_encode");
    for param_count in [1usize, 16, 128] {
        let (tag, fields) = run_message(param_count);
        group.bench_with_input(
            BenchmarkId::from_parameter(param_count),
            &(tag, fields),
            |b, (tag, fields)| {
                b.iter(|| {
                    let mut buf = BytesMut::new();
                    encode_structure(*tag, black_box(fields), &mut buf);
                    black_box(buf);
                });
            },
        );
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("packstream_decode");
    for param_count in [1usize, 16, 128] {
        let (tag, fields) = run_message(param_count);
        let mut encoded = BytesMut::new();
        encode_structure(tag, &fields, &mut encoded);
        let encoded = encoded.freeze();

        group.bench_with_input(
            BenchmarkId::from_parameter(param_count),
            &encoded,
            |b, encoded| {
                b.iter(|| {
                    let mut cur = Cursor::new(encoded.as_ref());
                    black_box(decode_message(&mut cur).unwrap());
                });
            },
        );
    }
    group.finish();
}

fn bench_chunking(c: &mut Criterion) {
    let mut group = c.benchmark_group("outbox_chunking");
    for size in [64usize, 20_000, 100_000] {
        let payload = vec![b'x'; size];
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, payload| {
            b.iter(|| {
                let mut outbox = Outbox::new(DEFAULT_CAPACITY, DEFAULT_MAX_CHUNK_SIZE);
                outbox.write(black_box(payload));
                outbox.chunk();
                black_box(outbox.view());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_chunking);
criterion_main!(benches);
