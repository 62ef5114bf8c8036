//! Record stream decoding and hashing benchmarks.

use chainfeed_bench::sample_file;
use chainfeed_codec::{read_prev_hash, FileHash, FrameReader};
use chainfeed_core::hash_stream;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Benchmark decoding whole files of varying record counts.
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for records in [10, 1_000, 10_000] {
        let bytes = sample_file(FileHash::ZERO, records, 256);
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(records), &bytes, |b, bytes| {
            b.iter(|| {
                let reader = FrameReader::new("bench", black_box(bytes.as_slice())).unwrap();
                let mut frames = 0usize;
                for frame in reader {
                    black_box(frame.unwrap());
                    frames += 1;
                }
                frames
            });
        });
    }

    group.finish();
}

/// Benchmark reading only the previous hash.
fn bench_prev_hash(c: &mut Criterion) {
    let bytes = sample_file(FileHash::ZERO, 10_000, 256);
    c.bench_function("prev_hash_peek", |b| {
        b.iter(|| read_prev_hash("bench", black_box(bytes.as_slice())).unwrap());
    });
}

/// Benchmark SHA-384 content hashing.
fn bench_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash");

    for size in [1024usize, 64 * 1024, 4 * 1024 * 1024] {
        let data: Vec<u8> = (0..size).map(|i| (i % 256) as u8).collect();
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| hash_stream("bench", black_box(data.as_slice())).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_decode, bench_prev_hash, bench_hash);
criterion_main!(benches);
