//! Write/read and search throughput benchmarks.
//!
//! Benchmarks the hot paths of the chain:
//! - Fixed-width and varint encode/decode through the cursor
//! - Bulk slice appends across unit boundaries
//! - Chain-aware KMP search versus the literal scan

#![allow(missing_docs)]

use criterion::{
    black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput,
};

use chainbuf::codec::{U32Be, VarU64};
use chainbuf::{Buffer, ByteKmp};

const VALUES_PER_ITER: u64 = 1024;

fn bench_fixed_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("fixed_roundtrip");
    group.throughput(Throughput::Bytes(VALUES_PER_ITER * 4));

    for unit_capacity in [64usize, 4096] {
        group.bench_with_input(
            BenchmarkId::new("u32_be", unit_capacity),
            &unit_capacity,
            |b, &unit_capacity| {
                b.iter(|| {
                    let mut buf = Buffer::with_unit_capacity(unit_capacity);
                    for i in 0..VALUES_PER_ITER {
                        buf.write_value(U32Be, i as u32);
                    }
                    let mut sum = 0u64;
                    for _ in 0..VALUES_PER_ITER {
                        sum = sum.wrapping_add(u64::from(buf.read_value(U32Be).unwrap()));
                    }
                    black_box(sum)
                });
            },
        );
    }
    group.finish();
}

fn bench_varint_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("varint_roundtrip");
    group.throughput(Throughput::Elements(VALUES_PER_ITER));

    group.bench_function("var_u64", |b| {
        b.iter(|| {
            let mut buf = Buffer::with_unit_capacity(4096);
            for i in 0..VALUES_PER_ITER {
                buf.write_value(VarU64, i.wrapping_mul(0x9E37_79B9_7F4A_7C15));
            }
            let mut sum = 0u64;
            for _ in 0..VALUES_PER_ITER {
                sum = sum.wrapping_add(buf.read_value(VarU64).unwrap());
            }
            black_box(sum)
        });
    });
    group.finish();
}

fn bench_write_slice(c: &mut Criterion) {
    let payload = vec![0xABu8; 64 * 1024];
    let mut group = c.benchmark_group("write_slice");
    group.throughput(Throughput::Bytes(payload.len() as u64));

    for unit_capacity in [256usize, 4096] {
        group.bench_with_input(
            BenchmarkId::new("bulk", unit_capacity),
            &unit_capacity,
            |b, &unit_capacity| {
                b.iter(|| {
                    let mut buf = Buffer::with_unit_capacity(unit_capacity);
                    buf.write_slice(&payload);
                    black_box(buf.size())
                });
            },
        );
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    // Worst-case-ish haystack for naive scanning: long runs of the
    // pattern's prefix.
    let mut haystack = vec![b'a'; 64 * 1024];
    for chunk in haystack.chunks_mut(7) {
        if let Some(last) = chunk.last_mut() {
            *last = b'b';
        }
    }
    let needle = b"aaaaaab";

    let mut group = c.benchmark_group("search");
    group.throughput(Throughput::Bytes(haystack.len() as u64));

    for unit_capacity in [256usize, 4096] {
        let mut buf = Buffer::with_unit_capacity(unit_capacity);
        buf.write_slice(&haystack);
        let kmp = ByteKmp::new(needle);

        group.bench_with_input(
            BenchmarkId::new("kmp", unit_capacity),
            &buf,
            |b, buf| {
                b.iter(|| black_box(buf.search(&kmp)));
            },
        );
        group.bench_with_input(
            BenchmarkId::new("literal", unit_capacity),
            &buf,
            |b, buf| {
                b.iter(|| black_box(buf.find(needle)));
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_fixed_roundtrip,
    bench_varint_roundtrip,
    bench_write_slice,
    bench_search
);
criterion_main!(benches);
