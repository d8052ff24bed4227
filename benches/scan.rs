//! Bit scanning microbenchmarks
//!
//! Run with: cargo bench --bench scan

use bitmap_string::{bit_count, bitpos, popcount};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

fn pseudo_random(size: usize) -> Vec<u8> {
    let mut state = 0x9E37_79B9_7F4A_7C15u64;
    (0..size)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state as u8
        })
        .collect()
}

fn bench_popcount(c: &mut Criterion) {
    let mut group = c.benchmark_group("popcount");

    for size in [64, 4_096, 1 << 20].iter() {
        let data = pseudo_random(*size);

        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::new("swar", size), size, |b, _| {
            b.iter(|| black_box(popcount(black_box(&data))));
        });
        group.bench_with_input(BenchmarkId::new("per_byte", size), size, |b, _| {
            b.iter(|| {
                black_box(
                    black_box(&data)
                        .iter()
                        .map(|b| u64::from(b.count_ones()))
                        .sum::<u64>(),
                )
            });
        });
    }

    group.finish();
}

fn bench_bitpos(c: &mut Criterion) {
    let mut group = c.benchmark_group("bitpos");

    for size in [64, 4_096, 1 << 20].iter() {
        // Worst case for the word skip: the only hit is in the last byte.
        let mut zeros = vec![0u8; *size];
        zeros[*size - 1] = 1;
        let ones = vec![0xFFu8; *size];

        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::new("first_set", size), size, |b, _| {
            b.iter(|| black_box(bitpos(black_box(&zeros), true)));
        });
        group.bench_with_input(BenchmarkId::new("first_clear", size), size, |b, _| {
            b.iter(|| black_box(bitpos(black_box(&ones), false)));
        });
    }

    group.finish();
}

fn bench_unaligned_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("bit_count_range");

    let data = pseudo_random(1 << 20);
    group.throughput(Throughput::Bytes(data.len() as u64 - 4));
    group.bench_function("offset_3", |b| {
        b.iter(|| black_box(bit_count(black_box(&data), 3, -2)));
    });

    group.finish();
}

criterion_group!(benches, bench_popcount, bench_bitpos, bench_unaligned_range);
criterion_main!(benches);
