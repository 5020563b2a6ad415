// Benchmark suite for rope construction and queries
//
// - append / prepend: building long strings piece by piece
// - random_slices: substrings at random offsets of a large tree
// - flatten: first flattening of a deep tree
// - index: character offset lookups in UTF-8 text
// - hash: seeded hashing of a flattened rope

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use twine::{Rope, RopeConfig, tree};

const SIZES: [usize; 3] = [100, 1_000, 10_000];

// =============================================================================
// Benchmark Helpers
// =============================================================================

fn words(count: usize, seed: u64) -> Vec<Rope> {
    let mut rng = StdRng::seed_from_u64(seed);
    return (0..count)
        .map(|_| {
            let len = rng.gen_range(4..40);
            let text: String = (0..len)
                .map(|_| if rng.gen_bool(0.1) { 'é' } else { rng.gen_range('a'..='z') })
                .collect();
            Rope::from(text.as_str())
        })
        .collect();
}

fn appended(config: &RopeConfig, pieces: &[Rope]) -> Rope {
    let mut rope = Rope::from("");
    for piece in pieces {
        rope = tree::concat(config, &rope, piece).unwrap();
    }
    return rope;
}

// =============================================================================
// Construction
// =============================================================================

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("append");
    let config = RopeConfig::default();

    for size in SIZES {
        let pieces = words(size, 1);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("tree", size), &pieces, |b, pieces| {
            b.iter(|| black_box(appended(&config, pieces).byte_len()));
        });
        group.bench_with_input(BenchmarkId::new("vec", size), &pieces, |b, pieces| {
            b.iter(|| {
                let mut out = Vec::new();
                for piece in pieces {
                    out.extend_from_slice(piece.bytes());
                }
                black_box(out.len())
            });
        });
    }

    group.finish();
}

fn bench_prepend(c: &mut Criterion) {
    let mut group = c.benchmark_group("prepend");
    let config = RopeConfig::default();

    for size in SIZES {
        let pieces = words(size, 2);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("tree", size), &pieces, |b, pieces| {
            b.iter(|| {
                let mut rope = Rope::from("");
                for piece in pieces {
                    rope = tree::concat(&config, piece, &rope).unwrap();
                }
                black_box(rope.byte_len())
            });
        });
    }

    group.finish();
}

fn bench_repeat(c: &mut Criterion) {
    let mut group = c.benchmark_group("repeat");
    let config = RopeConfig::default();
    let base = Rope::from("0123456789abcdef");

    for count in [10, 1_000, 100_000] {
        group.bench_with_input(BenchmarkId::new("node", count), &count, |b, &count| {
            b.iter(|| black_box(tree::repeat(&config, &base, count).unwrap().byte_len()));
        });
        group.bench_with_input(BenchmarkId::new("flatten", count), &count, |b, &count| {
            b.iter(|| black_box(tree::repeat(&config, &base, count).unwrap().bytes().len()));
        });
    }

    group.finish();
}

// =============================================================================
// Queries
// =============================================================================

fn bench_random_slices(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_slices");
    let config = RopeConfig::default();

    for size in SIZES {
        let rope = appended(&config, &words(size, 3));
        let mut rng = StdRng::seed_from_u64(4);
        let ranges: Vec<(usize, usize)> = (0..100)
            .map(|_| {
                let offset = rng.gen_range(0..rope.byte_len());
                let len = rng.gen_range(0..=(rope.byte_len() - offset).min(500));
                (offset, len)
            })
            .collect();

        group.throughput(Throughput::Elements(ranges.len() as u64));
        group.bench_with_input(BenchmarkId::new("substring", size), &ranges, |b, ranges| {
            b.iter(|| {
                let mut total = 0;
                for &(offset, len) in ranges {
                    total += tree::substring(&config, &rope, offset, len).unwrap().byte_len();
                }
                black_box(total)
            });
        });
    }

    group.finish();
}

fn bench_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten");
    let config = RopeConfig::default();

    for size in SIZES {
        let pieces = words(size, 5);
        let byte_len = appended(&config, &pieces).byte_len();
        group.throughput(Throughput::Bytes(byte_len as u64));
        group.bench_with_input(BenchmarkId::new("first_bytes", size), &pieces, |b, pieces| {
            b.iter_batched(|| appended(&config, pieces), |rope| black_box(rope.bytes().len()), BatchSize::SmallInput);
        });
    }

    group.finish();
}

fn bench_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("index");
    let config = RopeConfig::default();

    for size in SIZES {
        let rope = appended(&config, &words(size, 6)).flatten_to_leaf();
        let char_len = rope.char_len();
        group.bench_with_input(BenchmarkId::new("byte_index_of", size), &rope, |b, rope| {
            b.iter(|| black_box(rope.byte_index_of(char_len / 2)));
        });
        group.bench_with_input(BenchmarkId::new("char_index_of", size), &rope, |b, rope| {
            b.iter(|| black_box(rope.char_index_of(rope.byte_len() / 2)));
        });
    }

    group.finish();
}

fn bench_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash");
    let config = RopeConfig::default();

    for size in SIZES {
        let rope = appended(&config, &words(size, 7));
        rope.bytes();
        group.throughput(Throughput::Bytes(rope.byte_len() as u64));
        group.bench_with_input(BenchmarkId::new("hash_with", size), &rope, |b, rope| {
            b.iter(|| black_box(rope.hash_with(17)));
        });
    }

    group.finish();
}

// =============================================================================
// Criterion Configuration
// =============================================================================

criterion_group!(
    benches,
    bench_append,
    bench_prepend,
    bench_repeat,
    bench_random_slices,
    bench_flatten,
    bench_index,
    bench_hash,
);

criterion_main!(benches);
