// Insert/lookup/split throughput benchmarks for `reef_map::Map`.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use reef_map::{Location, Map};

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_insert");

    for size in [1_000usize, 10_000, 50_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut map: Map<String, usize> = Map::new();
                for i in 0..size {
                    let key = format!("key{i}");
                    if let Location::Vacant(loc) = map.entry(&key) {
                        loc.insert(key.clone(), i).unwrap();
                    }
                }
                black_box(map);
            });
        });
    }

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let size = 50_000usize;
    let mut map: Map<String, usize> = Map::new();
    for i in 0..size {
        let key = format!("key{i}");
        if let Location::Vacant(loc) = map.entry(&key) {
            loc.insert(key, i).unwrap();
        }
    }

    c.bench_function("map_lookup_50k", |b| {
        b.iter(|| {
            for i in (0..size).step_by(37) {
                let key = format!("key{i}");
                if let Location::Occupied(loc) = map.entry(&key) {
                    black_box(*loc.get());
                }
            }
        });
    });
}

fn bench_split_heavy_insert(c: &mut Criterion) {
    // Forces at least one directory doubling + table split: 24577 keys
    // crosses the 75% growth threshold of one 4096-group table.
    c.bench_function("map_insert_forced_split", |b| {
        b.iter(|| {
            let mut map: Map<u64, u64> = Map::new();
            for i in 0..24_577u64 {
                if let Location::Vacant(loc) = map.entry(&i) {
                    loc.insert(i, i).unwrap();
                }
            }
            black_box(map);
        });
    });
}

criterion_group!(benches, bench_insert, bench_lookup, bench_split_heavy_insert);
criterion_main!(benches);
