// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_spatial::{Point3, SpatialIndex};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

/// Lattice of `n³` small boxes spaced `cell` apart.
fn gen_lattice(n: usize, cell: f64) -> Vec<(Point3, Point3)> {
    let mut out = Vec::with_capacity(n * n * n);
    let delta = Point3::splat(cell * 0.25);
    for z in 0..n {
        for y in 0..n {
            for x in 0..n {
                let p = Point3::new(x as f64 * cell, y as f64 * cell, z as f64 * cell);
                out.push((p, delta));
            }
        }
    }
    out
}

/// Uniformly scattered boxes in `[0, extent)³`, a tenth of them points.
fn gen_random(count: usize, extent: f64, max_delta: f64) -> Vec<(Point3, Point3)> {
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    (0..count)
        .map(|i| {
            let p = Point3::new(
                rng.next_f64() * extent,
                rng.next_f64() * extent,
                rng.next_f64() * extent,
            );
            let d = if i % 10 == 0 {
                Point3::ZERO
            } else {
                Point3::splat(rng.next_f64() * max_delta)
            };
            (p, d)
        })
        .collect()
}

/// Tight clusters far apart, which forces repeated growth.
fn gen_clustered(n_clusters: usize, per_cluster: usize, spread: f64) -> Vec<(Point3, Point3)> {
    let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
    let mut out = Vec::with_capacity(n_clusters * per_cluster);
    for _ in 0..n_clusters {
        let c = Point3::new(
            (rng.next_f64() - 0.5) * 20_000.0,
            (rng.next_f64() - 0.5) * 20_000.0,
            (rng.next_f64() - 0.5) * 20_000.0,
        );
        for _ in 0..per_cluster {
            let offset = Point3::new(
                rng.next_f64() - 0.5,
                rng.next_f64() - 0.5,
                rng.next_f64() - 0.5,
            ) * spread;
            out.push((c + offset, Point3::splat(0.5)));
        }
    }
    out
}

fn build(items: &[(Point3, Point3)], divisions: u32, split: usize) -> SpatialIndex<u32> {
    let mut idx = SpatialIndex::new(Point3::ZERO, Point3::splat(100.0), divisions, split);
    for (i, (p, d)) in items.iter().enumerate() {
        idx.insert_sized(*p, i as u32, *d);
    }
    idx
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    for &n in &[16usize, 32] {
        let items = gen_lattice(n, 10.0);
        group.throughput(Throughput::Elements(items.len() as u64));
        for &(divisions, split) in &[(2_u32, 8_usize), (3, 8), (4, 16)] {
            group.bench_function(format!("lattice_n{n}_d{divisions}_s{split}"), |b| {
                b.iter(|| black_box(build(&items, divisions, split)));
            });
        }
    }
    let items = gen_clustered(16, 512, 50.0);
    group.throughput(Throughput::Elements(items.len() as u64));
    group.bench_function("clustered_growth_d3_s8", |b| {
        b.iter(|| black_box(build(&items, 3, 8)));
    });
    group.finish();
}

fn bench_query_box(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_box");
    let items = gen_random(20_000, 1_000.0, 4.0);
    let idx = build(&items, 3, 8);
    let mut rng = Rng::new(0xFACE_FEED_CAFE_BABE);
    let queries: Vec<Point3> = (0..256)
        .map(|_| {
            Point3::new(
                rng.next_f64() * 1_000.0,
                rng.next_f64() * 1_000.0,
                rng.next_f64() * 1_000.0,
            )
        })
        .collect();
    for &half in &[5.0_f64, 25.0, 100.0] {
        group.throughput(Throughput::Elements(queries.len() as u64));
        group.bench_function(format!("random_20k_half{half}"), |b| {
            b.iter(|| {
                let mut hits = 0;
                for q in &queries {
                    hits += idx.query_box(*q, Point3::splat(half)).count();
                }
                black_box(hits)
            });
        });
    }
    group.finish();
}

fn bench_query_ray(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_ray");
    let items = gen_random(20_000, 1_000.0, 4.0);
    let idx = build(&items, 3, 8);
    let mut rng = Rng::new(0xBADC_F00D_1234_5678);
    let rays: Vec<(Point3, Point3)> = (0..64)
        .map(|_| {
            let origin = Point3::new(
                rng.next_f64() * 1_000.0,
                rng.next_f64() * 1_000.0,
                rng.next_f64() * 1_000.0,
            );
            let direction = Point3::new(
                rng.next_f64() - 0.5,
                rng.next_f64() - 0.5,
                rng.next_f64() - 0.5,
            );
            (origin, direction)
        })
        .collect();
    group.throughput(Throughput::Elements(rays.len() as u64));
    group.bench_function("random_20k", |b| {
        b.iter(|| {
            let mut hits = 0;
            for (o, d) in &rays {
                hits += idx.query_ray(*o, *d).count();
            }
            black_box(hits)
        });
    });
    group.finish();
}

fn bench_cursor_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("cursor_remove");
    let items = gen_random(20_000, 1_000.0, 4.0);
    group.throughput(Throughput::Elements(items.len() as u64));
    group.bench_function("drain_half_random_20k", |b| {
        b.iter_batched(
            || build(&items, 3, 8),
            |mut idx| {
                let mut cursor =
                    idx.cursor_box(Point3::splat(500.0), Point3::splat(f64::INFINITY));
                while let Some(hit) = cursor.next_hit() {
                    if hit.data % 2 == 0 {
                        cursor.remove();
                    }
                }
                black_box(idx.entries())
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_insert,
    bench_query_box,
    bench_query_ray,
    bench_cursor_remove
);
criterion_main!(benches);
