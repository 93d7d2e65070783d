// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![cfg(feature = "compare_rstar")]

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_spatial::{Point3, SpatialIndex};

use rstar::primitives::Rectangle;
use rstar::{AABB, RTree};

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

fn to_rstar_boxes(v: &[(Point3, Point3)]) -> Vec<Rectangle<[f64; 3]>> {
    v.iter()
        .map(|(p, d)| {
            Rectangle::<[f64; 3]>::from_corners((*p - *d).into(), (*p + *d).into())
        })
        .collect()
}

fn bench_rstar_compare_3d(c: &mut Criterion) {
    let mut group = c.benchmark_group("rstar_compare_3d");
    for &n in &[16usize, 32] {
        let items = gen_lattice(n, 10.0);
        let center = Point3::splat(n as f64 * 5.0);
        let half = Point3::splat(n as f64 * 1.5);
        group.throughput(Throughput::Elements(items.len() as u64));

        group.bench_function(format!("understory_build_query_n{n}"), |b| {
            b.iter(|| {
                let mut idx = SpatialIndex::new(Point3::ZERO, Point3::splat(100.0), 3, 8);
                for (i, (p, d)) in items.iter().enumerate() {
                    idx.insert_sized(*p, i as u32, *d);
                }
                let hits: usize = idx.query_box(center, half).count();
                black_box(hits);
            });
        });

        group.bench_function(format!("rstar_build_query_bulk_n{n}"), |b| {
            b.iter_batched(
                || to_rstar_boxes(&items),
                |boxes| {
                    let tree = RTree::bulk_load(boxes);
                    let aabb = AABB::<[f64; 3]>::from_corners(
                        (center - half).into(),
                        (center + half).into(),
                    );
                    let hits: usize = tree.locate_in_envelope_intersecting(&aabb).count();
                    black_box(hits);
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_function(format!("rstar_build_query_incremental_n{n}"), |b| {
            b.iter_batched(
                || to_rstar_boxes(&items),
                |boxes| {
                    let mut tree = RTree::new();
                    for r in boxes {
                        tree.insert(r);
                    }
                    let aabb = AABB::<[f64; 3]>::from_corners(
                        (center - half).into(),
                        (center + half).into(),
                    );
                    let hits: usize = tree.locate_in_envelope_intersecting(&aabb).count();
                    black_box(hits);
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rstar_compare_3d);
criterion_main!(benches);
