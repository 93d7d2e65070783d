// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Basic usage of Understory Spatial: insert, grow, query by box and line, remove.

use understory_spatial::{Point3, SpatialIndex};

fn main() {
    let mut idx = SpatialIndex::new(Point3::ZERO, Point3::splat(100.0), 3, 8);

    // A row of crates along X, and a few points scattered around.
    for i in 0..10_u32 {
        let x = f64::from(i) * 10.0;
        idx.insert_sized(Point3::new(x, 0.0, 0.0), i, Point3::splat(2.0));
    }
    idx.insert(Point3::new(50.0, 50.0, 50.0), 100);
    idx.insert(Point3::new(-250.0, 10.0, 0.0), 101);
    println!("{idx:?}");

    // Box range
    let near: Vec<_> = idx
        .query_box(Point3::new(50.0, 0.0, 0.0), Point3::splat(12.0))
        .map(|hit| *hit.data)
        .collect();
    println!("within 12 of (50,0,0): {near:?}");

    // Line along +X; the test is an infinite line, so the far point on -X is on it too.
    let on_line: Vec<_> = idx
        .query_ray(Point3::new(0.0, 10.0, 0.0), Point3::new(1.0, 0.0, 0.0))
        .map(|hit| *hit.data)
        .collect();
    println!("on the line y=10: {on_line:?}");

    // Remove every other crate
    let mut cursor = idx.cursor_box(Point3::new(45.0, 0.0, 0.0), Point3::new(50.0, 5.0, 5.0));
    let mut removed = Vec::new();
    while let Some(hit) = cursor.next_hit() {
        if hit.data % 2 == 1 {
            removed.extend(cursor.remove());
        }
    }
    println!("removed {removed:?}; {} items left", idx.entries());
}
