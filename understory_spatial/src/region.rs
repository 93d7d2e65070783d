// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Query regions: the overlap tests used to prune cells and filter items.

use crate::types::{Aabb3, Point3, le};

/// A query shape tested against cell and item boxes.
///
/// The walk only descends into cells for which [`Region::hits_box`] returns
/// true, so the test must be conservative: if a region touches an item box it
/// must also touch every enclosing box.
pub trait Region {
    /// Whether the region touches the axis-aligned box.
    fn hits_box(&self, bounds: &Aabb3) -> bool;

    /// Whether the region touches an item box given as center and half-extent.
    fn hits_item(&self, position: Point3, delta: Point3) -> bool {
        self.hits_box(&Aabb3::from_center_delta(position, delta))
    }
}

/// Axis-aligned range `[position - delta, position + delta]`.
///
/// Boxes that share only a face or an edge with the range count as hits.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoxRegion {
    bounds: Aabb3,
}

impl BoxRegion {
    /// Range centered on `position` with half-extent `delta`.
    ///
    /// An infinite `delta` covers all of space.
    pub fn new(position: Point3, delta: Point3) -> Self {
        Self {
            bounds: Aabb3::from_center_delta(position, delta),
        }
    }

    /// The range as a box.
    pub fn bounds(&self) -> Aabb3 {
        self.bounds
    }
}

impl Region for BoxRegion {
    #[inline]
    fn hits_box(&self, bounds: &Aabb3) -> bool {
        self.bounds.overlaps(bounds)
    }
}

/// Line through `origin` along `direction`.
///
/// This is an infinite line test: boxes behind `origin` are reported too.
/// `direction` does not need to be normalized; a zero direction matches nothing.
///
/// A box passes if its bounding sphere (center plus half-diagonal) is within
/// reach of the line, and the line crosses one of its six faces inside the
/// face's bounds. Faces are tried on X, then Y, then Z, max face first.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    origin: Point3,
    direction: Point3,
    inv_length_squared: f64,
}

impl Ray {
    /// Line through `origin` along `direction`.
    pub fn new(origin: Point3, direction: Point3) -> Self {
        Self {
            origin,
            direction,
            inv_length_squared: 1.0 / direction.length_squared(),
        }
    }

    /// Origin of the line.
    pub fn origin(&self) -> Point3 {
        self.origin
    }

    /// Direction of the line, as given.
    pub fn direction(&self) -> Point3 {
        self.direction
    }

    /// Whether the line crosses the box `[lo, hi]` with the given center and half-extent.
    fn crosses(&self, center: Point3, half: Point3, lo: Point3, hi: Point3) -> bool {
        let k = (center - self.origin).dot(self.direction) * self.inv_length_squared;
        let offset = self.origin + self.direction * k - center;
        // NaN (zero direction) rejects.
        if !le(offset.length_squared(), half.length_squared()) {
            return false;
        }

        let o: [f64; 3] = self.origin.into();
        let d: [f64; 3] = self.direction.into();
        let lo: [f64; 3] = lo.into();
        let hi: [f64; 3] = hi.into();
        (0..3).any(|axis| {
            d[axis] != 0.0
                && (crosses_face(o, d, axis, hi[axis], lo, hi)
                    || crosses_face(o, d, axis, lo[axis], lo, hi))
        })
    }
}

/// Whether the line meets the plane `axis = plane` inside the box on the other two axes.
fn crosses_face(
    o: [f64; 3],
    d: [f64; 3],
    axis: usize,
    plane: f64,
    lo: [f64; 3],
    hi: [f64; 3],
) -> bool {
    let k = (plane - o[axis]) / d[axis];
    (0..3).filter(|&a| a != axis).all(|a| {
        let v = o[a] + k * d[a];
        v >= lo[a] && v <= hi[a]
    })
}

impl Region for Ray {
    fn hits_box(&self, bounds: &Aabb3) -> bool {
        self.crosses(bounds.center(), bounds.half_extent(), bounds.min, bounds.max)
    }

    fn hits_item(&self, position: Point3, delta: Point3) -> bool {
        self.crosses(position, delta, position - delta, position + delta)
    }
}
