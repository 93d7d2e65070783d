// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `SpatialIndex`: cell arena, insertion, growth, and subdivision.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;

use log::{debug, trace};

use crate::config::{MAX_DIVISIONS, SpatialConfig};
use crate::error::ConfigError;
use crate::query::{BoxCursor, BoxQuery, Cursor, Hit, Query, RayCursor, RayQuery};
use crate::region::{BoxRegion, Ray, Region};
use crate::types::{Aabb3, Point3};

/// Stable handle of a cell in the arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct CellId(usize);

impl CellId {
    const fn new(i: usize) -> Self {
        Self(i)
    }

    pub(crate) const fn get(self) -> usize {
        self.0
    }
}

/// A stored payload with its anchor and half-extent.
#[derive(Clone, Debug)]
pub(crate) struct Item<T> {
    pub(crate) data: T,
    pub(crate) position: Point3,
    pub(crate) delta: Point3,
}

impl<T> Item<T> {
    pub(crate) fn hit(&self) -> Hit<'_, T> {
        Hit {
            data: &self.data,
            position: self.position,
            delta: self.delta,
        }
    }
}

/// Sparse child array of a subdivided cell.
///
/// Only `slots` owns children. `first`/`last` bound the occupied-sibling chain,
/// which is threaded through [`Cell::next`] in ascending slot order.
#[derive(Clone, Debug)]
pub(crate) struct Children {
    slots: Box<[Option<CellId>]>,
    pub(crate) first: CellId,
    last: CellId,
}

#[derive(Clone, Debug)]
pub(crate) struct Cell<T> {
    pub(crate) bounds: Aabb3,
    pub(crate) items: Vec<Item<T>>,
    pub(crate) children: Option<Children>,
    pub(crate) parent: Option<CellId>,
    /// Flattened grid slot of this cell within its parent.
    slot: usize,
    /// Next occupied sibling (higher slot) under the same parent.
    pub(crate) next: Option<CellId>,
}

impl<T> Cell<T> {
    fn new(bounds: Aabb3, parent: Option<CellId>, slot: usize) -> Self {
        Self {
            bounds,
            items: Vec::new(),
            children: None,
            parent,
            slot,
            next: None,
        }
    }

    fn child(&self, slot: usize) -> Option<CellId> {
        self.children.as_ref().and_then(|c| c.slots[slot])
    }

    pub(crate) fn first_child(&self) -> Option<CellId> {
        self.children.as_ref().map(|c| c.first)
    }
}

/// An adaptive hierarchical grid over 3D space storing payloads of type `T`.
///
/// Each subdivided cell splits into `divisions³` equally sized children, which
/// are allocated lazily. The root grows outward on demand, so items can be
/// inserted anywhere regardless of the initial extent.
///
/// Iterators borrow the index, so it cannot be modified while a query is alive.
/// The only mutation allowed during iteration is [`Cursor::remove`].
pub struct SpatialIndex<T> {
    cells: Vec<Cell<T>>,
    root: Option<CellId>,
    min_position: Point3,
    stepping: Point3,
    divisions: u32,
    slot_count: usize,
    split_threshold: usize,
    len: usize,
}

impl<T> Default for SpatialIndex<T> {
    fn default() -> Self {
        let config = SpatialConfig::default();
        // Default fan-out is 3, so 3³ child slots.
        Self::from_validated(config, 27)
    }
}

impl<T> SpatialIndex<T> {
    /// Create an index whose initial grid spans the two corners.
    ///
    /// # Panics
    ///
    /// Panics if `divisions` is outside `2..=`[`MAX_DIVISIONS`], or if a
    /// corner is not finite. Use [`SpatialIndex::try_new`] to handle these cases.
    pub fn new(corner_a: Point3, corner_b: Point3, divisions: u32, split_threshold: usize) -> Self {
        let config = SpatialConfig {
            corner_a,
            corner_b,
            divisions,
            split_threshold,
        };
        match Self::try_new(config) {
            Ok(index) => index,
            Err(err) => panic!("invalid spatial index parameters: {err}"),
        }
    }

    /// Create an index from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configuration is rejected by
    /// [`SpatialConfig::validate`].
    pub fn try_new(config: SpatialConfig) -> Result<Self, ConfigError> {
        let slot_count = config.slot_count()?;
        Ok(Self::from_validated(config, slot_count))
    }

    fn from_validated(config: SpatialConfig, slot_count: usize) -> Self {
        let (min_position, stepping) = config.grid();
        Self {
            cells: Vec::new(),
            root: None,
            min_position,
            stepping,
            divisions: config.divisions,
            slot_count,
            split_threshold: config.split_threshold,
            len: 0,
        }
    }

    /// Number of stored items.
    pub fn entries(&self) -> usize {
        self.len
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if no items are stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Grid fan-out per axis.
    pub fn divisions(&self) -> u32 {
        self.divisions
    }

    /// Item count at which a cell starts pushing new items into children.
    pub fn split_threshold(&self) -> usize {
        self.split_threshold
    }

    /// Bounds of the root cell, or `None` before the first insert.
    pub fn bounds(&self) -> Option<Aabb3> {
        self.root.map(|r| self.cells[r.get()].bounds)
    }

    /// Drop every item and cell.
    ///
    /// The grid keeps its grown extent; the root is recreated on the next insert.
    pub fn clear(&mut self) {
        debug!(
            "clearing spatial index: {} items in {} cells",
            self.len,
            self.cells.len()
        );
        self.cells.clear();
        self.root = None;
        self.len = 0;
    }

    /// Insert a point item at `position`.
    pub fn insert(&mut self, position: Point3, data: T) {
        self.insert_sized(position, data, Point3::ZERO);
    }

    /// Insert an item covering `[position - delta, position + delta]`.
    ///
    /// Coordinates must be finite and `delta` non-negative; debug builds assert this.
    pub fn insert_sized(&mut self, position: Point3, data: T, delta: Point3) {
        debug_assert!(
            position.is_finite() && delta.is_finite(),
            "item coordinates must be finite"
        );
        debug_assert!(
            delta.x >= 0.0 && delta.y >= 0.0 && delta.z >= 0.0,
            "item delta must be non-negative"
        );
        let lo = position - delta;
        let hi = position + delta;
        self.grow_to_fit(lo, hi);
        let target = self.descend(lo, hi);
        self.cells[target.get()].items.push(Item {
            data,
            position,
            delta,
        });
        self.len += 1;
    }

    /// Iterate over every item.
    pub fn iter(&self) -> BoxQuery<'_, T> {
        self.query_box(Point3::ZERO, Point3::splat(f64::INFINITY))
    }

    /// Iterate over items whose box overlaps `[position - delta, position + delta]`.
    pub fn query_box(&self, position: Point3, delta: Point3) -> BoxQuery<'_, T> {
        self.query(BoxRegion::new(position, delta))
    }

    /// Iterate over items whose box is crossed by the line through `origin` along `direction`.
    ///
    /// See [`Ray`] for the exact test.
    pub fn query_ray(&self, origin: Point3, direction: Point3) -> RayQuery<'_, T> {
        self.query(Ray::new(origin, direction))
    }

    /// Iterate over items accepted by a custom [`Region`].
    pub fn query<R: Region>(&self, region: R) -> Query<'_, T, R> {
        Query::new(self, region)
    }

    /// Range cursor that can remove the items it visits.
    pub fn cursor_box(&mut self, position: Point3, delta: Point3) -> BoxCursor<'_, T> {
        self.cursor(BoxRegion::new(position, delta))
    }

    /// Line cursor that can remove the items it visits.
    pub fn cursor_ray(&mut self, origin: Point3, direction: Point3) -> RayCursor<'_, T> {
        self.cursor(Ray::new(origin, direction))
    }

    /// Cursor over a custom [`Region`] that can remove the items it visits.
    pub fn cursor<R: Region>(&mut self, region: R) -> Cursor<'_, T, R> {
        Cursor::new(self, region)
    }

    pub(crate) fn root(&self) -> Option<CellId> {
        self.root
    }

    pub(crate) fn cell(&self, id: CellId) -> &Cell<T> {
        &self.cells[id.get()]
    }

    pub(crate) fn cell_mut(&mut self, id: CellId) -> &mut Cell<T> {
        &mut self.cells[id.get()]
    }

    /// The cell visited after `id` and its whole subtree in pre-order: the next
    /// occupied sibling of `id` or of its nearest ancestor that has one.
    pub(crate) fn skip_subtree(&self, mut id: CellId) -> Option<CellId> {
        loop {
            let cell = &self.cells[id.get()];
            if let Some(next) = cell.next {
                return Some(next);
            }
            id = cell.parent?;
        }
    }

    pub(crate) fn remove_item(&mut self, id: CellId, at: usize) -> Item<T> {
        self.len -= 1;
        self.cells[id.get()].items.remove(at)
    }

    fn divisions_f64(&self) -> f64 {
        f64::from(self.divisions)
    }

    fn grow_to_fit(&mut self, lo: Point3, hi: Point3) {
        loop {
            let upper = self.min_position + self.stepping * self.divisions_f64();
            let d = self.slots_per_axis();
            if hi.any_ge(upper) {
                self.grow((d - 1) / 2);
            } else if lo.any_lt(self.min_position) {
                self.grow(d / 2);
            } else {
                return;
            }
        }
    }

    /// Scale the grid up by `divisions` so the previous extent becomes the child at
    /// grid index `(index, index, index)`, and wrap the current root (if any) in a
    /// new root cell.
    fn grow(&mut self, index: usize) {
        let d = self.divisions_f64();
        self.stepping = self.stepping * d;
        self.min_position = self.min_position - self.stepping * index as f64;
        let bounds = Aabb3::new(self.min_position, self.min_position + self.stepping * d);
        debug!(
            "spatial index grew to {:?}..{:?} (previous extent at index {index})",
            bounds.min, bounds.max
        );
        // An empty index only moves its grid; the root is created on descent.
        let Some(old) = self.root else {
            return;
        };
        let slot = self.flatten([index; 3]);
        let new_root = self.alloc(bounds, None, 0);
        let mut slots = vec![None; self.slot_count].into_boxed_slice();
        slots[slot] = Some(old);
        self.cells[new_root.get()].children = Some(Children {
            slots,
            first: old,
            last: old,
        });
        let old_cell = &mut self.cells[old.get()];
        old_cell.parent = Some(new_root);
        old_cell.slot = slot;
        self.root = Some(new_root);
    }

    /// Walk down from the root to the cell that must store an item spanning `lo..=hi`,
    /// creating it if needed.
    fn descend(&mut self, lo: Point3, hi: Point3) -> CellId {
        let mut min = self.min_position;
        let mut stepping = self.stepping;
        let mut parent = None;
        let mut slot = 0;
        let mut current = self.root;

        while let Some(id) = current {
            let index = self.grid_index(lo, min, stepping);
            if index != self.grid_index(hi, min, stepping) {
                // Straddles a child boundary.
                return id;
            }
            if self.cells[id.get()].items.len() < self.split_threshold {
                return id;
            }
            let offset = Point3::new(index[0] as f64, index[1] as f64, index[2] as f64);
            min = min + stepping.mul_components(offset);
            stepping = stepping / self.divisions_f64();
            slot = self.flatten(index);
            parent = Some(id);
            current = self.cells[id.get()].child(slot);
        }

        let bounds = Aabb3::new(min, min + stepping * self.divisions_f64());
        let id = self.alloc(bounds, parent, slot);
        match parent {
            Some(p) => self.link_child(p, slot, id),
            None => self.root = Some(id),
        }
        id
    }

    fn alloc(&mut self, bounds: Aabb3, parent: Option<CellId>, slot: usize) -> CellId {
        self.cells.push(Cell::new(bounds, parent, slot));
        let id = CellId::new(self.cells.len() - 1);
        trace!(
            "new cell {} at slot {slot}: {:?}..{:?}",
            id.get(),
            bounds.min,
            bounds.max
        );
        id
    }

    /// Attach `child` at `slot` and splice it into the parent's occupied-sibling
    /// chain, keeping the chain sorted by slot.
    fn link_child(&mut self, parent: CellId, slot: usize, child: CellId) {
        if self.cells[parent.get()].children.is_none() {
            let mut slots = vec![None; self.slot_count].into_boxed_slice();
            slots[slot] = Some(child);
            self.cells[parent.get()].children = Some(Children {
                slots,
                first: child,
                last: child,
            });
            return;
        }
        let Some(children) = self.cells[parent.get()].children.as_mut() else {
            return;
        };
        debug_assert!(children.slots[slot].is_none(), "child slot already occupied");
        children.slots[slot] = Some(child);
        let (first, last) = (children.first, children.last);

        if slot < self.cells[first.get()].slot {
            self.cells[child.get()].next = Some(first);
            if let Some(c) = self.cells[parent.get()].children.as_mut() {
                c.first = child;
            }
        } else if slot > self.cells[last.get()].slot {
            self.cells[last.get()].next = Some(child);
            if let Some(c) = self.cells[parent.get()].children.as_mut() {
                c.last = child;
            }
        } else {
            let mut prev = first;
            while let Some(n) = self.cells[prev.get()].next {
                if self.cells[n.get()].slot > slot {
                    break;
                }
                prev = n;
            }
            self.cells[child.get()].next = self.cells[prev.get()].next;
            self.cells[prev.get()].next = Some(child);
        }
    }

    fn slots_per_axis(&self) -> usize {
        // `slot_count` fitting in usize guarantees `divisions` does too.
        self.divisions as usize
    }

    /// Grid coordinate of `p` in a cell whose children start at `min` and measure `stepping`.
    ///
    /// Truncation mirrors floor for in-range points; the clamp absorbs rounding at
    /// the outer faces.
    fn grid_index(&self, p: Point3, min: Point3, stepping: Point3) -> [usize; 3] {
        let last = self.slots_per_axis() - 1;
        let axis = |v: f64, lo: f64, step: f64| {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Saturating float-to-int cast; negatives and NaN map to 0 before clamping."
            )]
            let i = ((v - lo) / step) as usize;
            i.min(last)
        };
        [
            axis(p.x, min.x, stepping.x),
            axis(p.y, min.y, stepping.y),
            axis(p.z, min.z, stepping.z),
        ]
    }

    fn flatten(&self, [ix, iy, iz]: [usize; 3]) -> usize {
        let d = self.slots_per_axis();
        (ix * d + iy) * d + iz
    }
}

impl<T> Extend<(Point3, T)> for SpatialIndex<T> {
    fn extend<I: IntoIterator<Item = (Point3, T)>>(&mut self, iter: I) {
        for (position, data) in iter {
            self.insert(position, data);
        }
    }
}

impl<'a, T> IntoIterator for &'a SpatialIndex<T> {
    type Item = Hit<'a, T>;
    type IntoIter = BoxQuery<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> Debug for SpatialIndex<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("len", &self.len)
            .field("cells", &self.cells.len())
            .field("divisions", &self.divisions)
            .field("split_threshold", &self.split_threshold)
            .field("bounds", &self.bounds())
            .finish_non_exhaustive()
    }
}
