// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lazy queries over a [`SpatialIndex`]: read-only iterators and removing cursors.
//!
//! Both walk the cell tree depth-first in pre-order. A cell whose box misses the
//! region is skipped together with its subtree. Inside a cell, items are visited
//! in storage order, then the occupied children in ascending slot order.

use core::fmt::Debug;
use core::iter::FusedIterator;

use log::trace;

use crate::index::{CellId, SpatialIndex};
use crate::region::{BoxRegion, Ray, Region};
use crate::types::Point3;

/// An item yielded by a query.
#[derive(Debug)]
pub struct Hit<'a, T> {
    /// The stored payload.
    pub data: &'a T,
    /// Anchor position the item was inserted with.
    pub position: Point3,
    /// Half-extent the item was inserted with.
    pub delta: Point3,
}

impl<T> Clone for Hit<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Hit<'_, T> {}

/// Walk state shared by [`Query`] and [`Cursor`].
#[derive(Clone, Debug)]
struct Walker {
    /// Cell being visited; `None` once the walk is over.
    current: Option<CellId>,
    /// True once `current` passed the region test and its items are being scanned.
    scanning: bool,
    /// Next item to test in `current`.
    cursor: usize,
}

impl Walker {
    fn new(root: Option<CellId>) -> Self {
        Self {
            current: root,
            scanning: false,
            cursor: 0,
        }
    }

    /// Advance to the next matching item and return its location.
    fn next_match<T, R: Region>(
        &mut self,
        index: &SpatialIndex<T>,
        region: &R,
    ) -> Option<(CellId, usize)> {
        loop {
            let id = self.current?;
            let cell = index.cell(id);
            if !self.scanning {
                if !region.hits_box(&cell.bounds) {
                    self.current = index.skip_subtree(id);
                    continue;
                }
                self.scanning = true;
                self.cursor = 0;
            }

            if let Some(item) = cell.items.get(self.cursor) {
                let at = self.cursor;
                self.cursor += 1;
                if region.hits_item(item.position, item.delta) {
                    return Some((id, at));
                }
                continue;
            }

            self.scanning = false;
            self.current = cell.first_child().or_else(|| index.skip_subtree(id));
        }
    }

    /// The item just returned by `next_match` was removed from its cell.
    fn step_back(&mut self) {
        self.cursor -= 1;
    }
}

/// Read-only lazy query over a [`SpatialIndex`].
///
/// Created by [`SpatialIndex::query_box`], [`SpatialIndex::query_ray`],
/// [`SpatialIndex::iter`], and [`SpatialIndex::query`].
pub struct Query<'a, T, R> {
    index: &'a SpatialIndex<T>,
    region: R,
    walker: Walker,
}

/// Box-range query.
pub type BoxQuery<'a, T> = Query<'a, T, BoxRegion>;

/// Line query.
pub type RayQuery<'a, T> = Query<'a, T, Ray>;

impl<'a, T, R: Region> Query<'a, T, R> {
    pub(crate) fn new(index: &'a SpatialIndex<T>, region: R) -> Self {
        Self {
            index,
            region,
            walker: Walker::new(index.root()),
        }
    }

    /// The region being queried.
    pub fn region(&self) -> &R {
        &self.region
    }
}

impl<'a, T, R: Region> Iterator for Query<'a, T, R> {
    type Item = Hit<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.index;
        let (id, at) = self.walker.next_match(index, &self.region)?;
        Some(index.cell(id).items[at].hit())
    }
}

impl<T, R: Region> FusedIterator for Query<'_, T, R> {}

impl<T, R: Debug> Debug for Query<'_, T, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Query")
            .field("region", &self.region)
            .field("done", &self.walker.current.is_none())
            .finish_non_exhaustive()
    }
}

/// Query that can remove the item it last yielded.
///
/// Created by [`SpatialIndex::cursor_box`], [`SpatialIndex::cursor_ray`], and
/// [`SpatialIndex::cursor`]. The cursor holds the index mutably, so nothing else
/// can modify the index while it is alive.
///
/// ```
/// use understory_spatial::{Point3, SpatialIndex};
///
/// let mut idx = SpatialIndex::new(Point3::ZERO, Point3::splat(10.0), 2, 4);
/// for i in 0..10_u32 {
///     idx.insert(Point3::splat(f64::from(i)), i);
/// }
///
/// // Drop the even ids.
/// let mut cursor = idx.cursor_box(Point3::splat(5.0), Point3::splat(100.0));
/// while let Some(hit) = cursor.next_hit() {
///     if hit.data % 2 == 0 {
///         cursor.remove();
///     }
/// }
/// assert_eq!(idx.entries(), 5);
/// ```
pub struct Cursor<'a, T, R> {
    index: &'a mut SpatialIndex<T>,
    region: R,
    walker: Walker,
    last: Option<(CellId, usize)>,
}

/// Box-range cursor.
pub type BoxCursor<'a, T> = Cursor<'a, T, BoxRegion>;

/// Line cursor.
pub type RayCursor<'a, T> = Cursor<'a, T, Ray>;

impl<'a, T, R: Region> Cursor<'a, T, R> {
    pub(crate) fn new(index: &'a mut SpatialIndex<T>, region: R) -> Self {
        let walker = Walker::new(index.root());
        Self {
            index,
            region,
            walker,
            last: None,
        }
    }

    /// Advance to the next matching item.
    ///
    /// Returns `None` once the walk is exhausted, and keeps returning `None` afterwards.
    pub fn next_hit(&mut self) -> Option<Hit<'_, T>> {
        self.last = None;
        let (id, at) = self.walker.next_match(&*self.index, &self.region)?;
        self.last = Some((id, at));
        Some(self.index.cell(id).items[at].hit())
    }

    /// Mutable access to the payload last returned by [`Cursor::next_hit`].
    ///
    /// Returns `None` if there is no such item, or if it was removed.
    pub fn current_mut(&mut self) -> Option<&mut T> {
        let (id, at) = self.last?;
        Some(&mut self.index.cell_mut(id).items[at].data)
    }

    /// Remove the item last returned by [`Cursor::next_hit`] and return its payload.
    ///
    /// This is a no-op returning `None` before the first hit, after the walk is
    /// exhausted, or when the current item was already removed.
    pub fn remove(&mut self) -> Option<T> {
        let (id, at) = self.last.take()?;
        let item = self.index.remove_item(id, at);
        self.walker.step_back();
        trace!(
            "cursor removed item at {:?}; {} items left",
            item.position,
            self.index.entries()
        );
        Some(item.data)
    }

    /// The region being queried.
    pub fn region(&self) -> &R {
        &self.region
    }
}

impl<T, R: Debug> Debug for Cursor<'_, T, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Cursor")
            .field("region", &self.region)
            .field("done", &self.walker.current.is_none())
            .field("has_current", &self.last.is_some())
            .finish_non_exhaustive()
    }
}
