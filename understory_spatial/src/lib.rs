// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_spatial --heading-base-level=0

//! Understory Spatial: an adaptive hierarchical 3D spatial index.
//!
//! [`SpatialIndex`] stores payloads anchored at a 3D position with an optional
//! half-extent ("delta"). Space is partitioned into a tree of grid cells:
//!
//! - Every subdivided cell splits into `divisions³` equally sized children, allocated lazily.
//! - The root grows outward on demand, so items can be inserted anywhere.
//! - An item lives in the deepest cell that fully contains its box, unless the cell still
//!   has room below the split threshold.
//!
//! Queries are lazy and prune whole subtrees whose cell box misses the query region:
//!
//! - Box range: items whose box overlaps `[position - delta, position + delta]`.
//! - Line: items whose box is crossed by the infinite line through `origin` along `direction`.
//! - Any custom [`Region`].
//!
//! Read-only queries are plain iterators. Cursors ([`Cursor`]) borrow the index mutably
//! and can remove the item they last yielded.
//!
//! # Example
//!
//! ```rust
//! use understory_spatial::{Point3, SpatialIndex};
//!
//! // Seed the grid over a 10-unit cube, 3 divisions per axis, 4 items per cell before splitting.
//! let mut idx = SpatialIndex::new(Point3::ZERO, Point3::splat(10.0), 3, 4);
//! idx.insert(Point3::new(1.0, 2.0, 3.0), "point");
//! idx.insert_sized(Point3::new(10.0, 0.0, 0.0), "crate", Point3::splat(1.0));
//! // Far outside the initial extent: the index grows.
//! idx.insert(Point3::new(-500.0, 40.0, 7.5), "far");
//! assert_eq!(idx.entries(), 3);
//!
//! // Box range query.
//! let near: Vec<_> = idx
//!     .query_box(Point3::ZERO, Point3::splat(5.0))
//!     .map(|hit| *hit.data)
//!     .collect();
//! assert_eq!(near, ["point"]);
//!
//! // Line along +X through the origin.
//! let along_x: Vec<_> = idx
//!     .query_ray(Point3::ZERO, Point3::new(1.0, 0.0, 0.0))
//!     .map(|hit| *hit.data)
//!     .collect();
//! assert_eq!(along_x, ["crate"]);
//!
//! // Remove everything within reach of the origin.
//! let mut cursor = idx.cursor_box(Point3::ZERO, Point3::splat(20.0));
//! while cursor.next_hit().is_some() {
//!     cursor.remove();
//! }
//! assert_eq!(idx.entries(), 1);
//! ```
//!
//! ### Float semantics
//!
//! Coordinates are `f64` and must be finite; debug builds assert this on insert.
//! Box tests are inclusive, so boxes that only share a face overlap.

#![no_std]

extern crate alloc;

pub mod config;
pub mod error;
pub mod index;
pub mod query;
pub mod region;
pub mod types;

pub use config::{MAX_DIVISIONS, SpatialConfig};
pub use error::ConfigError;
pub use index::SpatialIndex;
pub use query::{BoxCursor, BoxQuery, Cursor, Hit, Query, RayCursor, RayQuery};
pub use region::{BoxRegion, Ray, Region};
pub use types::{Aabb3, Point3};
