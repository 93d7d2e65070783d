// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Construction parameters for [`SpatialIndex`](crate::SpatialIndex).

use crate::error::ConfigError;
use crate::types::Point3;

/// Largest accepted grid fan-out per axis.
///
/// Each subdivided cell allocates `divisions³` child slots up front, so the cap
/// bounds that allocation to 32768 slots.
pub const MAX_DIVISIONS: u32 = 32;

/// Construction parameters for a [`SpatialIndex`](crate::SpatialIndex).
///
/// The two corners only seed the initial grid; the index grows on demand when
/// items land outside of it, so they do not need to enclose every item.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpatialConfig {
    /// First corner of the initial extent.
    pub corner_a: Point3,
    /// Opposite corner of the initial extent.
    pub corner_b: Point3,
    /// Grid fan-out per axis; each subdivided cell has `divisions³` child slots.
    ///
    /// Must be in `2..=`[`MAX_DIVISIONS`].
    pub divisions: u32,
    /// Number of items a cell keeps before new items are pushed into children.
    pub split_threshold: usize,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            corner_a: Point3::ZERO,
            corner_b: Point3::splat(1.0),
            divisions: 3,
            split_threshold: 0,
        }
    }
}

impl SpatialConfig {
    /// Set the initial extent from two opposite corners (in any order).
    #[must_use]
    pub fn with_extent(mut self, corner_a: Point3, corner_b: Point3) -> Self {
        self.corner_a = corner_a;
        self.corner_b = corner_b;
        self
    }

    /// Set the grid fan-out per axis.
    #[must_use]
    pub fn with_divisions(mut self, divisions: u32) -> Self {
        self.divisions = divisions;
        self
    }

    /// Set the split threshold.
    #[must_use]
    pub fn with_split_threshold(mut self, split_threshold: usize) -> Self {
        self.split_threshold = split_threshold;
        self
    }

    /// Check the parameters.
    ///
    /// # Errors
    ///
    /// See [`ConfigError`] for the rejected cases.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.slot_count().map(|_| ())
    }

    /// Number of child slots per subdivided cell (`divisions³`).
    pub(crate) fn slot_count(&self) -> Result<usize, ConfigError> {
        if self.divisions < 2 {
            return Err(ConfigError::TooFewDivisions(self.divisions));
        }
        if !self.corner_a.is_finite() || !self.corner_b.is_finite() {
            return Err(ConfigError::NonFiniteCorner);
        }
        if self.divisions > MAX_DIVISIONS {
            return Err(ConfigError::TooManyDivisions(self.divisions));
        }
        usize::try_from(self.divisions.pow(3))
            .map_err(|_| ConfigError::TooManyDivisions(self.divisions))
    }

    /// Normalized `(min_position, stepping)` of the initial grid.
    ///
    /// A zero-length axis gets a stepping of 1 so the grid never degenerates.
    pub(crate) fn grid(&self) -> (Point3, Point3) {
        let min = self.corner_a.min(self.corner_b);
        let max = self.corner_a.max(self.corner_b);
        let mut stepping = (max - min) / f64::from(self.divisions);
        for s in [&mut stepping.x, &mut stepping.y, &mut stepping.z] {
            if *s == 0.0 {
                *s = 1.0;
            }
        }
        (min, stepping)
    }
}
