// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported when validating a [`SpatialConfig`](crate::SpatialConfig).

/// Reasons a [`SpatialConfig`](crate::SpatialConfig) is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The grid fan-out must be at least 2 per axis.
    #[error("divisions must be at least 2, got {0}")]
    TooFewDivisions(u32),
    /// The grid fan-out exceeds [`MAX_DIVISIONS`](crate::config::MAX_DIVISIONS).
    #[error("divisions must be at most 32, got {0}")]
    TooManyDivisions(u32),
    /// An initial corner has a NaN or infinite component.
    #[error("initial corners must be finite")]
    NonFiniteCorner,
}
