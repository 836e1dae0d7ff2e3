//! Sorted table of segment boundary times.

use serde::{Deserialize, Serialize};
use traj_core::Tolerance;

/// Cumulative times at which one segment ends and the next begins.
///
/// A non-empty table starts at 0 and ends at the owning curve's total
/// duration. Single-axis curves extend it by accumulation
/// ([`push_cumulative`](Self::push_cumulative)); multi-axis merging goes
/// through [`insert_unique`](Self::insert_unique), which keeps the table
/// sorted and free of entries closer than the tolerance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwitchPoints {
    points: Vec<f64>,
}

impl SwitchPoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Append a cumulative time. The caller guarantees monotonicity;
    /// duplicates (zero-duration segments) are kept.
    pub fn push_cumulative(&mut self, t: f64) {
        debug_assert!(
            self.points.last().map_or(true, |&last| t >= last),
            "switch points must be non-decreasing"
        );
        self.points.push(t);
    }

    /// Insert `t` at its sorted position unless an existing entry is within
    /// tolerance of it. Returns whether an insertion happened.
    pub fn insert_unique(&mut self, t: f64, tol: Tolerance) -> bool {
        let idx = self.points.partition_point(|&s| s < t);
        if idx < self.points.len() && tol.eq(self.points[idx], t) {
            return false;
        }
        if idx > 0 && tol.eq(self.points[idx - 1], t) {
            return false;
        }
        self.points.insert(idx, t);
        true
    }

    /// Merge every entry of `other`, shifted forward by `offset`.
    pub fn merge_shifted(&mut self, other: &SwitchPoints, offset: f64, tol: Tolerance) {
        for &p in other.as_slice() {
            self.insert_unique(p + offset, tol);
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}
