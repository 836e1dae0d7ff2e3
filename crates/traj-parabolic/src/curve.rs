//! Single-axis curve: an ordered chain of ramps.

use std::fmt;

use serde::{Deserialize, Serialize};
use traj_core::{PositionBounds, Result, Tolerance, TrajError, Validate};

use crate::switch_points::SwitchPoints;
use crate::{fmt_vec, Ramp, Trajectory};

/// An ordered sequence of [`Ramp`]s forming one continuous scalar
/// trajectory.
///
/// Construction rewrites every ramp's `x0` so positions chain from the
/// first ramp's initial position; velocity continuity across ramp
/// boundaries is the caller's responsibility and is never enforced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParabolicCurve {
    pub(crate) ramps: Vec<Ramp>,
    pub(crate) switch_points: SwitchPoints,
    pub(crate) x0: f64,
    pub(crate) x1: f64,
    pub(crate) v0: f64,
    pub(crate) v1: f64,
    pub(crate) d: f64,
    pub(crate) duration: f64,
    pub(crate) tol: Tolerance,
}

impl ParabolicCurve {
    /// Build a curve from a non-empty ramp sequence, using the default
    /// tolerance.
    pub fn new(ramps: Vec<Ramp>) -> Result<Self> {
        Self::with_tolerance(ramps, Tolerance::default())
    }

    pub fn with_tolerance(ramps: Vec<Ramp>, tol: Tolerance) -> Result<Self> {
        if ramps.is_empty() {
            return Err(TrajError::Precondition(
                "cannot build a parabolic curve from an empty ramp sequence".into(),
            ));
        }

        let mut curve = Self {
            tol,
            switch_points: SwitchPoints::with_capacity(ramps.len() + 1),
            ..Default::default()
        };
        curve.switch_points.push_cumulative(0.0);
        for ramp in &ramps {
            curve.d += ramp.d();
            curve.duration += ramp.duration();
            curve.switch_points.push_cumulative(curve.duration);
        }
        curve.v0 = ramps[0].v0();
        curve.v1 = ramps[ramps.len() - 1].v1();
        let x0 = ramps[0].x0();
        curve.ramps = ramps;
        curve.set_initial_value(x0);
        Ok(curve)
    }

    pub fn is_empty(&self) -> bool {
        self.ramps.is_empty()
    }

    pub fn ramps(&self) -> &[Ramp] {
        &self.ramps
    }

    /// Cumulative segment boundary times; `ramps().len() + 1` entries when
    /// the curve is non-empty.
    pub fn switch_points(&self) -> &[f64] {
        self.switch_points.as_slice()
    }

    pub fn x0(&self) -> f64 {
        self.x0
    }

    pub fn x1(&self) -> f64 {
        self.x1
    }

    pub fn v0(&self) -> f64 {
        self.v0
    }

    pub fn v1(&self) -> f64 {
        self.v1
    }

    /// Net displacement over the full duration.
    pub fn d(&self) -> f64 {
        self.d
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tol
    }

    /// Rebase the whole curve at a new initial position: every ramp's `x0`
    /// is rewritten to the running position so the chain stays continuous.
    /// Idempotent for a fixed `new_x0`.
    pub fn set_initial_value(&mut self, new_x0: f64) {
        self.x0 = new_x0;
        let mut running = new_x0;
        for ramp in &mut self.ramps {
            ramp.set_x0(running);
            running += ramp.d();
        }
        self.x1 = self.x0 + self.d;
    }

    /// Append another curve's ramps onto this one.
    ///
    /// An empty `self` adopts `other` wholesale. Continuity (the argument's
    /// `x0` matching this curve's `x1`, and matching boundary velocities) is
    /// the caller's contract and is not checked.
    pub fn append(&mut self, other: ParabolicCurve) -> Result<()> {
        if other.is_empty() {
            return Err(TrajError::Precondition(
                "cannot append an empty parabolic curve".into(),
            ));
        }
        if self.is_empty() {
            *self = other;
            return Ok(());
        }

        self.v1 = other.v1;
        for ramp in other.ramps {
            self.d += ramp.d();
            self.duration += ramp.duration();
            self.switch_points.push_cumulative(self.duration);
            self.ramps.push(ramp);
        }
        let x0 = self.x0;
        self.set_initial_value(x0);
        Ok(())
    }

    fn check_time(&self, t: f64) -> Result<()> {
        if self.is_empty() {
            return Err(TrajError::Precondition(
                "cannot evaluate an empty parabolic curve".into(),
            ));
        }
        if t < -self.tol.eps || t > self.duration + self.tol.eps {
            return Err(TrajError::TimeOutOfRange {
                t,
                duration: self.duration,
            });
        }
        Ok(())
    }

    /// Locate the ramp containing time `t`.
    ///
    /// Returns the ramp index and the time offset (`remainder`) from that
    /// ramp's start. Times within tolerance of 0 map to `(0, 0)`; times
    /// within tolerance of the total duration map to the last ramp at its
    /// full duration.
    pub fn find_ramp_index(&self, t: f64) -> Result<(usize, f64)> {
        self.check_time(t)?;
        if t < self.tol.eps {
            return Ok((0, 0.0));
        }
        if t > self.duration - self.tol.eps {
            let last = self.ramps.len() - 1;
            return Ok((last, self.ramps[last].duration()));
        }

        // First switch point not below t, minus one, is the containing ramp.
        let points = self.switch_points.as_slice();
        let index = points.partition_point(|&s| s < t) - 1;
        Ok((index, t - points[index]))
    }

    /// Position at time `t`, clamped to the curve endpoints at the
    /// boundaries.
    pub fn eval_pos(&self, t: f64) -> Result<f64> {
        self.check_time(t)?;
        if t <= 0.0 {
            return Ok(self.x0);
        }
        if t >= self.duration {
            return Ok(self.x1);
        }
        let (index, remainder) = self.find_ramp_index(t)?;
        self.ramps[index].eval_pos(remainder)
    }

    /// Velocity at time `t`, clamped to the curve endpoints at the
    /// boundaries.
    pub fn eval_vel(&self, t: f64) -> Result<f64> {
        self.check_time(t)?;
        if t <= 0.0 {
            return Ok(self.v0);
        }
        if t >= self.duration {
            return Ok(self.v1);
        }
        let (index, remainder) = self.find_ramp_index(t)?;
        self.ramps[index].eval_vel(remainder)
    }

    /// Acceleration at time `t`: the containing ramp's constant
    /// acceleration, the first ramp's at or before 0, the last ramp's at or
    /// after the total duration.
    pub fn eval_acc(&self, t: f64) -> Result<f64> {
        self.check_time(t)?;
        if t <= 0.0 {
            return Ok(self.ramps[0].a());
        }
        if t >= self.duration {
            return Ok(self.ramps[self.ramps.len() - 1].a());
        }
        let (index, _) = self.find_ramp_index(t)?;
        Ok(self.ramps[index].a())
    }

    /// Tightest `[bmin, bmax]` position interval over the whole curve.
    pub fn peaks(&self) -> Result<(f64, f64)> {
        if self.is_empty() {
            return Err(TrajError::Precondition(
                "cannot compute peaks of an empty parabolic curve".into(),
            ));
        }
        let mut bmin = f64::INFINITY;
        let mut bmax = f64::NEG_INFINITY;
        for ramp in &self.ramps {
            let (lo, hi) = ramp.peaks();
            bmin = bmin.min(lo);
            bmax = bmax.max(hi);
        }
        Ok((bmin, bmax))
    }

    /// Restore the canonical empty state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Shrink the final ramp so the total duration equals `new_duration`.
    ///
    /// Used by the multi-axis constructor to clamp fuzzily-equal axis
    /// durations onto a common time base; `new_duration` must lie within
    /// tolerance below the current duration.
    pub(crate) fn truncate_duration(&mut self, new_duration: f64) -> Result<()> {
        if self.is_empty() {
            return Err(TrajError::Precondition(
                "cannot truncate an empty parabolic curve".into(),
            ));
        }
        let excess = self.duration - new_duration;
        let last = self.ramps.len() - 1;
        let last_duration = (self.ramps[last].duration() - excess).max(0.0);
        self.ramps[last].set_duration(last_duration)?;

        self.duration = new_duration;
        self.d = self.ramps.iter().map(Ramp::d).sum();
        self.v1 = self.ramps[last].v1();
        self.x1 = self.x0 + self.d;

        self.switch_points.clear();
        self.switch_points.push_cumulative(0.0);
        let mut acc = 0.0;
        for ramp in &self.ramps[..last] {
            acc += ramp.duration();
            self.switch_points.push_cumulative(acc);
        }
        self.switch_points.push_cumulative(self.duration);
        Ok(())
    }
}

impl Trajectory for ParabolicCurve {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn eval_pos(&self, t: f64) -> Result<f64> {
        ParabolicCurve::eval_pos(self, t)
    }

    fn eval_vel(&self, t: f64) -> Result<f64> {
        ParabolicCurve::eval_vel(self, t)
    }

    fn eval_acc(&self, t: f64) -> Result<f64> {
        ParabolicCurve::eval_acc(self, t)
    }
}

impl Validate for ParabolicCurve {
    fn validate(&self) -> Result<()> {
        if self.is_empty() {
            if !self.switch_points.is_empty() {
                return Err(TrajError::Validation(
                    "empty curve carries a non-empty switch-point table".into(),
                ));
            }
            return Ok(());
        }

        if self.switch_points.len() != self.ramps.len() + 1 {
            return Err(TrajError::Validation(format!(
                "switch-point table has {} entries for {} ramps",
                self.switch_points.len(),
                self.ramps.len()
            )));
        }
        let points = self.switch_points.as_slice();
        if points[0] != 0.0 {
            return Err(TrajError::Validation(format!(
                "switch-point table starts at {:.15e}, expected 0",
                points[0]
            )));
        }
        if points.windows(2).any(|w| w[1] < w[0]) {
            return Err(TrajError::Validation(
                "switch-point table is not non-decreasing".into(),
            ));
        }
        if !self.tol.eq(points[points.len() - 1], self.duration) {
            return Err(TrajError::Validation(format!(
                "last switch point {:.15e} disagrees with duration {:.15e}",
                points[points.len() - 1],
                self.duration
            )));
        }

        for (i, ramp) in self.ramps.iter().enumerate() {
            ramp.validate()?;
            if i > 0 && !self.tol.eq(ramp.x0(), self.ramps[i - 1].x1()) {
                return Err(TrajError::Validation(format!(
                    "position discontinuity between ramps {} and {i}: {:.15e} vs {:.15e}",
                    i - 1,
                    self.ramps[i - 1].x1(),
                    ramp.x0()
                )));
            }
        }

        let d: f64 = self.ramps.iter().map(Ramp::d).sum();
        if !self.tol.eq(self.d, d) {
            return Err(TrajError::Validation(format!(
                "d = {:.15e} disagrees with summed ramp displacements {d:.15e}",
                self.d
            )));
        }
        if !self.tol.eq(self.x1, self.x0 + self.d) {
            return Err(TrajError::Validation(format!(
                "x1 = {:.15e} disagrees with x0 + d = {:.15e}",
                self.x1,
                self.x0 + self.d
            )));
        }
        Ok(())
    }
}

impl PositionBounds for ParabolicCurve {
    type Bound = f64;

    fn position_bounds(&self) -> Result<(f64, f64)> {
        self.peaks()
    }
}

impl fmt::Display for ParabolicCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ParabolicCurve: {} ramps", self.ramps.len())?;
        writeln!(f, "  v0 = {:.15e}", self.v0)?;
        writeln!(f, "   t = {:.15e}", self.duration)?;
        writeln!(f, "  x0 = {:.15e}", self.x0)?;
        writeln!(f, "  x1 = {:.15e}", self.x1)?;
        writeln!(f, "   d = {:.15e}", self.d)?;
        write!(
            f,
            "  switch points = {}",
            fmt_vec(self.switch_points.as_slice())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn two_ramp_curve() -> ParabolicCurve {
        // accelerate for 1s, then cruise for 2s
        let r0 = Ramp::new(0.0, 1.0, 1.0, 0.0).unwrap();
        let r1 = Ramp::new(1.0, 0.0, 2.0, 0.0).unwrap();
        ParabolicCurve::new(vec![r0, r1]).unwrap()
    }

    #[test]
    fn test_construction_aggregates() {
        let curve = two_ramp_curve();
        assert_abs_diff_eq!(curve.duration(), 3.0);
        assert_abs_diff_eq!(curve.v0(), 0.0);
        assert_abs_diff_eq!(curve.v1(), 1.0);
        assert_abs_diff_eq!(curve.d(), 2.5); // 0.5 + 2.0
        assert_eq!(curve.switch_points(), &[0.0, 1.0, 3.0]);
        // ramp x0 values rewritten to chain continuously
        assert_abs_diff_eq!(curve.ramps()[1].x0(), 0.5);
        assert_abs_diff_eq!(curve.eval_pos(3.0).unwrap(), curve.x1());
    }

    #[test]
    fn test_empty_rejected() {
        assert!(ParabolicCurve::new(Vec::new()).is_err());
    }

    #[test]
    fn test_find_ramp_index() {
        let curve = two_ramp_curve();
        assert_eq!(curve.find_ramp_index(0.0).unwrap(), (0, 0.0));
        let (index, remainder) = curve.find_ramp_index(1.5).unwrap();
        assert_eq!(index, 1);
        assert_abs_diff_eq!(remainder, 0.5);
        // exactly on a switch point: previous ramp at its full duration
        let (index, remainder) = curve.find_ramp_index(1.0).unwrap();
        assert_eq!(index, 0);
        assert_abs_diff_eq!(remainder, 1.0);
        // near the end: last ramp, full duration
        let (index, remainder) = curve.find_ramp_index(3.0).unwrap();
        assert_eq!(index, 1);
        assert_abs_diff_eq!(remainder, 2.0);
        assert!(curve.find_ramp_index(3.5).is_err());
    }

    #[test]
    fn test_eval_continuity_across_boundary() {
        let curve = two_ramp_curve();
        let eps = 1e-9;
        let before = curve.eval_pos(1.0 - eps).unwrap();
        let after = curve.eval_pos(1.0 + eps).unwrap();
        assert_abs_diff_eq!(before, after, epsilon = 1e-8);
        assert_abs_diff_eq!(
            curve.eval_vel(1.0 - eps).unwrap(),
            curve.eval_vel(1.0 + eps).unwrap(),
            epsilon = 1e-8
        );
    }

    #[test]
    fn test_eval_acc_boundary_convention() {
        let curve = two_ramp_curve();
        // <= / >= at both ends, same as pos and vel
        assert_abs_diff_eq!(curve.eval_acc(0.0).unwrap(), 1.0);
        assert_abs_diff_eq!(curve.eval_acc(3.0).unwrap(), 0.0);
        assert_abs_diff_eq!(curve.eval_acc(0.5).unwrap(), 1.0);
        assert_abs_diff_eq!(curve.eval_acc(2.0).unwrap(), 0.0);
    }

    #[test]
    fn test_set_initial_value() {
        let mut curve = two_ramp_curve();
        curve.set_initial_value(10.0);
        assert_abs_diff_eq!(curve.x0(), 10.0);
        assert_abs_diff_eq!(curve.x1(), 12.5);
        assert_abs_diff_eq!(curve.ramps()[1].x0(), 10.5);
        assert_abs_diff_eq!(curve.eval_pos(0.0).unwrap(), 10.0);

        // idempotent under repeated application
        let before = curve.clone();
        curve.set_initial_value(10.0);
        assert_eq!(curve, before);
    }

    #[test]
    fn test_append() {
        let mut curve = two_ramp_curve();
        let tail = ParabolicCurve::new(vec![Ramp::new(1.0, -1.0, 1.0, 2.5).unwrap()]).unwrap();
        curve.append(tail).unwrap();
        assert_abs_diff_eq!(curve.duration(), 4.0);
        assert_eq!(curve.switch_points(), &[0.0, 1.0, 3.0, 4.0]);
        assert_abs_diff_eq!(curve.v1(), 0.0);
        assert_abs_diff_eq!(curve.x1(), 3.0); // 2.5 + (1 - 0.5)
        curve.validate().unwrap();
    }

    #[test]
    fn test_append_into_empty_adopts() {
        let mut curve = ParabolicCurve::default();
        curve.append(two_ramp_curve()).unwrap();
        assert_eq!(curve, two_ramp_curve());
        assert!(curve.append(ParabolicCurve::default()).is_err());
    }

    #[test]
    fn test_peaks_folds_ramps() {
        // dip to -2 at t = 2, return to 0, then cruise up to 2
        let r0 = Ramp::new(-2.0, 1.0, 4.0, 0.0).unwrap();
        let r1 = Ramp::new(2.0, 0.0, 1.0, 0.0).unwrap();
        let curve = ParabolicCurve::new(vec![r0, r1]).unwrap();
        let (bmin, bmax) = curve.peaks().unwrap();
        assert_abs_diff_eq!(bmin, -2.0);
        assert_abs_diff_eq!(bmax, 2.0);
        assert_abs_diff_eq!(bmax, curve.x1());
        assert!(ParabolicCurve::default().peaks().is_err());
    }

    #[test]
    fn test_validate_detects_position_discontinuity() {
        let mut curve = two_ramp_curve();
        curve.validate().unwrap();
        // break the position chain between ramps 0 and 1; each ramp stays
        // internally consistent, so the chain check must catch it
        let x0 = curve.ramps[1].x0();
        curve.ramps[1].set_x0(x0 + 1.0);
        assert!(matches!(curve.validate(), Err(TrajError::Validation(_))));
    }

    #[test]
    fn test_reset_is_default() {
        let mut curve = two_ramp_curve();
        curve.reset();
        assert_eq!(curve, ParabolicCurve::default());
        assert!(curve.is_empty());
    }

    #[test]
    fn test_truncate_duration() {
        let mut curve = two_ramp_curve();
        curve.truncate_duration(2.5).unwrap();
        assert_eq!(curve.duration(), 2.5);
        assert_eq!(curve.switch_points(), &[0.0, 1.0, 2.5]);
        assert_abs_diff_eq!(curve.d(), 2.0);
        assert_abs_diff_eq!(curve.x1(), 2.0);
        curve.validate().unwrap();
    }
}
