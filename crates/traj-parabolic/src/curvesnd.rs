//! Multi-axis curve bundle: one scalar curve per degree of freedom.

use std::fmt;

use serde::{Deserialize, Serialize};
use traj_core::{PositionBounds, Result, Tolerance, TrajError, Validate};

use crate::switch_points::SwitchPoints;
use crate::{fmt_vec, ParabolicCurve};

/// N synchronized [`ParabolicCurve`]s sharing a common time base.
///
/// Construction requires every axis duration to be fuzzily equal; the
/// shared duration is the minimum observed, and every longer axis is
/// clamped to it, so afterwards all axis durations equal `duration`
/// exactly. The merged switch-point table is the sorted,
/// tolerance-deduplicated union of every axis's table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParabolicCurvesND {
    ndof: usize,
    curves: Vec<ParabolicCurve>,
    duration: f64,
    x0_vect: Vec<f64>,
    x1_vect: Vec<f64>,
    v0_vect: Vec<f64>,
    v1_vect: Vec<f64>,
    d_vect: Vec<f64>,
    switch_points: SwitchPoints,
    tol: Tolerance,
    /// Planner bookkeeping: whether this bundle passed constraint checking.
    /// Carried, never interpreted here.
    pub constraint_checked: bool,
    /// Planner bookkeeping: whether this bundle was modified since checking.
    /// Carried, never interpreted here.
    pub modified: bool,
}

impl ParabolicCurvesND {
    /// Build a bundle from a non-empty sequence of non-empty axis curves,
    /// using the default tolerance.
    pub fn new(curves: Vec<ParabolicCurve>) -> Result<Self> {
        Self::with_tolerance(curves, Tolerance::default())
    }

    pub fn with_tolerance(curves: Vec<ParabolicCurve>, tol: Tolerance) -> Result<Self> {
        if curves.is_empty() {
            return Err(TrajError::Precondition(
                "cannot build an ND curve from an empty curve sequence".into(),
            ));
        }
        for (axis, curve) in curves.iter().enumerate() {
            if curve.is_empty() {
                return Err(TrajError::Precondition(format!(
                    "axis {axis} curve has no ramps"
                )));
            }
        }

        let mut min_duration = curves[0].duration();
        for curve in &curves[1..] {
            if !tol.eq(curve.duration(), min_duration) {
                return Err(TrajError::DurationMismatch {
                    expected: min_duration,
                    actual: curve.duration(),
                });
            }
            min_duration = min_duration.min(curve.duration());
        }

        // Clamp every axis onto the common minimum so no axis is left out
        // of sync with the shared time base.
        let mut curves = curves;
        for curve in &mut curves {
            if curve.duration() > min_duration {
                curve.truncate_duration(min_duration)?;
            }
        }

        let ndof = curves.len();
        let mut nd = Self {
            ndof,
            duration: min_duration,
            tol,
            x0_vect: Vec::with_capacity(ndof),
            x1_vect: Vec::with_capacity(ndof),
            v0_vect: Vec::with_capacity(ndof),
            v1_vect: Vec::with_capacity(ndof),
            d_vect: Vec::with_capacity(ndof),
            ..Default::default()
        };
        for curve in &curves {
            nd.x0_vect.push(curve.x0());
            nd.x1_vect.push(curve.x1());
            nd.v0_vect.push(curve.v0());
            nd.v1_vect.push(curve.v1());
            nd.d_vect.push(curve.d());
        }

        // Merged table: axis 0's table, then every other axis's interior
        // points. First and last are shared by construction.
        nd.switch_points = curves[0].switch_points.clone();
        for curve in &curves[1..] {
            let points = curve.switch_points();
            for &p in &points[1..points.len() - 1] {
                nd.switch_points.insert_unique(p, tol);
            }
        }

        nd.curves = curves;
        Ok(nd)
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    pub fn ndof(&self) -> usize {
        self.ndof
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn curves(&self) -> &[ParabolicCurve] {
        &self.curves
    }

    pub fn x0_vect(&self) -> &[f64] {
        &self.x0_vect
    }

    pub fn x1_vect(&self) -> &[f64] {
        &self.x1_vect
    }

    pub fn v0_vect(&self) -> &[f64] {
        &self.v0_vect
    }

    pub fn v1_vect(&self) -> &[f64] {
        &self.v1_vect
    }

    /// Per-axis net displacements.
    pub fn d_vect(&self) -> &[f64] {
        &self.d_vect
    }

    /// Union of every axis's switch points, sorted and deduplicated within
    /// tolerance.
    pub fn switch_points(&self) -> &[f64] {
        self.switch_points.as_slice()
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tol
    }

    /// Append another bundle onto this one.
    ///
    /// An empty `self` adopts `other` wholesale; otherwise the DOF counts
    /// must match. Per-axis continuity is the caller's contract, as with
    /// [`ParabolicCurve::append`]. The argument's switch points are shifted
    /// by the prior duration and merged into the sorted table.
    pub fn append(&mut self, other: ParabolicCurvesND) -> Result<()> {
        if other.is_empty() {
            return Err(TrajError::Precondition(
                "cannot append an empty ND curve".into(),
            ));
        }
        if self.is_empty() {
            *self = other;
            return Ok(());
        }
        if other.ndof != self.ndof {
            return Err(TrajError::DofMismatch {
                expected: self.ndof,
                actual: other.ndof,
            });
        }

        let offset = self.duration;
        self.duration += other.duration;
        for (axis, curve) in other.curves.into_iter().enumerate() {
            self.v1_vect[axis] = curve.v1();
            self.d_vect[axis] += curve.d();
            self.curves[axis].append(curve)?;
            self.x1_vect[axis] = self.curves[axis].x1();
        }
        self.switch_points
            .merge_shifted(&other.switch_points, offset, self.tol);
        Ok(())
    }

    fn check_time(&self, t: f64) -> Result<()> {
        if self.is_empty() {
            return Err(TrajError::Precondition(
                "cannot evaluate an empty ND curve".into(),
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

    /// Per-axis positions at time `t`, clamped to the endpoint vectors at
    /// the boundaries.
    pub fn eval_pos(&self, t: f64) -> Result<Vec<f64>> {
        self.check_time(t)?;
        if t <= 0.0 {
            return Ok(self.x0_vect.clone());
        }
        if t >= self.duration {
            return Ok(self.x1_vect.clone());
        }
        self.curves.iter().map(|curve| curve.eval_pos(t)).collect()
    }

    /// Per-axis velocities at time `t`, clamped to the endpoint vectors at
    /// the boundaries.
    pub fn eval_vel(&self, t: f64) -> Result<Vec<f64>> {
        self.check_time(t)?;
        if t <= 0.0 {
            return Ok(self.v0_vect.clone());
        }
        if t >= self.duration {
            return Ok(self.v1_vect.clone());
        }
        self.curves.iter().map(|curve| curve.eval_vel(t)).collect()
    }

    /// Per-axis accelerations at time `t`. Times within tolerance outside
    /// `[0, duration]` are clamped before evaluation.
    pub fn eval_acc(&self, t: f64) -> Result<Vec<f64>> {
        self.check_time(t)?;
        let t = t.clamp(0.0, self.duration);
        self.curves.iter().map(|curve| curve.eval_acc(t)).collect()
    }

    /// Per-axis tightest position intervals over the whole duration.
    pub fn peaks(&self) -> Result<(Vec<f64>, Vec<f64>)> {
        if self.is_empty() {
            return Err(TrajError::Precondition(
                "cannot compute peaks of an empty ND curve".into(),
            ));
        }
        let mut bmin_vect = Vec::with_capacity(self.ndof);
        let mut bmax_vect = Vec::with_capacity(self.ndof);
        for curve in &self.curves {
            let (bmin, bmax) = curve.peaks()?;
            bmin_vect.push(bmin);
            bmax_vect.push(bmax);
        }
        Ok((bmin_vect, bmax_vect))
    }

    /// Restore the canonical empty state, clearing both planner flags.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Validate for ParabolicCurvesND {
    fn validate(&self) -> Result<()> {
        if self.is_empty() {
            if self.ndof != 0 || !self.switch_points.is_empty() {
                return Err(TrajError::Validation(
                    "empty ND curve carries stale fields".into(),
                ));
            }
            return Ok(());
        }

        if self.curves.len() != self.ndof {
            return Err(TrajError::Validation(format!(
                "ndof = {} but {} axis curves held",
                self.ndof,
                self.curves.len()
            )));
        }
        for vect in [
            &self.x0_vect,
            &self.x1_vect,
            &self.v0_vect,
            &self.v1_vect,
            &self.d_vect,
        ] {
            if vect.len() != self.ndof {
                return Err(TrajError::Validation(format!(
                    "aggregate vector has {} entries for {} DOFs",
                    vect.len(),
                    self.ndof
                )));
            }
        }

        for (axis, curve) in self.curves.iter().enumerate() {
            curve.validate()?;
            if !self.tol.eq(curve.duration(), self.duration) {
                return Err(TrajError::Validation(format!(
                    "axis {axis} duration {:.15e} disagrees with shared duration {:.15e}",
                    curve.duration(),
                    self.duration
                )));
            }
            if !self.tol.eq(self.x1_vect[axis], curve.x1()) {
                return Err(TrajError::Validation(format!(
                    "axis {axis} aggregate x1 is stale"
                )));
            }
        }

        let points = self.switch_points.as_slice();
        if points.windows(2).any(|w| w[1] < w[0]) {
            return Err(TrajError::Validation(
                "merged switch-point table is not non-decreasing".into(),
            ));
        }
        if !self.tol.eq(points[points.len() - 1], self.duration) {
            return Err(TrajError::Validation(format!(
                "last merged switch point {:.15e} disagrees with duration {:.15e}",
                points[points.len() - 1],
                self.duration
            )));
        }
        Ok(())
    }
}

impl PositionBounds for ParabolicCurvesND {
    type Bound = Vec<f64>;

    fn position_bounds(&self) -> Result<(Vec<f64>, Vec<f64>)> {
        self.peaks()
    }
}

impl fmt::Display for ParabolicCurvesND {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ParabolicCurvesND: {} DOFs", self.ndof)?;
        writeln!(f, "  t = {:.15e}", self.duration)?;
        writeln!(f, "  x0Vect = {}", fmt_vec(&self.x0_vect))?;
        writeln!(f, "  x1Vect = {}", fmt_vec(&self.x1_vect))?;
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
    use crate::Ramp;
    use approx::assert_abs_diff_eq;

    fn axis(v0: f64, a: f64, duration: f64, x0: f64) -> ParabolicCurve {
        ParabolicCurve::new(vec![Ramp::new(v0, a, duration, x0).unwrap()]).unwrap()
    }

    fn two_axis_bundle() -> ParabolicCurvesND {
        // axis 0 switches at t = 1, axis 1 at t = 2
        let c0 = ParabolicCurve::new(vec![
            Ramp::new(0.0, 2.0, 1.0, 0.0).unwrap(),
            Ramp::new(2.0, 0.0, 2.0, 0.0).unwrap(),
        ])
        .unwrap();
        let c1 = ParabolicCurve::new(vec![
            Ramp::new(1.0, 0.0, 2.0, 5.0).unwrap(),
            Ramp::new(1.0, -1.0, 1.0, 0.0).unwrap(),
        ])
        .unwrap();
        ParabolicCurvesND::new(vec![c0, c1]).unwrap()
    }

    #[test]
    fn test_construction_aggregates() {
        let nd = two_axis_bundle();
        assert_eq!(nd.ndof(), 2);
        assert_abs_diff_eq!(nd.duration(), 3.0);
        assert_eq!(nd.x0_vect(), &[0.0, 5.0]);
        assert_eq!(nd.v0_vect(), &[0.0, 1.0]);
        assert_abs_diff_eq!(nd.x1_vect()[0], 5.0); // 1 + 4
        assert_abs_diff_eq!(nd.x1_vect()[1], 7.5); // 5 + 2 + 0.5
        assert!(!nd.constraint_checked);
        assert!(!nd.modified);
        nd.validate().unwrap();
    }

    #[test]
    fn test_merged_switch_points() {
        let nd = two_axis_bundle();
        assert_eq!(nd.switch_points(), &[0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_empty_inputs_rejected() {
        assert!(ParabolicCurvesND::new(Vec::new()).is_err());
        assert!(ParabolicCurvesND::new(vec![ParabolicCurve::default()]).is_err());
    }

    #[test]
    fn test_eval_boundaries() {
        let nd = two_axis_bundle();
        assert_eq!(nd.eval_pos(0.0).unwrap(), nd.x0_vect());
        assert_eq!(nd.eval_pos(3.0).unwrap(), nd.x1_vect());
        assert_eq!(nd.eval_vel(0.0).unwrap(), nd.v0_vect());
        assert_eq!(nd.eval_vel(3.0).unwrap(), nd.v1_vect());
        assert!(nd.eval_pos(3.5).is_err());
        assert!(nd.eval_pos(-0.5).is_err());
    }

    #[test]
    fn test_eval_acc_clamps_within_tolerance() {
        let nd = two_axis_bundle();
        let eps = nd.tolerance().eps;
        let acc = nd.eval_acc(3.0 + 0.5 * eps).unwrap();
        assert_abs_diff_eq!(acc[0], 0.0);
        assert_abs_diff_eq!(acc[1], -1.0);
        let acc = nd.eval_acc(-0.5 * eps).unwrap();
        assert_abs_diff_eq!(acc[0], 2.0);
        assert_abs_diff_eq!(acc[1], 0.0);
    }

    #[test]
    fn test_duration_mismatch() {
        let tol = Tolerance::new(1e-6);
        let make = |duration: f64| {
            ParabolicCurve::with_tolerance(
                vec![Ramp::with_tolerance(1.0, 0.0, duration, 0.0, tol).unwrap()],
                tol,
            )
            .unwrap()
        };
        // beyond tolerance: rejected
        let result = ParabolicCurvesND::with_tolerance(vec![make(1.0), make(1.0 + 1e-5)], tol);
        assert!(matches!(result, Err(TrajError::DurationMismatch { .. })));
        // within tolerance: accepted and clamped to the minimum
        let nd = ParabolicCurvesND::with_tolerance(vec![make(1.0), make(1.0 + 1e-7)], tol).unwrap();
        assert_eq!(nd.duration(), 1.0);
        for curve in nd.curves() {
            assert_eq!(curve.duration(), 1.0);
        }
    }

    #[test]
    fn test_append() {
        let mut nd = two_axis_bundle();
        let x1 = nd.x1_vect().to_vec();
        let tail = ParabolicCurvesND::new(vec![
            axis(2.0, 0.0, 0.5, x1[0]),
            axis(0.0, 1.0, 0.5, x1[1]),
        ])
        .unwrap();
        nd.append(tail).unwrap();
        assert_abs_diff_eq!(nd.duration(), 3.5);
        assert_eq!(nd.switch_points(), &[0.0, 1.0, 2.0, 3.0, 3.5]);
        assert_abs_diff_eq!(nd.x1_vect()[0], x1[0] + 1.0);
        assert_abs_diff_eq!(nd.v1_vect()[1], 0.5);
        nd.validate().unwrap();
    }

    #[test]
    fn test_append_dof_mismatch() {
        let mut nd = two_axis_bundle();
        let other = ParabolicCurvesND::new(vec![axis(0.0, 0.0, 1.0, 0.0)]).unwrap();
        assert!(matches!(
            nd.append(other),
            Err(TrajError::DofMismatch { .. })
        ));
    }

    #[test]
    fn test_append_into_empty_adopts() {
        let mut nd = ParabolicCurvesND::default();
        nd.append(two_axis_bundle()).unwrap();
        assert_eq!(nd, two_axis_bundle());
    }

    #[test]
    fn test_peaks_per_axis() {
        let nd = two_axis_bundle();
        let (bmin, bmax) = nd.peaks().unwrap();
        assert_eq!(bmin.len(), 2);
        assert_abs_diff_eq!(bmin[0], 0.0);
        assert_abs_diff_eq!(bmax[0], 5.0);
    }

    #[test]
    fn test_validate_detects_axis_drift() {
        // an axis whose duration falls out of sync with the shared time base
        let mut nd = two_axis_bundle();
        nd.curves[1].truncate_duration(2.0).unwrap();
        assert!(matches!(nd.validate(), Err(TrajError::Validation(_))));
    }

    #[test]
    fn test_validate_detects_stale_aggregate() {
        let mut nd = two_axis_bundle();
        nd.x1_vect[0] += 1.0;
        assert!(matches!(nd.validate(), Err(TrajError::Validation(_))));
    }

    #[test]
    fn test_reset_is_default() {
        let mut nd = two_axis_bundle();
        nd.constraint_checked = true;
        nd.modified = true;
        nd.reset();
        assert_eq!(nd, ParabolicCurvesND::default());
        assert!(!nd.constraint_checked);
        assert!(!nd.modified);
    }
}
