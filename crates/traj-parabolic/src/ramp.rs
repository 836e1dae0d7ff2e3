//! Single constant-acceleration segment.

use std::fmt;

use serde::{Deserialize, Serialize};
use traj_core::{PositionBounds, Result, Tolerance, TrajError, Validate};

use crate::Trajectory;

/// Motion over `[0, duration]` under constant acceleration `a`, starting at
/// position `x0` with velocity `v0`.
///
/// The final velocity `v1`, net displacement `d`, and final position `x1`
/// are derived from the four defining fields and are recomputed by every
/// mutating operation; they are never written independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Ramp {
    pub(crate) v0: f64,
    pub(crate) a: f64,
    pub(crate) duration: f64,
    pub(crate) x0: f64,
    pub(crate) v1: f64,
    pub(crate) d: f64,
    pub(crate) x1: f64,
    pub(crate) tol: Tolerance,
}

impl Ramp {
    /// Build a ramp with the default tolerance.
    ///
    /// Fails if `duration` is negative beyond tolerance. Durations in
    /// `[-eps, 0)` are kept as given, not clamped; see
    /// [`set_duration`](Self::set_duration) for the clamping variant.
    pub fn new(v0: f64, a: f64, duration: f64, x0: f64) -> Result<Self> {
        Self::with_tolerance(v0, a, duration, x0, Tolerance::default())
    }

    pub fn with_tolerance(v0: f64, a: f64, duration: f64, x0: f64, tol: Tolerance) -> Result<Self> {
        if duration < -tol.eps {
            return Err(TrajError::Precondition(format!(
                "ramp duration {duration:.15e} is negative beyond tolerance"
            )));
        }
        let v1 = v0 + a * duration;
        let d = duration * (v0 + 0.5 * a * duration);
        Ok(Self {
            v0,
            a,
            duration,
            x0,
            v1,
            d,
            x1: x0 + d,
            tol,
        })
    }

    pub fn v0(&self) -> f64 {
        self.v0
    }

    pub fn a(&self) -> f64 {
        self.a
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn x0(&self) -> f64 {
        self.x0
    }

    pub fn v1(&self) -> f64 {
        self.v1
    }

    /// Net displacement over the full duration.
    pub fn d(&self) -> f64 {
        self.d
    }

    pub fn x1(&self) -> f64 {
        self.x1
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tol
    }

    fn check_time(&self, t: f64) -> Result<()> {
        if t < -self.tol.eps || t > self.duration + self.tol.eps {
            return Err(TrajError::TimeOutOfRange {
                t,
                duration: self.duration,
            });
        }
        Ok(())
    }

    /// Position at time `t`. Clamps to `x0`/`x1` at the boundaries; interior
    /// times use the closed-form quadratic, so there is no integration drift.
    pub fn eval_pos(&self, t: f64) -> Result<f64> {
        self.check_time(t)?;
        if t <= 0.0 {
            return Ok(self.x0);
        }
        if t >= self.duration {
            return Ok(self.x1);
        }
        Ok(t * (self.v0 + 0.5 * self.a * t) + self.x0)
    }

    /// Velocity at time `t`, clamped to `v0`/`v1` at the boundaries.
    pub fn eval_vel(&self, t: f64) -> Result<f64> {
        self.check_time(t)?;
        if t <= 0.0 {
            return Ok(self.v0);
        }
        if t >= self.duration {
            return Ok(self.v1);
        }
        Ok(self.v0 + self.a * t)
    }

    /// Acceleration is constant; `t` is range-checked only.
    pub fn eval_acc(&self, t: f64) -> Result<f64> {
        self.check_time(t)?;
        Ok(self.a)
    }

    /// Tightest `[bmin, bmax]` position interval swept over `[0, duration]`.
    ///
    /// Endpoints bound the sweep unless the velocity crosses zero strictly
    /// inside the interval, in which case the parabola's vertex widens the
    /// bounds.
    pub fn peaks(&self) -> (f64, f64) {
        if self.tol.is_zero(self.a) {
            return if self.v0 > 0.0 {
                (self.x0, self.x1)
            } else {
                (self.x1, self.x0)
            };
        }

        let (bmin, bmax) = if self.a > 0.0 {
            (self.x0, self.x1)
        } else {
            (self.x1, self.x0)
        };

        let t_vertex = -self.v0 / self.a;
        if t_vertex <= 0.0 || t_vertex >= self.duration {
            return (bmin, bmax);
        }
        let x_vertex = t_vertex * (self.v0 + 0.5 * self.a * t_vertex) + self.x0;
        (bmin.min(x_vertex), bmax.max(x_vertex))
    }

    /// Change the duration in place, recomputing `v1`, `d`, `x1`.
    ///
    /// Fails if `new_duration` is negative beyond tolerance; values in
    /// `[-eps, 0)` are clamped to zero.
    pub fn set_duration(&mut self, new_duration: f64) -> Result<()> {
        if new_duration < -self.tol.eps {
            return Err(TrajError::Precondition(format!(
                "ramp duration {new_duration:.15e} is negative beyond tolerance"
            )));
        }
        self.duration = new_duration.max(0.0);
        self.v1 = self.v0 + self.a * self.duration;
        self.d = self.duration * (self.v0 + 0.5 * self.a * self.duration);
        self.x1 = self.x0 + self.d;
        Ok(())
    }

    /// Rebase the segment's initial position, shifting `x1` with it.
    pub fn set_x0(&mut self, new_x0: f64) {
        self.x0 = new_x0;
        self.x1 = self.x0 + self.d;
    }

    /// Restore the canonical empty state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Trajectory for Ramp {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn eval_pos(&self, t: f64) -> Result<f64> {
        Ramp::eval_pos(self, t)
    }

    fn eval_vel(&self, t: f64) -> Result<f64> {
        Ramp::eval_vel(self, t)
    }

    fn eval_acc(&self, t: f64) -> Result<f64> {
        Ramp::eval_acc(self, t)
    }
}

impl Validate for Ramp {
    fn validate(&self) -> Result<()> {
        if self.duration < -self.tol.eps {
            return Err(TrajError::Validation(format!(
                "ramp duration {:.15e} is negative beyond tolerance",
                self.duration
            )));
        }
        if !self.tol.eq(self.v1, self.v0 + self.a * self.duration) {
            return Err(TrajError::Validation(format!(
                "v1 = {:.15e} disagrees with v0 + a*duration = {:.15e}",
                self.v1,
                self.v0 + self.a * self.duration
            )));
        }
        let d = self.duration * (self.v0 + 0.5 * self.a * self.duration);
        if !self.tol.eq(self.d, d) {
            return Err(TrajError::Validation(format!(
                "d = {:.15e} disagrees with recomputed displacement {d:.15e}",
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

impl PositionBounds for Ramp {
    type Bound = f64;

    fn position_bounds(&self) -> Result<(f64, f64)> {
        Ok(self.peaks())
    }
}

impl fmt::Display for Ramp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ramp:")?;
        writeln!(f, "  v0 = {:.15e}", self.v0)?;
        writeln!(f, "   a = {:.15e}", self.a)?;
        writeln!(f, "   t = {:.15e}", self.duration)?;
        writeln!(f, "  x0 = {:.15e}", self.x0)?;
        writeln!(f, "  v1 = {:.15e}", self.v1)?;
        writeln!(f, "   d = {:.15e}", self.d)?;
        write!(f, "  x1 = {:.15e}", self.x1)
    }
}
