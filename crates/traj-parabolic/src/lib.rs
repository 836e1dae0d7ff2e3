//! Piecewise-parabolic trajectory representation.
//!
//! A trajectory is modeled as a chain of constant-acceleration segments:
//! - [`Ramp`]: one segment with constant acceleration over a fixed duration.
//! - [`ParabolicCurve`]: an ordered chain of ramps on one scalar axis.
//! - [`ParabolicCurvesND`]: one curve per degree of freedom under a shared
//!   time base.
//!
//! The planner that decides segment durations and accelerations lives
//! elsewhere; this crate only represents curves and evaluates them exactly.

pub mod curve;
pub mod curvesnd;
pub mod ramp;
pub mod switch_points;

pub use curve::ParabolicCurve;
pub use curvesnd::ParabolicCurvesND;
pub use ramp::Ramp;
pub use switch_points::SwitchPoints;

use traj_core::Result;

/// Trait for scalar time-parameterized motion profiles.
pub trait Trajectory: Send + Sync {
    /// Total duration of the profile.
    fn duration(&self) -> f64;

    /// Evaluate position at time `t`.
    fn eval_pos(&self, t: f64) -> Result<f64>;

    /// Evaluate velocity at time `t`.
    fn eval_vel(&self, t: f64) -> Result<f64>;

    /// Evaluate acceleration at time `t`.
    fn eval_acc(&self, t: f64) -> Result<f64>;
}

/// Format a slice of values in high-precision scientific notation, for
/// diagnostic dumps only.
pub(crate) fn fmt_vec(values: &[f64]) -> String {
    let items: Vec<String> = values.iter().map(|v| format!("{v:.15e}")).collect();
    format!("[ {} ]", items.join(", "))
}
