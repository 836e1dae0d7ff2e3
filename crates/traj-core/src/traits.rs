use crate::error::Result;

/// Check internal consistency of a trajectory entity: derived fields must
/// agree with the defining fields, switch-point tables must be well formed,
/// and chained segments must line up within tolerance.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Compute the tightest interval of positions swept over the entity's
/// duration, including interior extrema.
pub trait PositionBounds {
    type Bound;
    fn position_bounds(&self) -> Result<(Self::Bound, Self::Bound)>;
}
