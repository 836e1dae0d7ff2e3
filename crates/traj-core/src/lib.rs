pub mod error;
pub mod tolerance;
pub mod traits;

pub use error::{Result, TrajError};
pub use tolerance::Tolerance;
pub use traits::{PositionBounds, Validate};
