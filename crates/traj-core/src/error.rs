use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrajError {
    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("Evaluation time {t:.15e} outside [0, {duration:.15e}]")]
    TimeOutOfRange { t: f64, duration: f64 },

    #[error("DOF mismatch: expected {expected}, got {actual}")]
    DofMismatch { expected: usize, actual: usize },

    #[error("Duration mismatch: expected {expected:.15e}, got {actual:.15e}")]
    DurationMismatch { expected: f64, actual: f64 },

    #[error("Validation failed: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, TrajError>;
