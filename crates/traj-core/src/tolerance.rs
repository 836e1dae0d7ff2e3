/// Floating-point tolerance used for all fuzzy comparisons in the
/// trajectory crates.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Tolerance {
    /// Absolute tolerance for time and position comparisons
    pub eps: f64,
}

impl Tolerance {
    pub const DEFAULT_EPS: f64 = 1e-10;

    pub fn new(eps: f64) -> Self {
        Self { eps }
    }

    pub fn default_precision() -> Self {
        Self {
            eps: Self::DEFAULT_EPS,
        }
    }

    pub fn loose() -> Self {
        Self { eps: 1e-6 }
    }

    pub fn tight() -> Self {
        Self { eps: 1e-12 }
    }

    /// Check if two values are equal within tolerance
    pub fn eq(self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.eps
    }

    /// Check if a value is zero within tolerance
    pub fn is_zero(self, v: f64) -> bool {
        v.abs() <= self.eps
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::default_precision()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuzzy_eq() {
        let tol = Tolerance::default();
        assert!(tol.eq(1.0, 1.0 + 0.5 * Tolerance::DEFAULT_EPS));
        assert!(!tol.eq(1.0, 1.0 + 10.0 * Tolerance::DEFAULT_EPS));
    }

    #[test]
    fn test_is_zero() {
        let tol = Tolerance::new(1e-8);
        assert!(tol.is_zero(5e-9));
        assert!(tol.is_zero(-5e-9));
        assert!(!tol.is_zero(2e-8));
    }

    #[test]
    fn test_presets() {
        assert!(Tolerance::loose().eps > Tolerance::default_precision().eps);
        assert!(Tolerance::tight().eps < Tolerance::default_precision().eps);
    }
}
