use crate::{HqError, HqResult};

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> HqResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(HqError::NonFinite { what, value: v })
    }
}

/// Clamp a user-entered physical magnitude: negatives and non-finite values become 0.
pub fn non_negative(v: Real) -> Real {
    if v.is_finite() && v > 0.0 { v } else { 0.0 }
}

/// Round half away from zero to 2 decimal places (display precision).
pub fn round2(v: Real) -> Real {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn non_negative_clamps() {
        assert_eq!(non_negative(-3.0), 0.0);
        assert_eq!(non_negative(Real::NAN), 0.0);
        assert_eq!(non_negative(Real::INFINITY), 0.0);
        assert_eq!(non_negative(2.5), 2.5);
    }

    #[test]
    fn round2_display_precision() {
        assert_eq!(round2(60.0), 60.0);
        assert_eq!(round2(12.345_6), 12.35);
        assert_eq!(round2(0.004), 0.0);
    }
}
