use crate::EmsError;

/// Floating point type used throughout the toolkit.
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

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, EmsError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(EmsError::NonFinite { what, value: v })
    }
}

/// Render a number the way every generated program line renders numbers.
///
/// Policy: shortest decimal that parses back to the same `f64` (`ryu`).
/// Integral values keep a trailing `.0` (`26.0`); very large or very small
/// magnitudes switch to exponent form (`1e16`). Negative zero renders as
/// `0.0` so that `-0.0` and `0.0` produce identical text.
pub fn format_real(v: Real) -> String {
    let v = if v == 0.0 { 0.0 } else { v };
    let mut buffer = ryu::Buffer::new();
    buffer.format(v).to_owned()
}

/// Round to `decimals` places. Used on unit-converted arguments so that
/// `42.8 F` is emitted as `6.0` rather than `5.999999999999999`.
pub fn round_to(v: Real, decimals: i32) -> Real {
    let scale = 10f64.powi(decimals);
    (v * scale).round() / scale
}

/// [`format_real`] for values that must be finite.
pub fn format_finite(v: Real, what: &'static str) -> Result<String, EmsError> {
    ensure_finite(v, what).map(format_real)
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
    fn round_to_cleans_conversion_noise() {
        assert_eq!(round_to(5.999999999999999, 6), 6.0);
        assert_eq!(round_to(0.566336932, 6), 0.566337);
        assert_eq!(format_real(round_to(-1.2999999999, 6)), "-1.3");
    }

    #[test]
    fn format_real_keeps_trailing_zero() {
        assert_eq!(format_real(26.0), "26.0");
        assert_eq!(format_real(47.5), "47.5");
        assert_eq!(format_real(0.56628), "0.56628");
        assert_eq!(format_real(-3.0), "-3.0");
    }

    #[test]
    fn format_real_normalizes_negative_zero() {
        assert_eq!(format_real(-0.0), format_real(0.0));
    }

    #[test]
    fn format_finite_rejects_infinity() {
        assert!(format_finite(Real::INFINITY, "boundary").is_err());
        assert_eq!(format_finite(1.5, "boundary").unwrap(), "1.5");
    }
}
