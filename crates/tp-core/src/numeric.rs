use crate::TpError;

/// Floating point type used throughout system
pub type Real = f64;

/// Absolute and relative tolerance pair for float comparisons.
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

impl Tolerances {
    /// Purely relative tolerance (absolute floor at zero).
    pub const fn relative(rel: Real) -> Self {
        Self { abs: 0.0, rel }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, TpError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(TpError::NonFinite { what, value: v })
    }
}

pub fn ensure_positive(v: Real, what: &'static str) -> Result<Real, TpError> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(TpError::NonPositive { what, value: v })
    }
}

/// `n` evenly spaced points on `[start, end]` (inclusive).
pub fn linspace(start: Real, end: Real, n: usize) -> Vec<Real> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as Real;
            (0..n).map(|i| start + step * i as Real).collect()
        }
    }
}

/// `n` logarithmically spaced points on `[start, end]`; both bounds must be positive.
pub fn logspace(start: Real, end: Real, n: usize) -> Result<Vec<Real>, TpError> {
    let lo = ensure_positive(start, "logspace start")?.ln();
    let hi = ensure_positive(end, "logspace end")?.ln();
    Ok(linspace(lo, hi, n).into_iter().map(Real::exp).collect())
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
    fn ensure_positive_rejects_zero() {
        assert!(ensure_positive(1.0, "x").is_ok());
        assert!(matches!(
            ensure_positive(0.0, "x"),
            Err(TpError::NonPositive { .. })
        ));
        assert!(matches!(
            ensure_positive(Real::INFINITY, "x"),
            Err(TpError::NonFinite { .. })
        ));
    }

    #[test]
    fn spacing_endpoints() {
        let lin = linspace(1.0, 3.0, 5);
        assert_eq!(lin.len(), 5);
        assert_eq!(lin[0], 1.0);
        assert!(nearly_equal(lin[4], 3.0, Tolerances::default()));

        let log = logspace(1.0, 100.0, 3).unwrap();
        assert!(nearly_equal(log[1], 10.0, Tolerances::default()));
        assert!(logspace(0.0, 1.0, 3).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn logspace_is_monotonic(lo in 1e-6_f64..1.0, span in 1.1_f64..1e4, n in 2_usize..50) {
            let pts = logspace(lo, lo * span, n).unwrap();
            prop_assert_eq!(pts.len(), n);
            prop_assert!(pts.windows(2).all(|w| w[1] > w[0]));
        }
    }
}
