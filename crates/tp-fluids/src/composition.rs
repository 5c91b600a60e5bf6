//! Composition vectors: validation, normalization and basis conversion.

use crate::error::{FluidError, FluidResult};

/// Validate a fraction vector and normalize it to sum to one.
///
/// Every entry must be finite and non-negative, and the sum positive.
pub fn normalize_fractions(fractions: &[f64]) -> FluidResult<Vec<f64>> {
    if fractions.is_empty() {
        return Err(FluidError::InvalidArg {
            what: "empty composition",
        });
    }

    let mut sum = 0.0;
    for &frac in fractions {
        if !frac.is_finite() {
            return Err(FluidError::NonPhysical {
                what: "non-finite fraction",
            });
        }
        if frac < 0.0 {
            return Err(FluidError::NonPhysical {
                what: "negative fraction",
            });
        }
        sum += frac;
    }

    if sum <= 0.0 || !sum.is_finite() {
        return Err(FluidError::NonPhysical {
            what: "fractions sum to zero or non-finite",
        });
    }

    Ok(fractions.iter().map(|f| f / sum).collect())
}

/// Convert normalized mass fractions to mole fractions.
pub fn mass_to_mole(mass: &[f64], molar_masses: &[f64]) -> FluidResult<Vec<f64>> {
    if mass.len() != molar_masses.len() {
        return Err(FluidError::InvalidArg {
            what: "fraction count does not match component count",
        });
    }
    let moles: Vec<f64> = mass.iter().zip(molar_masses).map(|(w, m)| w / m).collect();
    normalize_fractions(&moles)
}

/// Convert normalized mole fractions to mass fractions.
pub fn mole_to_mass(mole: &[f64], molar_masses: &[f64]) -> FluidResult<Vec<f64>> {
    if mole.len() != molar_masses.len() {
        return Err(FluidError::InvalidArg {
            what: "fraction count does not match component count",
        });
    }
    let masses: Vec<f64> = mole.iter().zip(molar_masses).map(|(x, m)| x * m).collect();
    normalize_fractions(&masses)
}

/// Mole-fraction weighted molar mass [kg/mol].
pub fn mixture_molar_mass(mole: &[f64], molar_masses: &[f64]) -> f64 {
    mole.iter().zip(molar_masses).map(|(x, m)| x * m).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tp_core::numeric::{Tolerances, nearly_equal};

    const TOL: Tolerances = Tolerances {
        abs: 1e-12,
        rel: 1e-10,
    };

    #[test]
    fn normalizes_non_unit_sum() {
        let x = normalize_fractions(&[2.0, 8.0]).unwrap();
        assert!(nearly_equal(x[0], 0.2, TOL));
        assert!(nearly_equal(x[1], 0.8, TOL));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(normalize_fractions(&[]).is_err());
        assert!(normalize_fractions(&[-0.5, 1.5]).is_err());
        assert!(normalize_fractions(&[0.0, 0.0]).is_err());
        assert!(normalize_fractions(&[f64::NAN]).is_err());
    }

    #[test]
    fn mass_mole_conversion_inverts() {
        let m = [0.0280134, 0.0319988];
        let x = mass_to_mole(&[0.5, 0.5], &m).unwrap();
        assert!(x[0] > x[1]);
        let w = mole_to_mass(&x, &m).unwrap();
        assert!(nearly_equal(w[0], 0.5, TOL));
        assert!(nearly_equal(w[1], 0.5, TOL));
        assert!(mass_to_mole(&[1.0], &m).is_err());
    }

    #[test]
    fn molar_mass_of_air_like_mix() {
        let m = mixture_molar_mass(&[0.79, 0.21], &[0.0280134, 0.0319988]);
        assert!(nearly_equal(m, 0.028850, Tolerances { abs: 1e-6, rel: 0.0 }));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use tp_core::numeric::{Tolerances, nearly_equal};

    proptest! {
        #[test]
        fn normalized_sum_is_one(fracs in prop::collection::vec(0.0_f64..1.0_f64, 1..6)) {
            if let Ok(x) = normalize_fractions(&fracs) {
                let sum: f64 = x.iter().sum();
                let tol = Tolerances { abs: 1e-9, rel: 1e-9 };
                prop_assert!(nearly_equal(sum, 1.0, tol));
                prop_assert!(x.iter().all(|f| *f >= 0.0));
            }
        }
    }
}
