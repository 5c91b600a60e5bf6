//! Partial derivatives of state properties over the reduced (τ, δ) basis.
//!
//! Any property `A` that can be written as a function of τ = T_r/T and
//! δ = ρ/ρ_r has
//!
//! ```text
//! (∂A/∂B)_C = [A_τ C_δ − A_δ C_τ] / [B_τ C_δ − B_δ C_τ]
//! ```
//!
//! so a backend only has to supply Helmholtz-energy terms and the engine can
//! differentiate any supported key with respect to any other at any third key
//! held constant. The second-order form applies the quotient rule to the same
//! ratio.

use crate::backend::FluidBackend;
use crate::error::{FluidError, FluidResult};
use crate::params::Parameter;
use crate::record::AlphaDeriv;
use std::ops::{Add, Mul, Sub};

/// A property and its τ/δ derivatives up to second order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReducedDerivatives {
    pub value: f64,
    pub d_tau: f64,
    pub d_delta: f64,
    pub d2_tau2: f64,
    pub d2_tau_delta: f64,
    pub d2_delta2: f64,
}

impl ReducedDerivatives {
    pub const fn constant(value: f64) -> Self {
        Self {
            value,
            d_tau: 0.0,
            d_delta: 0.0,
            d2_tau2: 0.0,
            d2_tau_delta: 0.0,
            d2_delta2: 0.0,
        }
    }

    /// τ itself.
    pub const fn tau(tau: f64) -> Self {
        Self {
            d_tau: 1.0,
            ..Self::constant(tau)
        }
    }

    /// δ itself.
    pub const fn delta(delta: f64) -> Self {
        Self {
            d_delta: 1.0,
            ..Self::constant(delta)
        }
    }

    /// 1/τ.
    pub fn inv_tau(tau: f64) -> Self {
        Self {
            value: 1.0 / tau,
            d_tau: -1.0 / (tau * tau),
            d2_tau2: 2.0 / (tau * tau * tau),
            ..Self::constant(0.0)
        }
    }
}

impl Add for ReducedDerivatives {
    type Output = Self;

    fn add(self, o: Self) -> Self {
        Self {
            value: self.value + o.value,
            d_tau: self.d_tau + o.d_tau,
            d_delta: self.d_delta + o.d_delta,
            d2_tau2: self.d2_tau2 + o.d2_tau2,
            d2_tau_delta: self.d2_tau_delta + o.d2_tau_delta,
            d2_delta2: self.d2_delta2 + o.d2_delta2,
        }
    }
}

impl Sub for ReducedDerivatives {
    type Output = Self;

    fn sub(self, o: Self) -> Self {
        self + o * -1.0
    }
}

impl Mul<f64> for ReducedDerivatives {
    type Output = Self;

    fn mul(self, k: f64) -> Self {
        Self {
            value: self.value * k,
            d_tau: self.d_tau * k,
            d_delta: self.d_delta * k,
            d2_tau2: self.d2_tau2 * k,
            d2_tau_delta: self.d2_tau_delta * k,
            d2_delta2: self.d2_delta2 * k,
        }
    }
}

/// Product rule.
impl Mul for ReducedDerivatives {
    type Output = Self;

    fn mul(self, o: Self) -> Self {
        Self {
            value: self.value * o.value,
            d_tau: self.d_tau * o.value + self.value * o.d_tau,
            d_delta: self.d_delta * o.value + self.value * o.d_delta,
            d2_tau2: self.d2_tau2 * o.value + 2.0 * self.d_tau * o.d_tau + self.value * o.d2_tau2,
            d2_tau_delta: self.d2_tau_delta * o.value
                + self.d_tau * o.d_delta
                + self.d_delta * o.d_tau
                + self.value * o.d2_tau_delta,
            d2_delta2: self.d2_delta2 * o.value
                + 2.0 * self.d_delta * o.d_delta
                + self.value * o.d2_delta2,
        }
    }
}

fn checked_ratio(num: f64, den: f64) -> FluidResult<f64> {
    let value = num / den;
    if den == 0.0 || !value.is_finite() {
        return Err(FluidError::NonPhysical {
            what: "degenerate partial derivative",
        });
    }
    Ok(value)
}

/// `(∂A/∂B)_C` from reduced derivatives of A, B and C.
pub fn first_partial(
    a: &ReducedDerivatives,
    b: &ReducedDerivatives,
    c: &ReducedDerivatives,
) -> FluidResult<f64> {
    let n = a.d_tau * c.d_delta - a.d_delta * c.d_tau;
    let d = b.d_tau * c.d_delta - b.d_delta * c.d_tau;
    checked_ratio(n, d)
}

/// `∂/∂D|_E (∂A/∂B)_C` from reduced derivatives of A, B, C, D and E.
pub fn second_partial(
    a: &ReducedDerivatives,
    b: &ReducedDerivatives,
    c: &ReducedDerivatives,
    d: &ReducedDerivatives,
    e: &ReducedDerivatives,
) -> FluidResult<f64> {
    let n = a.d_tau * c.d_delta - a.d_delta * c.d_tau;
    let den = b.d_tau * c.d_delta - b.d_delta * c.d_tau;

    let n_tau = a.d_tau * c.d2_tau_delta + a.d2_tau2 * c.d_delta
        - a.d_delta * c.d2_tau2
        - a.d2_tau_delta * c.d_tau;
    let n_delta = a.d_tau * c.d2_delta2 + a.d2_tau_delta * c.d_delta
        - a.d_delta * c.d2_tau_delta
        - a.d2_delta2 * c.d_tau;
    let den_tau = b.d_tau * c.d2_tau_delta + b.d2_tau2 * c.d_delta
        - b.d_delta * c.d2_tau2
        - b.d2_tau_delta * c.d_tau;
    let den_delta = b.d_tau * c.d2_delta2 + b.d2_tau_delta * c.d_delta
        - b.d_delta * c.d2_tau_delta
        - b.d2_delta2 * c.d_tau;

    let den2 = den * den;
    let inner_tau = checked_ratio(den * n_tau - n * den_tau, den2)?;
    let inner_delta = checked_ratio(den * n_delta - n * den_delta, den2)?;

    checked_ratio(
        inner_tau * e.d_delta - inner_delta * e.d_tau,
        d.d_tau * e.d_delta - d.d_delta * e.d_tau,
    )
}

/// Sum of the ideal and residual Helmholtz terms for the derivatives a
/// property needs, fetched through the state's cache.
struct Alpha<'a, B: FluidBackend + ?Sized> {
    state: &'a mut B,
    with_ideal: bool,
}

impl<B: FluidBackend + ?Sized> Alpha<'_, B> {
    fn get(&mut self, which: AlphaDeriv) -> FluidResult<f64> {
        let residual = self.state.alphar(which)?;
        if self.with_ideal {
            Ok(residual + self.state.alpha0(which)?)
        } else {
            Ok(residual)
        }
    }

    /// The term together with its first and second derivatives.
    fn field(&mut self) -> FluidResult<ReducedDerivatives> {
        Ok(ReducedDerivatives {
            value: self.get(AlphaDeriv::Value)?,
            d_tau: self.get(AlphaDeriv::Tau)?,
            d_delta: self.get(AlphaDeriv::Delta)?,
            d2_tau2: self.get(AlphaDeriv::Tau2)?,
            d2_tau_delta: self.get(AlphaDeriv::DeltaTau)?,
            d2_delta2: self.get(AlphaDeriv::Delta2)?,
        })
    }

    /// ∂α/∂τ and its first and second derivatives.
    fn tau_field(&mut self) -> FluidResult<ReducedDerivatives> {
        Ok(ReducedDerivatives {
            value: self.get(AlphaDeriv::Tau)?,
            d_tau: self.get(AlphaDeriv::Tau2)?,
            d_delta: self.get(AlphaDeriv::DeltaTau)?,
            d2_tau2: self.get(AlphaDeriv::Tau3)?,
            d2_tau_delta: self.get(AlphaDeriv::DeltaTau2)?,
            d2_delta2: self.get(AlphaDeriv::Delta2Tau)?,
        })
    }

    /// 1 + δ ∂αʳ/∂δ and its derivatives (residual terms only).
    fn compressibility_field(&mut self, delta: f64) -> FluidResult<ReducedDerivatives> {
        let ar_d = self.state.alphar(AlphaDeriv::Delta)?;
        let ar_dd = self.state.alphar(AlphaDeriv::Delta2)?;
        let ar_ddd = self.state.alphar(AlphaDeriv::Delta3)?;
        let ar_dt = self.state.alphar(AlphaDeriv::DeltaTau)?;
        let ar_dtt = self.state.alphar(AlphaDeriv::DeltaTau2)?;
        let ar_ddt = self.state.alphar(AlphaDeriv::Delta2Tau)?;
        Ok(ReducedDerivatives {
            value: 1.0 + delta * ar_d,
            d_tau: delta * ar_dt,
            d_delta: ar_d + delta * ar_dd,
            d2_tau2: delta * ar_dtt,
            d2_tau_delta: ar_dt + delta * ar_ddt,
            d2_delta2: 2.0 * ar_dd + delta * ar_ddd,
        })
    }
}

/// Reduced derivatives of `key` at the current state of `state`.
///
/// Covers T, P, ρ, h, s, u, g, τ, δ and their mass-basis forms. Heat
/// capacities, speed of sound and transport properties need third-order
/// Helmholtz terms or correlations outside (τ, δ) and return
/// [`FluidError::NotSupported`].
pub fn reduced_derivatives<B: FluidBackend + ?Sized>(
    state: &mut B,
    key: Parameter,
) -> FluidResult<ReducedDerivatives> {
    if let Some((molar, exponent)) = key.molar_basis() {
        let mm = state.molar_mass()?;
        return Ok(reduced_derivatives(state, molar)? * mm.powi(exponent));
    }

    let tau = state.tau()?;
    let delta = state.delta()?;
    let reducing = state.get_reducing_state()?;
    let tr = reducing.t;

    let temperature = ReducedDerivatives::inv_tau(tau) * tr;
    match key {
        Parameter::Tau => Ok(ReducedDerivatives::tau(tau)),
        Parameter::Delta => Ok(ReducedDerivatives::delta(delta)),
        Parameter::T => Ok(temperature),
        Parameter::Dmolar => Ok(ReducedDerivatives::delta(delta) * reducing.rhomolar),
        Parameter::P => {
            let r = state.gas_constant()?;
            let mut alpha = Alpha {
                state,
                with_ideal: false,
            };
            let z = alpha.compressibility_field(delta)?;
            // p = ρ_r R T_r · δ(1 + δαʳ_δ) / τ
            Ok(ReducedDerivatives::delta(delta) * z
                * ReducedDerivatives::inv_tau(tau)
                * (reducing.rhomolar * r * tr))
        }
        Parameter::Umolar => {
            let r = state.gas_constant()?;
            let mut alpha = Alpha {
                state,
                with_ideal: true,
            };
            Ok(alpha.tau_field()? * (r * tr))
        }
        Parameter::Hmolar => {
            let r = state.gas_constant()?;
            enthalpy(state, tau, delta, r * tr)
        }
        Parameter::Smolar => {
            let r = state.gas_constant()?;
            entropy(state, tau, r)
        }
        Parameter::Gmolar => {
            let r = state.gas_constant()?;
            let h = enthalpy(state, tau, delta, r * tr)?;
            let s = entropy(state, tau, r)?;
            Ok(h - temperature * s)
        }
        _ => Err(FluidError::NotSupported {
            what: "reduced derivatives of this key",
        }),
    }
}

fn enthalpy<B: FluidBackend + ?Sized>(
    state: &mut B,
    tau: f64,
    delta: f64,
    r_tr: f64,
) -> FluidResult<ReducedDerivatives> {
    let mut alpha = Alpha {
        state,
        with_ideal: true,
    };
    let z = alpha.compressibility_field(delta)?;
    let a_t = alpha.tau_field()?;
    // h = R T_r [(1 + δαʳ_δ)/τ + α⁰_τ + αʳ_τ]
    Ok((z * ReducedDerivatives::inv_tau(tau) + a_t) * r_tr)
}

fn entropy<B: FluidBackend + ?Sized>(
    state: &mut B,
    tau: f64,
    r: f64,
) -> FluidResult<ReducedDerivatives> {
    let mut alpha = Alpha {
        state,
        with_ideal: true,
    };
    let a = alpha.field()?;
    let a_t = alpha.tau_field()?;
    // s = R [τ(α⁰_τ + αʳ_τ) − α⁰ − αʳ]
    Ok((ReducedDerivatives::tau(tau) * a_t - a) * r)
}

fn require_homogeneous<B: FluidBackend + ?Sized>(state: &mut B) -> FluidResult<()> {
    let phase = state.phase()?;
    if phase.is_homogeneous() {
        Ok(())
    } else {
        Err(FluidError::NonHomogeneous { phase })
    }
}

/// `(∂of/∂wrt)_constant` at the current state.
///
/// All three keys must be among those [`reduced_derivatives`] handles, so
/// `(∂Cp/∂T)_P` and similar fail with [`FluidError::NotSupported`].
pub fn first_partial_deriv<B: FluidBackend + ?Sized>(
    state: &mut B,
    of: Parameter,
    wrt: Parameter,
    constant: Parameter,
) -> FluidResult<f64> {
    require_homogeneous(state)?;
    let a = reduced_derivatives(state, of)?;
    let b = reduced_derivatives(state, wrt)?;
    let c = reduced_derivatives(state, constant)?;
    first_partial(&a, &b, &c)
}

/// `∂/∂wrt2|constant2 (∂of/∂wrt1)_constant1` at the current state.
pub fn second_partial_deriv<B: FluidBackend + ?Sized>(
    state: &mut B,
    of: Parameter,
    wrt1: Parameter,
    constant1: Parameter,
    wrt2: Parameter,
    constant2: Parameter,
) -> FluidResult<f64> {
    require_homogeneous(state)?;
    let a = reduced_derivatives(state, of)?;
    let b = reduced_derivatives(state, wrt1)?;
    let c = reduced_derivatives(state, constant1)?;
    let d = reduced_derivatives(state, wrt2)?;
    let e = reduced_derivatives(state, constant2)?;
    second_partial(&a, &b, &c, &d, &e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tp_core::numeric::{Tolerances, nearly_equal};

    const TOL: Tolerances = Tolerances {
        abs: 1e-12,
        rel: 1e-9,
    };

    /// Ideal gas in (τ, δ) with T_r = ρ_r = R = 1: p = δ/τ.
    fn ideal_pressure(tau: f64, delta: f64) -> ReducedDerivatives {
        ReducedDerivatives::delta(delta) * ReducedDerivatives::inv_tau(tau)
    }

    #[test]
    fn product_rule_matches_closed_form() {
        let (tau, delta) = (0.8, 1.7);
        let p = ideal_pressure(tau, delta);
        assert!(nearly_equal(p.value, delta / tau, TOL));
        assert!(nearly_equal(p.d_tau, -delta / (tau * tau), TOL));
        assert!(nearly_equal(p.d_delta, 1.0 / tau, TOL));
        assert!(nearly_equal(p.d2_tau2, 2.0 * delta / tau.powi(3), TOL));
        assert!(nearly_equal(p.d2_tau_delta, -1.0 / (tau * tau), TOL));
        assert_eq!(p.d2_delta2, 0.0);
    }

    #[test]
    fn ideal_gas_first_partials() {
        let (tau, delta) = (0.5, 3.0);
        let p = ideal_pressure(tau, delta);
        let t = ReducedDerivatives::inv_tau(tau);
        let rho = ReducedDerivatives::delta(delta);

        // (∂p/∂T)_ρ = ρ and (∂p/∂ρ)_T = T for p = ρT.
        assert!(nearly_equal(first_partial(&p, &t, &rho).unwrap(), delta, TOL));
        assert!(nearly_equal(first_partial(&p, &rho, &t).unwrap(), 1.0 / tau, TOL));
    }

    #[test]
    fn reciprocity() {
        let (tau, delta) = (0.9, 0.4);
        let p = ideal_pressure(tau, delta);
        let t = ReducedDerivatives::inv_tau(tau);
        let rho = ReducedDerivatives::delta(delta);
        let forward = first_partial(&p, &t, &rho).unwrap();
        let back = first_partial(&t, &p, &rho).unwrap();
        assert!(nearly_equal(forward * back, 1.0, TOL));
    }

    #[test]
    fn ideal_gas_second_partials() {
        let (tau, delta) = (0.5, 3.0);
        let p = ideal_pressure(tau, delta);
        let t = ReducedDerivatives::inv_tau(tau);
        let rho = ReducedDerivatives::delta(delta);

        // ∂/∂ρ|_T (∂p/∂T)_ρ = 1 and ∂/∂T|_ρ (∂p/∂T)_ρ = 0.
        let mixed = second_partial(&p, &t, &rho, &rho, &t).unwrap();
        assert!(nearly_equal(mixed, 1.0, TOL));
        let straight = second_partial(&p, &t, &rho, &t, &rho).unwrap();
        assert!(straight.abs() < 1e-12);
    }

    #[test]
    fn degenerate_denominator_is_an_error() {
        let t = ReducedDerivatives::inv_tau(0.5);
        let err = first_partial(&t, &t, &t).unwrap_err();
        assert!(matches!(err, FluidError::NonPhysical { .. }));
    }
}
