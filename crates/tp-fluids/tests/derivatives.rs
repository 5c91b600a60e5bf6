//! Generic partial derivatives against identities and finite differences.

use tp_core::units::{k, mol_per_m3, pa};
use tp_core::{Tolerances, nearly_equal};
use tp_fluids::Parameter::{Cpmolar, Dmolar, Hmolar, P, Smolar, T, Umolar};
use tp_fluids::{FluidBackend, FluidError, HelmholtzBackend, Parameter, Species, StateInput};

const T0: f64 = 350.0;
const P0: f64 = 5e6;

fn co2_at(input: StateInput) -> HelmholtzBackend {
    let mut b = HelmholtzBackend::new(vec![Species::CO2]).unwrap();
    b.update(input).unwrap();
    b
}

fn co2() -> HelmholtzBackend {
    co2_at(StateInput::PT {
        p: pa(P0),
        t: k(T0),
    })
}

fn at_dt(rho: f64, t: f64) -> HelmholtzBackend {
    co2_at(StateInput::DmolarT {
        rhomolar: mol_per_m3(rho),
        t: k(t),
    })
}

#[test]
fn reciprocity() {
    let mut b = co2();
    let pairs = [(P, T, Dmolar), (Hmolar, P, T), (Smolar, T, P), (Umolar, Dmolar, T)];
    for (a, w, c) in pairs {
        let forward = b.first_partial_deriv(a, w, c).unwrap();
        let back = b.first_partial_deriv(w, a, c).unwrap();
        assert!(
            nearly_equal(forward * back, 1.0, Tolerances::relative(1e-10)),
            "({a}, {w}, {c})"
        );
    }
}

#[test]
fn triple_product_rule() {
    let mut b = co2();
    let dp_dt = b.first_partial_deriv(P, T, Dmolar).unwrap();
    let dt_drho = b.first_partial_deriv(T, Dmolar, P).unwrap();
    let drho_dp = b.first_partial_deriv(Dmolar, P, T).unwrap();
    assert!(nearly_equal(dp_dt * dt_drho * drho_dp, -1.0, Tolerances::relative(1e-10)));
}

#[test]
fn isobaric_enthalpy_slope_is_cp() {
    let mut b = co2();
    let dh_dt = b.first_partial_deriv(Hmolar, T, P).unwrap();
    let cp = b.keyed_output(Cpmolar).unwrap();
    assert!(nearly_equal(dh_dt, cp, Tolerances::relative(1e-8)));
}

#[test]
fn first_derivative_matches_central_difference() {
    let mut b = co2();
    let rho = b.rhomolar();
    let dt = 1e-3;
    let fd = (at_dt(rho, T0 + dt).p() - at_dt(rho, T0 - dt).p()) / (2.0 * dt);
    let analytic = b.first_partial_deriv(P, T, Dmolar).unwrap();
    assert!(nearly_equal(analytic, fd, Tolerances::relative(1e-6)), "{analytic} vs {fd}");
}

#[test]
fn second_derivative_matches_difference_of_first() {
    let mut b = co2();
    let rho = b.rhomolar();
    let h = rho * 1e-5;
    let slope = |r: f64| {
        at_dt(r, T0)
            .first_partial_deriv(P, Dmolar, T)
            .unwrap()
    };
    let fd = (slope(rho + h) - slope(rho - h)) / (2.0 * h);
    let analytic = b.second_partial_deriv(P, Dmolar, T, Dmolar, T).unwrap();
    assert!(nearly_equal(analytic, fd, Tolerances::relative(1e-5)), "{analytic} vs {fd}");
}

#[test]
fn mixed_second_derivative_is_symmetric() {
    let mut b = co2();
    let rt = b.second_partial_deriv(P, T, Dmolar, Dmolar, T).unwrap();
    let tr = b.second_partial_deriv(P, Dmolar, T, T, Dmolar).unwrap();
    assert!(nearly_equal(rt, tr, Tolerances::relative(1e-9)));
}

#[test]
fn mass_keys_scale_by_molar_mass() {
    let mut b = co2();
    let m = b.molar_mass().unwrap();
    let molar = b.first_partial_deriv(Hmolar, T, P).unwrap();
    let mass = b.first_partial_deriv(Parameter::Hmass, T, P).unwrap();
    assert!(nearly_equal(mass * m, molar, Tolerances::relative(1e-12)));
}

#[test]
fn unsupported_key_is_reported() {
    let mut b = co2();
    assert!(
        b.first_partial_deriv(Parameter::Viscosity, T, P)
            .is_err()
    );
}

#[test]
fn heat_capacity_derivatives_are_not_supported() {
    let mut b = co2();
    for key in [Cpmolar, Parameter::Cvmolar, Parameter::Cpmass] {
        assert!(matches!(
            b.first_partial_deriv(key, T, P),
            Err(FluidError::NotSupported { .. })
        ));
    }
    assert!(matches!(
        b.second_partial_deriv(Hmolar, T, P, Cpmolar, P),
        Err(FluidError::NotSupported { .. })
    ));
}
