//! End-to-end factory requests.

use tp_core::units::{k, pa};
use tp_core::{Tolerances, nearly_equal};
use tp_fluids::{
    FluidBackend, FluidError, Parameter, Phase, StateInput, TableConfig, construct,
    construct_with_config,
};

fn pt(p: f64, t: f64) -> StateInput {
    StateInput::PT { p: pa(p), t: k(t) }
}

fn small_table() -> TableConfig {
    TableConfig {
        nt: 40,
        nrho: 40,
        t_range: Some((400.0, 700.0)),
        rhomolar_range: Some((1.0, 2_000.0)),
    }
}

#[test]
fn heos_water_reports_one_basis() {
    let mut water = construct("HEOS", "WATER").unwrap();
    let bases = [
        water.using_mole_fractions(),
        water.using_mass_fractions(),
        water.using_volu_fractions(),
    ];
    assert_eq!(bases.iter().filter(|b| **b).count(), 1);
    assert!(water.using_mole_fractions());
    assert_eq!(water.name(), "Water");
    assert_eq!(water.fractions(), &[1.0]);

    water.update(pt(101_325.0, 300.0)).unwrap();
    assert_eq!(water.phase().unwrap(), Phase::Liquid);
}

#[test]
fn ttse_matches_heos_within_interpolation_tolerance() {
    let mut heos = construct("HEOS", "Water").unwrap();
    let mut ttse = construct_with_config("TTSE&HEOS", "Water", &small_table()).unwrap();
    assert_eq!(ttse.backend_name(), "TTSE&HEOS");

    let state = pt(1e5, 550.0);
    heos.update(state).unwrap();
    ttse.update(state).unwrap();

    assert!(nearly_equal(ttse.rhomolar(), heos.rhomolar(), Tolerances::relative(1e-10)));
    let tol = Tolerances::relative(1e-3);
    assert!(nearly_equal(ttse.hmolar().unwrap(), heos.hmolar().unwrap(), tol));
    assert!(nearly_equal(ttse.umolar().unwrap(), heos.umolar().unwrap(), tol));
    // delegated, so exact
    assert_eq!(ttse.cpmolar().unwrap(), heos.cpmolar().unwrap());
}

#[test]
fn bicubic_matches_heos_on_density_input() {
    let mut heos = construct("HEOS", "Water").unwrap();
    let mut bicubic = construct_with_config("BICUBIC&HEOS", "Water", &small_table()).unwrap();
    let state = StateInput::DmolarT {
        rhomolar: tp_core::units::mol_per_m3(55.5),
        t: k(610.0),
    };
    heos.update(state).unwrap();
    bicubic.update(state).unwrap();
    assert!(nearly_equal(bicubic.p(), heos.p(), Tolerances::relative(1e-3)));
}

#[test]
fn incomp_meg_selects_incompressible_family() {
    let mut meg = construct("INCOMP", "MEG-50%").unwrap();
    assert_eq!(meg.backend_name(), "INCOMP");
    assert!(meg.using_mass_fractions());
    assert!(!meg.using_mole_fractions());
    assert_eq!(meg.fractions(), &[0.5]);

    meg.update(pt(2e5, 300.0)).unwrap();
    let rho = meg.rhomass().unwrap();
    assert!(rho > 1000.0 && rho < 1150.0, "rho = {rho}");
    assert_eq!(meg.phase().unwrap(), Phase::Liquid);
    assert!(meg.viscosity().unwrap() > 0.0);
}

#[test]
fn question_mark_infers_the_engine() {
    assert_eq!(construct("?", "MEG-30%").unwrap().backend_name(), "INCOMP");
    assert_eq!(construct("?", "CaCl2[0.2]").unwrap().backend_name(), "BRINE");
    assert_eq!(construct("?", "Methane").unwrap().backend_name(), "HEOS");
    assert_eq!(
        construct("?", "Methane[0.9]&Nitrogen[0.1]")
            .unwrap()
            .backend_name(),
        "HEOS"
    );
    assert_eq!(
        construct("?", "COOLPROP::Water").unwrap().backend_name(),
        "COOLPROP"
    );
}

#[test]
fn unknown_requests() {
    assert!(matches!(
        construct("XYZ", "Water"),
        Err(FluidError::UnknownBackend { .. })
    ));
    assert!(matches!(
        construct("HEOS", "Kryptonite"),
        Err(FluidError::UnknownFluid { .. })
    ));
    assert!(matches!(
        construct("INCOMP", "Water"),
        Err(FluidError::UnknownFluid { .. })
    ));
}

#[test]
fn mixture_from_string_is_usable() {
    let mut air = construct("HEOS", "Nitrogen[0.79]&Oxygen[0.21]").unwrap();
    air.update(pt(101_325.0, 300.0)).unwrap();
    let rho = air.rhomass().unwrap();
    assert!(nearly_equal(rho, 1.176, Tolerances::relative(0.01)), "rho = {rho}");
    assert!(air.fugacity_coefficient(0).unwrap() > 0.99);
    assert!(
        air.keyed_output(Parameter::Viscosity)
            .unwrap_err()
            .is_not_implemented()
    );
}

#[test]
fn backends_are_independent_and_send() {
    fn assert_send<T: Send>(_: &T) {}
    let a = construct("HEOS", "Nitrogen").unwrap();
    assert_send(&a);
    let handle = std::thread::spawn(move || {
        let mut a = a;
        a.update(pt(1e5, 300.0)).unwrap();
        a.rhomolar()
    });
    let rho = handle.join().unwrap();
    assert!(rho > 39.0 && rho < 41.0);
}
