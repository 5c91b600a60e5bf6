//! `INCOMP` and `BRINE`: incompressible aqueous solutions.
//!
//! Properties are polynomials in `(T − T_BASE, x)` where `x` is the solute
//! mass fraction; viscosity is the exponential of such a polynomial. The
//! heat capacity is quadratic in temperature so that internal energy and
//! entropy integrate in closed form.

use crate::backend::{FluidBackend, not_implemented};
use crate::error::{FluidError, FluidResult};
use crate::params::StateInput;
use crate::phase::Phase;
use crate::record::StateCore;
use std::fmt;
use std::str::FromStr;

/// Base temperature of the correlations and reference of u and s [K].
pub const T_BASE: f64 = 293.15;

const WATER_MOLAR_MASS: f64 = 0.018_015_268;
const T_MAX: f64 = 373.15;
const P_MAX: f64 = 1e7;

/// Which factory token serves a solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionFamily {
    Incompressible,
    Brine,
}

impl SolutionFamily {
    pub fn token(self) -> &'static str {
        match self {
            SolutionFamily::Incompressible => "INCOMP",
            SolutionFamily::Brine => "BRINE",
        }
    }
}

/// Aqueous solutions with built-in correlations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Solution {
    /// Ethylene glycol
    MEG,
    /// Propylene glycol
    MPG,
    /// Sodium chloride brine
    NaCl,
    /// Calcium chloride brine
    CaCl2,
}

/// `c00 + c01 x + c02 x² + c10 dT + c11 dT x + c20 dT²`
#[derive(Debug, Clone, Copy, PartialEq)]
struct Poly {
    c00: f64,
    c01: f64,
    c02: f64,
    c10: f64,
    c11: f64,
    c20: f64,
}

impl Poly {
    /// Water coefficients with the solute's concentration terms.
    const fn water(c00: f64, c10: f64, c11: f64, c20: f64, c01: f64, c02: f64) -> Self {
        Self {
            c00,
            c01,
            c02,
            c10,
            c11,
            c20,
        }
    }

    fn eval(&self, dt: f64, x: f64) -> f64 {
        let (a, b, c) = self.in_dt(x);
        a + b * dt + c * dt * dt
    }

    /// Coefficients of the quadratic in dT at fixed x.
    fn in_dt(&self, x: f64) -> (f64, f64, f64) {
        (
            self.c00 + self.c01 * x + self.c02 * x * x,
            self.c10 + self.c11 * x,
            self.c20,
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct Correlations {
    rho: Poly,
    cp: Poly,
    k: Poly,
    ln_mu: Poly,
}

impl Solution {
    pub const ALL: [Solution; 4] = [Solution::MEG, Solution::MPG, Solution::NaCl, Solution::CaCl2];

    pub fn key(self) -> &'static str {
        match self {
            Solution::MEG => "MEG",
            Solution::MPG => "MPG",
            Solution::NaCl => "NaCl",
            Solution::CaCl2 => "CaCl2",
        }
    }

    pub fn family(self) -> SolutionFamily {
        match self {
            Solution::MEG | Solution::MPG => SolutionFamily::Incompressible,
            Solution::NaCl | Solution::CaCl2 => SolutionFamily::Brine,
        }
    }

    /// Molar mass of the solute [kg/mol].
    pub fn solute_molar_mass(self) -> f64 {
        match self {
            Solution::MEG => 0.062_07,
            Solution::MPG => 0.076_09,
            Solution::NaCl => 0.058_44,
            Solution::CaCl2 => 0.110_98,
        }
    }

    /// Largest mass fraction the correlations cover.
    pub fn max_fraction(self) -> f64 {
        match self {
            Solution::MEG | Solution::MPG => 0.6,
            Solution::NaCl => 0.23,
            Solution::CaCl2 => 0.30,
        }
    }

    pub fn t_min(self) -> f64 {
        match self {
            Solution::MEG => 243.15,
            Solution::MPG | Solution::NaCl => 253.15,
            Solution::CaCl2 => 233.15,
        }
    }

    fn correlations(self) -> Correlations {
        let (rho, cp, k, ln_mu) = match self {
            Solution::MEG => ((142.0, -30.0), (-1700.0, -200.0), (-0.50, 0.10), (2.2, 0.95)),
            Solution::MPG => ((95.0, -30.0), (-1100.0, -200.0), (-0.52, 0.08), (2.9, 1.6)),
            Solution::NaCl => ((700.0, 300.0), (-4800.0, 2800.0), (-0.3, 0.0), (1.6, 2.9)),
            Solution::CaCl2 => ((850.0, 250.0), (-6000.0, 1800.0), (-0.25, 0.0), (2.0, 6.0)),
        };
        Correlations {
            rho: Poly::water(998.2, -0.20, -0.35, -0.0035, rho.0, rho.1),
            cp: Poly::water(4182.0, 0.0, 4.5, 0.008, cp.0, cp.1),
            k: Poly::water(0.598, 0.0016, -0.0018, -6e-6, k.0, k.1),
            ln_mu: Poly::water(-6.906, -0.0245, -0.012, 0.000_12, ln_mu.0, ln_mu.1),
        }
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Solution {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MEG" | "ETHYLENEGLYCOL" => Ok(Solution::MEG),
            "MPG" | "PROPYLENEGLYCOL" => Ok(Solution::MPG),
            "NACL" => Ok(Solution::NaCl),
            "CACL2" => Ok(Solution::CaCl2),
            _ => Err("unknown solution"),
        }
    }
}

/// Incompressible solution backend; mass-fraction basis, `PT` input only.
#[derive(Debug, Clone)]
pub struct IncompressibleBackend {
    core: StateCore,
    solution: Solution,
    corr: Correlations,
}

impl IncompressibleBackend {
    pub fn new(solution: Solution, mass_fraction: f64) -> FluidResult<Self> {
        let mut backend = Self {
            core: StateCore::new(),
            solution,
            corr: solution.correlations(),
        };
        backend.set_mass_fractions(&[mass_fraction])?;
        Ok(backend)
    }

    pub fn solution(&self) -> Solution {
        self.solution
    }

    fn x(&self) -> f64 {
        self.core.record.fractions.first().copied().unwrap_or(0.0)
    }

    fn dt(&self) -> f64 {
        self.core.record.t - T_BASE
    }

    /// ∫ cp dT from T_BASE [J/kg].
    fn u_mass(&self) -> f64 {
        let (a, b, c) = self.corr.cp.in_dt(self.x());
        let dt = self.dt();
        a * dt + b * dt * dt / 2.0 + c * dt.powi(3) / 3.0
    }

    /// ∫ cp/T dT from T_BASE [J/(kg·K)].
    fn s_mass(&self) -> f64 {
        let (a, b, c) = self.corr.cp.in_dt(self.x());
        let t = self.core.record.t;
        // cp rewritten as k0 + k1 T + c T²
        let k0 = a - b * T_BASE + c * T_BASE * T_BASE;
        let k1 = b - 2.0 * c * T_BASE;
        k0 * (t / T_BASE).ln() + k1 * (t - T_BASE) + c * (t * t - T_BASE * T_BASE) / 2.0
    }

    fn rho_mass(&self, t: f64) -> f64 {
        self.corr.rho.eval(t - T_BASE, self.x())
    }
}

impl FluidBackend for IncompressibleBackend {
    fn core(&self) -> &StateCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    fn backend_name(&self) -> &str {
        self.solution.family().token()
    }

    fn fluid_names(&self) -> Vec<String> {
        vec![self.solution.key().to_string()]
    }

    fn using_mole_fractions(&self) -> bool {
        false
    }

    fn using_mass_fractions(&self) -> bool {
        true
    }

    /// A single solute mass fraction, not a normalized vector.
    fn set_mass_fractions(&mut self, fractions: &[f64]) -> FluidResult<()> {
        let [x] = fractions else {
            return Err(FluidError::InvalidArg {
                what: "solutions take exactly one solute mass fraction",
            });
        };
        if !x.is_finite() || *x < 0.0 || *x > self.solution.max_fraction() {
            return Err(FluidError::OutOfRange {
                what: "solute mass fraction",
            });
        }
        self.clear();
        self.core.record.fractions = vec![*x];
        Ok(())
    }

    fn calc_update(&mut self, input: StateInput) -> FluidResult<()> {
        let StateInput::PT { p, t } = input else {
            return Err(not_implemented(self.backend_name(), "calc_update"));
        };
        let (p, t) = (p.value, t.value);
        if t < self.solution.t_min() || t > T_MAX {
            return Err(FluidError::OutOfRange {
                what: "solution temperature",
            });
        }
        let rhomolar = self.rho_mass(t) / self.molar_mass()?;
        let rec = &mut self.core.record;
        rec.t = t;
        rec.p = p;
        rec.rhomolar = rhomolar;
        rec.q = None;
        Ok(())
    }

    fn calc_molar_mass(&mut self) -> FluidResult<f64> {
        let x = self.x();
        Ok(1.0 / (x / self.solution.solute_molar_mass() + (1.0 - x) / WATER_MOLAR_MASS))
    }

    fn calc_umolar(&mut self) -> FluidResult<f64> {
        Ok(self.u_mass() * self.molar_mass()?)
    }

    fn calc_hmolar(&mut self) -> FluidResult<f64> {
        let rec = &self.core.record;
        let h_mass = self.u_mass() + rec.p / self.rho_mass(rec.t);
        Ok(h_mass * self.molar_mass()?)
    }

    fn calc_smolar(&mut self) -> FluidResult<f64> {
        Ok(self.s_mass() * self.molar_mass()?)
    }

    fn calc_cpmolar(&mut self) -> FluidResult<f64> {
        Ok(self.corr.cp.eval(self.dt(), self.x()) * self.molar_mass()?)
    }

    fn calc_cvmolar(&mut self) -> FluidResult<f64> {
        self.cpmolar()
    }

    fn calc_gibbsmolar(&mut self) -> FluidResult<f64> {
        Ok(self.hmolar()? - self.t() * self.smolar()?)
    }

    fn calc_viscosity(&mut self) -> FluidResult<f64> {
        Ok(self.corr.ln_mu.eval(self.dt(), self.x()).exp())
    }

    fn calc_conductivity(&mut self) -> FluidResult<f64> {
        Ok(self.corr.k.eval(self.dt(), self.x()))
    }

    fn calc_phase(&mut self) -> FluidResult<Phase> {
        Ok(Phase::Liquid)
    }

    fn calc_tmin(&mut self) -> FluidResult<f64> {
        Ok(self.solution.t_min())
    }

    fn calc_tmax(&mut self) -> FluidResult<f64> {
        Ok(T_MAX)
    }

    fn calc_pmax(&mut self) -> FluidResult<f64> {
        Ok(P_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tp_core::numeric::{Tolerances, nearly_equal};
    use tp_core::units::{k, mol_per_m3, pa};

    fn meg50(t: f64) -> IncompressibleBackend {
        let mut b = IncompressibleBackend::new(Solution::MEG, 0.5).unwrap();
        b.update(StateInput::PT {
            p: pa(2e5),
            t: k(t),
        })
        .unwrap();
        b
    }

    #[test]
    fn glycol_at_base_temperature() {
        let mut b = meg50(T_BASE);
        let rho = b.rhomass().unwrap();
        assert!((1050.0..1080.0).contains(&rho), "rho = {rho}");
        let cp = b.cpmass().unwrap();
        assert!((3200.0..3400.0).contains(&cp), "cp = {cp}");
        let mu = b.viscosity().unwrap();
        assert!((2e-3..6e-3).contains(&mu), "mu = {mu}");
        assert_eq!(b.umass().unwrap(), 0.0);
        assert_eq!(b.smass().unwrap(), 0.0);
        assert_eq!(b.phase().unwrap(), Phase::Liquid);
    }

    #[test]
    fn energy_integrals_match_heat_capacity() {
        let dt = 1e-3;
        let mut lo = meg50(300.0 - dt);
        let mut hi = meg50(300.0 + dt);
        let mut mid = meg50(300.0);
        let cp = mid.cpmass().unwrap();
        let du = (hi.umass().unwrap() - lo.umass().unwrap()) / (2.0 * dt);
        let ds = (hi.smass().unwrap() - lo.smass().unwrap()) / (2.0 * dt);
        assert!(nearly_equal(du, cp, Tolerances::relative(1e-6)));
        assert!(nearly_equal(ds, cp / 300.0, Tolerances::relative(1e-6)));
    }

    #[test]
    fn enthalpy_includes_flow_work() {
        let mut b = meg50(320.0);
        let h = b.hmass().unwrap();
        let u = b.umass().unwrap();
        let rho = b.rhomass().unwrap();
        assert!(nearly_equal(h - u, 2e5 / rho, Tolerances::relative(1e-9)));
    }

    #[test]
    fn brine_family_and_molar_mass() {
        let mut b = IncompressibleBackend::new(Solution::NaCl, 0.2).unwrap();
        assert_eq!(b.backend_name(), "BRINE");
        let mm = b.molar_mass().unwrap();
        assert!(mm > WATER_MOLAR_MASS && mm < Solution::NaCl.solute_molar_mass());
    }

    #[test]
    fn rejects_unsupported_inputs() {
        let mut b = IncompressibleBackend::new(Solution::MPG, 0.3).unwrap();
        let err = b
            .update(StateInput::DmolarT {
                rhomolar: mol_per_m3(40_000.0),
                t: k(300.0),
            })
            .unwrap_err();
        assert!(err.is_not_implemented());

        let err = b
            .update(StateInput::PT {
                p: pa(1e5),
                t: k(200.0),
            })
            .unwrap_err();
        assert!(matches!(err, FluidError::OutOfRange { .. }));

        assert!(b.set_mass_fractions(&[0.9]).is_err());
        assert!(b.set_mass_fractions(&[0.2, 0.8]).is_err());
        assert!(b.set_mole_fractions(&[0.5]).unwrap_err().is_not_implemented());
        assert!(b.speed_sound().unwrap_err().is_not_implemented());
    }
}
