//! `HEOS`: reduced Helmholtz-energy backend.
//!
//! The ideal part is a constant-cp ideal gas and the residual part is the
//! Peng–Robinson equation of state, both written in τ = T_r/T and δ = ρ/ρ_r
//! with van der Waals one-fluid mixing. Every derivative is analytic, which
//! is what the generic derivative engine consumes.

use crate::backend::FluidBackend;
use crate::composition::{mass_to_mole, mixture_molar_mass};
use crate::error::{FluidError, FluidResult};
use crate::params::StateInput;
use crate::phase::Phase;
use crate::record::{AlphaDeriv, AlphaLimit, SimpleState, StateCore};
use crate::species::{Environmental, P_MAX, Species, T_MAX};
use std::f64::consts::SQRT_2;
use tp_core::units::constants::R_UNIVERSAL;
use tracing::debug;

const OMEGA_A: f64 = 0.457_24;
const OMEGA_B: f64 = 0.077_80;
const MAX_NEWTON: usize = 100;

/// Mixture parameters fixed by the composition.
#[derive(Debug, Clone)]
struct Mixture {
    x: Vec<f64>,
    /// Reducing temperature [K]
    tr: f64,
    /// Reducing molar density [mol/m³]
    rhor: f64,
    /// Co-volume [m³/mol]
    b: f64,
    /// Per-component co-volume [m³/mol]
    b_i: Vec<f64>,
    /// √a_c per component
    sqrt_ac: Vec<f64>,
    /// Soave slope per component
    m: Vec<f64>,
    /// √(T_r / T_c,i) per component
    r: Vec<f64>,
    /// Ideal-gas cv/R of the mixture
    c0: f64,
    /// Constant of the ideal part
    a1: f64,
}

impl Mixture {
    fn new(components: &[Species], x: &[f64]) -> Self {
        let consts: Vec<_> = components.iter().map(Species::constants).collect();
        let tr: f64 = x.iter().zip(&consts).map(|(x, c)| x * c.t_critical).sum();
        let rhor = 1.0
            / x.iter()
                .zip(&consts)
                .map(|(x, c)| x / c.rhomolar_critical)
                .sum::<f64>();
        let b_i: Vec<f64> = consts
            .iter()
            .map(|c| OMEGA_B * R_UNIVERSAL * c.t_critical / c.p_critical)
            .collect();
        let b = x.iter().zip(&b_i).map(|(x, b)| x * b).sum();
        let sqrt_ac = consts
            .iter()
            .map(|c| (OMEGA_A * (R_UNIVERSAL * c.t_critical).powi(2) / c.p_critical).sqrt())
            .collect();
        let m = consts
            .iter()
            .map(|c| 0.374_64 + 1.542_26 * c.acentric - 0.269_92 * c.acentric.powi(2))
            .collect();
        let r = consts.iter().map(|c| (tr / c.t_critical).sqrt()).collect();

        let c0 = x
            .iter()
            .zip(&consts)
            .map(|(x, c)| x * (c.cp0_over_r - 1.0))
            .sum();
        let a1 = x
            .iter()
            .zip(&consts)
            .filter(|(x, _)| **x > 0.0)
            .map(|(x, c)| {
                let ci = c.cp0_over_r - 1.0;
                x * (x.ln() + (rhor / c.rhomolar_critical).ln() + ci * (c.t_critical / tr).ln())
            })
            .sum();

        Self {
            x: x.to_vec(),
            tr,
            rhor,
            b,
            b_i,
            sqrt_ac,
            m,
            r,
            c0,
            a1,
        }
    }

    /// B = b ρ_r, so that bρ = Bδ.
    fn big_b(&self) -> f64 {
        self.b * self.rhor
    }

    /// S(τ) = Σ x_i √a_c,i [1 + m_i (1 − r_i τ^-½)] and its first three τ-derivatives.
    fn s_terms(&self, tau: f64) -> [f64; 4] {
        let mut s = [0.0; 4];
        for i in 0..self.x.len() {
            let w = self.x[i] * self.sqrt_ac[i];
            let mr = self.m[i] * self.r[i];
            s[0] += w * (1.0 + self.m[i] - mr * tau.powf(-0.5));
            s[1] += w * 0.5 * mr * tau.powf(-1.5);
            s[2] += w * -0.75 * mr * tau.powf(-2.5);
            s[3] += w * 1.875 * mr * tau.powf(-3.5);
        }
        s
    }

    /// ψ = a / (b R T) = C τ S² and its first three τ-derivatives.
    fn psi_terms(&self, tau: f64) -> [f64; 4] {
        let c = 1.0 / (self.b * R_UNIVERSAL * self.tr);
        let [s, s1, s2, s3] = self.s_terms(tau);
        [
            c * tau * s * s,
            c * (s * s + 2.0 * tau * s * s1),
            c * (4.0 * s * s1 + 2.0 * tau * (s1 * s1 + s * s2)),
            c * (6.0 * (s1 * s1 + s * s2) + 2.0 * tau * (3.0 * s1 * s2 + s * s3)),
        ]
    }

    /// The attractive δ-function L(δ) and its first three derivatives.
    fn l_terms(&self, delta: f64) -> [f64; 4] {
        let bb = self.big_b();
        let bd = bb * delta;
        let l = ((1.0 + (1.0 + SQRT_2) * bd) / (1.0 + (1.0 - SQRT_2) * bd)).ln() / (2.0 * SQRT_2);
        let w = 1.0 + 2.0 * bd - bd * bd;
        let w1 = 2.0 * bb * (1.0 - bd);
        let w2 = -2.0 * bb * bb;
        [
            l,
            bb / w,
            -bb * w1 / (w * w),
            -bb * (w2 * w - 2.0 * w1 * w1) / (w * w * w),
        ]
    }

    fn alphar(&self, tau: f64, delta: f64, which: AlphaDeriv) -> f64 {
        let bb = self.big_b();
        let free = 1.0 - bb * delta;
        let (nt, nd) = which.orders();
        let psi = self.psi_terms(tau)[nt as usize];
        let l = self.l_terms(delta)[nd as usize];
        let repulsive = match (nt, nd) {
            (0, 0) => -free.ln(),
            (0, 1) => bb / free,
            (0, 2) => (bb / free).powi(2),
            (0, 3) => 2.0 * (bb / free).powi(3),
            _ => 0.0,
        };
        repulsive - psi * l
    }

    fn alpha0(&self, tau: f64, delta: f64, which: AlphaDeriv) -> f64 {
        let c0 = self.c0;
        match which {
            AlphaDeriv::Value => delta.ln() + self.a1 + c0 * tau.ln(),
            AlphaDeriv::Delta => 1.0 / delta,
            AlphaDeriv::Delta2 => -1.0 / (delta * delta),
            AlphaDeriv::Delta3 => 2.0 / delta.powi(3),
            AlphaDeriv::Tau => c0 / tau,
            AlphaDeriv::Tau2 => -c0 / (tau * tau),
            AlphaDeriv::Tau3 => 2.0 * c0 / tau.powi(3),
            AlphaDeriv::DeltaTau | AlphaDeriv::Delta2Tau | AlphaDeriv::DeltaTau2 => 0.0,
        }
    }

    /// Pressure and (∂p/∂δ)_τ at a trial point.
    fn pressure(&self, t: f64, tau: f64, delta: f64) -> (f64, f64) {
        let ar_d = self.alphar(tau, delta, AlphaDeriv::Delta);
        let ar_dd = self.alphar(tau, delta, AlphaDeriv::Delta2);
        let rt = R_UNIVERSAL * t;
        let p = self.rhor * delta * rt * (1.0 + delta * ar_d);
        let dp = self.rhor * rt * (1.0 + 2.0 * delta * ar_d + delta * delta * ar_dd);
        (p, dp)
    }

    /// Molar Gibbs energy over RT at a trial point.
    fn gibbs_rt(&self, tau: f64, delta: f64) -> f64 {
        1.0 + self.alpha0(tau, delta, AlphaDeriv::Value)
            + self.alphar(tau, delta, AlphaDeriv::Value)
            + delta * self.alphar(tau, delta, AlphaDeriv::Delta)
    }

    /// Molar enthalpy and entropy at a trial point.
    fn h_s(&self, t: f64, tau: f64, delta: f64) -> (f64, f64) {
        let a_t =
            self.alpha0(tau, delta, AlphaDeriv::Tau) + self.alphar(tau, delta, AlphaDeriv::Tau);
        let a = self.alpha0(tau, delta, AlphaDeriv::Value)
            + self.alphar(tau, delta, AlphaDeriv::Value);
        let ar_d = self.alphar(tau, delta, AlphaDeriv::Delta);
        let h = R_UNIVERSAL * t * (1.0 + tau * a_t + delta * ar_d);
        let s = R_UNIVERSAL * (tau * a_t - a);
        (h, s)
    }

    /// Newton iteration on δ at fixed T, from one starting guess.
    fn solve_delta(&self, t: f64, p_target: f64, start: f64) -> Option<f64> {
        let tau = self.tr / t;
        let limit = 1.0 / self.big_b();
        let mut delta = start;
        for _ in 0..MAX_NEWTON {
            let (p, dp) = self.pressure(t, tau, delta);
            if !dp.is_finite() || dp <= 0.0 {
                return None;
            }
            if ((p - p_target) / p_target).abs() < 1e-11 {
                return Some(delta);
            }
            let mut next = delta - (p - p_target) / dp;
            if next <= 0.0 {
                next = 0.5 * delta;
            } else if next >= limit {
                next = 0.5 * (delta + limit);
            }
            delta = next;
        }
        None
    }
}

/// Reduced Helmholtz backend over the built-in pure-fluid library.
#[derive(Debug, Clone)]
pub struct HelmholtzBackend {
    core: StateCore,
    components: Vec<Species>,
    mixture: Option<Mixture>,
}

impl HelmholtzBackend {
    /// A backend for the given components. A pure fluid is ready to update;
    /// a mixture needs its mole fractions first.
    pub fn new(components: Vec<Species>) -> FluidResult<Self> {
        if components.is_empty() {
            return Err(FluidError::InvalidArg {
                what: "no components",
            });
        }
        let mut core = StateCore::new();
        core.record.gas_constant = Some(R_UNIVERSAL);
        let mut backend = Self {
            core,
            components,
            mixture: None,
        };
        if backend.components.len() == 1 {
            backend.set_mole_fractions(&[1.0])?;
        }
        Ok(backend)
    }

    pub fn components(&self) -> &[Species] {
        &self.components
    }

    fn mixture(&self) -> FluidResult<&Mixture> {
        self.mixture.as_ref().ok_or(FluidError::InvalidArg {
            what: "mole fractions have not been set",
        })
    }

    fn molar_masses(&self) -> Vec<f64> {
        self.components.iter().map(Species::molar_mass).collect()
    }

    /// (τ, δ) of the current state.
    fn reduced(&self) -> FluidResult<(&Mixture, f64, f64)> {
        let mix = self.mixture()?;
        let rec = &self.core.record;
        Ok((mix, mix.tr / rec.t, rec.rhomolar / mix.rhor))
    }

    fn is_pure(&self) -> bool {
        self.components.len() == 1
    }

    fn environmental(&self) -> FluidResult<Environmental> {
        match self.components.as_slice() {
            [pure] => pure.environmental().ok_or(FluidError::NotSupported {
                what: "no environmental data for this fluid",
            }),
            _ => Err(FluidError::NotSupported {
                what: "environmental data of a mixture",
            }),
        }
    }
}

impl FluidBackend for HelmholtzBackend {
    fn core(&self) -> &StateCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    fn backend_name(&self) -> &str {
        "HEOS"
    }

    fn fluid_names(&self) -> Vec<String> {
        self.components.iter().map(|s| s.key().to_string()).collect()
    }

    fn using_mole_fractions(&self) -> bool {
        true
    }

    fn using_mass_fractions(&self) -> bool {
        false
    }

    /// Mass fractions are accepted and converted to mole fractions.
    fn set_mass_fractions(&mut self, fractions: &[f64]) -> FluidResult<()> {
        let mole = mass_to_mole(fractions, &self.molar_masses())?;
        self.apply_fractions(&mole)
    }

    fn calc_set_fractions(&mut self, fractions: &[f64]) -> FluidResult<()> {
        if fractions.len() != self.components.len() {
            return Err(FluidError::InvalidArg {
                what: "fraction count does not match component count",
            });
        }
        let mix = Mixture::new(&self.components, fractions);
        let p_crit: f64 = self
            .components
            .iter()
            .zip(fractions)
            .map(|(s, x)| x * s.constants().p_critical)
            .sum();
        let snapshot = SimpleState::new(mix.tr, p_crit, mix.rhor);
        let rec = &mut self.core.record;
        rec.fractions = fractions.to_vec();
        rec.critical = snapshot;
        rec.reducing = snapshot;
        self.mixture = Some(mix);
        Ok(())
    }

    fn calc_update(&mut self, input: StateInput) -> FluidResult<()> {
        let mix = self.mixture()?;
        let (t, rhomolar, p) = match input {
            StateInput::DmolarT { rhomolar, t } => {
                let rho = rhomolar.value;
                if rho * mix.b >= 1.0 {
                    return Err(FluidError::NonPhysical {
                        what: "density above the co-volume limit",
                    });
                }
                // resolved through calc_pressure
                (t.value, rho, f64::NAN)
            }
            StateInput::PT { p, t } => {
                let (p, t) = (p.value, t.value);
                let tau = mix.tr / t;
                let gas_start = p / (R_UNIVERSAL * t * mix.rhor);
                let liquid_start = 0.95 / mix.big_b();
                let gas_start = gas_start.min(0.5 * liquid_start);
                let roots: Vec<f64> = [gas_start, liquid_start]
                    .into_iter()
                    .filter_map(|start| mix.solve_delta(t, p, start))
                    .collect();
                let delta = roots
                    .into_iter()
                    .min_by(|a, b| mix.gibbs_rt(tau, *a).total_cmp(&mix.gibbs_rt(tau, *b)))
                    .ok_or(FluidError::ConvergenceFailed {
                        what: "density from pressure and temperature",
                    })?;
                debug!(t, p, delta, "HEOS density root");
                (t, delta * mix.rhor, mix.pressure(t, tau, delta).0)
            }
            StateInput::DmassT { .. } => {
                return Err(FluidError::InvalidArg {
                    what: "mass density input reached the backend",
                });
            }
        };
        let rec = &mut self.core.record;
        rec.t = t;
        rec.rhomolar = rhomolar;
        rec.p = p;
        rec.q = None;
        Ok(())
    }

    fn calc_molar_mass(&mut self) -> FluidResult<f64> {
        Ok(mixture_molar_mass(&self.mixture()?.x, &self.molar_masses()))
    }

    fn calc_pressure(&mut self) -> FluidResult<f64> {
        let (mix, tau, delta) = self.reduced()?;
        Ok(mix.pressure(self.core.record.t, tau, delta).0)
    }

    fn calc_alpha0(&mut self, which: AlphaDeriv) -> FluidResult<f64> {
        let (mix, tau, delta) = self.reduced()?;
        Ok(mix.alpha0(tau, delta, which))
    }

    fn calc_alphar(&mut self, which: AlphaDeriv) -> FluidResult<f64> {
        let (mix, tau, delta) = self.reduced()?;
        Ok(mix.alphar(tau, delta, which))
    }

    /// Evaluated at δ = 0, where every term is analytic.
    fn calc_alphar_lim(&mut self, which: AlphaLimit) -> FluidResult<f64> {
        let (mix, tau, _) = self.reduced()?;
        Ok(mix.alphar(tau, 0.0, which.deriv()))
    }

    fn calc_hmolar(&mut self) -> FluidResult<f64> {
        let (tau, delta) = (self.tau()?, self.delta()?);
        let a_t = self.alpha0(AlphaDeriv::Tau)? + self.alphar(AlphaDeriv::Tau)?;
        let ar_d = self.alphar(AlphaDeriv::Delta)?;
        Ok(self.gas_constant()? * self.t() * (1.0 + tau * a_t + delta * ar_d))
    }

    fn calc_smolar(&mut self) -> FluidResult<f64> {
        let tau = self.tau()?;
        let a_t = self.alpha0(AlphaDeriv::Tau)? + self.alphar(AlphaDeriv::Tau)?;
        let a = self.alpha0(AlphaDeriv::Value)? + self.alphar(AlphaDeriv::Value)?;
        Ok(self.gas_constant()? * (tau * a_t - a))
    }

    fn calc_umolar(&mut self) -> FluidResult<f64> {
        let tau = self.tau()?;
        let a_t = self.alpha0(AlphaDeriv::Tau)? + self.alphar(AlphaDeriv::Tau)?;
        Ok(self.gas_constant()? * self.t() * tau * a_t)
    }

    fn calc_gibbsmolar(&mut self) -> FluidResult<f64> {
        let delta = self.delta()?;
        let a = self.alpha0(AlphaDeriv::Value)? + self.alphar(AlphaDeriv::Value)?;
        let ar_d = self.alphar(AlphaDeriv::Delta)?;
        Ok(self.gas_constant()? * self.t() * (1.0 + a + delta * ar_d))
    }

    fn calc_cvmolar(&mut self) -> FluidResult<f64> {
        let tau = self.tau()?;
        let a_tt = self.alpha0(AlphaDeriv::Tau2)? + self.alphar(AlphaDeriv::Tau2)?;
        Ok(-self.gas_constant()? * tau * tau * a_tt)
    }

    fn calc_cpmolar(&mut self) -> FluidResult<f64> {
        let (tau, delta) = (self.tau()?, self.delta()?);
        let ar_d = self.alphar(AlphaDeriv::Delta)?;
        let ar_dd = self.alphar(AlphaDeriv::Delta2)?;
        let ar_dt = self.alphar(AlphaDeriv::DeltaTau)?;
        let num = (1.0 + delta * ar_d - delta * tau * ar_dt).powi(2);
        let den = 1.0 + 2.0 * delta * ar_d + delta * delta * ar_dd;
        Ok(self.cvmolar()? + self.gas_constant()? * num / den)
    }

    fn calc_speed_sound(&mut self) -> FluidResult<f64> {
        let (tau, delta) = (self.tau()?, self.delta()?);
        let ar_d = self.alphar(AlphaDeriv::Delta)?;
        let ar_dd = self.alphar(AlphaDeriv::Delta2)?;
        let ar_dt = self.alphar(AlphaDeriv::DeltaTau)?;
        let a_tt = self.alpha0(AlphaDeriv::Tau2)? + self.alphar(AlphaDeriv::Tau2)?;
        let num = (1.0 + delta * ar_d - delta * tau * ar_dt).powi(2);
        let w2_ratio = 1.0 + 2.0 * delta * ar_d + delta * delta * ar_dd - num / (tau * tau * a_tt);
        let w2 = w2_ratio * self.gas_constant()? * self.t() / self.molar_mass()?;
        if w2 <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "mechanically unstable state",
            });
        }
        Ok(w2.sqrt())
    }

    fn calc_isothermal_compressibility(&mut self) -> FluidResult<f64> {
        let delta = self.delta()?;
        let ar_d = self.alphar(AlphaDeriv::Delta)?;
        let ar_dd = self.alphar(AlphaDeriv::Delta2)?;
        let dp_drho =
            self.gas_constant()? * self.t() * (1.0 + 2.0 * delta * ar_d + delta * delta * ar_dd);
        Ok(1.0 / (self.rhomolar() * dp_drho))
    }

    fn calc_isobaric_expansion_coefficient(&mut self) -> FluidResult<f64> {
        let (tau, delta) = (self.tau()?, self.delta()?);
        let ar_d = self.alphar(AlphaDeriv::Delta)?;
        let ar_dd = self.alphar(AlphaDeriv::Delta2)?;
        let ar_dt = self.alphar(AlphaDeriv::DeltaTau)?;
        let dp_dt = 1.0 + delta * ar_d - delta * tau * ar_dt;
        let dp_drho = 1.0 + 2.0 * delta * ar_d + delta * delta * ar_dd;
        Ok(dp_dt / (self.t() * dp_drho))
    }

    fn calc_fugacity_coefficient(&mut self, component: usize) -> FluidResult<f64> {
        let (mix, tau, _) = self.reduced()?;
        let rec = &self.core.record;
        let rt = R_UNIVERSAL * rec.t;
        let z = rec.p / (rec.rhomolar * rt);
        let s = mix.s_terms(tau)[0];
        let a = s * s;
        let big_a = a * rec.p / (rt * rt);
        let big_b = mix.b * rec.p / rt;
        let bi_b = mix.b_i[component] / mix.b;
        let ai_a = 2.0 * mix.sqrt_ac[component] * mix.s_i(component, tau) / s;
        let ln_phi = bi_b * (z - 1.0)
            - (z - big_b).ln()
            - big_a / (2.0 * SQRT_2 * big_b)
                * (ai_a - bi_b)
                * ((z + (1.0 + SQRT_2) * big_b) / (z + (1.0 - SQRT_2) * big_b)).ln();
        Ok(ln_phi.exp())
    }

    fn calc_bvirial(&mut self) -> FluidResult<f64> {
        let (mix, tau, _) = self.reduced()?;
        Ok(mix.b * (1.0 - mix.psi_terms(tau)[0]))
    }

    fn calc_cvirial(&mut self) -> FluidResult<f64> {
        let (mix, tau, _) = self.reduced()?;
        Ok(mix.b * mix.b * (1.0 + 2.0 * mix.psi_terms(tau)[0]))
    }

    fn calc_dbvirial_dt(&mut self) -> FluidResult<f64> {
        let (mix, tau, _) = self.reduced()?;
        let t = self.core.record.t;
        Ok(mix.b * mix.psi_terms(tau)[1] * tau / t)
    }

    fn calc_dcvirial_dt(&mut self) -> FluidResult<f64> {
        let (mix, tau, _) = self.reduced()?;
        let t = self.core.record.t;
        Ok(-2.0 * mix.b * mix.b * mix.psi_terms(tau)[1] * tau / t)
    }

    fn calc_phase(&mut self) -> FluidResult<Phase> {
        let rec = &self.core.record;
        Ok(Phase::classify_single_phase(
            rec.t,
            rec.p,
            rec.rhomolar,
            &rec.critical,
        ))
    }

    fn calc_state(&mut self, key: &str) -> FluidResult<SimpleState> {
        let mix = self.mixture()?;
        let rec = &self.core.record;
        match key {
            "critical" | "crit" => Ok(rec.critical),
            "reducing" => Ok(rec.reducing),
            "hs_anchor" => {
                let t = 1.1 * rec.critical.t;
                let rho = 0.9 * rec.critical.rhomolar;
                let (tau, delta) = (mix.tr / t, rho / mix.rhor);
                let (h, s) = mix.h_s(t, tau, delta);
                let mut anchor = SimpleState::new(t, mix.pressure(t, tau, delta).0, rho);
                anchor.hmolar = Some(h);
                anchor.smolar = Some(s);
                Ok(anchor)
            }
            _ => Err(FluidError::InvalidArg {
                what: "unknown state snapshot key",
            }),
        }
    }

    fn calc_t_critical(&mut self) -> FluidResult<f64> {
        Ok(self.core.record.critical.t)
    }

    fn calc_p_critical(&mut self) -> FluidResult<f64> {
        Ok(self.core.record.critical.p)
    }

    fn calc_rhomolar_critical(&mut self) -> FluidResult<f64> {
        Ok(self.core.record.critical.rhomolar)
    }

    fn calc_t_triple(&mut self) -> FluidResult<f64> {
        Ok(self
            .components
            .iter()
            .map(|s| s.constants().t_triple)
            .fold(f64::MIN, f64::max))
    }

    fn calc_p_triple(&mut self) -> FluidResult<f64> {
        if !self.is_pure() {
            return Err(FluidError::NotSupported {
                what: "triple-point pressure of a mixture",
            });
        }
        Ok(self.components[0].constants().p_triple)
    }

    fn calc_tmin(&mut self) -> FluidResult<f64> {
        self.calc_t_triple()
    }

    fn calc_tmax(&mut self) -> FluidResult<f64> {
        Ok(T_MAX)
    }

    fn calc_pmax(&mut self) -> FluidResult<f64> {
        Ok(P_MAX)
    }

    fn calc_gwp20(&mut self) -> FluidResult<f64> {
        Ok(self.environmental()?.gwp20)
    }

    fn calc_gwp100(&mut self) -> FluidResult<f64> {
        Ok(self.environmental()?.gwp100)
    }

    fn calc_gwp500(&mut self) -> FluidResult<f64> {
        Ok(self.environmental()?.gwp500)
    }

    fn calc_odp(&mut self) -> FluidResult<f64> {
        Ok(self.environmental()?.odp)
    }
}

impl Mixture {
    fn s_i(&self, i: usize, tau: f64) -> f64 {
        1.0 + self.m[i] - self.m[i] * self.r[i] * tau.powf(-0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Parameter;
    use tp_core::numeric::{Tolerances, nearly_equal};
    use tp_core::units::{k, mol_per_m3, pa};

    fn water() -> HelmholtzBackend {
        HelmholtzBackend::new(vec![Species::H2O]).unwrap()
    }

    fn pt(p: f64, t: f64) -> StateInput {
        StateInput::PT { p: pa(p), t: k(t) }
    }

    #[test]
    fn dilute_gas_is_nearly_ideal() {
        let mut n2 = HelmholtzBackend::new(vec![Species::N2]).unwrap();
        n2.update(pt(1e5, 300.0)).unwrap();
        let z = n2.compressibility_factor().unwrap();
        assert!((z - 1.0).abs() < 2e-3, "Z = {z}");
        assert!(nearly_equal(
            n2.cpmolar().unwrap() - n2.cvmolar().unwrap(),
            R_UNIVERSAL,
            Tolerances::relative(1e-2)
        ));
    }

    #[test]
    fn pressure_round_trips_through_density() {
        let mut w = water();
        w.update(pt(1e5, 300.0)).unwrap();
        assert!(nearly_equal(w.p(), 1e5, Tolerances::relative(1e-9)));
        let rho = w.rhomolar();

        w.update(StateInput::DmolarT {
            rhomolar: mol_per_m3(rho),
            t: k(300.0),
        })
        .unwrap();
        assert!(nearly_equal(w.p(), 1e5, Tolerances::relative(1e-6)));
        assert!(nearly_equal(
            w.calc_pressure().unwrap(),
            w.p(),
            Tolerances::relative(1e-12)
        ));
    }

    #[test]
    fn cold_water_is_liquid() {
        let mut w = water();
        w.update(pt(1e5, 300.0)).unwrap();
        let rhomass = w.rhomass().unwrap();
        assert!((600.0..1300.0).contains(&rhomass), "rho = {rhomass}");
        assert_eq!(w.phase().unwrap(), Phase::Liquid);
    }

    #[test]
    fn hot_steam_is_supercritical_gas() {
        let mut w = water();
        w.update(pt(1e5, 700.0)).unwrap();
        assert_eq!(w.phase().unwrap(), Phase::SupercriticalGas);
        assert!(w.rhomass().unwrap() < 1.0);
    }

    #[test]
    fn thermodynamic_identities() {
        let mut w = water();
        w.update(pt(5e6, 500.0)).unwrap();
        let h = w.hmolar().unwrap();
        let u = w.umolar().unwrap();
        let s = w.smolar().unwrap();
        let g = w.gibbsmolar().unwrap();
        let tol = Tolerances::relative(1e-9);
        assert!(nearly_equal(h, u + w.p() / w.rhomolar(), tol));
        assert!(nearly_equal(g, h - w.t() * s, Tolerances { abs: 1e-6, rel: 1e-9 }));
        assert!(w.cpmolar().unwrap() > w.cvmolar().unwrap());
        assert!(w.speed_sound().unwrap() > 0.0);
    }

    #[test]
    fn compressibility_matches_derivative_engine() {
        let mut w = water();
        w.update(pt(2e6, 450.0)).unwrap();
        let kappa = w.isothermal_compressibility().unwrap();
        let dp_drho = w
            .first_partial_deriv(Parameter::P, Parameter::Dmolar, Parameter::T)
            .unwrap();
        assert!(nearly_equal(
            kappa,
            1.0 / (w.rhomolar() * dp_drho),
            Tolerances::relative(1e-8)
        ));
    }

    #[test]
    fn pure_fugacity_coefficient_of_dilute_gas() {
        let mut n2 = HelmholtzBackend::new(vec![Species::N2]).unwrap();
        n2.update(pt(1e5, 300.0)).unwrap();
        let phi = n2.fugacity_coefficient(0).unwrap();
        assert!((phi - 1.0).abs() < 5e-3);
        // ln φ ≈ B p / RT at low pressure.
        let b = n2.bvirial().unwrap();
        let expected = (b * 1e5 / (R_UNIVERSAL * 300.0)).exp();
        assert!(nearly_equal(phi, expected, Tolerances::relative(1e-4)));
        assert!(n2.fugacity_coefficient(1).is_err());
    }

    #[test]
    fn mixture_requires_fractions() {
        let mut air = HelmholtzBackend::new(vec![Species::N2, Species::O2]).unwrap();
        assert!(air.update(pt(1e5, 300.0)).is_err());
        air.set_mole_fractions(&[0.79, 0.21]).unwrap();
        air.update(pt(1e5, 300.0)).unwrap();
        let mm = air.molar_mass().unwrap();
        assert!(nearly_equal(mm, 0.028_85, Tolerances { abs: 1e-5, rel: 0.0 }));
        assert!(air.p_triple().is_err());
        assert_eq!(air.name(), "Nitrogen&Oxygen");
    }

    #[test]
    fn mass_fractions_convert_to_mole_fractions() {
        let mut mix = HelmholtzBackend::new(vec![Species::H2, Species::N2]).unwrap();
        mix.set_mass_fractions(&[0.5, 0.5]).unwrap();
        let x = mix.fractions();
        assert!(x[0] > 0.9);
    }

    #[test]
    fn snapshots() {
        let mut w = water();
        let crit = w.get_state("critical").unwrap();
        assert!(nearly_equal(crit.t, 647.096, Tolerances::relative(1e-12)));
        assert_eq!(w.get_reducing_state().unwrap(), crit);
        let anchor = w.get_state("hs_anchor").unwrap();
        assert!(anchor.hmolar.is_some() && anchor.smolar.is_some());
        assert!(anchor.t > crit.t);
        assert!(w.get_state("nowhere").is_err());
    }

    #[test]
    fn zero_density_limits_carry_the_virials() {
        let mut w = water();
        w.update(pt(1e3, 600.0)).unwrap();
        let rhor = w.get_reducing_state().unwrap().rhomolar;
        let tol = Tolerances::relative(1e-12);
        assert!(nearly_equal(
            w.alphar_lim(AlphaLimit::Delta).unwrap(),
            w.bvirial().unwrap() * rhor,
            tol
        ));
        assert!(nearly_equal(
            w.alphar_lim(AlphaLimit::Delta2).unwrap(),
            w.cvirial().unwrap() * rhor * rhor,
            tol
        ));
        // dB/dT = -(τ/T) lim ∂²αʳ/∂δ∂τ / ρ_r
        let (tau, t) = (w.tau().unwrap(), w.t());
        assert!(nearly_equal(
            -tau / t * w.alphar_lim(AlphaLimit::DeltaTau).unwrap() / rhor,
            w.dbvirial_dt().unwrap(),
            Tolerances::relative(1e-10)
        ));
        assert!(nearly_equal(
            -tau / t * w.alphar_lim(AlphaLimit::Delta2Tau).unwrap() / (rhor * rhor),
            w.dcvirial_dt().unwrap(),
            Tolerances::relative(1e-10)
        ));
        assert!(w.core().cache.helmholtz.residual_limit.dalphar_ddelta.is_set());
    }

    #[test]
    fn density_input_resolves_pressure_from_the_model() {
        let mut w = water();
        w.update(StateInput::DmolarT {
            rhomolar: mol_per_m3(20.0),
            t: k(600.0),
        })
        .unwrap();
        let (tau, delta) = (w.tau().unwrap(), w.delta().unwrap());
        let expected = w.mixture().unwrap().pressure(600.0, tau, delta).0;
        assert_eq!(w.p(), expected);
        assert!(w.p() > 0.0);
    }

    #[test]
    fn environmental_data_for_pure_refrigerants() {
        let mut r32 = HelmholtzBackend::new(vec![Species::R32]).unwrap();
        assert_eq!(r32.gwp100().unwrap(), 675.0);
        assert_eq!(r32.keyed_output(Parameter::Odp).unwrap(), 0.0);
        assert!(matches!(
            water().gwp100(),
            Err(FluidError::NotSupported { .. })
        ));
        assert!(r32.flame_hazard().unwrap_err().is_not_implemented());

        let mut blend = HelmholtzBackend::new(vec![Species::R32, Species::R125]).unwrap();
        blend.set_mole_fractions(&[0.5, 0.5]).unwrap();
        assert!(blend.gwp100().is_err());
    }

    #[test]
    fn virial_derivative_by_finite_difference() {
        let mut w = water();
        let dt = 1e-3;
        let mut b_at = |t: f64| {
            w.update(pt(1e3, t)).unwrap();
            w.bvirial().unwrap()
        };
        let fd = (b_at(600.0 + dt) - b_at(600.0 - dt)) / (2.0 * dt);
        w.update(pt(1e3, 600.0)).unwrap();
        assert!(nearly_equal(
            w.dbvirial_dt().unwrap(),
            fd,
            Tolerances::relative(1e-5)
        ));
    }
}
