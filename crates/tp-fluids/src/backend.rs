//! The capability contract every backend implements.
//!
//! A backend embeds a [`StateCore`] and overrides the `calc_*` hooks it can
//! evaluate. The provided accessors memoize hook results in the core's
//! [`PropertyCache`](crate::record::PropertyCache); a hook that is not
//! overridden reports [`FluidError::NotImplemented`] and leaves its cell unset.

use crate::composition::normalize_fractions;
use crate::derivatives;
use crate::error::{FluidError, FluidResult};
use crate::params::{Parameter, StateInput};
use crate::phase::{Phase, PhaseForcing};
use crate::record::{AlphaDeriv, AlphaLimit, SimpleState, StateCore};
use tp_core::units::mol_per_m3;
use tracing::{debug, trace};

/// The error an unoverridden hook returns.
pub fn not_implemented(backend: &str, hook: &'static str) -> FluidError {
    debug!(backend, hook, "capability not implemented");
    FluidError::NotImplemented {
        hook,
        backend: backend.to_string(),
    }
}

/// Read a cell, or run the hook and store its result.
///
/// A failing hook returns early through `?`, so nothing is stored.
macro_rules! cached {
    ($self:ident, $($slot:ident).+, $hook:ident) => {{
        if let Some(value) = $self.core().cache.$($slot).+.get() {
            return Ok(value);
        }
        let value = $self.$hook()?;
        $self.core_mut().cache.$($slot).+.set(value);
        Ok(value)
    }};
}

macro_rules! gap {
    ($self:ident, $hook:literal) => {
        Err(not_implemented($self.backend_name(), $hook))
    };
}

fn positive_ln(value: f64, what: &'static str) -> FluidResult<f64> {
    if value > 0.0 {
        Ok(value.ln())
    } else {
        Err(FluidError::NonPhysical { what })
    }
}

/// A thermophysical state object backed by some calculation engine.
///
/// The object is a mutable cursor: [`update`](FluidBackend::update) moves it
/// to a new state and forgets everything derived from the old one.
pub trait FluidBackend: Send {
    // ---- identity and storage -------------------------------------------

    fn core(&self) -> &StateCore;
    fn core_mut(&mut self) -> &mut StateCore;

    /// Backend token as accepted by the factory, e.g. `"HEOS"`.
    fn backend_name(&self) -> &str;

    /// Component names in composition order.
    fn fluid_names(&self) -> Vec<String>;

    fn using_mole_fractions(&self) -> bool;
    fn using_mass_fractions(&self) -> bool;
    fn using_volu_fractions(&self) -> bool {
        false
    }

    // ---- state-setting hooks ----------------------------------------------

    /// Move to the given state. Receives validated input, never `DmassT`.
    ///
    /// Must write `t`, `rhomolar` and `p` of the record. A backend may leave
    /// `p` as NaN; [`update`](FluidBackend::update) then fills it from
    /// [`calc_pressure`](FluidBackend::calc_pressure).
    fn calc_update(&mut self, input: StateInput) -> FluidResult<()>;

    /// Store normalized fractions in the backend's native basis.
    fn calc_set_fractions(&mut self, fractions: &[f64]) -> FluidResult<()> {
        if fractions.len() != self.fluid_names().len() {
            return Err(FluidError::InvalidArg {
                what: "fraction count does not match component count",
            });
        }
        self.core_mut().record.fractions = fractions.to_vec();
        Ok(())
    }

    // ---- property hooks -----------------------------------------------------

    fn calc_molar_mass(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_molar_mass")
    }
    fn calc_gas_constant(&mut self) -> FluidResult<f64> {
        match self.core().record.gas_constant {
            Some(r) => Ok(r),
            None => gap!(self, "calc_gas_constant"),
        }
    }
    /// Pressure at the current temperature and density.
    fn calc_pressure(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_pressure")
    }
    fn calc_hmolar(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_hmolar")
    }
    fn calc_smolar(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_smolar")
    }
    fn calc_umolar(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_umolar")
    }
    fn calc_cpmolar(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_cpmolar")
    }
    fn calc_cvmolar(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_cvmolar")
    }
    fn calc_gibbsmolar(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_gibbsmolar")
    }
    fn calc_speed_sound(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_speed_sound")
    }
    fn calc_isothermal_compressibility(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_isothermal_compressibility")
    }
    fn calc_isobaric_expansion_coefficient(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_isobaric_expansion_coefficient")
    }
    fn calc_viscosity(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_viscosity")
    }
    fn calc_conductivity(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_conductivity")
    }
    fn calc_surface_tension(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_surface_tension")
    }
    fn calc_fugacity_coefficient(&mut self, _component: usize) -> FluidResult<f64> {
        gap!(self, "calc_fugacity_coefficient")
    }
    fn calc_alpha0(&mut self, _which: AlphaDeriv) -> FluidResult<f64> {
        gap!(self, "calc_alpha0")
    }
    fn calc_alphar(&mut self, _which: AlphaDeriv) -> FluidResult<f64> {
        gap!(self, "calc_alphar")
    }
    fn calc_bvirial(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_bvirial")
    }
    fn calc_cvirial(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_cvirial")
    }
    fn calc_dbvirial_dt(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_dbvirial_dt")
    }
    fn calc_dcvirial_dt(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_dcvirial_dt")
    }
    fn calc_saturated_liquid_rhomolar(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_saturated_liquid_rhomolar")
    }
    fn calc_saturated_vapor_rhomolar(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_saturated_vapor_rhomolar")
    }
    /// Smoothed two-phase density used near the saturation boundary.
    fn calc_rho_spline(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_rho_spline")
    }
    fn calc_drho_spline_dp(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_drho_spline_dp")
    }
    fn calc_drho_spline_dh(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_drho_spline_dh")
    }
    fn calc_alphar_lim(&mut self, _which: AlphaLimit) -> FluidResult<f64> {
        gap!(self, "calc_alphar_lim")
    }

    /// τ = T_r / T from the reducing snapshot.
    fn calc_tau(&mut self) -> FluidResult<f64> {
        let rec = &self.core().record;
        if rec.reducing.is_defined() && rec.t > 0.0 {
            Ok(rec.reducing.t / rec.t)
        } else {
            gap!(self, "calc_tau")
        }
    }

    /// δ = ρ / ρ_r from the reducing snapshot.
    fn calc_delta(&mut self) -> FluidResult<f64> {
        let rec = &self.core().record;
        if rec.reducing.is_defined() && rec.reducing.rhomolar > 0.0 {
            Ok(rec.rhomolar / rec.reducing.rhomolar)
        } else {
            gap!(self, "calc_delta")
        }
    }

    // Mass-basis defaults. Not cached: they are cheap combinations of cached cells.

    fn calc_rhomass(&mut self) -> FluidResult<f64> {
        Ok(self.rhomolar() * self.molar_mass()?)
    }
    fn calc_hmass(&mut self) -> FluidResult<f64> {
        Ok(self.hmolar()? / self.molar_mass()?)
    }
    fn calc_smass(&mut self) -> FluidResult<f64> {
        Ok(self.smolar()? / self.molar_mass()?)
    }
    fn calc_umass(&mut self) -> FluidResult<f64> {
        Ok(self.umolar()? / self.molar_mass()?)
    }
    fn calc_cpmass(&mut self) -> FluidResult<f64> {
        Ok(self.cpmolar()? / self.molar_mass()?)
    }
    fn calc_cvmass(&mut self) -> FluidResult<f64> {
        Ok(self.cvmolar()? / self.molar_mass()?)
    }

    // ---- fixed points and limits --------------------------------------------

    fn calc_t_critical(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_t_critical")
    }
    fn calc_p_critical(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_p_critical")
    }
    fn calc_rhomolar_critical(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_rhomolar_critical")
    }
    fn calc_t_triple(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_t_triple")
    }
    fn calc_p_triple(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_p_triple")
    }
    fn calc_tmin(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_tmin")
    }
    fn calc_tmax(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_tmax")
    }
    fn calc_pmax(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_pmax")
    }

    fn has_melting_line(&self) -> bool {
        false
    }

    /// Evaluate `of` on the melting line where `given` equals `value`.
    fn calc_melting_line(
        &mut self,
        _of: Parameter,
        _given: Parameter,
        _value: f64,
    ) -> FluidResult<f64> {
        gap!(self, "calc_melting_line")
    }

    // ---- environmental and safety data ------------------------------------

    fn calc_gwp20(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_gwp20")
    }
    fn calc_gwp100(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_gwp100")
    }
    fn calc_gwp500(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_gwp500")
    }
    fn calc_odp(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_odp")
    }
    /// NFPA 704 flammability rating.
    fn calc_flame_hazard(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_flame_hazard")
    }
    /// NFPA 704 health rating.
    fn calc_health_hazard(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_health_hazard")
    }
    /// NFPA 704 instability rating.
    fn calc_physical_hazard(&mut self) -> FluidResult<f64> {
        gap!(self, "calc_physical_hazard")
    }

    /// Named snapshot: `"critical"`, `"reducing"` or `"hs_anchor"`.
    fn calc_state(&mut self, key: &str) -> FluidResult<SimpleState> {
        let rec = &self.core().record;
        let snapshot = match key {
            "critical" | "crit" => rec.critical,
            "reducing" => rec.reducing,
            _ => return gap!(self, "calc_state"),
        };
        if snapshot.is_defined() {
            Ok(snapshot)
        } else {
            gap!(self, "calc_state")
        }
    }

    // ---- phase and derivatives ----------------------------------------------

    fn calc_phase(&mut self) -> FluidResult<Phase> {
        gap!(self, "calc_phase")
    }

    /// Generic first derivative over the Helmholtz terms.
    fn calc_first_partial_deriv(
        &mut self,
        of: Parameter,
        wrt: Parameter,
        constant: Parameter,
    ) -> FluidResult<f64> {
        derivatives::first_partial_deriv(self, of, wrt, constant)
    }

    /// Generic second derivative over the Helmholtz terms.
    fn calc_second_partial_deriv(
        &mut self,
        of: Parameter,
        wrt1: Parameter,
        constant1: Parameter,
        wrt2: Parameter,
        constant2: Parameter,
    ) -> FluidResult<f64> {
        derivatives::second_partial_deriv(self, of, wrt1, constant1, wrt2, constant2)
    }

    // ---- provided: state management -----------------------------------------

    /// Move to a new state.
    ///
    /// Every cached value is invalidated before the backend sees the input,
    /// so a failed update never leaves stale values behind. If the pressure
    /// cannot be resolved after the backend moved, the bulk variables are
    /// dropped as well.
    fn update(&mut self, input: StateInput) -> FluidResult<()> {
        input.validate()?;
        self.clear();
        let input = match input {
            StateInput::DmassT { rhomass, t } => {
                let mm = self.molar_mass()?;
                StateInput::DmolarT {
                    rhomolar: mol_per_m3(rhomass.value / mm),
                    t,
                }
            }
            other => other,
        };
        trace!(backend = self.backend_name(), input = input.label(), "update");
        self.calc_update(input)?;
        if self.core().record.p.is_nan() {
            match self.calc_pressure() {
                Ok(p) => self.core_mut().record.p = p,
                Err(e) => {
                    self.core_mut().record.forget_state();
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Invalidate every cached value and forget the phase.
    fn clear(&mut self) {
        self.core_mut().clear();
    }

    fn set_mole_fractions(&mut self, fractions: &[f64]) -> FluidResult<()> {
        if !self.using_mole_fractions() {
            return gap!(self, "set_mole_fractions");
        }
        self.apply_fractions(fractions)
    }

    fn set_mass_fractions(&mut self, fractions: &[f64]) -> FluidResult<()> {
        if !self.using_mass_fractions() {
            return gap!(self, "set_mass_fractions");
        }
        self.apply_fractions(fractions)
    }

    fn set_volu_fractions(&mut self, fractions: &[f64]) -> FluidResult<()> {
        if !self.using_volu_fractions() {
            return gap!(self, "set_volu_fractions");
        }
        self.apply_fractions(fractions)
    }

    /// Validate, normalize and store native-basis fractions.
    ///
    /// Every cached value is a function of composition, so this clears them.
    fn apply_fractions(&mut self, fractions: &[f64]) -> FluidResult<()> {
        let normalized = normalize_fractions(fractions)?;
        self.clear();
        self.calc_set_fractions(&normalized)
    }

    /// Fractions in the backend's native basis.
    fn fractions(&self) -> &[f64] {
        &self.core().record.fractions
    }

    fn specify_phase(&mut self, forcing: PhaseForcing) {
        self.core_mut().record.forcing = forcing;
    }

    fn unspecify_phase(&mut self) {
        self.specify_phase(PhaseForcing::Automatic);
    }

    // ---- provided: bulk variables -------------------------------------------

    fn t(&self) -> f64 {
        self.core().record.t
    }
    fn rhomolar(&self) -> f64 {
        self.core().record.rhomolar
    }
    fn p(&self) -> f64 {
        self.core().record.p
    }
    /// Vapor quality, `None` outside the two-phase region.
    fn q(&self) -> Option<f64> {
        self.core().record.q
    }

    fn tau(&mut self) -> FluidResult<f64> {
        if let Some(value) = self.core().record.tau.get() {
            return Ok(value);
        }
        let value = self.calc_tau()?;
        self.core_mut().record.tau.set(value);
        Ok(value)
    }

    fn delta(&mut self) -> FluidResult<f64> {
        if let Some(value) = self.core().record.delta.get() {
            return Ok(value);
        }
        let value = self.calc_delta()?;
        self.core_mut().record.delta.set(value);
        Ok(value)
    }

    /// ln p
    fn log_p(&mut self) -> FluidResult<f64> {
        if let Some(value) = self.core().cache.bulk.logp.get() {
            return Ok(value);
        }
        let value = positive_ln(self.p(), "logarithm of a non-positive pressure")?;
        self.core_mut().cache.bulk.logp.set(value);
        Ok(value)
    }

    /// ln ρ
    fn log_rhomolar(&mut self) -> FluidResult<f64> {
        if let Some(value) = self.core().cache.bulk.logrhomolar.get() {
            return Ok(value);
        }
        let value = positive_ln(self.rhomolar(), "logarithm of a non-positive density")?;
        self.core_mut().cache.bulk.logrhomolar.set(value);
        Ok(value)
    }

    // ---- provided: cached properties ----------------------------------------

    fn molar_mass(&mut self) -> FluidResult<f64> {
        cached!(self, bulk.molar_mass, calc_molar_mass)
    }
    fn gas_constant(&mut self) -> FluidResult<f64> {
        cached!(self, bulk.gas_constant, calc_gas_constant)
    }
    fn hmolar(&mut self) -> FluidResult<f64> {
        cached!(self, bulk.hmolar, calc_hmolar)
    }
    fn smolar(&mut self) -> FluidResult<f64> {
        cached!(self, bulk.smolar, calc_smolar)
    }
    fn umolar(&mut self) -> FluidResult<f64> {
        cached!(self, bulk.umolar, calc_umolar)
    }
    fn cpmolar(&mut self) -> FluidResult<f64> {
        cached!(self, bulk.cpmolar, calc_cpmolar)
    }
    fn cvmolar(&mut self) -> FluidResult<f64> {
        cached!(self, bulk.cvmolar, calc_cvmolar)
    }
    fn gibbsmolar(&mut self) -> FluidResult<f64> {
        cached!(self, bulk.gibbsmolar, calc_gibbsmolar)
    }
    fn speed_sound(&mut self) -> FluidResult<f64> {
        cached!(self, bulk.speed_sound, calc_speed_sound)
    }
    fn isothermal_compressibility(&mut self) -> FluidResult<f64> {
        cached!(
            self,
            bulk.isothermal_compressibility,
            calc_isothermal_compressibility
        )
    }
    fn isobaric_expansion_coefficient(&mut self) -> FluidResult<f64> {
        cached!(
            self,
            bulk.isobaric_expansion_coefficient,
            calc_isobaric_expansion_coefficient
        )
    }
    fn bvirial(&mut self) -> FluidResult<f64> {
        cached!(self, bulk.bvirial, calc_bvirial)
    }
    fn cvirial(&mut self) -> FluidResult<f64> {
        cached!(self, bulk.cvirial, calc_cvirial)
    }
    fn dbvirial_dt(&mut self) -> FluidResult<f64> {
        cached!(self, bulk.dbvirial_dt, calc_dbvirial_dt)
    }
    fn dcvirial_dt(&mut self) -> FluidResult<f64> {
        cached!(self, bulk.dcvirial_dt, calc_dcvirial_dt)
    }
    fn viscosity(&mut self) -> FluidResult<f64> {
        cached!(self, transport.viscosity, calc_viscosity)
    }
    fn conductivity(&mut self) -> FluidResult<f64> {
        cached!(self, transport.conductivity, calc_conductivity)
    }
    fn surface_tension(&mut self) -> FluidResult<f64> {
        cached!(self, transport.surface_tension, calc_surface_tension)
    }
    fn saturated_liquid_rhomolar(&mut self) -> FluidResult<f64> {
        cached!(
            self,
            saturation.rhomolar_liquid,
            calc_saturated_liquid_rhomolar
        )
    }
    fn saturated_vapor_rhomolar(&mut self) -> FluidResult<f64> {
        cached!(
            self,
            saturation.rhomolar_vapor,
            calc_saturated_vapor_rhomolar
        )
    }
    fn rho_spline(&mut self) -> FluidResult<f64> {
        cached!(self, spline.rhospline, calc_rho_spline)
    }
    fn drho_spline_dp(&mut self) -> FluidResult<f64> {
        cached!(self, spline.drhospline_dp, calc_drho_spline_dp)
    }
    fn drho_spline_dh(&mut self) -> FluidResult<f64> {
        cached!(self, spline.drhospline_dh, calc_drho_spline_dh)
    }

    fn alpha0(&mut self, which: AlphaDeriv) -> FluidResult<f64> {
        if let Some(value) = self.core().cache.helmholtz.ideal.cell(which).get() {
            return Ok(value);
        }
        let value = self.calc_alpha0(which)?;
        self.core_mut().cache.helmholtz.ideal.cell_mut(which).set(value);
        Ok(value)
    }

    fn alphar(&mut self, which: AlphaDeriv) -> FluidResult<f64> {
        if let Some(value) = self.core().cache.helmholtz.residual.cell(which).get() {
            return Ok(value);
        }
        let value = self.calc_alphar(which)?;
        self.core_mut()
            .cache
            .helmholtz
            .residual
            .cell_mut(which)
            .set(value);
        Ok(value)
    }

    fn alphar_lim(&mut self, which: AlphaLimit) -> FluidResult<f64> {
        if let Some(value) = self.core().cache.helmholtz.residual_limit.cell(which).get() {
            return Ok(value);
        }
        let value = self.calc_alphar_lim(which)?;
        self.core_mut()
            .cache
            .helmholtz
            .residual_limit
            .cell_mut(which)
            .set(value);
        Ok(value)
    }

    fn fugacity_coefficient(&mut self, component: usize) -> FluidResult<f64> {
        let n = self.core().record.fractions.len();
        if component >= n {
            return Err(FluidError::InvalidArg {
                what: "component index out of range",
            });
        }
        let cells = &self.core().cache.bulk.fugacity_coefficient;
        if let Some(value) = cells.get(component).and_then(|cell| cell.get()) {
            return Ok(value);
        }
        let value = self.calc_fugacity_coefficient(component)?;
        let cells = &mut self.core_mut().cache.bulk.fugacity_coefficient;
        if cells.len() < n {
            cells.resize_with(n, Default::default);
        }
        cells[component].set(value);
        Ok(value)
    }

    /// Fugacity of a component [Pa]: φ_i x_i p.
    fn fugacity(&mut self, component: usize) -> FluidResult<f64> {
        let phi = self.fugacity_coefficient(component)?;
        Ok(phi * self.core().record.fractions[component] * self.p())
    }

    // ---- provided: mass basis -----------------------------------------------

    fn rhomass(&mut self) -> FluidResult<f64> {
        self.calc_rhomass()
    }
    fn hmass(&mut self) -> FluidResult<f64> {
        self.calc_hmass()
    }
    fn smass(&mut self) -> FluidResult<f64> {
        self.calc_smass()
    }
    fn umass(&mut self) -> FluidResult<f64> {
        self.calc_umass()
    }
    fn cpmass(&mut self) -> FluidResult<f64> {
        self.calc_cpmass()
    }
    fn cvmass(&mut self) -> FluidResult<f64> {
        self.calc_cvmass()
    }
    fn gibbsmass(&mut self) -> FluidResult<f64> {
        Ok(self.gibbsmolar()? / self.molar_mass()?)
    }

    /// Z = p / (ρ R T).
    fn compressibility_factor(&mut self) -> FluidResult<f64> {
        let r = self.gas_constant()?;
        Ok(self.p() / (self.rhomolar() * r * self.t()))
    }

    // ---- provided: fixed points ---------------------------------------------

    fn t_critical(&mut self) -> FluidResult<f64> {
        self.calc_t_critical()
    }
    fn p_critical(&mut self) -> FluidResult<f64> {
        self.calc_p_critical()
    }
    fn rhomolar_critical(&mut self) -> FluidResult<f64> {
        self.calc_rhomolar_critical()
    }
    fn t_triple(&mut self) -> FluidResult<f64> {
        self.calc_t_triple()
    }
    fn p_triple(&mut self) -> FluidResult<f64> {
        self.calc_p_triple()
    }
    fn tmin(&mut self) -> FluidResult<f64> {
        self.calc_tmin()
    }
    fn tmax(&mut self) -> FluidResult<f64> {
        self.calc_tmax()
    }
    fn pmax(&mut self) -> FluidResult<f64> {
        self.calc_pmax()
    }

    fn gwp20(&mut self) -> FluidResult<f64> {
        self.calc_gwp20()
    }
    fn gwp100(&mut self) -> FluidResult<f64> {
        self.calc_gwp100()
    }
    fn gwp500(&mut self) -> FluidResult<f64> {
        self.calc_gwp500()
    }
    fn odp(&mut self) -> FluidResult<f64> {
        self.calc_odp()
    }
    fn flame_hazard(&mut self) -> FluidResult<f64> {
        self.calc_flame_hazard()
    }
    fn health_hazard(&mut self) -> FluidResult<f64> {
        self.calc_health_hazard()
    }
    fn physical_hazard(&mut self) -> FluidResult<f64> {
        self.calc_physical_hazard()
    }

    /// `&`-joined component names.
    fn name(&self) -> String {
        self.fluid_names().join("&")
    }

    fn melting_line(&mut self, of: Parameter, given: Parameter, value: f64) -> FluidResult<f64> {
        if !self.has_melting_line() {
            return Err(FluidError::NotSupported {
                what: "fluid has no melting line",
            });
        }
        self.calc_melting_line(of, given, value)
    }

    fn get_state(&mut self, key: &str) -> FluidResult<SimpleState> {
        self.calc_state(key)
    }

    fn get_reducing_state(&mut self) -> FluidResult<SimpleState> {
        self.calc_state("reducing")
    }

    // ---- provided: phase and derivatives ------------------------------------

    /// Phase of the current state with any caller forcing applied.
    fn phase(&mut self) -> FluidResult<Phase> {
        let classified = match self.core().record.phase {
            Some(phase) => phase,
            None => {
                let phase = self.calc_phase()?;
                self.core_mut().record.phase = Some(phase);
                phase
            }
        };
        let rec = &self.core().record;
        Ok(rec.forcing.apply(classified, rec.rhomolar, &rec.critical))
    }

    fn is_homogeneous_phase(&mut self) -> FluidResult<bool> {
        Ok(self.phase()?.is_homogeneous())
    }

    /// `(∂of/∂wrt)_constant`. Keys without a closed (τ, δ) form, such as
    /// Cp, Cv or viscosity, return [`FluidError::NotSupported`].
    fn first_partial_deriv(
        &mut self,
        of: Parameter,
        wrt: Parameter,
        constant: Parameter,
    ) -> FluidResult<f64> {
        self.calc_first_partial_deriv(of, wrt, constant)
    }

    fn second_partial_deriv(
        &mut self,
        of: Parameter,
        wrt1: Parameter,
        constant1: Parameter,
        wrt2: Parameter,
        constant2: Parameter,
    ) -> FluidResult<f64> {
        self.calc_second_partial_deriv(of, wrt1, constant1, wrt2, constant2)
    }

    /// Any supported output by key.
    fn keyed_output(&mut self, key: Parameter) -> FluidResult<f64> {
        match key {
            Parameter::T => Ok(self.t()),
            Parameter::P => Ok(self.p()),
            Parameter::Dmolar => Ok(self.rhomolar()),
            Parameter::Dmass => self.rhomass(),
            Parameter::Hmolar => self.hmolar(),
            Parameter::Hmass => self.hmass(),
            Parameter::Smolar => self.smolar(),
            Parameter::Smass => self.smass(),
            Parameter::Umolar => self.umolar(),
            Parameter::Umass => self.umass(),
            Parameter::Cpmolar => self.cpmolar(),
            Parameter::Cpmass => self.cpmass(),
            Parameter::Cvmolar => self.cvmolar(),
            Parameter::Cvmass => self.cvmass(),
            Parameter::Gmolar => self.gibbsmolar(),
            Parameter::Gmass => self.gibbsmass(),
            Parameter::SpeedSound => self.speed_sound(),
            Parameter::Q => self.q().ok_or(FluidError::OutOfRange {
                what: "quality outside the two-phase region",
            }),
            Parameter::Tau => self.tau(),
            Parameter::Delta => self.delta(),
            Parameter::Viscosity => self.viscosity(),
            Parameter::Conductivity => self.conductivity(),
            Parameter::SurfaceTension => self.surface_tension(),
            Parameter::MolarMass => self.molar_mass(),
            Parameter::GasConstant => self.gas_constant(),
            Parameter::IsothermalCompressibility => self.isothermal_compressibility(),
            Parameter::IsobaricExpansionCoefficient => self.isobaric_expansion_coefficient(),
            Parameter::Tcrit => self.t_critical(),
            Parameter::Pcrit => self.p_critical(),
            Parameter::RhomolarCrit => self.rhomolar_critical(),
            Parameter::Ttriple => self.t_triple(),
            Parameter::Ptriple => self.p_triple(),
            Parameter::Tmin => self.tmin(),
            Parameter::Tmax => self.tmax(),
            Parameter::Pmax => self.pmax(),
            Parameter::Bvirial => self.bvirial(),
            Parameter::Cvirial => self.cvirial(),
            Parameter::DBvirialDT => self.dbvirial_dt(),
            Parameter::DCvirialDT => self.dcvirial_dt(),
            Parameter::Gwp20 => self.gwp20(),
            Parameter::Gwp100 => self.gwp100(),
            Parameter::Gwp500 => self.gwp500(),
            Parameter::Odp => self.odp(),
            Parameter::FlameHazard => self.flame_hazard(),
            Parameter::HealthHazard => self.health_hazard(),
            Parameter::PhysicalHazard => self.physical_hazard(),
            Parameter::Alpha0 => self.alpha0(AlphaDeriv::Value),
            Parameter::DAlpha0DTau => self.alpha0(AlphaDeriv::Tau),
            Parameter::DAlpha0DDelta => self.alpha0(AlphaDeriv::Delta),
            Parameter::D2Alpha0DTau2 => self.alpha0(AlphaDeriv::Tau2),
            Parameter::D2Alpha0DDeltaDTau => self.alpha0(AlphaDeriv::DeltaTau),
            Parameter::D2Alpha0DDelta2 => self.alpha0(AlphaDeriv::Delta2),
            Parameter::AlphaR => self.alphar(AlphaDeriv::Value),
            Parameter::DAlphaRDTau => self.alphar(AlphaDeriv::Tau),
            Parameter::DAlphaRDDelta => self.alphar(AlphaDeriv::Delta),
            Parameter::D2AlphaRDTau2 => self.alphar(AlphaDeriv::Tau2),
            Parameter::D2AlphaRDDeltaDTau => self.alphar(AlphaDeriv::DeltaTau),
            Parameter::D2AlphaRDDelta2 => self.alphar(AlphaDeriv::Delta2),
        }
    }
}

impl dyn FluidBackend + '_ {
    /// [`FluidBackend::set_mole_fractions`] for any float precision.
    pub fn set_mole_fractions_as<T: Copy + Into<f64>>(
        &mut self,
        fractions: &[T],
    ) -> FluidResult<()> {
        self.set_mole_fractions(&widen(fractions))
    }

    /// [`FluidBackend::set_mass_fractions`] for any float precision.
    pub fn set_mass_fractions_as<T: Copy + Into<f64>>(
        &mut self,
        fractions: &[T],
    ) -> FluidResult<()> {
        self.set_mass_fractions(&widen(fractions))
    }

    /// [`FluidBackend::set_volu_fractions`] for any float precision.
    pub fn set_volu_fractions_as<T: Copy + Into<f64>>(
        &mut self,
        fractions: &[T],
    ) -> FluidResult<()> {
        self.set_volu_fractions(&widen(fractions))
    }
}

fn widen<T: Copy + Into<f64>>(values: &[T]) -> Vec<f64> {
    values.iter().map(|&v| v.into()).collect()
}
