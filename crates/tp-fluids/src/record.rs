//! State record and the grouped property caches owned by one state object.

use crate::cached::CachedValue;
use crate::phase::{Phase, PhaseForcing};

/// A snapshot of a characteristic point (critical, reducing, anchor).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimpleState {
    /// Temperature [K]
    pub t: f64,
    /// Pressure [Pa]
    pub p: f64,
    /// Molar density [mol/m³]
    pub rhomolar: f64,
    /// Molar enthalpy [J/mol], when the backend evaluates it
    pub hmolar: Option<f64>,
    /// Molar entropy [J/(mol·K)], when the backend evaluates it
    pub smolar: Option<f64>,
}

impl SimpleState {
    pub const fn new(t: f64, p: f64, rhomolar: f64) -> Self {
        Self {
            t,
            p,
            rhomolar,
            hmolar: None,
            smolar: None,
        }
    }

    /// A snapshot that has not been filled in by a backend.
    pub const fn undefined() -> Self {
        Self::new(f64::NAN, f64::NAN, f64::NAN)
    }

    pub fn is_defined(&self) -> bool {
        self.t.is_finite() && self.p.is_finite() && self.rhomolar.is_finite()
    }
}

impl Default for SimpleState {
    fn default() -> Self {
        Self::undefined()
    }
}

/// Bulk state variables of one state object.
///
/// Written by the backend's update hook; everything derived from these lives
/// in [`PropertyCache`].
#[derive(Debug, Clone)]
pub struct StateRecord {
    /// Temperature [K]
    pub t: f64,
    /// Molar density [mol/m³]
    pub rhomolar: f64,
    /// Pressure [Pa]
    pub p: f64,
    /// Vapor quality [mol/mol]; `None` outside the two-phase region
    pub q: Option<f64>,
    /// Mole-fraction weighted gas constant [J/(mol·K)], when the composition defines it
    pub gas_constant: Option<f64>,
    /// Backend classification of the current state, `None` until classified
    pub phase: Option<Phase>,
    /// Caller override of the classification
    pub forcing: PhaseForcing,
    /// Reciprocal reduced temperature τ = T_r / T
    pub tau: CachedValue<f64>,
    /// Reduced density δ = ρ / ρ_r
    pub delta: CachedValue<f64>,
    /// Composition in the backend's native basis
    pub fractions: Vec<f64>,
    pub critical: SimpleState,
    pub reducing: SimpleState,
}

impl Default for StateRecord {
    fn default() -> Self {
        Self {
            t: f64::NAN,
            rhomolar: f64::NAN,
            p: f64::NAN,
            q: None,
            gas_constant: None,
            phase: None,
            forcing: PhaseForcing::Automatic,
            tau: CachedValue::new(),
            delta: CachedValue::new(),
            fractions: Vec::new(),
            critical: SimpleState::undefined(),
            reducing: SimpleState::undefined(),
        }
    }
}

impl StateRecord {
    pub fn is_forced_single_phase(&self) -> bool {
        self.forcing == PhaseForcing::SinglePhase
    }

    pub fn is_forced_two_phase(&self) -> bool {
        self.forcing == PhaseForcing::TwoPhase
    }

    /// Drop the bulk variables, leaving the record as before any update.
    pub(crate) fn forget_state(&mut self) {
        self.t = f64::NAN;
        self.rhomolar = f64::NAN;
        self.p = f64::NAN;
        self.q = None;
    }

    /// Forget everything that follows from the bulk variables.
    pub(crate) fn reset_derived(&mut self) {
        self.phase = None;
        self.tau.invalidate();
        self.delta.invalidate();
    }
}

/// Cached molar thermodynamic properties.
#[derive(Debug, Clone, Default)]
pub struct BulkCache {
    pub molar_mass: CachedValue<f64>,
    pub gas_constant: CachedValue<f64>,
    pub hmolar: CachedValue<f64>,
    pub smolar: CachedValue<f64>,
    pub umolar: CachedValue<f64>,
    pub cpmolar: CachedValue<f64>,
    pub cvmolar: CachedValue<f64>,
    pub gibbsmolar: CachedValue<f64>,
    pub speed_sound: CachedValue<f64>,
    pub isothermal_compressibility: CachedValue<f64>,
    pub isobaric_expansion_coefficient: CachedValue<f64>,
    pub bvirial: CachedValue<f64>,
    pub cvirial: CachedValue<f64>,
    pub dbvirial_dt: CachedValue<f64>,
    pub dcvirial_dt: CachedValue<f64>,
    /// ln p
    pub logp: CachedValue<f64>,
    /// ln ρ
    pub logrhomolar: CachedValue<f64>,
    /// One cell per component, grown on demand.
    pub fugacity_coefficient: Vec<CachedValue<f64>>,
}

impl BulkCache {
    fn cells(&self) -> [&CachedValue<f64>; 17] {
        [
            &self.molar_mass,
            &self.gas_constant,
            &self.hmolar,
            &self.smolar,
            &self.umolar,
            &self.cpmolar,
            &self.cvmolar,
            &self.gibbsmolar,
            &self.speed_sound,
            &self.isothermal_compressibility,
            &self.isobaric_expansion_coefficient,
            &self.bvirial,
            &self.cvirial,
            &self.dbvirial_dt,
            &self.dcvirial_dt,
            &self.logp,
            &self.logrhomolar,
        ]
    }

    fn cells_mut(&mut self) -> [&mut CachedValue<f64>; 17] {
        [
            &mut self.molar_mass,
            &mut self.gas_constant,
            &mut self.hmolar,
            &mut self.smolar,
            &mut self.umolar,
            &mut self.cpmolar,
            &mut self.cvmolar,
            &mut self.gibbsmolar,
            &mut self.speed_sound,
            &mut self.isothermal_compressibility,
            &mut self.isobaric_expansion_coefficient,
            &mut self.bvirial,
            &mut self.cvirial,
            &mut self.dbvirial_dt,
            &mut self.dcvirial_dt,
            &mut self.logp,
            &mut self.logrhomolar,
        ]
    }

    fn clear(&mut self) {
        self.cells_mut().into_iter().for_each(CachedValue::invalidate);
        self.fugacity_coefficient
            .iter_mut()
            .for_each(CachedValue::invalidate);
    }

    fn set_count(&self) -> usize {
        self.cells().into_iter().filter(|c| c.is_set()).count()
            + self
                .fugacity_coefficient
                .iter()
                .filter(|c| c.is_set())
                .count()
    }
}

/// Cached transport properties.
#[derive(Debug, Clone, Default)]
pub struct TransportCache {
    pub viscosity: CachedValue<f64>,
    pub conductivity: CachedValue<f64>,
    pub surface_tension: CachedValue<f64>,
}

impl TransportCache {
    fn cells(&self) -> [&CachedValue<f64>; 3] {
        [&self.viscosity, &self.conductivity, &self.surface_tension]
    }

    fn clear(&mut self) {
        self.viscosity.invalidate();
        self.conductivity.invalidate();
        self.surface_tension.invalidate();
    }
}

/// Which τ/δ derivative of a Helmholtz-energy term is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlphaDeriv {
    Value,
    Delta,
    Tau,
    Delta2,
    DeltaTau,
    Tau2,
    Delta3,
    Delta2Tau,
    DeltaTau2,
    Tau3,
}

impl AlphaDeriv {
    pub const ALL: [AlphaDeriv; 10] = [
        AlphaDeriv::Value,
        AlphaDeriv::Delta,
        AlphaDeriv::Tau,
        AlphaDeriv::Delta2,
        AlphaDeriv::DeltaTau,
        AlphaDeriv::Tau2,
        AlphaDeriv::Delta3,
        AlphaDeriv::Delta2Tau,
        AlphaDeriv::DeltaTau2,
        AlphaDeriv::Tau3,
    ];

    /// Derivative orders as `(in τ, in δ)`.
    pub const fn orders(self) -> (u8, u8) {
        match self {
            AlphaDeriv::Value => (0, 0),
            AlphaDeriv::Delta => (0, 1),
            AlphaDeriv::Tau => (1, 0),
            AlphaDeriv::Delta2 => (0, 2),
            AlphaDeriv::DeltaTau => (1, 1),
            AlphaDeriv::Tau2 => (2, 0),
            AlphaDeriv::Delta3 => (0, 3),
            AlphaDeriv::Delta2Tau => (1, 2),
            AlphaDeriv::DeltaTau2 => (2, 1),
            AlphaDeriv::Tau3 => (3, 0),
        }
    }
}

/// Residual Helmholtz derivatives taken in the limit δ → 0 at the current τ.
///
/// They carry the virial coefficients: `B = lim ∂αʳ/∂δ / ρ_r` and
/// `C = lim ∂²αʳ/∂δ² / ρ_r²`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlphaLimit {
    Delta,
    Delta2,
    DeltaTau,
    Delta2Tau,
}

impl AlphaLimit {
    pub const ALL: [AlphaLimit; 4] = [
        AlphaLimit::Delta,
        AlphaLimit::Delta2,
        AlphaLimit::DeltaTau,
        AlphaLimit::Delta2Tau,
    ];

    /// The finite-density derivative this is the limit of.
    pub const fn deriv(self) -> AlphaDeriv {
        match self {
            AlphaLimit::Delta => AlphaDeriv::Delta,
            AlphaLimit::Delta2 => AlphaDeriv::Delta2,
            AlphaLimit::DeltaTau => AlphaDeriv::DeltaTau,
            AlphaLimit::Delta2Tau => AlphaDeriv::Delta2Tau,
        }
    }
}

/// One Helmholtz-energy contribution and its τ/δ derivatives to third order.
#[derive(Debug, Clone, Default)]
pub struct HelmholtzTerms {
    pub alpha: CachedValue<f64>,
    pub d_delta: CachedValue<f64>,
    pub d_tau: CachedValue<f64>,
    pub d2_delta2: CachedValue<f64>,
    pub d2_delta_tau: CachedValue<f64>,
    pub d2_tau2: CachedValue<f64>,
    pub d3_delta3: CachedValue<f64>,
    pub d3_delta2_tau: CachedValue<f64>,
    pub d3_delta_tau2: CachedValue<f64>,
    pub d3_tau3: CachedValue<f64>,
}

impl HelmholtzTerms {
    pub fn cell(&self, which: AlphaDeriv) -> &CachedValue<f64> {
        match which {
            AlphaDeriv::Value => &self.alpha,
            AlphaDeriv::Delta => &self.d_delta,
            AlphaDeriv::Tau => &self.d_tau,
            AlphaDeriv::Delta2 => &self.d2_delta2,
            AlphaDeriv::DeltaTau => &self.d2_delta_tau,
            AlphaDeriv::Tau2 => &self.d2_tau2,
            AlphaDeriv::Delta3 => &self.d3_delta3,
            AlphaDeriv::Delta2Tau => &self.d3_delta2_tau,
            AlphaDeriv::DeltaTau2 => &self.d3_delta_tau2,
            AlphaDeriv::Tau3 => &self.d3_tau3,
        }
    }

    pub fn cell_mut(&mut self, which: AlphaDeriv) -> &mut CachedValue<f64> {
        match which {
            AlphaDeriv::Value => &mut self.alpha,
            AlphaDeriv::Delta => &mut self.d_delta,
            AlphaDeriv::Tau => &mut self.d_tau,
            AlphaDeriv::Delta2 => &mut self.d2_delta2,
            AlphaDeriv::DeltaTau => &mut self.d2_delta_tau,
            AlphaDeriv::Tau2 => &mut self.d2_tau2,
            AlphaDeriv::Delta3 => &mut self.d3_delta3,
            AlphaDeriv::Delta2Tau => &mut self.d3_delta2_tau,
            AlphaDeriv::DeltaTau2 => &mut self.d3_delta_tau2,
            AlphaDeriv::Tau3 => &mut self.d3_tau3,
        }
    }

    fn cells(&self) -> [&CachedValue<f64>; 10] {
        [
            &self.alpha,
            &self.d_delta,
            &self.d_tau,
            &self.d2_delta2,
            &self.d2_delta_tau,
            &self.d2_tau2,
            &self.d3_delta3,
            &self.d3_delta2_tau,
            &self.d3_delta_tau2,
            &self.d3_tau3,
        ]
    }

    fn cells_mut(&mut self) -> [&mut CachedValue<f64>; 10] {
        [
            &mut self.alpha,
            &mut self.d_delta,
            &mut self.d_tau,
            &mut self.d2_delta2,
            &mut self.d2_delta_tau,
            &mut self.d2_tau2,
            &mut self.d3_delta3,
            &mut self.d3_delta2_tau,
            &mut self.d3_delta_tau2,
            &mut self.d3_tau3,
        ]
    }
}

/// Zero-density limits of the residual term.
#[derive(Debug, Clone, Default)]
pub struct LimitTerms {
    pub dalphar_ddelta: CachedValue<f64>,
    pub d2alphar_ddelta2: CachedValue<f64>,
    pub d2alphar_ddelta_dtau: CachedValue<f64>,
    pub d3alphar_ddelta2_dtau: CachedValue<f64>,
}

impl LimitTerms {
    pub fn cell(&self, which: AlphaLimit) -> &CachedValue<f64> {
        match which {
            AlphaLimit::Delta => &self.dalphar_ddelta,
            AlphaLimit::Delta2 => &self.d2alphar_ddelta2,
            AlphaLimit::DeltaTau => &self.d2alphar_ddelta_dtau,
            AlphaLimit::Delta2Tau => &self.d3alphar_ddelta2_dtau,
        }
    }

    pub fn cell_mut(&mut self, which: AlphaLimit) -> &mut CachedValue<f64> {
        match which {
            AlphaLimit::Delta => &mut self.dalphar_ddelta,
            AlphaLimit::Delta2 => &mut self.d2alphar_ddelta2,
            AlphaLimit::DeltaTau => &mut self.d2alphar_ddelta_dtau,
            AlphaLimit::Delta2Tau => &mut self.d3alphar_ddelta2_dtau,
        }
    }
}

/// Ideal-gas and residual Helmholtz-energy caches.
#[derive(Debug, Clone, Default)]
pub struct HelmholtzCache {
    pub ideal: HelmholtzTerms,
    pub residual: HelmholtzTerms,
    pub residual_limit: LimitTerms,
}

impl HelmholtzCache {
    fn cells(&self) -> impl Iterator<Item = &CachedValue<f64>> {
        let limits = AlphaLimit::ALL
            .into_iter()
            .map(move |w| self.residual_limit.cell(w));
        self.ideal
            .cells()
            .into_iter()
            .chain(self.residual.cells())
            .chain(limits)
    }

    fn clear(&mut self) {
        self.ideal
            .cells_mut()
            .into_iter()
            .chain(self.residual.cells_mut())
            .for_each(CachedValue::invalidate);
        for which in AlphaLimit::ALL {
            self.residual_limit.cell_mut(which).invalidate();
        }
    }
}

/// Saturated phase densities of a two-phase state.
#[derive(Debug, Clone, Default)]
pub struct SaturationCache {
    pub rhomolar_liquid: CachedValue<f64>,
    pub rhomolar_vapor: CachedValue<f64>,
}

/// Auxiliaries for spline smoothing of two-phase density.
#[derive(Debug, Clone, Default)]
pub struct SplineCache {
    pub rhospline: CachedValue<f64>,
    pub drhospline_dp: CachedValue<f64>,
    pub drhospline_dh: CachedValue<f64>,
}

/// Every derived quantity of one state, grouped by concern.
///
/// Each cell is a function of temperature, density and composition only, so
/// any change to one of those clears the whole set.
#[derive(Debug, Clone, Default)]
pub struct PropertyCache {
    pub bulk: BulkCache,
    pub transport: TransportCache,
    pub helmholtz: HelmholtzCache,
    pub saturation: SaturationCache,
    pub spline: SplineCache,
}

impl PropertyCache {
    pub fn clear(&mut self) {
        self.bulk.clear();
        self.transport.clear();
        self.helmholtz.clear();
        self.saturation.rhomolar_liquid.invalidate();
        self.saturation.rhomolar_vapor.invalidate();
        self.spline.rhospline.invalidate();
        self.spline.drhospline_dp.invalidate();
        self.spline.drhospline_dh.invalidate();
    }

    /// Number of cells currently holding a value.
    pub fn set_count(&self) -> usize {
        let helmholtz = self.helmholtz.cells().filter(|c| c.is_set()).count();
        let others = self
            .transport
            .cells()
            .into_iter()
            .chain([
                &self.saturation.rhomolar_liquid,
                &self.saturation.rhomolar_vapor,
                &self.spline.rhospline,
                &self.spline.drhospline_dp,
                &self.spline.drhospline_dh,
            ])
            .filter(|c| c.is_set())
            .count();
        self.bulk.set_count() + helmholtz + others
    }
}

/// The record and caches every backend embeds.
#[derive(Debug, Clone, Default)]
pub struct StateCore {
    pub record: StateRecord,
    pub cache: PropertyCache,
}

impl StateCore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate every derived value, keeping the bulk variables.
    pub fn clear(&mut self) {
        self.cache.clear();
        self.record.reset_derived();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_resets_every_group() {
        let mut core = StateCore::new();
        core.cache.bulk.hmolar.set(1.0);
        core.cache.bulk.fugacity_coefficient = vec![CachedValue::new(); 2];
        core.cache.bulk.fugacity_coefficient[1].set(0.9);
        core.cache.transport.viscosity.set(1e-3);
        core.cache.helmholtz.residual.d3_tau3.set(-0.2);
        core.cache.helmholtz.ideal.alpha.set(0.0);
        core.cache.helmholtz.residual_limit.d2alphar_ddelta2.set(0.01);
        core.cache.bulk.logp.set(11.5);
        core.cache.saturation.rhomolar_vapor.set(10.0);
        core.cache.spline.drhospline_dh.set(3.0);
        core.record.tau.set(2.0);
        core.record.phase = Some(Phase::Gas);
        assert_eq!(core.cache.set_count(), 9);

        core.clear();
        assert_eq!(core.cache.set_count(), 0);
        assert!(!core.record.tau.is_set());
        assert_eq!(core.record.phase, None);
    }

    #[test]
    fn clear_keeps_bulk_variables() {
        let mut core = StateCore::new();
        core.record.t = 300.0;
        core.record.rhomolar = 40.0;
        core.record.critical = SimpleState::new(647.0, 22e6, 17_800.0);
        core.clear();
        assert_eq!(core.record.t, 300.0);
        assert_eq!(core.record.rhomolar, 40.0);
        assert!(core.record.critical.is_defined());
    }

    #[test]
    fn alpha_cells_are_distinct() {
        let mut terms = HelmholtzTerms::default();
        for (i, which) in AlphaDeriv::ALL.into_iter().enumerate() {
            terms.cell_mut(which).set(i as f64);
        }
        for (i, which) in AlphaDeriv::ALL.into_iter().enumerate() {
            assert_eq!(terms.cell(which).get(), Some(i as f64));
        }
        assert_eq!(AlphaDeriv::DeltaTau2.orders(), (2, 1));
    }

    #[test]
    fn limit_cells_are_distinct() {
        let mut terms = LimitTerms::default();
        for (i, which) in AlphaLimit::ALL.into_iter().enumerate() {
            terms.cell_mut(which).set(i as f64);
        }
        for (i, which) in AlphaLimit::ALL.into_iter().enumerate() {
            assert_eq!(terms.cell(which).get(), Some(i as f64));
        }
        assert_eq!(AlphaLimit::Delta2Tau.deriv(), AlphaDeriv::Delta2Tau);
    }

    #[test]
    fn forget_state_drops_bulk_variables() {
        let mut record = StateRecord {
            t: 300.0,
            rhomolar: 40.0,
            p: 1e5,
            q: Some(0.5),
            ..StateRecord::default()
        };
        record.forget_state();
        assert!(record.t.is_nan() && record.rhomolar.is_nan() && record.p.is_nan());
        assert_eq!(record.q, None);
    }

    #[test]
    fn undefined_snapshot() {
        assert!(!SimpleState::default().is_defined());
        assert!(SimpleState::new(1.0, 2.0, 3.0).is_defined());
    }
}
