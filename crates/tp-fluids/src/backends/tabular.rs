//! `TTSE&X` and `BICUBIC&X`: property tables over a wrapped backend.
//!
//! The table stores p, h, s and u on a (T, ρ) grid together with their
//! first, second and cross derivatives, all taken from the wrapped backend.
//! Temperature is linear-spaced and density log-spaced. Properties the table
//! does not carry are delegated to the wrapped backend, which is moved to
//! the current state only when such a property is requested.

use crate::backend::FluidBackend;
use crate::error::{FluidError, FluidResult};
use crate::params::{Parameter, StateInput};
use crate::phase::Phase;
use crate::record::{AlphaDeriv, SimpleState, StateCore};
use std::time::Instant;
use tp_core::numeric::{linspace, logspace};
use tp_core::units::{k, mol_per_m3};
use tracing::{debug, info};

/// Interpolation scheme of a table wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TableKind {
    /// Second-order Taylor expansion about the nearest node.
    Ttse,
    /// Hermite bicubic patch over the enclosing cell.
    Bicubic,
}

impl TableKind {
    pub fn token(self) -> &'static str {
        match self {
            TableKind::Ttse => "TTSE",
            TableKind::Bicubic => "BICUBIC",
        }
    }
}

/// Grid resolution and optional explicit ranges.
///
/// Unset ranges default to `[T_triple, 2 T_c]` and `[1e-4 ρ_c, 3.5 ρ_c]` of the
/// wrapped fluid.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TableConfig {
    pub nt: usize,
    pub nrho: usize,
    /// Temperature range [K]
    pub t_range: Option<(f64, f64)>,
    /// Molar density range [mol/m³]
    pub rhomolar_range: Option<(f64, f64)>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            nt: 100,
            nrho: 100,
            t_range: None,
            rhomolar_range: None,
        }
    }
}

/// Tabulated properties, in storage order.
const TABULATED: [Parameter; 4] = [
    Parameter::P,
    Parameter::Hmolar,
    Parameter::Smolar,
    Parameter::Umolar,
];

fn slot(prop: Parameter) -> Option<usize> {
    TABULATED.iter().position(|p| *p == prop)
}

/// One property at one node.
#[derive(Debug, Clone, Copy, Default)]
struct Node {
    value: f64,
    d_t: f64,
    d_rho: f64,
    d2_t2: f64,
    d2_t_rho: f64,
    d2_rho2: f64,
}

impl Node {
    fn sample(base: &mut dyn FluidBackend, prop: Parameter) -> FluidResult<Self> {
        use Parameter::{Dmolar, T};
        Ok(Self {
            value: base.keyed_output(prop)?,
            d_t: base.first_partial_deriv(prop, T, Dmolar)?,
            d_rho: base.first_partial_deriv(prop, Dmolar, T)?,
            d2_t2: base.second_partial_deriv(prop, T, Dmolar, T, Dmolar)?,
            d2_t_rho: base.second_partial_deriv(prop, T, Dmolar, Dmolar, T)?,
            d2_rho2: base.second_partial_deriv(prop, Dmolar, T, Dmolar, T)?,
        })
    }

    fn taylor(&self, dt: f64, drho: f64) -> f64 {
        self.value
            + dt * self.d_t
            + drho * self.d_rho
            + 0.5 * dt * dt * self.d2_t2
            + dt * drho * self.d2_t_rho
            + 0.5 * drho * drho * self.d2_rho2
    }
}

type NodeSet = [Node; 4];

/// A built (T, ρ) table.
#[derive(Debug, Clone)]
pub struct PropertyTable {
    ts: Vec<f64>,
    rhos: Vec<f64>,
    nodes: Vec<Option<NodeSet>>,
}

impl PropertyTable {
    /// Sample `base` on the grid described by `config`.
    ///
    /// Nodes where the wrapped backend fails are left empty; a state that
    /// needs an empty node cannot be evaluated.
    pub fn build(base: &mut dyn FluidBackend, config: &TableConfig) -> FluidResult<Self> {
        if config.nt < 2 || config.nrho < 2 {
            return Err(FluidError::InvalidArg {
                what: "table needs at least two nodes per axis",
            });
        }
        let (t_lo, t_hi) = match config.t_range {
            Some(range) => range,
            None => (base.t_triple()?, 2.0 * base.t_critical()?),
        };
        let (rho_lo, rho_hi) = match config.rhomolar_range {
            Some(range) => range,
            None => {
                let rhoc = base.rhomolar_critical()?;
                (1e-4 * rhoc, 3.5 * rhoc)
            }
        };
        if !(t_lo > 0.0 && t_hi > t_lo && rho_lo > 0.0 && rho_hi > rho_lo) {
            return Err(FluidError::InvalidArg {
                what: "table ranges must be positive and increasing",
            });
        }

        let start = Instant::now();
        let ts = linspace(t_lo, t_hi, config.nt);
        let rhos = logspace(rho_lo, rho_hi, config.nrho)?;
        let mut nodes = Vec::with_capacity(ts.len() * rhos.len());
        for &t in &ts {
            for &rho in &rhos {
                nodes.push(Self::sample(base, t, rho).ok());
            }
        }
        let filled = nodes.iter().filter(|n| n.is_some()).count();
        info!(
            backend = base.backend_name(),
            nt = config.nt,
            nrho = config.nrho,
            filled,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "built property table"
        );
        if filled == 0 {
            return Err(FluidError::NotSupported {
                what: "wrapped backend produced no table nodes",
            });
        }
        Ok(Self { ts, rhos, nodes })
    }

    fn sample(base: &mut dyn FluidBackend, t: f64, rho: f64) -> FluidResult<NodeSet> {
        base.update(StateInput::DmolarT {
            rhomolar: mol_per_m3(rho),
            t: k(t),
        })?;
        let mut set = NodeSet::default();
        for (node, prop) in set.iter_mut().zip(TABULATED) {
            *node = Node::sample(base, prop)?;
        }
        Ok(set)
    }

    fn node(&self, i: usize, j: usize) -> Option<&NodeSet> {
        self.nodes.get(i * self.rhos.len() + j)?.as_ref()
    }

    fn t_step(&self) -> f64 {
        self.ts[1] - self.ts[0]
    }

    fn ln_rho_step(&self) -> f64 {
        (self.rhos[1] / self.rhos[0]).ln()
    }

    fn check_bounds(&self, t: f64, rho: f64) -> FluidResult<()> {
        if !t.is_finite() || !rho.is_finite() {
            return Err(FluidError::InvalidArg {
                what: "state has not been updated",
            });
        }
        let (t_lo, t_hi) = (self.ts[0], self.ts[self.ts.len() - 1]);
        let (r_lo, r_hi) = (self.rhos[0], self.rhos[self.rhos.len() - 1]);
        if t < t_lo || t > t_hi || rho < r_lo || rho > r_hi {
            return Err(FluidError::OutOfRange {
                what: "state outside the property table",
            });
        }
        Ok(())
    }

    /// Lower-left node of the cell enclosing (t, ρ).
    fn cell(&self, t: f64, rho: f64) -> (usize, usize) {
        let i = ((t - self.ts[0]) / self.t_step()).floor() as usize;
        let j = ((rho / self.rhos[0]).ln() / self.ln_rho_step()).floor() as usize;
        (i.min(self.ts.len() - 2), j.min(self.rhos.len() - 2))
    }

    fn missing() -> FluidError {
        FluidError::OutOfRange {
            what: "table node unavailable at this state",
        }
    }

    pub fn evaluate(
        &self,
        kind: TableKind,
        prop: Parameter,
        t: f64,
        rho: f64,
    ) -> FluidResult<f64> {
        let idx = slot(prop).ok_or(FluidError::NotSupported {
            what: "property is not tabulated",
        })?;
        self.check_bounds(t, rho)?;
        match kind {
            TableKind::Ttse => self.ttse(idx, t, rho),
            TableKind::Bicubic => self.bicubic(idx, t, rho),
        }
    }

    fn ttse(&self, idx: usize, t: f64, rho: f64) -> FluidResult<f64> {
        let (i, j) = self.cell(t, rho);
        let i = if t - self.ts[i] > 0.5 * self.t_step() { i + 1 } else { i };
        let j = if (rho / self.rhos[j]).ln() > 0.5 * self.ln_rho_step() {
            j + 1
        } else {
            j
        };
        let node = self.node(i, j).ok_or_else(Self::missing)?;
        Ok(node[idx].taylor(t - self.ts[i], rho - self.rhos[j]))
    }

    fn bicubic(&self, idx: usize, t: f64, rho: f64) -> FluidResult<f64> {
        let (i, j) = self.cell(t, rho);
        let dt = self.ts[i + 1] - self.ts[i];
        let drho = self.rhos[j + 1] - self.rhos[j];
        let u = (t - self.ts[i]) / dt;
        let v = (rho - self.rhos[j]) / drho;

        let h = |s: f64| [2.0 * s.powi(3) - 3.0 * s * s + 1.0, -2.0 * s.powi(3) + 3.0 * s * s];
        let g = |s: f64| [s.powi(3) - 2.0 * s * s + s, s.powi(3) - s * s];
        let (hu, hv, gu, gv) = (h(u), h(v), g(u), g(v));

        let mut value = 0.0;
        for a in 0..2 {
            for b in 0..2 {
                let node = &self.node(i + a, j + b).ok_or_else(Self::missing)?[idx];
                value += node.value * hu[a] * hv[b]
                    + node.d_t * dt * gu[a] * hv[b]
                    + node.d_rho * drho * hu[a] * gv[b]
                    + node.d2_t_rho * dt * drho * gu[a] * gv[b];
            }
        }
        Ok(value)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }
}

/// A table wrapper over another backend.
pub struct TabularBackend {
    core: StateCore,
    kind: TableKind,
    name: String,
    config: TableConfig,
    base: Box<dyn FluidBackend>,
    table: Option<PropertyTable>,
    /// Whether `base` sits at the current state.
    base_synced: bool,
}

impl TabularBackend {
    pub fn new(kind: TableKind, base: Box<dyn FluidBackend>, config: TableConfig) -> Self {
        let name = format!("{}&{}", kind.token(), base.backend_name());
        let mut core = StateCore::new();
        core.record.fractions = base.fractions().to_vec();
        core.record.critical = base.core().record.critical;
        core.record.reducing = base.core().record.reducing;
        core.record.gas_constant = base.core().record.gas_constant;
        Self {
            core,
            kind,
            name,
            config,
            base,
            table: None,
            base_synced: false,
        }
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// The table, built on first use.
    pub fn table(&mut self) -> FluidResult<&PropertyTable> {
        if self.table.is_none() {
            self.base_synced = false;
            let table = PropertyTable::build(self.base.as_mut(), &self.config)?;
            self.table = Some(table);
        }
        self.table.as_ref().ok_or(FluidError::NotSupported {
            what: "property table unavailable",
        })
    }

    fn lookup(&mut self, prop: Parameter) -> FluidResult<f64> {
        let (kind, t, rho) = (self.kind, self.core.record.t, self.core.record.rhomolar);
        self.table()?.evaluate(kind, prop, t, rho)
    }

    /// The wrapped backend, moved to the current state if needed.
    fn synced(&mut self) -> FluidResult<&mut Box<dyn FluidBackend>> {
        if !self.base_synced {
            let rec = &self.core.record;
            debug!(backend = %self.name, "syncing wrapped backend");
            self.base.update(StateInput::DmolarT {
                rhomolar: mol_per_m3(rec.rhomolar),
                t: k(rec.t),
            })?;
            self.base_synced = true;
        }
        Ok(&mut self.base)
    }

    /// Composition changed in the wrapped backend: mirror it and drop the table.
    fn after_composition_change(&mut self) {
        self.clear();
        self.table = None;
        self.base_synced = false;
        let base = self.base.core().record.clone();
        let rec = &mut self.core.record;
        rec.fractions = base.fractions;
        rec.critical = base.critical;
        rec.reducing = base.reducing;
    }
}

impl FluidBackend for TabularBackend {
    fn core(&self) -> &StateCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    fn backend_name(&self) -> &str {
        &self.name
    }

    fn fluid_names(&self) -> Vec<String> {
        self.base.fluid_names()
    }

    fn using_mole_fractions(&self) -> bool {
        self.base.using_mole_fractions()
    }

    fn using_mass_fractions(&self) -> bool {
        self.base.using_mass_fractions()
    }

    fn using_volu_fractions(&self) -> bool {
        self.base.using_volu_fractions()
    }

    fn set_mole_fractions(&mut self, fractions: &[f64]) -> FluidResult<()> {
        self.base.set_mole_fractions(fractions)?;
        self.after_composition_change();
        Ok(())
    }

    fn set_mass_fractions(&mut self, fractions: &[f64]) -> FluidResult<()> {
        self.base.set_mass_fractions(fractions)?;
        self.after_composition_change();
        Ok(())
    }

    fn set_volu_fractions(&mut self, fractions: &[f64]) -> FluidResult<()> {
        self.base.set_volu_fractions(fractions)?;
        self.after_composition_change();
        Ok(())
    }

    /// The wrapped backend is trusted as synced only once the new state is
    /// accepted; a rejected state leaves it to be re-synced from the record.
    fn calc_update(&mut self, input: StateInput) -> FluidResult<()> {
        self.table()?;
        self.base_synced = false;
        let (t, rho, p) = match input {
            StateInput::PT { p, t } => {
                self.base.update(input)?;
                (t.value, self.base.rhomolar(), p.value)
            }
            // pressure comes from the table through calc_pressure
            StateInput::DmolarT { rhomolar, t } => (t.value, rhomolar.value, f64::NAN),
            StateInput::DmassT { .. } => {
                return Err(FluidError::InvalidArg {
                    what: "mass density input reached the backend",
                });
            }
        };
        self.table()?.check_bounds(t, rho)?;
        let rec = &mut self.core.record;
        rec.t = t;
        rec.rhomolar = rho;
        rec.p = p;
        rec.q = None;
        self.base_synced = matches!(input, StateInput::PT { .. });
        Ok(())
    }

    fn calc_pressure(&mut self) -> FluidResult<f64> {
        self.lookup(Parameter::P)
    }

    fn calc_hmolar(&mut self) -> FluidResult<f64> {
        self.lookup(Parameter::Hmolar)
    }

    fn calc_smolar(&mut self) -> FluidResult<f64> {
        self.lookup(Parameter::Smolar)
    }

    fn calc_umolar(&mut self) -> FluidResult<f64> {
        self.lookup(Parameter::Umolar)
    }

    fn calc_gibbsmolar(&mut self) -> FluidResult<f64> {
        Ok(self.hmolar()? - self.t() * self.smolar()?)
    }

    fn calc_molar_mass(&mut self) -> FluidResult<f64> {
        self.base.molar_mass()
    }

    fn calc_gas_constant(&mut self) -> FluidResult<f64> {
        self.base.gas_constant()
    }

    fn calc_cpmolar(&mut self) -> FluidResult<f64> {
        self.synced()?.cpmolar()
    }

    fn calc_cvmolar(&mut self) -> FluidResult<f64> {
        self.synced()?.cvmolar()
    }

    fn calc_speed_sound(&mut self) -> FluidResult<f64> {
        self.synced()?.speed_sound()
    }

    fn calc_isothermal_compressibility(&mut self) -> FluidResult<f64> {
        self.synced()?.isothermal_compressibility()
    }

    fn calc_isobaric_expansion_coefficient(&mut self) -> FluidResult<f64> {
        self.synced()?.isobaric_expansion_coefficient()
    }

    fn calc_viscosity(&mut self) -> FluidResult<f64> {
        self.synced()?.viscosity()
    }

    fn calc_conductivity(&mut self) -> FluidResult<f64> {
        self.synced()?.conductivity()
    }

    fn calc_surface_tension(&mut self) -> FluidResult<f64> {
        self.synced()?.surface_tension()
    }

    fn calc_fugacity_coefficient(&mut self, component: usize) -> FluidResult<f64> {
        self.synced()?.fugacity_coefficient(component)
    }

    fn calc_alpha0(&mut self, which: AlphaDeriv) -> FluidResult<f64> {
        self.synced()?.alpha0(which)
    }

    fn calc_alphar(&mut self, which: AlphaDeriv) -> FluidResult<f64> {
        self.synced()?.alphar(which)
    }

    fn calc_bvirial(&mut self) -> FluidResult<f64> {
        self.synced()?.bvirial()
    }

    fn calc_cvirial(&mut self) -> FluidResult<f64> {
        self.synced()?.cvirial()
    }

    fn calc_dbvirial_dt(&mut self) -> FluidResult<f64> {
        self.synced()?.dbvirial_dt()
    }

    fn calc_dcvirial_dt(&mut self) -> FluidResult<f64> {
        self.synced()?.dcvirial_dt()
    }

    fn calc_phase(&mut self) -> FluidResult<Phase> {
        self.synced()?.phase()
    }

    fn calc_first_partial_deriv(
        &mut self,
        of: Parameter,
        wrt: Parameter,
        constant: Parameter,
    ) -> FluidResult<f64> {
        self.synced()?.first_partial_deriv(of, wrt, constant)
    }

    fn calc_second_partial_deriv(
        &mut self,
        of: Parameter,
        wrt1: Parameter,
        constant1: Parameter,
        wrt2: Parameter,
        constant2: Parameter,
    ) -> FluidResult<f64> {
        self.synced()?
            .second_partial_deriv(of, wrt1, constant1, wrt2, constant2)
    }

    fn calc_state(&mut self, key: &str) -> FluidResult<SimpleState> {
        self.base.get_state(key)
    }

    fn calc_t_critical(&mut self) -> FluidResult<f64> {
        self.base.t_critical()
    }

    fn calc_p_critical(&mut self) -> FluidResult<f64> {
        self.base.p_critical()
    }

    fn calc_rhomolar_critical(&mut self) -> FluidResult<f64> {
        self.base.rhomolar_critical()
    }

    fn calc_t_triple(&mut self) -> FluidResult<f64> {
        self.base.t_triple()
    }

    fn calc_p_triple(&mut self) -> FluidResult<f64> {
        self.base.p_triple()
    }

    fn calc_tmin(&mut self) -> FluidResult<f64> {
        self.base.tmin()
    }

    fn calc_tmax(&mut self) -> FluidResult<f64> {
        self.base.tmax()
    }

    fn calc_pmax(&mut self) -> FluidResult<f64> {
        self.base.pmax()
    }

    fn has_melting_line(&self) -> bool {
        self.base.has_melting_line()
    }

    fn calc_melting_line(
        &mut self,
        of: Parameter,
        given: Parameter,
        value: f64,
    ) -> FluidResult<f64> {
        self.base.melting_line(of, given, value)
    }
}
