//! `COOLPROP`: pure fluids evaluated by CoolProp through `rfluids`.

use crate::backend::{FluidBackend, not_implemented};
use crate::error::{FluidError, FluidResult};
use crate::params::StateInput;
use crate::phase::Phase;
use crate::record::{SimpleState, StateCore};
use crate::species::Species;
use rfluids::prelude::*;
use std::fmt::Display;
use tp_core::units::constants::R_UNIVERSAL;

/// The two inputs CoolProp was last given, mass basis.
#[derive(Debug, Clone, Copy)]
enum Anchor {
    PT { p: f64, t: f64 },
    DT { rhomass: f64, t: f64 },
}

fn backend_error(what: &str, e: impl Display) -> FluidError {
    FluidError::Backend {
        message: format!("rfluids error getting {what}: {e}"),
    }
}

/// Reference-database bridge for one pure fluid.
///
/// rfluids handles are rebuilt per evaluation; only the anchoring inputs are
/// kept, so the backend stays `Send`.
#[derive(Debug, Clone)]
pub struct CoolPropBackend {
    core: StateCore,
    species: Species,
    anchor: Option<Anchor>,
}

impl CoolPropBackend {
    pub fn new(species: Species) -> Self {
        let c = species.constants();
        let mut core = StateCore::new();
        core.record.gas_constant = Some(R_UNIVERSAL);
        core.record.fractions = vec![1.0];
        core.record.critical = SimpleState::new(c.t_critical, c.p_critical, c.rhomolar_critical);
        core.record.reducing = core.record.critical;
        Self {
            core,
            species,
            anchor: None,
        }
    }

    /// A handle at the current state. The anchor only counts while the
    /// record holds a state.
    fn fluid(&self) -> FluidResult<Fluid> {
        let anchor = self
            .anchor
            .filter(|_| self.core.record.t.is_finite())
            .ok_or(FluidError::InvalidArg {
                what: "state has not been updated",
            })?;
        self.fluid_at(anchor)
    }

    fn fluid_at(&self, anchor: Anchor) -> FluidResult<Fluid> {
        let pure = self.species.rfluids_pure();
        match anchor {
            Anchor::PT { p, t } => Fluid::from(pure)
                .in_state(FluidInput::pressure(p), FluidInput::temperature(t))
                .map_err(|e| FluidError::Backend {
                    message: format!("rfluids error at P={p} Pa, T={t} K: {e}"),
                }),
            Anchor::DT { rhomass, t } => Fluid::from(pure)
                .in_state(FluidInput::density(rhomass), FluidInput::temperature(t))
                .map_err(|e| FluidError::Backend {
                    message: format!("rfluids error at rho={rhomass} kg/m³, T={t} K: {e}"),
                }),
        }
    }

    fn mass(&self) -> f64 {
        self.species.molar_mass()
    }
}

impl FluidBackend for CoolPropBackend {
    fn core(&self) -> &StateCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    fn backend_name(&self) -> &str {
        "COOLPROP"
    }

    fn fluid_names(&self) -> Vec<String> {
        vec![self.species.key().to_string()]
    }

    fn using_mole_fractions(&self) -> bool {
        true
    }

    fn using_mass_fractions(&self) -> bool {
        false
    }

    fn calc_set_fractions(&mut self, fractions: &[f64]) -> FluidResult<()> {
        if fractions.len() != 1 {
            return Err(FluidError::NotSupported {
                what: "mixtures through the CoolProp bridge",
            });
        }
        self.core.record.fractions = vec![1.0];
        Ok(())
    }

    fn calc_update(&mut self, input: StateInput) -> FluidResult<()> {
        let m = self.mass();
        let (anchor, t) = match input {
            StateInput::PT { p, t } => (
                Anchor::PT {
                    p: p.value,
                    t: t.value,
                },
                t.value,
            ),
            StateInput::DmolarT { rhomolar, t } => (
                Anchor::DT {
                    rhomass: rhomolar.value * m,
                    t: t.value,
                },
                t.value,
            ),
            StateInput::DmassT { .. } => {
                return Err(not_implemented(self.backend_name(), "calc_update"));
            }
        };
        let mut fluid = self.fluid_at(anchor)?;
        let rhomass = fluid.density().map_err(|e| backend_error("density", e))?;
        // a density input leaves the pressure to calc_pressure
        let p = match anchor {
            Anchor::PT { p, .. } => p,
            Anchor::DT { .. } => f64::NAN,
        };
        let rec = &mut self.core.record;
        rec.t = t;
        rec.rhomolar = rhomass / m;
        rec.p = p;
        rec.q = None;
        self.anchor = Some(anchor);
        Ok(())
    }

    fn calc_molar_mass(&mut self) -> FluidResult<f64> {
        Ok(self.mass())
    }

    fn calc_pressure(&mut self) -> FluidResult<f64> {
        self.fluid()?
            .pressure()
            .map_err(|e| backend_error("pressure", e))
    }

    fn calc_hmolar(&mut self) -> FluidResult<f64> {
        let h = self
            .fluid()?
            .enthalpy()
            .map_err(|e| backend_error("enthalpy", e))?;
        Ok(h * self.mass())
    }

    fn calc_smolar(&mut self) -> FluidResult<f64> {
        let s = self
            .fluid()?
            .entropy()
            .map_err(|e| backend_error("entropy", e))?;
        Ok(s * self.mass())
    }

    fn calc_cpmolar(&mut self) -> FluidResult<f64> {
        let cp = self
            .fluid()?
            .specific_heat()
            .map_err(|e| backend_error("specific heat", e))?;
        Ok(cp * self.mass())
    }

    fn calc_speed_sound(&mut self) -> FluidResult<f64> {
        self.fluid()?
            .sound_speed()
            .map_err(|e| backend_error("sound speed", e))
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

    fn calc_t_critical(&mut self) -> FluidResult<f64> {
        Ok(self.species.constants().t_critical)
    }

    fn calc_p_critical(&mut self) -> FluidResult<f64> {
        Ok(self.species.constants().p_critical)
    }

    fn calc_rhomolar_critical(&mut self) -> FluidResult<f64> {
        Ok(self.species.constants().rhomolar_critical)
    }

    fn calc_t_triple(&mut self) -> FluidResult<f64> {
        Ok(self.species.constants().t_triple)
    }

    fn calc_p_triple(&mut self) -> FluidResult<f64> {
        Ok(self.species.constants().p_triple)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_without_native_library() {
        let mut b = CoolPropBackend::new(Species::N2);
        assert_eq!(b.backend_name(), "COOLPROP");
        assert_eq!(b.name(), "Nitrogen");
        assert!(b.using_mole_fractions());
        assert!((b.molar_mass().unwrap() - 0.028_013_4).abs() < 1e-12);
        assert!(b.set_mole_fractions(&[0.5, 0.5]).is_err());
        assert!(matches!(b.hmolar(), Err(FluidError::InvalidArg { .. })));
        assert!(b.viscosity().unwrap_err().is_not_implemented());
    }
}
