//! Input pairs and output keys.

use crate::error::{FluidError, FluidResult};
use std::fmt;
use std::str::FromStr;
use tp_core::units::{Density, MolarDensity, Pressure, Temperature};

/// Two independent state variables handed to `update`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StateInput {
    /// Pressure and temperature.
    PT { p: Pressure, t: Temperature },
    /// Molar density and temperature.
    DmolarT { rhomolar: MolarDensity, t: Temperature },
    /// Mass density and temperature; normalized to `DmolarT` before reaching a backend.
    DmassT { rhomass: Density, t: Temperature },
}

impl StateInput {
    pub fn label(&self) -> &'static str {
        match self {
            StateInput::PT { .. } => "PT",
            StateInput::DmolarT { .. } => "DmolarT",
            StateInput::DmassT { .. } => "DmassT",
        }
    }

    /// Temperature [K] carried by every supported pair.
    pub fn temperature(&self) -> f64 {
        match self {
            StateInput::PT { t, .. }
            | StateInput::DmolarT { t, .. }
            | StateInput::DmassT { t, .. } => t.value,
        }
    }

    /// Reject non-finite or non-positive inputs.
    pub fn validate(&self) -> FluidResult<()> {
        let t = self.temperature();
        if !t.is_finite() || t <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "temperature must be positive and finite",
            });
        }
        let (value, what) = match self {
            StateInput::PT { p, .. } => (p.value, "pressure must be positive and finite"),
            StateInput::DmolarT { rhomolar, .. } => {
                (rhomolar.value, "density must be positive and finite")
            }
            StateInput::DmassT { rhomass, .. } => {
                (rhomass.value, "density must be positive and finite")
            }
        };
        if !value.is_finite() || value <= 0.0 {
            return Err(FluidError::NonPhysical { what });
        }
        Ok(())
    }
}

/// Output keys understood by `keyed_output` and the derivative engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    T,
    P,
    Dmolar,
    Dmass,
    Hmolar,
    Hmass,
    Smolar,
    Smass,
    Umolar,
    Umass,
    Cpmolar,
    Cpmass,
    Cvmolar,
    Cvmass,
    Gmolar,
    Gmass,
    SpeedSound,
    Q,
    Tau,
    Delta,
    Viscosity,
    Conductivity,
    SurfaceTension,
    MolarMass,
    GasConstant,
    IsothermalCompressibility,
    IsobaricExpansionCoefficient,
    Tcrit,
    Pcrit,
    RhomolarCrit,
    Ttriple,
    Ptriple,
    Tmin,
    Tmax,
    Pmax,
    Bvirial,
    Cvirial,
    DBvirialDT,
    DCvirialDT,
    Gwp20,
    Gwp100,
    Gwp500,
    Odp,
    FlameHazard,
    HealthHazard,
    PhysicalHazard,
    Alpha0,
    DAlpha0DTau,
    DAlpha0DDelta,
    D2Alpha0DTau2,
    D2Alpha0DDeltaDTau,
    D2Alpha0DDelta2,
    AlphaR,
    DAlphaRDTau,
    DAlphaRDDelta,
    D2AlphaRDTau2,
    D2AlphaRDDeltaDTau,
    D2AlphaRDDelta2,
}

const KEYS: &[(Parameter, &str)] = &[
    (Parameter::T, "T"),
    (Parameter::P, "P"),
    (Parameter::Dmolar, "Dmolar"),
    (Parameter::Dmass, "Dmass"),
    (Parameter::Hmolar, "Hmolar"),
    (Parameter::Hmass, "Hmass"),
    (Parameter::Smolar, "Smolar"),
    (Parameter::Smass, "Smass"),
    (Parameter::Umolar, "Umolar"),
    (Parameter::Umass, "Umass"),
    (Parameter::Cpmolar, "Cpmolar"),
    (Parameter::Cpmass, "Cpmass"),
    (Parameter::Cvmolar, "Cvmolar"),
    (Parameter::Cvmass, "Cvmass"),
    (Parameter::Gmolar, "Gmolar"),
    (Parameter::Gmass, "Gmass"),
    (Parameter::SpeedSound, "speed_of_sound"),
    (Parameter::Q, "Q"),
    (Parameter::Tau, "tau"),
    (Parameter::Delta, "delta"),
    (Parameter::Viscosity, "viscosity"),
    (Parameter::Conductivity, "conductivity"),
    (Parameter::SurfaceTension, "surface_tension"),
    (Parameter::MolarMass, "molar_mass"),
    (Parameter::GasConstant, "gas_constant"),
    (Parameter::IsothermalCompressibility, "isothermal_compressibility"),
    (
        Parameter::IsobaricExpansionCoefficient,
        "isobaric_expansion_coefficient",
    ),
    (Parameter::Tcrit, "Tcrit"),
    (Parameter::Pcrit, "Pcrit"),
    (Parameter::RhomolarCrit, "rhomolar_critical"),
    (Parameter::Ttriple, "Ttriple"),
    (Parameter::Ptriple, "ptriple"),
    (Parameter::Tmin, "Tmin"),
    (Parameter::Tmax, "Tmax"),
    (Parameter::Pmax, "pmax"),
    (Parameter::Bvirial, "Bvirial"),
    (Parameter::Cvirial, "Cvirial"),
    (Parameter::DBvirialDT, "dBvirial_dT"),
    (Parameter::DCvirialDT, "dCvirial_dT"),
    (Parameter::Gwp20, "GWP20"),
    (Parameter::Gwp100, "GWP100"),
    (Parameter::Gwp500, "GWP500"),
    (Parameter::Odp, "ODP"),
    (Parameter::FlameHazard, "FH"),
    (Parameter::HealthHazard, "HH"),
    (Parameter::PhysicalHazard, "PH"),
    (Parameter::Alpha0, "alpha0"),
    (Parameter::DAlpha0DTau, "dalpha0_dtau_constdelta"),
    (Parameter::DAlpha0DDelta, "dalpha0_ddelta_consttau"),
    (Parameter::D2Alpha0DTau2, "d2alpha0_dtau2"),
    (Parameter::D2Alpha0DDeltaDTau, "d2alpha0_ddelta_dtau"),
    (Parameter::D2Alpha0DDelta2, "d2alpha0_ddelta2"),
    (Parameter::AlphaR, "alphar"),
    (Parameter::DAlphaRDTau, "dalphar_dtau_constdelta"),
    (Parameter::DAlphaRDDelta, "dalphar_ddelta_consttau"),
    (Parameter::D2AlphaRDTau2, "d2alphar_dtau2"),
    (Parameter::D2AlphaRDDeltaDTau, "d2alphar_ddelta_dtau"),
    (Parameter::D2AlphaRDDelta2, "d2alphar_ddelta2"),
];

/// Single-letter and long-form aliases accepted on input.
const ALIASES: &[(&str, Parameter)] = &[
    ("D", Parameter::Dmass),
    ("rhomass", Parameter::Dmass),
    ("rhomolar", Parameter::Dmolar),
    ("H", Parameter::Hmass),
    ("S", Parameter::Smass),
    ("U", Parameter::Umass),
    ("C", Parameter::Cpmass),
    ("O", Parameter::Cvmass),
    ("G", Parameter::Gmass),
    ("A", Parameter::SpeedSound),
    ("speed_sound", Parameter::SpeedSound),
    ("V", Parameter::Viscosity),
    ("L", Parameter::Conductivity),
    ("I", Parameter::SurfaceTension),
    ("M", Parameter::MolarMass),
    ("T_critical", Parameter::Tcrit),
    ("p_critical", Parameter::Pcrit),
    ("T_triple", Parameter::Ttriple),
    ("p_triple", Parameter::Ptriple),
    ("T_min", Parameter::Tmin),
    ("T_max", Parameter::Tmax),
];

impl Parameter {
    /// Canonical key string.
    pub fn key(self) -> &'static str {
        KEYS.iter()
            .find(|(p, _)| *p == self)
            .map(|(_, key)| *key)
            .unwrap_or("?")
    }

    pub fn all() -> impl Iterator<Item = Parameter> {
        KEYS.iter().map(|(p, _)| *p)
    }

    /// Molar counterpart of a mass-basis key, with the exponent of molar mass
    /// that converts the molar value: `mass = molar * M^exponent`.
    pub fn molar_basis(self) -> Option<(Parameter, i32)> {
        match self {
            Parameter::Dmass => Some((Parameter::Dmolar, 1)),
            Parameter::Hmass => Some((Parameter::Hmolar, -1)),
            Parameter::Smass => Some((Parameter::Smolar, -1)),
            Parameter::Umass => Some((Parameter::Umolar, -1)),
            Parameter::Gmass => Some((Parameter::Gmolar, -1)),
            Parameter::Cpmass => Some((Parameter::Cpmolar, -1)),
            Parameter::Cvmass => Some((Parameter::Cvmolar, -1)),
            _ => None,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Parameter {
    type Err = FluidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // Single letters are case-sensitive ("D" is mass density, "d" is not a key).
        if let Some((_, p)) = ALIASES.iter().find(|(alias, _)| *alias == s) {
            return Ok(*p);
        }
        KEYS.iter()
            .find(|(_, key)| key.eq_ignore_ascii_case(s))
            .map(|(p, _)| *p)
            .or_else(|| {
                ALIASES
                    .iter()
                    .filter(|(alias, _)| alias.len() > 1)
                    .find(|(alias, _)| alias.eq_ignore_ascii_case(s))
                    .map(|(_, p)| *p)
            })
            .ok_or(FluidError::InvalidArg {
                what: "unknown parameter key",
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tp_core::units::{k, kg_per_m3, pa};

    #[test]
    fn every_key_round_trips() {
        for p in Parameter::all() {
            assert_eq!(p.key().parse::<Parameter>().unwrap(), p);
        }
    }

    #[test]
    fn aliases_and_case() {
        assert_eq!("hmolar".parse::<Parameter>().unwrap(), Parameter::Hmolar);
        assert_eq!("D".parse::<Parameter>().unwrap(), Parameter::Dmass);
        assert_eq!("A".parse::<Parameter>().unwrap(), Parameter::SpeedSound);
        assert_eq!("T".parse::<Parameter>().unwrap(), Parameter::T);
        assert_eq!("t_critical".parse::<Parameter>().unwrap(), Parameter::Tcrit);
        assert_eq!("gwp100".parse::<Parameter>().unwrap(), Parameter::Gwp100);
        assert!("enthalpyish".parse::<Parameter>().is_err());
    }

    #[test]
    fn mass_keys_map_to_molar() {
        assert_eq!(Parameter::Hmass.molar_basis(), Some((Parameter::Hmolar, -1)));
        assert_eq!(Parameter::Dmass.molar_basis(), Some((Parameter::Dmolar, 1)));
        assert_eq!(Parameter::P.molar_basis(), None);
    }

    #[test]
    fn input_validation() {
        let ok = StateInput::PT {
            p: pa(1e5),
            t: k(300.0),
        };
        assert!(ok.validate().is_ok());
        assert_eq!(ok.label(), "PT");

        let bad = StateInput::DmassT {
            rhomass: kg_per_m3(-1.0),
            t: k(300.0),
        };
        assert!(matches!(bad.validate(), Err(FluidError::NonPhysical { .. })));

        let cold = StateInput::PT {
            p: pa(1e5),
            t: k(0.0),
        };
        assert!(cold.validate().is_err());
    }
}
