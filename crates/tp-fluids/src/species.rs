//! Pure-fluid library for the Helmholtz and CoolProp backends.

/// Pure fluids with built-in constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Species {
    /// Water (H₂O)
    H2O,
    /// Nitrogen (N₂)
    N2,
    /// Oxygen (O₂)
    O2,
    /// Argon (Ar)
    Ar,
    /// Methane (CH₄)
    CH4,
    /// Carbon dioxide (CO₂)
    CO2,
    /// Propane
    Propane,
    /// Refrigerant R134a
    R134a,
    /// Hydrogen (H₂)
    H2,
    /// Helium (He)
    He,
    /// Ammonia (NH₃)
    Ammonia,
    /// Refrigerant R32
    R32,
    /// Refrigerant R125
    R125,
}

/// Constants of one pure fluid, SI units throughout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PureConstants {
    /// Critical temperature [K]
    pub t_critical: f64,
    /// Critical pressure [Pa]
    pub p_critical: f64,
    /// Critical molar density [mol/m³]
    pub rhomolar_critical: f64,
    pub acentric: f64,
    /// Molar mass [kg/mol]
    pub molar_mass: f64,
    /// Constant ideal-gas heat capacity over R
    pub cp0_over_r: f64,
    /// Triple-point temperature [K]
    pub t_triple: f64,
    /// Triple-point pressure [Pa]
    pub p_triple: f64,
}

/// Environmental indices of one pure fluid. GWP values are CO₂ equivalents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Environmental {
    pub gwp20: f64,
    pub gwp100: f64,
    pub gwp500: f64,
    /// Ozone depletion potential relative to R11
    pub odp: f64,
}

/// Upper temperature limit of the built-in library [K].
pub const T_MAX: f64 = 2000.0;
/// Upper pressure limit of the built-in library [Pa].
pub const P_MAX: f64 = 1e9;

impl Species {
    pub const ALL: [Species; 13] = [
        Species::H2O,
        Species::N2,
        Species::O2,
        Species::Ar,
        Species::CH4,
        Species::CO2,
        Species::Propane,
        Species::R134a,
        Species::H2,
        Species::He,
        Species::Ammonia,
        Species::R32,
        Species::R125,
    ];

    /// Canonical fluid name, as reported by `name()`.
    pub fn key(&self) -> &'static str {
        match self {
            Species::H2O => "Water",
            Species::N2 => "Nitrogen",
            Species::O2 => "Oxygen",
            Species::Ar => "Argon",
            Species::CH4 => "Methane",
            Species::CO2 => "CarbonDioxide",
            Species::Propane => "n-Propane",
            Species::R134a => "R134a",
            Species::H2 => "Hydrogen",
            Species::He => "Helium",
            Species::Ammonia => "Ammonia",
            Species::R32 => "R32",
            Species::R125 => "R125",
        }
    }

    pub const fn constants(&self) -> PureConstants {
        match self {
            Species::H2O => PureConstants {
                t_critical: 647.096,
                p_critical: 22.064e6,
                rhomolar_critical: 17_873.73,
                acentric: 0.3443,
                molar_mass: 0.018_015_268,
                cp0_over_r: 4.04,
                t_triple: 273.16,
                p_triple: 611.655,
            },
            Species::N2 => PureConstants {
                t_critical: 126.192,
                p_critical: 3.3958e6,
                rhomolar_critical: 11_183.9,
                acentric: 0.0372,
                molar_mass: 0.028_013_4,
                cp0_over_r: 3.5,
                t_triple: 63.151,
                p_triple: 12_523.0,
            },
            Species::O2 => PureConstants {
                t_critical: 154.581,
                p_critical: 5.043e6,
                rhomolar_critical: 13_630.0,
                acentric: 0.0222,
                molar_mass: 0.031_998_8,
                cp0_over_r: 3.5,
                t_triple: 54.361,
                p_triple: 146.28,
            },
            Species::Ar => PureConstants {
                t_critical: 150.687,
                p_critical: 4.863e6,
                rhomolar_critical: 13_407.4,
                acentric: -0.00219,
                molar_mass: 0.039_948,
                cp0_over_r: 2.5,
                t_triple: 83.806,
                p_triple: 68_891.0,
            },
            Species::CH4 => PureConstants {
                t_critical: 190.564,
                p_critical: 4.5992e6,
                rhomolar_critical: 10_139.128,
                acentric: 0.01142,
                molar_mass: 0.016_042_8,
                cp0_over_r: 4.3,
                t_triple: 90.6941,
                p_triple: 11_696.0,
            },
            Species::CO2 => PureConstants {
                t_critical: 304.1282,
                p_critical: 7.3773e6,
                rhomolar_critical: 10_624.9,
                acentric: 0.22394,
                molar_mass: 0.044_009_8,
                cp0_over_r: 4.5,
                t_triple: 216.592,
                p_triple: 517_964.0,
            },
            Species::Propane => PureConstants {
                t_critical: 369.89,
                p_critical: 4.2512e6,
                rhomolar_critical: 5_000.0,
                acentric: 0.1521,
                molar_mass: 0.044_095_62,
                cp0_over_r: 8.9,
                t_triple: 85.525,
                p_triple: 1.7205e-4,
            },
            Species::R134a => PureConstants {
                t_critical: 374.21,
                p_critical: 4.05928e6,
                rhomolar_critical: 5_017.05,
                acentric: 0.32684,
                molar_mass: 0.102_032,
                cp0_over_r: 10.4,
                t_triple: 169.85,
                p_triple: 389.56,
            },
            Species::H2 => PureConstants {
                t_critical: 33.145,
                p_critical: 1.2964e6,
                rhomolar_critical: 15_508.0,
                acentric: -0.219,
                molar_mass: 0.002_015_88,
                cp0_over_r: 3.5,
                t_triple: 13.957,
                p_triple: 7_357.8,
            },
            Species::He => PureConstants {
                t_critical: 5.1953,
                p_critical: 227_610.0,
                rhomolar_critical: 17_383.7,
                acentric: -0.382,
                molar_mass: 0.004_002_602,
                cp0_over_r: 2.5,
                t_triple: 2.1768,
                p_triple: 5_033.5,
            },
            Species::Ammonia => PureConstants {
                t_critical: 405.56,
                p_critical: 11.3634e6,
                rhomolar_critical: 13_696.0,
                acentric: 0.256,
                molar_mass: 0.017_030_52,
                cp0_over_r: 4.3,
                t_triple: 195.49,
                p_triple: 6_091.2,
            },
            Species::R32 => PureConstants {
                t_critical: 351.255,
                p_critical: 5.782e6,
                rhomolar_critical: 8_150.0847,
                acentric: 0.2769,
                molar_mass: 0.052_024,
                cp0_over_r: 5.2,
                t_triple: 136.34,
                p_triple: 48.15,
            },
            Species::R125 => PureConstants {
                t_critical: 339.173,
                p_critical: 3.6177e6,
                rhomolar_critical: 4_779.0,
                acentric: 0.3052,
                molar_mass: 0.120_02,
                cp0_over_r: 11.0,
                t_triple: 172.52,
                p_triple: 2_914.0,
            },
        }
    }

    /// Global warming and ozone depletion potentials, where tabulated.
    pub const fn environmental(&self) -> Option<Environmental> {
        let (gwp20, gwp100, gwp500, odp) = match self {
            Species::CO2 => (1.0, 1.0, 1.0, 0.0),
            Species::CH4 => (72.0, 25.0, 7.6, 0.0),
            Species::R134a => (3_830.0, 1_430.0, 435.0, 0.0),
            Species::R32 => (2_330.0, 675.0, 205.0, 0.0),
            Species::R125 => (6_350.0, 3_500.0, 1_100.0, 0.0),
            _ => return None,
        };
        Some(Environmental {
            gwp20,
            gwp100,
            gwp500,
            odp,
        })
    }

    /// Molar mass [kg/mol].
    pub fn molar_mass(&self) -> f64 {
        self.constants().molar_mass
    }

    /// Map to the rfluids substance used by the CoolProp bridge.
    pub(crate) fn rfluids_pure(&self) -> rfluids::substance::Pure {
        use rfluids::substance::Pure;
        match self {
            Species::H2O => Pure::Water,
            Species::N2 => Pure::Nitrogen,
            Species::O2 => Pure::Oxygen,
            Species::Ar => Pure::Argon,
            Species::CH4 => Pure::Methane,
            Species::CO2 => Pure::CarbonDioxide,
            Species::Propane => Pure::nPropane,
            Species::R134a => Pure::R134a,
            Species::H2 => Pure::Hydrogen,
            Species::He => Pure::Helium,
            Species::Ammonia => Pure::Ammonia,
            Species::R32 => Pure::R32,
            Species::R125 => Pure::R125,
        }
    }
}

impl std::str::FromStr for Species {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "H2O" | "WATER" => Ok(Species::H2O),
            "N2" | "NITROGEN" => Ok(Species::N2),
            "O2" | "OXYGEN" => Ok(Species::O2),
            "AR" | "ARGON" => Ok(Species::Ar),
            "CH4" | "METHANE" => Ok(Species::CH4),
            "CO2" | "CARBONDIOXIDE" | "CARBON DIOXIDE" => Ok(Species::CO2),
            "PROPANE" | "N-PROPANE" | "NPROPANE" | "C3H8" | "R290" => Ok(Species::Propane),
            "R134A" => Ok(Species::R134a),
            "H2" | "HYDROGEN" => Ok(Species::H2),
            "HE" | "HELIUM" => Ok(Species::He),
            "NH3" | "AMMONIA" | "R717" => Ok(Species::Ammonia),
            "R32" => Ok(Species::R32),
            "R125" => Ok(Species::R125),
            _ => Err("unknown species"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_aliases() {
        assert_eq!("water".parse::<Species>().unwrap(), Species::H2O);
        assert_eq!("R290".parse::<Species>().unwrap(), Species::Propane);
        assert_eq!("NH3".parse::<Species>().unwrap(), Species::Ammonia);
        assert_eq!(" Carbon Dioxide ".parse::<Species>().unwrap(), Species::CO2);
        assert!("RP1".parse::<Species>().is_err());
    }

    #[test]
    fn canonical_key_round_trip() {
        for species in Species::ALL {
            assert_eq!(species.key().parse::<Species>().unwrap(), species);
        }
    }

    #[test]
    fn constants_are_physical() {
        for species in Species::ALL {
            let c = species.constants();
            assert!(c.t_triple < c.t_critical, "{species:?}");
            assert!(c.p_triple < c.p_critical, "{species:?}");
            assert!(c.rhomolar_critical > 0.0 && c.molar_mass > 0.0);
            assert!(c.cp0_over_r >= 2.5);
        }
    }

    #[test]
    fn environmental_data_only_where_tabulated() {
        let r134a = Species::R134a.environmental().unwrap();
        assert_eq!(r134a.gwp100, 1_430.0);
        assert!(r134a.gwp20 > r134a.gwp100 && r134a.gwp100 > r134a.gwp500);
        assert_eq!(Species::CO2.environmental().unwrap().gwp100, 1.0);
        assert!(Species::H2O.environmental().is_none());
    }

    #[test]
    fn water_molar_mass() {
        assert!((Species::H2O.molar_mass() - 0.018_015_268).abs() < 1e-12);
    }
}
