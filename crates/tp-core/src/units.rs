// tp-core/src/units.rs

use uom::si::f64::{
    MassDensity as UomMassDensity, MolarConcentration as UomMolarConcentration,
    Pressure as UomPressure, ThermodynamicTemperature as UomThermodynamicTemperature,
};

// Public canonical unit types (SI, f64)
pub type Density = UomMassDensity;
pub type MolarDensity = UomMolarConcentration;
pub type Pressure = UomPressure;
pub type Temperature = UomThermodynamicTemperature;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn kg_per_m3(v: f64) -> Density {
    use uom::si::mass_density::kilogram_per_cubic_meter;
    Density::new::<kilogram_per_cubic_meter>(v)
}

#[inline]
pub fn mol_per_m3(v: f64) -> MolarDensity {
    use uom::si::molar_concentration::mole_per_cubic_meter;
    MolarDensity::new::<mole_per_cubic_meter>(v)
}

pub mod constants {
    /// Molar gas constant [J/(mol·K)] (CODATA 2018, exact).
    pub const R_UNIVERSAL: f64 = 8.314_462_618;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_smoke() {
        let _p = pa(101_325.0);
        let _t = k(300.0);
        let _rho = kg_per_m3(996.0);
        let rho_m = mol_per_m3(55_000.0);
        assert_eq!(rho_m.value, 55_000.0);
    }
}
