//! Quantity strings from the command line, converted to SI base units.
//!
//! The state core only ever sees SI values; this is the one place where
//! `"25 C"`, `"1 bar"` or `"50%"` are accepted.

use thiserror::Error;

/// Dimension a quantity string is parsed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    /// Canonical: K
    Temperature,
    /// Canonical: Pa (absolute)
    Pressure,
    /// Canonical: kg/m³
    Density,
    /// Canonical: mol/m³
    MolarDensity,
    /// Plain number or percent
    Dimensionless,
}

impl Quantity {
    fn label(self) -> &'static str {
        match self {
            Quantity::Temperature => "temperature",
            Quantity::Pressure => "pressure",
            Quantity::Density => "density",
            Quantity::MolarDensity => "molar density",
            Quantity::Dimensionless => "dimensionless value",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    #[error("Could not parse a number from '{0}'")]
    Parse(String),

    #[error("Unknown unit '{unit}' for {quantity}")]
    UnknownUnit { unit: String, quantity: &'static str },

    #[error("Ambiguous unit '{unit}': {hint}")]
    AmbiguousUnit { unit: String, hint: &'static str },

    #[error("Value {value} out of range: {reason}")]
    OutOfRange { value: f64, reason: &'static str },
}

/// Parse `raw` as `quantity` and return the SI value.
///
/// A bare number is taken to already be in SI units.
pub fn parse_quantity(raw: &str, quantity: Quantity) -> Result<f64, UnitError> {
    let raw = raw.trim();
    match quantity {
        Quantity::Temperature => parse_temperature(raw),
        Quantity::Pressure => parse_pressure(raw),
        Quantity::Density => parse_density(raw),
        Quantity::MolarDensity => parse_molar_density(raw),
        Quantity::Dimensionless => parse_dimensionless(raw),
    }
}

fn unknown(unit: &str, quantity: Quantity) -> UnitError {
    UnitError::UnknownUnit {
        unit: unit.to_string(),
        quantity: quantity.label(),
    }
}

fn parse_temperature(input: &str) -> Result<f64, UnitError> {
    let (value, unit) = split_value_and_unit(input)?;
    let kelvin = match unit.to_lowercase().as_str() {
        "" | "k" | "kelvin" => value,
        "c" | "°c" | "degc" | "celsius" => value + 273.15,
        "f" | "°f" | "degf" | "fahrenheit" => (value + 459.67) * 5.0 / 9.0,
        "r" | "°r" | "rankine" => value * 5.0 / 9.0,
        _ => return Err(unknown(&unit, Quantity::Temperature)),
    };
    if kelvin <= 0.0 {
        return Err(UnitError::OutOfRange {
            value: kelvin,
            reason: "absolute temperature must be > 0 K",
        });
    }
    Ok(kelvin)
}

fn parse_pressure(input: &str) -> Result<f64, UnitError> {
    let (value, unit) = split_value_and_unit(input)?;
    let pa = match unit.to_lowercase().as_str() {
        "" | "pa" => value,
        "kpa" => value * 1e3,
        "mpa" => value * 1e6,
        "bar" => value * 1e5,
        "mbar" => value * 100.0,
        "atm" => value * 101_325.0,
        "psia" => value * 6_894.757,
        "psi" => {
            return Err(UnitError::AmbiguousUnit {
                unit,
                hint: "use 'psia'; gauge pressure is not accepted",
            });
        }
        _ => return Err(unknown(&unit, Quantity::Pressure)),
    };
    if pa <= 0.0 {
        return Err(UnitError::OutOfRange {
            value: pa,
            reason: "absolute pressure must be positive",
        });
    }
    Ok(pa)
}

fn parse_density(input: &str) -> Result<f64, UnitError> {
    let (value, unit) = split_value_and_unit(input)?;
    let kg_m3 = match unit.to_lowercase().as_str() {
        "" | "kg/m3" | "kg/m^3" | "kg/m³" => value,
        "g/cm3" | "g/cm^3" | "g/cm³" | "kg/l" => value * 1e3,
        "g/l" => value,
        "lbm/ft3" | "lbm/ft^3" => value * 16.018_46,
        _ => return Err(unknown(&unit, Quantity::Density)),
    };
    if kg_m3 <= 0.0 {
        return Err(UnitError::OutOfRange {
            value: kg_m3,
            reason: "density must be positive",
        });
    }
    Ok(kg_m3)
}

fn parse_molar_density(input: &str) -> Result<f64, UnitError> {
    let (value, unit) = split_value_and_unit(input)?;
    let mol_m3 = match unit.to_lowercase().as_str() {
        "" | "mol/m3" | "mol/m^3" | "mol/m³" => value,
        "mol/l" | "kmol/m3" | "kmol/m^3" | "kmol/m³" => value * 1e3,
        _ => return Err(unknown(&unit, Quantity::MolarDensity)),
    };
    if mol_m3 <= 0.0 {
        return Err(UnitError::OutOfRange {
            value: mol_m3,
            reason: "molar density must be positive",
        });
    }
    Ok(mol_m3)
}

fn parse_dimensionless(input: &str) -> Result<f64, UnitError> {
    let (text, scale) = match input.strip_suffix('%') {
        Some(number) => (number.trim(), 0.01),
        None => (input, 1.0),
    };
    let value: f64 = text
        .parse()
        .map_err(|_| UnitError::Parse(input.to_string()))?;
    Ok(value * scale)
}

/// `"14.7 psia"` -> `(14.7, "psia")`, `"300"` -> `(300.0, "")`.
fn split_value_and_unit(input: &str) -> Result<(f64, String), UnitError> {
    let trimmed = input.trim();
    let split_idx = trimmed
        .char_indices()
        .find(|&(i, c)| !is_number_char(trimmed, i, c))
        .map_or(trimmed.len(), |(i, _)| i);
    let (num, unit) = trimmed.split_at(split_idx);
    let value: f64 = num
        .trim()
        .parse()
        .map_err(|_| UnitError::Parse(input.to_string()))?;
    if !value.is_finite() {
        return Err(UnitError::Parse(input.to_string()));
    }
    Ok((value, unit.trim().to_string()))
}

/// An `e`/`E` only counts as an exponent when a digit or sign follows it.
fn is_number_char(s: &str, i: usize, c: char) -> bool {
    match c {
        '0'..='9' | '.' | '-' | '+' => true,
        'e' | 'E' => s[i + 1..]
            .chars()
            .next()
            .is_some_and(|n| n.is_ascii_digit() || n == '-' || n == '+'),
        _ => false,
    }
}
