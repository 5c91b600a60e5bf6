//! Fluid identifiers as accepted by the factory.
//!
//! Grammar, loosely:
//!
//! ```text
//! fluid_id  := [BACKEND "::"] component ("&" component)*
//! component := NAME | NAME "[" fraction "]" | NAME "-" percent "%"
//! ```

use crate::backends::{Solution, SolutionFamily};
use crate::error::{FluidError, FluidResult};
use crate::species::Species;

/// One `&`-separated entry of a fluid string.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub name: String,
    /// Fraction from a `[x]` or `-xx%` suffix, if any.
    pub amount: Option<f64>,
}

/// A parsed fluid identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct FluidString {
    /// Uppercased `BACKEND::` prefix.
    pub backend: Option<String>,
    pub components: Vec<Component>,
}

/// What a fluid string names once resolved against the built-in libraries.
#[derive(Debug, Clone, PartialEq)]
pub enum FluidKind {
    Pure(Species),
    Mixture(Vec<Species>),
    Solution(Solution),
}

impl FluidString {
    pub fn parse(fluid_id: &str) -> FluidResult<Self> {
        let unknown = || FluidError::UnknownFluid {
            id: fluid_id.to_string(),
        };
        let (backend, body) = match fluid_id.split_once("::") {
            Some((prefix, body)) => (Some(prefix.trim().to_uppercase()), body),
            None => (None, fluid_id),
        };
        if backend.as_deref() == Some("") {
            return Err(unknown());
        }
        let components = body
            .split('&')
            .map(|part| parse_component(part).ok_or_else(unknown))
            .collect::<FluidResult<Vec<_>>>()?;
        Ok(Self {
            backend,
            components,
        })
    }

    pub fn is_mixture(&self) -> bool {
        self.components.len() > 1
    }

    /// Fractions given inline; `None` unless every component carries one.
    pub fn fractions(&self) -> FluidResult<Option<Vec<f64>>> {
        let given: Vec<f64> = self.components.iter().filter_map(|c| c.amount).collect();
        if given.is_empty() {
            Ok(None)
        } else if given.len() == self.components.len() {
            Ok(Some(given))
        } else {
            Err(FluidError::InvalidArg {
                what: "either every mixture component or none carries a fraction",
            })
        }
    }

    /// Resolve names against the species and solution libraries.
    pub fn kind(&self) -> Option<FluidKind> {
        if let [only] = self.components.as_slice() {
            if let Ok(solution) = only.name.parse::<Solution>() {
                return Some(FluidKind::Solution(solution));
            }
            return only.name.parse::<Species>().ok().map(FluidKind::Pure);
        }
        self.components
            .iter()
            .map(|c| c.name.parse::<Species>().ok())
            .collect::<Option<Vec<_>>>()
            .map(FluidKind::Mixture)
    }

    /// Backend token implied by the string alone, for a `"?"` request.
    ///
    /// An explicit prefix wins, then a mixture separator, then a solution
    /// name, then a pure-fluid name.
    pub fn infer_backend(&self) -> Option<String> {
        if let Some(prefix) = &self.backend {
            return Some(prefix.clone());
        }
        match self.kind()? {
            FluidKind::Mixture(_) | FluidKind::Pure(_) => Some("HEOS".to_string()),
            FluidKind::Solution(s) => Some(s.family().token().to_string()),
        }
    }
}

fn parse_component(part: &str) -> Option<Component> {
    let part = part.trim();
    if let Some(rest) = part.strip_suffix(']') {
        let (name, amount) = rest.split_once('[')?;
        return named(name, amount.trim().parse().ok()?);
    }
    if let Some(rest) = part.strip_suffix('%') {
        let (name, percent) = rest.rsplit_once('-')?;
        let percent: f64 = percent.trim().parse().ok()?;
        return named(name, percent / 100.0);
    }
    if part.is_empty() {
        return None;
    }
    Some(Component {
        name: part.to_string(),
        amount: None,
    })
}

fn named(name: &str, amount: f64) -> Option<Component> {
    let name = name.trim();
    (!name.is_empty() && amount.is_finite()).then(|| Component {
        name: name.to_string(),
        amount: Some(amount),
    })
}

/// Library family a solution token belongs to, if `token` names one.
pub fn solution_family(token: &str) -> Option<SolutionFamily> {
    match token {
        "INCOMP" => Some(SolutionFamily::Incompressible),
        "BRINE" => Some(SolutionFamily::Brine),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_name() {
        let f = FluidString::parse("Water").unwrap();
        assert_eq!(f.backend, None);
        assert!(!f.is_mixture());
        assert_eq!(f.kind(), Some(FluidKind::Pure(Species::H2O)));
        assert_eq!(f.fractions().unwrap(), None);
    }

    #[test]
    fn prefix_is_split_and_uppercased() {
        let f = FluidString::parse("heos::R134a").unwrap();
        assert_eq!(f.backend.as_deref(), Some("HEOS"));
        assert_eq!(f.components[0].name, "R134a");
        assert!(FluidString::parse("::Water").is_err());
    }

    #[test]
    fn mixture_with_inline_fractions() {
        let f = FluidString::parse("Nitrogen[0.79]&Oxygen[0.21]").unwrap();
        assert!(f.is_mixture());
        assert_eq!(f.fractions().unwrap(), Some(vec![0.79, 0.21]));
        assert_eq!(
            f.kind(),
            Some(FluidKind::Mixture(vec![Species::N2, Species::O2]))
        );
    }

    #[test]
    fn partial_fractions_rejected() {
        let f = FluidString::parse("Nitrogen[0.79]&Oxygen").unwrap();
        assert!(matches!(f.fractions(), Err(FluidError::InvalidArg { .. })));
    }

    #[test]
    fn percent_and_bracket_concentrations() {
        let a = FluidString::parse("MEG-50%").unwrap();
        let b = FluidString::parse("MEG[0.5]").unwrap();
        assert_eq!(a.components, b.components);
        assert_eq!(a.kind(), Some(FluidKind::Solution(Solution::MEG)));
    }

    #[test]
    fn hyphenated_names_survive() {
        let f = FluidString::parse("n-Propane").unwrap();
        assert_eq!(f.kind(), Some(FluidKind::Pure(Species::Propane)));
    }

    #[test]
    fn malformed_components() {
        assert!(FluidString::parse("Water&").is_err());
        assert!(FluidString::parse("MEG-x%").is_err());
        assert!(FluidString::parse("[0.5]").is_err());
    }

    #[test]
    fn inference_order() {
        let infer = |s: &str| FluidString::parse(s).unwrap().infer_backend();
        assert_eq!(infer("INCOMP::Water").as_deref(), Some("INCOMP"));
        assert_eq!(infer("Methane&Ethane"), None);
        assert_eq!(infer("Methane&Nitrogen").as_deref(), Some("HEOS"));
        assert_eq!(infer("MEG-30%").as_deref(), Some("INCOMP"));
        assert_eq!(infer("NaCl-10%").as_deref(), Some("BRINE"));
        assert_eq!(infer("CO2").as_deref(), Some("HEOS"));
        assert_eq!(infer("Unobtainium"), None);
    }

    #[test]
    fn family_tokens() {
        assert_eq!(solution_family("INCOMP"), Some(SolutionFamily::Incompressible));
        assert_eq!(solution_family("BRINE"), Some(SolutionFamily::Brine));
        assert_eq!(solution_family("HEOS"), None);
    }
}
