//! Build a backend from a backend token and a fluid string.

use crate::backend::FluidBackend;
use crate::backends::{
    CoolPropBackend, HelmholtzBackend, IncompressibleBackend, TableConfig, TableKind,
    TabularBackend,
};
use crate::error::{FluidError, FluidResult};
use crate::fluid_string::{FluidKind, FluidString, solution_family};
use tracing::{debug, info};

/// Backend tokens the factory recognises, base engines first.
pub const BACKEND_TOKENS: [&str; 8] = [
    "HEOS", "COOLPROP", "INCOMP", "BRINE", "REFPROP", "TTSE&<base>", "BICUBIC&<base>", "?",
];

/// Construct a backend with default table settings.
///
/// `backend_id` is a base token (`"HEOS"`), a table wrapper over a base
/// (`"TTSE&HEOS"`), or `"?"` to infer the engine from `fluid_id`.
pub fn construct(backend_id: &str, fluid_id: &str) -> FluidResult<Box<dyn FluidBackend>> {
    construct_with_config(backend_id, fluid_id, &TableConfig::default())
}

/// Construct a backend; `config` only matters for table wrappers.
pub fn construct_with_config(
    backend_id: &str,
    fluid_id: &str,
    config: &TableConfig,
) -> FluidResult<Box<dyn FluidBackend>> {
    let fluid = FluidString::parse(fluid_id)?;
    let requested = backend_id.trim().to_uppercase();
    let token = match (requested.as_str(), &fluid.backend) {
        ("?", _) => fluid.infer_backend().ok_or_else(|| FluidError::UnknownFluid {
            id: fluid_id.to_string(),
        })?,
        (_, Some(prefix)) if !prefix_matches(prefix, &requested) => {
            return Err(FluidError::InvalidArg {
                what: "fluid prefix contradicts the requested backend",
            });
        }
        _ => requested.clone(),
    };
    debug!(backend = %token, fluid = fluid_id, "constructing backend");

    let backend = match token.split_once('&') {
        Some((wrapper, base)) => {
            let kind = match wrapper {
                "TTSE" => TableKind::Ttse,
                "BICUBIC" => TableKind::Bicubic,
                _ => return Err(FluidError::UnknownBackend { id: token.clone() }),
            };
            if !matches!(base, "HEOS" | "COOLPROP") {
                if is_base_token(base) {
                    return Err(FluidError::NotSupported {
                        what: "tables over this base backend",
                    });
                }
                return Err(FluidError::UnknownBackend { id: token.clone() });
            }
            let base = construct_base(base, &fluid, fluid_id)?;
            Box::new(TabularBackend::new(kind, base, config.clone())) as Box<dyn FluidBackend>
        }
        None => construct_base(&token, &fluid, fluid_id)?,
    };
    info!(backend = backend.backend_name(), fluid = %backend.name(), "backend ready");
    Ok(backend)
}

/// A `BACKEND::` prefix agrees with the request when it names the requested
/// backend or, for a table wrapper, the wrapped base.
fn prefix_matches(prefix: &str, requested: &str) -> bool {
    prefix == requested || requested.split_once('&').is_some_and(|(_, base)| base == prefix)
}

fn is_base_token(token: &str) -> bool {
    matches!(token, "HEOS" | "COOLPROP" | "INCOMP" | "BRINE" | "REFPROP")
}

fn construct_base(
    token: &str,
    fluid: &FluidString,
    fluid_id: &str,
) -> FluidResult<Box<dyn FluidBackend>> {
    let unknown = || FluidError::UnknownFluid {
        id: fluid_id.to_string(),
    };
    match token {
        "HEOS" => {
            let components = match fluid.kind() {
                Some(FluidKind::Pure(species)) => vec![species],
                Some(FluidKind::Mixture(species)) => species,
                _ => return Err(unknown()),
            };
            let mut backend = HelmholtzBackend::new(components)?;
            if let Some(x) = fluid.fractions()? {
                backend.set_mole_fractions(&x)?;
            }
            Ok(Box::new(backend))
        }
        "COOLPROP" => match fluid.kind() {
            Some(FluidKind::Pure(species)) => Ok(Box::new(CoolPropBackend::new(species))),
            Some(FluidKind::Mixture(_)) => Err(FluidError::NotSupported {
                what: "mixtures through the CoolProp bridge",
            }),
            _ => Err(unknown()),
        },
        "INCOMP" | "BRINE" => {
            let Some(FluidKind::Solution(solution)) = fluid.kind() else {
                return Err(unknown());
            };
            if solution_family(token) != Some(solution.family()) {
                return Err(unknown());
            }
            let x = fluid
                .components
                .first()
                .and_then(|c| c.amount)
                .ok_or(FluidError::InvalidArg {
                    what: "solution concentration missing, e.g. MEG-30%",
                })?;
            Ok(Box::new(IncompressibleBackend::new(solution, x)?))
        }
        "REFPROP" => Err(FluidError::NotSupported {
            what: "REFPROP backend, no REFPROP library is linked",
        }),
        _ => Err(FluidError::UnknownBackend {
            id: token.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tokens() {
        assert!(matches!(
            construct("NOPE", "Water"),
            Err(FluidError::UnknownBackend { id }) if id == "NOPE"
        ));
        assert!(matches!(
            construct("LUT&HEOS", "Water"),
            Err(FluidError::UnknownBackend { .. })
        ));
        assert!(matches!(
            construct("HEOS", "Unobtainium"),
            Err(FluidError::UnknownFluid { .. })
        ));
        assert!(matches!(
            construct("?", "Unobtainium"),
            Err(FluidError::UnknownFluid { .. })
        ));
    }

    #[test]
    fn refprop_is_recognised_but_unsupported() {
        assert!(matches!(
            construct("REFPROP", "Water"),
            Err(FluidError::NotSupported { .. })
        ));
    }

    #[test]
    fn tables_need_a_helmholtz_like_base() {
        assert!(matches!(
            construct("TTSE&INCOMP", "MEG-30%"),
            Err(FluidError::NotSupported { .. })
        ));
    }

    #[test]
    fn token_case_is_ignored() {
        let b = construct("heos", "water").unwrap();
        assert_eq!(b.backend_name(), "HEOS");
    }

    #[test]
    fn prefix_conflict() {
        assert!(matches!(
            construct("INCOMP", "HEOS::Water"),
            Err(FluidError::InvalidArg { .. })
        ));
        assert!(construct("HEOS", "HEOS::Water").is_ok());
        assert!(matches!(
            construct("TTSE&HEOS", "COOLPROP::Water"),
            Err(FluidError::InvalidArg { .. })
        ));
    }

    #[test]
    fn prefix_may_name_the_wrapped_base() {
        let b = construct("TTSE&HEOS", "HEOS::Water").unwrap();
        assert_eq!(b.backend_name(), "TTSE&HEOS");
        assert!(construct("bicubic&heos", "heos::Water").is_ok());
        assert!(prefix_matches("TTSE&HEOS", "TTSE&HEOS"));
        assert!(!prefix_matches("TTSE", "TTSE&HEOS"));
    }

    #[test]
    fn solutions_need_a_concentration_and_the_right_family() {
        assert!(matches!(
            construct("INCOMP", "MEG"),
            Err(FluidError::InvalidArg { .. })
        ));
        assert!(matches!(
            construct("INCOMP", "NaCl-10%"),
            Err(FluidError::UnknownFluid { .. })
        ));
        let brine = construct("BRINE", "NaCl-10%").unwrap();
        assert_eq!(brine.backend_name(), "BRINE");
    }

    #[test]
    fn mixture_fractions_applied() {
        let b = construct("HEOS", "Nitrogen[0.79]&Oxygen[0.21]").unwrap();
        let x = b.fractions();
        assert_eq!(x.len(), 2);
        assert!((x[0] - 0.79).abs() < 1e-12 && (x[1] - 0.21).abs() < 1e-12);
        assert_eq!(b.name(), "Nitrogen&Oxygen");
    }

    #[test]
    fn coolprop_rejects_mixtures() {
        assert!(matches!(
            construct("COOLPROP", "Nitrogen&Oxygen"),
            Err(FluidError::NotSupported { .. })
        ));
        let b = construct("COOLPROP", "Nitrogen").unwrap();
        assert_eq!(b.backend_name(), "COOLPROP");
    }
}
