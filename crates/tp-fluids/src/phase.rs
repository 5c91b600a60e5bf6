//! Phase tags and the predicates that gate single-phase calculations.

use crate::record::SimpleState;
use std::fmt;

/// Phase of a thermodynamic state.
///
/// A state that has not been classified yet carries no tag at all
/// (`Option<Phase>::None` in the state record), so every variant here is a
/// real classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    /// Subcritical liquid.
    Liquid,
    /// Subcritical gas (vapor).
    Gas,
    /// Above both the critical temperature and the critical pressure.
    Supercritical,
    /// Above the critical pressure, below the critical temperature.
    SupercriticalLiquid,
    /// Above the critical temperature, below the critical pressure.
    SupercriticalGas,
    /// Vapor-liquid coexistence.
    TwoPhase,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Liquid,
        Phase::Gas,
        Phase::Supercritical,
        Phase::SupercriticalLiquid,
        Phase::SupercriticalGas,
        Phase::TwoPhase,
    ];

    /// Liquid, gas or any supercritical variant.
    pub const fn is_homogeneous(self) -> bool {
        !self.is_two_phase()
    }

    pub const fn is_two_phase(self) -> bool {
        matches!(self, Phase::TwoPhase)
    }

    pub const fn is_supercritical(self) -> bool {
        matches!(
            self,
            Phase::Supercritical | Phase::SupercriticalLiquid | Phase::SupercriticalGas
        )
    }

    /// Single-phase classification against a critical-point snapshot.
    ///
    /// Never yields [`Phase::TwoPhase`]: deciding coexistence needs a flash
    /// calculation, which this helper does not perform. Below the critical
    /// temperature and pressure the state is a liquid when denser than the
    /// critical density.
    pub fn classify_single_phase(t: f64, p: f64, rhomolar: f64, critical: &SimpleState) -> Phase {
        let above_t = t > critical.t;
        let above_p = p > critical.p;
        match (above_t, above_p) {
            (true, true) => Phase::Supercritical,
            (true, false) => Phase::SupercriticalGas,
            (false, true) => Phase::SupercriticalLiquid,
            (false, false) if rhomolar > critical.rhomolar => Phase::Liquid,
            (false, false) => Phase::Gas,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Liquid => "liquid",
            Phase::Gas => "gas",
            Phase::Supercritical => "supercritical",
            Phase::SupercriticalLiquid => "supercritical liquid",
            Phase::SupercriticalGas => "supercritical gas",
            Phase::TwoPhase => "two-phase",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Caller overrides for automatic phase classification near phase boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseForcing {
    #[default]
    Automatic,
    SinglePhase,
    TwoPhase,
}

impl PhaseForcing {
    /// Apply the override to the backend's own classification.
    ///
    /// A forced single phase that the backend reported as two-phase resolves
    /// to liquid or gas by comparing the density with the critical density.
    pub fn apply(self, classified: Phase, rhomolar: f64, critical: &SimpleState) -> Phase {
        match self {
            PhaseForcing::Automatic => classified,
            PhaseForcing::TwoPhase => Phase::TwoPhase,
            PhaseForcing::SinglePhase if classified.is_two_phase() => {
                if rhomolar >= critical.rhomolar {
                    Phase::Liquid
                } else {
                    Phase::Gas
                }
            }
            PhaseForcing::SinglePhase => classified,
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn single_phase_classification_is_homogeneous(
            t in 1.0_f64..2000.0,
            p in 1.0_f64..1e8,
            rho in 1e-3_f64..1e5,
        ) {
            let c = SimpleState::new(647.096, 22.064e6, 17_873.7);
            prop_assert!(Phase::classify_single_phase(t, p, rho, &c).is_homogeneous());
        }
    }
}
