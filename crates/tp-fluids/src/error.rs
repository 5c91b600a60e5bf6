//! Fluid property errors.

use crate::phase::Phase;
use thiserror::Error;
use tp_core::TpError;

/// Result type for fluid operations.
pub type FluidResult<T> = Result<T, FluidError>;

/// Errors that can occur during fluid property calculations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FluidError {
    /// The backend does not override the hook behind this accessor.
    ///
    /// Recoverable: the cache slot stays unset, so the caller may retry with
    /// another backend.
    #[error("{hook} is not implemented for the {backend} backend")]
    NotImplemented { hook: &'static str, backend: String },

    /// A single-phase relation was requested outside a homogeneous phase.
    #[error("Operation requires a homogeneous phase, state is {phase}")]
    NonHomogeneous { phase: Phase },

    /// Backend token not recognised by the factory.
    #[error("Unknown backend: {id}")]
    UnknownBackend { id: String },

    /// Fluid name not found in the selected backend's library.
    #[error("Unknown fluid: {id}")]
    UnknownFluid { id: String },

    /// Non-physical values (negative density, pressure, etc.).
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    /// Value out of valid range.
    #[error("Value out of range for {what}")]
    OutOfRange { what: &'static str },

    /// Invalid argument.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Operation not supported (e.g., mixtures, unlinked libraries).
    #[error("Not supported: {what}")]
    NotSupported { what: &'static str },

    /// Backend (CoolProp) error.
    #[error("Backend error: {message}")]
    Backend { message: String },

    /// Convergence failure (e.g., solving for density given P,T).
    #[error("Convergence failed for {what}")]
    ConvergenceFailed { what: &'static str },

    #[error(transparent)]
    Core(#[from] TpError),
}

impl FluidError {
    /// True for the capability-gap error, which callers may recover from by
    /// switching backends.
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, FluidError::NotImplemented { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FluidError::NonPhysical { what: "pressure" };
        assert!(err.to_string().contains("pressure"));

        let err = FluidError::NotImplemented {
            hook: "calc_viscosity",
            backend: "HEOS".into(),
        };
        assert_eq!(
            err.to_string(),
            "calc_viscosity is not implemented for the HEOS backend"
        );
        assert!(err.is_not_implemented());
    }

    #[test]
    fn phase_in_message() {
        let err = FluidError::NonHomogeneous {
            phase: Phase::TwoPhase,
        };
        assert!(err.to_string().contains("two-phase"));
        assert!(!err.is_not_implemented());
    }

    #[test]
    fn core_error_converts() {
        let core = TpError::NonFinite {
            what: "temperature",
            value: f64::NAN,
        };
        let err: FluidError = core.into();
        assert!(matches!(err, FluidError::Core(_)));
    }
}
