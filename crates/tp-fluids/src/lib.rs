//! tp-fluids: backend-agnostic thermophysical state objects.
//!
//! Provides:
//! - the [`FluidBackend`] capability contract with memoized accessors
//! - cache cells and the per-state record ([`CachedValue`], [`StateCore`])
//! - a τ/δ derivative engine for generic partial derivatives
//! - phase tags and forcing
//! - a factory that turns `("HEOS", "Water")`-style requests into backends
//! - compact reference backends: Helmholtz, incompressible, table wrappers and
//!   a CoolProp bridge (via `rfluids`)
//!
//! # Example
//!
//! ```no_run
//! use tp_fluids::{Parameter, StateInput, construct};
//! use tp_core::units::{k, pa};
//!
//! let mut water = construct("HEOS", "Water").unwrap();
//! water
//!     .update(StateInput::PT { p: pa(101_325.0), t: k(300.0) })
//!     .unwrap();
//! let rho = water.rhomass().unwrap();
//! let dp_dt = water
//!     .first_partial_deriv(Parameter::P, Parameter::T, Parameter::Dmolar)
//!     .unwrap();
//! println!("rho = {rho} kg/m³, (dP/dT)_rho = {dp_dt} Pa/K");
//! ```

pub mod backend;
pub mod backends;
pub mod cached;
pub mod composition;
pub mod derivatives;
pub mod error;
pub mod factory;
pub mod fluid_string;
pub mod params;
pub mod phase;
pub mod record;
pub mod species;
pub mod units;

// Re-exports for ergonomics
pub use backend::FluidBackend;
pub use backends::{
    CoolPropBackend, HelmholtzBackend, IncompressibleBackend, Solution, TableConfig, TableKind,
    TabularBackend,
};
pub use cached::CachedValue;
pub use error::{FluidError, FluidResult};
pub use factory::{construct, construct_with_config};
pub use fluid_string::FluidString;
pub use params::{Parameter, StateInput};
pub use phase::{Phase, PhaseForcing};
pub use record::{
    AlphaDeriv, AlphaLimit, LimitTerms, PropertyCache, SimpleState, StateCore, StateRecord,
};
pub use species::{Environmental, Species};
pub use units::{Quantity, UnitError, parse_quantity};
