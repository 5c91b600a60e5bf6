//! tp-core: stable numeric foundation for thermoprop.
//!
//! Contains:
//! - units (uom SI types + constructors, molar quantities, gas constant)
//! - numeric (Real + tolerances + float helpers)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{TpError, TpResult};
pub use numeric::*;
pub use units::*;
