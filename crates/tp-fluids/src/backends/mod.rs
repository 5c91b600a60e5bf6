//! Concrete backends behind [`FluidBackend`](crate::backend::FluidBackend).

pub mod coolprop;
pub mod helmholtz;
pub mod incompressible;
pub mod tabular;

pub use coolprop::CoolPropBackend;
pub use helmholtz::HelmholtzBackend;
pub use incompressible::{IncompressibleBackend, Solution, SolutionFamily};
pub use tabular::{PropertyTable, TableConfig, TableKind, TabularBackend};
