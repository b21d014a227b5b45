#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)]
//! Core functionalities of the `saft-gamma` project.
//!
//! The crate provides everything that is independent of a specific group
//! contribution model: parameter records and mixing rules, composition
//! variables and their cache, the [Residual] trait, thermodynamic states,
//! density and phase equilibrium solvers and the batch evaluation of
//! independent state points.

pub mod batch;
mod composition;
pub mod constants;
mod density;
mod density_iteration;
mod equation_of_state;
mod errors;
pub mod parameter;
mod phase_equilibria;
mod state;

pub use composition::{validate_molefracs, CompositionCache, CompositionVariables};
pub use density::{check_density, check_temperature, IntoDensities};
pub use density_iteration::{density_iteration, pressure_spinodal};
pub use equation_of_state::Residual;
pub use errors::{EosError, EosResult};
pub use phase_equilibria::{PhaseEquilibrium, SolverOptions};
pub use state::{DensityInitialization, State};
