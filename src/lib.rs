#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)]
//! SAFT-γ group contribution equations of state.
//!
//! Two variants of the theory are implemented, selected by cargo features:
//!
//! + [gamma_sw]: SAFT-γ with square-well bead interactions,
//! + [gamma_mie]: SAFT-γ Mie with Mie bead interactions.
//!
//! Both implement [Residual](saft_gamma_core::Residual) and can therefore be
//! used with the states, phase equilibrium solvers and batch functions of
//! [saft_gamma_core].

#[cfg(feature = "association")]
pub mod association;
pub mod hard_sphere;

// models
#[cfg(feature = "gamma_mie")]
pub mod gamma_mie;
#[cfg(feature = "gamma_sw")]
pub mod gamma_sw;
