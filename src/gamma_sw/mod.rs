//! SAFT-γ with square-well interactions between the beads (SAFT-γ SW).
//!
//! [Lymperiadis et al. (2007)](https://doi.org/10.1063/1.2813894),
//! [Lymperiadis et al. (2008)](https://doi.org/10.1016/j.fluid.2008.08.005)
mod eos;
pub(crate) mod parameters;

pub use eos::{GammaSw, GammaSwOptions, PackingMode};
pub use parameters::{utils, GammaSwCrossRecord, GammaSwParameters, GammaSwRecord};
