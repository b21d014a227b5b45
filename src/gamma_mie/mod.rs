//! SAFT-γ Mie: group contribution SAFT with Mie bead interactions.
//!
//! [Papaioannou et al. (2014)](https://doi.org/10.1063/1.4851455),
//! [Dufal et al. (2015)](https://doi.org/10.1021/acs.jced.5b00335)
mod eos;
pub(crate) mod parameters;

pub use eos::{GammaMie, GammaMieOptions};
pub use parameters::{utils, GammaMieCrossRecord, GammaMieParameters, GammaMieRecord};
