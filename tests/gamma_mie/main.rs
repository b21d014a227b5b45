#![allow(clippy::excessive_precision)]
#[cfg(feature = "gamma_mie")]
mod helmholtz_energy;
#[cfg(feature = "gamma_mie")]
mod vle_pure;
