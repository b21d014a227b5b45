#![allow(clippy::excessive_precision)]
#[cfg(feature = "gamma_sw")]
mod helmholtz_energy;
#[cfg(feature = "gamma_sw")]
mod parameters;
#[cfg(feature = "gamma_sw")]
mod phase_equilibria;
