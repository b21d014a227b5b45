//! Description of a thermodynamic state.
//!
//! A thermodynamic state is defined by temperature, molar density and
//! mole fractions. All properties are evaluated from derivatives of the
//! residual Helmholtz energy, obtained with dual numbers.
use crate::composition::CompositionVariables;
use crate::constants::RGAS;
use crate::density_iteration::density_iteration;
use crate::equation_of_state::Residual;
use crate::errors::{EosError, EosResult};
use ndarray::Array1;
use std::fmt;
use std::sync::Arc;

mod properties;

/// Initial values in a density iteration.
#[derive(Clone, Copy, Debug)]
pub enum DensityInitialization {
    /// Calculate a vapor phase by initializing using the ideal gas.
    Vapor,
    /// Calculate a liquid phase by using the maximum density.
    Liquid,
    /// Use the given density (mol/m³) as initial value.
    InitialDensity(f64),
    /// Calculate the most stable phase by calculating both a vapor and a liquid
    /// and return the one with the lower molar Gibbs energy.
    None,
}

/// Thermodynamic state of the system.
pub struct State<E> {
    /// Equation of state
    pub eos: Arc<E>,
    /// Temperature in K
    pub temperature: f64,
    /// Molar density in mol/m³
    pub density: f64,
    /// Mole fractions
    pub molefracs: Array1<f64>,
    composition: Arc<CompositionVariables<f64>>,
}

impl<E> Clone for State<E> {
    fn clone(&self) -> Self {
        Self {
            eos: self.eos.clone(),
            temperature: self.temperature,
            density: self.density,
            molefracs: self.molefracs.clone(),
            composition: self.composition.clone(),
        }
    }
}

impl<E> fmt::Display for State<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "T = {:.5} K, ρ = {:.5} mol/m³, x = {:.5}",
            self.temperature, self.density, self.molefracs
        )
    }
}

impl<E: Residual> State<E> {
    /// Return a new `State` given a temperature, density and mole fractions.
    pub fn new_nvt(
        eos: &Arc<E>,
        temperature: f64,
        density: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<Self> {
        if !(temperature.is_finite() && temperature > 0.0) {
            return Err(EosError::InvalidState(
                String::from("State::new_nvt"),
                String::from("temperature"),
                temperature,
            ));
        }
        if !(density.is_finite() && density > 0.0) {
            return Err(EosError::InvalidState(
                String::from("State::new_nvt"),
                String::from("density"),
                density,
            ));
        }
        let composition = eos.composition(molefracs)?;
        Ok(Self {
            eos: eos.clone(),
            temperature,
            density,
            molefracs: molefracs.clone(),
            composition,
        })
    }

    /// Return a new `State` for a pure component (or fixed composition)
    /// at a different density.
    pub fn update_density(&self, density: f64) -> EosResult<Self> {
        Self::new_nvt(&self.eos, self.temperature, density, &self.molefracs)
    }

    /// Return a new `State` for given pressure (in Pa) and temperature.
    pub fn new_npt(
        eos: &Arc<E>,
        temperature: f64,
        pressure: f64,
        molefracs: &Array1<f64>,
        density_initialization: DensityInitialization,
    ) -> EosResult<Self> {
        // calculate state from initial density or given phase
        match density_initialization {
            DensityInitialization::InitialDensity(rho0) => {
                return density_iteration(eos, temperature, pressure, molefracs, rho0)
            }
            DensityInitialization::Vapor => {
                return density_iteration(
                    eos,
                    temperature,
                    pressure,
                    molefracs,
                    pressure / temperature / RGAS,
                )
            }
            DensityInitialization::Liquid => {
                return density_iteration(
                    eos,
                    temperature,
                    pressure,
                    molefracs,
                    eos.density_max(molefracs, temperature)?,
                )
            }
            DensityInitialization::None => (),
        }

        // calculate stable phase
        let max_density = eos.density_max(molefracs, temperature)?;
        let liquid = density_iteration(eos, temperature, pressure, molefracs, max_density);

        if pressure < max_density * temperature * RGAS {
            let vapor = density_iteration(
                eos,
                temperature,
                pressure,
                molefracs,
                pressure / temperature / RGAS,
            );
            match (liquid, vapor) {
                (Ok(l), Err(_)) => Ok(l),
                (Err(_), Ok(v)) => Ok(v),
                (Ok(l), Ok(v)) => {
                    if l.residual_molar_gibbs_energy() > v.residual_molar_gibbs_energy() {
                        Ok(v)
                    } else {
                        Ok(l)
                    }
                }
                (Err(e), Err(_)) => Err(e),
            }
        } else {
            liquid
        }
    }

    /// The cached segment variables of the state's composition.
    pub fn composition(&self) -> &CompositionVariables<f64> {
        &self.composition
    }
}
