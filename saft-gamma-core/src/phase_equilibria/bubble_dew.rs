use super::{single_component, PhaseEquilibrium, SolverOptions};
use crate::constants::RGAS;
use crate::equation_of_state::Residual;
use crate::errors::{EosError, EosResult};
use crate::state::{DensityInitialization, State};
use ndarray::Array1;
use std::sync::Arc;
use tracing::debug;

const MAX_ITER_BD: usize = 200;
const TOL_BD: f64 = 1e-10;

/// Which phase composition is specified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Specification {
    Bubble,
    Dew,
}

/// # Bubble and dew point calculations
impl<E: Residual> PhaseEquilibrium<E> {
    /// Calculate the bubble point pressure and the incipient vapor composition
    /// of a liquid with composition `liquid_molefracs` at the given temperature.
    ///
    /// If only one mole fraction is nonzero, the pure component saturation
    /// point is returned.
    pub fn bubble_point(
        eos: &Arc<E>,
        temperature: f64,
        liquid_molefracs: &Array1<f64>,
        pressure_init: Option<f64>,
        options: SolverOptions,
    ) -> EosResult<Self> {
        Self::bubble_dew_point(
            eos,
            temperature,
            liquid_molefracs,
            pressure_init,
            options,
            Specification::Bubble,
        )
    }

    /// Calculate the dew point pressure and the incipient liquid composition
    /// of a vapor with composition `vapor_molefracs` at the given temperature.
    ///
    /// If only one mole fraction is nonzero, the pure component saturation
    /// point is returned.
    pub fn dew_point(
        eos: &Arc<E>,
        temperature: f64,
        vapor_molefracs: &Array1<f64>,
        pressure_init: Option<f64>,
        options: SolverOptions,
    ) -> EosResult<Self> {
        Self::bubble_dew_point(
            eos,
            temperature,
            vapor_molefracs,
            pressure_init,
            options,
            Specification::Dew,
        )
    }

    fn bubble_dew_point(
        eos: &Arc<E>,
        temperature: f64,
        molefracs_spec: &Array1<f64>,
        pressure_init: Option<f64>,
        options: SolverOptions,
        spec: Specification,
    ) -> EosResult<Self> {
        eos.composition(molefracs_spec)?;
        if single_component(molefracs_spec).is_some() {
            return Self::pure(eos, temperature, molefracs_spec, options);
        }
        let (max_iter, tol) = options.unwrap_or(MAX_ITER_BD, TOL_BD);

        let (p0, x0) = match spec {
            Specification::Bubble => {
                Self::starting_pressure_ideal_gas_bubble(eos, temperature, molefracs_spec)?
            }
            Specification::Dew => {
                Self::starting_pressure_ideal_gas_dew(eos, temperature, molefracs_spec)?
            }
        };
        let pressure = pressure_init.unwrap_or(p0);
        if !(pressure.is_finite() && pressure > 0.0) {
            return Err(EosError::InvalidState(
                String::from("bubble/dew point"),
                String::from("pressure"),
                pressure,
            ));
        }
        Self::iterate_bubble_dew(
            eos,
            temperature,
            pressure,
            molefracs_spec,
            x0,
            max_iter,
            tol,
            spec,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn iterate_bubble_dew(
        eos: &Arc<E>,
        temperature: f64,
        mut pressure: f64,
        molefracs_spec: &Array1<f64>,
        mut molefracs_var: Array1<f64>,
        max_iter: usize,
        tol: f64,
        spec: Specification,
    ) -> EosResult<Self> {
        let (mut rho_spec, mut rho_var) = match spec {
            Specification::Bubble => (DensityInitialization::Liquid, DensityInitialization::Vapor),
            Specification::Dew => (DensityInitialization::Vapor, DensityInitialization::Liquid),
        };

        for i in 1..=max_iter {
            let state_spec = State::new_npt(eos, temperature, pressure, molefracs_spec, rho_spec)?;
            let state_var = State::new_npt(eos, temperature, pressure, &molefracs_var, rho_var)?;
            if Self::is_trivial_solution(&state_spec, &state_var) {
                return Err(EosError::TrivialSolution);
            }

            // K values defined as y / x
            let (liquid, vapor) = match spec {
                Specification::Bubble => (&state_spec, &state_var),
                Specification::Dew => (&state_var, &state_spec),
            };
            let k = (liquid.ln_phi() - vapor.ln_phi()).mapv(f64::exp);

            let (sum, pressure_new) = match spec {
                Specification::Bubble => {
                    let y = &k * molefracs_spec;
                    let s = y.sum();
                    molefracs_var = y / s;
                    (s, pressure * s)
                }
                Specification::Dew => {
                    let x = molefracs_spec / &k;
                    let s = x.sum();
                    molefracs_var = x / s;
                    (s, pressure / s)
                }
            };
            if !pressure_new.is_finite() {
                return Err(EosError::IterationFailed("bubble_dew_point".to_owned()));
            }

            let res = (sum - 1.0).abs();
            debug!(
                "bubble/dew point {:4}: residual = {:e}, p = {:e} Pa, x = {:.8}",
                i, res, pressure_new, molefracs_var
            );
            if res < tol {
                debug!(
                    "PhaseEquilibrium::bubble_dew_point: calculation converged in {} step(s)",
                    i
                );
                let state_var = State::new_npt(
                    eos,
                    temperature,
                    pressure_new,
                    &molefracs_var,
                    DensityInitialization::InitialDensity(state_var.density),
                )?;
                let state_spec = state_spec.update_pressure(pressure_new)?;
                let vle = match spec {
                    Specification::Bubble => Self([state_var, state_spec]),
                    Specification::Dew => Self([state_spec, state_var]),
                };
                return vle.check_trivial_solution();
            }
            rho_spec = DensityInitialization::InitialDensity(state_spec.density);
            rho_var = DensityInitialization::InitialDensity(state_var.density);
            pressure = pressure_new;
        }
        Err(EosError::NotConverged("bubble_dew_point".to_owned()))
    }

    fn starting_pressure_ideal_gas_dew(
        eos: &Arc<E>,
        temperature: f64,
        vapor_molefracs: &Array1<f64>,
    ) -> EosResult<(f64, Array1<f64>)> {
        let rt = RGAS * temperature;
        let mut p: Option<f64> = None;
        let mut x = vapor_molefracs.clone();
        for _ in 0..5 {
            let density = 0.75 * eos.density_max(&x, temperature)?;
            let liquid = State::new_nvt(eos, temperature, density, &x)?;
            let z = liquid.compressibility();
            let k = vapor_molefracs / (liquid.residual_chemical_potential() / rt - z).mapv(f64::exp);
            let p_new = rt * density / k.sum();
            x = &k / k.sum();
            if let Some(p_old) = p {
                if ((p_new - p_old) / p_old).abs() < 1e-5 {
                    p = Some(p_new);
                    break;
                }
            }
            p = Some(p_new);
        }
        match p {
            Some(p) if p.is_finite() && p > 0.0 => Ok((p, x)),
            _ => Err(EosError::IterationFailed(
                "starting_pressure_ideal_gas_dew".to_owned(),
            )),
        }
    }
}

impl<E: Residual> State<E> {
    fn update_pressure(&self, pressure: f64) -> EosResult<Self> {
        Self::new_npt(
            &self.eos,
            self.temperature,
            pressure,
            &self.molefracs,
            DensityInitialization::InitialDensity(self.density),
        )
    }
}
