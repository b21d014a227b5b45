use super::{PhaseEquilibrium, SolverOptions};
use crate::equation_of_state::Residual;
use crate::errors::{EosError, EosResult};
use crate::state::{DensityInitialization, State};
use ndarray::{arr1, Array1};
use std::sync::Arc;
use tracing::debug;

const MAX_ITER_TP: usize = 200;
const TOL_TP: f64 = 1e-8;

/// # Flash calculations
impl<E: Residual> PhaseEquilibrium<E> {
    /// Calculate the coexisting vapor and liquid compositions of a binary
    /// mixture at the given temperature and pressure.
    ///
    /// The K values (`y / x`) are initialized with `k_init` or, if not given,
    /// with the fugacity coefficients of the pure liquids, assuming an ideal
    /// gas phase.
    pub fn binary_flash(
        eos: &Arc<E>,
        temperature: f64,
        pressure: f64,
        k_init: Option<&Array1<f64>>,
        options: SolverOptions,
    ) -> EosResult<Self> {
        if eos.components() != 2 {
            return Err(EosError::IncompatibleComponents(eos.components(), 2));
        }
        let (max_iter, tol) = options.unwrap_or(MAX_ITER_TP, TOL_TP);

        let mut k = match k_init {
            Some(k) if k.len() == 2 => k.clone(),
            Some(k) => return Err(EosError::IncompatibleComponents(2, k.len())),
            None => Self::k_values_pure_liquid(eos, temperature, pressure)?,
        };

        let (mut rho_l, mut rho_v) = (DensityInitialization::Liquid, DensityInitialization::Vapor);
        for i in 1..=max_iter {
            if (k[0] - 1.0) * (k[1] - 1.0) >= 0.0 {
                return Err(EosError::NoPhaseSplit(temperature, pressure));
            }
            let x1 = (1.0 - k[1]) / (k[0] - k[1]);
            let x = arr1(&[x1, 1.0 - x1]);
            let y = &k * &x;

            let liquid = State::new_npt(eos, temperature, pressure, &x, rho_l)?;
            let vapor = State::new_npt(eos, temperature, pressure, &y, rho_v)?;
            if Self::is_trivial_solution(&vapor, &liquid) {
                return Err(EosError::TrivialSolution);
            }
            let k_new = (liquid.ln_phi() - vapor.ln_phi()).mapv(f64::exp);
            if k_new.iter().any(|k| !k.is_finite()) {
                return Err(EosError::IterationFailed("binary_flash".to_owned()));
            }

            let res = (&k_new / &k)
                .iter()
                .fold(0.0, |acc: f64, r| (r - 1.0).abs().max(acc));
            debug!(
                "binary flash {:4}: residual = {:e}, x = {:.8}, y = {:.8}",
                i, res, x, y
            );
            if res < tol {
                debug!(
                    "PhaseEquilibrium::binary_flash: calculation converged in {} step(s)",
                    i
                );
                return Ok(Self::from_states(vapor, liquid));
            }
            k = k_new;
            rho_l = DensityInitialization::InitialDensity(liquid.density);
            rho_v = DensityInitialization::InitialDensity(vapor.density);
        }
        Err(EosError::NotConverged("binary_flash".to_owned()))
    }

    fn k_values_pure_liquid(eos: &Arc<E>, temperature: f64, pressure: f64) -> EosResult<Array1<f64>> {
        let mut k = Array1::zeros(2);
        for i in 0..2 {
            let mut x = Array1::zeros(2);
            x[i] = 1.0;
            let liquid =
                State::new_npt(eos, temperature, pressure, &x, DensityInitialization::Liquid)?;
            k[i] = liquid.ln_phi()[i].exp();
        }
        Ok(k)
    }
}
