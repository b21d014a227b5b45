use super::{single_component, PhaseEquilibrium, SolverOptions};
use crate::constants::RGAS;
use crate::equation_of_state::Residual;
use crate::errors::{EosError, EosResult};
use crate::state::State;
use ndarray::Array1;
use std::sync::Arc;
use tracing::debug;

const MAX_ITER_PURE: usize = 50;
const TOL_PURE: f64 = 1e-12;

/// # Pure component phase equilibria
impl<E: Residual> PhaseEquilibrium<E> {
    /// Calculate the saturation state of a pure component at the given
    /// temperature.
    ///
    /// `molefracs` has to contain exactly one nonzero entry, which selects
    /// the component. Returns [EosError::SuperCritical] if the isotherm has
    /// no unstable region.
    pub fn pure(
        eos: &Arc<E>,
        temperature: f64,
        molefracs: &Array1<f64>,
        options: SolverOptions,
    ) -> EosResult<Self> {
        let i = single_component(molefracs).ok_or_else(|| {
            EosError::InvalidComposition(format!(
                "a pure component saturation point requires a single nonzero mole fraction, got {}",
                molefracs
            ))
        })?;
        let mut x = Array1::zeros(molefracs.len());
        x[i] = 1.0;
        let (max_iter, tol) = options.unwrap_or(MAX_ITER_PURE, TOL_PURE);

        // First try to initialize with an ideal gas assumption
        let vle = Self::init_pure_ideal_gas(eos, temperature, &x)
            .and_then(|vle| vle.iterate_pure_t(max_iter, tol))
            .ok();

        // Then use the spinodal to initialize the calculation
        vle.map_or_else(
            || {
                Self::init_pure_spinodal(eos, temperature, &x)
                    .and_then(|vle| vle.iterate_pure_t(max_iter, tol))
            },
            Ok,
        )
    }

    fn iterate_pure_t(self, max_iter: usize, tol: f64) -> EosResult<Self> {
        let mut p_old = self.vapor().pressure();
        let [mut vapor, mut liquid] = self.0;

        for i in 1..=max_iter {
            // calculate the pressures and derivatives
            let (p_l, p_rho_l) = liquid.p_dpdrho();
            let (p_v, p_rho_v) = vapor.p_dpdrho();
            let a_l_res = liquid.residual_molar_helmholtz_energy();
            let a_v_res = vapor.residual_molar_helmholtz_energy();

            // Estimate the new pressure
            let kt = RGAS * vapor.temperature;
            let delta_v = 1.0 / vapor.density - 1.0 / liquid.density;
            let delta_a = a_v_res - a_l_res + kt * (vapor.density / liquid.density).ln();
            let mut p_new = -delta_a / delta_v;

            // If the pressure becomes negative, assume the gas phase is ideal. The
            // resulting pressure is always positive.
            if p_new.is_sign_negative() {
                p_new = p_v * ((-delta_a - p_v / vapor.density) / kt).exp();
            }

            // Improve the estimate by exploiting the almost ideal behavior of the gas phase
            let newton_tol = p_old * delta_v * tol;
            for _ in 0..20 {
                let p_frac = p_new / p_old;
                let f = p_new * delta_v + delta_a + (p_frac.ln() + 1.0 - p_frac) * kt;
                let df_dp = delta_v + (1.0 / p_new - 1.0 / p_old) * kt;
                p_new -= f / df_dp;
                if f.abs() < newton_tol {
                    break;
                }
            }

            if p_new.is_nan() {
                return Err(EosError::IterationFailed("pure".to_owned()));
            }

            // Calculate Newton steps for the densities and update state.
            let rho_l = liquid.density + (p_new - p_l) / p_rho_l;
            let rho_v = vapor.density + (p_new - p_v) / p_rho_v;
            liquid = liquid.update_density(rho_l)?;
            vapor = vapor.update_density(rho_v)?;
            if Self::is_trivial_solution(&vapor, &liquid) {
                return Err(EosError::TrivialSolution);
            }

            let res = (p_new - p_old).abs();
            debug!(
                "pure {:4}: residual = {:e}, p = {:e} Pa, rho_l = {:e}, rho_v = {:e}",
                i, res, p_new, liquid.density, vapor.density
            );
            if res < p_old * tol {
                debug!("PhaseEquilibrium::pure: calculation converged in {} step(s)", i);
                return Ok(Self([vapor, liquid]));
            }
            p_old = p_new;
        }
        Err(EosError::NotConverged("pure".to_owned()))
    }

    fn init_pure_ideal_gas(eos: &Arc<E>, temperature: f64, x: &Array1<f64>) -> EosResult<Self> {
        let p = Self::starting_pressure_ideal_gas_bubble(eos, temperature, x)?.0;
        PhaseEquilibrium::new_npt(eos, temperature, p, x, x)?.check_trivial_solution()
    }

    fn init_pure_spinodal(eos: &Arc<E>, temperature: f64, x: &Array1<f64>) -> EosResult<Self> {
        let p = Self::starting_pressure_spinodal(eos, temperature, x)?;
        PhaseEquilibrium::new_npt(eos, temperature, p, x, x)
    }

    /// Starting pressure (Pa) and vapor composition estimated from the
    /// fugacities of a dense liquid at 75 % of the maximum density.
    pub(super) fn starting_pressure_ideal_gas_bubble(
        eos: &Arc<E>,
        temperature: f64,
        liquid_molefracs: &Array1<f64>,
    ) -> EosResult<(f64, Array1<f64>)> {
        let density = 0.75 * eos.density_max(liquid_molefracs, temperature)?;
        let liquid = State::new_nvt(eos, temperature, density, liquid_molefracs)?;
        let z = liquid.compressibility();
        let rt = RGAS * temperature;
        let p_i = (liquid.residual_chemical_potential() / rt - z).mapv(f64::exp)
            * liquid_molefracs
            * (density * rt);
        let p = p_i.sum();
        if !(p.is_finite() && p > 0.0) {
            return Err(EosError::IterationFailed(
                "starting_pressure_ideal_gas_bubble".to_owned(),
            ));
        }
        let y = p_i / p;
        Ok((p, y))
    }

    /// Mean pressure between the vapor and the (non-negative) liquid spinodal.
    pub(super) fn starting_pressure_spinodal(
        eos: &Arc<E>,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<f64> {
        let [sp_v, sp_l] = State::spinodal(eos, temperature, molefracs)?;
        let pv = sp_v.pressure();
        let pl = sp_l.pressure();
        Ok(0.5 * (pl.max(0.0) + pv))
    }
}
