use crate::constants::RGAS;
use crate::equation_of_state::Residual;
use crate::errors::{EosError, EosResult};
use crate::state::State;
use ndarray::Array1;
use std::sync::Arc;
use tracing::debug;

/// Find the molar density (mol/m³) at which the model reproduces the
/// given pressure (Pa), starting from `initial_density`.
///
/// Newton iteration on the density with a step size limited to a fraction
/// of the maximum density. If the iteration enters a mechanically unstable
/// region, the spinodal is used to restart on the appropriate branch.
///
/// Converged once the pressure deviation drops below 1e-8 Pa or 1e-10 of
/// the specified pressure.
pub fn density_iteration<E: Residual>(
    eos: &Arc<E>,
    temperature: f64,
    pressure: f64,
    molefracs: &Array1<f64>,
    initial_density: f64,
) -> EosResult<State<E>> {
    let maxdensity = eos.density_max(molefracs, temperature)?;
    let (abstol, reltol) = (1e-8, 1e-10);

    let mut rho = initial_density;
    if !(rho > 0.0) {
        return Err(EosError::InvalidState(
            String::from("density iteration"),
            String::from("density"),
            rho,
        ));
    }
    rho = rho.min(maxdensity);
    let nvt = |rho: f64| State::new_nvt(eos, temperature, rho, molefracs);

    let maxiter = 50;
    let mut converged = false;
    'iteration: for k in 0..maxiter {
        let (mut p, mut dp_drho) = nvt(rho)?.p_dpdrho();

        // attempt to correct for poor initial density
        if dp_drho.is_sign_negative() && k == 0 {
            rho = if initial_density <= 0.15 * maxdensity {
                0.05 * initial_density
            } else {
                (1.1 * initial_density).min(maxdensity)
            };
            (p, dp_drho) = nvt(rho)?.p_dpdrho();
        }

        let mut error = p - pressure;
        debug!(
            "density iteration {}: rho = {:e}, p - p_spec = {:e}",
            k, rho, error
        );

        let mut delta_rho = -error / dp_drho;
        if delta_rho.abs() > 0.075 * maxdensity {
            delta_rho = 0.075 * maxdensity * delta_rho.signum();
        };
        delta_rho = delta_rho.max(-0.95 * rho);

        // correction for the unstable region
        if dp_drho.is_sign_negative() {
            let d2pdrho2 = nvt(rho)?.d2pdrho2().2;

            if rho > 0.85 * maxdensity {
                let (sp_p, sp_rho) =
                    pressure_spinodal(eos, temperature, initial_density, molefracs)?;
                rho = sp_rho;
                error = sp_p - pressure;
                if rho > 0.85 * maxdensity {
                    if error.is_sign_negative() {
                        return Err(EosError::IterationFailed(String::from(
                            "density_iteration",
                        )));
                    } else {
                        rho *= 0.98
                    }
                } else if error.is_sign_positive() {
                    rho = 0.001 * maxdensity
                } else {
                    rho = (rho * 1.1).min(maxdensity)
                }
            } else if error.is_sign_positive() && d2pdrho2.is_sign_positive() {
                let (sp_p, sp_rho) =
                    pressure_spinodal(eos, temperature, initial_density, molefracs)?;
                rho = sp_rho;
                error = sp_p - pressure;
                if error.is_sign_positive() {
                    rho = 0.001 * maxdensity
                } else {
                    rho = (rho * 1.1).min(maxdensity)
                }
            } else if error.is_sign_negative() && d2pdrho2.is_sign_negative() {
                let (sp_p, sp_rho) =
                    pressure_spinodal(eos, temperature, initial_density, molefracs)?;
                rho = sp_rho;
                error = sp_p - pressure;
                if error.is_sign_negative() {
                    rho = 0.8 * maxdensity
                } else {
                    rho *= 0.8
                }
            } else if error.is_sign_negative() && d2pdrho2.is_sign_positive() {
                let (_, rho_l) = pressure_spinodal(eos, temperature, 0.8 * maxdensity, molefracs)?;
                let (sp_v_p, rho_v) =
                    pressure_spinodal(eos, temperature, 0.001 * maxdensity, molefracs)?;
                error = sp_v_p - pressure;
                if error.is_sign_positive()
                    && (initial_density - rho_v).abs() < (initial_density - rho_l).abs()
                {
                    rho = 0.8 * rho_v
                } else {
                    rho = (rho_l * 1.1).min(maxdensity)
                }
            } else if error.is_sign_positive() && d2pdrho2.is_sign_negative() {
                let (_, rho_l) = pressure_spinodal(eos, temperature, 0.8 * maxdensity, molefracs)?;
                let (sp_v_p, rho_v) =
                    pressure_spinodal(eos, temperature, 0.001 * maxdensity, molefracs)?;
                error = sp_v_p - pressure;
                if error.is_sign_negative()
                    && (initial_density - rho_v).abs() > (initial_density - rho_l).abs()
                {
                    rho = (rho_l * 1.1).min(maxdensity)
                } else {
                    rho = 0.8 * rho_v
                }
            } else {
                rho = (rho + initial_density) * 0.5;
                if (rho - initial_density).abs() < 1e-8 {
                    rho = (rho + 0.1 * maxdensity).min(maxdensity)
                }
            }
            continue 'iteration;
        }
        // Newton step
        rho = (rho + delta_rho).min(maxdensity);
        if error.abs() < f64::max(abstol, pressure.abs() * reltol) {
            converged = true;
            break 'iteration;
        }
    }
    if converged {
        nvt(rho)
    } else {
        Err(EosError::NotConverged("density_iteration".to_owned()))
    }
}

/// Locate the closest spinodal (`dp/dρ = 0`) starting from `rho_init`
/// and return its pressure and density.
pub fn pressure_spinodal<E: Residual>(
    eos: &Arc<E>,
    temperature: f64,
    rho_init: f64,
    molefracs: &Array1<f64>,
) -> EosResult<(f64, f64)> {
    let maxiter = 30;
    let tol = 1e-10 * RGAS * temperature;

    let maxdensity = eos.density_max(molefracs, temperature)?;
    let mut rho = rho_init;

    if !(rho > 0.0) {
        return Err(EosError::InvalidState(
            String::from("pressure spinodal"),
            String::from("density"),
            rho,
        ));
    }

    for _ in 0..maxiter {
        let (p, dpdrho, d2pdrho2) =
            State::new_nvt(eos, temperature, rho.min(maxdensity), molefracs)?.d2pdrho2();

        let mut delta_rho = -dpdrho / d2pdrho2;
        if delta_rho.abs() > 0.05 * maxdensity {
            delta_rho = 0.05 * maxdensity * delta_rho.signum()
        }
        delta_rho = delta_rho.max(-rho * 0.95);
        delta_rho = delta_rho.min(maxdensity - rho);
        rho += delta_rho;

        if dpdrho.abs() < tol {
            return Ok((p, rho));
        }
    }
    Err(EosError::NotConverged("pressure_spinodal".to_owned()))
}

impl<E: Residual> State<E> {
    /// Calculate the vapor and liquid spinodal states at the given
    /// temperature and composition.
    ///
    /// Returns [EosError::SuperCritical] if the isotherm has no unstable
    /// region.
    pub fn spinodal(
        eos: &Arc<E>,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<[Self; 2]> {
        let maxdensity = eos.density_max(molefracs, temperature)?;
        let spinodal = |rho: f64| match pressure_spinodal(eos, temperature, rho, molefracs) {
            Err(EosError::NotConverged(_)) => Err(EosError::SuperCritical),
            r => r,
        };
        let (_, rho_v) = spinodal(0.001 * maxdensity)?;
        let (_, rho_l) = spinodal(0.8 * maxdensity)?;
        if rho_l <= rho_v || (rho_l / rho_v - 1.0).abs() < 1e-5 {
            return Err(EosError::SuperCritical);
        }
        let vapor = Self::new_nvt(eos, temperature, rho_v, molefracs)?;
        let liquid = Self::new_nvt(eos, temperature, rho_l, molefracs)?;
        if vapor.d2pdrho2().2 >= 0.0 || liquid.d2pdrho2().2 <= 0.0 {
            return Err(EosError::SuperCritical);
        }
        Ok([vapor, liquid])
    }
}
