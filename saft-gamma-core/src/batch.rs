//! Evaluation of many independent (temperature, composition) points.
//!
//! Every function in this module returns one record per input point. A
//! failing point never aborts its siblings: it is reported as a sentinel
//! record (`NaN` values, [PhaseFlag::Failed]) carrying a [PointFailure]
//! that keeps the distinction between invalid input, configuration
//! problems and convergence failures.
use crate::equation_of_state::Residual;
use crate::errors::{EosError, EosResult};
use crate::phase_equilibria::{PhaseEquilibrium, SolverOptions};
use crate::state::{DensityInitialization, State};
use ndarray::Array1;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Classification of a failed evaluation point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// Invalid temperature, pressure, density or composition.
    InvalidInput,
    /// The model or the request is inconsistent, e.g. a flash for a
    /// system that is not binary.
    Configuration,
    /// The solver did not find a solution.
    NotConverged,
    /// The calculation produced illegal values.
    Numerical,
}

/// Reason for the failure of a single evaluation point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PointFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for PointFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl From<&EosError> for PointFailure {
    fn from(error: &EosError) -> Self {
        let kind = match error {
            EosError::InvalidState(..)
            | EosError::InvalidDensity(_)
            | EosError::InvalidComposition(_) => FailureKind::InvalidInput,
            EosError::IncompatibleComponents(..) | EosError::ParameterError(_) => {
                FailureKind::Configuration
            }
            #[cfg(feature = "rayon")]
            EosError::RayonError(_) => FailureKind::Configuration,
            EosError::NotConverged(_)
            | EosError::TrivialSolution
            | EosError::SuperCritical
            | EosError::NoPhaseSplit(..) => FailureKind::NotConverged,
            EosError::Error(_) | EosError::IterationFailed(_) | EosError::LinAlgError(_) => {
                FailureKind::Numerical
            }
        };
        Self {
            kind,
            message: error.to_string(),
        }
    }
}

/// Phase of a state. The discriminants are the numeric flags of the
/// result tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseFlag {
    Vapor = 0,
    Liquid = 1,
    Supercritical = 2,
    Failed = 3,
}

impl PhaseFlag {
    /// Classify a single phase state by its position relative to the
    /// spinodal densities of its isotherm.
    pub fn of_state<E: Residual>(state: &State<E>, fallback: PhaseFlag) -> Self {
        match State::spinodal(&state.eos, state.temperature, &state.molefracs) {
            Err(EosError::SuperCritical) => Self::Supercritical,
            Ok([vapor, liquid]) => {
                if state.density >= liquid.density {
                    Self::Liquid
                } else if state.density <= vapor.density {
                    Self::Vapor
                } else {
                    Self::Failed
                }
            }
            Err(_) => fallback,
        }
    }
}

/// Execution of the independent points of a batch.
#[derive(Clone, Copy, Debug, Default)]
pub enum Dispatch {
    #[default]
    Serial,
    /// Evaluate the points on a rayon thread pool with the given number of
    /// threads (all available cores if `None`).
    #[cfg(feature = "rayon")]
    Parallel { threads: Option<usize> },
}

impl Dispatch {
    fn run<T, R, F>(self, points: &[T], f: F) -> EosResult<Vec<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        match self {
            Self::Serial => Ok(points.iter().map(f).collect()),
            #[cfg(feature = "rayon")]
            Self::Parallel { threads } => {
                let mut builder = rayon::ThreadPoolBuilder::new();
                if let Some(threads) = threads {
                    builder = builder.num_threads(threads);
                }
                let thread_pool = builder.build()?;
                Ok(thread_pool.install(|| points.par_iter().map(f).collect()))
            }
        }
    }
}

/// Length of a batch given the lengths of its inputs. Inputs of length one
/// are broadcast.
fn batch_len(inputs: &[(&str, usize)]) -> EosResult<usize> {
    let n = inputs.iter().map(|&(_, len)| len).max().unwrap_or(0);
    if let Some((name, len)) = inputs.iter().find(|&&(_, len)| len != 1 && len != n) {
        return Err(EosError::Error(format!(
            "{} has {} entries but the batch contains {} points",
            name, len, n
        )));
    }
    Ok(n)
}

fn broadcast<T: Clone>(values: &[T], n: usize) -> Vec<T> {
    if values.len() == 1 {
        vec![values[0].clone(); n]
    } else {
        values.to_vec()
    }
}

fn nan_array(len: usize) -> Array1<f64> {
    Array1::from_elem(len, f64::NAN)
}

/// Result of a bubble or dew point calculation.
#[derive(Clone, Debug)]
pub struct PhasePointRecord {
    /// Temperature in K
    pub temperature: f64,
    /// Pressure in Pa
    pub pressure: f64,
    /// Specified mole fractions
    pub molefracs: Array1<f64>,
    /// Mole fractions of the incipient phase
    pub incipient_molefracs: Array1<f64>,
    pub flag_vapor: PhaseFlag,
    pub flag_liquid: PhaseFlag,
    pub failure: Option<PointFailure>,
}

impl PhasePointRecord {
    fn failed(temperature: f64, molefracs: &Array1<f64>, error: &EosError) -> Self {
        Self {
            temperature,
            pressure: f64::NAN,
            molefracs: molefracs.clone(),
            incipient_molefracs: nan_array(molefracs.len()),
            flag_vapor: PhaseFlag::Failed,
            flag_liquid: PhaseFlag::Failed,
            failure: Some(error.into()),
        }
    }
}

/// Result of a binary flash calculation.
#[derive(Clone, Debug)]
pub struct FlashRecord {
    pub temperature: f64,
    pub pressure: f64,
    pub liquid_molefracs: Array1<f64>,
    pub vapor_molefracs: Array1<f64>,
    pub flag_vapor: PhaseFlag,
    pub flag_liquid: PhaseFlag,
    pub failure: Option<PointFailure>,
}

/// Saturation pressure and coexisting densities (mol/m³).
#[derive(Clone, Debug)]
pub struct SaturationRecord {
    pub temperature: f64,
    pub molefracs: Array1<f64>,
    pub pressure: f64,
    pub liquid_density: f64,
    pub vapor_density: f64,
    pub failure: Option<PointFailure>,
}

/// Density (mol/m³) and fugacity coefficients of a single phase.
#[derive(Clone, Debug)]
pub struct PhaseRecord {
    pub temperature: f64,
    pub pressure: f64,
    pub molefracs: Array1<f64>,
    pub density: f64,
    pub phi: Array1<f64>,
    pub flag: PhaseFlag,
    pub failure: Option<PointFailure>,
}

/// Liquid density (mol/m³) and Hildebrand solubility parameter in MPa^0.5.
#[derive(Clone, Debug)]
pub struct SolubilityRecord {
    pub temperature: f64,
    pub pressure: f64,
    pub molefracs: Array1<f64>,
    pub density: f64,
    pub flag: PhaseFlag,
    pub solubility_parameter: f64,
    pub failure: Option<PointFailure>,
}

fn bubble_dew_points<E: Residual>(
    eos: &Arc<E>,
    temperatures: &[f64],
    molefracs: &[Array1<f64>],
    options: SolverOptions,
    dispatch: Dispatch,
    bubble: bool,
) -> EosResult<Vec<PhasePointRecord>> {
    let n = batch_len(&[("temperatures", temperatures.len()), ("compositions", molefracs.len())])?;
    let points: Vec<_> = broadcast(temperatures, n)
        .into_iter()
        .zip(broadcast(molefracs, n))
        .collect();
    dispatch.run(&points, |(t, x)| {
        let vle = if bubble {
            PhaseEquilibrium::bubble_point(eos, *t, x, None, options)
        } else {
            PhaseEquilibrium::dew_point(eos, *t, x, None, options)
        };
        match vle {
            Ok(vle) => {
                let incipient = if bubble {
                    vle.vapor().molefracs.clone()
                } else {
                    vle.liquid().molefracs.clone()
                };
                let pressure = vle.pressure();
                info!("T {} K, x {}: p {} Pa, incipient {}", t, x, pressure, incipient);
                PhasePointRecord {
                    temperature: *t,
                    pressure,
                    molefracs: x.clone(),
                    incipient_molefracs: incipient,
                    flag_vapor: PhaseFlag::Vapor,
                    flag_liquid: PhaseFlag::Liquid,
                    failure: None,
                }
            }
            Err(e) => {
                warn!("T {} K, x {}: {}", t, x, e);
                PhasePointRecord::failed(*t, x, &e)
            }
        }
    })
}

/// Bubble pressure and vapor composition for every (T, x) point.
pub fn bubble_points<E: Residual>(
    eos: &Arc<E>,
    temperatures: &[f64],
    liquid_molefracs: &[Array1<f64>],
    options: SolverOptions,
    dispatch: Dispatch,
) -> EosResult<Vec<PhasePointRecord>> {
    bubble_dew_points(eos, temperatures, liquid_molefracs, options, dispatch, true)
}

/// Dew pressure and liquid composition for every (T, y) point.
pub fn dew_points<E: Residual>(
    eos: &Arc<E>,
    temperatures: &[f64],
    vapor_molefracs: &[Array1<f64>],
    options: SolverOptions,
    dispatch: Dispatch,
) -> EosResult<Vec<PhasePointRecord>> {
    bubble_dew_points(eos, temperatures, vapor_molefracs, options, dispatch, false)
}

/// Binary flash for every (T, p) point.
///
/// A model that does not describe exactly two components is rejected
/// before any point is evaluated.
pub fn flash_points<E: Residual>(
    eos: &Arc<E>,
    temperatures: &[f64],
    pressures: &[f64],
    options: SolverOptions,
    dispatch: Dispatch,
) -> EosResult<Vec<FlashRecord>> {
    if eos.components() != 2 {
        return Err(EosError::IncompatibleComponents(eos.components(), 2));
    }
    let n = batch_len(&[("temperatures", temperatures.len()), ("pressures", pressures.len())])?;
    let points: Vec<_> = broadcast(temperatures, n)
        .into_iter()
        .zip(broadcast(pressures, n))
        .collect();
    dispatch.run(&points, |&(t, p)| {
        match PhaseEquilibrium::binary_flash(eos, t, p, None, options) {
            Ok(vle) => {
                info!(
                    "T {} K, p {} Pa: x {}, y {}",
                    t,
                    p,
                    vle.liquid().molefracs,
                    vle.vapor().molefracs
                );
                FlashRecord {
                    temperature: t,
                    pressure: p,
                    liquid_molefracs: vle.liquid().molefracs.clone(),
                    vapor_molefracs: vle.vapor().molefracs.clone(),
                    flag_vapor: PhaseFlag::Vapor,
                    flag_liquid: PhaseFlag::Liquid,
                    failure: None,
                }
            }
            Err(e) => {
                warn!("T {} K, p {} Pa: {}", t, p, e);
                FlashRecord {
                    temperature: t,
                    pressure: p,
                    liquid_molefracs: nan_array(2),
                    vapor_molefracs: nan_array(2),
                    flag_vapor: PhaseFlag::Failed,
                    flag_liquid: PhaseFlag::Failed,
                    failure: Some((&e).into()),
                }
            }
        }
    })
}

/// Saturation pressure and coexisting densities for every (T, x) point.
///
/// Each composition has to contain a single nonzero mole fraction.
pub fn saturation_properties<E: Residual>(
    eos: &Arc<E>,
    temperatures: &[f64],
    molefracs: &[Array1<f64>],
    options: SolverOptions,
    dispatch: Dispatch,
) -> EosResult<Vec<SaturationRecord>> {
    let n = batch_len(&[("temperatures", temperatures.len()), ("compositions", molefracs.len())])?;
    let points: Vec<_> = broadcast(temperatures, n)
        .into_iter()
        .zip(broadcast(molefracs, n))
        .collect();
    dispatch.run(&points, |(t, x)| {
        match PhaseEquilibrium::pure(eos, *t, x, options) {
            Ok(vle) => {
                let record = SaturationRecord {
                    temperature: *t,
                    molefracs: x.clone(),
                    pressure: vle.pressure(),
                    liquid_density: vle.liquid().density,
                    vapor_density: vle.vapor().density,
                    failure: None,
                };
                info!(
                    "T {} K: psat {} Pa, rho_l {} mol/m³, rho_v {} mol/m³",
                    t, record.pressure, record.liquid_density, record.vapor_density
                );
                record
            }
            Err(e) => {
                warn!("T {} K, x {}: {}", t, x, e);
                SaturationRecord {
                    temperature: *t,
                    molefracs: x.clone(),
                    pressure: f64::NAN,
                    liquid_density: f64::NAN,
                    vapor_density: f64::NAN,
                    failure: Some((&e).into()),
                }
            }
        }
    })
}

type PhasePoint = (f64, f64, Array1<f64>);

fn phase_points(
    temperatures: &[f64],
    pressures: &[f64],
    molefracs: &[Array1<f64>],
) -> EosResult<Vec<PhasePoint>> {
    let n = batch_len(&[
        ("temperatures", temperatures.len()),
        ("pressures", pressures.len()),
        ("compositions", molefracs.len()),
    ])?;
    Ok(broadcast(temperatures, n)
        .into_iter()
        .zip(broadcast(pressures, n))
        .zip(broadcast(molefracs, n))
        .map(|((t, p), x)| (t, p, x))
        .collect())
}

fn single_phase<E: Residual>(
    eos: &Arc<E>,
    (t, p, x): &PhasePoint,
    initialization: DensityInitialization,
    expected: PhaseFlag,
) -> PhaseRecord {
    let state = State::new_npt(eos, *t, *p, x, initialization);
    match state {
        Ok(state) => {
            let phi = state.ln_phi().mapv(f64::exp);
            let flag = PhaseFlag::of_state(&state, expected);
            info!(
                "T {} K, p {} Pa, x {}: rho {} mol/m³, phi {}, flag {:?}",
                t, p, x, state.density, phi, flag
            );
            PhaseRecord {
                temperature: *t,
                pressure: *p,
                molefracs: x.clone(),
                density: state.density,
                phi,
                flag,
                failure: None,
            }
        }
        Err(e) => {
            warn!("T {} K, p {} Pa, x {}: {}", t, p, x, e);
            PhaseRecord {
                temperature: *t,
                pressure: *p,
                molefracs: x.clone(),
                density: f64::NAN,
                phi: nan_array(x.len()),
                flag: PhaseFlag::Failed,
                failure: Some((&e).into()),
            }
        }
    }
}

/// Liquid density and fugacity coefficients for every (T, p, x) point.
pub fn liquid_properties<E: Residual>(
    eos: &Arc<E>,
    temperatures: &[f64],
    pressures: &[f64],
    molefracs: &[Array1<f64>],
    dispatch: Dispatch,
) -> EosResult<Vec<PhaseRecord>> {
    let points = phase_points(temperatures, pressures, molefracs)?;
    dispatch.run(&points, |point| {
        single_phase(eos, point, DensityInitialization::Liquid, PhaseFlag::Liquid)
    })
}

/// Vapor density and fugacity coefficients for every (T, p, y) point.
pub fn vapor_properties<E: Residual>(
    eos: &Arc<E>,
    temperatures: &[f64],
    pressures: &[f64],
    molefracs: &[Array1<f64>],
    dispatch: Dispatch,
) -> EosResult<Vec<PhaseRecord>> {
    let points = phase_points(temperatures, pressures, molefracs)?;
    dispatch.run(&points, |point| {
        single_phase(eos, point, DensityInitialization::Vapor, PhaseFlag::Vapor)
    })
}

/// Hildebrand solubility parameter `δ = sqrt(-U_res ρ)` of the liquid.
pub fn hildebrand_solubility<E: Residual>(state: &State<E>) -> f64 {
    (-state.residual_molar_internal_energy() * state.density).sqrt() * 1e-3
}

/// Liquid density and Hildebrand solubility parameter for every
/// (T, p, x) point.
///
/// Points whose liquid density search ends on the vapor branch report a
/// `NaN` solubility parameter.
pub fn solubility_parameters<E: Residual>(
    eos: &Arc<E>,
    temperatures: &[f64],
    pressures: &[f64],
    molefracs: &[Array1<f64>],
    dispatch: Dispatch,
) -> EosResult<Vec<SolubilityRecord>> {
    let points = phase_points(temperatures, pressures, molefracs)?;
    dispatch.run(&points, |(t, p, x)| {
        match State::new_npt(eos, *t, *p, x, DensityInitialization::Liquid) {
            Ok(state) => {
                let flag = PhaseFlag::of_state(&state, PhaseFlag::Liquid);
                let delta = match flag {
                    PhaseFlag::Liquid | PhaseFlag::Supercritical => hildebrand_solubility(&state),
                    _ => f64::NAN,
                };
                info!(
                    "T {} K, p {} Pa, x {}: rho_l {} mol/m³, flag {:?}, delta {} MPa^0.5",
                    t, p, x, state.density, flag, delta
                );
                SolubilityRecord {
                    temperature: *t,
                    pressure: *p,
                    molefracs: x.clone(),
                    density: state.density,
                    flag,
                    solubility_parameter: delta,
                    failure: None,
                }
            }
            Err(e) => {
                warn!("T {} K, p {} Pa, x {}: {}", t, p, x, e);
                SolubilityRecord {
                    temperature: *t,
                    pressure: *p,
                    molefracs: x.clone(),
                    density: f64::NAN,
                    flag: PhaseFlag::Failed,
                    solubility_parameter: f64::NAN,
                    failure: Some((&e).into()),
                }
            }
        }
    })
}
