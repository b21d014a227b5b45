use crate::equation_of_state::Residual;
use crate::errors::{EosError, EosResult};
use crate::state::{DensityInitialization, State};
use ndarray::Array1;
use std::fmt;
use std::sync::Arc;

mod bubble_dew;
mod tp_flash;
mod vle_pure;

/// Options for the various phase equilibria solvers.
///
/// If the values are [None], solver specific default
/// values are used.
#[derive(Copy, Clone, Debug, Default)]
pub struct SolverOptions {
    /// Maximum number of iterations.
    pub max_iter: Option<usize>,
    /// Tolerance.
    pub tol: Option<f64>,
}

impl From<(Option<usize>, Option<f64>)> for SolverOptions {
    fn from(options: (Option<usize>, Option<f64>)) -> Self {
        Self {
            max_iter: options.0,
            tol: options.1,
        }
    }
}

impl SolverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = Some(max_iter);
        self
    }

    pub fn tol(mut self, tol: f64) -> Self {
        self.tol = Some(tol);
        self
    }

    pub fn unwrap_or(self, max_iter: usize, tol: f64) -> (usize, f64) {
        (self.max_iter.unwrap_or(max_iter), self.tol.unwrap_or(tol))
    }
}

/// A vapor-liquid (or liquid-liquid) equilibrium between two states
/// at the same temperature and pressure.
///
/// ## Contents
///
/// + [Bubble and dew point calculations](#bubble-and-dew-point-calculations)
/// + [Flash calculations](#flash-calculations)
/// + [Pure component phase equilibria](#pure-component-phase-equilibria)
pub struct PhaseEquilibrium<E>([State<E>; 2]);

impl<E> Clone for PhaseEquilibrium<E> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<E> fmt::Display for PhaseEquilibrium<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, s) in self.0.iter().enumerate() {
            writeln!(f, "phase {}: {}", i, s)?;
        }
        Ok(())
    }
}

impl<E> PhaseEquilibrium<E> {
    pub fn vapor(&self) -> &State<E> {
        &self.0[0]
    }

    pub fn liquid(&self) -> &State<E> {
        &self.0[1]
    }
}

impl<E: Residual> PhaseEquilibrium<E> {
    pub(super) fn from_states(state1: State<E>, state2: State<E>) -> Self {
        let (vapor, liquid) = if state1.density < state2.density {
            (state1, state2)
        } else {
            (state2, state1)
        };
        Self([vapor, liquid])
    }

    /// Creates a new PhaseEquilibrium that contains two states at the
    /// specified temperature, pressure and mole fractions.
    ///
    /// In general, the two states generated are NOT in an equilibrium.
    pub fn new_npt(
        eos: &Arc<E>,
        temperature: f64,
        pressure: f64,
        vapor_molefracs: &Array1<f64>,
        liquid_molefracs: &Array1<f64>,
    ) -> EosResult<Self> {
        let liquid = State::new_npt(
            eos,
            temperature,
            pressure,
            liquid_molefracs,
            DensityInitialization::Liquid,
        )?;
        let vapor = State::new_npt(
            eos,
            temperature,
            pressure,
            vapor_molefracs,
            DensityInitialization::Vapor,
        )?;
        Ok(Self([vapor, liquid]))
    }

    /// Pressure of the (vapor) phase in Pa.
    pub fn pressure(&self) -> f64 {
        self.vapor().pressure()
    }
}

const TRIVIAL_REL_DEVIATION: f64 = 1e-5;

/// # Utility functions
impl<E: Residual> PhaseEquilibrium<E> {
    pub(super) fn check_trivial_solution(self) -> EosResult<Self> {
        if Self::is_trivial_solution(self.vapor(), self.liquid()) {
            Err(EosError::TrivialSolution)
        } else {
            Ok(self)
        }
    }

    /// Check if the two states form a trivial solution
    pub fn is_trivial_solution(state1: &State<E>, state2: &State<E>) -> bool {
        let rho1 = &state1.molefracs * state1.density;
        let rho2 = &state2.molefracs * state2.density;
        rho1.iter()
            .zip(rho2.iter())
            .filter(|(&r1, _)| r1 > 0.0)
            .fold(0.0, |acc: f64, (&r1, &r2)| (r2 / r1 - 1.0).abs().max(acc))
            < TRIVIAL_REL_DEVIATION
    }
}

/// Index of the only nonzero mole fraction, if there is exactly one.
pub(crate) fn single_component(molefracs: &Array1<f64>) -> Option<usize> {
    let mut nonzero = molefracs
        .iter()
        .enumerate()
        .filter(|(_, &x)| x > 0.0)
        .map(|(i, _)| i);
    match (nonzero.next(), nonzero.next()) {
        (Some(i), None) => Some(i),
        _ => None,
    }
}
