//! Composition dependent segment variables and their cache.
use crate::errors::{EosError, EosResult};
use ndarray::{Array1, Array2};
use num_dual::DualNum;
use std::sync::{Arc, Mutex, PoisonError};

/// Segment variables derived from the mole fractions of a mixture.
#[derive(Clone, Debug)]
pub struct CompositionVariables<D> {
    /// Mole fractions of the components
    pub molefracs: Array1<D>,
    /// Number of (volume and shape weighted) segments per molecule
    pub segments_per_molecule: D,
    /// Fraction of segments of each bead type, `xsk`
    pub segment_fractions: Array1<D>,
}

impl<D: DualNum<f64> + Copy> CompositionVariables<D> {
    /// Calculates the segment variables from the mole fractions `molefracs`,
    /// the composition matrix `nui` and the bead parameters `vks` and `sk`.
    pub fn new(molefracs: Array1<D>, nui: &Array2<f64>, vks: &Array1<f64>, sk: &Array1<f64>) -> Self {
        let (ncomp, nbeads) = nui.dim();
        let mut segments = Array1::from_elem(nbeads, D::zero());
        for i in 0..ncomp {
            for k in 0..nbeads {
                segments[k] = segments[k] + molefracs[i] * (nui[(i, k)] * vks[k] * sk[k]);
            }
        }
        let segments_per_molecule = segments.iter().fold(D::zero(), |acc, &s| acc + s);
        let segment_fractions = segments.mapv(|s| s / segments_per_molecule);
        Self {
            molefracs,
            segments_per_molecule,
            segment_fractions,
        }
    }

    /// Products of segment fractions `xskl = xsk xsl`.
    pub fn xskl(&self) -> Array2<D> {
        let x = &self.segment_fractions;
        Array2::from_shape_fn((x.len(), x.len()), |(k, l)| x[k] * x[l])
    }
}

impl CompositionVariables<f64> {
    /// Converts the variables to (constant) dual numbers.
    pub fn lift<D: DualNum<f64> + Copy>(&self) -> CompositionVariables<D> {
        CompositionVariables {
            molefracs: self.molefracs.mapv(D::from),
            segments_per_molecule: D::from(self.segments_per_molecule),
            segment_fractions: self.segment_fractions.mapv(D::from),
        }
    }
}

/// Checks that the mole fractions fit to a system of `components` components,
/// are non-negative and sum to one.
pub fn validate_molefracs(molefracs: &Array1<f64>, components: usize) -> EosResult<()> {
    if molefracs.len() != components {
        return Err(EosError::IncompatibleComponents(components, molefracs.len()));
    }
    if molefracs.iter().any(|x| x.is_nan() || *x < 0.0) {
        return Err(EosError::InvalidComposition(format!(
            "mole fractions {} must be non-negative",
            molefracs
        )));
    }
    let sum = molefracs.sum();
    if (sum - 1.0).abs() > 1e-8 {
        return Err(EosError::InvalidComposition(format!(
            "mole fractions {} sum to {}",
            molefracs, sum
        )));
    }
    Ok(())
}

/// Cache of the segment variables for the last mole fractions an equation of
/// state was evaluated for.
///
/// This is the only mutable state of an equation of state. The update is
/// performed under a lock so a concurrent caller sees either the previous
/// or the new entry, never a partially written one.
#[derive(Debug, Default)]
pub struct CompositionCache {
    entry: Mutex<Option<(Array1<f64>, Arc<CompositionVariables<f64>>)>>,
}

impl CompositionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached variables if `molefracs` equals the last seen
    /// mole fractions, otherwise evaluates `f` and stores the result.
    pub fn get_or_insert_with<F>(&self, molefracs: &Array1<f64>, f: F) -> Arc<CompositionVariables<f64>>
    where
        F: FnOnce() -> CompositionVariables<f64>,
    {
        let mut entry = self.entry.lock().unwrap_or_else(PoisonError::into_inner);
        match entry.as_ref() {
            Some((x, variables)) if x == molefracs => variables.clone(),
            _ => {
                let variables = Arc::new(f());
                *entry = Some((molefracs.clone(), variables.clone()));
                variables
            }
        }
    }

    /// The mole fractions of the current cache entry.
    pub fn last_molefracs(&self) -> Option<Array1<f64>> {
        let entry = self.entry.lock().unwrap_or_else(PoisonError::into_inner);
        entry.as_ref().map(|(x, _)| x.clone())
    }

    /// Removes the cache entry. Has to be called whenever the parameters
    /// the segment variables depend on change.
    pub fn invalidate(&self) {
        *self.entry.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl Clone for CompositionCache {
    fn clone(&self) -> Self {
        Self::new()
    }
}
