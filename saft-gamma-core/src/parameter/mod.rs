//! Structures and traits that can be used to build model parameters for
//! group contribution equations of state.
//!
//! Parameters are assembled from three kinds of records:
//! [ComponentRecord]s that list the beads of every molecule,
//! [BeadRecord]s that hold the self interaction parameters of every bead
//! and optional [CrossRecord]s that override the mixing rules for
//! individual bead pairs.
use indexmap::{IndexMap, IndexSet};
use ndarray::{Array1, Array2};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

mod component;
mod cross;
mod mixing;
mod segment;

pub use component::ComponentRecord;
pub use cross::{indexed_cross_records, CrossRecord};
pub use mixing::{
    component_averaged_matrices, cross_interaction_matrices, CrossOverrides, MixingRule,
    MixingRules,
};
pub use segment::BeadRecord;

/// Constructor methods for parameters.
///
/// By implementing `Parameter` for a type, you define how parameters
/// of an equation of state can be constructed from component, bead and
/// cross interaction records.
pub trait Parameter
where
    Self: Sized,
{
    type Bead: Clone + DeserializeOwned;
    type Cross: Clone + DeserializeOwned;

    /// Creates parameters from component, bead and cross interaction records.
    fn from_records(
        component_records: Vec<ComponentRecord>,
        bead_records: Vec<BeadRecord<Self::Bead>>,
        cross_records: Vec<CrossRecord<Self::Cross>>,
    ) -> Result<Self, ParameterError>;

    /// Return the original records that were used to construct the parameters.
    #[allow(clippy::type_complexity)]
    fn records(
        &self,
    ) -> (
        &[ComponentRecord],
        &[BeadRecord<Self::Bead>],
        &[CrossRecord<Self::Cross>],
    );

    /// Creates parameters from information stored in json files.
    fn from_json<P>(
        substances: &[&str],
        file_components: P,
        file_beads: P,
        file_cross: Option<P>,
    ) -> Result<Self, ParameterError>
    where
        P: AsRef<Path>,
    {
        let queried: IndexSet<String> = substances.iter().map(|s| s.to_string()).collect();

        let reader = BufReader::new(File::open(file_components)?);
        let component_records: Vec<ComponentRecord> = serde_json::from_reader(reader)?;
        let mut record_map: IndexMap<_, _> = component_records
            .into_iter()
            .map(|record| (record.identifier.clone(), record))
            .collect();

        // Compare queried components and available components
        let available: IndexSet<String> = record_map.keys().cloned().collect();
        if !queried.is_subset(&available) {
            let missing: Vec<String> = queried.difference(&available).cloned().collect();
            return Err(ParameterError::ComponentsNotFound(format!("{:?}", missing)));
        };
        let component_records: Vec<_> = queried
            .iter()
            .filter_map(|identifier| record_map.shift_remove(identifier))
            .collect();

        let bead_records = BeadRecord::from_json(file_beads)?;
        let cross_records = file_cross
            .map(CrossRecord::from_json)
            .transpose()?
            .unwrap_or_default();

        Self::from_records(component_records, bead_records, cross_records)
    }

    /// Return a parameter set containing the subset of components specified in `component_list`.
    fn subset(&self, component_list: &[usize]) -> Result<Self, ParameterError> {
        let (component_records, bead_records, cross_records) = self.records();
        let component_records = component_list
            .iter()
            .map(|&i| component_records[i].clone())
            .collect();
        Self::from_records(
            component_records,
            bead_records.to_vec(),
            cross_records.to_vec(),
        )
    }

    /// Return a new parameter set in which the given bead and cross records
    /// replace (or extend) the records this set was built from.
    ///
    /// Bead records are matched by identifier, cross records by their
    /// unordered pair of bead identifiers.
    fn refreshed(
        &self,
        bead_updates: &[BeadRecord<Self::Bead>],
        cross_updates: &[CrossRecord<Self::Cross>],
    ) -> Result<Self, ParameterError> {
        let (component_records, bead_records, cross_records) = self.records();

        let mut beads: IndexMap<String, BeadRecord<Self::Bead>> = bead_records
            .iter()
            .map(|r| (r.identifier.clone(), r.clone()))
            .collect();
        for update in bead_updates {
            beads.insert(update.identifier.clone(), update.clone());
        }

        let mut cross: Vec<CrossRecord<Self::Cross>> = cross_records.to_vec();
        for update in cross_updates {
            match cross.iter_mut().find(|r| r.matches(&update.id1, &update.id2)) {
                Some(record) => *record = update.clone(),
                None => cross.push(update.clone()),
            }
        }

        Self::from_records(
            component_records.to_vec(),
            beads.into_values().collect(),
            cross,
        )
    }
}

/// Names of the bead parameters that are subject to mixing rules or
/// physical bounds.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BeadParameter {
    /// Energy well depth in units of Kelvin
    EpsilonK,
    /// Size parameter
    Sigma,
    /// Square-well range
    Lambda,
    /// Repulsive Mie exponent
    LambdaR,
    /// Attractive Mie exponent
    LambdaA,
    /// Shape factor
    Sk,
    /// Association energy in units of Kelvin
    EpsilonKHb,
    /// Association bonding volume
    Kappa,
}

impl BeadParameter {
    pub fn name(&self) -> &'static str {
        match self {
            Self::EpsilonK => "epsilon_k",
            Self::Sigma => "sigma",
            Self::Lambda => "lambda",
            Self::LambdaR => "lr",
            Self::LambdaA => "la",
            Self::Sk => "sk",
            Self::EpsilonKHb => "epsilon_k_hb",
            Self::Kappa => "kappa",
        }
    }
}

impl fmt::Display for BeadParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Admissible ranges of bead parameters.
#[derive(Debug, Clone)]
pub struct ParameterBounds(IndexMap<BeadParameter, [f64; 2]>);

impl ParameterBounds {
    pub fn new(bounds: &[(BeadParameter, f64, f64)]) -> Self {
        Self(bounds.iter().map(|&(p, lo, hi)| (p, [lo, hi])).collect())
    }

    /// Lower and upper bound of a parameter, if it is bounded.
    pub fn get(&self, parameter: BeadParameter) -> Option<[f64; 2]> {
        self.0.get(&parameter).copied()
    }

    /// Checks that `value` of `parameter` for the bead (pair) `identifier`
    /// lies within the admissible range. Unbounded parameters always pass.
    pub fn check(
        &self,
        parameter: BeadParameter,
        identifier: &str,
        value: f64,
    ) -> Result<(), ParameterError> {
        match self.0.get(&parameter) {
            Some(&[lo, hi]) if !(lo..=hi).contains(&value) => Err(ParameterError::OutOfBounds(
                parameter.to_string(),
                identifier.to_string(),
                value,
                lo,
                hi,
            )),
            _ => Ok(()),
        }
    }
}

/// Collect the bead records that are used by at least one component and build
/// the composition matrix `nui` (components × beads).
///
/// The order of the beads follows the order of `bead_records`.
pub fn bead_composition<M: Clone>(
    component_records: &[ComponentRecord],
    bead_records: &[BeadRecord<M>],
) -> Result<(Vec<BeadRecord<M>>, Array2<f64>), ParameterError> {
    let available: IndexSet<&str> = bead_records
        .iter()
        .map(|r| r.identifier.as_str())
        .collect();
    let mut missing = IndexSet::new();
    for record in component_records {
        for (bead, &count) in record.beads.iter() {
            if !available.contains(bead.as_str()) {
                missing.insert(bead.clone());
            }
            if count.is_nan() || count < 0.0 {
                return Err(ParameterError::InvalidComposition(format!(
                    "bead count of {} in {} is {}",
                    bead, record.identifier, count
                )));
            }
        }
    }
    if !missing.is_empty() {
        let missing: Vec<_> = missing.into_iter().collect();
        return Err(ParameterError::BeadsNotFound(format!("{:?}", missing)));
    }

    let beads: Vec<BeadRecord<M>> = bead_records
        .iter()
        .filter(|r| {
            component_records
                .iter()
                .any(|c| c.beads.get(&r.identifier).map_or(false, |&n| n > 0.0))
        })
        .cloned()
        .collect();

    let nui = Array2::from_shape_fn((component_records.len(), beads.len()), |(i, k)| {
        component_records[i]
            .beads
            .get(&beads[k].identifier)
            .copied()
            .unwrap_or(0.0)
    });
    Ok((beads, nui))
}

/// Occupied volume fractions `zki[i,k] = nui[i,k] Vk Sk / Σ_k nui[i,k] Vk Sk`.
pub fn occupied_volume_fractions(
    nui: &Array2<f64>,
    vks: &Array1<f64>,
    sk: &Array1<f64>,
) -> Result<Array2<f64>, ParameterError> {
    let weights = nui * &(vks * sk);
    let mut zki = weights.clone();
    for (i, mut row) in zki.outer_iter_mut().enumerate() {
        let norm = weights.row(i).sum();
        if norm <= 0.0 {
            return Err(ParameterError::InvalidComposition(format!(
                "component {} does not contain any beads",
                i
            )));
        }
        row /= norm;
    }
    Ok(zki)
}

/// Error type for incomplete parameter information and IO problems.
#[derive(Error, Debug)]
pub enum ParameterError {
    #[error(transparent)]
    FileIO(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error("The following component(s) were not found: {0}")]
    ComponentsNotFound(String),
    #[error("The following bead(s) were not found in the bead library: {0}")]
    BeadsNotFound(String),
    #[error("Parameter `{0}` is required but missing for {1}.")]
    MissingParameter(String, String),
    #[error("Parameter `{0}` of {1} is {2}, outside of the admissible range [{3}, {4}].")]
    OutOfBounds(String, String, f64, f64, f64),
    #[error("Invalid composition: {0}")]
    InvalidComposition(String),
    #[error("Incompatible parameters: {0}")]
    IncompatibleParameters(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    fn components() -> Vec<ComponentRecord> {
        vec![
            ComponentRecord::new("butane", [("CH3", 2.0), ("CH2", 2.0)], 0.0),
            ComponentRecord::new("ethane", [("CH3", 2.0)], 0.0),
        ]
    }

    fn beads() -> Vec<BeadRecord<f64>> {
        vec![
            BeadRecord::new("CH2".into(), 14.02658, 1.0),
            BeadRecord::new("CH3".into(), 15.03452, 2.0),
            BeadRecord::new("OH".into(), 17.00734, 3.0),
        ]
    }

    #[test]
    fn composition_matrix() -> Result<(), ParameterError> {
        let (beads, nui) = bead_composition(&components(), &beads())?;
        let names: Vec<_> = beads.iter().map(|b| b.identifier.as_str()).collect();
        assert_eq!(names, ["CH2", "CH3"]);
        assert_eq!(nui, arr2(&[[2.0, 2.0], [0.0, 2.0]]));
        Ok(())
    }

    #[test]
    fn missing_bead() {
        let mut components = components();
        components.push(ComponentRecord::new("methanol", [("CH3", 1.0), ("CH2OH", 1.0)], 0.0));
        assert!(matches!(
            bead_composition(&components, &beads()),
            Err(ParameterError::BeadsNotFound(_))
        ));
    }

    #[test]
    fn negative_bead_count() {
        let components = vec![ComponentRecord::new("x", [("CH3", -1.0)], 0.0)];
        assert!(matches!(
            bead_composition(&components, &beads()),
            Err(ParameterError::InvalidComposition(_))
        ));
    }

    #[test]
    fn volume_fractions_sum_to_one() -> Result<(), ParameterError> {
        let nui = arr2(&[[2.0, 2.0, 0.0], [0.0, 1.0, 1.0], [1.5, 0.0, 0.0]]);
        let vks = Array1::from(vec![1.0, 2.0, 1.0]);
        let sk = Array1::from(vec![0.57, 0.23, 0.8]);
        let zki = occupied_volume_fractions(&nui, &vks, &sk)?;
        for row in zki.outer_iter() {
            approx::assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-10);
        }
        assert_eq!(zki[[2, 1]], 0.0);
        Ok(())
    }

    #[test]
    fn bounds() {
        let bounds = ParameterBounds::new(&[(BeadParameter::EpsilonK, 10.0, 1000.0)]);
        assert!(bounds.check(BeadParameter::EpsilonK, "CH3", 250.0).is_ok());
        assert!(bounds.check(BeadParameter::Sigma, "CH3", 250.0).is_ok());
        assert!(matches!(
            bounds.check(BeadParameter::EpsilonK, "CH3", 5.0),
            Err(ParameterError::OutOfBounds(..))
        ));
    }
}
