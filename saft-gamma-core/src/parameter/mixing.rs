//! Combining rules for bead pair and component pair interaction parameters.
use super::{BeadParameter, ParameterError};
use indexmap::IndexMap;
use ndarray::{Array1, Array2};
use std::collections::HashMap;
use std::fmt;

/// Combination functions for unlike interactions.
///
/// Variants that need other (already mixed) parameters carry the names of
/// those parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MixingRule {
    /// Arithmetic mean of the two self values.
    Mean,
    /// Mean weighted by the cube of the `weight` parameter of both beads.
    WeightedMean { weight: BeadParameter },
    /// Berthelot rule for square-well energies, corrected by the change of
    /// the volume of the attractive well upon mixing.
    SquareWellBerthelot {
        size: BeadParameter,
        exponent: BeadParameter,
    },
    /// Berthelot rule for Mie energies, corrected by the ratio of cubed sizes.
    MieBerthelot { size: BeadParameter },
    /// Combining rule for Mie exponents: `3 + sqrt((λk - 3)(λl - 3))`.
    MieExponent,
}

impl MixingRule {
    /// Parameters that have to be mixed before this rule can be applied.
    pub fn auxiliary_parameters(&self) -> Vec<BeadParameter> {
        match *self {
            Self::Mean | Self::MieExponent => vec![],
            Self::WeightedMean { weight } => vec![weight],
            Self::SquareWellBerthelot { size, exponent } => vec![size, exponent],
            Self::MieBerthelot { size } => vec![size],
        }
    }

    fn combine(
        &self,
        (k, l): (usize, usize),
        values: &Array1<f64>,
        mixed: &IndexMap<BeadParameter, Array2<f64>>,
    ) -> f64 {
        let (a, b) = (values[k], values[l]);
        match *self {
            Self::Mean => 0.5 * (a + b),
            Self::WeightedMean { weight } => {
                let w = &mixed[&weight];
                let (wk, wl) = (w[(k, k)].powi(3), w[(l, l)].powi(3));
                (a * wk + b * wl) / (wk + wl)
            }
            Self::SquareWellBerthelot { size, exponent } => {
                let s = &mixed[&size];
                let e = &mixed[&exponent];
                let volume = |i: usize, j: usize| s[(i, j)].powi(3) * (e[(i, j)].powi(3) - 1.0);
                (a * b).sqrt() * (volume(k, k) * volume(l, l)).sqrt() / volume(k, l)
            }
            Self::MieBerthelot { size } => {
                let s = &mixed[&size];
                (s[(k, k)] * s[(l, l)]).powf(1.5) / s[(k, l)].powi(3) * (a * b).sqrt()
            }
            Self::MieExponent => 3.0 + ((a - 3.0) * (b - 3.0)).sqrt(),
        }
    }
}

impl fmt::Display for MixingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mean => write!(f, "mean"),
            Self::WeightedMean { weight } => write!(f, "weighted_mean({})", weight),
            Self::SquareWellBerthelot { size, exponent } => {
                write!(f, "square_well_berthelot({}, {})", size, exponent)
            }
            Self::MieBerthelot { size } => write!(f, "mie_berthelot({})", size),
            Self::MieExponent => write!(f, "mie_exponent"),
        }
    }
}

/// Ordered list of mixing rules, one per parameter.
///
/// The order matters: auxiliary parameters of a rule have to appear
/// before the parameter that uses them.
#[derive(Debug, Clone)]
pub struct MixingRules(pub Vec<(BeadParameter, MixingRule)>);

impl MixingRules {
    pub fn new(rules: &[(BeadParameter, MixingRule)]) -> Self {
        Self(rules.to_vec())
    }

    pub fn parameters(&self) -> impl Iterator<Item = BeadParameter> + '_ {
        self.0.iter().map(|(p, _)| *p)
    }
}

/// Explicit values for unlike bead pairs that replace the mixing rules.
#[derive(Debug, Clone, Default)]
pub struct CrossOverrides(HashMap<(usize, usize), IndexMap<BeadParameter, f64>>);

impl CrossOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an override for the unordered pair (k, l).
    pub fn insert(&mut self, k: usize, l: usize, parameter: BeadParameter, value: f64) {
        let key = if k <= l { (k, l) } else { (l, k) };
        self.0.entry(key).or_default().insert(parameter, value);
    }

    /// Override for the pair (k, l) or (l, k), if one exists.
    pub fn get(&self, k: usize, l: usize, parameter: BeadParameter) -> Option<f64> {
        let key = if k <= l { (k, l) } else { (l, k) };
        self.0.get(&key).and_then(|m| m.get(&parameter)).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Symmetric interaction matrices of all parameters listed in `rules`.
///
/// Diagonal entries are the self values, unlike pairs use the override
/// if present or else the mixing rule.
pub fn cross_interaction_matrices(
    identifiers: &[String],
    self_values: &IndexMap<BeadParameter, Array1<f64>>,
    rules: &MixingRules,
    overrides: &CrossOverrides,
) -> Result<IndexMap<BeadParameter, Array2<f64>>, ParameterError> {
    let n = identifiers.len();
    let mut mixed: IndexMap<BeadParameter, Array2<f64>> = IndexMap::with_capacity(rules.0.len());
    for &(parameter, rule) in rules.0.iter() {
        let values = self_values.get(&parameter).ok_or_else(|| {
            ParameterError::MissingParameter(parameter.to_string(), format!("{:?}", identifiers))
        })?;
        if values.len() != n {
            return Err(ParameterError::IncompatibleParameters(format!(
                "{} values of `{}` for {} beads",
                values.len(),
                parameter,
                n
            )));
        }
        for aux in rule.auxiliary_parameters() {
            if !mixed.contains_key(&aux) {
                return Err(ParameterError::MissingParameter(
                    aux.to_string(),
                    format!("the `{}` rule of `{}`", rule, parameter),
                ));
            }
        }
        let matrix = Array2::from_shape_fn((n, n), |(k, l)| {
            if k == l {
                values[k]
            } else {
                overrides
                    .get(k, l, parameter)
                    .unwrap_or_else(|| rule.combine((k, l), values, &mixed))
            }
        });
        mixed.insert(parameter, matrix);
    }
    Ok(mixed)
}

/// Component averaged interaction matrices.
///
/// The self values of each component are averages over its beads weighted
/// with the occupied volume fractions `zki`: sizes as the cube root of
/// `Σ_k zki σkk³`, all other parameters as `Σ_k Σ_l zki zli p_kl`. Unlike
/// component pairs are then combined with the same `rules`.
pub fn component_averaged_matrices(
    zki: &Array2<f64>,
    bead_matrices: &IndexMap<BeadParameter, Array2<f64>>,
    rules: &MixingRules,
) -> Result<IndexMap<BeadParameter, Array2<f64>>, ParameterError> {
    let ncomp = zki.nrows();
    let mut averages = IndexMap::with_capacity(rules.0.len());
    for parameter in rules.parameters() {
        let kl = bead_matrices.get(&parameter).ok_or_else(|| {
            ParameterError::MissingParameter(parameter.to_string(), "the bead matrices".into())
        })?;
        let ii = Array1::from_shape_fn(ncomp, |i| {
            let z = zki.row(i);
            if parameter == BeadParameter::Sigma {
                z.iter()
                    .enumerate()
                    .map(|(k, zk)| zk * kl[(k, k)].powi(3))
                    .sum::<f64>()
                    .cbrt()
            } else {
                z.dot(&kl.dot(&z))
            }
        });
        averages.insert(parameter, ii);
    }
    let names: Vec<String> = (0..ncomp).map(|i| i.to_string()).collect();
    cross_interaction_matrices(&names, &averages, rules, &CrossOverrides::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{arr1, arr2};
    use BeadParameter::*;

    fn square_well_rules() -> MixingRules {
        MixingRules::new(&[
            (Sigma, MixingRule::Mean),
            (Lambda, MixingRule::WeightedMean { weight: Sigma }),
            (
                EpsilonK,
                MixingRule::SquareWellBerthelot {
                    size: Sigma,
                    exponent: Lambda,
                },
            ),
        ])
    }

    fn self_values() -> IndexMap<BeadParameter, Array1<f64>> {
        let mut values = IndexMap::new();
        values.insert(Sigma, arr1(&[0.4, 0.35, 0.3]));
        values.insert(Lambda, arr1(&[1.5, 1.6, 1.45]));
        values.insert(EpsilonK, arr1(&[250.0, 180.0, 300.0]));
        values
    }

    fn names() -> Vec<String> {
        vec!["a".into(), "b".into(), "c".into()]
    }

    #[test]
    fn symmetric_with_exact_diagonal() -> Result<(), ParameterError> {
        let values = self_values();
        let m = cross_interaction_matrices(
            &names(),
            &values,
            &square_well_rules(),
            &CrossOverrides::new(),
        )?;
        for (p, matrix) in m.iter() {
            for k in 0..3 {
                assert_eq!(matrix[(k, k)], values[p][k]);
                for l in 0..3 {
                    assert_eq!(matrix[(k, l)], matrix[(l, k)]);
                }
            }
        }
        Ok(())
    }

    #[test]
    fn square_well_rules_values() -> Result<(), ParameterError> {
        let m = cross_interaction_matrices(
            &names(),
            &self_values(),
            &square_well_rules(),
            &CrossOverrides::new(),
        )?;
        let s = 0.5 * (0.4 + 0.35);
        assert_relative_eq!(m[&Sigma][(0, 1)], s, epsilon = 1e-14);
        let (w0, w1) = (0.4f64.powi(3), 0.35f64.powi(3));
        let l = (1.5 * w0 + 1.6 * w1) / (w0 + w1);
        assert_relative_eq!(m[&Lambda][(0, 1)], l, epsilon = 1e-14);
        let e = (250.0f64 * 180.0).sqrt()
            * (w0 * (1.5f64.powi(3) - 1.0) * w1 * (1.6f64.powi(3) - 1.0)).sqrt()
            / (s.powi(3) * (l.powi(3) - 1.0));
        assert_relative_eq!(m[&EpsilonK][(0, 1)], e, epsilon = 1e-10);
        Ok(())
    }

    #[test]
    fn override_wins() -> Result<(), ParameterError> {
        let mut overrides = CrossOverrides::new();
        overrides.insert(2, 0, EpsilonK, 123.0);
        let m =
            cross_interaction_matrices(&names(), &self_values(), &square_well_rules(), &overrides)?;
        assert_eq!(m[&EpsilonK][(0, 2)], 123.0);
        assert_eq!(m[&EpsilonK][(2, 0)], 123.0);
        assert!(m[&EpsilonK][(0, 1)] != 123.0);
        Ok(())
    }

    #[test]
    fn missing_auxiliary_parameter() {
        let rules = MixingRules::new(&[(Lambda, MixingRule::WeightedMean { weight: Sigma })]);
        let result =
            cross_interaction_matrices(&names(), &self_values(), &rules, &CrossOverrides::new());
        assert!(matches!(result, Err(ParameterError::MissingParameter(..))));
    }

    #[test]
    fn mie_rules() -> Result<(), ParameterError> {
        let rules = MixingRules::new(&[
            (Sigma, MixingRule::Mean),
            (LambdaR, MixingRule::MieExponent),
            (EpsilonK, MixingRule::MieBerthelot { size: Sigma }),
        ]);
        let mut values = IndexMap::new();
        values.insert(Sigma, arr1(&[0.4077, 0.488]));
        values.insert(LambdaR, arr1(&[15.05, 19.871]));
        values.insert(EpsilonK, arr1(&[256.77, 473.39]));
        let m = cross_interaction_matrices(
            &names()[..2],
            &values,
            &rules,
            &CrossOverrides::new(),
        )?;
        let s: f64 = 0.5 * (0.4077 + 0.488);
        assert_relative_eq!(
            m[&LambdaR][(0, 1)],
            3.0 + (12.05f64 * 16.871).sqrt(),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            m[&EpsilonK][(0, 1)],
            (0.4077f64.powi(3) * 0.488f64.powi(3)).sqrt() / s.powi(3) * (256.77f64 * 473.39).sqrt(),
            epsilon = 1e-10
        );
        Ok(())
    }

    #[test]
    fn component_averages() -> Result<(), ParameterError> {
        let m = cross_interaction_matrices(
            &names(),
            &self_values(),
            &square_well_rules(),
            &CrossOverrides::new(),
        )?;
        let zki = arr2(&[[0.25, 0.75, 0.0], [0.0, 0.0, 1.0]]);
        let avg = component_averaged_matrices(&zki, &m, &square_well_rules())?;
        let sigma_0 = (0.25 * 0.4f64.powi(3) + 0.75 * 0.35f64.powi(3)).cbrt();
        assert_relative_eq!(avg[&Sigma][(0, 0)], sigma_0, epsilon = 1e-14);
        assert_relative_eq!(avg[&Sigma][(1, 1)], 0.3, epsilon = 1e-14);
        assert_relative_eq!(avg[&EpsilonK][(1, 1)], 300.0, epsilon = 1e-12);
        let e = &m[&EpsilonK];
        let eps_0 = 0.0625 * e[(0, 0)] + 2.0 * 0.1875 * e[(0, 1)] + 0.5625 * e[(1, 1)];
        assert_relative_eq!(avg[&EpsilonK][(0, 0)], eps_0, epsilon = 1e-10);
        assert_relative_eq!(avg[&Sigma][(0, 1)], 0.5 * (sigma_0 + 0.3), epsilon = 1e-14);
        Ok(())
    }
}
