use crate::association::{AssociationParameters, AssociationRecord};
use crate::hard_sphere::HardSphereProperties;
use indexmap::IndexMap;
use ndarray::{Array1, Array2};
use num_dual::DualNum;
use saft_gamma_core::constants::ANGSTROM_TO_NM;
use saft_gamma_core::parameter::{
    bead_composition, component_averaged_matrices, cross_interaction_matrices,
    indexed_cross_records, occupied_volume_fractions, BeadParameter, BeadRecord, ComponentRecord,
    CrossOverrides, CrossRecord, MixingRule, MixingRules, Parameter, ParameterBounds,
    ParameterError,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use tracing::info;
use BeadParameter::*;

fn one() -> f64 {
    1.0
}

/// SAFT-γ SW bead parameters.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GammaSwRecord {
    /// Depth of the square well in units of Kelvin
    pub epsilon_k: f64,
    /// Bead diameter in units of Angstrom
    pub sigma: f64,
    /// Range of the square well in units of sigma
    pub lambda: f64,
    /// Shape factor
    pub sk: f64,
    /// Number of identical segments of the bead
    #[serde(default = "one")]
    pub vks: f64,
    /// Number of association sites of each type
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    #[serde(default)]
    pub sites: IndexMap<String, f64>,
    /// Association between sites of this bead
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub association: Vec<AssociationRecord>,
}

impl GammaSwRecord {
    pub fn new(epsilon_k: f64, sigma: f64, lambda: f64, sk: f64) -> Self {
        Self {
            epsilon_k,
            sigma,
            lambda,
            sk,
            vks: 1.0,
            sites: IndexMap::new(),
            association: Vec::new(),
        }
    }

    /// Adds association sites and the site pairs of the bead with itself.
    pub fn with_association(
        mut self,
        sites: &[(&str, f64)],
        association: Vec<AssociationRecord>,
    ) -> Self {
        self.sites = sites.iter().map(|&(s, n)| (s.to_string(), n)).collect();
        self.association = association;
        self
    }
}

impl fmt::Display for GammaSwRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GammaSwRecord(epsilon_k={}", self.epsilon_k)?;
        write!(f, ", sigma={}", self.sigma)?;
        write!(f, ", lambda={}", self.lambda)?;
        write!(f, ", sk={}", self.sk)?;
        if self.vks != 1.0 {
            write!(f, ", vks={}", self.vks)?;
        }
        if !self.sites.is_empty() {
            write!(f, ", sites={:?}", self.sites)?;
        }
        for a in self.association.iter() {
            write!(f, ", {}", a)?;
        }
        write!(f, ")")
    }
}

/// SAFT-γ SW parameters of an unlike bead pair that replace the mixing rules.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct GammaSwCrossRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub epsilon_k: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub sigma: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub lambda: Option<f64>,
    /// Association between sites of the two beads, `site1` on the first bead
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub association: Vec<AssociationRecord>,
}

impl fmt::Display for GammaSwCrossRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GammaSwCrossRecord(")?;
        let values = [
            ("epsilon_k", self.epsilon_k),
            ("sigma", self.sigma),
            ("lambda", self.lambda),
        ];
        let given: Vec<_> = values
            .iter()
            .filter_map(|(n, v)| v.map(|v| format!("{}={}", n, v)))
            .collect();
        write!(f, "{}", given.join(", "))?;
        for a in self.association.iter() {
            write!(f, ", {}", a)?;
        }
        write!(f, ")")
    }
}

/// Parameters of the SAFT-γ SW equation of state.
///
/// Bead pair matrices (`_kl`) are indexed by the beads that occur in at least
/// one component, component matrices (`_ij`) hold the component averaged
/// parameters used in the chain term. All lengths in nm.
pub struct GammaSwParameters {
    pub molarweight: Array1<f64>,
    pub bead_identifiers: Vec<String>,
    pub bead_molarweight: Array1<f64>,
    pub nui: Array2<f64>,
    pub vks: Array1<f64>,
    pub sk: Array1<f64>,
    pub num_rings: Array1<f64>,
    /// Occupied volume fractions of the beads in every component
    pub zki: Array2<f64>,
    /// Number of segments per molecule, `Σ_k nui[i,k] Vk Sk`
    pub segments: Array1<f64>,
    pub sigma_kl: Array2<f64>,
    pub epsilon_k_kl: Array2<f64>,
    pub lambda_kl: Array2<f64>,
    /// Van der Waals attractive constants `2π/3 ε σ³ (λ³ - 1)`
    pub alpha_kl: Array2<f64>,
    pub sigma_ij: Array2<f64>,
    pub epsilon_k_ij: Array2<f64>,
    pub lambda_ij: Array2<f64>,
    pub association: AssociationParameters,
    pub component_records: Vec<ComponentRecord>,
    pub bead_records: Vec<BeadRecord<GammaSwRecord>>,
    pub cross_records: Vec<CrossRecord<GammaSwCrossRecord>>,
}

impl GammaSwParameters {
    /// Admissible ranges of the bead parameters (sigma in Angstrom).
    pub fn bounds() -> ParameterBounds {
        ParameterBounds::new(&[
            (EpsilonK, 10.0, 1000.0),
            (Lambda, 1.0, 10.0),
            (Sigma, 0.1, 10.0),
            (Sk, 0.1, 1.0),
            (EpsilonKHb, 100.0, 5000.0),
            (Kappa, 1e-5, 1e4),
        ])
    }

    /// Combining rules for bead pairs, also used for unlike component pairs.
    pub fn mixing_rules() -> MixingRules {
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

    /// Number of components.
    pub fn ncomp(&self) -> usize {
        self.nui.nrows()
    }

    /// Number of bead types.
    pub fn nbeads(&self) -> usize {
        self.nui.ncols()
    }
}

impl Parameter for GammaSwParameters {
    type Bead = GammaSwRecord;
    type Cross = GammaSwCrossRecord;

    fn from_records(
        component_records: Vec<ComponentRecord>,
        bead_records: Vec<BeadRecord<GammaSwRecord>>,
        cross_records: Vec<CrossRecord<GammaSwCrossRecord>>,
    ) -> Result<Self, ParameterError> {
        let (beads, nui) = bead_composition(&component_records, &bead_records)?;
        let bounds = Self::bounds();

        let bead_identifiers: Vec<String> = beads.iter().map(|b| b.identifier.clone()).collect();
        for bead in beads.iter() {
            let (id, r) = (&bead.identifier, &bead.model_record);
            bounds.check(EpsilonK, id, r.epsilon_k)?;
            bounds.check(Sigma, id, r.sigma)?;
            bounds.check(Lambda, id, r.lambda)?;
            bounds.check(Sk, id, r.sk)?;
        }
        let bead_property = |f: fn(&GammaSwRecord) -> f64| -> Array1<f64> {
            beads.iter().map(|b| f(&b.model_record)).collect()
        };
        let vks = bead_property(|r| r.vks);
        let sk = bead_property(|r| r.sk);
        let bead_molarweight: Array1<f64> = beads.iter().map(|b| b.molarweight).collect();

        let mut self_values = IndexMap::new();
        self_values.insert(Sigma, bead_property(|r| r.sigma) * ANGSTROM_TO_NM);
        self_values.insert(Lambda, bead_property(|r| r.lambda));
        self_values.insert(EpsilonK, bead_property(|r| r.epsilon_k));

        let mut overrides = CrossOverrides::new();
        let mut cross_association = Vec::new();
        for ((k, l), r) in indexed_cross_records(&bead_identifiers, &cross_records) {
            let id = format!("{}-{}", bead_identifiers[k], bead_identifiers[l]);
            if let Some(epsilon_k) = r.epsilon_k {
                bounds.check(EpsilonK, &id, epsilon_k)?;
                overrides.insert(k, l, EpsilonK, epsilon_k);
            }
            if let Some(sigma) = r.sigma {
                bounds.check(Sigma, &id, sigma)?;
                overrides.insert(k, l, Sigma, sigma * ANGSTROM_TO_NM);
            }
            if let Some(lambda) = r.lambda {
                bounds.check(Lambda, &id, lambda)?;
                overrides.insert(k, l, Lambda, lambda);
            }
            if !r.association.is_empty() {
                cross_association.push(((k, l), r.association.clone()));
            }
        }

        let rules = Self::mixing_rules();
        let kl = cross_interaction_matrices(&bead_identifiers, &self_values, &rules, &overrides)?;
        let zki = occupied_volume_fractions(&nui, &vks, &sk)?;
        let ij = component_averaged_matrices(&zki, &kl, &rules)?;

        let sigma_kl = kl[&Sigma].clone();
        let epsilon_k_kl = kl[&EpsilonK].clone();
        let lambda_kl = kl[&Lambda].clone();
        let alpha_kl = Array2::from_shape_fn(sigma_kl.raw_dim(), |(k, l)| {
            2.0 * PI / 3.0
                * epsilon_k_kl[(k, l)]
                * sigma_kl[(k, l)].powi(3)
                * (lambda_kl[(k, l)].powi(3) - 1.0)
        });

        let num_rings: Array1<f64> = component_records.iter().map(|c| c.num_rings).collect();
        if num_rings.iter().any(|&r| r != 0.0) {
            info!("Accepted component ring structure: {}", num_rings);
        }

        let sites: Vec<_> = beads.iter().map(|b| b.model_record.sites.clone()).collect();
        let self_association: Vec<_> = beads
            .iter()
            .map(|b| b.model_record.association.clone())
            .collect();
        let association = AssociationParameters::new(
            &bead_identifiers,
            &sites,
            &self_association,
            &cross_association,
            &nui,
            &bounds,
        )?;

        Ok(Self {
            molarweight: nui.dot(&bead_molarweight),
            segments: nui.dot(&(&vks * &sk)),
            bead_identifiers,
            bead_molarweight,
            nui,
            vks,
            sk,
            num_rings,
            zki,
            sigma_kl,
            epsilon_k_kl,
            lambda_kl,
            alpha_kl,
            sigma_ij: ij[&Sigma].clone(),
            epsilon_k_ij: ij[&EpsilonK].clone(),
            lambda_ij: ij[&Lambda].clone(),
            association,
            component_records,
            bead_records,
            cross_records,
        })
    }

    fn records(
        &self,
    ) -> (
        &[ComponentRecord],
        &[BeadRecord<GammaSwRecord>],
        &[CrossRecord<GammaSwCrossRecord>],
    ) {
        (
            &self.component_records,
            &self.bead_records,
            &self.cross_records,
        )
    }
}

impl HardSphereProperties for GammaSwParameters {
    fn hs_diameter<D: DualNum<f64> + Copy>(&self, _: D) -> Array1<D> {
        self.sigma_kl.diag().mapv(D::from)
    }
}

impl fmt::Display for GammaSwParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GammaSwParameters(")?;
        write!(f, "\n\tbeads={:?}", self.bead_identifiers)?;
        write!(f, "\n\tnui={}", self.nui)?;
        write!(f, "\n\tsigma_kl={}", self.sigma_kl)?;
        write!(f, "\n\tepsilon_k_kl={}", self.epsilon_k_kl)?;
        write!(f, "\n\tlambda_kl={}", self.lambda_kl)?;
        if !self.association.is_empty() {
            write!(f, "\n\tsites={:?}", self.association.site_names)?;
        }
        write!(f, "\n)")
    }
}

/// Parameter sets used in tests and benchmarks.
pub mod utils {
    use super::*;

    /// Alkyl and hydroxyl beads.
    pub fn bead_records() -> Vec<BeadRecord<GammaSwRecord>> {
        vec![
            BeadRecord::new("CH3".into(), 15.035, GammaSwRecord::new(250.0, 4.0, 1.5, 0.6)),
            BeadRecord::new(
                "CH2".into(),
                14.027,
                GammaSwRecord::new(230.0, 4.2, 1.55, 0.35),
            ),
            BeadRecord::new(
                "OH".into(),
                17.007,
                GammaSwRecord::new(300.0, 3.0, 1.6, 0.8).with_association(
                    &[("H", 1.0), ("e1", 2.0)],
                    vec![AssociationRecord::new("H", "e1", 2000.0, 1e-3)],
                ),
            ),
        ]
    }

    pub fn butane() -> Result<GammaSwParameters, ParameterError> {
        GammaSwParameters::from_records(
            vec![ComponentRecord::new(
                "butane",
                [("CH3", 2.0), ("CH2", 2.0)],
                0.0,
            )],
            bead_records(),
            vec![],
        )
    }

    pub fn propanol() -> Result<GammaSwParameters, ParameterError> {
        GammaSwParameters::from_records(
            vec![ComponentRecord::new(
                "1-propanol",
                [("CH3", 1.0), ("CH2", 2.0), ("OH", 1.0)],
                0.0,
            )],
            bead_records(),
            vec![],
        )
    }

    pub fn butane_hexane() -> Result<GammaSwParameters, ParameterError> {
        GammaSwParameters::from_records(
            vec![
                ComponentRecord::new("butane", [("CH3", 2.0), ("CH2", 2.0)], 0.0),
                ComponentRecord::new("hexane", [("CH3", 2.0), ("CH2", 4.0)], 0.0),
            ],
            bead_records(),
            vec![],
        )
    }

    pub fn butane_propanol() -> Result<GammaSwParameters, ParameterError> {
        GammaSwParameters::from_records(
            vec![
                ComponentRecord::new("butane", [("CH3", 2.0), ("CH2", 2.0)], 0.0),
                ComponentRecord::new(
                    "1-propanol",
                    [("CH3", 1.0), ("CH2", 2.0), ("OH", 1.0)],
                    0.0,
                ),
            ],
            bead_records(),
            vec![],
        )
    }

    /// A single spherical bead per molecule.
    pub fn single_bead(
        epsilon_k: f64,
        sigma: f64,
        lambda: f64,
    ) -> Result<GammaSwParameters, ParameterError> {
        GammaSwParameters::from_records(
            vec![ComponentRecord::new("monomer", [("A", 1.0)], 0.0)],
            vec![BeadRecord::new(
                "A".into(),
                16.0,
                GammaSwRecord::new(epsilon_k, sigma, lambda, 1.0),
            )],
            vec![],
        )
    }
}
