use crate::association::{AssociationParameters, AssociationRecord};
use crate::hard_sphere::HardSphereProperties;
use indexmap::IndexMap;
use ndarray::{Array1, Array2};
use num_dual::DualNum;
use saft_gamma_core::constants::ANGSTROM_TO_NM;
use saft_gamma_core::parameter::{
    bead_composition, cross_interaction_matrices, indexed_cross_records,
    occupied_volume_fractions, BeadParameter, BeadRecord, ComponentRecord, CrossOverrides,
    CrossRecord, MixingRule, MixingRules, Parameter, ParameterBounds, ParameterError,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};
use BeadParameter::*;

const X_K21: [f64; 21] = [
    -0.995657163025808080735527280689003,
    -0.973906528517171720077964012084452,
    -0.930157491355708226001207180059508,
    -0.865063366688984510732096688423493,
    -0.780817726586416897063717578345042,
    -0.679409568299024406234327365114874,
    -0.562757134668604683339000099272694,
    -0.433395394129247190799265943165784,
    -0.294392862701460198131126603103866,
    -0.148874338981631210884826001129720,
    0.000000000000000000000000000000000,
    0.148874338981631210884826001129720,
    0.294392862701460198131126603103866,
    0.433395394129247190799265943165784,
    0.562757134668604683339000099272694,
    0.679409568299024406234327365114874,
    0.780817726586416897063717578345042,
    0.865063366688984510732096688423493,
    0.930157491355708226001207180059508,
    0.973906528517171720077964012084452,
    0.995657163025808080735527280689003,
];

const W_K21: [f64; 21] = [
    0.011694638867371874278064396062192,
    0.032558162307964727478818972459390,
    0.054755896574351996031381300244580,
    0.075039674810919952767043140916190,
    0.093125454583697605535065465083366,
    0.109387158802297641899210590325805,
    0.123491976262065851077958109831074,
    0.134709217311473325928054001771707,
    0.142775938577060080797094273138717,
    0.147739104901338491374841515972068,
    0.149445554002916905664936468389821,
    0.147739104901338491374841515972068,
    0.142775938577060080797094273138717,
    0.134709217311473325928054001771707,
    0.123491976262065851077958109831074,
    0.109387158802297641899210590325805,
    0.093125454583697605535065465083366,
    0.075039674810919952767043140916190,
    0.054755896574351996031381300244580,
    0.032558162307964727478818972459390,
    0.011694638867371874278064396062192,
];

/// Maximum step of the Newton iteration for the lower integration limit in nm.
const MAX_STEP: f64 = 0.05;

fn one() -> f64 {
    1.0
}

/// SAFT-γ Mie bead parameters.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GammaMieRecord {
    /// Energetic parameter in units of Kelvin
    pub epsilon_k: f64,
    /// Bead diameter in units of Angstrom
    pub sigma: f64,
    /// Repulsive Mie exponent
    pub lr: f64,
    /// Attractive Mie exponent
    pub la: f64,
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

impl GammaMieRecord {
    pub fn new(epsilon_k: f64, sigma: f64, lr: f64, la: f64, sk: f64) -> Self {
        Self {
            epsilon_k,
            sigma,
            lr,
            la,
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

impl fmt::Display for GammaMieRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GammaMieRecord(epsilon_k={}", self.epsilon_k)?;
        write!(f, ", sigma={}", self.sigma)?;
        write!(f, ", lr={}", self.lr)?;
        write!(f, ", la={}", self.la)?;
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

/// SAFT-γ Mie parameters of an unlike bead pair that replace the mixing rules.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct GammaMieCrossRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub epsilon_k: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub sigma: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub lr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub la: Option<f64>,
    /// Association between sites of the two beads, `site1` on the first bead
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub association: Vec<AssociationRecord>,
}

impl GammaMieCrossRecord {
    /// Cross record that only replaces the energy parameter.
    pub fn epsilon_k(epsilon_k: f64) -> Self {
        Self {
            epsilon_k: Some(epsilon_k),
            ..Default::default()
        }
    }
}

impl fmt::Display for GammaMieCrossRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GammaMieCrossRecord(")?;
        let values = [
            ("epsilon_k", self.epsilon_k),
            ("sigma", self.sigma),
            ("lr", self.lr),
            ("la", self.la),
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

/// Parameters of the SAFT-γ Mie equation of state.
///
/// Bead pair matrices (`_kl`) are indexed by the beads that occur in at least
/// one component. The chain term uses molecular averages of the bead pair
/// parameters (`_ii`), weighted by the occupied volume fractions. All
/// lengths in nm.
pub struct GammaMieParameters {
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
    pub lr_kl: Array2<f64>,
    pub la_kl: Array2<f64>,
    /// Prefactors of the Mie potentials
    pub c_kl: Array2<f64>,
    /// Van der Waals constants of the Mie potentials divided by `2π ε σ³`
    pub alpha_kl: Array2<f64>,
    pub sigma_ii: Array1<f64>,
    pub epsilon_k_ii: Array1<f64>,
    pub lr_ii: Array1<f64>,
    pub la_ii: Array1<f64>,
    pub c_ii: Array1<f64>,
    pub alpha_ii: Array1<f64>,
    pub association: AssociationParameters,
    pub component_records: Vec<ComponentRecord>,
    pub bead_records: Vec<BeadRecord<GammaMieRecord>>,
    pub cross_records: Vec<CrossRecord<GammaMieCrossRecord>>,
}

/// Prefactor of the Mie potential.
fn mie_prefactor(lr: f64, la: f64) -> f64 {
    lr / (lr - la) * (lr / la).powf(la / (lr - la))
}

/// Dimensionless van der Waals constant of the Mie potential.
fn mie_alpha(c: f64, lr: f64, la: f64) -> f64 {
    c * (1.0 / (la - 3.0) - 1.0 / (lr - 3.0))
}

/// Molecular average `Σ_k Σ_l zki zli p_kl` of a bead pair matrix.
fn molecular_average(zki: &Array2<f64>, p_kl: &Array2<f64>) -> Array1<f64> {
    zki.outer_iter().map(|z| z.dot(&p_kl.dot(&z))).collect()
}

impl GammaMieParameters {
    /// Admissible ranges of the bead parameters (sigma in Angstrom).
    pub fn bounds() -> ParameterBounds {
        ParameterBounds::new(&[
            (EpsilonK, 10.0, 1000.0),
            (LambdaR, 6.0, 40.0),
            (LambdaA, 3.0, 8.0),
            (Sigma, 0.1, 10.0),
            (Sk, 0.1, 1.0),
            (EpsilonKHb, 100.0, 5000.0),
            (Kappa, 1e-5, 1e4),
        ])
    }

    pub fn mixing_rules() -> MixingRules {
        MixingRules::new(&[
            (Sigma, MixingRule::Mean),
            (LambdaR, MixingRule::MieExponent),
            (LambdaA, MixingRule::MieExponent),
            (EpsilonK, MixingRule::MieBerthelot { size: Sigma }),
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

    /// Energy of the Mie potential between beads `k` and `l` in units of
    /// Kelvin and its derivative with respect to the distance `r` (nm).
    pub fn mie_potential_kl<D: DualNum<f64> + Copy>(&self, k: usize, l: usize, r: D) -> [D; 2] {
        let lr = self.lr_kl[(k, l)];
        let la = self.la_kl[(k, l)];
        let s = self.sigma_kl[(k, l)];
        let c_eps = self.c_kl[(k, l)] * self.epsilon_k_kl[(k, l)];

        let u = (r.powf(lr).recip() * s.powf(lr) - r.powf(la).recip() * s.powf(la)) * c_eps;
        let u_r = (-r.powf(lr + 1.0).recip() * lr * s.powf(lr)
            + r.powf(la + 1.0).recip() * la * s.powf(la))
            * c_eps;
        [u, u_r]
    }

    /// Distance below which the Boltzmann factor of the repulsion is
    /// negligible, the lower limit of the diameter integral.
    fn zero_integrand<D: DualNum<f64> + Copy>(&self, k: usize, l: usize, inverse_temperature: D) -> D {
        let mut r = D::one() * self.sigma_kl[(k, l)] * 0.7;
        let mut f = D::zero();
        for _ in 1..20 {
            let [u, u_r] = self.mie_potential_kl(k, l, r);
            f = inverse_temperature * u + f64::EPSILON.ln();
            if f.re().abs() < 1.0e-12 {
                break;
            }
            let mut dr = -(f / (inverse_temperature * u_r));
            if dr.re().abs() > MAX_STEP {
                dr = dr * (MAX_STEP / dr.re().abs());
            }
            r += dr;
        }
        if f.re().abs() > 1.0e-12 {
            warn!(
                "Lower limit of the diameter integral of {}-{} did not converge: {}",
                self.bead_identifiers[k],
                self.bead_identifiers[l],
                f.re().abs()
            );
        }
        r
    }

    /// Barker-Henderson diameter
    /// $d_{kl}=\int_0^{\sigma_{kl}}\left(1-e^{-\beta u_{kl}(r)}\right)\mathrm{d}r$
    /// from a 21-point Gauss-Kronrod quadrature.
    pub fn hs_diameter_kl<D: DualNum<f64> + Copy>(
        &self,
        k: usize,
        l: usize,
        inverse_temperature: D,
    ) -> D {
        let r0 = self.zero_integrand(k, l, inverse_temperature);
        let width = (-r0 + self.sigma_kl[(k, l)]) * 0.5;
        X_K21.iter().zip(W_K21.iter()).fold(r0, |d, (&x, &w)| {
            let r = width * x + width + r0;
            let [u, _] = self.mie_potential_kl(k, l, r);
            let f_u = -(-u * inverse_temperature).exp() + 1.0;
            d + width * f_u * w
        })
    }
}

impl Parameter for GammaMieParameters {
    type Bead = GammaMieRecord;
    type Cross = GammaMieCrossRecord;

    fn from_records(
        component_records: Vec<ComponentRecord>,
        bead_records: Vec<BeadRecord<GammaMieRecord>>,
        cross_records: Vec<CrossRecord<GammaMieCrossRecord>>,
    ) -> Result<Self, ParameterError> {
        let (beads, nui) = bead_composition(&component_records, &bead_records)?;
        let bounds = Self::bounds();

        let bead_identifiers: Vec<String> = beads.iter().map(|b| b.identifier.clone()).collect();
        for bead in beads.iter() {
            let (id, r) = (&bead.identifier, &bead.model_record);
            bounds.check(EpsilonK, id, r.epsilon_k)?;
            bounds.check(Sigma, id, r.sigma)?;
            bounds.check(LambdaR, id, r.lr)?;
            bounds.check(LambdaA, id, r.la)?;
            bounds.check(Sk, id, r.sk)?;
            if r.lr <= r.la {
                return Err(ParameterError::IncompatibleParameters(format!(
                    "repulsive exponent {} of {} is not larger than the attractive exponent {}",
                    r.lr, id, r.la
                )));
            }
        }
        let bead_property = |f: fn(&GammaMieRecord) -> f64| -> Array1<f64> {
            beads.iter().map(|b| f(&b.model_record)).collect()
        };
        let vks = bead_property(|r| r.vks);
        let sk = bead_property(|r| r.sk);
        let bead_molarweight: Array1<f64> = beads.iter().map(|b| b.molarweight).collect();

        let mut self_values = IndexMap::new();
        self_values.insert(Sigma, bead_property(|r| r.sigma) * ANGSTROM_TO_NM);
        self_values.insert(LambdaR, bead_property(|r| r.lr));
        self_values.insert(LambdaA, bead_property(|r| r.la));
        self_values.insert(EpsilonK, bead_property(|r| r.epsilon_k));

        let mut overrides = CrossOverrides::new();
        let mut cross_association = Vec::new();
        for ((k, l), r) in indexed_cross_records(&bead_identifiers, &cross_records) {
            let id = format!("{}-{}", bead_identifiers[k], bead_identifiers[l]);
            let values = [
                (EpsilonK, r.epsilon_k, 1.0),
                (Sigma, r.sigma, ANGSTROM_TO_NM),
                (LambdaR, r.lr, 1.0),
                (LambdaA, r.la, 1.0),
            ];
            for (parameter, value, unit) in values {
                if let Some(value) = value {
                    bounds.check(parameter, &id, value)?;
                    overrides.insert(k, l, parameter, value * unit);
                }
            }
            if !r.association.is_empty() {
                cross_association.push(((k, l), r.association.clone()));
            }
        }

        let kl = cross_interaction_matrices(
            &bead_identifiers,
            &self_values,
            &Self::mixing_rules(),
            &overrides,
        )?;
        let zki = occupied_volume_fractions(&nui, &vks, &sk)?;

        let sigma_kl = kl[&Sigma].clone();
        let epsilon_k_kl = kl[&EpsilonK].clone();
        let lr_kl = kl[&LambdaR].clone();
        let la_kl = kl[&LambdaA].clone();
        let c_kl = Array2::from_shape_fn(sigma_kl.raw_dim(), |kl| {
            mie_prefactor(lr_kl[kl], la_kl[kl])
        });
        let alpha_kl =
            Array2::from_shape_fn(sigma_kl.raw_dim(), |kl| mie_alpha(c_kl[kl], lr_kl[kl], la_kl[kl]));

        let sigma_ii = molecular_average(&zki, &sigma_kl.mapv(|s| s.powi(3))).mapv(f64::cbrt);
        let epsilon_k_ii = molecular_average(&zki, &epsilon_k_kl);
        let lr_ii = molecular_average(&zki, &lr_kl);
        let la_ii = molecular_average(&zki, &la_kl);
        let c_ii: Array1<f64> = lr_ii
            .iter()
            .zip(la_ii.iter())
            .map(|(&lr, &la)| mie_prefactor(lr, la))
            .collect();
        let alpha_ii = Array1::from_shape_fn(c_ii.len(), |i| mie_alpha(c_ii[i], lr_ii[i], la_ii[i]));

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
            lr_kl,
            la_kl,
            c_kl,
            alpha_kl,
            sigma_ii,
            epsilon_k_ii,
            lr_ii,
            la_ii,
            c_ii,
            alpha_ii,
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
        &[BeadRecord<GammaMieRecord>],
        &[CrossRecord<GammaMieCrossRecord>],
    ) {
        (
            &self.component_records,
            &self.bead_records,
            &self.cross_records,
        )
    }
}

impl HardSphereProperties for GammaMieParameters {
    fn hs_diameter<D: DualNum<f64> + Copy>(&self, temperature: D) -> Array1<D> {
        let beta = temperature.recip();
        Array1::from_shape_fn(self.nbeads(), |k| self.hs_diameter_kl(k, k, beta))
    }
}

impl fmt::Display for GammaMieParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GammaMieParameters(")?;
        write!(f, "\n\tbeads={:?}", self.bead_identifiers)?;
        write!(f, "\n\tnui={}", self.nui)?;
        write!(f, "\n\tsigma_kl={}", self.sigma_kl)?;
        write!(f, "\n\tepsilon_k_kl={}", self.epsilon_k_kl)?;
        write!(f, "\n\tlr_kl={}", self.lr_kl)?;
        write!(f, "\n\tla_kl={}", self.la_kl)?;
        if !self.association.is_empty() {
            write!(f, "\n\tsites={:?}", self.association.site_names)?;
        }
        write!(f, "\n)")
    }
}

/// Parameter sets used in tests and benchmarks.
///
/// Alkyl groups from Papaioannou et al. (2014), water from Dufal et al. (2015).
pub mod utils {
    use super::*;

    pub fn bead_records() -> Vec<BeadRecord<GammaMieRecord>> {
        vec![
            BeadRecord::new(
                "CH3".into(),
                15.035,
                GammaMieRecord::new(256.77, 4.077, 15.05, 6.0, 0.5725),
            ),
            BeadRecord::new(
                "CH2".into(),
                14.027,
                GammaMieRecord::new(473.39, 4.880, 19.871, 6.0, 0.22932),
            ),
            BeadRecord::new(
                "H2O".into(),
                18.015,
                GammaMieRecord::new(266.68, 3.0063, 17.02, 6.0, 1.0).with_association(
                    &[("H", 2.0), ("e1", 2.0)],
                    vec![AssociationRecord::new("H", "e1", 1985.4, 0.10169)],
                ),
            ),
        ]
    }

    pub fn cross_records() -> Vec<CrossRecord<GammaMieCrossRecord>> {
        vec![CrossRecord::new(
            "CH3".into(),
            "CH2".into(),
            GammaMieCrossRecord::epsilon_k(350.77),
        )]
    }

    fn alkane(name: &str, ch2: f64) -> ComponentRecord {
        ComponentRecord::new(name, [("CH3", 2.0), ("CH2", ch2)], 0.0)
    }

    pub fn butane() -> Result<GammaMieParameters, ParameterError> {
        GammaMieParameters::from_records(
            vec![alkane("butane", 2.0)],
            bead_records(),
            cross_records(),
        )
    }

    pub fn butane_hexane() -> Result<GammaMieParameters, ParameterError> {
        GammaMieParameters::from_records(
            vec![alkane("butane", 2.0), alkane("hexane", 4.0)],
            bead_records(),
            cross_records(),
        )
    }

    pub fn water() -> Result<GammaMieParameters, ParameterError> {
        GammaMieParameters::from_records(
            vec![ComponentRecord::new("water", [("H2O", 1.0)], 0.0)],
            bead_records(),
            cross_records(),
        )
    }

    /// Single bead per molecule with a fractional number of segments.
    pub fn mie_fluid(
        segments: f64,
        epsilon_k: f64,
        sigma: f64,
        lr: f64,
        la: f64,
    ) -> Result<GammaMieParameters, ParameterError> {
        GammaMieParameters::from_records(
            vec![ComponentRecord::new("fluid", [("M", segments)], 0.0)],
            vec![BeadRecord::new(
                "M".into(),
                16.0,
                GammaMieRecord::new(epsilon_k, sigma, lr, la, 1.0),
            )],
            vec![],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::utils::*;
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mixing_and_averages() -> Result<(), ParameterError> {
        let p = butane_hexane()?;
        assert_eq!(p.epsilon_k_kl[(0, 1)], 350.77);
        assert_relative_eq!(
            p.lr_kl[(0, 1)],
            3.0 + (12.05f64 * 16.871).sqrt(),
            max_relative = 1e-14
        );
        assert_eq!(p.la_kl[(0, 1)], 6.0);
        for i in 0..2 {
            assert_relative_eq!(p.zki.row(i).sum(), 1.0, epsilon = 1e-14);
        }
        // averages lie between the bead values
        assert!(p.sigma_ii[1] > p.sigma_ii[0]);
        assert!(p.sigma_ii[1] < 0.488);
        assert!(p.epsilon_k_ii[0] > 256.77 && p.epsilon_k_ii[0] < 473.39);
        assert_relative_eq!(p.c_kl[(0, 0)], mie_prefactor(15.05, 6.0));
        Ok(())
    }

    #[test]
    fn lennard_jones_prefactor() {
        assert_relative_eq!(mie_prefactor(12.0, 6.0), 4.0, max_relative = 1e-14);
    }

    #[test]
    fn hs_diameter_quadrature() -> Result<(), ParameterError> {
        let p = mie_fluid(1.4373, 206.12, 3.7257, 12.4, 6.0)?;
        let t = 200.0;
        let d = p.hs_diameter(t)[0];
        assert!(d < 0.37257);

        // midpoint rule reference
        let n = 200_000;
        let h = 0.37257 / n as f64;
        let d_ref: f64 = (0..n)
            .map(|i| {
                let r = (i as f64 + 0.5) * h;
                let [u, _] = p.mie_potential_kl(0, 0, r);
                (1.0 - (-u / t).exp()) * h
            })
            .sum();
        assert_relative_eq!(d, d_ref, max_relative = 1e-6);

        // diameters shrink with increasing temperature
        assert!(p.hs_diameter(400.0)[0] < d);
        Ok(())
    }

    #[test]
    fn invalid_exponents() {
        let mut beads = bead_records();
        beads[0].model_record.lr = 6.0;
        let result = GammaMieParameters::from_records(
            vec![ComponentRecord::new("ethane", [("CH3", 2.0)], 0.0)],
            beads,
            vec![],
        );
        assert!(matches!(
            result,
            Err(ParameterError::IncompatibleParameters(_))
        ));
    }

    #[test]
    fn water_sites() -> Result<(), ParameterError> {
        let p = water()?;
        assert_eq!(p.association.sites.len(), 2);
        assert_eq!(p.association.sites[0].n, 2.0);
        assert_eq!(p.epsilon_k_ii[0], 266.68);
        Ok(())
    }
}
