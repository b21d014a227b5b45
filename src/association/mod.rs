//! Generic implementation of the SAFT association contribution
//! that can be used across models.
//!
//! Association sites live on beads. Every bead type carries a number of
//! sites of each site type, and the bonding between a site `a` on bead `k`
//! and a site `b` on bead `l` is characterized by an association energy
//! and either a bonding volume or the geometry (cutoff and position) of the
//! sites, from which the bonding volume is calculated.
use indexmap::{IndexMap, IndexSet};
use ndarray::*;
use num_dual::linalg::{norm, LU};
use num_dual::DualNum;
use saft_gamma_core::constants::ANGSTROM_TO_NM;
use saft_gamma_core::parameter::{BeadParameter, ParameterBounds, ParameterError};
use saft_gamma_core::EosResult;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use tracing::error;

/// Association parameters of a pair of sites.
///
/// The bonding volume is either given directly (`kappa` in nm³) or
/// calculated from the cutoff radius `rc` and the position `rd` of the sites
/// (both in Å).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AssociationRecord {
    /// Name of the site on the first bead
    pub site1: String,
    /// Name of the site on the second bead
    pub site2: String,
    /// Association energy in units of Kelvin
    pub epsilon_k_hb: f64,
    /// Bonding volume in nm³
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub kappa: Option<f64>,
    /// Cutoff radius of the site-site interaction in Å
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub rc: Option<f64>,
    /// Distance of the site from the bead center in Å
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub rd: Option<f64>,
}

impl AssociationRecord {
    /// Site pair with a given bonding volume.
    pub fn new(site1: &str, site2: &str, epsilon_k_hb: f64, kappa: f64) -> Self {
        Self {
            site1: site1.to_string(),
            site2: site2.to_string(),
            epsilon_k_hb,
            kappa: Some(kappa),
            rc: None,
            rd: None,
        }
    }

    /// Site pair with a bonding volume calculated from the site geometry.
    pub fn new_geometric(
        site1: &str,
        site2: &str,
        epsilon_k_hb: f64,
        rc: f64,
        rd: Option<f64>,
    ) -> Self {
        Self {
            site1: site1.to_string(),
            site2: site2.to_string(),
            epsilon_k_hb,
            kappa: None,
            rc: Some(rc),
            rd,
        }
    }

    fn bonding(&self, identifier: &str) -> Result<BondingVolume, ParameterError> {
        match (self.kappa, self.rc) {
            (Some(kappa), None) => Ok(BondingVolume::Kappa(kappa)),
            (None, Some(rc)) => Ok(BondingVolume::Geometric {
                rc: rc * ANGSTROM_TO_NM,
                rd: self.rd.map(|rd| rd * ANGSTROM_TO_NM),
            }),
            (None, None) => Err(ParameterError::MissingParameter(
                "kappa or rc".into(),
                format!("site pair {}-{} of {}", self.site1, self.site2, identifier),
            )),
            (Some(_), Some(_)) => Err(ParameterError::IncompatibleParameters(format!(
                "both kappa and rc are given for site pair {}-{} of {}",
                self.site1, self.site2, identifier
            ))),
        }
    }
}

impl fmt::Display for AssociationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssociationRecord(site1={}", self.site1)?;
        write!(f, ", site2={}", self.site2)?;
        write!(f, ", epsilon_k_hb={}", self.epsilon_k_hb)?;
        if let Some(kappa) = self.kappa {
            write!(f, ", kappa={}", kappa)?;
        }
        if let Some(rc) = self.rc {
            write!(f, ", rc={}", rc)?;
        }
        if let Some(rd) = self.rd {
            write!(f, ", rd={}", rd)?;
        }
        write!(f, ")")
    }
}

/// How the bonding volume of a site pair is obtained. Lengths in nm.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum BondingVolume {
    /// The sites do not interact.
    #[default]
    None,
    /// Constant bonding volume in nm³.
    Kappa(f64),
    /// Bonding volume from the cutoff radius and the site position.
    /// Without `rd`, the site position is a fixed fraction of the
    /// contact distance.
    Geometric { rc: f64, rd: Option<f64> },
}

/// Bonding volume in nm³ of two sites with cutoff radius `rc` placed at a
/// distance `rd` from the centers of two beads at contact distance `d`
/// (all lengths in nm).
///
/// $$K=\frac{\pi d^2}{18r_d^2}\left[\ln\left(\frac{r_c+2r_d}{d}\right)\left(6r_c^3+18r_c^2r_d-24r_d^3\right)+\left(r_c+2r_d-d\right)\left(22r_d^2-5r_dr_c-7r_dd-8r_c^2+r_cd+d^2\right)\right]$$
///
/// Without an explicit site position, `rd = reduction_ratio * d`. The
/// volume vanishes if the sites cannot overlap, i.e. for $r_c+2r_d\leq d$.
pub fn bonding_volume<D: DualNum<f64> + Copy>(
    rc: f64,
    rd: Option<f64>,
    d: D,
    reduction_ratio: f64,
) -> D {
    let rd = rd.map_or(d * reduction_ratio, D::from);
    let reach = rd * 2.0 + rc;
    if rc <= 0.0 || reach.re() <= d.re() {
        return D::zero();
    }
    let log = (reach / d).ln();
    d.powi(2) * PI / (rd.powi(2) * 18.0)
        * (log * ((rd * 18.0 + 6.0 * rc) * rc * rc - rd.powi(3) * 24.0)
            + (reach - d)
                * (rd.powi(2) * 22.0 - rd * (d * 7.0 + 5.0 * rc) + d.powi(2) + d * rc
                    - 8.0 * rc * rc))
}

/// Flattened association site, i.e. a site type on a bead type in a component.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AssociationSite {
    /// Index of the component
    pub component: usize,
    /// Index of the bead type
    pub bead: usize,
    /// Index of the site type
    pub site: usize,
    /// Number of these sites per molecule, `nui[i,k] * n[k,a]`
    pub n: f64,
}

/// Association parameters of all bead and site types of a system.
#[derive(Clone, Debug)]
pub struct AssociationParameters {
    /// Names of the site types
    pub site_names: Vec<String>,
    /// Number of sites of each type on each bead, `(nbeads, nsites)`
    pub sites_per_bead: Array2<f64>,
    /// Association energies in K, `(nbeads, nbeads, nsites, nsites)`
    pub epsilon_k_hb: Array4<f64>,
    /// Bonding volumes, `(nbeads, nbeads, nsites, nsites)`
    pub bonding: Array4<BondingVolume>,
    /// All sites that can form bonds
    pub sites: Vec<AssociationSite>,
}

impl AssociationParameters {
    /// Collects the association parameters.
    ///
    /// `sites` holds the number of sites of each type for every bead,
    /// `self_records` the site pairs of the bead with itself and
    /// `cross_records` the site pairs of unlike beads `(k, l)`, where `site1`
    /// is located on bead `k` and `site2` on bead `l`.
    pub fn new(
        bead_identifiers: &[String],
        sites: &[IndexMap<String, f64>],
        self_records: &[Vec<AssociationRecord>],
        cross_records: &[((usize, usize), Vec<AssociationRecord>)],
        nui: &Array2<f64>,
        bounds: &ParameterBounds,
    ) -> Result<Self, ParameterError> {
        let nbeads = bead_identifiers.len();
        let site_names: IndexSet<String> = sites.iter().flat_map(|s| s.keys().cloned()).collect();
        let nsites = site_names.len();

        let mut sites_per_bead = Array2::zeros((nbeads, nsites));
        for (k, s) in sites.iter().enumerate() {
            for (name, &n) in s.iter() {
                if n.is_nan() || n < 0.0 {
                    return Err(ParameterError::IncompatibleParameters(format!(
                        "{} sites of type {} on {}",
                        n, name, bead_identifiers[k]
                    )));
                }
                if let Some(a) = site_names.get_index_of(name) {
                    sites_per_bead[(k, a)] = n;
                }
            }
        }

        let mut epsilon_k_hb = Array4::zeros((nbeads, nbeads, nsites, nsites));
        let mut bonding = Array4::from_elem((nbeads, nbeads, nsites, nsites), BondingVolume::None);
        let pairs = self_records
            .iter()
            .enumerate()
            .map(|(k, r)| ((k, k), r))
            .chain(cross_records.iter().map(|(kl, r)| (*kl, r)));
        for ((k, l), records) in pairs {
            let identifier = format!("{}-{}", bead_identifiers[k], bead_identifiers[l]);
            for record in records {
                let site_index = |name: &str, bead: usize| {
                    site_names
                        .get_index_of(name)
                        .filter(|&a| sites_per_bead[(bead, a)] > 0.0)
                        .ok_or_else(|| {
                            ParameterError::IncompatibleParameters(format!(
                                "site {} is not located on {}",
                                name, bead_identifiers[bead]
                            ))
                        })
                };
                let a = site_index(&record.site1, k)?;
                let b = site_index(&record.site2, l)?;
                bounds.check(BeadParameter::EpsilonKHb, &identifier, record.epsilon_k_hb)?;
                let volume = record.bonding(&identifier)?;
                if let BondingVolume::Kappa(kappa) = volume {
                    bounds.check(BeadParameter::Kappa, &identifier, kappa)?;
                }
                epsilon_k_hb[(k, l, a, b)] = record.epsilon_k_hb;
                epsilon_k_hb[(l, k, b, a)] = record.epsilon_k_hb;
                bonding[(k, l, a, b)] = volume;
                bonding[(l, k, b, a)] = volume;
            }
        }

        let mut flat_sites = Vec::new();
        for (i, row) in nui.outer_iter().enumerate() {
            for (k, &count) in row.iter().enumerate() {
                for a in 0..nsites {
                    let n = count * sites_per_bead[(k, a)];
                    let bonds = bonding
                        .slice(s![k, .., a, ..])
                        .iter()
                        .any(|b| *b != BondingVolume::None);
                    if n > 0.0 && bonds {
                        flat_sites.push(AssociationSite {
                            component: i,
                            bead: k,
                            site: a,
                            n,
                        });
                    }
                }
            }
        }

        Ok(Self {
            site_names: site_names.into_iter().collect(),
            sites_per_bead,
            epsilon_k_hb,
            bonding,
            sites: flat_sites,
        })
    }

    /// Whether no site of the system is able to form bonds.
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

/// Implementation of the SAFT association Helmholtz energy contribution.
#[derive(Clone, Debug)]
pub struct Association {
    pub parameters: AssociationParameters,
    max_iter: usize,
    tol: f64,
}

impl Association {
    pub fn new(parameters: &AssociationParameters, max_iter: usize, tol: f64) -> Self {
        Self {
            parameters: parameters.clone(),
            max_iter,
            tol,
        }
    }

    /// Association strengths $\Delta$ between all pairs of flattened sites,
    /// $\Delta = \left(\exp\left(\frac{\varepsilon^\mathrm{HB}}{T}\right)-1\right)K g$.
    ///
    /// `kernel` returns the product of the bonding volume and the reference
    /// pair correlation of two sites for the given [BondingVolume].
    pub fn association_strength<D, F>(&self, temperature: D, kernel: F) -> Array2<D>
    where
        D: DualNum<f64> + Copy,
        F: Fn(&AssociationSite, &AssociationSite, BondingVolume) -> D,
    {
        let p = &self.parameters;
        let n = p.sites.len();
        Array2::from_shape_fn((n, n), |(s, t)| {
            let (s, t) = (&p.sites[s], &p.sites[t]);
            let idx = (s.bead, t.bead, s.site, t.site);
            match p.bonding[idx] {
                BondingVolume::None => D::zero(),
                volume => {
                    (temperature.recip() * p.epsilon_k_hb[idx]).exp_m1() * kernel(s, t, volume)
                }
            }
        })
    }

    /// Association contribution to the reduced Helmholtz energy per molecule,
    /// $$\frac{A^\mathrm{assoc}}{Nk_BT}=\sum_ix_i\sum_k\nu_{ik}\sum_an_{ka}\left(\ln X_{ika}-\frac{X_{ika}}{2}+\frac{1}{2}\right).$$
    ///
    /// `density` is the number density of molecules in 1/nm³. If the site
    /// fractions do not converge, the error is logged and NaN returned.
    pub fn helmholtz_energy<D: DualNum<f64> + Copy>(
        &self,
        density: D,
        molefracs: &Array1<D>,
        delta: &Array2<D>,
    ) -> D {
        let sites = &self.parameters.sites;
        let xn: Array1<D> = sites.iter().map(|s| molefracs[s.component] * s.n).collect();
        let rho = xn.mapv(|x| x * density);
        match self.site_fractions(&rho, delta) {
            Ok(x) => {
                let f = |x: D| x.ln() - x * 0.5 + 0.5;
                (xn * x.mapv(f)).sum()
            }
            Err(e) => {
                error!("Association: {}", e);
                D::from(f64::NAN)
            }
        }
    }

    /// Fractions of non-bonded sites, solved by Newton's method on the real
    /// part (Michelsen, 2006) and differentiated by additional Newton steps
    /// on the dual numbers.
    pub fn site_fractions<D: DualNum<f64> + Copy>(
        &self,
        rho: &Array1<D>,
        delta: &Array2<D>,
    ) -> EosResult<Array1<D>> {
        // check if density is close to 0
        if rho.iter().all(|r| r.re() < f64::EPSILON) {
            return Ok(Array1::ones(rho.len()));
        }

        let mut x = Array1::from_elem(rho.len(), 0.2);
        let rho_re = rho.map(D::re);
        let delta_re = delta.map(D::re);
        let mut converged = false;
        for _ in 0..self.max_iter {
            if Self::newton_step(&mut x, &delta_re, &rho_re, self.tol)? {
                converged = true;
                break;
            }
        }
        if !converged {
            return Err(saft_gamma_core::EosError::NotConverged(
                "Association site fractions".into(),
            ));
        }

        // calculate derivatives
        let mut x_dual = x.mapv(D::from);
        for _ in 0..D::NDERIV {
            Self::newton_step(&mut x_dual, delta, rho, self.tol)?;
        }
        Ok(x_dual)
    }

    fn newton_step<D: DualNum<f64> + Copy>(
        x: &mut Array1<D>,
        delta: &Array2<D>,
        rho: &Array1<D>,
        tol: f64,
    ) -> EosResult<bool> {
        let nassoc = x.len();
        // gradient
        let mut g = x.map(D::recip);
        // Hessian
        let mut h: Array2<D> = Array::zeros([nassoc; 2]);

        for i in 0..nassoc {
            let d = delta.index_axis(Axis(0), i);
            let dnx = (&*x * rho * &d).sum() + 1.0;
            g[i] -= dnx;

            // approximate hessian
            for j in 0..nassoc {
                h[(i, j)] = -d[j] * rho[j];
            }
            h[(i, i)] -= dnx / x[i];
        }

        // Newton step
        // avoid stepping to negative values for x (see Michelsen 2006)
        let delta_x = LU::new(h)?.solve(&g);
        Zip::from(x).and(&delta_x).for_each(|x, &delta_x| {
            if delta_x.re() < x.re() * 0.8 {
                *x -= delta_x
            } else {
                *x *= 0.2
            }
        });

        // check convergence
        Ok(norm(&g.map(D::re)) < tol)
    }
}

impl fmt::Display for Association {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Association")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr2;
    use num_dual::Dual64;

    fn bounds() -> ParameterBounds {
        ParameterBounds::new(&[
            (BeadParameter::EpsilonKHb, 100.0, 5000.0),
            (BeadParameter::Kappa, 1e-5, 1e4),
        ])
    }

    fn water_like(nui: Array2<f64>) -> Result<AssociationParameters, ParameterError> {
        let mut sites = IndexMap::new();
        sites.insert("H".to_string(), 2.0);
        sites.insert("e1".to_string(), 2.0);
        AssociationParameters::new(
            &["H2O".to_string()],
            &[sites],
            &[vec![AssociationRecord::new("H", "e1", 1985.4, 0.1)]],
            &[],
            &nui,
            &bounds(),
        )
    }

    #[test]
    fn flattened_sites() -> Result<(), ParameterError> {
        let p = water_like(arr2(&[[1.0]]))?;
        assert_eq!(p.site_names, ["H", "e1"]);
        assert_eq!(p.sites.len(), 2);
        assert_eq!(p.epsilon_k_hb[(0, 0, 0, 1)], 1985.4);
        assert_eq!(p.epsilon_k_hb[(0, 0, 1, 0)], 1985.4);
        assert_eq!(p.bonding[(0, 0, 0, 0)], BondingVolume::None);
        Ok(())
    }

    #[test]
    fn unknown_site() {
        let mut sites = IndexMap::new();
        sites.insert("H".to_string(), 1.0);
        let result = AssociationParameters::new(
            &["OH".to_string()],
            &[sites],
            &[vec![AssociationRecord::new("H", "e1", 2000.0, 0.1)]],
            &[],
            &arr2(&[[1.0]]),
            &bounds(),
        );
        assert!(matches!(
            result,
            Err(ParameterError::IncompatibleParameters(_))
        ));
    }

    #[test]
    fn missing_bonding_volume() {
        let mut record = AssociationRecord::new("H", "e1", 2000.0, 0.1);
        record.kappa = None;
        assert!(matches!(
            record.bonding("OH"),
            Err(ParameterError::MissingParameter(..))
        ));
    }

    #[test]
    fn two_site_analytic_solution() -> Result<(), Box<dyn std::error::Error>> {
        // one A and one B site per molecule: X = (-1 + sqrt(1 + 4 rho delta)) / (2 rho delta)
        let mut sites = IndexMap::new();
        sites.insert("A".to_string(), 1.0);
        sites.insert("B".to_string(), 1.0);
        let p = AssociationParameters::new(
            &["X".to_string()],
            &[sites],
            &[vec![AssociationRecord::new("A", "B", 2000.0, 0.05)]],
            &[],
            &arr2(&[[1.0]]),
            &bounds(),
        )?;
        let assoc = Association::new(&p, 50, 1e-12);
        let delta = assoc.association_strength(300.0, |_, _, v| match v {
            BondingVolume::Kappa(k) => k * 1.5,
            _ => 0.0,
        });
        let rho = 10.0;
        let rd = rho * delta[(0, 1)];
        let x = assoc.site_fractions(&Array1::from_elem(2, rho), &delta)?;
        let x_analytic = (-1.0 + (1.0 + 4.0 * rd).sqrt()) / (2.0 * rd);
        assert_relative_eq!(x[0], x_analytic, max_relative = 1e-10);
        assert_relative_eq!(x[1], x_analytic, max_relative = 1e-10);

        let a = assoc.helmholtz_energy(rho, &Array1::ones(1), &delta);
        let f = |x: f64| x.ln() - 0.5 * x + 0.5;
        assert_relative_eq!(a, 2.0 * f(x_analytic), max_relative = 1e-10);

        // derivative with respect to density by a dual Newton step
        let rho_dual = Dual64::from_re(rho).derivative();
        let delta_dual = delta.mapv(Dual64::from);
        let a_dual = assoc.helmholtz_energy(rho_dual, &Array1::ones(1), &delta_dual);
        let h = 1e-6;
        let fd = (assoc.helmholtz_energy(rho + h, &Array1::ones(1), &delta)
            - assoc.helmholtz_energy(rho - h, &Array1::ones(1), &delta))
            / (2.0 * h);
        assert_relative_eq!(a_dual.eps, fd, max_relative = 1e-6);
        Ok(())
    }

    #[test]
    fn geometric_bonding_volume() {
        let d = 0.4;
        // no overlap of the sites
        assert_eq!(bonding_volume(0.05, Some(0.1), d, 0.25), 0.0);
        assert_eq!(bonding_volume(0.0, Some(0.1), d, 0.25), 0.0);
        // sites just touching at rc + 2 rd = d
        assert_eq!(bonding_volume(0.2, Some(0.1), d, 0.25), 0.0);
        let k = bonding_volume(0.25, Some(0.1), d, 0.25);
        assert!(k > 0.0);
        // grows with the cutoff radius
        assert!(bonding_volume(0.3, Some(0.1), d, 0.25) > k);
        // default site position from the reduction ratio
        assert_eq!(bonding_volume(0.25, None, d, 0.25), k);
        let kd = bonding_volume(0.25, Some(0.1), Dual64::from_re(d).derivative(), 0.25);
        assert_relative_eq!(kd.re, k);
        assert!(kd.eps.is_finite());
    }
}
