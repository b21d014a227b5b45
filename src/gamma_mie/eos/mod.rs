use super::{GammaMieCrossRecord, GammaMieParameters, GammaMieRecord};
use crate::association::{bonding_volume, Association, AssociationSite, BondingVolume};
use crate::hard_sphere::{self, packing_moments, HardSphereProperties};
use ndarray::{Array1, Array2, Array3, Array4};
use num_dual::DualNum;
use saft_gamma_core::constants::MOLECULE_PER_NM3;
use saft_gamma_core::parameter::{BeadRecord, CrossRecord, Parameter, ParameterError};
use saft_gamma_core::{
    check_density, check_temperature, validate_molefracs, CompositionCache,
    CompositionVariables, EosError, EosResult, IntoDensities, Residual,
};
use std::sync::Arc;
use tracing::info;

pub(crate) mod association;
pub(crate) mod chain;
pub(crate) mod monomer;

use monomer::Properties;

/// Customization options for the SAFT-γ Mie equation of state.
#[derive(Copy, Clone, Debug)]
pub struct GammaMieOptions {
    /// Packing fraction at the maximum density
    pub max_packing: f64,
    pub max_iter_cross_assoc: usize,
    pub tol_cross_assoc: f64,
    /// Site position relative to the contact distance for geometric
    /// bonding volumes without explicit `rd`
    pub reduction_ratio: f64,
}

impl Default for GammaMieOptions {
    fn default() -> Self {
        Self {
            max_packing: 0.65,
            max_iter_cross_assoc: 50,
            tol_cross_assoc: 1e-10,
            reduction_ratio: 0.25,
        }
    }
}

/// SAFT-γ Mie equation of state.
///
/// [Papaioannou et al. (2014)](https://doi.org/10.1063/1.4851455)
pub struct GammaMie {
    parameters: Arc<GammaMieParameters>,
    options: GammaMieOptions,
    association: Option<Association>,
    cache: CompositionCache,
}

impl GammaMie {
    pub fn new(parameters: Arc<GammaMieParameters>) -> Self {
        Self::with_options(parameters, GammaMieOptions::default())
    }

    pub fn with_options(parameters: Arc<GammaMieParameters>, options: GammaMieOptions) -> Self {
        let association = (!parameters.association.is_empty()).then(|| {
            Association::new(
                &parameters.association,
                options.max_iter_cross_assoc,
                options.tol_cross_assoc,
            )
        });
        Self {
            parameters,
            options,
            association,
            cache: CompositionCache::new(),
        }
    }

    pub fn parameters(&self) -> &Arc<GammaMieParameters> {
        &self.parameters
    }

    pub fn options(&self) -> &GammaMieOptions {
        &self.options
    }

    /// Equation of state for a subset of the components.
    pub fn subset(&self, component_list: &[usize]) -> Result<Self, ParameterError> {
        Ok(Self::with_options(
            Arc::new(self.parameters.subset(component_list)?),
            self.options,
        ))
    }

    /// Replaces bead and cross records and rebuilds all derived parameters.
    ///
    /// On error the equation of state is left unchanged.
    pub fn parameter_refresh(
        &mut self,
        bead_updates: &[BeadRecord<GammaMieRecord>],
        cross_updates: &[CrossRecord<GammaMieCrossRecord>],
    ) -> EosResult<()> {
        let parameters = self.parameters.refreshed(bead_updates, cross_updates)?;
        *self = Self::with_options(Arc::new(parameters), self.options);
        info!(
            "Refreshed parameters with {} bead and {} cross record(s)",
            bead_updates.len(),
            cross_updates.len()
        );
        Ok(())
    }

    /// Temperature dependent hard-sphere diameters of the beads in nm.
    pub fn hs_diameter(&self, temperature: f64) -> EosResult<Array1<f64>> {
        check_temperature("GammaMie::hs_diameter", temperature)?;
        Ok(self.parameters.hs_diameter(temperature))
    }

    /// Maximum molar density in mol/m³ for which the packing fraction
    /// $\zeta_3$ of the hard-sphere reference reaches `max_packing`.
    pub fn density_max_with_packing(
        &self,
        molefracs: &Array1<f64>,
        temperature: f64,
        max_packing: f64,
    ) -> EosResult<f64> {
        check_temperature("GammaMie::density_max", temperature)?;
        let composition = self.composition(molefracs)?;
        let s3 = self.parameters.zeta_moments(temperature, composition.as_ref())[3];
        Ok(max_packing / (s3 * MOLECULE_PER_NM3))
    }

    /// Validated densities and composition variables together with the bead
    /// diameters. Every density has to be below the maximum density.
    fn state_variables<R: IntoDensities>(
        &self,
        name: &str,
        density: R,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<(Array1<f64>, Arc<CompositionVariables<f64>>, Array1<f64>)> {
        check_temperature(name, temperature)?;
        let density = check_density(density)?;
        let composition = self.composition(molefracs)?;
        let diameter = self.parameters.hs_diameter(temperature);
        let s3 = packing_moments(&diameter, composition.as_ref())[3];
        let density_max = self.options.max_packing / (s3 * MOLECULE_PER_NM3);
        if let Some(&rho) = density.iter().find(|&&rho| rho >= density_max) {
            return Err(EosError::InvalidState(
                name.to_string(),
                format!("density (maximum density {} mol/m³)", density_max),
                rho,
            ));
        }
        Ok((density, composition, diameter))
    }

    /// Evaluates `f` for the state properties of every density.
    fn map_properties<R, T, F>(
        &self,
        name: &str,
        density: R,
        temperature: f64,
        molefracs: &Array1<f64>,
        f: F,
    ) -> EosResult<Vec<T>>
    where
        R: IntoDensities,
        F: Fn(f64, &CompositionVariables<f64>, &Array1<f64>, Properties<f64>) -> T,
    {
        let (density, composition, diameter) =
            self.state_variables(name, density, temperature, molefracs)?;
        let c = composition.as_ref();
        Ok(density
            .iter()
            .map(|&rho| {
                let rho = rho * MOLECULE_PER_NM3;
                let properties = Properties::with_diameters(&self.parameters, &diameter, rho, c);
                f(rho, c, &diameter, properties)
            })
            .collect())
    }

    /// Packing fraction moments $\zeta_m$, $m=0\ldots 3$, of the hard-sphere
    /// reference for every density, `(n, 4)`.
    pub fn reduced_density<R: IntoDensities>(
        &self,
        density: R,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<Array2<f64>> {
        let zeta = self.map_properties(
            "GammaMie::reduced_density",
            density,
            temperature,
            molefracs,
            |rho, c, d, _| packing_moments(d, c).map(|s| s * rho),
        )?;
        Ok(Array2::from_shape_fn((zeta.len(), 4), |(n, m)| zeta[n][m]))
    }

    fn helmholtz_term<R, F>(
        &self,
        name: &str,
        density: R,
        temperature: f64,
        molefracs: &Array1<f64>,
        f: F,
    ) -> EosResult<Array1<f64>>
    where
        R: IntoDensities,
        F: Fn(f64, &CompositionVariables<f64>, &Array1<f64>, Properties<f64>) -> f64,
    {
        Ok(Array1::from_vec(self.map_properties(
            name,
            density,
            temperature,
            molefracs,
            f,
        )?))
    }

    /// Hard-sphere contribution to the reduced Helmholtz energy.
    pub fn a_hard_sphere<R: IntoDensities>(
        &self,
        density: R,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<Array1<f64>> {
        self.helmholtz_term(
            "GammaMie::a_hard_sphere",
            density,
            temperature,
            molefracs,
            |rho, c, d, _| hard_sphere::helmholtz_energy(rho, &packing_moments(d, c)),
        )
    }

    /// First-order perturbation contribution to the reduced Helmholtz energy.
    pub fn a_first_order<R: IntoDensities>(
        &self,
        density: R,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<Array1<f64>> {
        self.helmholtz_term(
            "GammaMie::a_first_order",
            density,
            temperature,
            molefracs,
            |_, c, _, props| {
                monomer::a_first_order(&self.parameters, &props, temperature, c.segments_per_molecule)
            },
        )
    }

    /// Second-order perturbation contribution to the reduced Helmholtz energy.
    pub fn a_second_order<R: IntoDensities>(
        &self,
        density: R,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<Array1<f64>> {
        self.helmholtz_term(
            "GammaMie::a_second_order",
            density,
            temperature,
            molefracs,
            |_, c, _, props| {
                monomer::a_second_order(&self.parameters, &props, temperature, c.segments_per_molecule)
            },
        )
    }

    /// Third-order perturbation contribution to the reduced Helmholtz energy.
    pub fn a_third_order<R: IntoDensities>(
        &self,
        density: R,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<Array1<f64>> {
        self.helmholtz_term(
            "GammaMie::a_third_order",
            density,
            temperature,
            molefracs,
            |_, c, _, props| {
                monomer::a_third_order(&self.parameters, &props, temperature, c.segments_per_molecule)
            },
        )
    }

    /// Monomer contribution, the sum of the hard-sphere and all perturbation terms.
    pub fn a_monomer<R: IntoDensities>(
        &self,
        density: R,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<Array1<f64>> {
        self.helmholtz_term(
            "GammaMie::a_monomer",
            density,
            temperature,
            molefracs,
            |rho, c, d, props| {
                self.monomer_contributions(temperature, rho, c, d, &props)
                    .iter()
                    .sum()
            },
        )
    }

    /// Chain contribution to the reduced Helmholtz energy.
    pub fn a_chain<R: IntoDensities>(
        &self,
        density: R,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<Array1<f64>> {
        self.helmholtz_term(
            "GammaMie::a_chain",
            density,
            temperature,
            molefracs,
            |_, c, _, props| {
                let g = chain::g_mie(&self.parameters, &props, temperature);
                chain::a_chain(&self.parameters, &c.molefracs, &g)
            },
        )
    }

    /// Contact values of the Mie fluid for every component, `(n, ncomp)`.
    pub fn g_mie<R: IntoDensities>(
        &self,
        density: R,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<Array2<f64>> {
        let g = self.map_properties(
            "GammaMie::g_mie",
            density,
            temperature,
            molefracs,
            |_, _, _, props| chain::g_mie(&self.parameters, &props, temperature),
        )?;
        let n = self.parameters.ncomp();
        Ok(Array2::from_shape_fn((g.len(), n), |(r, i)| g[r][i]))
    }

    /// Association integrals of all bead pairs, `(n, nbeads, nbeads)`.
    pub fn gr_assoc<R: IntoDensities>(
        &self,
        density: R,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<Array3<f64>> {
        let i = self.map_properties(
            "GammaMie::gr_assoc",
            density,
            temperature,
            molefracs,
            |_, _, _, props| self.association_integrals(temperature, &props),
        )?;
        let n = self.parameters.nbeads();
        Ok(Array3::from_shape_fn((i.len(), n, n), |(r, k, l)| i[r][(k, l)]))
    }

    /// Geometric bonding volumes in nm³ of all bead and site pairs at the
    /// hard-sphere contact distances, `(nbeads, nbeads, nsites, nsites)`.
    ///
    /// `rc_klab` (and `rd_klab`) hold the cutoff radii (and site positions)
    /// in nm.
    pub fn bonding_volume(
        &self,
        temperature: f64,
        rc_klab: &Array4<f64>,
        rd_klab: Option<&Array4<f64>>,
        reduction_ratio: f64,
    ) -> EosResult<Array4<f64>> {
        check_temperature("GammaMie::bonding_volume", temperature)?;
        let (nbeads, nsites) = (
            self.parameters.nbeads(),
            self.parameters.association.site_names.len(),
        );
        let expected = (nbeads, nbeads, nsites, nsites);
        let dim = rc_klab.dim();
        if dim != expected || rd_klab.map_or(false, |rd| rd.dim() != expected) {
            return Err(ParameterError::IncompatibleParameters(format!(
                "site geometry of shape {:?} for {} beads and {} site types",
                dim, nbeads, nsites
            ))
            .into());
        }
        let d = self.parameters.hs_diameter(temperature);
        Ok(Array4::from_shape_fn(expected, |(k, l, a, b)| {
            let idx = (k, l, a, b);
            let d_kl = 0.5 * (d[k] + d[l]);
            bonding_volume(rc_klab[idx], rd_klab.map(|rd| rd[idx]), d_kl, reduction_ratio)
        }))
    }

    fn monomer_contributions<D: DualNum<f64> + Copy>(
        &self,
        temperature: D,
        density: D,
        composition: &CompositionVariables<D>,
        diameter: &Array1<D>,
        properties: &Properties<D>,
    ) -> [D; 4] {
        let p = &self.parameters;
        let m = composition.segments_per_molecule;
        [
            hard_sphere::helmholtz_energy(density, &packing_moments(diameter, composition)),
            monomer::a_first_order(p, properties, temperature, m),
            monomer::a_second_order(p, properties, temperature, m),
            monomer::a_third_order(p, properties, temperature, m),
        ]
    }

    /// Association integrals $I_{kl}$ with the reduced density $\rho_s\sigma_x^3$.
    fn association_integrals<D: DualNum<f64> + Copy>(
        &self,
        temperature: D,
        properties: &Properties<D>,
    ) -> Array2<D> {
        let p = &self.parameters;
        let sigma_x3 = properties
            .xs_kl
            .indexed_iter()
            .fold(D::zero(), |acc, (kl, &x)| acc + x * p.sigma_kl[kl].powi(3));
        let reduced_density = properties.segment_density * sigma_x3;
        Array2::from_shape_fn(p.sigma_kl.raw_dim(), |kl| {
            association::association_integral(
                reduced_density,
                temperature / p.epsilon_k_kl[kl],
            )
        })
    }

    /// Bonding volume times association integral of two association sites.
    fn association_kernel<D: DualNum<f64> + Copy>(
        &self,
        s: &AssociationSite,
        t: &AssociationSite,
        volume: BondingVolume,
        integrals: &Array2<D>,
        d_kl: &Array2<D>,
    ) -> D {
        let kl = (s.bead, t.bead);
        match volume {
            BondingVolume::None => D::zero(),
            BondingVolume::Kappa(kappa) => integrals[kl] * kappa,
            BondingVolume::Geometric { rc, rd } => {
                integrals[kl] * bonding_volume(rc, rd, d_kl[kl], self.options.reduction_ratio)
            }
        }
    }
}

impl Residual for GammaMie {
    fn components(&self) -> usize {
        self.parameters.ncomp()
    }

    fn molar_weight(&self) -> Array1<f64> {
        self.parameters.molarweight.clone()
    }

    fn composition_variables<D: DualNum<f64> + Copy>(
        &self,
        molefracs: &Array1<D>,
    ) -> CompositionVariables<D> {
        let p = &self.parameters;
        CompositionVariables::new(molefracs.clone(), &p.nui, &p.vks, &p.sk)
    }

    fn composition(&self, molefracs: &Array1<f64>) -> EosResult<Arc<CompositionVariables<f64>>> {
        validate_molefracs(molefracs, self.components())?;
        Ok(self
            .cache
            .get_or_insert_with(molefracs, || self.composition_variables(molefracs)))
    }

    fn density_max(&self, molefracs: &Array1<f64>, temperature: f64) -> EosResult<f64> {
        self.density_max_with_packing(molefracs, temperature, self.options.max_packing)
    }

    fn residual_helmholtz_energy_contributions<D: DualNum<f64> + Copy>(
        &self,
        temperature: D,
        density: D,
        composition: &CompositionVariables<D>,
    ) -> Vec<(String, D)> {
        let p = &self.parameters;
        let density = density * MOLECULE_PER_NM3;
        let diameter = p.hs_diameter(temperature);
        let properties = Properties::with_diameters(p, &diameter, density, composition);
        let [a_hs, a_1, a_2, a_3] =
            self.monomer_contributions(temperature, density, composition, &diameter, &properties);
        let mut a = Vec::with_capacity(6);
        a.push(("hard sphere".to_string(), a_hs));
        a.push(("first order".to_string(), a_1));
        a.push(("second order".to_string(), a_2));
        a.push(("third order".to_string(), a_3));

        let g_mie = chain::g_mie(p, &properties, temperature);
        a.push((
            "chain".to_string(),
            chain::a_chain(p, &composition.molefracs, &g_mie),
        ));

        if let Some(assoc) = self.association.as_ref() {
            let integrals = self.association_integrals(temperature, &properties);
            let delta = assoc.association_strength(temperature, |s, t, volume| {
                self.association_kernel(s, t, volume, &integrals, &properties.d_kl)
            });
            a.push((
                "association".to_string(),
                assoc.helmholtz_energy(density, &composition.molefracs, &delta),
            ));
        }
        a
    }
}

impl std::fmt::Display for GammaMie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SAFT-γ Mie(beads={:?})", self.parameters.bead_identifiers)
    }
}
