use super::{GammaSwCrossRecord, GammaSwParameters, GammaSwRecord};
use crate::association::{bonding_volume, Association, AssociationSite, BondingVolume};
use crate::hard_sphere::{self, HardSphereProperties};
use ndarray::{Array1, Array2, Array3, Array4, Array6};
use num_dual::DualNum;
use saft_gamma_core::constants::MOLECULE_PER_NM3;
use saft_gamma_core::parameter::{BeadRecord, CrossRecord, Parameter, ParameterError};
use saft_gamma_core::{
    check_density, check_temperature, validate_molefracs, CompositionCache,
    CompositionVariables, EosError, EosResult, IntoDensities, Residual,
};
use std::sync::Arc;
use tracing::info;

pub(crate) mod chain;
pub(crate) mod monomer;

/// Customization options for the SAFT-γ SW equation of state.
#[derive(Copy, Clone, Debug)]
pub struct GammaSwOptions {
    /// Packing fraction at the maximum density
    pub max_packing: f64,
    pub max_iter_cross_assoc: usize,
    pub tol_cross_assoc: f64,
    /// Site position relative to the contact distance for geometric
    /// bonding volumes without explicit `rd`
    pub reduction_ratio: f64,
}

impl Default for GammaSwOptions {
    fn default() -> Self {
        Self {
            max_packing: 0.65,
            max_iter_cross_assoc: 50,
            tol_cross_assoc: 1e-10,
            reduction_ratio: 0.25,
        }
    }
}

/// Parameter set for which the effective packing fractions are evaluated.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PackingMode {
    /// Bead pair parameters, `(nbeads, nbeads)`
    Bead,
    /// Component averaged parameters, `(ncomp, ncomp)`
    Component,
}

/// SAFT-γ equation of state with square-well bead interactions.
///
/// [Lymperiadis et al. (2007)](https://doi.org/10.1063/1.2813894)
pub struct GammaSw {
    parameters: Arc<GammaSwParameters>,
    options: GammaSwOptions,
    association: Option<Association>,
    cache: CompositionCache,
}

impl GammaSw {
    pub fn new(parameters: Arc<GammaSwParameters>) -> Self {
        Self::with_options(parameters, GammaSwOptions::default())
    }

    pub fn with_options(parameters: Arc<GammaSwParameters>, options: GammaSwOptions) -> Self {
        let association = Self::association(&parameters, &options);
        Self {
            parameters,
            options,
            association,
            cache: CompositionCache::new(),
        }
    }

    fn association(
        parameters: &GammaSwParameters,
        options: &GammaSwOptions,
    ) -> Option<Association> {
        (!parameters.association.is_empty()).then(|| {
            Association::new(
                &parameters.association,
                options.max_iter_cross_assoc,
                options.tol_cross_assoc,
            )
        })
    }

    pub fn parameters(&self) -> &Arc<GammaSwParameters> {
        &self.parameters
    }

    pub fn options(&self) -> &GammaSwOptions {
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
    /// Records are merged by identifier (bead pair for cross records) into
    /// the records the current parameters were built from. On error the
    /// equation of state is left unchanged.
    pub fn parameter_refresh(
        &mut self,
        bead_updates: &[BeadRecord<GammaSwRecord>],
        cross_updates: &[CrossRecord<GammaSwCrossRecord>],
    ) -> EosResult<()> {
        let parameters = self.parameters.refreshed(bead_updates, cross_updates)?;
        self.association = Self::association(&parameters, &self.options);
        self.parameters = Arc::new(parameters);
        self.cache.invalidate();
        info!(
            "Refreshed parameters with {} bead and {} cross record(s)",
            bead_updates.len(),
            cross_updates.len()
        );
        Ok(())
    }

    /// Maximum molar density in mol/m³ for which the packing fraction
    /// $\zeta_3$ reaches `max_packing`.
    pub fn density_max_with_packing(
        &self,
        molefracs: &Array1<f64>,
        temperature: f64,
        max_packing: f64,
    ) -> EosResult<f64> {
        check_temperature("GammaSw::density_max", temperature)?;
        let composition = self.composition(molefracs)?;
        let s3 = self.packing_moments(&composition)[3];
        Ok(max_packing / (s3 * MOLECULE_PER_NM3))
    }

    fn packing_moments(&self, composition: &CompositionVariables<f64>) -> [f64; 4] {
        self.parameters.zeta_moments(1.0, composition)
    }

    /// Validated densities together with the segment variables.
    fn state_variables<R: IntoDensities>(
        &self,
        density: R,
        molefracs: &Array1<f64>,
    ) -> EosResult<(Array1<f64>, Arc<CompositionVariables<f64>>)> {
        Ok((check_density(density)?, self.composition(molefracs)?))
    }

    /// Like [Self::state_variables] but additionally requires every density
    /// to be below the maximum density.
    fn bounded_state_variables<R: IntoDensities>(
        &self,
        name: &str,
        density: R,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<(Array1<f64>, Arc<CompositionVariables<f64>>)> {
        check_temperature(name, temperature)?;
        let (density, composition) = self.state_variables(density, molefracs)?;
        let density_max = self.density_max(molefracs, temperature)?;
        if let Some(&rho) = density.iter().find(|&&rho| rho >= density_max) {
            return Err(EosError::InvalidState(
                name.to_string(),
                format!("density (maximum density {} mol/m³)", density_max),
                rho,
            ));
        }
        Ok((density, composition))
    }

    /// Packing fraction moments $\zeta_m$, $m=0\ldots 3$, for every density, `(n, 4)`.
    pub fn reduced_density<R: IntoDensities>(
        &self,
        density: R,
        molefracs: &Array1<f64>,
    ) -> EosResult<Array2<f64>> {
        let (density, composition) = self.state_variables(density, molefracs)?;
        let s = self.packing_moments(&composition);
        Ok(Array2::from_shape_fn((density.len(), 4), |(n, m)| {
            density[n] * MOLECULE_PER_NM3 * s[m]
        }))
    }

    fn lambda(&self, mode: PackingMode) -> &Array2<f64> {
        match mode {
            PackingMode::Bead => &self.parameters.lambda_kl,
            PackingMode::Component => &self.parameters.lambda_ij,
        }
    }

    /// Evaluates `f(ζx, λ)` for every density and every pair of the chosen mode.
    fn pair_function<R: IntoDensities>(
        &self,
        density: R,
        molefracs: &Array1<f64>,
        mode: PackingMode,
        f: fn(f64, f64) -> f64,
    ) -> EosResult<Array3<f64>> {
        let zeta_x = self.reduced_density(density, molefracs)?.column(3).to_owned();
        let lambda = self.lambda(mode);
        let n = lambda.nrows();
        Ok(Array3::from_shape_fn((zeta_x.len(), n, n), |(r, k, l)| {
            f(zeta_x[r], lambda[(k, l)])
        }))
    }

    /// Effective packing fractions of the square wells, `(n, m, m)`.
    pub fn effective_packing_fraction<R: IntoDensities>(
        &self,
        density: R,
        molefracs: &Array1<f64>,
        mode: PackingMode,
    ) -> EosResult<Array3<f64>> {
        self.pair_function(density, molefracs, mode, monomer::zeta_eff::<f64>)
    }

    /// Derivatives of the effective packing fractions with respect to $\zeta_x$, `(n, m, m)`.
    pub fn dzeta_eff_dzeta_x<R: IntoDensities>(
        &self,
        density: R,
        molefracs: &Array1<f64>,
        mode: PackingMode,
    ) -> EosResult<Array3<f64>> {
        self.pair_function(density, molefracs, mode, monomer::dzeta_eff_dzeta_x::<f64>)
    }

    /// Hard-sphere contact values at the effective packing fractions, `(n, m, m)`.
    pub fn g0_hs<R: IntoDensities>(
        &self,
        density: R,
        molefracs: &Array1<f64>,
        mode: PackingMode,
    ) -> EosResult<Array3<f64>> {
        self.pair_function(density, molefracs, mode, monomer::g0_hs::<f64>)
    }

    fn component_pair_function<R, F>(
        &self,
        density: R,
        molefracs: &Array1<f64>,
        f: F,
    ) -> EosResult<Array3<f64>>
    where
        R: IntoDensities,
        F: Fn(&[f64; 4]) -> Array2<f64>,
    {
        let zeta = self.reduced_density(density, molefracs)?;
        let n = self.parameters.ncomp();
        let mut g = Array3::zeros((zeta.nrows(), n, n));
        for (mut gr, zeta) in g.outer_iter_mut().zip(zeta.outer_iter()) {
            gr.assign(&f(&[zeta[0], zeta[1], zeta[2], zeta[3]]));
        }
        Ok(g)
    }

    /// Contact values of the hard-sphere mixture, `(n, ncomp, ncomp)`.
    pub fn g_hs<R: IntoDensities>(
        &self,
        density: R,
        molefracs: &Array1<f64>,
    ) -> EosResult<Array3<f64>> {
        self.component_pair_function(density, molefracs, |zeta| {
            chain::g_hs(&self.parameters, zeta)
        })
    }

    /// Contact values of the square-well fluid, `(n, ncomp, ncomp)`.
    pub fn g_sw<R: IntoDensities>(
        &self,
        density: R,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<Array3<f64>> {
        check_temperature("GammaSw::g_sw", temperature)?;
        self.component_pair_function(density, molefracs, |zeta| {
            chain::g_sw(&self.parameters, temperature, zeta)
        })
    }

    /// Pair correlation function used in the association strength.
    pub fn gr_assoc<R: IntoDensities>(
        &self,
        density: R,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<Array3<f64>> {
        self.g_sw(density, temperature, molefracs)
    }

    /// Evaluates a Helmholtz energy term for every density below the maximum density.
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
        F: Fn(f64, &CompositionVariables<f64>) -> f64,
    {
        let (density, composition) =
            self.bounded_state_variables(name, density, temperature, molefracs)?;
        Ok(density.mapv(|rho| f(rho * MOLECULE_PER_NM3, composition.as_ref())))
    }

    /// Hard-sphere contribution to the reduced Helmholtz energy.
    pub fn a_hard_sphere<R: IntoDensities>(
        &self,
        density: R,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<Array1<f64>> {
        self.helmholtz_term("GammaSw::a_hard_sphere", density, temperature, molefracs, |rho, c| {
            hard_sphere::helmholtz_energy(rho, &self.packing_moments(c))
        })
    }

    /// First-order perturbation contribution to the reduced Helmholtz energy.
    pub fn a_first_order<R: IntoDensities>(
        &self,
        density: R,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<Array1<f64>> {
        self.helmholtz_term("GammaSw::a_first_order", density, temperature, molefracs, |rho, c| {
            let zeta_x = rho * self.packing_moments(c)[3];
            monomer::a_first_order(&self.parameters, temperature, rho, zeta_x, c)
        })
    }

    /// Second-order perturbation contribution to the reduced Helmholtz energy.
    pub fn a_second_order<R: IntoDensities>(
        &self,
        density: R,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<Array1<f64>> {
        self.helmholtz_term("GammaSw::a_second_order", density, temperature, molefracs, |rho, c| {
            let zeta_x = rho * self.packing_moments(c)[3];
            monomer::a_second_order(&self.parameters, temperature, rho, zeta_x, c)
        })
    }

    /// Monomer contribution, the sum of the hard-sphere and both perturbation terms.
    pub fn a_monomer<R: IntoDensities>(
        &self,
        density: R,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<Array1<f64>> {
        self.helmholtz_term("GammaSw::a_monomer", density, temperature, molefracs, |rho, c| {
            self.monomer_contributions(temperature, rho, c)
                .iter()
                .sum()
        })
    }

    /// Chain contribution to the reduced Helmholtz energy.
    pub fn a_chain<R: IntoDensities>(
        &self,
        density: R,
        temperature: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<Array1<f64>> {
        self.helmholtz_term("GammaSw::a_chain", density, temperature, molefracs, |rho, c| {
            let zeta = self.packing_moments(c).map(|s| s * rho);
            let g = chain::g_sw(&self.parameters, temperature, &zeta);
            chain::a_chain(&self.parameters, &c.molefracs, &g)
        })
    }

    /// Geometric bonding volumes in nm³ for all component pairs,
    /// `(ncomp, ncomp, nbeads, nbeads, nsites, nsites)`.
    ///
    /// `rc_klab` (and `rd_klab`) hold the cutoff radii (and site positions)
    /// in nm for every pair of beads and sites. The contact distance of two
    /// components is the mean of their averaged diameters. The square-well
    /// bonding volumes do not depend on temperature.
    pub fn bonding_volume(
        &self,
        temperature: f64,
        rc_klab: &Array4<f64>,
        rd_klab: Option<&Array4<f64>>,
        reduction_ratio: f64,
    ) -> EosResult<Array6<f64>> {
        check_temperature("GammaSw::bonding_volume", temperature)?;
        let sigma = self.parameters.sigma_ij.diag();
        let dim = rc_klab.dim();
        let (nbeads, nsites) = (self.parameters.nbeads(), self.parameters.association.site_names.len());
        let expected = (nbeads, nbeads, nsites, nsites);
        if dim != expected || rd_klab.map_or(false, |rd| rd.dim() != expected) {
            return Err(ParameterError::IncompatibleParameters(format!(
                "site geometry of shape {:?} for {} beads and {} site types",
                dim, nbeads, nsites
            ))
            .into());
        }
        let n = sigma.len();
        Ok(Array6::from_shape_fn(
            (n, n, nbeads, nbeads, nsites, nsites),
            |(i, j, k, l, a, b)| {
                let idx = (k, l, a, b);
                let d = 0.5 * (sigma[i] + sigma[j]);
                bonding_volume(rc_klab[idx], rd_klab.map(|rd| rd[idx]), d, reduction_ratio)
            },
        ))
    }

    fn monomer_contributions<D: DualNum<f64> + Copy>(
        &self,
        temperature: D,
        density: D,
        composition: &CompositionVariables<D>,
    ) -> [D; 3] {
        let p = &self.parameters;
        let s = p.zeta_moments(temperature, composition);
        let zeta_x = density * s[3];
        [
            hard_sphere::helmholtz_energy(density, &s),
            monomer::a_first_order(p, temperature, density, zeta_x, composition),
            monomer::a_second_order(p, temperature, density, zeta_x, composition),
        ]
    }

    /// Bonding volume times pair correlation of two association sites.
    fn association_kernel<D: DualNum<f64> + Copy>(
        &self,
        s: &AssociationSite,
        t: &AssociationSite,
        volume: BondingVolume,
        g_sw: &Array2<D>,
    ) -> D {
        let (i, j) = (s.component, t.component);
        let g = g_sw[(i, j)];
        match volume {
            BondingVolume::None => D::zero(),
            BondingVolume::Kappa(kappa) => g * kappa,
            BondingVolume::Geometric { rc, rd } => {
                let sigma = &self.parameters.sigma_ij;
                let d = 0.5 * (sigma[(i, i)] + sigma[(j, j)]);
                g * bonding_volume(rc, rd, d, self.options.reduction_ratio)
            }
        }
    }
}

impl Residual for GammaSw {
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
        let [a_hs, a_1, a_2] = self.monomer_contributions(temperature, density, composition);
        let mut a = Vec::with_capacity(5);
        a.push(("hard sphere".to_string(), a_hs));
        a.push(("first order".to_string(), a_1));
        a.push(("second order".to_string(), a_2));

        let zeta = p
            .zeta_moments(temperature, composition)
            .map(|s| s * density);
        let g_sw = chain::g_sw(p, temperature, &zeta);
        a.push((
            "chain".to_string(),
            chain::a_chain(p, &composition.molefracs, &g_sw),
        ));

        if let Some(assoc) = self.association.as_ref() {
            let delta = assoc.association_strength(temperature, |s, t, volume| {
                self.association_kernel(s, t, volume, &g_sw)
            });
            a.push((
                "association".to_string(),
                assoc.helmholtz_energy(density, &composition.molefracs, &delta),
            ));
        }
        a
    }
}

impl std::fmt::Display for GammaSw {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SAFT-γ SW(beads={:?})", self.parameters.bead_identifiers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamma_sw::utils::*;
    use approx::assert_relative_eq;
    use ndarray::{arr1, Axis};

    fn diagonal(g: &Array3<f64>) -> Array2<f64> {
        let n = g.len_of(Axis(1));
        Array2::from_shape_fn((g.len_of(Axis(0)), n), |(r, i)| g[(r, i, i)])
    }

    fn eos(parameters: GammaSwParameters) -> GammaSw {
        GammaSw::new(Arc::new(parameters))
    }

    #[test]
    fn max_density_packing() -> EosResult<()> {
        let eos = eos(butane_hexane()?);
        let x = arr1(&[0.4, 0.6]);
        let rho_max = eos.density_max(&x, 300.0)?;
        let zeta = eos.reduced_density(rho_max, &x)?;
        assert_relative_eq!(zeta[(0, 3)], 0.65, max_relative = 1e-12);
        assert!(eos.a_hard_sphere(0.99 * rho_max, 300.0, &x)?[0].is_finite());
        assert!(matches!(
            eos.a_hard_sphere(rho_max, 300.0, &x),
            Err(EosError::InvalidState(..))
        ));
        Ok(())
    }

    #[test]
    fn invalid_inputs() -> EosResult<()> {
        let eos = eos(butane()?);
        let x = arr1(&[1.0]);
        assert!(matches!(
            eos.a_chain(-1.0, 300.0, &x),
            Err(EosError::InvalidDensity(_))
        ));
        assert!(matches!(
            eos.a_chain(1000.0, f64::NAN, &x),
            Err(EosError::InvalidState(..))
        ));
        assert!(matches!(
            eos.a_chain(1000.0, 300.0, &arr1(&[0.5, 0.5])),
            Err(EosError::IncompatibleComponents(1, 2))
        ));
        Ok(())
    }

    #[test]
    fn contributions_match_array_api() -> EosResult<()> {
        let eos = eos(butane_hexane()?);
        let x = arr1(&[0.3, 0.7]);
        let (t, rho) = (300.0, 5000.0);
        let c = eos.composition(&x)?;
        let a = eos.residual_helmholtz_energy_contributions(t, rho, c.as_ref());
        assert_eq!(a.len(), 4);
        assert_relative_eq!(a[0].1, eos.a_hard_sphere(rho, t, &x)?[0], max_relative = 1e-14);
        assert_relative_eq!(a[1].1, eos.a_first_order(rho, t, &x)?[0], max_relative = 1e-14);
        assert_relative_eq!(a[2].1, eos.a_second_order(rho, t, &x)?[0], max_relative = 1e-14);
        assert_relative_eq!(a[3].1, eos.a_chain(rho, t, &x)?[0], max_relative = 1e-14);
        let monomer = eos.a_monomer(rho, t, &x)?[0];
        assert_relative_eq!(monomer, a[0].1 + a[1].1 + a[2].1, max_relative = 1e-12);
        assert!(a[1].1 < 0.0 && a[2].1 < 0.0);
        Ok(())
    }

    #[test]
    fn packing_mode_shapes() -> EosResult<()> {
        let eos = eos(butane_hexane()?);
        let x = arr1(&[0.3, 0.7]);
        let rho = [100.0, 1000.0, 5000.0];
        let beads = eos.effective_packing_fraction(rho, &x, PackingMode::Bead)?;
        let components = eos.g0_hs(rho, &x, PackingMode::Component)?;
        assert_eq!(beads.dim(), (3, 2, 2));
        assert_eq!(components.dim(), (3, 2, 2));
        let dz = eos.dzeta_eff_dzeta_x(rho, &x, PackingMode::Bead)?;
        assert!(dz.iter().all(|&d| d > 0.0));
        assert!(beads[(2, 0, 1)] > beads[(1, 0, 1)]);
        Ok(())
    }

    #[test]
    fn contact_values() -> EosResult<()> {
        let eos = eos(butane_hexane()?);
        let x = arr1(&[0.3, 0.7]);
        let ghs = eos.g_hs([100.0, 5000.0], &x)?;
        let gsw = eos.g_sw([100.0, 5000.0], 300.0, &x)?;
        let gr = eos.gr_assoc([100.0, 5000.0], 300.0, &x)?;
        assert_eq!(gsw, gr);
        let (ghs, gsw) = (diagonal(&ghs), diagonal(&gsw));
        // attraction raises the contact value only at low density
        assert!(ghs.row(0).iter().zip(gsw.row(0)).all(|(h, s)| s > h));
        assert!(gsw.iter().all(|&g| g.is_finite() && g > 0.0));
        assert!(ghs[(1, 0)] > ghs[(0, 0)]);
        Ok(())
    }

    #[test]
    fn association_contribution() -> EosResult<()> {
        let eos = eos(propanol()?);
        let x = arr1(&[1.0]);
        let c = eos.composition(&x)?;
        let a = eos.residual_helmholtz_energy_contributions(350.0, 10000.0, c.as_ref());
        let (name, a_assoc) = &a[4];
        assert_eq!(name, "association");
        assert!(*a_assoc < 0.0);
        // vanishes in the ideal gas limit
        let a0 = eos.residual_helmholtz_energy_contributions(350.0, 1e-10, c.as_ref());
        assert_relative_eq!(a0[4].1, 0.0, epsilon = 1e-8);
        Ok(())
    }

    #[test]
    fn symmetric_bonding_volumes() -> EosResult<()> {
        let eos = eos(butane_propanol()?);
        let p = eos.parameters();
        let shape = (p.nbeads(), p.nbeads(), 2, 2);
        let rc = Array4::from_shape_fn(shape, |(k, l, a, b)| {
            0.2 + 0.01 * ((k + l) as f64) + 0.005 * ((a + b) as f64)
        });
        let k = eos.bonding_volume(300.0, &rc, None, 0.25)?;
        assert_eq!(k.dim(), (2, 2, 3, 3, 2, 2));
        for ((i, j, k_, l, a, b), &v) in k.indexed_iter() {
            assert_eq!(v, k[[j, i, k_, l, a, b]]);
            assert!(v >= 0.0);
        }
        assert!(k.iter().any(|&v| v > 0.0));
        assert!(eos
            .bonding_volume(300.0, &Array4::zeros((1, 1, 1, 1)), None, 0.25)
            .is_err());
        Ok(())
    }

    #[test]
    fn refresh_with_unchanged_records() -> EosResult<()> {
        let mut eos = eos(butane_propanol()?);
        let x = arr1(&[0.5, 0.5]);
        let before = eos.a_chain(1000.0, 300.0, &x)?;
        let sigma_kl = eos.parameters().sigma_kl.clone();
        let epsilon_ij = eos.parameters().epsilon_k_ij.clone();
        let beads = eos.parameters().bead_records.clone();
        eos.parameter_refresh(&beads, &[])?;
        assert_eq!(eos.parameters().sigma_kl, sigma_kl);
        assert_eq!(eos.parameters().epsilon_k_ij, epsilon_ij);
        assert_eq!(eos.a_chain(1000.0, 300.0, &x)?, before);

        let mut ch2 = beads[1].clone();
        ch2.model_record.epsilon_k = 240.0;
        eos.parameter_refresh(&[ch2], &[])?;
        assert_eq!(eos.parameters().epsilon_k_kl[(1, 1)], 240.0);
        assert!(eos.a_chain(1000.0, 300.0, &x)? != before);
        Ok(())
    }

    #[test]
    fn refresh_rejects_out_of_bounds() -> EosResult<()> {
        let mut eos = eos(butane()?);
        let mut ch3 = eos.parameters().bead_records[0].clone();
        ch3.model_record.sk = 2.0;
        assert!(eos.parameter_refresh(&[ch3], &[]).is_err());
        assert_eq!(eos.parameters().sk[0], 0.6);
        Ok(())
    }
}
