use crate::composition::CompositionVariables;
use crate::errors::EosResult;
use ndarray::Array1;
use num_dual::DualNum;
use std::sync::Arc;

/// A residual Helmholtz energy model.
///
/// All Helmholtz energies are reduced per molecule, `A_res / (N k_B T)`,
/// densities are molar densities in mol/m³ and temperatures are given in K.
/// The generic methods are evaluated for real numbers as well as for
/// (hyper) dual numbers, which is how all derivatives are obtained.
pub trait Residual: Send + Sync {
    /// Return the number of components of the model.
    fn components(&self) -> usize;

    /// Return the molar weight of all components in g/mol.
    fn molar_weight(&self) -> Array1<f64>;

    /// Segment variables for arbitrary (possibly dual) mole fractions.
    fn composition_variables<D: DualNum<f64> + Copy>(
        &self,
        molefracs: &Array1<D>,
    ) -> CompositionVariables<D>;

    /// Validated segment variables for real mole fractions, served from the
    /// composition cache of the model.
    fn composition(&self, molefracs: &Array1<f64>) -> EosResult<Arc<CompositionVariables<f64>>>;

    /// Maximum admissible molar density for the given composition.
    fn density_max(&self, molefracs: &Array1<f64>, temperature: f64) -> EosResult<f64>;

    /// The individual contributions to the reduced residual Helmholtz energy.
    fn residual_helmholtz_energy_contributions<D: DualNum<f64> + Copy>(
        &self,
        temperature: D,
        density: D,
        composition: &CompositionVariables<D>,
    ) -> Vec<(String, D)>;

    /// The reduced residual Helmholtz energy.
    fn residual_helmholtz_energy<D: DualNum<f64> + Copy>(
        &self,
        temperature: D,
        density: D,
        composition: &CompositionVariables<D>,
    ) -> D {
        self.residual_helmholtz_energy_contributions(temperature, density, composition)
            .into_iter()
            .fold(D::zero(), |acc, (_, a)| acc + a)
    }
}
