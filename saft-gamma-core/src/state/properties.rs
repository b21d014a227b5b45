use super::State;
use crate::constants::RGAS;
use crate::equation_of_state::Residual;
use ndarray::Array1;
use num_dual::{Dual2_64, Dual3_64, Dual64, DualNum};

impl<E: Residual> State<E> {
    fn helmholtz_energy_density_derivative<D: DualNum<f64> + Copy>(&self, density: D) -> D {
        self.eos.residual_helmholtz_energy(
            D::from(self.temperature),
            density,
            &self.composition.lift(),
        )
    }

    /// Reduced residual Helmholtz energy per molecule, `A_res / (N k_B T)`.
    pub fn residual_helmholtz_energy(&self) -> f64 {
        self.eos
            .residual_helmholtz_energy(self.temperature, self.density, &self.composition)
    }

    /// The individual contributions to the reduced residual Helmholtz energy.
    pub fn residual_helmholtz_energy_contributions(&self) -> Vec<(String, f64)> {
        self.eos.residual_helmholtz_energy_contributions(
            self.temperature,
            self.density,
            &self.composition,
        )
    }

    /// Residual molar Helmholtz energy in J/mol.
    pub fn residual_molar_helmholtz_energy(&self) -> f64 {
        self.residual_helmholtz_energy() * RGAS * self.temperature
    }

    /// Pressure in Pa.
    pub fn pressure(&self) -> f64 {
        let a = self.helmholtz_energy_density_derivative(Dual64::from_re(self.density).derivative());
        self.density * RGAS * self.temperature * (1.0 + self.density * a.eps)
    }

    /// Pressure and its derivative with respect to the molar density.
    pub fn p_dpdrho(&self) -> (f64, f64) {
        let rho = self.density;
        let a = self.helmholtz_energy_density_derivative(Dual2_64::from_re(rho).derivative());
        let rt = RGAS * self.temperature;
        (
            rho * rt * (1.0 + rho * a.v1),
            rt * (1.0 + 2.0 * rho * a.v1 + rho * rho * a.v2),
        )
    }

    /// Pressure and its first and second derivative with respect to the molar density.
    pub fn d2pdrho2(&self) -> (f64, f64, f64) {
        let rho = self.density;
        let a = self.helmholtz_energy_density_derivative(Dual3_64::from_re(rho).derivative());
        let rt = RGAS * self.temperature;
        (
            rho * rt * (1.0 + rho * a.v1),
            rt * (1.0 + 2.0 * rho * a.v1 + rho * rho * a.v2),
            rt * (2.0 * a.v1 + 4.0 * rho * a.v2 + rho * rho * a.v3),
        )
    }

    /// Compressibility factor `Z = p / (ρ R T)`.
    pub fn compressibility(&self) -> f64 {
        self.pressure() / (self.density * RGAS * self.temperature)
    }

    /// Residual chemical potential at constant volume in J/mol.
    ///
    /// Obtained by differentiating `n a_res(T, n / V, n / Σn)` with respect
    /// to the amount of each component.
    pub fn residual_chemical_potential(&self) -> Array1<f64> {
        let n = self.eos.components();
        let t = Dual64::from(self.temperature);
        Array1::from_shape_fn(n, |i| {
            let moles = Array1::from_shape_fn(n, |j| {
                let nj = Dual64::from(self.molefracs[j]);
                if i == j {
                    nj.derivative()
                } else {
                    nj
                }
            });
            let total = moles.iter().fold(Dual64::from(0.0), |acc, &m| acc + m);
            let molefracs = moles.mapv(|m| m / total);
            let density = total * self.density;
            let composition = self.eos.composition_variables(&molefracs);
            let a = self
                .eos
                .residual_helmholtz_energy(t, density, &composition)
                * total;
            a.eps * RGAS * self.temperature
        })
    }

    /// Logarithm of the fugacity coefficients.
    pub fn ln_phi(&self) -> Array1<f64> {
        let ln_z = self.compressibility().ln();
        self.residual_chemical_potential()
            .mapv(|mu| mu / (RGAS * self.temperature) - ln_z)
    }

    /// Residual molar Gibbs energy at constant pressure in J/mol.
    pub fn residual_molar_gibbs_energy(&self) -> f64 {
        (&self.molefracs * &self.ln_phi()).sum() * RGAS * self.temperature
    }

    /// Residual molar internal energy in J/mol.
    pub fn residual_molar_internal_energy(&self) -> f64 {
        let a = self.eos.residual_helmholtz_energy(
            Dual64::from_re(self.temperature).derivative(),
            Dual64::from(self.density),
            &self.composition.lift(),
        );
        -RGAS * self.temperature.powi(2) * a.eps
    }

    /// Molar volume in m³/mol.
    pub fn molar_volume(&self) -> f64 {
        1.0 / self.density
    }

    /// Mass density in kg/m³.
    pub fn mass_density(&self) -> f64 {
        self.density * (&self.molefracs * &self.eos.molar_weight()).sum() * 1e-3
    }
}
