//! Generic implementation of the hard-sphere reference fluid
//! that is shared by both SAFT-γ variants.
use ndarray::Array1;
use num_dual::DualNum;
use saft_gamma_core::CompositionVariables;
use std::f64::consts::{FRAC_PI_6, PI};

/// Properties of (generalized) hard-sphere systems of beads.
pub trait HardSphereProperties {
    /// The (temperature dependent) hard-sphere diameters of every bead in nm.
    fn hs_diameter<D: DualNum<f64> + Copy>(&self, temperature: D) -> Array1<D>;

    /// The moments $\zeta_m / \rho$, $m = 0 \ldots 3$, of the packing
    /// fraction divided by the number density of molecules in 1/nm³.
    ///
    /// $$\frac{\zeta_m}{\rho}=\frac{\pi}{6}\sum_i x_i\sum_k\nu_{ik}V_kS_k\sum_k x_{s,k}d_k^m$$
    fn zeta_moments<D: DualNum<f64> + Copy>(
        &self,
        temperature: D,
        composition: &CompositionVariables<D>,
    ) -> [D; 4] {
        packing_moments(&self.hs_diameter(temperature), composition)
    }
}

/// Packing fraction moments divided by the number density for given bead
/// diameters (see [HardSphereProperties::zeta_moments]).
pub fn packing_moments<D: DualNum<f64> + Copy>(
    diameter: &Array1<D>,
    composition: &CompositionVariables<D>,
) -> [D; 4] {
    let mut zeta = [D::zero(); 4];
    for (&xs, &d) in composition.segment_fractions.iter().zip(diameter.iter()) {
        let mut dm = D::one();
        for z in zeta.iter_mut() {
            *z += xs * dm;
            dm *= d;
        }
    }
    zeta.map(|z| z * composition.segments_per_molecule * FRAC_PI_6)
}

/// Boublík-Mansoori-Carnahan-Starling-Leland (BMCSL) Helmholtz energy of a
/// hard-sphere mixture per molecule,
/// $$\frac{A^\mathrm{HS}}{Nk_BT}=\frac{6}{\pi\rho}\left(\left(\frac{\zeta_2^3}{\zeta_3^2}-\zeta_0\right)\ln\left(1-\zeta_3\right)+\frac{3\zeta_1\zeta_2}{1-\zeta_3}+\frac{\zeta_2^3}{\zeta_3\left(1-\zeta_3\right)^2}\right).$$
///
/// `zeta_moments` are the packing fraction moments divided by the number
/// density (see [HardSphereProperties::zeta_moments]), which keeps the
/// expression regular in the limit of vanishing density.
pub fn helmholtz_energy<D: DualNum<f64> + Copy>(density: D, zeta_moments: &[D; 4]) -> D {
    let [s0, s1, s2, s3] = *zeta_moments;
    let zeta3 = density * s3;
    let frac_1mz3 = (-zeta3 + 1.0).recip();
    ((-zeta3).ln_1p() * (s2.powi(3) / s3.powi(2) - s0)
        + density * s1 * s2 * frac_1mz3 * 3.0
        + density * s2.powi(3) / s3 * frac_1mz3.powi(2))
        * (6.0 / PI)
}

/// Contact value of the radial distribution function of a pure hard-sphere
/// fluid (Carnahan-Starling), $g_0^\mathrm{HS}(\zeta)=\frac{1-\zeta/2}{(1-\zeta)^3}$.
pub fn contact_value<D: DualNum<f64> + Copy>(zeta: D) -> D {
    (-zeta * 0.5 + 1.0) / (-zeta + 1.0).powi(3)
}

/// Derivative of [contact_value] with respect to the packing fraction.
pub fn contact_value_derivative<D: DualNum<f64> + Copy>(zeta: D) -> D {
    (-zeta + 2.5) / (-zeta + 1.0).powi(4)
}

/// Isothermal compressibility of the hard-sphere fluid from the
/// Percus-Yevick equation of state,
/// $K^\mathrm{HS}=\frac{(1-\zeta)^4}{1+4\zeta+4\zeta^2-4\zeta^3+\zeta^4}$.
pub fn isothermal_compressibility<D: DualNum<f64> + Copy>(zeta: D) -> D {
    (-zeta + 1.0).powi(4) / ((zeta + zeta.powi(2) - zeta.powi(3)) * 4.0 + zeta.powi(4) + 1.0)
}
