use super::monomer::{dzeta_eff_dlambda, dzeta_eff_dzeta_x, zeta_eff};
use super::GammaSwParameters;
use crate::hard_sphere::{contact_value, contact_value_derivative};
use ndarray::{Array1, Array2};
use num_dual::DualNum;
use tracing::error;

/// Contact values of the hard-sphere mixture (Boublík) for all component
/// pairs, with the packing fraction moments `zeta` and the contact
/// distance $\frac{\sigma_{ii}\sigma_{jj}}{\sigma_{ii}+\sigma_{jj}}$ in nm.
pub fn g_hs<D: DualNum<f64> + Copy>(parameters: &GammaSwParameters, zeta: &[D; 4]) -> Array2<D> {
    let sigma = parameters.sigma_ij.diag();
    let frac_1mz3 = (-zeta[3] + 1.0).recip();
    let t1 = frac_1mz3;
    let t2 = zeta[2] * frac_1mz3.powi(2);
    let t3 = zeta[2].powi(2) * frac_1mz3.powi(3);
    let n = sigma.len();
    Array2::from_shape_fn((n, n), |(i, j)| {
        let d = sigma[i] * sigma[j] / (sigma[i] + sigma[j]);
        t1 + t2 * (3.0 * d) + t3 * (2.0 * d * d)
    })
}

/// Contact values of the square-well fluid for all component pairs,
/// $$g^\mathrm{SW}_{ij}=g^\mathrm{HS}_{ij}+\frac{\varepsilon_{ij}}{T}\left(g_0^\mathrm{HS}+\left(\lambda_{ij}^3-1\right)\frac{\partial g_0^\mathrm{HS}}{\partial\zeta^\mathrm{eff}}\left(\frac{\lambda_{ij}}{3}\frac{\partial\zeta^\mathrm{eff}}{\partial\lambda_{ij}}-\zeta_x\frac{\partial\zeta^\mathrm{eff}}{\partial\zeta_x}\right)\right),$$
/// evaluated with the component averaged parameters.
pub fn g_sw<D: DualNum<f64> + Copy>(
    parameters: &GammaSwParameters,
    temperature: D,
    zeta: &[D; 4],
) -> Array2<D> {
    let zeta_x = zeta[3];
    let mut g = g_hs(parameters, zeta);
    for ((i, j), gij) in g.indexed_iter_mut() {
        let lambda = parameters.lambda_ij[(i, j)];
        let z = zeta_eff(zeta_x, lambda);
        let dz = dzeta_eff_dlambda(zeta_x, lambda) * (lambda / 3.0)
            - zeta_x * dzeta_eff_dzeta_x(zeta_x, lambda);
        let g1 = contact_value(z) + contact_value_derivative(z) * dz * (lambda.powi(3) - 1.0);
        *gij += g1 * parameters.epsilon_k_ij[(i, j)] / temperature;
    }
    g
}

/// Chain contribution
/// $$\frac{A^\mathrm{chain}}{Nk_BT}=-\sum_ix_i\left(\sum_k\nu_{ik}V_kS_k-1+n_{\mathrm{rings},i}\right)\ln g^\mathrm{SW}_{ii}.$$
pub fn a_chain<D: DualNum<f64> + Copy>(
    parameters: &GammaSwParameters,
    molefracs: &Array1<D>,
    g_sw: &Array2<D>,
) -> D {
    let a = molefracs
        .iter()
        .enumerate()
        .fold(D::zero(), |acc, (i, &x)| {
            let bonds = parameters.segments[i] - 1.0 + parameters.num_rings[i];
            acc - x * g_sw[(i, i)].ln() * bonds
        });
    if a.re().is_nan() {
        error!("Chain contribution is NaN, check energy parameters.");
    }
    a
}
