use super::monomer::{a1_reduced, a1s_b, a2_bracket, Properties};
use super::GammaMieParameters;
use crate::hard_sphere::isothermal_compressibility;
use ndarray::{Array1, Array2};
use num_dual::{Dual, DualNum};
use tracing::error;

const PHI7: [f64; 5] = [10.0, 10.0, 0.57, -6.7, -8.0];

/// Molecular averages of the hard-sphere diameters,
/// $d_{ii}=\left(\sum_k\sum_lz_{ki}z_{li}d_{kl}^3\right)^{1/3}$.
pub fn d_ii<D: DualNum<f64> + Copy>(parameters: &GammaMieParameters, d_kl: &Array2<D>) -> Array1<D> {
    let d3 = d_kl.mapv(|d| d.powi(3));
    parameters
        .zki
        .outer_iter()
        .map(|z| {
            d3.indexed_iter()
                .fold(D::zero(), |acc, ((k, l), &d3)| acc + d3 * (z[k] * z[l]))
                .cbrt()
        })
        .collect()
}

/// Contact value of the hard-sphere fluid at distance $x_0 = \sigma/d$,
/// $g^\mathrm{HS}=\exp\left(k_0+k_1x_0+k_2x_0^2+k_3x_0^3\right)$.
pub fn g_hs<D: DualNum<f64> + Copy>(zeta_x: D, x0: D) -> D {
    let z = zeta_x;
    let z2 = z * z;
    let z3 = z2 * z;
    let z4 = z2 * z2;
    let frac_1mz3 = (-z + 1.0).powi(3).recip();
    let k0 = -(-z).ln_1p() + (z * 42.0 - z2 * 39.0 + z3 * 9.0 - z4 * 2.0) * frac_1mz3 / 6.0;
    let k1 = (z4 + z2 * 6.0 - z * 12.0) * frac_1mz3 * 0.5;
    let k2 = -z2 * 3.0 / ((-z + 1.0).powi(2) * 8.0);
    let k3 = (-z4 + z2 * 3.0 + z * 3.0) * frac_1mz3 / 6.0;
    (k0 + x0 * (k1 + x0 * (k2 + x0 * k3))).exp()
}

/// Contact values of the Mie fluid for every component,
/// $$g^\mathrm{Mie}_{ii}=g^\mathrm{HS}_{ii}\exp\left(\frac{\beta\varepsilon_{ii}g_{1,ii}}{g^\mathrm{HS}_{ii}}+\frac{(\beta\varepsilon_{ii})^2g_{2,ii}}{g^\mathrm{HS}_{ii}}\right)$$
/// evaluated with the molecular averages of the bead parameters.
///
/// The derivatives of the first and second order terms with respect to the
/// segment density are evaluated with an additional dual number.
pub fn g_mie<D: DualNum<f64> + Copy>(
    parameters: &GammaMieParameters,
    properties: &Properties<D>,
    temperature: D,
) -> Array1<D> {
    let p = parameters;
    let rho_s = properties.segment_density;
    let rho_s_dual = Dual::from_re(rho_s).derivative();
    let zeta_x_dual = rho_s_dual * Dual::from_re(properties.s_x);
    let zeta_x = properties.zeta_x;
    let zeta_x_bar = properties.zeta_x_bar;
    let k_hs = isothermal_compressibility(zeta_x);
    let k_hs_dual = isothermal_compressibility(zeta_x_dual);

    let d = d_ii(p, &properties.d_kl);
    Array1::from_shape_fn(p.ncomp(), |i| {
        let (c, lr, la) = (p.c_ii[i], p.lr_ii[i], p.la_ii[i]);
        let x0 = d[i].recip() * p.sigma_ii[i];
        let x0_dual = Dual::from_re(x0);

        // first order
        let a = rho_s_dual * a1_reduced(zeta_x_dual, x0_dual, c, lr, la);
        let g1 = a.eps * 3.0 - a1s_b(zeta_x, x0, la) * (c * la) + a1s_b(zeta_x, x0, lr) * (c * lr);

        // second order
        let q = rho_s_dual * k_hs_dual * a2_bracket(zeta_x_dual, x0_dual, lr, la);
        let g2_mca = q.eps * (1.5 * c * c)
            - k_hs
                * (a1s_b(zeta_x, x0, 2.0 * lr) * lr - a1s_b(zeta_x, x0, la + lr) * (la + lr)
                    + a1s_b(zeta_x, x0, 2.0 * la) * la)
                * (c * c);
        let theta = (temperature.recip() * p.epsilon_k_ii[i]).exp_m1();
        let gamma_c = zeta_x_bar
            * theta
            * (zeta_x_bar * PHI7[3] + zeta_x_bar.powi(2) * PHI7[4]).exp()
            * (PHI7[0] * (1.0 - (PHI7[1] * (PHI7[2] - p.alpha_ii[i])).tanh()));
        let g2 = (gamma_c + 1.0) * g2_mca;

        let ghs = g_hs(zeta_x, x0);
        let tau = temperature.recip() * p.epsilon_k_ii[i];
        ghs * ((tau * g1 + tau.powi(2) * g2) / ghs).exp()
    })
}

/// Chain contribution
/// $$\frac{A^\mathrm{chain}}{Nk_BT}=-\sum_ix_i\left(\sum_k\nu_{ik}V_kS_k-1+n_{\mathrm{rings},i}\right)\ln g^\mathrm{Mie}_{ii}.$$
pub fn a_chain<D: DualNum<f64> + Copy>(
    parameters: &GammaMieParameters,
    molefracs: &Array1<D>,
    g_mie: &Array1<D>,
) -> D {
    let a = molefracs
        .iter()
        .zip(g_mie.iter())
        .enumerate()
        .fold(D::zero(), |acc, (i, (&x, &g))| {
            let bonds = parameters.segments[i] - 1.0 + parameters.num_rings[i];
            acc - x * g.ln() * bonds
        });
    if a.re().is_nan() {
        error!("Chain contribution is NaN, check Mie parameters.");
    }
    a
}
