use super::GammaMieParameters;
use crate::hard_sphere::{isothermal_compressibility, HardSphereProperties};
use itertools::Itertools;
use ndarray::{Array1, Array2};
use num_dual::DualNum;
use saft_gamma_core::CompositionVariables;
use std::f64::consts::{FRAC_PI_6, PI};

/// Coefficients of the effective packing fraction, `c_n(λ) = Σ_m C[n][m] λ^-m`.
const C: [[f64; 4]; 4] = [
    [0.81096, 1.7888, -37.578, 92.284],
    [1.0205, -19.341, 151.26, -463.50],
    [-1.9057, 22.845, -228.14, 973.92],
    [1.0885, -6.1962, 106.98, -677.64],
];

const PHI: [[f64; 7]; 6] = [
    [7.5365557, -37.60463, 71.745953, -46.83552, -2.467982, -0.50272, 8.0956883],
    [-359.44, 1825.6, -3168.0, 1884.2, -0.82376, -3.1935, 3.709],
    [1550.9, -5070.1, 6534.6, -3288.7, -2.7171, 2.0883, 0.0],
    [-1.19932, 9.063632, -17.9482, 11.34027, 20.52142, -56.6377, 40.53683],
    [-1911.28, 21390.175, -51320.7, 37064.54, 1103.742, -3264.61, 2556.181],
    [9236.9, -129430.0, 357230.0, -315530.0, 1390.2, -4518.2, 4241.6],
];

/// Quantities of a state point shared by the monomer, chain and
/// association terms.
pub struct Properties<D> {
    /// Segment density in 1/nm³
    pub segment_density: D,
    /// Hard-sphere diameters of the bead pairs in nm
    pub d_kl: Array2<D>,
    /// Ratios $\sigma_{kl}/d_{kl}$
    pub x0_kl: Array2<D>,
    /// Products of the segment fractions
    pub xs_kl: Array2<D>,
    /// Packing fraction of the segments
    pub zeta_x: D,
    /// Packing fraction of the segments divided by the segment density
    pub s_x: D,
    /// Packing fraction of the segments computed with the Mie diameters
    pub zeta_x_bar: D,
}

impl<D: DualNum<f64> + Copy> Properties<D> {
    /// `density` is the number density of molecules in 1/nm³.
    #[cfg(test)]
    pub fn new(
        parameters: &GammaMieParameters,
        temperature: D,
        density: D,
        composition: &CompositionVariables<D>,
    ) -> Self {
        let d = parameters.hs_diameter(temperature);
        Self::with_diameters(parameters, &d, density, composition)
    }

    pub fn with_diameters(
        parameters: &GammaMieParameters,
        d: &Array1<D>,
        density: D,
        composition: &CompositionVariables<D>,
    ) -> Self {
        let n = parameters.nbeads();
        let segment_density = density * composition.segments_per_molecule;
        let d_kl = Array2::from_shape_fn((n, n), |(k, l)| (d[k] + d[l]) * 0.5);
        let x0_kl = Array2::from_shape_fn((n, n), |(k, l)| {
            d_kl[(k, l)].recip() * parameters.sigma_kl[(k, l)]
        });
        let xs_kl = composition.xskl();
        let (s_x, s_x_bar) = (0..n).cartesian_product(0..n).fold(
            (D::zero(), D::zero()),
            |(z, z_bar), (k, l)| {
                let x = xs_kl[(k, l)];
                (
                    z + x * d_kl[(k, l)].powi(3),
                    z_bar + x * parameters.sigma_kl[(k, l)].powi(3),
                )
            },
        );
        Self {
            segment_density,
            d_kl,
            x0_kl,
            xs_kl,
            zeta_x: s_x * segment_density * FRAC_PI_6,
            s_x: s_x * FRAC_PI_6,
            zeta_x_bar: s_x_bar * segment_density * FRAC_PI_6,
        }
    }
}

/// Effective packing fraction of the Sutherland potential with exponent `lambda`,
/// $\zeta^\mathrm{eff}=\sum_{n=1}^4c_n(\lambda)\zeta_x^n$.
pub fn zeta_eff<D: DualNum<f64> + Copy>(zeta_x: D, lambda: f64) -> D {
    let li = lambda.recip();
    let c = C.map(|c| c[0] + li * (c[1] + li * (c[2] + li * c[3])));
    zeta_x * (((zeta_x * c[3] + c[2]) * zeta_x + c[1]) * zeta_x + c[0])
}

/// Correlation functions $f_k(\alpha)$ of the second and third order terms.
pub fn f_alpha(k: usize, alpha: f64) -> f64 {
    let phi = PHI[k];
    (phi[0] + alpha * (phi[1] + alpha * (phi[2] + alpha * phi[3])))
        / (1.0 + alpha * (phi[4] + alpha * (phi[5] + alpha * phi[6])))
}

/// First-order term of the Sutherland potential divided by $2\pi\rho_sd^3\varepsilon$.
fn a1s<D: DualNum<f64> + Copy>(zeta_x: D, lambda: f64) -> D {
    let zeta_eff = zeta_eff(zeta_x, lambda);
    -(-zeta_eff * 0.5 + 1.0) / ((-zeta_eff + 1.0).powi(3) * (lambda - 3.0))
}

/// Correction of the Sutherland term for the range $d<r<\sigma$ divided by
/// $2\pi\rho_sd^3\varepsilon$.
fn b<D: DualNum<f64> + Copy>(zeta_x: D, x0: D, lambda: f64) -> D {
    let i = -(x0.powf(3.0 - lambda) - 1.0) / (lambda - 3.0);
    let j = -(x0.powf(4.0 - lambda) * (lambda - 3.0) - x0.powf(3.0 - lambda) * (lambda - 4.0)
        - 1.0)
        / ((lambda - 3.0) * (lambda - 4.0));
    ((-zeta_x * 0.5 + 1.0) * i - zeta_x * (zeta_x + 1.0) * 4.5 * j) / (-zeta_x + 1.0).powi(3)
}

/// $x_0^\lambda\left(a_1^S(\lambda)+B(\lambda)\right)$ without the prefactor $2\pi\rho_sd^3\varepsilon$.
pub fn a1s_b<D: DualNum<f64> + Copy>(zeta_x: D, x0: D, lambda: f64) -> D {
    x0.powf(lambda) * (a1s(zeta_x, lambda) + b(zeta_x, x0, lambda))
}

/// Attractive part of the first-order term of a single pair without the
/// prefactor $2\pi\rho_sd^3\varepsilon$,
/// $C\left(x_0^{\lambda_a}(a_1^S+B)(\lambda_a)-x_0^{\lambda_r}(a_1^S+B)(\lambda_r)\right)$.
pub fn a1_reduced<D: DualNum<f64> + Copy>(zeta_x: D, x0: D, c: f64, lr: f64, la: f64) -> D {
    (a1s_b(zeta_x, x0, la) - a1s_b(zeta_x, x0, lr)) * c
}

/// Bracket of the second-order term of a single pair,
/// $(a_1^S+B)(2\lambda_a)-2(a_1^S+B)(\lambda_a+\lambda_r)+(a_1^S+B)(2\lambda_r)$.
pub fn a2_bracket<D: DualNum<f64> + Copy>(zeta_x: D, x0: D, lr: f64, la: f64) -> D {
    a1s_b(zeta_x, x0, 2.0 * la) - a1s_b(zeta_x, x0, la + lr) * 2.0 + a1s_b(zeta_x, x0, 2.0 * lr)
}

/// Sum over all bead pairs weighted with the products of the segment fractions.
fn pair_sum<D, F>(properties: &Properties<D>, f: F) -> D
where
    D: DualNum<f64> + Copy,
    F: Fn(usize, usize) -> D,
{
    properties
        .xs_kl
        .indexed_iter()
        .fold(D::zero(), |acc, ((k, l), &x)| acc + x * f(k, l))
}

/// First-order perturbation term
/// $$\frac{A_1}{Nk_BT}=\frac{m_s}{T}\sum_k\sum_lx_{s,k}x_{s,l}2\pi\rho_sd_{kl}^3\varepsilon_{kl}\mathcal{C}_{kl}\left(x_{0,kl}^{\lambda^a_{kl}}\left(a_1^S+B\right)(\lambda^a_{kl})-x_{0,kl}^{\lambda^r_{kl}}\left(a_1^S+B\right)(\lambda^r_{kl})\right).$$
pub fn a_first_order<D: DualNum<f64> + Copy>(
    parameters: &GammaMieParameters,
    properties: &Properties<D>,
    temperature: D,
    segments: D,
) -> D {
    let p = parameters;
    let rho_s = properties.segment_density;
    let a1 = pair_sum(properties, |k, l| {
        let d3 = properties.d_kl[(k, l)].powi(3);
        let a = a1_reduced(
            properties.zeta_x,
            properties.x0_kl[(k, l)],
            p.c_kl[(k, l)],
            p.lr_kl[(k, l)],
            p.la_kl[(k, l)],
        );
        rho_s * d3 * a * (2.0 * PI * p.epsilon_k_kl[(k, l)])
    });
    a1 * segments / temperature
}

/// Second-order perturbation term with the fluctuation correction $\chi_{kl}$,
/// $$\frac{A_2}{Nk_BT}=\frac{m_s}{T^2}\sum_k\sum_lx_{s,k}x_{s,l}\frac{K^\mathrm{HS}}{2}\left(1+\chi_{kl}\right)\varepsilon_{kl}^2\mathcal{C}_{kl}^2\,2\pi\rho_sd_{kl}^3\left[\ldots\right].$$
pub fn a_second_order<D: DualNum<f64> + Copy>(
    parameters: &GammaMieParameters,
    properties: &Properties<D>,
    temperature: D,
    segments: D,
) -> D {
    let p = parameters;
    let (rho_s, zeta_x, zeta_x_bar) = (
        properties.segment_density,
        properties.zeta_x,
        properties.zeta_x_bar,
    );
    let k_hs = isothermal_compressibility(zeta_x);
    let a2 = pair_sum(properties, |k, l| {
        let alpha = p.alpha_kl[(k, l)];
        let chi = zeta_x_bar * f_alpha(0, alpha)
            + zeta_x_bar.powi(5) * f_alpha(1, alpha)
            + zeta_x_bar.powi(8) * f_alpha(2, alpha);
        let d3 = properties.d_kl[(k, l)].powi(3);
        let bracket = a2_bracket(
            zeta_x,
            properties.x0_kl[(k, l)],
            p.lr_kl[(k, l)],
            p.la_kl[(k, l)],
        );
        (chi + 1.0)
            * rho_s
            * d3
            * bracket
            * (PI * (p.epsilon_k_kl[(k, l)] * p.c_kl[(k, l)]).powi(2))
    });
    a2 * k_hs * segments / temperature.powi(2)
}

/// Third-order perturbation term
/// $$\frac{A_3}{Nk_BT}=-\frac{m_s}{T^3}\sum_k\sum_lx_{s,k}x_{s,l}\varepsilon_{kl}^3f_4\bar\zeta_x\exp\left(f_5\bar\zeta_x+f_6\bar\zeta_x^2\right).$$
pub fn a_third_order<D: DualNum<f64> + Copy>(
    parameters: &GammaMieParameters,
    properties: &Properties<D>,
    temperature: D,
    segments: D,
) -> D {
    let p = parameters;
    let z = properties.zeta_x_bar;
    let a3 = pair_sum(properties, |k, l| {
        let alpha = p.alpha_kl[(k, l)];
        -z * f_alpha(3, alpha)
            * (z * f_alpha(4, alpha) + z.powi(2) * f_alpha(5, alpha)).exp()
            * p.epsilon_k_kl[(k, l)].powi(3)
    });
    a3 * segments / temperature.powi(3)
}
