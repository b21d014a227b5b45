use super::GammaSwParameters;
use crate::hard_sphere::{contact_value, contact_value_derivative, isothermal_compressibility};
use num_dual::DualNum;
use saft_gamma_core::CompositionVariables;

/// Coefficients of the effective packing fraction of the square well,
/// `c_n(λ) = Σ_m C[n][m] λ^m`.
const CKL: [[f64; 3]; 3] = [
    [2.25855, -1.50349, 0.249434],
    [-0.669270, 1.40049, -0.827739],
    [10.1576, -15.0427, 5.30827],
];

fn coefficients(lambda: f64) -> [f64; 3] {
    CKL.map(|c| c[0] + lambda * (c[1] + lambda * c[2]))
}

/// Effective packing fraction $\zeta^\mathrm{eff}=c_1\zeta_x+c_2\zeta_x^2+c_3\zeta_x^3$.
///
/// Pairs without an attractive well (`λ = 0`) have no effective packing fraction.
pub fn zeta_eff<D: DualNum<f64> + Copy>(zeta_x: D, lambda: f64) -> D {
    if lambda == 0.0 {
        return D::zero();
    }
    let c = coefficients(lambda);
    zeta_x * ((zeta_x * c[2] + c[1]) * zeta_x + c[0])
}

/// Derivative of [zeta_eff] with respect to $\zeta_x$.
pub fn dzeta_eff_dzeta_x<D: DualNum<f64> + Copy>(zeta_x: D, lambda: f64) -> D {
    if lambda == 0.0 {
        return D::zero();
    }
    let c = coefficients(lambda);
    zeta_x * (zeta_x * c[2] * 3.0 + c[1] * 2.0) + c[0]
}

/// Derivative of [zeta_eff] with respect to $\lambda$.
pub fn dzeta_eff_dlambda<D: DualNum<f64> + Copy>(zeta_x: D, lambda: f64) -> D {
    let dc = CKL.map(|c| c[1] + 2.0 * lambda * c[2]);
    zeta_x * ((zeta_x * dc[2] + dc[1]) * zeta_x + dc[0])
}

/// Contact value of a hard-sphere fluid at the effective packing fraction of
/// the well with range `lambda`.
pub fn g0_hs<D: DualNum<f64> + Copy>(zeta_x: D, lambda: f64) -> D {
    contact_value(zeta_eff(zeta_x, lambda))
}

/// First-order perturbation term
/// $$\frac{A_1}{Nk_BT}=-\frac{C^2\rho}{T}\sum_k\sum_lx_{s,k}x_{s,l}\alpha_{kl}g_0^\mathrm{HS}\left(\zeta^\mathrm{eff}_{kl}\right)$$
/// with the number of segments per molecule $C$ and the number density $\rho$ in 1/nm³.
pub fn a_first_order<D: DualNum<f64> + Copy>(
    parameters: &GammaSwParameters,
    temperature: D,
    density: D,
    zeta_x: D,
    composition: &CompositionVariables<D>,
) -> D {
    let xs = &composition.segment_fractions;
    let mut a = D::zero();
    for (k, &xk) in xs.iter().enumerate() {
        for (l, &xl) in xs.iter().enumerate() {
            a += xk * xl * parameters.alpha_kl[(k, l)] * g0_hs(zeta_x, parameters.lambda_kl[(k, l)]);
        }
    }
    -a * composition.segments_per_molecule.powi(2) * density / temperature
}

/// Second-order perturbation term from the local compressibility
/// approximation,
/// $$\frac{A_2}{Nk_BT}=-\frac{C}{T^2}\sum_k\sum_lx_{s,k}x_{s,l}\frac{K^\mathrm{HS}\rho_s}{2}\varepsilon_{kl}\alpha_{kl}\left(g_0^\mathrm{HS}+\zeta_x\frac{\partial\zeta^\mathrm{eff}_{kl}}{\partial\zeta_x}\frac{\partial g_0^\mathrm{HS}}{\partial\zeta^\mathrm{eff}}\right)$$
/// with the segment density $\rho_s=C\rho$.
pub fn a_second_order<D: DualNum<f64> + Copy>(
    parameters: &GammaSwParameters,
    temperature: D,
    density: D,
    zeta_x: D,
    composition: &CompositionVariables<D>,
) -> D {
    let xs = &composition.segment_fractions;
    let c = composition.segments_per_molecule;
    let k_hs = isothermal_compressibility(zeta_x);
    let mut a = D::zero();
    for (k, &xk) in xs.iter().enumerate() {
        for (l, &xl) in xs.iter().enumerate() {
            let lambda = parameters.lambda_kl[(k, l)];
            let z = zeta_eff(zeta_x, lambda);
            let g = contact_value(z)
                + zeta_x * dzeta_eff_dzeta_x(zeta_x, lambda) * contact_value_derivative(z);
            a += xk * xl * g * (parameters.epsilon_k_kl[(k, l)] * parameters.alpha_kl[(k, l)]);
        }
    }
    -a * k_hs * c * c * density * 0.5 / temperature.powi(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_dual::Dual64;

    #[test]
    fn effective_packing_fraction_derivatives() {
        let z = Dual64::from_re(0.3).derivative();
        assert_relative_eq!(
            zeta_eff(z, 1.5).eps,
            dzeta_eff_dzeta_x(0.3, 1.5),
            max_relative = 1e-12
        );
        let l = Dual64::from_re(1.5).derivative();
        let c: Vec<_> = CKL
            .iter()
            .map(|c| l * l * c[2] + l * c[1] + c[0])
            .collect();
        let zeta = c[0] * 0.3 + c[1] * 0.09 + c[2] * 0.027;
        assert_relative_eq!(zeta.re, zeta_eff(0.3, 1.5), max_relative = 1e-12);
        assert_relative_eq!(zeta.eps, dzeta_eff_dlambda(0.3, 1.5), max_relative = 1e-12);
    }

    #[test]
    fn no_well() {
        assert_eq!(zeta_eff(0.3, 0.0), 0.0);
        assert_eq!(dzeta_eff_dzeta_x(0.3, 0.0), 0.0);
        assert_eq!(g0_hs(0.3, 0.0), 1.0);
    }
}
