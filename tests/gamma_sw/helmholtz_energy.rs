use approx::assert_relative_eq;
use ndarray::arr1;
use saft_gamma::gamma_sw::{utils, GammaSw, GammaSwParameters};
use saft_gamma_core::parameter::{ComponentRecord, Parameter};
use saft_gamma_core::constants::MOLECULE_PER_NM3;
use saft_gamma_core::{EosResult, Residual, State};
use std::f64::consts::FRAC_PI_6;
use std::sync::Arc;

#[test]
fn single_bead_terms() -> EosResult<()> {
    let eos = GammaSw::new(Arc::new(utils::single_bead(250.0, 4.0, 1.5)?));
    let x = arr1(&[1.0]);
    let (rho, t) = (1000.0, 300.0);

    let a_hs = eos.a_hard_sphere(rho, t, &x)?[0];
    let eta = FRAC_PI_6 * rho * MOLECULE_PER_NM3 * 0.4f64.powi(3);
    assert_relative_eq!(
        a_hs,
        (4.0 * eta - 3.0 * eta * eta) / (1.0 - eta).powi(2),
        max_relative = 1e-12
    );
    assert!(a_hs > 0.0);

    let a_1 = eos.a_first_order(rho, t, &x)?[0];
    let a_2 = eos.a_second_order(rho, t, &x)?[0];
    assert!(a_1.is_finite() && a_1 < 0.0);
    assert!(a_2.is_finite() && a_2 < 0.0);
    assert!(a_2.abs() < a_1.abs());

    // a single segment has no bonds
    assert_eq!(eos.a_chain(rho, t, &x)?[0], 0.0);
    Ok(())
}

#[test]
fn hard_sphere_limit() -> EosResult<()> {
    let eos = GammaSw::new(Arc::new(utils::single_bead(250.0, 4.0, 1.5)?));
    let x = arr1(&[1.0]);
    let rho = 5000.0;
    let t_hot = 1e7;

    // the perturbation terms scale with inverse powers of the temperature
    let a_1 = eos.a_first_order(rho, 300.0, &x)?[0];
    let a_2 = eos.a_second_order(rho, 300.0, &x)?[0];
    assert_relative_eq!(
        eos.a_first_order(rho, t_hot, &x)?[0],
        a_1 * 300.0 / t_hot,
        max_relative = 1e-12
    );
    assert_relative_eq!(
        eos.a_second_order(rho, t_hot, &x)?[0],
        a_2 * (300.0 / t_hot).powi(2),
        max_relative = 1e-12
    );

    let c = eos.composition(&x)?;
    let a: f64 = eos
        .residual_helmholtz_energy_contributions(t_hot, rho, c.as_ref())
        .iter()
        .map(|(_, a)| a)
        .sum();
    assert_relative_eq!(a, eos.a_hard_sphere(rho, t_hot, &x)?[0], max_relative = 1e-4);
    Ok(())
}

#[test]
fn mixture_contributions() -> EosResult<()> {
    let eos = Arc::new(GammaSw::new(Arc::new(utils::butane_propanol()?)));
    let x = arr1(&[0.4, 0.6]);
    let state = State::new_nvt(&eos, 320.0, 8000.0, &x)?;
    let contributions = state.residual_helmholtz_energy_contributions();
    let names: Vec<_> = contributions.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(
        names,
        ["hard sphere", "first order", "second order", "chain", "association"]
    );
    let total: f64 = contributions.iter().map(|(_, a)| a).sum();
    assert_relative_eq!(total, state.residual_helmholtz_energy(), max_relative = 1e-12);
    assert!(contributions.iter().all(|(_, a)| a.is_finite()));
    Ok(())
}

#[test]
fn ideal_gas_limit() -> EosResult<()> {
    let eos = Arc::new(GammaSw::new(Arc::new(utils::butane_hexane()?)));
    let x = arr1(&[0.5, 0.5]);
    let state = State::new_nvt(&eos, 300.0, 1e-5, &x)?;
    assert_relative_eq!(state.compressibility(), 1.0, epsilon = 1e-6);

    // the chain term stays finite for vanishing density, g_SW -> 1 + ε/T
    let p = eos.parameters();
    let ln_phi = state.ln_phi();
    for i in 0..2 {
        let bonds = p.segments[i] - 1.0 + p.num_rings[i];
        let expected = -bonds * (1.0 + p.epsilon_k_ij[(i, i)] / 300.0).ln();
        assert!(expected < 0.0);
        assert_relative_eq!(ln_phi[i], expected, epsilon = 1e-6);
    }
    Ok(())
}

#[test]
fn reference_values() -> EosResult<()> {
    let eos = Arc::new(GammaSw::new(Arc::new(utils::butane_hexane()?)));
    let x = arr1(&[0.3, 0.7]);
    let (rho, t) = (500.0, 320.0);
    assert_relative_eq!(eos.a_hard_sphere(rho, t, &x)?[0], 0.25675006674243, max_relative = 1e-10);
    assert_relative_eq!(eos.a_first_order(rho, t, &x)?[0], -0.49056152326127, max_relative = 1e-10);
    assert_relative_eq!(eos.a_second_order(rho, t, &x)?[0], -0.15382945663832, max_relative = 1e-10);
    assert_relative_eq!(eos.a_chain(rho, t, &x)?[0], -0.75581784247547, max_relative = 1e-10);
    assert_relative_eq!(eos.density_max(&x, t)?, 12496.0500994, max_relative = 1e-10);
    Ok(())
}

#[test]
fn ring_correction() -> EosResult<()> {
    let ring = |num_rings: f64| -> EosResult<f64> {
        let p = GammaSwParameters::from_records(
            vec![ComponentRecord::new("CH2x6", [("CH2", 6.0)], num_rings)],
            utils::bead_records(),
            vec![],
        )?;
        let eos = GammaSw::new(Arc::new(p));
        Ok(eos.a_chain(2000.0, 320.0, &arr1(&[1.0]))?[0])
    };
    let (closed, open) = (ring(1.0)?, ring(0.0)?);
    assert_relative_eq!(closed, -1.01549, max_relative = 2e-5);
    assert_relative_eq!(open, -0.53192, max_relative = 2e-5);
    // one additional bond: 6 S_CH2 instead of 6 S_CH2 - 1
    assert_relative_eq!(closed / open, 2.1 / 1.1, max_relative = 1e-12);
    Ok(())
}

#[test]
fn composition_cache() -> EosResult<()> {
    let eos = GammaSw::new(Arc::new(utils::butane_hexane()?));
    let x = arr1(&[0.2, 0.8]);
    let c1 = eos.composition(&x)?;
    let c2 = eos.composition(&x)?;
    assert!(Arc::ptr_eq(&c1, &c2));
    let c3 = eos.composition(&arr1(&[0.8, 0.2]))?;
    assert!(c3.segments_per_molecule < c1.segments_per_molecule);
    Ok(())
}
