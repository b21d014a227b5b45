use approx::assert_relative_eq;
use ndarray::arr1;
use saft_gamma::gamma_mie::{utils, GammaMie, GammaMieParameters};
use saft_gamma_core::parameter::Parameter;
use saft_gamma_core::{EosResult, Residual, State};
use std::error::Error;
use std::sync::Arc;

#[test]
fn hs_diameter_ethane() -> EosResult<()> {
    let eos = GammaMie::new(Arc::new(utils::mie_fluid(
        1.4373, 206.12, 3.7257, 12.4, 6.0,
    )?));
    let d = eos.hs_diameter(50.0)?;
    // Lafitte et al. (2013), 3.694 Angstrom
    assert_relative_eq!(d[0], 0.3694019351651498, max_relative = 1e-5);
    assert!(eos.hs_diameter(0.0).is_err());
    Ok(())
}

#[test]
fn perturbation_terms() -> EosResult<()> {
    let eos = GammaMie::new(Arc::new(utils::butane()?));
    let x = arr1(&[1.0]);
    let rho = [100.0, 5000.0, 10000.0];
    let a_1 = eos.a_first_order(rho, 300.0, &x)?;
    let a_2 = eos.a_second_order(rho, 300.0, &x)?;
    let a_3 = eos.a_third_order(rho, 300.0, &x)?;
    assert!(a_1.iter().all(|&a| a < 0.0));
    assert!(a_2.iter().all(|&a| a < 0.0));
    assert!(a_3.iter().all(|a| a.is_finite()));
    assert!(a_1[2] < a_1[1]);
    Ok(())
}

#[test]
fn pressure_and_ideal_gas_limit() -> EosResult<()> {
    let eos = Arc::new(GammaMie::new(Arc::new(utils::butane_hexane()?)));
    let x = arr1(&[0.5, 0.5]);
    let dilute = State::new_nvt(&eos, 300.0, 1e-5, &x)?;
    assert_relative_eq!(dilute.compressibility(), 1.0, epsilon = 1e-6);

    // finite difference of the Helmholtz energy
    let rho = 500.0;
    let h = 1e-3;
    let c = eos.composition(&x)?;
    let a = |rho: f64| eos.residual_helmholtz_energy(300.0, rho, c.as_ref());
    let da_drho = (a(rho + h) - a(rho - h)) / (2.0 * h);
    let state = State::new_nvt(&eos, 300.0, rho, &x)?;
    assert_relative_eq!(
        state.compressibility(),
        1.0 + rho * da_drho,
        epsilon = 1e-6
    );
    Ok(())
}

#[test]
fn json_parameters() -> Result<(), Box<dyn Error>> {
    let p = GammaMieParameters::from_json(
        &["hexane", "water"],
        "tests/gamma_mie/components.json",
        "tests/gamma_mie/beads.json",
        Some("tests/gamma_mie/cross.json"),
    )?;
    let reference = utils::butane_hexane()?;
    assert_eq!(p.epsilon_k_kl.slice(ndarray::s![..2, ..2]), reference.epsilon_k_kl);
    assert!(!p.association.sites.is_empty());

    let eos = Arc::new(GammaMie::new(Arc::new(p)));
    let state = State::new_nvt(&eos, 300.0, 20000.0, &arr1(&[0.1, 0.9]))?;
    let contributions = state.residual_helmholtz_energy_contributions();
    assert_eq!(contributions.len(), 6);
    assert_eq!(contributions[5].0, "association");
    assert!(contributions[5].1 < 0.0);
    Ok(())
}
