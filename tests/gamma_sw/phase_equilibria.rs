use approx::assert_relative_eq;
use ndarray::arr1;
use saft_gamma::gamma_sw::{utils, GammaSw};
use saft_gamma_core::batch::{saturation_properties, Dispatch, PhaseFlag};
use saft_gamma_core::batch::{liquid_properties, FailureKind};
use saft_gamma_core::{density_iteration, EosError, PhaseEquilibrium, Residual, SolverOptions, State};
use std::error::Error;
use std::sync::Arc;

fn butane_hexane() -> Result<Arc<GammaSw>, Box<dyn Error>> {
    Ok(Arc::new(GammaSw::new(Arc::new(utils::butane_hexane()?))))
}

#[test]
fn liquid_density_root() -> Result<(), Box<dyn Error>> {
    let eos = butane_hexane()?;
    let x = arr1(&[1.0, 0.0]);
    let rho_max = eos.density_max(&x, 250.0)?;
    let rho = 0.8 * rho_max;
    let p = State::new_nvt(&eos, 250.0, rho, &x)?.pressure();
    assert!(p > 1e7);
    let liquid = density_iteration(&eos, 250.0, p, &x, 0.75 * rho_max)?;
    assert_relative_eq!(liquid.density, rho, max_relative = 1e-8);
    assert_relative_eq!(liquid.pressure(), p, max_relative = 1e-9);
    Ok(())
}

#[test]
fn pure_saturation() -> Result<(), Box<dyn Error>> {
    let eos = butane_hexane()?;
    let vle = PhaseEquilibrium::pure(&eos, 250.0, &arr1(&[1.0, 0.0]), SolverOptions::default())?;
    assert_relative_eq!(
        vle.vapor().pressure(),
        vle.liquid().pressure(),
        max_relative = 1e-6
    );
    assert!(vle.liquid().density > 10.0 * vle.vapor().density);
    Ok(())
}

#[test]
fn bubble_point_between_pure_pressures() -> Result<(), Box<dyn Error>> {
    let eos = butane_hexane()?;
    let t = 280.0;
    let options = SolverOptions::default();
    let p_butane = PhaseEquilibrium::pure(&eos, t, &arr1(&[1.0, 0.0]), options)?.pressure();
    let p_hexane = PhaseEquilibrium::pure(&eos, t, &arr1(&[0.0, 1.0]), options)?.pressure();
    assert!(p_butane > p_hexane);

    let bubble = PhaseEquilibrium::bubble_point(&eos, t, &arr1(&[0.5, 0.5]), None, options)?;
    assert!(bubble.pressure() > p_hexane && bubble.pressure() < p_butane);
    // the vapor is enriched in the light component
    assert!(bubble.vapor().molefracs[0] > 0.5);

    let dew = PhaseEquilibrium::dew_point(&eos, t, &arr1(&[0.5, 0.5]), None, options)?;
    assert!(dew.pressure() < bubble.pressure());
    assert!(dew.liquid().molefracs[0] < 0.5);

    // single nonzero mole fraction reduces to the pure saturation point
    let pure = PhaseEquilibrium::bubble_point(&eos, t, &arr1(&[1.0, 0.0]), None, options)?;
    assert_relative_eq!(pure.pressure(), p_butane, max_relative = 1e-8);
    Ok(())
}

#[test]
fn flash_requires_binary() -> Result<(), Box<dyn Error>> {
    let eos = Arc::new(GammaSw::new(Arc::new(utils::butane()?)));
    assert!(matches!(
        PhaseEquilibrium::binary_flash(&eos, 280.0, 1e5, None, SolverOptions::default()),
        Err(EosError::IncompatibleComponents(1, 2))
    ));
    Ok(())
}

#[test]
fn batch_failures_do_not_abort() -> Result<(), Box<dyn Error>> {
    let eos = butane_hexane()?;
    let x = [arr1(&[1.0, 0.0])];
    let records = saturation_properties(
        &eos,
        &[240.0, -1.0, 260.0],
        &x,
        SolverOptions::default(),
        Dispatch::Serial,
    )?;
    assert_eq!(records.len(), 3);
    assert!(records[0].failure.is_none() && records[2].failure.is_none());
    assert!(records[2].pressure > records[0].pressure);
    let failure = records[1].failure.as_ref().ok_or("expected a failure")?;
    assert_eq!(failure.kind, FailureKind::InvalidInput);
    assert!(records[1].pressure.is_nan());

    // mismatched input lengths are rejected before dispatch
    assert!(liquid_properties(
        &eos,
        &[250.0, 260.0],
        &[1e5, 2e5, 3e5],
        &x,
        Dispatch::Serial
    )
    .is_err());

    let liquid = liquid_properties(&eos, &[250.0], &[1e6], &[arr1(&[0.5, 0.5])], Dispatch::Serial)?;
    assert_eq!(liquid[0].flag, PhaseFlag::Liquid);
    assert!(liquid[0].phi.iter().all(|phi| *phi > 0.0 && *phi < 1.0));
    Ok(())
}
