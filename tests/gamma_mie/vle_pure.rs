use approx::assert_relative_eq;
use ndarray::arr1;
use saft_gamma::gamma_mie::{utils, GammaMie};
use saft_gamma_core::batch::{saturation_properties, Dispatch};
use saft_gamma_core::{density_iteration, PhaseEquilibrium, Residual, SolverOptions, State};
use std::error::Error;
use std::sync::Arc;

#[test]
fn liquid_and_vapor_roots() -> Result<(), Box<dyn Error>> {
    let eos = Arc::new(GammaMie::new(Arc::new(utils::butane()?)));
    let x = arr1(&[1.0]);
    let rho_max = eos.density_max(&x, 250.0)?;
    let p = State::new_nvt(&eos, 250.0, 0.8 * rho_max, &x)?.pressure();
    let liquid = density_iteration(&eos, 250.0, p, &x, 0.75 * rho_max)?;
    assert_relative_eq!(liquid.density, 0.8 * rho_max, max_relative = 1e-8);

    let vapor = density_iteration(&eos, 250.0, 1e4, &x, 1.0)?;
    assert_relative_eq!(vapor.pressure(), 1e4, max_relative = 1e-9);
    assert!(vapor.density < 10.0);
    Ok(())
}

#[test]
fn butane_vapor_pressure() -> Result<(), Box<dyn Error>> {
    let eos = Arc::new(GammaMie::new(Arc::new(utils::butane()?)));
    let x = arr1(&[1.0]);
    let vle = PhaseEquilibrium::pure(&eos, 250.0, &x, SolverOptions::default())?;
    assert_relative_eq!(
        vle.vapor().pressure(),
        vle.liquid().pressure(),
        max_relative = 1e-6
    );
    // experimental vapor pressure 39 kPa
    let p = vle.pressure();
    assert!(p > 2.5e4 && p < 6e4, "p = {}", p);
    // experimental liquid density 10.5 kmol/m³
    assert!(vle.liquid().density > 9000.0 && vle.liquid().density < 12000.0);
    Ok(())
}

#[test]
fn water_vapor_pressure() -> Result<(), Box<dyn Error>> {
    let eos = Arc::new(GammaMie::new(Arc::new(utils::water()?)));
    let vle = PhaseEquilibrium::pure(&eos, 373.15, &arr1(&[1.0]), SolverOptions::default())?;
    let p = vle.pressure();
    assert!(p > 7e4 && p < 1.4e5, "p = {}", p);
    Ok(())
}

#[test]
fn saturation_curve() -> Result<(), Box<dyn Error>> {
    let eos = Arc::new(GammaMie::new(Arc::new(utils::butane()?)));
    let temperatures = [230.0, 250.0, 270.0, 290.0];
    let records = saturation_properties(
        &eos,
        &temperatures,
        &[arr1(&[1.0])],
        SolverOptions::default(),
        Dispatch::Serial,
    )?;
    for pair in records.windows(2) {
        assert!(pair[1].pressure > pair[0].pressure);
        assert!(pair[1].liquid_density < pair[0].liquid_density);
    }
    Ok(())
}
