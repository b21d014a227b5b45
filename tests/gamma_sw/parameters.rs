use ndarray::arr1;
use saft_gamma::gamma_sw::{GammaSw, GammaSwParameters};
use saft_gamma_core::parameter::{Parameter, ParameterError};
use saft_gamma_core::Residual;
use std::error::Error;
use std::sync::Arc;

fn read_params(components: &[&str]) -> Result<GammaSwParameters, ParameterError> {
    GammaSwParameters::from_json(
        components,
        "tests/gamma_sw/components.json",
        "tests/gamma_sw/beads.json",
        Some("tests/gamma_sw/cross.json"),
    )
}

#[test]
fn from_json() -> Result<(), Box<dyn Error>> {
    let p = read_params(&["butane", "1-propanol"])?;
    assert_eq!(p.bead_identifiers, ["CH3", "CH2", "OH"]);
    assert_eq!(p.nui.row(1).to_vec(), [1.0, 2.0, 1.0]);
    assert_eq!(p.epsilon_k_kl[(0, 1)], 240.0);
    assert_eq!(p.epsilon_k_kl[(1, 0)], 240.0);
    assert_eq!(p.association.sites.len(), 2);

    let eos = GammaSw::new(Arc::new(p));
    assert_eq!(eos.components(), 2);
    let mw = eos.molar_weight();
    assert!((mw[0] - 58.124).abs() < 1e-10);
    Ok(())
}

#[test]
fn missing_component() {
    assert!(matches!(
        read_params(&["butane", "octane"]),
        Err(ParameterError::ComponentsNotFound(_))
    ));
}

#[test]
fn ring_structure() -> Result<(), Box<dyn Error>> {
    let p = read_params(&["cyclohexane"])?;
    assert_eq!(p.num_rings, arr1(&[1.0]));
    assert_eq!(p.bead_identifiers, ["CH2"]);
    Ok(())
}

#[test]
fn subset_keeps_records() -> Result<(), Box<dyn Error>> {
    let p = read_params(&["butane", "hexane"])?;
    let hexane = p.subset(&[1])?;
    assert_eq!(hexane.ncomp(), 1);
    assert_eq!(hexane.segments[0], p.segments[1]);
    assert_eq!(hexane.epsilon_k_kl, p.epsilon_k_kl);
    Ok(())
}
