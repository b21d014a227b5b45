//! Validation of density inputs.
use crate::errors::{EosError, EosResult};
use ndarray::{Array1, ArrayView1};

/// Conversion of scalar and array-like inputs into a 1-D array of molar
/// densities in mol/m³.
pub trait IntoDensities {
    fn into_densities(self) -> Array1<f64>;
}

impl IntoDensities for f64 {
    fn into_densities(self) -> Array1<f64> {
        Array1::from_elem(1, self)
    }
}

impl IntoDensities for &[f64] {
    fn into_densities(self) -> Array1<f64> {
        Array1::from(self.to_vec())
    }
}

impl<const N: usize> IntoDensities for [f64; N] {
    fn into_densities(self) -> Array1<f64> {
        Array1::from(self.to_vec())
    }
}

impl<const N: usize> IntoDensities for &[f64; N] {
    fn into_densities(self) -> Array1<f64> {
        Array1::from(self.to_vec())
    }
}

impl IntoDensities for Vec<f64> {
    fn into_densities(self) -> Array1<f64> {
        Array1::from(self)
    }
}

impl IntoDensities for Array1<f64> {
    fn into_densities(self) -> Array1<f64> {
        self
    }
}

impl IntoDensities for &Array1<f64> {
    fn into_densities(self) -> Array1<f64> {
        self.clone()
    }
}

impl IntoDensities for ArrayView1<'_, f64> {
    fn into_densities(self) -> Array1<f64> {
        self.to_owned()
    }
}

/// Returns the densities as an array if none of them is NaN or negative
/// and at least one density is given.
pub fn check_density<R: IntoDensities>(density: R) -> EosResult<Array1<f64>> {
    let density = density.into_densities();
    if density.is_empty() {
        return Err(EosError::InvalidDensity(
            "no value of density was given".into(),
        ));
    }
    if density.iter().any(|rho| rho.is_nan()) {
        return Err(EosError::InvalidDensity("density contains NaN".into()));
    }
    if let Some(rho) = density.iter().find(|&&rho| rho < 0.0) {
        return Err(EosError::InvalidDensity(format!(
            "density values cannot be negative, got {}",
            rho
        )));
    }
    Ok(density)
}

/// Returns an error naming the calling function if the temperature is not
/// finite and positive.
pub fn check_temperature(name: &str, temperature: f64) -> EosResult<()> {
    if temperature.is_finite() && temperature > 0.0 {
        Ok(())
    } else {
        Err(EosError::InvalidState(
            name.to_string(),
            "temperature".to_string(),
            temperature,
        ))
    }
}
