//! Physical constants and fixed unit conversions.
//!
//! Densities enter the public API in mol/m³, temperatures in K and energy
//! parameters in K (energy divided by the Boltzmann constant). Lengths are
//! stored in Å in the parameter records and in nm everywhere else.

/// Boltzmann constant in J/K.
pub const KB: f64 = 1.380649e-23;

/// Avogadro constant in 1/mol.
pub const NAV: f64 = 6.02214076e23;

/// Ideal gas constant in J/(mol K).
pub const RGAS: f64 = KB * NAV;

/// Conversion of a molar density in mol/m³ to a number density in 1/nm³.
pub const MOLECULE_PER_NM3: f64 = 6.02214076e-4;

/// Conversion of lengths in Å to nm.
pub const ANGSTROM_TO_NM: f64 = 0.1;
