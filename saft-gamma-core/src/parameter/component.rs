use super::ParameterError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Bead composition of a single molecule.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ComponentRecord {
    pub identifier: String,
    /// Number of beads of each type. Fractional counts are allowed for fused groups.
    pub beads: IndexMap<String, f64>,
    /// Number of rings in the molecule.
    #[serde(default)]
    #[serde(skip_serializing_if = "is_zero")]
    pub num_rings: f64,
}

fn is_zero(x: &f64) -> bool {
    *x == 0.0
}

impl ComponentRecord {
    /// Creates a new `ComponentRecord`.
    pub fn new<'a, I>(identifier: &str, beads: I, num_rings: f64) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        Self {
            identifier: identifier.to_string(),
            beads: beads.into_iter().map(|(b, n)| (b.to_string(), n)).collect(),
            num_rings,
        }
    }

    /// Read a list of `ComponentRecord`s from a JSON file.
    pub fn from_json<P: AsRef<Path>>(file: P) -> Result<Vec<Self>, ParameterError> {
        Ok(serde_json::from_reader(BufReader::new(File::open(file)?))?)
    }
}

impl fmt::Display for ComponentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentRecord(identifier={}", self.identifier)?;
        write!(f, ", beads={:?}", self.beads)?;
        if self.num_rings > 0.0 {
            write!(f, ", num_rings={}", self.num_rings)?;
        }
        write!(f, ")")
    }
}
