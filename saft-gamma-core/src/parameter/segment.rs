use super::ParameterError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::BufReader;
use std::path::Path;

/// Parameters describing an individual bead (functional group) of a molecule.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BeadRecord<M> {
    pub identifier: String,
    /// Molar weight of the bead in g/mol.
    pub molarweight: f64,
    pub model_record: M,
}

impl<M> BeadRecord<M> {
    /// Creates a new `BeadRecord`.
    pub fn new(identifier: String, molarweight: f64, model_record: M) -> Self {
        Self {
            identifier,
            molarweight,
            model_record,
        }
    }

    /// Read a list of `BeadRecord`s from a JSON file.
    pub fn from_json<P: AsRef<Path>>(file: P) -> Result<Vec<Self>, ParameterError>
    where
        M: DeserializeOwned,
    {
        Ok(serde_json::from_reader(BufReader::new(File::open(file)?))?)
    }
}

impl<M> Hash for BeadRecord<M> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
    }
}

impl<M> PartialEq for BeadRecord<M> {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}
impl<M> Eq for BeadRecord<M> {}

impl<M: std::fmt::Display> std::fmt::Display for BeadRecord<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BeadRecord(\n\tidentifier={}", self.identifier)?;
        write!(f, "\n\tmolarweight={}", self.molarweight)?;
        write!(f, "\n\tmodel_record={}", self.model_record)?;
        write!(f, "\n)")
    }
}
