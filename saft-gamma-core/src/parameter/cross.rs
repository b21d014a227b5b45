use super::ParameterError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A collection of parameters that model the interaction between two beads.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CrossRecord<B> {
    /// Identifier of the first bead
    pub id1: String,
    /// Identifier of the second bead
    pub id2: String,
    /// Cross interaction parameter(s)
    pub model_record: B,
}

impl<B> CrossRecord<B> {
    /// Crates a new `CrossRecord`.
    pub fn new(id1: String, id2: String, model_record: B) -> Self {
        Self {
            id1,
            id2,
            model_record,
        }
    }

    /// Read a list of `CrossRecord`s from a JSON file.
    pub fn from_json<P: AsRef<Path>>(file: P) -> Result<Vec<Self>, ParameterError>
    where
        B: DeserializeOwned,
    {
        Ok(serde_json::from_reader(BufReader::new(File::open(file)?))?)
    }

    /// Whether the record describes the (unordered) bead pair `id1`, `id2`.
    pub fn matches(&self, id1: &str, id2: &str) -> bool {
        (self.id1 == id1 && self.id2 == id2) || (self.id1 == id2 && self.id2 == id1)
    }
}

/// Model records of all cross records whose beads are both contained in
/// `identifiers`, together with the indices `(k, l)` of the two beads.
pub fn indexed_cross_records<'a, B>(
    identifiers: &[String],
    records: &'a [CrossRecord<B>],
) -> Vec<((usize, usize), &'a B)> {
    let index = |id: &str| identifiers.iter().position(|i| i == id);
    records
        .iter()
        .filter_map(|r| Some(((index(&r.id1)?, index(&r.id2)?), &r.model_record)))
        .collect()
}

impl<B: std::fmt::Display> std::fmt::Display for CrossRecord<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CrossRecord(")?;
        write!(f, "\n\tid1={},", self.id1)?;
        write!(f, "\n\tid2={},", self.id2)?;
        write!(f, "\n\tmodel_record={},", self.model_record)?;
        write!(f, "\n)")
    }
}
