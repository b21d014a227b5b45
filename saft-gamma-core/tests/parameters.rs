use ndarray::{arr2, Array2};
use saft_gamma_core::parameter::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct MyBeadModel {
    a: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct MyCrossModel {
    b: f64,
}

struct MyParameter {
    nui: Array2<f64>,
    component_records: Vec<ComponentRecord>,
    bead_records: Vec<BeadRecord<MyBeadModel>>,
    cross_records: Vec<CrossRecord<MyCrossModel>>,
}

impl Parameter for MyParameter {
    type Bead = MyBeadModel;
    type Cross = MyCrossModel;

    fn from_records(
        component_records: Vec<ComponentRecord>,
        bead_records: Vec<BeadRecord<MyBeadModel>>,
        cross_records: Vec<CrossRecord<MyCrossModel>>,
    ) -> Result<Self, ParameterError> {
        let (beads, nui) = bead_composition(&component_records, &bead_records)?;
        Ok(Self {
            nui,
            component_records,
            bead_records: beads,
            cross_records,
        })
    }

    fn records(
        &self,
    ) -> (
        &[ComponentRecord],
        &[BeadRecord<MyBeadModel>],
        &[CrossRecord<MyCrossModel>],
    ) {
        (
            &self.component_records,
            &self.bead_records,
            &self.cross_records,
        )
    }
}

fn records() -> Result<
    (
        Vec<ComponentRecord>,
        Vec<BeadRecord<MyBeadModel>>,
        Vec<CrossRecord<MyCrossModel>>,
    ),
    serde_json::Error,
> {
    let components = r#"
        [
            {"identifier": "ethanol", "beads": {"CH3": 1.0, "CH2OH": 1.0}},
            {"identifier": "pentane", "beads": {"CH3": 2.0, "CH2": 3.0}}
        ]
        "#;
    let beads = r#"
        [
            {"identifier": "CH3", "molarweight": 15.035, "model_record": {"a": 0.1}},
            {"identifier": "CH2", "molarweight": 14.027, "model_record": {"a": 0.2}},
            {"identifier": "CH2OH", "molarweight": 31.034, "model_record": {"a": 0.3}},
            {"identifier": "NH2", "molarweight": 16.023, "model_record": {"a": 0.4}}
        ]
        "#;
    let cross = r#"
        [
            {"id1": "CH3", "id2": "CH2OH", "model_record": {"b": 12.0}}
        ]
        "#;
    Ok((
        serde_json::from_str(components)?,
        serde_json::from_str(beads)?,
        serde_json::from_str(cross)?,
    ))
}

#[test]
fn from_records() -> Result<(), Box<dyn std::error::Error>> {
    let (components, beads, cross) = records()?;
    let p = MyParameter::from_records(components, beads, cross)?;

    // unused beads are dropped, order of the bead library is kept
    let ids: Vec<_> = p.bead_records.iter().map(|b| b.identifier.as_str()).collect();
    assert_eq!(ids, ["CH3", "CH2", "CH2OH"]);
    assert_eq!(p.nui, arr2(&[[1.0, 0.0, 1.0], [2.0, 3.0, 0.0]]));
    assert_eq!(p.component_records[0].num_rings, 0.0);
    Ok(())
}

#[test]
fn missing_bead() -> Result<(), Box<dyn std::error::Error>> {
    let (mut components, beads, cross) = records()?;
    components.push(ComponentRecord::new(
        "methylamine",
        [("CH3", 1.0), ("NH", 1.0)],
        0.0,
    ));
    let result = MyParameter::from_records(components, beads, cross);
    assert!(matches!(result, Err(ParameterError::BeadsNotFound(_))));
    Ok(())
}

#[test]
fn negative_bead_count() -> Result<(), Box<dyn std::error::Error>> {
    let (_, beads, cross) = records()?;
    let components = vec![ComponentRecord::new("x", [("CH3", -1.0)], 0.0)];
    let result = MyParameter::from_records(components, beads, cross);
    assert!(matches!(result, Err(ParameterError::InvalidComposition(_))));
    Ok(())
}

#[test]
fn subset() -> Result<(), Box<dyn std::error::Error>> {
    let (components, beads, cross) = records()?;
    let p = MyParameter::from_records(components, beads, cross)?;
    let pentane = p.subset(&[1])?;
    assert_eq!(pentane.component_records[0].identifier, "pentane");
    assert_eq!(pentane.nui, arr2(&[[2.0, 3.0]]));
    assert_eq!(pentane.cross_records.len(), 1);
    Ok(())
}

#[test]
fn refreshed() -> Result<(), Box<dyn std::error::Error>> {
    let (components, beads, cross) = records()?;
    let p = MyParameter::from_records(components, beads, cross)?;
    let bead = BeadRecord::new("CH2".into(), 14.027, MyBeadModel { a: 0.25 });
    let replaced = CrossRecord::new("CH2OH".into(), "CH3".into(), MyCrossModel { b: 13.0 });
    let added = CrossRecord::new("CH2".into(), "CH3".into(), MyCrossModel { b: 5.0 });
    let q = p.refreshed(&[bead], &[replaced, added])?;

    assert_eq!(q.bead_records[1].model_record, MyBeadModel { a: 0.25 });
    assert_eq!(q.cross_records.len(), 2);
    assert_eq!(q.cross_records[0].model_record.b, 13.0);
    assert_eq!(q.cross_records[1].model_record.b, 5.0);
    // the original parameters are untouched
    assert_eq!(p.bead_records[1].model_record.a, 0.2);
    Ok(())
}

#[test]
fn bounds() {
    let bounds = ParameterBounds::new(&[(BeadParameter::Sk, 0.0, 1.0)]);
    assert!(bounds.check(BeadParameter::Sk, "CH3", 1.0).is_ok());
    assert!(matches!(
        bounds.check(BeadParameter::Sk, "CH3", 1.2),
        Err(ParameterError::OutOfBounds(..))
    ));
    assert!(bounds.check(BeadParameter::Lambda, "CH3", 100.0).is_ok());
}
