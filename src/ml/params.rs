// ============================================================
// Layer 5 — Hyperparameter Sets and Grids
// ============================================================
// A ParamGrid maps each hyperparameter name to its candidate
// values. Expanding the grid yields every combination as a
// ParamSet, names iterated in sorted order with the last name
// varying fastest:
//
//   { C: [0.1, 1.0], solver: [adam, sgd] }
//     → {C=0.1, solver=adam}, {C=0.1, solver=sgd},
//       {C=1.0, solver=adam}, {C=1.0, solver=sgd}
//
// Candidate order matters: grid search keeps the first of any
// equally-scored candidates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{PipelineError, Result};

/// One hyperparameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    None,
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::None     => f.write_str("None"),
            ParamValue::Int(i)   => write!(f, "{i}"),
            // Debug keeps the ".0" on whole floats: 1.0 not 1
            ParamValue::Float(x) => write!(f, "{x:?}"),
            ParamValue::Text(s)  => f.write_str(s),
        }
    }
}

/// One point of a grid: a concrete value for every hyperparameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSet(BTreeMap<String, ParamValue>);

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    /// Integer value; `Ok(None)` when absent.
    pub fn int(&self, name: &str) -> Result<Option<i64>> {
        match self.get(name) {
            None                      => Ok(None),
            Some(ParamValue::Int(i))  => Ok(Some(*i)),
            Some(other)               => Err(type_error(name, "an integer", other)),
        }
    }

    /// Optional integer: absent and `None` both give `Ok(None)`.
    pub fn optional_int(&self, name: &str) -> Result<Option<i64>> {
        match self.get(name) {
            None | Some(ParamValue::None) => Ok(None),
            Some(ParamValue::Int(i))      => Ok(Some(*i)),
            Some(other)                   => Err(type_error(name, "an integer or None", other)),
        }
    }

    /// Float value; integers are widened.
    pub fn float(&self, name: &str) -> Result<Option<f64>> {
        match self.get(name) {
            None                       => Ok(None),
            Some(ParamValue::Float(x)) => Ok(Some(*x)),
            Some(ParamValue::Int(i))   => Ok(Some(*i as f64)),
            Some(other)                => Err(type_error(name, "a number", other)),
        }
    }

    pub fn text(&self, name: &str) -> Result<Option<&str>> {
        match self.get(name) {
            None                      => Ok(None),
            Some(ParamValue::Text(s)) => Ok(Some(s.as_str())),
            Some(other)               => Err(type_error(name, "a string", other)),
        }
    }

    /// Every value rendered as text, as logged to the tracker.
    pub fn to_strings(&self) -> BTreeMap<String, String> {
        self.0.iter().map(|(k, v)| (k.clone(), v.to_string())).collect()
    }
}

impl fmt::Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}={v}")).collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

fn type_error(name: &str, expected: &str, got: &ParamValue) -> PipelineError {
    PipelineError::InvalidParam {
        name:   name.to_string(),
        reason: format!("expected {expected}, got {got:?}"),
    }
}

/// Candidate values per hyperparameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid(BTreeMap<String, Vec<ParamValue>>);

impl ParamGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, values: Vec<ParamValue>) -> Self {
        self.0.insert(name.into(), values);
        self
    }

    /// Number of combinations (1 for an empty grid).
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every combination, last name varying fastest.
    pub fn expand(&self) -> Vec<ParamSet> {
        let mut out = vec![ParamSet::new()];
        for (name, values) in &self.0 {
            out = out
                .into_iter()
                .flat_map(|base| {
                    values.iter().map(move |v| {
                        let mut next = base.clone();
                        next.insert(name.clone(), v.clone());
                        next
                    })
                })
                .collect();
        }
        out
    }
}
