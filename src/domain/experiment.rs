// ============================================================
// Layer 3 — Experiment Tracking Records
// ============================================================
// Plain data describing experiments, runs and registered model
// versions. Storage lives in infra::tracking; these types only
// define what a tracked run IS.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::PipelineError;

/// Tag holding the human-readable run name.
pub const RUN_NAME_TAG: &str = "mlflow.runName";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub experiment_id:   String,
    pub name:            String,
    pub lifecycle_stage: String,
    pub creation_time:   i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    pub run_id:        String,
    pub experiment_id: String,
    pub run_name:      String,
    pub status:        RunStatus,
    pub start_time:    i64,
    pub end_time:      Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunData {
    pub params:  BTreeMap<String, String>,
    pub metrics: BTreeMap<String, f64>,
    pub tags:    BTreeMap<String, String>,
}

/// A tracked run: identity plus everything logged against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub info: RunInfo,
    pub data: RunData,
}

impl Run {
    /// The run name tag, or "Unknown_Model" when it was never set.
    pub fn name(&self) -> &str {
        self.data
            .tags
            .get(RUN_NAME_TAG)
            .map(String::as_str)
            .unwrap_or("Unknown_Model")
    }

    pub fn metric(&self, key: &str) -> Option<f64> {
        self.data.metrics.get(key).copied()
    }

    /// Look up the value a `RunKey` refers to.
    fn sort_value(&self, key: &RunKey) -> Option<SortValue<'_>> {
        match key {
            RunKey::Metric(k) => self.data.metrics.get(k).map(|v| SortValue::Number(*v)),
            RunKey::Param(k)  => self.data.params.get(k).map(|v| SortValue::Text(v)),
            RunKey::Tag(k)    => self.data.tags.get(k).map(|v| SortValue::Text(v)),
            RunKey::StartTime => Some(SortValue::Number(self.info.start_time as f64)),
        }
    }
}

enum SortValue<'a> {
    Number(f64),
    Text(&'a str),
}

impl SortValue<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Text(a), SortValue::Text(b))     => a.cmp(b),
            (SortValue::Number(_), SortValue::Text(_))   => Ordering::Less,
            (SortValue::Text(_), SortValue::Number(_))   => Ordering::Greater,
        }
    }
}

// ─── Ordering expressions ─────────────────────────────────────────────────────

/// The field of a run that an ordering refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunKey {
    Metric(String),
    Param(String),
    Tag(String),
    StartTime,
}

/// One `ORDER BY` clause, e.g. `metrics.recall DESC`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub key:        RunKey,
    pub descending: bool,
}

impl OrderBy {
    #[cfg(test)]
    pub fn metric_desc(name: impl Into<String>) -> Self {
        Self { key: RunKey::Metric(name.into()), descending: true }
    }

    /// Compare two runs. Runs missing the key always sort after
    /// runs that have it, whatever the direction.
    pub fn compare(&self, a: &Run, b: &Run) -> Ordering {
        match (a.sort_value(&self.key), b.sort_value(&self.key)) {
            (Some(x), Some(y)) => {
                let ord = x.cmp(&y);
                if self.descending { ord.reverse() } else { ord }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None)    => Ordering::Equal,
        }
    }
}

impl FromStr for OrderBy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || PipelineError::Parse { kind: "order-by clause", value: s.to_string() };
        let mut parts = s.split_whitespace();
        let field = parts.next().ok_or_else(err)?;
        let descending = match parts.next().map(|d| d.to_ascii_uppercase()) {
            None                   => false,
            Some(d) if d == "ASC"  => false,
            Some(d) if d == "DESC" => true,
            Some(_)                => return Err(err()),
        };
        if parts.next().is_some() {
            return Err(err());
        }

        let key = match field.split_once('.') {
            Some(("metrics", k)) => RunKey::Metric(k.to_string()),
            Some(("params", k))  => RunKey::Param(k.to_string()),
            Some(("tags", k))    => RunKey::Tag(k.to_string()),
            _ if field == "start_time" || field == "attributes.start_time" => RunKey::StartTime,
            _ => return Err(err()),
        };
        Ok(Self { key, descending })
    }
}

/// Parameters of a run search.
#[derive(Debug, Clone, Default)]
pub struct RunQuery {
    pub experiment_ids: Vec<String>,
    pub order_by:       Vec<OrderBy>,
    pub max_results:    Option<usize>,
    /// Only return runs in this status.
    pub status:         Option<RunStatus>,
}

// ─── Model registry ───────────────────────────────────────────────────────────

/// Lifecycle stage of a registered model version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    None,
    Staging,
    Production,
    Archived,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::None       => "None",
            Stage::Staging    => "Staging",
            Stage::Production => "Production",
            Stage::Archived   => "Archived",
        };
        f.write_str(s)
    }
}

impl FromStr for Stage {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none"       => Ok(Stage::None),
            "staging"    => Ok(Stage::Staging),
            "production" => Ok(Stage::Production),
            "archived"   => Ok(Stage::Archived),
            _ => Err(PipelineError::Parse { kind: "stage", value: s.to_string() }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVersion {
    pub name:                   String,
    pub version:                u32,
    /// Artifact URI the version was registered from, e.g. `runs:/<id>/model`.
    pub source:                 String,
    pub run_id:                 Option<String>,
    pub current_stage:          Stage,
    pub creation_timestamp:     i64,
    pub last_updated_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredModel {
    pub name:               String,
    pub creation_timestamp: i64,
    pub versions:           Vec<ModelVersion>,
}

/// Split a `runs:/<run_id>/<path>` URI into its run id and artifact path.
pub fn parse_runs_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix("runs:/")?;
    let (run_id, path) = rest.split_once('/').unwrap_or((rest, ""));
    if run_id.is_empty() { None } else { Some((run_id, path)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(id: &str, recall: Option<f64>) -> Run {
        let mut data = RunData::default();
        if let Some(r) = recall {
            data.metrics.insert("recall".into(), r);
        }
        Run {
            info: RunInfo {
                run_id:        id.into(),
                experiment_id: "1".into(),
                run_name:      id.into(),
                status:        RunStatus::Finished,
                start_time:    0,
                end_time:      None,
            },
            data,
        }
    }

    #[test]
    fn test_parse_order_by() {
        let o: OrderBy = "metrics.recall DESC".parse().unwrap();
        assert_eq!(o, OrderBy::metric_desc("recall"));

        let o: OrderBy = "params.C".parse().unwrap();
        assert_eq!(o.key, RunKey::Param("C".into()));
        assert!(!o.descending);

        assert!("recall DESC".parse::<OrderBy>().is_err());
        assert!("metrics.recall SIDEWAYS".parse::<OrderBy>().is_err());
    }

    #[test]
    fn test_missing_metric_sorts_last_in_both_directions() {
        let with    = run("a", Some(0.5));
        let without = run("b", None);
        let desc = OrderBy::metric_desc("recall");
        let asc  = OrderBy { key: RunKey::Metric("recall".into()), descending: false };
        assert_eq!(desc.compare(&with, &without), Ordering::Less);
        assert_eq!(asc.compare(&with, &without), Ordering::Less);
    }

    #[test]
    fn test_descending_puts_highest_first() {
        let lo = run("lo", Some(0.6));
        let hi = run("hi", Some(0.9));
        assert_eq!(OrderBy::metric_desc("recall").compare(&hi, &lo), Ordering::Less);
    }

    #[test]
    fn test_stage_round_trip_text() {
        assert_eq!("staging".parse::<Stage>().unwrap(), Stage::Staging);
        assert_eq!(Stage::Production.to_string(), "Production");
        assert!("qa".parse::<Stage>().is_err());
    }

    #[test]
    fn test_parse_runs_uri() {
        assert_eq!(parse_runs_uri("runs:/abc123/model"), Some(("abc123", "model")));
        assert_eq!(parse_runs_uri("runs:/abc123"), Some(("abc123", "")));
        assert_eq!(parse_runs_uri("file:///tmp/model"), None);
    }

    #[test]
    fn test_run_name_falls_back() {
        assert_eq!(run("x", None).name(), "Unknown_Model");
    }
}
