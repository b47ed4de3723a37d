use serde::de::{Deserializer, IgnoredAny};
use serde::{Deserialize, Serialize};

use super::{Column, Value};
use crate::error::{Result, SimviewError};

/// One simulated replication of a two-sample comparison.
///
/// Every field tolerates `null`, absence or a value of the wrong type: it
/// loads as missing (NaN for numbers, `None` otherwise), which renders empty
/// and sorts last. Non-finite numbers serialize back out as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replication {
    /// 1-based replication number (assigned on load when absent)
    #[serde(default, deserialize_with = "lenient")]
    pub simulation_id: Option<usize>,
    #[serde(default = "missing_number", deserialize_with = "lenient_number")]
    pub p_value: f64,
    /// Cohen's d
    #[serde(default = "missing_number", deserialize_with = "lenient_number")]
    pub effect_size: f64,
    /// 95% confidence interval for the effect size
    #[serde(default = "missing_interval", deserialize_with = "lenient_interval")]
    pub confidence_interval: (f64, f64),
    /// Shannon information against the null, `-log2(p)`
    #[serde(default = "missing_number", deserialize_with = "lenient_number")]
    pub s_value: f64,
    #[serde(default, deserialize_with = "lenient")]
    pub significant: Option<bool>,
}

/// Either a well-formed `T` or anything else, which is skipped.
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Valid(T),
    Invalid(IgnoredAny),
}

impl<T> Lenient<T> {
    fn ok(self) -> Option<T> {
        match self {
            Lenient::Valid(v) => Some(v),
            Lenient::Invalid(IgnoredAny) => None,
        }
    }
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Lenient::<T>::deserialize(deserializer)?.ok())
}

fn missing_number() -> f64 {
    f64::NAN
}

fn missing_interval() -> (f64, f64) {
    (f64::NAN, f64::NAN)
}

fn lenient_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<f64, D::Error> {
    Ok(lenient::<D, f64>(deserializer)?.unwrap_or(f64::NAN))
}

fn lenient_interval<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<(f64, f64), D::Error> {
    let bounds = lenient::<D, (Lenient<f64>, Lenient<f64>)>(deserializer)?;
    Ok(bounds.map_or_else(missing_interval, |(lo, hi)| {
        (
            lo.ok().unwrap_or(f64::NAN),
            hi.ok().unwrap_or(f64::NAN),
        )
    }))
}

impl Replication {
    /// Standard column set for a replications table.
    pub fn columns() -> Vec<Column<Replication>> {
        vec![
            Column::new("simulation_id", |r: &Replication| Value::from(r.simulation_id))
                .label("#"),
            Column::new("p_value", |r: &Replication| Value::Number(r.p_value))
                .label("p-value")
                .precision(4),
            Column::new("effect_size", |r: &Replication| Value::Number(r.effect_size))
                .label("Effect size (d)")
                .precision(3),
            Column::new("ci", |r: &Replication| {
                Value::from(r.confidence_interval)
            })
            .label("95% CI")
            .precision(3)
            .interval(),
            Column::new("s_value", |r: &Replication| Value::Number(r.s_value))
                .label("S-value")
                .precision(2),
            Column::new("significant", |r: &Replication| Value::from(r.significant))
                .label("Significant"),
        ]
    }

    pub fn ci_width(&self) -> f64 {
        self.confidence_interval.1 - self.confidence_interval.0
    }
}

/// Aggregated summary of all replications for one sample pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSummary {
    pub pair: String,
    pub significant_count: usize,
    pub total_count: usize,
    pub mean_effect_size: f64,
    pub effect_size_ci: (f64, f64),
    /// Fraction of replications whose CI covered the true effect
    pub ci_coverage: f64,
    pub mean_ci_width: f64,
}

impl PairSummary {
    /// Build a summary row from a loaded run.
    pub fn from_run(pair: impl Into<String>, run: &SimulationRun) -> Self {
        Self {
            pair: pair.into(),
            significant_count: run.significant_count,
            total_count: run.total_count,
            mean_effect_size: run.mean_effect_size,
            effect_size_ci: run.effect_size_ci,
            ci_coverage: run.ci_coverage,
            mean_ci_width: run.mean_ci_width,
        }
    }

    /// Share of replications reaching significance; missing when empty.
    pub fn power(&self) -> Option<f64> {
        if self.total_count == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        Some(self.significant_count as f64 / self.total_count as f64)
    }

    /// Standard column set for a per-pair summary table.
    pub fn columns() -> Vec<Column<PairSummary>> {
        vec![
            Column::new("pair", |s: &PairSummary| Value::from(s.pair.as_str())).label("Pair"),
            Column::new("significant_count", |s: &PairSummary| {
                Value::from(s.significant_count)
            })
            .label("Significant"),
            Column::new("total_count", |s: &PairSummary| Value::from(s.total_count))
                .label("Total"),
            Column::new("power", |s: &PairSummary| Value::from(s.power()))
                .label("Power")
                .precision(3),
            Column::new("mean_effect_size", |s: &PairSummary| {
                Value::Number(s.mean_effect_size)
            })
            .label("Mean d")
            .precision(3),
            Column::new("effect_size_ci", |s: &PairSummary| Value::from(s.effect_size_ci))
                .label("d 95% range")
                .precision(3)
                .interval(),
            Column::new("ci_coverage", |s: &PairSummary| Value::Number(s.ci_coverage))
                .label("CI coverage")
                .precision(3),
            Column::new("mean_ci_width", |s: &PairSummary| Value::Number(s.mean_ci_width))
                .label("Mean CI width")
                .precision(3),
        ]
    }
}

/// Aggregated results object as produced by the simulation backend.
///
/// Histogram data and other presentation fields are ignored. Summary
/// statistics that are absent or `null` load as NaN.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationRun {
    #[serde(default)]
    pub individual_results: Vec<Replication>,
    #[serde(default)]
    pub significant_count: usize,
    #[serde(default)]
    pub total_count: usize,
    #[serde(default = "missing_number", deserialize_with = "lenient_number")]
    pub mean_effect_size: f64,
    #[serde(default = "missing_interval", deserialize_with = "lenient_interval")]
    pub effect_size_ci: (f64, f64),
    #[serde(default = "missing_number", deserialize_with = "lenient_number")]
    pub ci_coverage: f64,
    #[serde(default = "missing_number", deserialize_with = "lenient_number")]
    pub mean_ci_width: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum ReplicationInput {
    List(Vec<Replication>),
    Run(SimulationRun),
}

impl ReplicationInput {
    /// Replications in input order, numbered from 1 where ids are absent.
    pub(crate) fn into_rows(self) -> Vec<Replication> {
        let mut rows = match self {
            ReplicationInput::List(rows) => rows,
            ReplicationInput::Run(run) => run.individual_results,
        };
        number_replications(&mut rows);
        rows
    }
}

/// Load replications from JSON.
///
/// Accepts either a bare array of replications or an aggregated-results
/// object carrying `individual_results`. Replications without an id are
/// numbered from 1 in input order.
pub fn load_replications(json: &str) -> Result<Vec<Replication>> {
    let input: ReplicationInput = serde_json::from_str(json)?;
    Ok(input.into_rows())
}

/// Load an aggregated-results object.
pub fn load_run(json: &str) -> Result<SimulationRun> {
    let mut run: SimulationRun = serde_json::from_str(json)?;
    if run.total_count == 0 {
        run.total_count = run.individual_results.len();
    }
    number_replications(&mut run.individual_results);
    Ok(run)
}

fn number_replications(rows: &mut [Replication]) {
    for (i, row) in rows.iter_mut().enumerate() {
        row.simulation_id.get_or_insert(i + 1);
    }
}

/// Parse a `true`/`false`/`1`/`0`/`yes`/`no` token.
pub(crate) fn parse_flag(token: &str) -> Result<bool> {
    match token.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(SimviewError::Parse(format!("not a boolean: {other}"))),
    }
}
