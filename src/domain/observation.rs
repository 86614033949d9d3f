//! Damage observations as handed over by an analyzer.
//!
//! Analyzer output is loosely typed (LLM JSON, hand-written fixtures), so
//! deserialization here never rejects a record because of an odd `type` or
//! `severity`. Measurements are kept as raw JSON values: the cost estimator and
//! the risk scorer coerce them with different strictness.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Severity label of a single finding.
///
/// Parsing is case-insensitive but not whitespace-tolerant: anything other than
/// an exact `low`/`medium`/`high` label (or a missing one) maps to `Medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
}

impl Severity {
    pub fn parse_lenient(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "low" => Severity::Low,
            "high" => Severity::High,
            _ => Severity::Medium,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// One detected facade defect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageObservation {
    /// Raw category label (`crack`, `spalling`, ...). `None` when the analyzer
    /// omitted it.
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient_label",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,

    #[serde(default, deserialize_with = "lenient_severity")]
    pub severity: Severity,

    /// Linear extent in meters (cracks). Raw JSON; see `engine::measure`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approx_length_m: Option<Value>,

    /// Affected surface in square meters. Raw JSON; see `engine::measure`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approx_area_m2: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Value>,

    #[serde(default, deserialize_with = "lenient_label", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient_label", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Any other analyzer fields, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DamageObservation {
    pub fn new(kind: &str, severity: Severity) -> Self {
        Self {
            kind: Some(kind.to_string()),
            severity,
            ..Self::default()
        }
    }

    pub fn with_length(mut self, meters: f64) -> Self {
        self.approx_length_m = Some(Value::from(meters));
        self
    }

    pub fn with_area(mut self, square_meters: f64) -> Self {
        self.approx_area_m2 = Some(Value::from(square_meters));
        self
    }
}

/// The two shapes an analyzer (or a fixture file) may hand back: a bare list of
/// observations or an object wrapping them under `damages`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DamageInput {
    Bare(Vec<DamageObservation>),
    Wrapped(DamageEnvelope),
}

#[derive(Debug, Clone, Deserialize)]
pub struct DamageEnvelope {
    #[serde(default)]
    pub damages: Vec<DamageObservation>,
}

impl DamageInput {
    pub fn into_observations(self) -> Vec<DamageObservation> {
        match self {
            DamageInput::Bare(list) => list,
            DamageInput::Wrapped(envelope) => envelope.damages,
        }
    }
}

fn lenient_label<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

fn lenient_severity<'de, D>(deserializer: D) -> Result<Severity, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Severity::parse_lenient(&s),
        _ => Severity::Medium,
    })
}
