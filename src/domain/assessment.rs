//! Core outputs: the itemized cost estimate and the risk summary.
//!
//! Field names are consumed verbatim by the report renderer and by anything
//! reading the per-job JSON artifacts, so renames here are breaking changes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One cost line per distinct raw damage type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub unit: String,
    pub count: usize,
    pub total_quantity: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub currency: String,
    pub total_cost: f64,
    pub items: Vec<CostItem>,
}

/// Coarse building health classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HealthGrade {
    A,
    B,
    C,
    D,
}

impl HealthGrade {
    /// Step function over the 0–100 risk score.
    pub fn from_score(score: f64) -> Self {
        if score < 20.0 {
            HealthGrade::A
        } else if score < 40.0 {
            HealthGrade::B
        } else if score < 70.0 {
            HealthGrade::C
        } else {
            HealthGrade::D
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HealthGrade::A => "A",
            HealthGrade::B => "B",
            HealthGrade::C => "C",
            HealthGrade::D => "D",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            HealthGrade::A => "good condition, cosmetic issues at most",
            HealthGrade::B => "minor defects, schedule maintenance",
            HealthGrade::C => "significant defects, repairs recommended",
            HealthGrade::D => "poor condition, urgent repairs required",
        }
    }
}

impl std::fmt::Display for HealthGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeRisk {
    pub count: usize,
    pub risk_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub total_damage_count: usize,
    pub overall_severity_index: f64,
    pub overall_risk_score: f64,
    pub building_health_grade: HealthGrade,
    /// Keyed by normalized type, in first-seen order.
    pub by_type: IndexMap<String, TypeRisk>,
}

/// A core output persisted for one job: the body plus the owning job id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobArtifact<T> {
    pub job_id: String,
    #[serde(flatten)]
    pub body: T,
}
