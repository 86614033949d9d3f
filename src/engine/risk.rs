//! Risk score, severity index and health grade.

use indexmap::IndexMap;

use crate::domain::{DamageObservation, HealthGrade, RiskSummary, TypeRisk};
use crate::engine::measure::{positive_or_unit, round_to};
use crate::engine::tables::WeightTable;

/// Risk points that map to one step of the 0–10 severity index.
pub const SEVERITY_SCALE: f64 = 5.0;
pub const MAX_SEVERITY_INDEX: f64 = 10.0;
pub const MAX_RISK_SCORE: f64 = 100.0;

#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    weights: WeightTable,
}

impl RiskScorer {
    pub fn new(weights: WeightTable) -> Self {
        Self { weights }
    }

    /// Normalized type and risk points of a single observation.
    ///
    /// Magnitude is the length when present, otherwise the area, otherwise one
    /// unit. Non-numeric or non-positive magnitudes count as one unit.
    pub fn risk_points<'a>(&self, obs: &'a DamageObservation) -> (&'a str, f64) {
        let kind = self.weights.normalize(obs.kind.as_deref());
        let factor = self.weights.severity.factor(obs.severity);
        let magnitude = positive_or_unit(obs.approx_length_m.as_ref().or(obs.approx_area_m2.as_ref()));
        (kind, self.weights.weight(kind) * factor * magnitude)
    }

    pub fn score(&self, observations: &[DamageObservation]) -> RiskSummary {
        let mut by_type: IndexMap<&str, (usize, f64)> = IndexMap::new();
        let mut total_points = 0.0;

        for obs in observations {
            let (kind, points) = self.risk_points(obs);
            let entry = by_type.entry(kind).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += points;
            total_points += points;
        }

        let overall_severity_index = round_to((total_points / SEVERITY_SCALE).min(MAX_SEVERITY_INDEX), 2);
        let overall_risk_score = round_to((overall_severity_index * 10.0).min(MAX_RISK_SCORE), 1);

        RiskSummary {
            total_damage_count: observations.len(),
            overall_severity_index,
            overall_risk_score,
            building_health_grade: HealthGrade::from_score(overall_risk_score),
            by_type: by_type
                .into_iter()
                .map(|(kind, (count, points))| {
                    (
                        kind.to_string(),
                        TypeRisk {
                            count,
                            risk_points: round_to(points, 2),
                        },
                    )
                })
                .collect(),
        }
    }
}
