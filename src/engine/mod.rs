//! Cost estimation and risk scoring.
//!
//! Both components are pure functions of an observation list. They do not
//! depend on each other, so `assess` runs them side by side.

pub mod cost;
pub mod measure;
pub mod risk;
pub mod tables;

pub use cost::{CostEstimator, DEFAULT_CURRENCY};
pub use measure::MeasurementError;
pub use risk::{RiskScorer, SEVERITY_SCALE};
pub use tables::{RateTable, ScoringTables, WeightTable};

use crate::domain::{CostEstimate, DamageObservation, RiskSummary};

/// Both core outputs for one observation list.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub cost: CostEstimate,
    pub risk: RiskSummary,
}

/// Estimator and scorer configured from the same tables.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    pub estimator: CostEstimator,
    pub scorer: RiskScorer,
}

impl Engine {
    pub fn new(tables: ScoringTables, currency: impl Into<String>) -> Self {
        Self {
            estimator: CostEstimator::new(tables.rates, currency),
            scorer: RiskScorer::new(tables.weights),
        }
    }

    /// Run the estimator and the scorer concurrently and join both results.
    pub fn assess(&self, observations: &[DamageObservation]) -> Result<Assessment, MeasurementError> {
        let (cost, risk) = rayon::join(
            || self.estimator.estimate(observations),
            || self.scorer.score(observations),
        );
        Ok(Assessment { cost: cost?, risk })
    }
}
