//! Rate and weight tables.
//!
//! Defaults reproduce the calibrated production tables. A JSON file can
//! override either table (`--tables` / `FRA_TABLES`); omitted sections keep
//! their defaults.

use std::fs::File;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::domain::Severity;
use crate::error::AppError;

/// Normalized bucket for damage types absent from the weight table.
pub const UNKNOWN_KIND: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub unit: String,
    pub rate: f64,
}

impl Rate {
    fn new(unit: &str, rate: f64) -> Self {
        Self {
            unit: unit.to_string(),
            rate,
        }
    }
}

/// Price per unit of repair, keyed by raw damage type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub rates: IndexMap<String, Rate>,
    /// Used for every type not listed in `rates`.
    pub fallback: Rate,
}

impl Default for RateTable {
    fn default() -> Self {
        let rates = [
            ("crack", Rate::new("meter", 20.0)),
            ("spalling", Rate::new("m2", 50.0)),
            ("water_damage", Rate::new("m2", 15.0)),
            ("discoloration", Rate::new("m2", 4.0)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Self {
            rates,
            fallback: Rate::new("m2", 10.0),
        }
    }
}

impl RateTable {
    pub fn lookup(&self, kind: &str) -> &Rate {
        self.rates.get(kind).unwrap_or(&self.fallback)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityMultipliers {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl Default for SeverityMultipliers {
    fn default() -> Self {
        Self {
            low: 0.8,
            medium: 1.0,
            high: 1.4,
        }
    }
}

impl SeverityMultipliers {
    pub fn factor(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Low => self.low,
            Severity::Medium => self.medium,
            Severity::High => self.high,
        }
    }
}

/// Risk weight per unit of damage, keyed by normalized type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    pub weights: IndexMap<String, f64>,
    /// Weight of the `unknown` bucket.
    pub unknown: f64,
    #[serde(default)]
    pub severity: SeverityMultipliers,
}

impl Default for WeightTable {
    fn default() -> Self {
        let weights = [
            ("crack", 3.0),
            ("spalling", 4.0),
            ("water_damage", 2.5),
            ("moisture", 2.5),
            ("discoloration", 1.5),
            ("corrosion", 4.5),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Self {
            weights,
            unknown: 2.0,
            severity: SeverityMultipliers::default(),
        }
    }
}

impl WeightTable {
    /// Fold unlisted (or missing) types into the `unknown` bucket.
    pub fn normalize<'a>(&self, kind: Option<&'a str>) -> &'a str {
        match kind {
            Some(k) if self.weights.contains_key(k) => k,
            _ => UNKNOWN_KIND,
        }
    }

    pub fn weight(&self, normalized: &str) -> f64 {
        self.weights.get(normalized).copied().unwrap_or(self.unknown)
    }
}

/// Both tables, as loaded from configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringTables {
    #[serde(default)]
    pub rates: RateTable,
    #[serde(default)]
    pub weights: WeightTable,
}

impl ScoringTables {
    /// Load a tables file and validate every rate, weight and multiplier.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path)
            .map_err(|e| AppError::usage(format!("Failed to open tables file '{}': {e}", path.display())))?;
        let tables: ScoringTables = serde_json::from_reader(file)
            .map_err(|e| AppError::usage(format!("Invalid tables file '{}': {e}", path.display())))?;
        tables.validate()?;
        Ok(tables)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let rates = self
            .rates
            .rates
            .iter()
            .map(|(k, r)| (k.as_str(), r.rate))
            .chain(std::iter::once(("fallback rate", self.rates.fallback.rate)));
        let weights = self
            .weights
            .weights
            .iter()
            .map(|(k, w)| (k.as_str(), *w))
            .chain([
                ("unknown weight", self.weights.unknown),
                ("low multiplier", self.weights.severity.low),
                ("medium multiplier", self.weights.severity.medium),
                ("high multiplier", self.weights.severity.high),
            ]);

        for (name, value) in rates.chain(weights) {
            if !(value.is_finite() && value >= 0.0) {
                return Err(AppError::usage(format!(
                    "Table entry `{name}` must be a non-negative number (got {value})."
                )));
            }
        }
        Ok(())
    }
}
