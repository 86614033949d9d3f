//! Itemized repair-cost estimate.

use indexmap::IndexMap;

use crate::domain::{CostEstimate, CostItem, DamageObservation};
use crate::engine::measure::{MeasurementError, is_truthy, require_quantity, round_to};
use crate::engine::tables::RateTable;

pub const DEFAULT_CURRENCY: &str = "USD";

/// Label given to observations without a `type`.
const DEFAULT_KIND: &str = "default";

#[derive(Debug, Clone)]
pub struct CostEstimator {
    rates: RateTable,
    currency: String,
}

impl Default for CostEstimator {
    fn default() -> Self {
        Self::new(RateTable::default(), DEFAULT_CURRENCY)
    }
}

#[derive(Debug, Default)]
struct Accumulator {
    count: usize,
    quantity: f64,
    cost: f64,
}

impl CostEstimator {
    pub fn new(rates: RateTable, currency: impl Into<String>) -> Self {
        Self {
            rates,
            currency: currency.into(),
        }
    }

    /// Price every observation and group by raw type.
    ///
    /// Items appear in first-seen order. `total_cost` is summed from unrounded
    /// per-observation costs and rounded once, so it can differ from the sum of
    /// the rounded item costs by less than a cent.
    pub fn estimate(&self, observations: &[DamageObservation]) -> Result<CostEstimate, MeasurementError> {
        let mut groups: IndexMap<&str, Accumulator> = IndexMap::new();
        let mut total_cost = 0.0;

        for (index, obs) in observations.iter().enumerate() {
            let kind = obs.kind.as_deref().unwrap_or(DEFAULT_KIND);
            let quantity = quantity(index, obs)?;
            let cost = quantity * self.rates.lookup(kind).rate;

            let acc = groups.entry(kind).or_default();
            acc.count += 1;
            acc.quantity += quantity;
            acc.cost += cost;
            total_cost += cost;
        }

        let items = groups
            .into_iter()
            .map(|(kind, acc)| CostItem {
                kind: kind.to_string(),
                unit: self.rates.lookup(kind).unit.clone(),
                count: acc.count,
                total_quantity: round_to(acc.quantity, 2),
                cost: round_to(acc.cost, 2),
            })
            .collect();

        Ok(CostEstimate {
            currency: self.currency.clone(),
            total_cost: round_to(total_cost, 2),
            items,
        })
    }
}

/// Length if truthy, else area if truthy, else one unit.
fn quantity(index: usize, obs: &DamageObservation) -> Result<f64, MeasurementError> {
    if let Some(length) = obs.approx_length_m.as_ref().filter(|v| is_truthy(v)) {
        return require_quantity(index, "approx_length_m", length);
    }
    if let Some(area) = obs.approx_area_m2.as_ref().filter(|v| is_truthy(v)) {
        return require_quantity(index, "approx_area_m2", area);
    }
    Ok(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Severity;
    use serde_json::json;

    fn scenario() -> Vec<DamageObservation> {
        vec![
            DamageObservation::new("crack", Severity::Medium).with_length(1.5),
            DamageObservation::new("spalling", Severity::High).with_area(0.5),
            DamageObservation::new("water_damage", Severity::Low).with_area(0.3),
        ]
    }

    fn item<'a>(estimate: &'a CostEstimate, kind: &str) -> &'a CostItem {
        estimate.items.iter().find(|i| i.kind == kind).unwrap()
    }

    #[test]
    fn three_observation_scenario() {
        let estimate = CostEstimator::default().estimate(&scenario()).unwrap();

        assert_eq!(estimate.currency, "USD");
        assert_eq!(estimate.total_cost, 59.5);
        let kinds: Vec<&str> = estimate.items.iter().map(|i| i.kind.as_str()).collect();
        assert_eq!(kinds, ["crack", "spalling", "water_damage"]);

        let crack = item(&estimate, "crack");
        assert_eq!((crack.unit.as_str(), crack.count, crack.total_quantity, crack.cost), ("meter", 1, 1.5, 30.0));
        let spalling = item(&estimate, "spalling");
        assert_eq!((spalling.total_quantity, spalling.cost), (0.5, 25.0));
        let water = item(&estimate, "water_damage");
        assert_eq!((water.total_quantity, water.cost), (0.3, 4.5));
    }

    #[test]
    fn empty_input_is_zero_estimate() {
        let estimate = CostEstimator::default().estimate(&[]).unwrap();
        assert_eq!(estimate.total_cost, 0.0);
        assert!(estimate.items.is_empty());
    }

    #[test]
    fn unknown_type_keeps_raw_label_and_fallback_rate() {
        let obs = vec![DamageObservation::new("foo", Severity::Medium).with_area(2.0)];
        let estimate = CostEstimator::default().estimate(&obs).unwrap();
        let foo = item(&estimate, "foo");
        assert_eq!((foo.unit.as_str(), foo.cost), ("m2", 20.0));
    }

    #[test]
    fn missing_type_is_priced_as_default() {
        let obs = vec![DamageObservation::default()];
        let estimate = CostEstimator::default().estimate(&obs).unwrap();
        assert_eq!(estimate.items[0].kind, "default");
        assert_eq!(estimate.total_cost, 10.0);
    }

    #[test]
    fn quantity_precedence_and_zero_fallback() {
        let both = DamageObservation::new("spalling", Severity::Low).with_length(2.0).with_area(5.0);
        let zero_length = DamageObservation::new("discoloration", Severity::Low).with_length(0.0).with_area(3.0);
        let nothing = DamageObservation::new("crack", Severity::Low).with_length(0.0);

        let estimate = CostEstimator::default().estimate(&[both, zero_length, nothing]).unwrap();
        assert_eq!(item(&estimate, "spalling").total_quantity, 2.0);
        assert_eq!(item(&estimate, "discoloration").total_quantity, 3.0);
        assert_eq!(item(&estimate, "crack").total_quantity, 1.0);
    }

    #[test]
    fn groups_repeated_types_once() {
        let obs = vec![
            DamageObservation::new("crack", Severity::Low).with_length(0.333),
            DamageObservation::new("foo", Severity::Low),
            DamageObservation::new("crack", Severity::High).with_length(0.333),
            DamageObservation::new("crack", Severity::Medium).with_length(0.333),
        ];
        let estimate = CostEstimator::default().estimate(&obs).unwrap();

        assert_eq!(estimate.items.len(), 2);
        let crack = item(&estimate, "crack");
        assert_eq!(crack.count, 3);
        assert_eq!(crack.total_quantity, 1.0);
        let item_sum: f64 = estimate.items.iter().map(|i| i.cost).sum();
        assert!((estimate.total_cost - item_sum).abs() < 0.01);
    }

    #[test]
    fn numeric_strings_are_accepted_but_garbage_is_an_error() {
        let mut ok = DamageObservation::new("crack", Severity::Low);
        ok.approx_length_m = Some(json!("2"));
        assert_eq!(CostEstimator::default().estimate(&[ok]).unwrap().total_cost, 40.0);

        let mut bad = DamageObservation::new("crack", Severity::Low);
        bad.approx_length_m = Some(json!("about a meter"));
        let err = CostEstimator::default()
            .estimate(&[DamageObservation::new("spalling", Severity::Low), bad])
            .unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.field, "approx_length_m");
    }

    #[test]
    fn custom_currency_and_rates() {
        let mut rates = RateTable::default();
        rates.fallback.rate = 1.0;
        let estimator = CostEstimator::new(rates, "EUR");
        let estimate = estimator
            .estimate(&[DamageObservation::new("moss", Severity::Low).with_area(4.0)])
            .unwrap();
        assert_eq!(estimate.currency, "EUR");
        assert_eq!(estimate.total_cost, 4.0);
    }

    #[test]
    fn repeated_runs_serialize_identically() {
        let estimator = CostEstimator::default();
        let a = serde_json::to_string(&estimator.estimate(&scenario()).unwrap()).unwrap();
        let b = serde_json::to_string(&estimator.estimate(&scenario()).unwrap()).unwrap();
        assert_eq!(a, b);
    }
}
