//! Measurement coercion and rounding helpers.
//!
//! Analyzer measurements arrive as raw JSON. Two policies sit on top of the
//! primitives here:
//! - the cost estimator only looks at *truthy* values and rejects anything it
//!   cannot read as a non-negative number
//! - the risk scorer accepts anything and substitutes `1.0` for unusable values

use serde_json::Value;

use crate::error::{AppError, ErrorKind};

/// Round to `decimals` places, ties to even on the exact binary value.
///
/// `0.125` is exactly representable and rounds to `0.12`; `2.675` is really
/// `2.67499...` and rounds to `2.67`.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    let floor = scaled.floor();
    if scaled - floor != 0.5 {
        return scaled.round() / factor;
    }
    // The product landed on a midpoint; its rounding error tells which side
    // `value` really lies on. Zero error means an exact tie.
    let residual = value.mul_add(factor, -scaled);
    let rounded = if residual > 0.0 {
        floor + 1.0
    } else if residual < 0.0 || floor % 2.0 == 0.0 {
        floor
    } else {
        floor + 1.0
    };
    rounded / factor
}

/// Presence test used for the quantity fallback chain.
///
/// `null`, `0`, `false`, `""` and empty containers count as absent.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Read a JSON number or numeric string. Non-finite results are rejected.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if v.is_finite() { Some(v) } else { None }
}

/// Magnitude used for risk points: positive numbers pass, everything else is `1.0`.
pub fn positive_or_unit(value: Option<&Value>) -> f64 {
    match value.and_then(coerce_number) {
        Some(v) if v > 0.0 => v,
        _ => 1.0,
    }
}

/// A measurement field was present but not usable as a quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementError {
    /// Zero-based position of the observation in the input list.
    pub index: usize,
    pub field: &'static str,
    pub raw: String,
}

impl MeasurementError {
    pub fn new(index: usize, field: &'static str, raw: &Value) -> Self {
        Self {
            index,
            field,
            raw: raw.to_string(),
        }
    }
}

impl std::fmt::Display for MeasurementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Damage #{} has a malformed `{}` value: {} (expected a non-negative number).",
            self.index, self.field, self.raw
        )
    }
}

impl std::error::Error for MeasurementError {}

impl From<MeasurementError> for AppError {
    fn from(err: MeasurementError) -> Self {
        AppError::new(ErrorKind::Computation, err.to_string())
    }
}

/// Strict read of a truthy measurement for pricing.
pub fn require_quantity(index: usize, field: &'static str, value: &Value) -> Result<f64, MeasurementError> {
    match coerce_number(value) {
        Some(v) if v >= 0.0 => Ok(v),
        _ => Err(MeasurementError::new(index, field, value)),
    }
}
