//! Built-in algorithms for low-level abstractions.

mod trend;
mod value_threshold;

use std::collections::BTreeMap;
use std::sync::Arc;

use tempora_core::errors::AlgorithmError;
use tempora_core::proposition::{Proposition, Value};
use tempora_core::sources::InMemoryAlgorithmSource;

pub use trend::{Trend, TREND_ID};
pub use value_threshold::{ValueThreshold, VALUE_THRESHOLD_ID};

/// An algorithm source preloaded with every built-in.
pub fn builtin_algorithm_source() -> InMemoryAlgorithmSource {
    InMemoryAlgorithmSource::new()
        .with_algorithm(Arc::new(ValueThreshold::new()))
        .with_algorithm(Arc::new(Trend::new()))
}

/// Numeric values of a window, in order.
fn numbers(window: &[&Proposition]) -> Result<Vec<f64>, AlgorithmError> {
    window
        .iter()
        .map(|p| {
            p.value()
                .and_then(Value::as_number)
                .ok_or_else(|| AlgorithmError::NonNumeric {
                    proposition_id: p.id.clone(),
                })
        })
        .collect()
}

fn number_argument(
    arguments: &BTreeMap<String, Value>,
    name: &str,
) -> Result<Option<f64>, AlgorithmError> {
    match arguments.get(name) {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(Some(*n)),
        Some(other) => Err(AlgorithmError::InvalidArgument {
            parameter: name.to_string(),
            message: format!("expected a number, got {other}"),
        }),
    }
}

fn nominal_argument<'a>(
    arguments: &'a BTreeMap<String, Value>,
    name: &str,
) -> Result<Option<&'a str>, AlgorithmError> {
    match arguments.get(name) {
        None => Ok(None),
        Some(Value::Nominal(s)) => Ok(Some(s)),
        Some(other) => Err(AlgorithmError::InvalidArgument {
            parameter: name.to_string(),
            message: format!("expected a nominal value, got {other}"),
        }),
    }
}
