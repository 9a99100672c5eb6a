use std::collections::BTreeMap;

use tempora_core::errors::AlgorithmError;
use tempora_core::proposition::{Proposition, Value};
use tempora_core::traits::{Algorithm, AlgorithmParameter};

use super::{nominal_argument, numbers};

pub const TREND_ID: &str = "trend";

/// Accepts a window whose values strictly increase or strictly decrease.
///
/// Argument `direction`: `increasing` or `decreasing`.
#[derive(Debug)]
pub struct Trend {
    parameters: Vec<AlgorithmParameter>,
}

impl Trend {
    pub fn new() -> Self {
        Self {
            parameters: vec![AlgorithmParameter::required("direction")],
        }
    }
}

impl Default for Trend {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for Trend {
    fn id(&self) -> &str {
        TREND_ID
    }

    fn parameters(&self) -> &[AlgorithmParameter] {
        &self.parameters
    }

    fn min_window(&self) -> usize {
        2
    }

    fn max_window(&self) -> Option<usize> {
        None
    }

    fn compute(
        &self,
        window: &[&Proposition],
        arguments: &BTreeMap<String, Value>,
    ) -> Result<Option<Value>, AlgorithmError> {
        let increasing = match nominal_argument(arguments, "direction")? {
            Some("increasing") => true,
            Some("decreasing") => false,
            Some(other) => {
                return Err(AlgorithmError::InvalidArgument {
                    parameter: "direction".to_string(),
                    message: format!("unknown direction {other}"),
                })
            }
            None => {
                return Err(AlgorithmError::InvalidArgument {
                    parameter: "direction".to_string(),
                    message: "missing".to_string(),
                })
            }
        };
        let values = numbers(window)?;
        if values.len() < 2 {
            return Ok(None);
        }
        let monotone = values.windows(2).all(|w| {
            if increasing {
                w[1] > w[0]
            } else {
                w[1] < w[0]
            }
        });
        Ok(monotone.then_some(Value::Boolean(true)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempora_core::proposition::UniqueId;

    fn hr(i: i64, value: f64) -> Proposition {
        Proposition::primitive("hr", UniqueId::new("t", i.to_string()), i, value)
    }

    #[test]
    fn detects_strict_increase() {
        let alg = Trend::new();
        let args = BTreeMap::from([("direction".to_string(), Value::nominal("increasing"))]);
        let (a, b, c) = (hr(0, 60.0), hr(1, 70.0), hr(2, 70.0));
        assert!(alg.compute(&[&a, &b], &args).unwrap().is_some());
        assert!(alg.compute(&[&a, &b, &c], &args).unwrap().is_none());
    }
}
