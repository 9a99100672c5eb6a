use std::collections::BTreeMap;

use tempora_core::errors::AlgorithmError;
use tempora_core::proposition::{Proposition, Value};
use tempora_core::traits::{Algorithm, AlgorithmParameter};

use super::{nominal_argument, number_argument, numbers};

pub const VALUE_THRESHOLD_ID: &str = "valueThreshold";

/// Accepts a window when every value lies within the configured thresholds.
///
/// Arguments: `minThreshold`, `maxThreshold` (numbers, at least one), and optional
/// `minComparator` (`ge` default, or `gt`) / `maxComparator` (`le` default, or `lt`).
#[derive(Debug)]
pub struct ValueThreshold {
    parameters: Vec<AlgorithmParameter>,
}

impl ValueThreshold {
    pub fn new() -> Self {
        Self {
            parameters: vec![
                AlgorithmParameter::optional("minThreshold"),
                AlgorithmParameter::optional("maxThreshold"),
                AlgorithmParameter::optional("minComparator"),
                AlgorithmParameter::optional("maxComparator"),
            ],
        }
    }
}

impl Default for ValueThreshold {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for ValueThreshold {
    fn id(&self) -> &str {
        VALUE_THRESHOLD_ID
    }

    fn parameters(&self) -> &[AlgorithmParameter] {
        &self.parameters
    }

    fn compute(
        &self,
        window: &[&Proposition],
        arguments: &BTreeMap<String, Value>,
    ) -> Result<Option<Value>, AlgorithmError> {
        let min = number_argument(arguments, "minThreshold")?;
        let max = number_argument(arguments, "maxThreshold")?;
        if min.is_none() && max.is_none() {
            return Err(AlgorithmError::InvalidArgument {
                parameter: "minThreshold".to_string(),
                message: "at least one of minThreshold or maxThreshold is required".to_string(),
            });
        }
        let min_strict = match nominal_argument(arguments, "minComparator")? {
            None | Some("ge") => false,
            Some("gt") => true,
            Some(other) => {
                return Err(AlgorithmError::InvalidArgument {
                    parameter: "minComparator".to_string(),
                    message: format!("unknown comparator {other}"),
                })
            }
        };
        let max_strict = match nominal_argument(arguments, "maxComparator")? {
            None | Some("le") => false,
            Some("lt") => true,
            Some(other) => {
                return Err(AlgorithmError::InvalidArgument {
                    parameter: "maxComparator".to_string(),
                    message: format!("unknown comparator {other}"),
                })
            }
        };

        let values = numbers(window)?;
        let within = values.iter().all(|&v| {
            let above = match min {
                Some(m) if min_strict => v > m,
                Some(m) => v >= m,
                None => true,
            };
            let below = match max {
                Some(m) if max_strict => v < m,
                Some(m) => v <= m,
                None => true,
            };
            above && below
        });
        Ok((within && !values.is_empty()).then_some(Value::Boolean(true)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempora_core::proposition::UniqueId;

    fn bp(value: f64) -> Proposition {
        Proposition::primitive("bp", UniqueId::new("t", value.to_string()), 0, value)
    }

    fn args(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn inclusive_minimum_by_default() {
        let alg = ValueThreshold::new();
        let a = args(&[("minThreshold", Value::Number(140.0))]);
        assert!(alg.compute(&[&bp(140.0)], &a).unwrap().is_some());
        assert!(alg.compute(&[&bp(139.0)], &a).unwrap().is_none());
    }

    #[test]
    fn strict_comparator() {
        let alg = ValueThreshold::new();
        let a = args(&[
            ("minThreshold", Value::Number(140.0)),
            ("minComparator", Value::nominal("gt")),
        ]);
        assert!(alg.compute(&[&bp(140.0)], &a).unwrap().is_none());
    }

    #[test]
    fn non_numeric_values_fail() {
        let alg = ValueThreshold::new();
        let p = Proposition::primitive("bp", UniqueId::new("t", "x"), 0, "high");
        let a = args(&[("maxThreshold", Value::Number(1.0))]);
        assert!(matches!(
            alg.compute(&[&p], &a),
            Err(AlgorithmError::NonNumeric { .. })
        ));
    }
}
