//! Gap functions: may two concatenable instances of the same abstraction merge?

use serde::{Deserialize, Serialize};

use super::interval::Interval;
use super::relation::Relation;
use super::unit::Distance;

/// Policy bounding the gap between the finish of one instance and the start of the next.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GapFunction {
    /// Only a maximum gap; `None` accepts any gap.
    Simple {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_gap: Option<Distance>,
    },
    /// Any relation between the earlier and the later instance.
    Bounded { relation: Relation },
}

impl Default for GapFunction {
    /// No minimum and no maximum gap.
    fn default() -> Self {
        Self::Simple { max_gap: None }
    }
}

impl GapFunction {
    pub fn max_gap(max_gap: Distance) -> Self {
        Self::Simple {
            max_gap: Some(max_gap),
        }
    }

    /// Gap constrained to `[min, max]`.
    pub fn between(min: Option<Distance>, max: Option<Distance>) -> Self {
        Self::Bounded {
            relation: Relation::new().gap(min, max),
        }
    }

    /// Whether `lhs` (the earlier instance) and `rhs` may be merged.
    pub fn execute(&self, lhs: &Interval, rhs: &Interval) -> bool {
        match self {
            Self::Simple { max_gap: None } => true,
            Self::Simple {
                max_gap: Some(max_gap),
            } => Relation::new()
                .gap(None, Some(*max_gap))
                .has_relation(lhs, rhs),
            Self::Bounded { relation } => relation.has_relation(lhs, rhs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_accepts_any_gap() {
        let a = Interval::definite(0, 1).unwrap();
        let b = Interval::definite(1_000_000, 1_000_001).unwrap();
        assert!(GapFunction::default().execute(&a, &b));
    }

    #[test]
    fn max_gap_is_inclusive() {
        let gf = GapFunction::max_gap(Distance::millis(10));
        let a = Interval::definite(0, 5).unwrap();
        assert!(gf.execute(&a, &Interval::definite(15, 20).unwrap()));
        assert!(!gf.execute(&a, &Interval::definite(16, 20).unwrap()));
    }

    #[test]
    fn minimum_gap_rejects_touching_instances() {
        let gf = GapFunction::between(Some(Distance::millis(2)), None);
        let a = Interval::definite(0, 5).unwrap();
        assert!(!gf.execute(&a, &Interval::definite(5, 8).unwrap()));
        assert!(gf.execute(&a, &Interval::definite(7, 8).unwrap()));
    }
}
