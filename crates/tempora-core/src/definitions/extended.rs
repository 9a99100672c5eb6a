//! Temporal-extended proposition definitions: the descriptors patterns match against.

use serde::{Deserialize, Serialize};

use crate::proposition::{Proposition, Value};
use crate::temporal::{Distance, Interval};

/// Describes which temporal propositions may fill one slot of a pattern.
///
/// A proposition matches when its id is `proposition_id` (or an inverse-is-a child, resolved
/// by the compiler), its value equals `value` when set, and its possible duration range
/// intersects `[min_duration, max_duration]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalExtendedPropositionDefinition {
    pub proposition_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_duration: Option<Distance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<Distance>,
}

impl TemporalExtendedPropositionDefinition {
    pub fn new(proposition_id: impl Into<String>) -> Self {
        Self {
            proposition_id: proposition_id.into(),
            value: None,
            min_duration: None,
            max_duration: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_duration(mut self, min: Option<Distance>, max: Option<Distance>) -> Self {
        self.min_duration = min;
        self.max_duration = max;
        self
    }

    /// Whether the duration range of `interval` intersects the descriptor's duration bounds.
    pub fn accepts_duration(&self, interval: &Interval) -> bool {
        if let Some(min) = self.min_duration {
            if interval.max_duration() < min.to_millis() {
                return false;
            }
        }
        if let Some(max) = self.max_duration {
            if interval.min_duration() > max.to_millis() {
                return false;
            }
        }
        true
    }

    /// Value and duration checks. The id check is the caller's, since it depends on
    /// inverse-is-a resolution.
    pub fn accepts(&self, proposition: &Proposition) -> bool {
        let Some(interval) = proposition.interval() else {
            return false;
        };
        if let Some(expected) = &self.value {
            match proposition.value() {
                Some(actual) if actual == expected => {}
                _ => return false,
            }
        }
        self.accepts_duration(interval)
    }
}
