use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::unique_id::UniqueId;
use super::value::Value;
use crate::temporal::Interval;

/// Provenance timestamps. A set `deleted` marks a delete-stamped copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloaded: Option<DateTime<Utc>>,
}

/// The closed set of proposition kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropositionKind {
    /// Atemporal fact.
    Constant,
    Event {
        interval: Interval,
    },
    /// Raw measured value.
    PrimitiveParameter {
        interval: Interval,
        value: Value,
    },
    /// Value derived by an abstraction.
    AbstractParameter {
        interval: Interval,
        value: Value,
    },
    Context {
        interval: Interval,
    },
}

/// A fact about a key. Immutable once asserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposition {
    /// Proposition type name.
    pub id: String,
    pub unique_id: UniqueId,
    #[serde(flatten)]
    pub kind: PropositionKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Value>,
    /// Named references to other propositions.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub references: BTreeMap<String, Vec<UniqueId>>,
    #[serde(default)]
    pub provenance: Provenance,
}

impl Proposition {
    pub fn new(id: impl Into<String>, unique_id: UniqueId, kind: PropositionKind) -> Self {
        Self {
            id: id.into(),
            unique_id,
            kind,
            properties: BTreeMap::new(),
            references: BTreeMap::new(),
            provenance: Provenance::default(),
        }
    }

    pub fn constant(id: impl Into<String>, unique_id: UniqueId) -> Self {
        Self::new(id, unique_id, PropositionKind::Constant)
    }

    pub fn event(id: impl Into<String>, unique_id: UniqueId, interval: Interval) -> Self {
        Self::new(id, unique_id, PropositionKind::Event { interval })
    }

    /// A primitive parameter measured at a single position.
    pub fn primitive(
        id: impl Into<String>,
        unique_id: UniqueId,
        position: i64,
        value: impl Into<Value>,
    ) -> Self {
        Self::new(
            id,
            unique_id,
            PropositionKind::PrimitiveParameter {
                interval: Interval::point(position),
                value: value.into(),
            },
        )
    }

    pub fn abstract_parameter(
        id: impl Into<String>,
        unique_id: UniqueId,
        interval: Interval,
        value: Value,
    ) -> Self {
        Self::new(
            id,
            unique_id,
            PropositionKind::AbstractParameter { interval, value },
        )
    }

    pub fn context(id: impl Into<String>, unique_id: UniqueId, interval: Interval) -> Self {
        Self::new(id, unique_id, PropositionKind::Context { interval })
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_reference(mut self, name: impl Into<String>, target: UniqueId) -> Self {
        self.references.entry(name.into()).or_default().push(target);
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    /// The interval of temporal propositions; `None` for constants.
    pub fn interval(&self) -> Option<&Interval> {
        match &self.kind {
            PropositionKind::Constant => None,
            PropositionKind::Event { interval }
            | PropositionKind::PrimitiveParameter { interval, .. }
            | PropositionKind::AbstractParameter { interval, .. }
            | PropositionKind::Context { interval } => Some(interval),
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match &self.kind {
            PropositionKind::PrimitiveParameter { value, .. }
            | PropositionKind::AbstractParameter { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn is_temporal(&self) -> bool {
        self.interval().is_some()
    }

    pub fn is_deleted(&self) -> bool {
        self.provenance.deleted.is_some()
    }

    /// A copy of this proposition stamped as deleted at `at`; the original is untouched.
    pub fn delete_stamped(&self, at: DateTime<Utc>) -> Self {
        let mut copy = self.clone();
        copy.provenance.deleted = Some(at);
        copy
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            PropositionKind::Constant => "constant",
            PropositionKind::Event { .. } => "event",
            PropositionKind::PrimitiveParameter { .. } => "primitive_parameter",
            PropositionKind::AbstractParameter { .. } => "abstract_parameter",
            PropositionKind::Context { .. } => "context",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_stamp_leaves_original_untouched() {
        let p = Proposition::primitive("hr", UniqueId::new("ehr", "1"), 10, 72.0);
        let deleted = p.delete_stamped(Utc::now());
        assert!(!p.is_deleted());
        assert!(deleted.is_deleted());
        assert_eq!(p.unique_id, deleted.unique_id);
    }

    #[test]
    fn serializes_kind_inline() {
        let p = Proposition::primitive("hr", UniqueId::new("ehr", "1"), 10, 72.0);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["kind"], "primitive_parameter");
        let back: Proposition = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }
}
