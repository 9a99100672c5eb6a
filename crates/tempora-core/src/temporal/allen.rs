//! Allen's thirteen interval relations expressed as bound-distance relations.
//!
//! Positions are discrete milliseconds, so "strictly before" is a distance of at least 1.

use serde::{Deserialize, Serialize};

use super::relation::Relation;
use super::unit::Distance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllenRelation {
    Before,
    After,
    Meets,
    MetBy,
    Overlaps,
    OverlappedBy,
    Starts,
    StartedBy,
    During,
    Contains,
    Finishes,
    FinishedBy,
    Equals,
}

fn ms(value: i64) -> Option<Distance> {
    Some(Distance::millis(value))
}

impl AllenRelation {
    pub const ALL: [AllenRelation; 13] = [
        Self::Before,
        Self::After,
        Self::Meets,
        Self::MetBy,
        Self::Overlaps,
        Self::OverlappedBy,
        Self::Starts,
        Self::StartedBy,
        Self::During,
        Self::Contains,
        Self::Finishes,
        Self::FinishedBy,
        Self::Equals,
    ];

    /// The equivalent bound-distance relation with `self` read as `lhs <rel> rhs`.
    pub fn to_relation(self) -> Relation {
        match self {
            Self::Before => Relation::new().gap(ms(1), None),
            Self::Meets => Relation::new().gap(ms(0), ms(0)),
            Self::Overlaps => Relation::new()
                .between_starts(ms(1), None)
                .gap(None, ms(-1))
                .between_finishes(ms(1), None),
            Self::Starts => Relation::new()
                .between_starts(ms(0), ms(0))
                .between_finishes(ms(1), None),
            Self::During => Relation::new()
                .between_starts(None, ms(-1))
                .between_finishes(ms(1), None),
            Self::Finishes => Relation::new()
                .between_finishes(ms(0), ms(0))
                .between_starts(None, ms(-1)),
            Self::Equals => Relation::new()
                .between_starts(ms(0), ms(0))
                .between_finishes(ms(0), ms(0)),
            Self::After => Self::Before.to_relation().inverse(),
            Self::MetBy => Self::Meets.to_relation().inverse(),
            Self::OverlappedBy => Self::Overlaps.to_relation().inverse(),
            Self::StartedBy => Self::Starts.to_relation().inverse(),
            Self::Contains => Self::During.to_relation().inverse(),
            Self::FinishedBy => Self::Finishes.to_relation().inverse(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Meets => "meets",
            Self::MetBy => "met_by",
            Self::Overlaps => "overlaps",
            Self::OverlappedBy => "overlapped_by",
            Self::Starts => "starts",
            Self::StartedBy => "started_by",
            Self::During => "during",
            Self::Contains => "contains",
            Self::Finishes => "finishes",
            Self::FinishedBy => "finished_by",
            Self::Equals => "equals",
        }
    }
}

impl From<AllenRelation> for Relation {
    fn from(r: AllenRelation) -> Self {
        r.to_relation()
    }
}

impl std::fmt::Display for AllenRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
