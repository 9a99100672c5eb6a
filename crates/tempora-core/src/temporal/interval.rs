//! Intervals with bounded uncertainty on both ends.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::relation::Side;
use super::unit::Granularity;
use crate::errors::IntervalError;

/// A 4-tuple `(min_start, max_start, min_finish, max_finish)` of millisecond positions.
///
/// Invariant: `min_start ≤ max_start ≤ max_finish` and `min_start ≤ min_finish ≤ max_finish`.
/// A point interval has all four bounds equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "IntervalRepr", into = "IntervalRepr")]
pub struct Interval {
    min_start: i64,
    max_start: i64,
    min_finish: i64,
    max_finish: i64,
    start_granularity: Option<Granularity>,
    finish_granularity: Option<Granularity>,
}

#[derive(Serialize, Deserialize)]
struct IntervalRepr {
    min_start: i64,
    max_start: i64,
    min_finish: i64,
    max_finish: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_granularity: Option<Granularity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    finish_granularity: Option<Granularity>,
}

impl TryFrom<IntervalRepr> for Interval {
    type Error = IntervalError;

    fn try_from(repr: IntervalRepr) -> Result<Self, Self::Error> {
        let interval = Interval::new(repr.min_start, repr.max_start, repr.min_finish, repr.max_finish)?;
        Ok(interval.with_granularity(repr.start_granularity, repr.finish_granularity))
    }
}

impl From<Interval> for IntervalRepr {
    fn from(i: Interval) -> Self {
        Self {
            min_start: i.min_start,
            max_start: i.max_start,
            min_finish: i.min_finish,
            max_finish: i.max_finish,
            start_granularity: i.start_granularity,
            finish_granularity: i.finish_granularity,
        }
    }
}

impl Interval {
    /// Build an interval from its four bounds, validating the invariant.
    pub fn new(
        min_start: i64,
        max_start: i64,
        min_finish: i64,
        max_finish: i64,
    ) -> Result<Self, IntervalError> {
        let valid = min_start <= max_start
            && max_start <= max_finish
            && min_start <= min_finish
            && min_finish <= max_finish;
        if !valid {
            return Err(IntervalError::InvalidBounds {
                min_start,
                max_start,
                min_finish,
                max_finish,
            });
        }
        Ok(Self {
            min_start,
            max_start,
            min_finish,
            max_finish,
            start_granularity: None,
            finish_granularity: None,
        })
    }

    /// An interval with exactly known start and finish.
    pub fn definite(start: i64, finish: i64) -> Result<Self, IntervalError> {
        Self::new(start, start, finish, finish)
    }

    /// A point interval.
    pub fn point(position: i64) -> Self {
        Self {
            min_start: position,
            max_start: position,
            min_finish: position,
            max_finish: position,
            start_granularity: None,
            finish_granularity: None,
        }
    }

    /// Expand positions recorded at a coarse granularity into the whole granule.
    pub fn from_granules(
        start: i64,
        start_granularity: Granularity,
        finish: i64,
        finish_granularity: Granularity,
    ) -> Result<Self, IntervalError> {
        let interval = Self::new(
            start_granularity.granule_start(start),
            start_granularity.granule_end(start),
            finish_granularity.granule_start(finish),
            finish_granularity.granule_end(finish),
        )?;
        Ok(interval.with_granularity(Some(start_granularity), Some(finish_granularity)))
    }

    pub fn with_granularity(
        mut self,
        start: Option<Granularity>,
        finish: Option<Granularity>,
    ) -> Self {
        self.start_granularity = start;
        self.finish_granularity = finish;
        self
    }

    pub fn min_start(&self) -> i64 {
        self.min_start
    }

    pub fn max_start(&self) -> i64 {
        self.max_start
    }

    pub fn min_finish(&self) -> i64 {
        self.min_finish
    }

    pub fn max_finish(&self) -> i64 {
        self.max_finish
    }

    pub fn start_granularity(&self) -> Option<Granularity> {
        self.start_granularity
    }

    pub fn finish_granularity(&self) -> Option<Granularity> {
        self.finish_granularity
    }

    /// `(min, max)` of the requested side.
    pub fn bounds(&self, side: Side) -> (i64, i64) {
        match side {
            Side::Start => (self.min_start, self.max_start),
            Side::Finish => (self.min_finish, self.max_finish),
        }
    }

    pub fn is_point(&self) -> bool {
        self.min_start == self.max_start
            && self.max_start == self.min_finish
            && self.min_finish == self.max_finish
    }

    /// Shortest possible duration.
    pub fn min_duration(&self) -> i64 {
        (self.min_finish - self.max_start).max(0)
    }

    /// Longest possible duration.
    pub fn max_duration(&self) -> i64 {
        self.max_finish - self.min_start
    }

    /// The smallest interval covering both.
    pub fn span(&self, other: &Interval) -> Interval {
        Interval {
            min_start: self.min_start.min(other.min_start),
            max_start: self.max_start.min(other.max_start),
            min_finish: self.min_finish.max(other.min_finish),
            max_finish: self.max_finish.max(other.max_finish),
            start_granularity: if self.min_start <= other.min_start {
                self.start_granularity
            } else {
                other.start_granularity
            },
            finish_granularity: if self.max_finish >= other.max_finish {
                self.finish_granularity
            } else {
                other.finish_granularity
            },
        }
    }

    /// Whether `next` starts no later than this interval can finish (touching or overlapping).
    pub fn is_contiguous_with(&self, next: &Interval) -> bool {
        next.min_start <= self.max_finish && self.min_start <= next.max_finish
    }

    /// Non-decreasing order: starts and finishes of `self` are no later than `next`'s.
    pub fn precedes(&self, next: &Interval) -> bool {
        self.min_start <= next.min_start && self.max_finish <= next.max_finish
    }

    /// Outer extent `[min_start, max_finish]`.
    pub fn outer(&self) -> (i64, i64) {
        (self.min_start, self.max_finish)
    }

    /// Temporal order: by start bounds, then finish bounds.
    pub fn temporal_cmp(&self, other: &Interval) -> Ordering {
        (self.min_start, self.max_start, self.min_finish, self.max_finish).cmp(&(
            other.min_start,
            other.max_start,
            other.min_finish,
            other.max_finish,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::TimeUnit;

    #[test]
    fn rejects_finish_before_start() {
        assert!(Interval::definite(10, 5).is_err());
        assert!(Interval::new(0, 10, 5, 20).is_ok());
        assert!(Interval::new(0, 30, 5, 20).is_err());
    }

    #[test]
    fn day_granules_expand_to_whole_day() {
        let day = TimeUnit::Day.millis();
        let i = Interval::from_granules(day + 5, TimeUnit::Day, 2 * day + 7, TimeUnit::Day).unwrap();
        assert_eq!(i.min_start(), day);
        assert_eq!(i.max_start(), 2 * day - 1);
        assert_eq!(i.min_finish(), 2 * day);
        assert_eq!(i.max_finish(), 3 * day - 1);
        assert_eq!(i.start_granularity(), Some(TimeUnit::Day));
    }

    #[test]
    fn span_covers_both() {
        let a = Interval::definite(0, 10).unwrap();
        let b = Interval::definite(5, 20).unwrap();
        let s = a.span(&b);
        assert_eq!(s.outer(), (0, 20));
        assert!(a.is_contiguous_with(&b));
        assert!(a.precedes(&b));
    }

    #[test]
    fn serde_rejects_invalid_bounds() {
        let json = r#"{"min_start":10,"max_start":10,"min_finish":1,"max_finish":1}"#;
        assert!(serde_json::from_str::<Interval>(json).is_err());
    }
}
