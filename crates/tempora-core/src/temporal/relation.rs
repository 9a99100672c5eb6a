//! Bound-distance relations between two intervals.
//!
//! A relation is evaluated as a simple temporal network over five time points
//! (an origin, then start/finish of each interval). The interval bounds, the
//! `finish ≥ start` constraint of each interval, and every configured
//! [`BoundConstraint`] become edges; the relation holds iff the network has no
//! negative cycle. With definite bounds this reduces to "every constraint holds".

use serde::{Deserialize, Serialize};

use super::interval::Interval;
use super::unit::Distance;

/// Which end of an interval a constraint compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Start,
    Finish,
}

/// Constrains `rhs.<rhs_side> - lhs.<lhs_side>` to `[min, max]`. `None` is unconstrained.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundConstraint {
    pub lhs_side: Side,
    pub rhs_side: Side,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Distance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Distance>,
}

/// A conjunction of bound constraints between a left and a right interval.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    #[serde(default)]
    constraints: Vec<BoundConstraint>,
}

const ORIGIN: usize = 0;
const LHS_START: usize = 1;
const LHS_FINISH: usize = 2;
const RHS_START: usize = 3;
const RHS_FINISH: usize = 4;
const NODES: usize = 5;
const UNBOUNDED: i128 = i128::MAX / 4;

impl Relation {
    /// A relation with no constraints; always satisfied.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an arbitrary side-qualified constraint.
    pub fn with(
        mut self,
        lhs_side: Side,
        rhs_side: Side,
        min: Option<Distance>,
        max: Option<Distance>,
    ) -> Self {
        self.constraints.push(BoundConstraint {
            lhs_side,
            rhs_side,
            min,
            max,
        });
        self
    }

    /// Distance from the left start to the right start.
    pub fn between_starts(self, min: Option<Distance>, max: Option<Distance>) -> Self {
        self.with(Side::Start, Side::Start, min, max)
    }

    /// Distance from the left start to the right finish.
    pub fn span(self, min: Option<Distance>, max: Option<Distance>) -> Self {
        self.with(Side::Start, Side::Finish, min, max)
    }

    /// Distance from the left finish to the right start.
    pub fn gap(self, min: Option<Distance>, max: Option<Distance>) -> Self {
        self.with(Side::Finish, Side::Start, min, max)
    }

    /// Distance from the left finish to the right finish.
    pub fn between_finishes(self, min: Option<Distance>, max: Option<Distance>) -> Self {
        self.with(Side::Finish, Side::Finish, min, max)
    }

    pub fn constraints(&self) -> &[BoundConstraint] {
        &self.constraints
    }

    pub fn is_unconstrained(&self) -> bool {
        self.constraints
            .iter()
            .all(|c| c.min.is_none() && c.max.is_none())
    }

    /// The same relation read with the operands swapped.
    pub fn inverse(&self) -> Self {
        Self {
            constraints: self
                .constraints
                .iter()
                .map(|c| BoundConstraint {
                    lhs_side: c.rhs_side,
                    rhs_side: c.lhs_side,
                    min: c.max.map(|d| d.negated()),
                    max: c.min.map(|d| d.negated()),
                })
                .collect(),
        }
    }

    /// Whether `lhs` and `rhs` can be placed so that every constraint holds.
    pub fn has_relation(&self, lhs: &Interval, rhs: &Interval) -> bool {
        let mut d = [[UNBOUNDED; NODES]; NODES];
        for (i, row) in d.iter_mut().enumerate() {
            row[i] = 0;
        }

        // Edge i→j with weight w encodes t_j - t_i ≤ w.
        let mut tighten = |from: usize, to: usize, w: i128| {
            if w < d[from][to] {
                d[from][to] = w;
            }
        };

        for (start, finish, interval) in [(LHS_START, LHS_FINISH, lhs), (RHS_START, RHS_FINISH, rhs)] {
            tighten(ORIGIN, start, interval.max_start() as i128);
            tighten(start, ORIGIN, -(interval.min_start() as i128));
            tighten(ORIGIN, finish, interval.max_finish() as i128);
            tighten(finish, ORIGIN, -(interval.min_finish() as i128));
            tighten(finish, start, 0);
        }

        for c in &self.constraints {
            let from = match c.lhs_side {
                Side::Start => LHS_START,
                Side::Finish => LHS_FINISH,
            };
            let to = match c.rhs_side {
                Side::Start => RHS_START,
                Side::Finish => RHS_FINISH,
            };
            if let Some(max) = c.max {
                tighten(from, to, max.to_millis() as i128);
            }
            if let Some(min) = c.min {
                tighten(to, from, -(min.to_millis() as i128));
            }
        }

        for k in 0..NODES {
            for i in 0..NODES {
                if d[i][k] >= UNBOUNDED {
                    continue;
                }
                for j in 0..NODES {
                    if d[k][j] >= UNBOUNDED {
                        continue;
                    }
                    let through = d[i][k] + d[k][j];
                    if through < d[i][j] {
                        d[i][j] = through;
                    }
                }
            }
        }

        (0..NODES).all(|i| d[i][i] >= 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::TimeUnit;

    fn iv(s: i64, f: i64) -> Interval {
        Interval::definite(s, f).unwrap()
    }

    #[test]
    fn empty_relation_always_holds() {
        assert!(Relation::new().has_relation(&iv(0, 5), &iv(100, 200)));
        assert!(Relation::new().has_relation(&iv(100, 200), &iv(0, 5)));
    }

    #[test]
    fn gap_bound_in_hours() {
        let r = Relation::new().gap(None, Some(Distance::new(1, TimeUnit::Hour)));
        let hour = TimeUnit::Hour.millis();
        assert!(r.has_relation(&iv(0, 10), &iv(10 + hour, 10 + 2 * hour)));
        assert!(!r.has_relation(&iv(0, 10), &iv(11 + hour, 11 + 2 * hour)));
    }

    #[test]
    fn uncertainty_allows_some_consistent_placement() {
        // Left may finish anywhere in [10, 20]; right starts at 25. Max gap 5 holds only if
        // left finishes at 20.
        let lhs = Interval::new(0, 0, 10, 20).unwrap();
        let rhs = iv(25, 30);
        let r = Relation::new().gap(None, Some(Distance::millis(5)));
        assert!(r.has_relation(&lhs, &rhs));
        let r = Relation::new().gap(None, Some(Distance::millis(4)));
        assert!(!r.has_relation(&lhs, &rhs));
    }

    #[test]
    fn inverse_swaps_operands() {
        let r = Relation::new().gap(Some(Distance::millis(1)), None);
        let (a, b) = (iv(0, 5), iv(10, 20));
        assert!(r.has_relation(&a, &b));
        assert!(r.inverse().has_relation(&b, &a));
        assert!(!r.inverse().has_relation(&a, &b));
    }
}
