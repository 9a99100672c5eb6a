//! Interval/relation algebra: time units, intervals with bounded uncertainty,
//! bound-distance relations, Allen's relations, and gap functions.

pub mod allen;
pub mod gap_function;
pub mod interval;
pub mod relation;
pub mod unit;

pub use allen::AllenRelation;
pub use gap_function::GapFunction;
pub use interval::Interval;
pub use relation::{BoundConstraint, Relation, Side};
pub use unit::{Distance, Granularity, TimeUnit};
