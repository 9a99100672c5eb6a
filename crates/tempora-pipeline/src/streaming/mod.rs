//! Key-grouped merging of several data-source streams.

mod merge;

pub use merge::{KeyBatch, StreamingMerge};
