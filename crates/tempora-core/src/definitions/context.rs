//! Context definitions: windows of time induced by other propositions.

use serde::{Deserialize, Serialize};

use super::default_concatenable;
use super::extended::TemporalExtendedPropositionDefinition;
use crate::temporal::{Distance, GapFunction, Interval, Side};

/// Window placement relative to the inducing instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextOffset {
    pub start_side: Side,
    pub start_offset: Distance,
    pub finish_side: Side,
    pub finish_offset: Distance,
}

impl Default for ContextOffset {
    /// The window is exactly the inducer's interval.
    fn default() -> Self {
        Self {
            start_side: Side::Start,
            start_offset: Distance::zero(),
            finish_side: Side::Finish,
            finish_offset: Distance::zero(),
        }
    }
}

impl ContextOffset {
    /// The window for `inducer`, or `None` when it would finish before it starts.
    pub fn window(&self, inducer: &Interval) -> Option<Interval> {
        let (start_min, start_max) = inducer.bounds(self.start_side);
        let (finish_min, finish_max) = inducer.bounds(self.finish_side);
        let start_shift = self.start_offset.to_millis();
        let finish_shift = self.finish_offset.to_millis();
        Interval::new(
            start_min.checked_add(start_shift)?,
            start_max.checked_add(start_shift)?,
            finish_min.checked_add(finish_shift)?,
            finish_max.checked_add(finish_shift)?,
        )
        .ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContextKind {
    /// One context per inducing instance.
    Induced {
        inducer: TemporalExtendedPropositionDefinition,
        #[serde(default)]
        offset: ContextOffset,
    },
    /// Maximal spans where every sub-context holds.
    Composite { sub_contexts: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextDefinition {
    pub id: String,
    #[serde(flatten)]
    pub kind: ContextKind,
    #[serde(default)]
    pub gap_function: GapFunction,
    /// Ignored for composite contexts, whose outputs are never concatenated.
    #[serde(default = "default_concatenable")]
    pub concatenable: bool,
}

impl ContextDefinition {
    pub fn induced(
        id: impl Into<String>,
        inducer: TemporalExtendedPropositionDefinition,
        offset: ContextOffset,
    ) -> Self {
        Self {
            id: id.into(),
            kind: ContextKind::Induced { inducer, offset },
            gap_function: GapFunction::default(),
            concatenable: true,
        }
    }

    pub fn composite<I, S>(id: impl Into<String>, sub_contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            kind: ContextKind::Composite {
                sub_contexts: sub_contexts.into_iter().map(Into::into).collect(),
            },
            gap_function: GapFunction::default(),
            concatenable: false,
        }
    }

    pub fn with_gap_function(mut self, gap_function: GapFunction) -> Self {
        self.gap_function = gap_function;
        self
    }

    pub fn with_concatenable(mut self, concatenable: bool) -> Self {
        self.concatenable = concatenable;
        self
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, ContextKind::Composite { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::TimeUnit;

    #[test]
    fn default_offset_copies_inducer() {
        let inducer = Interval::definite(10, 20).unwrap();
        assert_eq!(ContextOffset::default().window(&inducer), Some(inducer));
    }

    #[test]
    fn window_after_inducer_finish() {
        let offset = ContextOffset {
            start_side: Side::Finish,
            start_offset: Distance::zero(),
            finish_side: Side::Finish,
            finish_offset: Distance::new(1, TimeUnit::Hour),
        };
        let window = offset.window(&Interval::definite(0, 100).unwrap()).unwrap();
        assert_eq!(window.outer(), (100, 100 + 3_600_000));
    }

    #[test]
    fn inverted_window_is_skipped() {
        let offset = ContextOffset {
            start_side: Side::Finish,
            start_offset: Distance::millis(10),
            finish_side: Side::Start,
            finish_offset: Distance::zero(),
        };
        assert!(offset.window(&Interval::definite(0, 5).unwrap()).is_none());
    }
}
