use serde::{Deserialize, Serialize};

use super::extended::TemporalExtendedPropositionDefinition;

/// Selects instances `[min_index, max_index)` of a component in temporal order.
///
/// Negative indices count from the end (`-1` is the last).
/// Outputs are never concatenated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceDefinition {
    pub id: String,
    pub component: TemporalExtendedPropositionDefinition,
    pub min_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_index: Option<i64>,
    /// Emit one instance spanning the whole selection instead of one copy per instance.
    #[serde(default)]
    pub merged_interval: bool,
}

impl SliceDefinition {
    pub fn new(
        id: impl Into<String>,
        component: TemporalExtendedPropositionDefinition,
        min_index: i64,
        max_index: Option<i64>,
    ) -> Self {
        Self {
            id: id.into(),
            component,
            min_index,
            max_index,
            merged_interval: false,
        }
    }

    pub fn merged(mut self) -> Self {
        self.merged_interval = true;
        self
    }

    /// The selected positions in a list of `len` instances sorted ascending by temporal order.
    pub fn selected_range(&self, len: usize) -> std::ops::Range<usize> {
        let len = len as i64;
        let resolve = |index: i64| -> i64 {
            if index < 0 {
                (len + index).max(0)
            } else {
                index.min(len)
            }
        };
        let from = resolve(self.min_index);
        let to = self.max_index.map_or(len, resolve);
        from as usize..to.max(from) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slice(min: i64, max: Option<i64>) -> SliceDefinition {
        SliceDefinition::new("s", TemporalExtendedPropositionDefinition::new("p"), min, max)
    }

    #[test]
    fn first_instance() {
        assert_eq!(slice(0, Some(1)).selected_range(5), 0..1);
    }

    #[test]
    fn last_two_instances() {
        assert_eq!(slice(-2, None).selected_range(5), 3..5);
        assert_eq!(slice(-1, None).selected_range(5), 4..5);
    }

    #[test]
    fn out_of_range_selects_nothing() {
        assert!(slice(3, Some(4)).selected_range(2).is_empty());
        assert_eq!(slice(-10, Some(1)).selected_range(3), 0..1);
    }
}
