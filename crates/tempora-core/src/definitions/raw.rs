use serde::{Deserialize, Serialize};

/// Metadata for a proposition type that data sources supply directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDefinition {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Direct children. A pattern targeting this id also matches any transitive child.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inverse_is_a: Vec<String>,
}

impl RawDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            inverse_is_a: Vec::new(),
        }
    }

    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inverse_is_a.extend(children.into_iter().map(Into::into));
        self
    }
}
