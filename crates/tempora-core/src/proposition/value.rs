use serde::{Deserialize, Serialize};

/// The value carried by parameters and abstractions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Nominal(String),
    Number(f64),
    Boolean(bool),
}

impl Value {
    pub fn nominal(s: impl Into<String>) -> Self {
        Self::Nominal(s.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Nominal(s) => Some(s),
            _ => None,
        }
    }

    /// Stable textual form used in refraction and diff signatures.
    pub fn repr(&self) -> String {
        match self {
            Self::Nominal(s) => format!("n:{s}"),
            Self::Number(n) => format!("f:{n}"),
            Self::Boolean(b) => format!("b:{b}"),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nominal(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Nominal(s.to_string())
    }
}
