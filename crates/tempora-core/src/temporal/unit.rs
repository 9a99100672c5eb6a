use serde::{Deserialize, Serialize};

/// Fixed-length time units. Positions are milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
    Week,
}

/// Granules are epoch-aligned fixed-length time units.
pub type Granularity = TimeUnit;

impl TimeUnit {
    /// Length of one unit in milliseconds.
    pub const fn millis(self) -> i64 {
        match self {
            Self::Millisecond => 1,
            Self::Second => 1_000,
            Self::Minute => 60_000,
            Self::Hour => 3_600_000,
            Self::Day => 86_400_000,
            Self::Week => 604_800_000,
        }
    }

    /// First millisecond of the granule containing `position`.
    pub fn granule_start(self, position: i64) -> i64 {
        position.div_euclid(self.millis()) * self.millis()
    }

    /// Last millisecond of the granule containing `position`.
    pub fn granule_end(self, position: i64) -> i64 {
        self.granule_start(position) + self.millis() - 1
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Millisecond => "millisecond",
            Self::Second => "second",
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
        }
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signed distance with an explicit unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Distance {
    pub value: i64,
    pub unit: TimeUnit,
}

impl Distance {
    pub const fn new(value: i64, unit: TimeUnit) -> Self {
        Self { value, unit }
    }

    pub const fn millis(value: i64) -> Self {
        Self::new(value, TimeUnit::Millisecond)
    }

    pub const fn zero() -> Self {
        Self::millis(0)
    }

    /// The distance in milliseconds, saturating on overflow.
    pub fn to_millis(&self) -> i64 {
        self.value.saturating_mul(self.unit.millis())
    }

    pub fn negated(&self) -> Self {
        Self::new(self.value.saturating_neg(), self.unit)
    }
}

impl std::fmt::Display for Distance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}
