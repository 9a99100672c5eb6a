/// Tempora version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Source id stamped on every proposition the engine derives.
pub const DERIVED_SOURCE_ID: &str = "tempora:derived";

/// Salience of the built-in delete rule.
pub const SALIENCE_DELETE: i32 = 30;

/// Salience of concatenation (combine) rules.
pub const SALIENCE_COMBINE: i32 = 20;

/// Salience of per-tuple derivation rules (low-level, pattern, leaf context).
pub const SALIENCE_DERIVE: i32 = 10;

/// Salience of set-valued derivations (slice, composite context).
pub const SALIENCE_AGGREGATE: i32 = 5;

/// Default value given to high-level and pair abstractions without an explicit value.
pub const DEFAULT_PATTERN_VALUE: bool = true;
