use std::fmt;

/// An inclusive `[min, max]` range over an integer player attribute.
///
/// A value equal to either bound satisfies the range. A range with
/// `min > max` is rejected when the rule set is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    any(feature = "json", feature = "binary-cache"),
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Bounds {
    pub min: i64,
    pub max: i64,
}

impl Bounds {
    /// The unconstrained range; every attribute value falls inside it.
    pub const ANY: Self = Self {
        min: i64::MIN,
        max: i64::MAX,
    };

    #[must_use]
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    #[inline]
    #[must_use]
    pub const fn contains(&self, value: i64) -> bool {
        self.min <= value && value <= self.max
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.min <= self.max
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::ANY
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}

/// An inclusive validity window in Unix seconds.
///
/// Only consulted by the temporal evaluation entry points
/// ([`RuleSet::evaluate_at`](crate::RuleSet::evaluate_at) and friends).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    any(feature = "json", feature = "binary-cache"),
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Window {
    pub start: i64,
    pub end: i64,
}

impl Window {
    #[must_use]
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    #[inline]
    #[must_use]
    pub const fn contains(&self, now: i64) -> bool {
        self.start <= now && now <= self.end
    }
}
