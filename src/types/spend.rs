use std::fmt;

/// Tri-state spending requirement of a rule.
///
/// `Ignore` is its own variant rather than an absent value, so a rule that
/// does not care about spending can never be confused with one that requires
/// `has_spent_money == false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "binary-cache",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum SpendCondition {
    /// The player must have spent money.
    Spent,
    /// The player must never have spent money.
    NotSpent,
    /// Spending history is not checked.
    #[default]
    Ignore,
}

impl SpendCondition {
    #[inline]
    #[must_use]
    pub const fn admits(self, has_spent_money: bool) -> bool {
        match self {
            Self::Spent => has_spent_money,
            Self::NotSpent => !has_spent_money,
            Self::Ignore => true,
        }
    }

    /// Decode the numeric form used in JSON rule files:
    /// `1` spent, `0` not spent, `-1` ignore.
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Spent),
            0 => Some(Self::NotSpent),
            -1 => Some(Self::Ignore),
            _ => None,
        }
    }

    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Spent => 1,
            Self::NotSpent => 0,
            Self::Ignore => -1,
        }
    }
}

impl fmt::Display for SpendCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Spent => "yes",
            Self::NotSpent => "no",
            Self::Ignore => "any",
        };
        f.write_str(s)
    }
}
