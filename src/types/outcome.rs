use std::fmt;

/// The outcome of evaluating one player against a [`RuleSet`](super::RuleSet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use]
pub enum MatchResult {
    /// Index of the winning rule, in rule set order.
    Matched(usize),
    /// No rule's conditions all held; the caller gets the default offer.
    NoMatch,
}

impl MatchResult {
    #[must_use]
    pub const fn rule_index(self) -> Option<usize> {
        match self {
            Self::Matched(idx) => Some(idx),
            Self::NoMatch => None,
        }
    }

    #[must_use]
    pub const fn is_match(self) -> bool {
        matches!(self, Self::Matched(_))
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matched(idx) => write!(f, "matched rule #{idx}"),
            Self::NoMatch => f.write_str("no match"),
        }
    }
}

/// Compact numeric offer identifier, an index into the rule set's
/// [`OfferCatalog`](super::OfferCatalog).
///
/// [`OfferCode::DEFAULT`] is reserved for "no match" and never collides with a
/// catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OfferCode(pub(crate) u16);

impl OfferCode {
    pub const DEFAULT: Self = Self(u16::MAX);

    #[must_use]
    pub const fn is_default(self) -> bool {
        self.0 == Self::DEFAULT.0
    }

    /// Catalog index, or `None` for the default code.
    #[must_use]
    pub const fn index(self) -> Option<usize> {
        if self.is_default() {
            None
        } else {
            Some(self.0 as usize)
        }
    }

    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for OfferCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            f.write_str("default")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
