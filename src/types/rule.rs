use super::bounds::{Bounds, Window};
use super::spend::SpendCondition;

/// One eligibility condition bundle plus its weight and offer label.
///
/// Rules are created via [`RuleSetBuilder`](super::RuleSetBuilder), by parsing
/// the text format with [`RuleSet::from_dsl()`](super::RuleSet::from_dsl), or
/// from a JSON rule file. `weight` and `offer` stay `None` until set; the
/// compile step rejects a rule that is missing either.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub name: String,
    pub level: Bounds,
    pub recency: Bounds,
    pub losses: Bounds,
    pub spend: SpendCondition,
    pub weight: Option<f64>,
    pub offer: Option<String>,
    pub window: Option<Window>,
}

impl Rule {
    /// A rule with no constraints and no weight or offer yet.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: Bounds::ANY,
            recency: Bounds::ANY,
            losses: Bounds::ANY,
            spend: SpendCondition::Ignore,
            weight: None,
            offer: None,
            window: None,
        }
    }
}
