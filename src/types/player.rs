/// The attributes of one player, as seen by a single evaluation.
///
/// Values are expected to be non-negative, but nothing rejects negative ones:
/// they simply fall outside every range a rule set is likely to declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerAttributes {
    pub level: i64,
    pub days_since_last_purchase: i64,
    pub matches_lost: i64,
    pub has_spent_money: bool,
}

impl PlayerAttributes {
    #[must_use]
    pub const fn new(
        level: i64,
        days_since_last_purchase: i64,
        matches_lost: i64,
        has_spent_money: bool,
    ) -> Self {
        Self {
            level,
            days_since_last_purchase,
            matches_lost,
            has_spent_money,
        }
    }
}
