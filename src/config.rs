//! JSON rule configuration.
//!
//! The document is an object with a `rules` array and an optional
//! `default_offer`. Every rule spells out all six range ends, a spend code
//! (`1` spent, `0` never spent, `-1` ignore), an offer label and a weight:
//!
//! ```json
//! {
//!     "rules": [
//!         {
//!             "min_level": 1, "max_level": 11,
//!             "min_days_since_last_purchase": 0, "max_days_since_last_purchase": 5,
//!             "min_matches_lost": 0, "max_matches_lost": 3,
//!             "has_spent_money": -1,
//!             "offer": "discount",
//!             "weight": 1.0,
//!             "start_time": 0, "end_time": 9999999999
//!         }
//!     ]
//! }
//! ```
//!
//! Unknown keys are rejected. `name` is optional and defaults to `rule_<index>`.

use serde::{Deserialize, Serialize};

use crate::{Bounds, CompileError, Rule, RuleSetBuilder, SpendCondition, Window};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesConfig {
    pub rules: Vec<RuleConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_offer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub min_level: i64,
    pub max_level: i64,
    pub min_days_since_last_purchase: i64,
    pub max_days_since_last_purchase: i64,
    pub min_matches_lost: i64,
    pub max_matches_lost: i64,
    pub has_spent_money: i64,
    pub offer: String,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
}

impl RuleConfig {
    fn into_rule(self, index: usize) -> Result<Rule, CompileError> {
        let name = self.name.unwrap_or_else(|| format!("rule_{index}"));
        let spend = SpendCondition::from_code(self.has_spent_money).ok_or_else(|| {
            CompileError::InvalidSpendCode {
                rule: name.clone(),
                code: self.has_spent_money,
            }
        })?;
        let window = match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(Window::new(start, end)),
            (None, None) => None,
            (Some(_), None) => {
                return Err(CompileError::MissingField {
                    rule: name,
                    field: "end_time",
                })
            }
            (None, Some(_)) => {
                return Err(CompileError::MissingField {
                    rule: name,
                    field: "start_time",
                })
            }
        };

        let mut rule = Rule::new(name);
        rule.level = Bounds::new(self.min_level, self.max_level);
        rule.recency = Bounds::new(
            self.min_days_since_last_purchase,
            self.max_days_since_last_purchase,
        );
        rule.losses = Bounds::new(self.min_matches_lost, self.max_matches_lost);
        rule.spend = spend;
        rule.weight = Some(self.weight);
        rule.offer = Some(self.offer);
        rule.window = window;
        Ok(rule)
    }
}

impl RulesConfig {
    /// Convert the configuration into a builder, in file order.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::InvalidSpendCode`] for a spend code outside
    /// `-1..=1`, or [`CompileError::MissingField`] when only one end of the
    /// validity window is given. Everything else is checked by
    /// [`RuleSetBuilder::compile`].
    pub fn into_builder(self) -> Result<RuleSetBuilder, CompileError> {
        let mut builder = RuleSetBuilder::new();
        if let Some(label) = self.default_offer {
            builder = builder.default_offer(label);
        }
        for (index, rule) in self.rules.into_iter().enumerate() {
            builder = builder.push(rule.into_rule(index)?);
        }
        Ok(builder)
    }
}
