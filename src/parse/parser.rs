use crate::{Bounds, Rule, RuleSetBuilder, SpendCondition, Window};

use super::ParseError;

/// A single condition line inside a rule body.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Level(Bounds),
    Recency(Bounds),
    Losses(Bounds),
    Spend(SpendCondition),
    Active(Window),
    Offer(String),
}

impl Clause {
    fn keyword(&self) -> &'static str {
        match self {
            Self::Level(_) => "level",
            Self::Recency(_) => "recency",
            Self::Losses(_) => "losses",
            Self::Spend(_) => "spent",
            Self::Active(_) => "active",
            Self::Offer(_) => "offer",
        }
    }
}

/// A rule as written, before clauses are merged into a [`Rule`].
#[derive(Debug, Clone)]
pub struct ParsedRule {
    pub name: String,
    pub weight: Option<f64>,
    pub clauses: Vec<Clause>,
}

impl ParsedRule {
    /// Merge the clauses into a [`Rule`]. Each clause may appear at most once.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] on a repeated clause.
    pub fn into_rule(self) -> Result<Rule, ParseError> {
        let mut rule = Rule::new(self.name);
        rule.weight = self.weight;
        let mut seen: Vec<&'static str> = Vec::with_capacity(self.clauses.len());

        for clause in self.clauses {
            let keyword = clause.keyword();
            if seen.contains(&keyword) {
                return Err(ParseError::new(format!(
                    "rule '{}' repeats the '{keyword}' clause",
                    rule.name
                )));
            }
            seen.push(keyword);
            match clause {
                Clause::Level(b) => rule.level = b,
                Clause::Recency(b) => rule.recency = b,
                Clause::Losses(b) => rule.losses = b,
                Clause::Spend(s) => rule.spend = s,
                Clause::Active(w) => rule.window = Some(w),
                Clause::Offer(o) => rule.offer = Some(o),
            }
        }
        Ok(rule)
    }
}

/// The result of parsing a rule file.
#[derive(Debug)]
pub struct ParsedRuleSet {
    pub rules: Vec<Rule>,
    pub default_offer: Option<String>,
}

impl ParsedRuleSet {
    /// Hand the parsed rules to a builder, ready for compilation.
    #[must_use]
    pub fn into_builder(self) -> RuleSetBuilder {
        let mut builder = RuleSetBuilder::new();
        if let Some(label) = self.default_offer {
            builder = builder.default_offer(label);
        }
        self.rules.into_iter().fold(builder, RuleSetBuilder::push)
    }
}
