mod bounds;
mod catalog;
mod error;
mod evaluation_report;
mod outcome;
mod player;
mod rule;
mod ruleset;
mod spend;

pub use bounds::{Bounds, Window};
pub use catalog::{OfferCatalog, DEFAULT_OFFER};
pub use error::CompileError;
pub use evaluation_report::{Condition, EvaluationReport};
pub use outcome::{MatchResult, OfferCode};
pub use player::PlayerAttributes;
pub use rule::Rule;
pub use ruleset::{RuleBuilder, RuleSet, RuleSetBuilder, DEFAULT_MAX_RULES};
pub use spend::SpendCondition;
