//! Weighted offer selection for player profiles.
//!
//! A [`RuleSet`] is an ordered list of rules. Each rule constrains a player's
//! level, days since last purchase and matches lost to inclusive ranges,
//! optionally requires (or forbids) past spending, and carries a weight and an
//! offer label. Evaluating a player picks the matching rule with the strictly
//! greatest weight; ties go to the earlier rule, and a player no rule matches
//! gets the rule set's default offer.
//!
//! Rule sets are built with [`RuleSetBuilder`], parsed from the text rule
//! format with [`RuleSet::from_dsl`], or loaded from JSON (feature `json`).
//! Compiled sets are immutable and can be shared across threads behind an
//! `Arc`; [`RuleSet::evaluate_batch`] fans out over rayon when the
//! `parallel` feature is enabled.

mod batch;
mod compile;
#[cfg(feature = "json")]
pub mod config;
mod error;
mod evaluate;
pub mod parse;
#[cfg(feature = "binary-cache")]
pub mod serial;
mod types;

pub use batch::BATCH_CHUNK;
pub use error::OfferError;
pub use parse::ParseError;
#[cfg(feature = "binary-cache")]
pub use serial::{DeserializeError, SerializeError};
pub use types::{
    Bounds, CompileError, Condition, EvaluationReport, MatchResult, OfferCatalog, OfferCode,
    PlayerAttributes, Rule, RuleBuilder, RuleSet, RuleSetBuilder, SpendCondition, Window,
    DEFAULT_MAX_RULES, DEFAULT_OFFER,
};
