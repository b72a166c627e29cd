use thiserror::Error;

/// Load-time validation failures. A rule set that fails any of these checks is
/// never handed to the evaluator.
#[derive(Debug, Error, PartialEq)]
pub enum CompileError {
    #[error("rule set holds {count} rules but the limit is {limit}")]
    CapacityExceeded { limit: usize, count: usize },

    #[error("duplicate rule name '{name}'")]
    DuplicateRule { name: String },

    #[error("rule '{rule}' is missing its {field}")]
    MissingField { rule: String, field: &'static str },

    #[error("rule '{rule}' has an empty {condition} range: min {min} > max {max}")]
    InvalidBounds {
        rule: String,
        condition: &'static str,
        min: i64,
        max: i64,
    },

    #[error("rule '{rule}' has an empty validity window: start {start} > end {end}")]
    InvalidWindow { rule: String, start: i64, end: i64 },

    #[error("rule '{rule}' has a non-finite weight")]
    NonFiniteWeight { rule: String },

    #[error("rule '{rule}' has an empty offer label")]
    EmptyOffer { rule: String },

    #[error("rule '{rule}' has spend code {code}; expected -1, 0 or 1")]
    InvalidSpendCode { rule: String, code: i64 },

    #[error("{count} distinct offer labels do not fit in the offer code space")]
    TooManyOffers { count: usize },
}
