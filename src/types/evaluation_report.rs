use std::fmt;
use std::time::Duration;

use super::outcome::MatchResult;

/// The condition that rejected a rule for a given player, in check order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    /// The evaluation time fell outside the rule's validity window.
    Window,
    Level,
    Recency,
    Losses,
    Spend,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Window => "window",
            Self::Level => "level",
            Self::Recency => "recency",
            Self::Losses => "losses",
            Self::Spend => "spend",
        };
        f.write_str(s)
    }
}

/// Detailed evaluation report returned by
/// [`RuleSet::evaluate_detailed()`](super::ruleset::RuleSet::evaluate_detailed).
///
/// Contains the result and its offer label, every candidate rule, the first
/// failing condition of each rejected rule, and the wall-clock duration.
#[derive(Debug, Clone)]
#[must_use]
pub struct EvaluationReport {
    result: MatchResult,
    offer: String,
    candidates: Vec<usize>,
    rejected: Vec<(usize, Condition)>,
    duration: Duration,
}

impl EvaluationReport {
    pub(crate) fn new(
        result: MatchResult,
        offer: String,
        candidates: Vec<usize>,
        rejected: Vec<(usize, Condition)>,
        duration: Duration,
    ) -> Self {
        Self {
            result,
            offer,
            candidates,
            rejected,
            duration,
        }
    }

    /// The evaluation result, same as [`RuleSet::evaluate()`](super::ruleset::RuleSet::evaluate).
    pub fn result(&self) -> MatchResult {
        self.result
    }

    #[must_use]
    pub fn offer(&self) -> &str {
        &self.offer
    }

    /// Indices of rules whose conditions all held, in rule order.
    #[must_use]
    pub fn candidates(&self) -> &[usize] {
        &self.candidates
    }

    /// `(rule index, first failing condition)` for every non-candidate.
    #[must_use]
    pub fn rejected(&self) -> &[(usize, Condition)] {
        &self.rejected
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offer: {} ({})", self.offer, self.result)?;
        let candidates: Vec<String> = self.candidates.iter().map(ToString::to_string).collect();
        write!(f, ", candidates: [{}]", candidates.join(", "))?;
        write!(f, ", rejected: {}", self.rejected.len())?;
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}
