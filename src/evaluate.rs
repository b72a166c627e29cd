use std::time::Instant;

use crate::types::{Condition, EvaluationReport};
use crate::{MatchResult, PlayerAttributes, RuleSet};

/// Scan every rule in order and keep the candidate with the strictly greatest
/// weight. Equal weights never displace an earlier candidate.
pub(crate) fn select(rules: &RuleSet, player: &PlayerAttributes, now: Option<i64>) -> MatchResult {
    let weights = &rules.weights[..rules.len()];
    let mut best: Option<(usize, f64)> = None;

    for (idx, &weight) in weights.iter().enumerate() {
        if check(rules, idx, player, now).is_err() {
            continue;
        }
        if best.map_or(true, |(_, best_weight)| weight > best_weight) {
            best = Some((idx, weight));
        }
    }

    best.map_or(MatchResult::NoMatch, |(idx, _)| MatchResult::Matched(idx))
}

/// Check rule `idx` against `player`, failing on the first unmet condition.
/// The window is only consulted when `now` is given.
#[inline]
fn check(
    rules: &RuleSet,
    idx: usize,
    player: &PlayerAttributes,
    now: Option<i64>,
) -> Result<(), Condition> {
    if let (Some(now), Some(window)) = (now, rules.windows[idx]) {
        if !window.contains(now) {
            return Err(Condition::Window);
        }
    }
    if !rules.level[idx].contains(player.level) {
        return Err(Condition::Level);
    }
    if !rules.recency[idx].contains(player.days_since_last_purchase) {
        return Err(Condition::Recency);
    }
    if !rules.losses[idx].contains(player.matches_lost) {
        return Err(Condition::Losses);
    }
    if !rules.spend[idx].admits(player.has_spent_money) {
        return Err(Condition::Spend);
    }
    Ok(())
}

pub(crate) fn evaluate_detailed(
    rules: &RuleSet,
    player: &PlayerAttributes,
    now: Option<i64>,
) -> EvaluationReport {
    let start = Instant::now();
    let mut candidates = Vec::new();
    let mut rejected = Vec::new();
    let mut best: Option<(usize, f64)> = None;

    for (idx, &weight) in rules.weights[..rules.len()].iter().enumerate() {
        match check(rules, idx, player, now) {
            Ok(()) => {
                candidates.push(idx);
                if best.map_or(true, |(_, best_weight)| weight > best_weight) {
                    best = Some((idx, weight));
                }
            }
            Err(condition) => rejected.push((idx, condition)),
        }
    }

    let result = best.map_or(MatchResult::NoMatch, |(idx, _)| MatchResult::Matched(idx));
    let duration = start.elapsed();

    EvaluationReport::new(
        result,
        rules.offer(result).to_owned(),
        candidates,
        rejected,
        duration,
    )
}
