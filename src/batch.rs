//! Many-player evaluation.
//!
//! Each player is evaluated independently against the shared, read-only rule
//! set and writes only its own output slot, so any partitioning of the input
//! yields the same results. With the `parallel` feature the work is spread
//! over rayon's global pool using order-preserving indexed iterators;
//! otherwise it runs on the calling thread.

use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::evaluate::select;
use crate::{MatchResult, OfferCode, PlayerAttributes, RuleSet};

/// Number of players handled between cancellation checks.
pub const BATCH_CHUNK: usize = 4096;

pub(crate) fn evaluate_batch(
    rules: &RuleSet,
    players: &[PlayerAttributes],
    now: Option<i64>,
) -> Vec<MatchResult> {
    log_batch(rules, players);
    map_players(players, |player| select(rules, player, now))
}

pub(crate) fn offer_codes(
    rules: &RuleSet,
    players: &[PlayerAttributes],
    now: Option<i64>,
) -> Vec<OfferCode> {
    log_batch(rules, players);
    map_players(players, |player| rules.offer_code(select(rules, player, now)))
}

pub(crate) fn evaluate_batch_cancellable(
    rules: &RuleSet,
    players: &[PlayerAttributes],
    now: Option<i64>,
    cancel: &AtomicBool,
) -> Option<Vec<MatchResult>> {
    log_batch(rules, players);
    let chunks = map_chunks(players, |chunk| {
        if cancel.load(Ordering::Relaxed) {
            return None;
        }
        Some(
            chunk
                .iter()
                .map(|player| select(rules, player, now))
                .collect::<Vec<_>>(),
        )
    });

    match chunks {
        Some(chunks) => Some(chunks.into_iter().flatten().collect()),
        None => {
            tracing::warn!(players = players.len(), "batch evaluation cancelled");
            None
        }
    }
}

fn log_batch(rules: &RuleSet, players: &[PlayerAttributes]) {
    tracing::debug!(
        players = players.len(),
        rules = rules.len(),
        parallel = cfg!(feature = "parallel"),
        "evaluating batch"
    );
}

#[cfg(feature = "parallel")]
fn map_players<T, F>(players: &[PlayerAttributes], f: F) -> Vec<T>
where
    T: Send,
    F: Fn(&PlayerAttributes) -> T + Sync + Send,
{
    players.par_iter().map(f).collect()
}

#[cfg(not(feature = "parallel"))]
fn map_players<T, F>(players: &[PlayerAttributes], f: F) -> Vec<T>
where
    F: Fn(&PlayerAttributes) -> T,
{
    players.iter().map(f).collect()
}

#[cfg(feature = "parallel")]
fn map_chunks<T, F>(players: &[PlayerAttributes], f: F) -> Option<Vec<T>>
where
    T: Send,
    F: Fn(&[PlayerAttributes]) -> Option<T> + Sync + Send,
{
    players.par_chunks(BATCH_CHUNK).map(f).collect()
}

#[cfg(not(feature = "parallel"))]
fn map_chunks<T, F>(players: &[PlayerAttributes], f: F) -> Option<Vec<T>>
where
    F: Fn(&[PlayerAttributes]) -> Option<T>,
{
    players.chunks(BATCH_CHUNK).map(f).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;

    use super::BATCH_CHUNK;
    use crate::{MatchResult, OfferCode, PlayerAttributes, RuleSet, RuleSetBuilder, SpendCondition};

    fn ruleset() -> RuleSet {
        RuleSetBuilder::new()
            .rule("a", |r| r.level(1, 10).recency(0, 30).losses(0, 5).weight(1.0).offer("A"))
            .rule("b", |r| r.level(5, 10).recency(0, 30).losses(0, 5).weight(2.0).offer("B"))
            .rule("c", |r| r.level(11, 50).spend(SpendCondition::Spent).weight(1.0).offer("C"))
            .compile()
            .unwrap()
    }

    fn players(n: usize) -> Vec<PlayerAttributes> {
        (0..n)
            .map(|i| {
                let i = i64::try_from(i).unwrap();
                PlayerAttributes::new(i % 60, i % 31, i % 11, i % 2 == 0)
            })
            .collect()
    }

    #[test]
    fn batch_matches_single_evaluation() {
        let rules = ruleset();
        let players = players(1_000);
        let batch = rules.evaluate_batch(&players);
        let single: Vec<MatchResult> = players.iter().map(|p| rules.evaluate(p)).collect();
        assert_eq!(batch, single);
    }

    #[test]
    fn empty_batch() {
        let rules = ruleset();
        assert!(rules.evaluate_batch(&[]).is_empty());
        assert!(rules.offer_codes(&[]).is_empty());
    }

    #[test]
    fn offer_codes_resolve_to_labels() {
        let rules = ruleset();
        let players = vec![
            PlayerAttributes::new(7, 10, 1, false),
            PlayerAttributes::new(3, 10, 1, false),
            PlayerAttributes::new(20, 10, 1, true),
            PlayerAttributes::new(20, 10, 1, false),
        ];
        let codes = rules.offer_codes(&players);
        let labels: Vec<&str> = codes.iter().map(|&c| rules.label(c)).collect();
        assert_eq!(labels, vec!["B", "A", "C", "default_offer"]);
        assert_eq!(codes[3], OfferCode::DEFAULT);
    }

    #[test]
    fn temporal_batch_skips_inactive_rules() {
        let rules = RuleSetBuilder::new()
            .rule("old", |r| r.active(0, 100).weight(5.0).offer("old"))
            .rule("new", |r| r.active(101, 200).weight(1.0).offer("new"))
            .compile()
            .unwrap();
        let players = players(3);
        let at_50 = rules.offer_codes_at(&players, 50);
        let at_150 = rules.offer_codes_at(&players, 150);
        let at_500 = rules.evaluate_batch_at(&players, 500);
        assert!(at_50.iter().all(|&c| rules.label(c) == "old"));
        assert!(at_150.iter().all(|&c| rules.label(c) == "new"));
        assert!(at_500.iter().all(|r| *r == MatchResult::NoMatch));
    }

    #[test]
    fn cancellable_runs_to_completion_when_not_cancelled() {
        let rules = ruleset();
        let players = players(BATCH_CHUNK * 2 + 17);
        let cancel = AtomicBool::new(false);
        let result = rules
            .evaluate_batch_cancellable(&players, None, &cancel)
            .unwrap();
        assert_eq!(result, rules.evaluate_batch(&players));
    }

    #[test]
    fn cancellable_returns_none_when_cancelled() {
        let rules = ruleset();
        let players = players(BATCH_CHUNK + 1);
        let cancel = AtomicBool::new(true);
        assert!(rules
            .evaluate_batch_cancellable(&players, None, &cancel)
            .is_none());
    }
}
