use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;

use offer_match::{MatchResult, PlayerAttributes, RuleSet, RuleSetBuilder, SpendCondition};

fn ruleset() -> RuleSet {
    RuleSetBuilder::new()
        .rule("starter", |r| r.level(1, 10).recency(0, 30).losses(0, 5).weight(1.0).offer("discount"))
        .rule("veteran", |r| r.level(5, 10).recency(0, 30).losses(0, 5).weight(2.0).offer("regular_offer"))
        .rule("spender", |r| r.level(11, 50).spend(SpendCondition::Spent).weight(1.5).offer("special_reward"))
        .compile()
        .unwrap()
}

#[test]
fn evaluate_across_threads() {
    let ruleset = Arc::new(ruleset());
    let cases = [
        (PlayerAttributes::new(7, 10, 1, false), "regular_offer"),
        (PlayerAttributes::new(3, 10, 1, false), "discount"),
        (PlayerAttributes::new(30, 10, 1, true), "special_reward"),
        (PlayerAttributes::new(30, 10, 1, false), "default_offer"),
    ];

    let handles: Vec<_> = cases
        .iter()
        .map(|&(player, expected)| {
            let rs = Arc::clone(&ruleset);
            thread::spawn(move || {
                for _ in 0..1_000 {
                    assert_eq!(rs.offer(rs.evaluate(&player)), expected);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn scoped_threads_share_a_borrowed_ruleset() {
    let ruleset = ruleset();
    let players: Vec<PlayerAttributes> = (0..4_000)
        .map(|i| PlayerAttributes::new(i % 40, i % 31, i % 7, i % 2 == 0))
        .collect();
    let expected: Vec<MatchResult> = players.iter().map(|p| ruleset.evaluate(p)).collect();

    let results: Vec<Vec<MatchResult>> = thread::scope(|s| {
        let handles: Vec<_> = players
            .chunks(1_000)
            .map(|chunk| s.spawn(|| chunk.iter().map(|p| ruleset.evaluate(p)).collect::<Vec<_>>()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.concat(), expected);
}

#[test]
fn reload_by_swapping_the_arc() {
    let current = Arc::new(RwLock::new(Arc::new(ruleset())));
    let player = PlayerAttributes::new(7, 10, 1, false);

    // A reader takes a snapshot; it keeps the old rules even after a swap.
    let snapshot = Arc::clone(&current.read().unwrap());
    assert_eq!(snapshot.offer(snapshot.evaluate(&player)), "regular_offer");

    let replacement = RuleSetBuilder::new()
        .rule("everyone", |r| r.weight(1.0).offer("special_reward"))
        .compile()
        .unwrap();
    *current.write().unwrap() = Arc::new(replacement);

    assert_eq!(snapshot.offer(snapshot.evaluate(&player)), "regular_offer");
    let fresh = Arc::clone(&current.read().unwrap());
    assert_eq!(fresh.offer(fresh.evaluate(&player)), "special_reward");
}

#[test]
fn batch_cancelled_from_another_thread() {
    let ruleset = ruleset();
    let players = vec![PlayerAttributes::new(7, 10, 1, false); offer_match::BATCH_CHUNK * 4];
    let cancel = AtomicBool::new(false);

    thread::scope(|s| {
        s.spawn(|| cancel.store(true, Ordering::Relaxed));
    });

    assert!(ruleset
        .evaluate_batch_cancellable(&players, None, &cancel)
        .is_none());
}
