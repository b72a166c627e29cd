use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use offer_match::{PlayerAttributes, RuleSetBuilder, SpendCondition};

fn main() {
    let offers = ["discount", "first_purchase_bonus", "regular_offer", "special_reward"];
    let mut builder = RuleSetBuilder::new();
    for (i, idx) in (0_i64..).zip(0..150_usize) {
        let spend = match i % 3 {
            0 => SpendCondition::Spent,
            1 => SpendCondition::NotSpent,
            _ => SpendCondition::Ignore,
        };
        builder = builder.rule(&format!("rule_{i}"), move |r| {
            r.level(i % 10 + 1, i % 10 + 11)
                .recency((i % 5) * 2, (i % 5) * 2 + 5)
                .losses(i % 3, i % 3 + 3)
                .spend(spend)
                .weight(1.0 + (i % 10) as f64 * 0.1)
                .offer(offers[idx % 4])
        });
    }
    let ruleset = Arc::new(builder.compile().expect("failed to compile rule set"));

    let players: Vec<PlayerAttributes> = (0..1_000_000_i64)
        .map(|i| PlayerAttributes::new(i % 50 + 1, i % 31, i % 11, i % 2 == 0))
        .collect();

    let start = Instant::now();
    let codes = ruleset.offer_codes(&players);
    println!("evaluated {} players in {:?}", codes.len(), start.elapsed());

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for &code in &codes {
        *counts.entry(ruleset.label(code)).or_default() += 1;
    }
    for (offer, n) in &counts {
        println!("  {offer:<22} {n}");
    }

    // The same compiled rules can also be shared by hand-rolled workers.
    let handles: Vec<_> = (0..4_i64)
        .map(|t| {
            let rs = Arc::clone(&ruleset);
            thread::spawn(move || {
                let player = PlayerAttributes::new(5 + t * 5, 4, 2, t % 2 == 0);
                let result = rs.evaluate(&player);
                println!("thread {t}: {}", rs.offer(result));
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}
