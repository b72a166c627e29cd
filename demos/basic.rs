use offer_match::{PlayerAttributes, RuleSetBuilder};

fn main() {
    let ruleset = RuleSetBuilder::new()
        .rule("starter", |r| {
            r.level(1, 10).recency(0, 30).losses(0, 5).weight(1.0).offer("A")
        })
        .rule("veteran", |r| {
            r.level(5, 10).recency(0, 30).losses(0, 5).weight(2.0).offer("B")
        })
        .compile()
        .expect("failed to compile rule set");

    println!("{ruleset}");

    for level in [7, 3, 20] {
        let player = PlayerAttributes::new(level, 10, 1, false);
        let result = ruleset.evaluate(&player);
        println!("level {level:>2}: {} ({result})", ruleset.offer(result));
    }
}
