use offer_match::{PlayerAttributes, RuleSetBuilder, SpendCondition};

fn main() {
    let ruleset = RuleSetBuilder::new()
        .rule("starter", |r| r.level(1, 10).weight(1.0).offer("discount"))
        .rule("spender", |r| {
            r.spend(SpendCondition::Spent)
                .weight(2.0)
                .offer("special_reward")
        })
        .rule("comeback", |r| r.recency(14, 30).weight(1.5).offer("regular_offer"))
        .rule("launch_week", |r| {
            r.active(1_700_000_000, 1_700_604_800)
                .weight(5.0)
                .offer("first_purchase_bonus")
        })
        .compile()
        .expect("failed to compile rule set");

    let player = PlayerAttributes::new(8, 20, 3, false);
    let report = ruleset.evaluate_detailed(&player, Some(1_750_000_000));

    println!("{report}");
    println!();
    for &idx in report.candidates() {
        println!("candidate: {}", ruleset.names()[idx]);
    }
    for &(idx, condition) in report.rejected() {
        println!("rejected:  {} (failed {condition})", ruleset.names()[idx]);
    }
}
