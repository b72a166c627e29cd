use offer_match::{PlayerAttributes, RuleSetBuilder, SpendCondition};

fn main() {
    // The heaviest matching rule wins; equal weights keep the earlier rule.
    let ruleset = RuleSetBuilder::new()
        .rule("everyone", |r| r.weight(0.5).offer("regular_offer"))
        .rule("never_spent", |r| {
            r.spend(SpendCondition::NotSpent)
                .weight(1.5)
                .offer("first_purchase_bonus")
        })
        .rule("losing_streak", |r| r.losses(6, 10).weight(1.5).offer("special_reward"))
        .rule("lapsed_whale", |r| {
            r.level(20, 50)
                .recency(14, 30)
                .spend(SpendCondition::Spent)
                .weight(3.0)
                .offer("discount")
        })
        .compile()
        .expect("failed to compile rule set");

    let players = [
        ("new player", PlayerAttributes::new(2, 0, 1, false)),
        ("frustrated newcomer", PlayerAttributes::new(4, 3, 8, false)),
        ("frustrated spender", PlayerAttributes::new(4, 3, 8, true)),
        ("lapsed whale", PlayerAttributes::new(35, 20, 2, true)),
    ];

    for (label, player) in &players {
        let result = ruleset.evaluate(player);
        println!("{label:<20} -> {} ({result})", ruleset.offer(result));
    }
}
