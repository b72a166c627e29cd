use offer_match::{PlayerAttributes, RuleSet};

fn main() {
    let ruleset = RuleSet::from_file("demos/rules.offers").expect("failed to load rules");

    println!("{ruleset}");

    let player = PlayerAttributes::new(30, 20, 8, true);
    println!("without a clock: {}", ruleset.offer(ruleset.evaluate(&player)));
    println!("at t=0:          {}", ruleset.offer(ruleset.evaluate_at(&player, 0)));
}
