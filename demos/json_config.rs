use offer_match::{PlayerAttributes, RuleSet};

fn main() {
    let ruleset =
        RuleSet::from_json_file("demos/rules_config.json").expect("failed to load rule config");

    println!("{ruleset}");
    for (code, label) in ruleset.catalog().iter() {
        println!("  offer {code}: {label}");
    }

    let player = PlayerAttributes::new(15, 10, 1, true);
    let result = ruleset.evaluate_at(&player, 1_700_000_000);
    println!("player {player:?} -> {}", ruleset.offer(result));
}
