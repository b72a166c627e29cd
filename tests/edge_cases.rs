use offer_match::{
    CompileError, Condition, MatchResult, OfferCode, PlayerAttributes, Rule, RuleSetBuilder,
    SpendCondition, DEFAULT_MAX_RULES,
};

fn anyone() -> PlayerAttributes {
    PlayerAttributes::new(10, 10, 1, false)
}

#[test]
fn single_rule_ruleset() {
    let ruleset = RuleSetBuilder::new()
        .rule("only", |r| r.level(10, 10).weight(1.0).offer("only"))
        .compile()
        .unwrap();
    assert_eq!(ruleset.evaluate(&anyone()), MatchResult::Matched(0));
    assert_eq!(ruleset.offer(MatchResult::Matched(0)), "only");
}

#[test]
fn generated_rule_grid_picks_heaviest_match() {
    // Mirrors a generated configuration: 150 overlapping rules, weights
    // cycling through 1.0..=1.9, four offers.
    let offers = ["discount", "first_purchase_bonus", "regular_offer", "special_reward"];
    let mut builder = RuleSetBuilder::new();
    for i in 0..150_i64 {
        let idx = usize::try_from(i).unwrap();
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
    let ruleset = builder.compile().unwrap();
    assert_eq!(ruleset.len(), 150);
    assert_eq!(ruleset.catalog().len(), 4);

    let player = PlayerAttributes::new(15, 4, 2, true);
    let report = ruleset.evaluate_detailed(&player, None);
    let MatchResult::Matched(winner) = report.result() else {
        panic!("expected a match");
    };
    let best = report
        .candidates()
        .iter()
        .map(|&i| ruleset.rule(i).unwrap().weight.unwrap())
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(ruleset.rule(winner).unwrap().weight, Some(best));
    let first_best = report
        .candidates()
        .iter()
        .copied()
        .find(|&i| ruleset.rule(i).unwrap().weight == Some(best));
    assert_eq!(first_best, Some(winner));
}

#[test]
fn over_capacity_is_an_error_not_truncation() {
    let builder = (0..5).fold(RuleSetBuilder::new().max_rules(4), |b, i| {
        b.rule(&format!("r{i}"), |r| r.weight(1.0).offer("A"))
    });
    assert_eq!(
        builder.compile().unwrap_err(),
        CompileError::CapacityExceeded { limit: 4, count: 5 }
    );
}

#[test]
fn exactly_at_capacity_compiles() {
    let builder = (0..4).fold(RuleSetBuilder::new().max_rules(4), |b, i| {
        b.rule(&format!("r{i}"), |r| r.weight(1.0).offer("A"))
    });
    assert_eq!(builder.compile().unwrap().len(), 4);
}

#[test]
fn default_capacity_accepts_many_rules() {
    let builder = (0..DEFAULT_MAX_RULES).fold(RuleSetBuilder::new(), |b, i| {
        b.push({
            let mut rule = Rule::new(format!("r{i}"));
            rule.weight = Some(1.0);
            rule.offer = Some("A".to_owned());
            rule
        })
    });
    let ruleset = builder.compile().unwrap();
    assert_eq!(ruleset.len(), DEFAULT_MAX_RULES);
    assert_eq!(ruleset.evaluate(&anyone()), MatchResult::Matched(0));
}

#[test]
fn nan_and_infinite_weights_rejected() {
    for weight in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let err = RuleSetBuilder::new()
            .rule("bad", |r| r.weight(weight).offer("A"))
            .compile()
            .unwrap_err();
        assert_eq!(err, CompileError::NonFiniteWeight { rule: "bad".into() });
    }
}

#[test]
fn extreme_finite_weights_order_correctly() {
    let ruleset = RuleSetBuilder::new()
        .rule("min", |r| r.weight(f64::MIN).offer("min"))
        .rule("tiny", |r| r.weight(f64::MIN_POSITIVE).offer("tiny"))
        .rule("max", |r| r.weight(f64::MAX).offer("max"))
        .compile()
        .unwrap();
    assert_eq!(ruleset.offer(ruleset.evaluate(&anyone())), "max");
}

#[test]
fn zero_and_negative_zero_weights_tie() {
    let ruleset = RuleSetBuilder::new()
        .rule("pos", |r| r.weight(0.0).offer("pos"))
        .rule("neg", |r| r.weight(-0.0).offer("neg"))
        .compile()
        .unwrap();
    assert_eq!(ruleset.evaluate(&anyone()), MatchResult::Matched(0));
}

#[test]
fn blank_offer_labels_rejected() {
    let err = RuleSetBuilder::new()
        .rule("blank", |r| r.weight(1.0).offer("  "))
        .compile()
        .unwrap_err();
    assert_eq!(err, CompileError::EmptyOffer { rule: "blank".into() });

    let err = RuleSetBuilder::new().default_offer("").compile().unwrap_err();
    assert!(matches!(err, CompileError::EmptyOffer { .. }));
}

#[test]
fn inverted_window_rejected() {
    let err = RuleSetBuilder::new()
        .rule("w", |r| r.active(10, 5).weight(1.0).offer("A"))
        .compile()
        .unwrap_err();
    assert_eq!(
        err,
        CompileError::InvalidWindow {
            rule: "w".into(),
            start: 10,
            end: 5
        }
    );
}

#[test]
fn extreme_attribute_values() {
    let ruleset = RuleSetBuilder::new()
        .rule("all", |r| r.weight(1.0).offer("all"))
        .rule("edge", |r| r.level(i64::MAX, i64::MAX).weight(2.0).offer("edge"))
        .compile()
        .unwrap();
    let max = PlayerAttributes::new(i64::MAX, i64::MAX, i64::MAX, true);
    let min = PlayerAttributes::new(i64::MIN, i64::MIN, i64::MIN, false);
    assert_eq!(ruleset.offer(ruleset.evaluate(&max)), "edge");
    assert_eq!(ruleset.offer(ruleset.evaluate(&min)), "all");
}

#[test]
fn shared_labels_share_codes() {
    let ruleset = RuleSetBuilder::new()
        .rule("a", |r| r.level(0, 5).weight(1.0).offer("discount"))
        .rule("b", |r| r.level(6, 10).weight(1.0).offer("special_reward"))
        .rule("c", |r| r.level(11, 20).weight(1.0).offer("discount"))
        .compile()
        .unwrap();
    let players = [
        PlayerAttributes::new(1, 0, 0, false),
        PlayerAttributes::new(15, 0, 0, false),
        PlayerAttributes::new(8, 0, 0, false),
        PlayerAttributes::new(99, 0, 0, false),
    ];
    let codes = ruleset.offer_codes(&players);
    assert_eq!(codes[0], codes[1]);
    assert_ne!(codes[0], codes[2]);
    assert_eq!(codes[3], OfferCode::DEFAULT);
    assert_eq!(ruleset.catalog().code_of("discount"), Some(codes[0]));
    assert_eq!(ruleset.catalog().code_of("default_offer"), Some(OfferCode::DEFAULT));
    assert_eq!(ruleset.catalog().code_of("unknown"), None);
}

#[test]
fn rule_may_use_the_default_label() {
    let ruleset = RuleSetBuilder::new()
        .rule("explicit", |r| r.level(1, 1).weight(1.0).offer("default_offer"))
        .compile()
        .unwrap();
    let hit = ruleset.evaluate(&PlayerAttributes::new(1, 0, 0, false));
    let miss = ruleset.evaluate(&PlayerAttributes::new(2, 0, 0, false));
    assert_eq!(ruleset.offer(hit), ruleset.offer(miss));
    assert!(hit.is_match());
    assert!(!miss.is_match());
}

#[test]
fn evaluate_detailed_no_match() {
    let ruleset = RuleSetBuilder::new()
        .rule("spender", |r| r.spend(SpendCondition::Spent).weight(1.0).offer("A"))
        .compile()
        .unwrap();
    let report = ruleset.evaluate_detailed(&anyone(), None);
    assert_eq!(report.result(), MatchResult::NoMatch);
    assert_eq!(report.offer(), "default_offer");
    assert!(report.candidates().is_empty());
    assert_eq!(report.rejected(), &[(0, Condition::Spend)]);
}

#[test]
fn evaluate_detailed_ignores_windows_without_time() {
    let ruleset = RuleSetBuilder::new()
        .rule("expired", |r| r.active(0, 1).weight(1.0).offer("A"))
        .compile()
        .unwrap();
    assert_eq!(ruleset.evaluate_detailed(&anyone(), None).candidates(), &[0]);
    assert_eq!(
        ruleset.evaluate_detailed(&anyone(), Some(2)).rejected(),
        &[(0, Condition::Window)]
    );
}
