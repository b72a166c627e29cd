use winnow::ascii::{dec_int, float, till_line_ending};
use winnow::combinator::{alt, cut_err, delimited, eof, opt, preceded, repeat};
use winnow::error::{ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, take_while};

use crate::{Bounds, SpendCondition, Window};

use super::parser::{Clause, ParsedRule};

// -- Whitespace & comments --------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    let _: () = repeat(
        0..,
        alt((
            take_while(1.., |c: char| c.is_ascii_whitespace()).void(),
            ('#', till_line_ending).void(),
        )),
    )
    .parse_next(input)?;
    Ok(())
}

/// At least one space or tab; keywords must be separated from their operand.
fn gap(input: &mut &str) -> ModalResult<()> {
    take_while(1.., |c: char| c == ' ' || c == '\t')
        .void()
        .parse_next(input)
}

// -- Identifiers & literals -------------------------------------------------

fn ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1.., |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
    )
        .take()
        .parse_next(input)
}

fn string_literal(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = any.parse_next(input)?;
        match ch {
            '"' => return Ok(s),
            '\\' => {
                let esc = any.parse_next(input)?;
                match esc {
                    '"' => s.push('"'),
                    '\\' => s.push('\\'),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

fn integer(input: &mut &str) -> ModalResult<i64> {
    dec_int::<_, i64, _>
        .context(StrContext::Expected(StrContextValue::Description(
            "integer",
        )))
        .parse_next(input)
}

/// `min..=max`, both ends inclusive.
fn range(input: &mut &str) -> ModalResult<(i64, i64)> {
    let min = integer(input)?;
    (opt(gap), "..=", opt(gap))
        .context(StrContext::Expected(StrContextValue::StringLiteral("..=")))
        .parse_next(input)?;
    let max = integer(input)?;
    Ok((min, max))
}

fn spend(input: &mut &str) -> ModalResult<SpendCondition> {
    alt((
        "yes".value(SpendCondition::Spent),
        "no".value(SpendCondition::NotSpent),
        "any".value(SpendCondition::Ignore),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "yes, no or any",
    )))
    .parse_next(input)
}

// -- Clauses ----------------------------------------------------------------

fn clause(input: &mut &str) -> ModalResult<Clause> {
    ws.parse_next(input)?;
    alt((
        preceded(("level", gap), cut_err(range))
            .map(|(min, max)| Clause::Level(Bounds::new(min, max))),
        preceded(("recency", gap), cut_err(range))
            .map(|(min, max)| Clause::Recency(Bounds::new(min, max))),
        preceded(("losses", gap), cut_err(range))
            .map(|(min, max)| Clause::Losses(Bounds::new(min, max))),
        preceded(("spent", gap), cut_err(spend)).map(Clause::Spend),
        preceded(("active", gap), cut_err(range))
            .map(|(start, end)| Clause::Active(Window::new(start, end))),
        preceded(("offer", gap), cut_err(string_literal)).map(Clause::Offer),
    ))
    .parse_next(input)
}

// -- Rule definitions -------------------------------------------------------

fn weight_annotation(input: &mut &str) -> ModalResult<f64> {
    delimited(
        (ws, '(', ws, "weight", gap),
        cut_err(float::<_, f64, _>).context(StrContext::Expected(
            StrContextValue::Description("weight"),
        )),
        (ws, cut_err(')')),
    )
    .parse_next(input)
}

fn rule_def(input: &mut &str) -> ModalResult<ParsedRule> {
    ws.parse_next(input)?;
    ("rule", gap).parse_next(input)?;

    let name = cut_err(ident)
        .context(StrContext::Expected(StrContextValue::Description(
            "rule name",
        )))
        .parse_next(input)?;

    let weight = opt(weight_annotation).parse_next(input)?;

    ws.parse_next(input)?;
    cut_err(':')
        .context(StrContext::Expected(StrContextValue::CharLiteral(':')))
        .parse_next(input)?;

    let clauses: Vec<Clause> = repeat(0.., clause).parse_next(input)?;

    Ok(ParsedRule {
        name: name.to_owned(),
        weight,
        clauses,
    })
}

fn default_def(input: &mut &str) -> ModalResult<String> {
    ws.parse_next(input)?;
    preceded(("default", gap), cut_err(string_literal)).parse_next(input)
}

// -- Top-level parser -------------------------------------------------------

/// Anything left after the last rule is an unknown clause or a broken rule
/// header.
fn end_of_rules(input: &mut &str) -> ModalResult<()> {
    fn keyword(word: &'static str) -> StrContext {
        StrContext::Expected(StrContextValue::StringLiteral(word))
    }
    cut_err(eof.void())
        .context(StrContext::Label("clause"))
        .context(keyword("level"))
        .context(keyword("recency"))
        .context(keyword("losses"))
        .context(keyword("spent"))
        .context(keyword("active"))
        .context(keyword("offer"))
        .context(keyword("rule"))
        .parse_next(input)
}

/// An optional `default "label"` line followed by any number of rules.
pub fn parse_ruleset(input: &mut &str) -> ModalResult<(Option<String>, Vec<ParsedRule>)> {
    let default_offer = opt(default_def).parse_next(input)?;
    let rules: Vec<ParsedRule> = repeat(0.., rule_def).parse_next(input)?;
    ws.parse_next(input)?;
    end_of_rules.parse_next(input)?;
    Ok((default_offer, rules))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_range() {
        let mut input = "1..=10";
        assert_eq!(range(&mut input).unwrap(), (1, 10));
        let mut input = "-5 ..= 5";
        assert_eq!(range(&mut input).unwrap(), (-5, 5));
    }

    #[test]
    fn parse_spend_values() {
        for (text, expected) in [
            ("yes", SpendCondition::Spent),
            ("no", SpendCondition::NotSpent),
            ("any", SpendCondition::Ignore),
        ] {
            let mut input = text;
            assert_eq!(spend(&mut input).unwrap(), expected);
        }
    }

    #[test]
    fn parse_each_clause() {
        let mut input = "  level 1..=10";
        assert_eq!(clause(&mut input).unwrap(), Clause::Level(Bounds::new(1, 10)));
        let mut input = "recency 0..=30";
        assert_eq!(clause(&mut input).unwrap(), Clause::Recency(Bounds::new(0, 30)));
        let mut input = "losses 2..=4";
        assert_eq!(clause(&mut input).unwrap(), Clause::Losses(Bounds::new(2, 4)));
        let mut input = "spent no";
        assert_eq!(clause(&mut input).unwrap(), Clause::Spend(SpendCondition::NotSpent));
        let mut input = "active 0..=9999999999";
        assert_eq!(
            clause(&mut input).unwrap(),
            Clause::Active(Window::new(0, 9_999_999_999))
        );
        let mut input = r#"offer "special_reward""#;
        assert_eq!(clause(&mut input).unwrap(), Clause::Offer("special_reward".into()));
    }

    #[test]
    fn parse_string_escapes() {
        let mut input = r#""say \"hi\"""#;
        assert_eq!(string_literal(&mut input).unwrap(), "say \"hi\"");
    }

    #[test]
    fn parse_weight_annotation_forms() {
        let mut input = " (weight 2.5)";
        assert!((weight_annotation(&mut input).unwrap() - 2.5).abs() < f64::EPSILON);
        let mut input = "(weight 3)";
        assert!((weight_annotation(&mut input).unwrap() - 3.0).abs() < f64::EPSILON);
        let mut input = "(weight -1.25)";
        assert!((weight_annotation(&mut input).unwrap() + 1.25).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_rule_with_clauses() {
        let mut input = "rule starter (weight 1.0):\n    level 1..=10\n    offer \"A\"\n";
        let rule = rule_def(&mut input).unwrap();
        assert_eq!(rule.name, "starter");
        assert_eq!(rule.weight, Some(1.0));
        assert_eq!(rule.clauses.len(), 2);
    }

    #[test]
    fn parse_rule_without_weight() {
        let mut input = "rule bare:\n    offer \"A\"";
        let rule = rule_def(&mut input).unwrap();
        assert_eq!(rule.weight, None);
    }

    #[test]
    fn leftover_input_names_expected_clauses() {
        let mut input = "bogus 1..=2\n";
        let err = end_of_rules(&mut input).unwrap_err();
        let message = err.into_inner().unwrap().to_string();
        assert!(message.starts_with("invalid clause"), "{message}");
        assert!(message.contains("`level`"), "{message}");
        assert!(message.contains("`offer`"), "{message}");
    }

    #[test]
    fn end_of_rules_accepts_empty_input() {
        let mut input = "";
        assert!(end_of_rules(&mut input).is_ok());
    }

    #[test]
    fn clause_stops_at_next_rule() {
        let mut input = "\nrule next:";
        assert!(clause(&mut input).is_err());
    }
}
