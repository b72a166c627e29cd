mod error;
mod grammar;
mod parser;

pub use error::ParseError;
pub use parser::{Clause, ParsedRule, ParsedRuleSet};

/// Parse rule-file text into a [`ParsedRuleSet`].
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not valid syntax or a rule repeats
/// a clause. Syntax errors carry the line and column where parsing stopped.
pub fn parse(input: &str) -> Result<ParsedRuleSet, ParseError> {
    use winnow::Parser;
    let (default_offer, parsed) = grammar::parse_ruleset.parse(input).map_err(|e| {
        let (line, column) = location(input, e.offset());
        let detail = e.inner().to_string().replace('\n', "; ");
        let detail = if detail.is_empty() {
            "invalid syntax".to_owned()
        } else {
            detail
        };
        ParseError::new(format!("line {line}, column {column}: {detail}"))
    })?;
    let rules = parsed
        .into_iter()
        .map(ParsedRule::into_rule)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ParsedRuleSet {
        rules,
        default_offer,
    })
}

/// 1-based line and column of a byte offset.
fn location(input: &str, offset: usize) -> (usize, usize) {
    let before = &input[..offset.min(input.len())];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map_or(before.chars().count(), |nl| before[nl + 1..].chars().count())
        + 1;
    (line, column)
}
