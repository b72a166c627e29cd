use std::collections::HashSet;

use crate::types::{Bounds, OfferCatalog};
use crate::{CompileError, Rule, RuleSet};

pub(crate) fn compile(
    rules: Vec<Rule>,
    default_offer: String,
    max_rules: usize,
) -> Result<RuleSet, CompileError> {
    if rules.len() > max_rules {
        return Err(CompileError::CapacityExceeded {
            limit: max_rules,
            count: rules.len(),
        });
    }
    check_duplicates(&rules)?;
    if default_offer.trim().is_empty() {
        return Err(CompileError::EmptyOffer {
            rule: "<default>".to_owned(),
        });
    }

    let mut ruleset = RuleSet::with_capacity(rules.len(), OfferCatalog::new(default_offer));

    for rule in rules {
        check_rule(&rule)?;
        let (weight, offer) = match (rule.weight, rule.offer.as_deref()) {
            (None, _) => return Err(missing(&rule, "weight")),
            (_, None) => return Err(missing(&rule, "offer")),
            (Some(w), Some(o)) => (w, o),
        };
        if !weight.is_finite() {
            return Err(CompileError::NonFiniteWeight { rule: rule.name });
        }
        if offer.trim().is_empty() {
            return Err(CompileError::EmptyOffer { rule: rule.name });
        }
        let code = ruleset
            .catalog
            .register(offer)
            .ok_or_else(|| CompileError::TooManyOffers {
                count: ruleset.catalog.len() + 1,
            })?;

        ruleset.level.push(rule.level);
        ruleset.recency.push(rule.recency);
        ruleset.losses.push(rule.losses);
        ruleset.spend.push(rule.spend);
        ruleset.weights.push(weight);
        ruleset.offers.push(code);
        ruleset.windows.push(rule.window);
        ruleset.names.push(rule.name);
    }

    tracing::debug!(
        rules = ruleset.len(),
        offers = ruleset.catalog.len(),
        "compiled rule set"
    );
    Ok(ruleset)
}

fn missing(rule: &Rule, field: &'static str) -> CompileError {
    CompileError::MissingField {
        rule: rule.name.clone(),
        field,
    }
}

fn check_duplicates(rules: &[Rule]) -> Result<(), CompileError> {
    let mut seen = HashSet::new();
    for rule in rules {
        if !seen.insert(&rule.name) {
            return Err(CompileError::DuplicateRule {
                name: rule.name.clone(),
            });
        }
    }
    Ok(())
}

fn check_rule(rule: &Rule) -> Result<(), CompileError> {
    check_bounds(rule, "level", rule.level)?;
    check_bounds(rule, "recency", rule.recency)?;
    check_bounds(rule, "losses", rule.losses)?;
    if let Some(window) = rule.window {
        if window.start > window.end {
            return Err(CompileError::InvalidWindow {
                rule: rule.name.clone(),
                start: window.start,
                end: window.end,
            });
        }
    }
    Ok(())
}

fn check_bounds(rule: &Rule, condition: &'static str, bounds: Bounds) -> Result<(), CompileError> {
    if bounds.is_valid() {
        Ok(())
    } else {
        Err(CompileError::InvalidBounds {
            rule: rule.name.clone(),
            condition,
            min: bounds.min,
            max: bounds.max,
        })
    }
}
