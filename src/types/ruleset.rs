use std::fmt;
use std::sync::atomic::AtomicBool;

use super::bounds::{Bounds, Window};
use super::catalog::{OfferCatalog, DEFAULT_OFFER};
use super::error::CompileError;
use super::evaluation_report::EvaluationReport;
use super::outcome::{MatchResult, OfferCode};
use super::player::PlayerAttributes;
use super::rule::Rule;
use super::spend::SpendCondition;

/// Upper bound on rule count unless overridden with
/// [`RuleSetBuilder::max_rules`].
pub const DEFAULT_MAX_RULES: usize = 4096;

/// Builder for constructing a [`RuleSet`].
///
/// Rules are kept in insertion order, which is also the tie-break order:
/// among equally weighted matches the earliest rule wins.
///
/// # Example
///
/// ```
/// use offer_match::{PlayerAttributes, RuleSetBuilder, SpendCondition};
///
/// let ruleset = RuleSetBuilder::new()
///     .rule("starter", |r| r.level(1, 10).recency(0, 30).losses(0, 5).weight(1.0).offer("A"))
///     .rule("veteran", |r| {
///         r.level(5, 10)
///             .recency(0, 30)
///             .losses(0, 5)
///             .spend(SpendCondition::Ignore)
///             .weight(2.0)
///             .offer("B")
///     })
///     .compile()
///     .unwrap();
///
/// let result = ruleset.evaluate(&PlayerAttributes::new(7, 10, 1, false));
/// assert_eq!(ruleset.offer(result), "B");
/// ```
#[derive(Debug)]
pub struct RuleSetBuilder {
    rules: Vec<Rule>,
    default_offer: String,
    max_rules: usize,
}

/// Intermediate builder passed to the rule definition closure.
#[derive(Debug)]
pub struct RuleBuilder {
    rule: Rule,
}

impl Default for RuleSetBuilder {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            default_offer: DEFAULT_OFFER.to_owned(),
            max_rules: DEFAULT_MAX_RULES,
        }
    }
}

impl RuleSetBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a rule. The closure must set `.weight()` and `.offer()`;
    /// otherwise compilation fails with [`CompileError::MissingField`].
    #[must_use]
    pub fn rule(mut self, name: &str, f: impl FnOnce(RuleBuilder) -> RuleBuilder) -> Self {
        let builder = f(RuleBuilder {
            rule: Rule::new(name),
        });
        self.rules.push(builder.rule);
        self
    }

    /// Append an already assembled rule.
    #[must_use]
    pub fn push(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Label returned when no rule matches. Defaults to `"default_offer"`.
    #[must_use]
    pub fn default_offer(mut self, label: impl Into<String>) -> Self {
        self.default_offer = label.into();
        self
    }

    /// Maximum number of rules accepted by [`compile`](Self::compile).
    #[must_use]
    pub fn max_rules(mut self, limit: usize) -> Self {
        self.max_rules = limit;
        self
    }

    /// Validate the rules and lay them out as an immutable `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] if validation fails.
    pub fn compile(self) -> Result<RuleSet, CompileError> {
        crate::compile::compile(self.rules, self.default_offer, self.max_rules)
    }
}

impl RuleBuilder {
    #[must_use]
    pub fn level(mut self, min: i64, max: i64) -> Self {
        self.rule.level = Bounds::new(min, max);
        self
    }

    /// Inclusive range on days since the last purchase.
    #[must_use]
    pub fn recency(mut self, min: i64, max: i64) -> Self {
        self.rule.recency = Bounds::new(min, max);
        self
    }

    /// Inclusive range on matches lost.
    #[must_use]
    pub fn losses(mut self, min: i64, max: i64) -> Self {
        self.rule.losses = Bounds::new(min, max);
        self
    }

    #[must_use]
    pub fn spend(mut self, condition: SpendCondition) -> Self {
        self.rule.spend = condition;
        self
    }

    #[must_use]
    pub fn weight(mut self, weight: f64) -> Self {
        self.rule.weight = Some(weight);
        self
    }

    #[must_use]
    pub fn offer(mut self, label: impl Into<String>) -> Self {
        self.rule.offer = Some(label.into());
        self
    }

    /// Restrict the rule to an inclusive window of Unix timestamps. Only the
    /// `*_at` evaluation methods look at it.
    #[must_use]
    pub fn active(mut self, start: i64, end: i64) -> Self {
        self.rule.window = Some(Window::new(start, end));
        self
    }
}

/// A compiled, immutable rule set. Thread-safe and designed to live behind `Arc`.
///
/// Storage is column-oriented: every condition has its own vector, all indexed
/// by rule position. To reload rules, compile a new `RuleSet` and swap the
/// `Arc` between evaluation passes.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub(crate) names: Vec<String>,
    pub(crate) level: Vec<Bounds>,
    pub(crate) recency: Vec<Bounds>,
    pub(crate) losses: Vec<Bounds>,
    pub(crate) spend: Vec<SpendCondition>,
    pub(crate) weights: Vec<f64>,
    pub(crate) offers: Vec<OfferCode>,
    pub(crate) windows: Vec<Option<Window>>,
    pub(crate) catalog: OfferCatalog,
}

impl RuleSet {
    pub(crate) fn with_capacity(capacity: usize, catalog: OfferCatalog) -> Self {
        Self {
            names: Vec::with_capacity(capacity),
            level: Vec::with_capacity(capacity),
            recency: Vec::with_capacity(capacity),
            losses: Vec::with_capacity(capacity),
            spend: Vec::with_capacity(capacity),
            weights: Vec::with_capacity(capacity),
            offers: Vec::with_capacity(capacity),
            windows: Vec::with_capacity(capacity),
            catalog,
        }
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Rule names in rule order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.names.iter().map(String::as_str).collect()
    }

    /// Reassemble the rule at `index`, or `None` if out of range.
    #[must_use]
    pub fn rule(&self, index: usize) -> Option<Rule> {
        let name = self.names.get(index)?;
        Some(Rule {
            name: name.clone(),
            level: self.level[index],
            recency: self.recency[index],
            losses: self.losses[index],
            spend: self.spend[index],
            weight: Some(self.weights[index]),
            offer: Some(self.catalog.label(self.offers[index]).to_owned()),
            window: self.windows[index],
        })
    }

    #[must_use]
    pub fn catalog(&self) -> &OfferCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn default_offer(&self) -> &str {
        self.catalog.default_label()
    }

    /// Select the highest-weight rule whose conditions all hold for `player`.
    ///
    /// Validity windows are not consulted; see [`evaluate_at`](Self::evaluate_at).
    pub fn evaluate(&self, player: &PlayerAttributes) -> MatchResult {
        crate::evaluate::select(self, player, None)
    }

    /// Like [`evaluate`](Self::evaluate), but rules whose validity window does
    /// not contain `now` (Unix seconds) are skipped.
    pub fn evaluate_at(&self, player: &PlayerAttributes, now: i64) -> MatchResult {
        crate::evaluate::select(self, player, Some(now))
    }

    /// Evaluate with diagnostics: which rules were candidates, the first
    /// failing condition of every other rule, and timing information.
    pub fn evaluate_detailed(
        &self,
        player: &PlayerAttributes,
        now: Option<i64>,
    ) -> EvaluationReport {
        crate::evaluate::evaluate_detailed(self, player, now)
    }

    /// The offer label for a result: the winning rule's own label, or the
    /// default label for [`MatchResult::NoMatch`].
    #[must_use]
    pub fn offer(&self, result: MatchResult) -> &str {
        self.label(self.offer_code(result))
    }

    /// The compact offer code for a result.
    #[must_use]
    pub fn offer_code(&self, result: MatchResult) -> OfferCode {
        result
            .rule_index()
            .and_then(|idx| self.offers.get(idx).copied())
            .unwrap_or(OfferCode::DEFAULT)
    }

    /// Resolve an offer code produced by this rule set.
    #[must_use]
    pub fn label(&self, code: OfferCode) -> &str {
        self.catalog.label(code)
    }

    /// Evaluate every player independently. Results are in input order.
    #[must_use]
    pub fn evaluate_batch(&self, players: &[PlayerAttributes]) -> Vec<MatchResult> {
        crate::batch::evaluate_batch(self, players, None)
    }

    /// Temporal form of [`evaluate_batch`](Self::evaluate_batch).
    #[must_use]
    pub fn evaluate_batch_at(&self, players: &[PlayerAttributes], now: i64) -> Vec<MatchResult> {
        crate::batch::evaluate_batch(self, players, Some(now))
    }

    /// Evaluate every player and return compact offer codes, resolvable with
    /// [`label`](Self::label).
    #[must_use]
    pub fn offer_codes(&self, players: &[PlayerAttributes]) -> Vec<OfferCode> {
        crate::batch::offer_codes(self, players, None)
    }

    /// Temporal form of [`offer_codes`](Self::offer_codes).
    #[must_use]
    pub fn offer_codes_at(&self, players: &[PlayerAttributes], now: i64) -> Vec<OfferCode> {
        crate::batch::offer_codes(self, players, Some(now))
    }

    /// Batch evaluation that checks `cancel` before each chunk of
    /// [`BATCH_CHUNK`](crate::BATCH_CHUNK) players.
    ///
    /// Returns `None` if the flag was observed set. A chunk that has started
    /// always runs to completion.
    #[must_use]
    pub fn evaluate_batch_cancellable(
        &self,
        players: &[PlayerAttributes],
        now: Option<i64>,
        cancel: &AtomicBool,
    ) -> Option<Vec<MatchResult>> {
        crate::batch::evaluate_batch_cancellable(self, players, now, cancel)
    }

    /// Parse the text rule format and compile into a `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`OfferError`](crate::OfferError) on parse or compile failure.
    pub fn from_dsl(input: &str) -> Result<Self, crate::OfferError> {
        let parsed = crate::parse::parse(input)?;
        Ok(parsed.into_builder().compile()?)
    }

    /// Read a text rule file and compile into a `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`OfferError`](crate::OfferError) on I/O, parse, or compile failure.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::OfferError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)?;
        let ruleset = Self::from_dsl(&input)?;
        tracing::info!(path = %path.display(), rules = ruleset.len(), "loaded rule file");
        Ok(ruleset)
    }
}

#[cfg(feature = "json")]
impl RuleSet {
    /// Parse a JSON rule configuration and compile into a `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`OfferError`](crate::OfferError) on malformed JSON or compile failure.
    pub fn from_json(input: &str) -> Result<Self, crate::OfferError> {
        let config: crate::config::RulesConfig = serde_json::from_str(input)?;
        Ok(config.into_builder()?.compile()?)
    }

    /// Read a JSON rule configuration file and compile into a `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`OfferError`](crate::OfferError) on I/O, JSON, or compile failure.
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::OfferError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)?;
        let ruleset = Self::from_json(&input)?;
        tracing::info!(path = %path.display(), rules = ruleset.len(), "loaded JSON rule config");
        Ok(ruleset)
    }
}

#[cfg(feature = "binary-cache")]
impl RuleSet {
    /// Serialize this compiled rule set to a byte vector.
    ///
    /// The optional `source_text` is hashed (BLAKE3) and embedded in the
    /// payload metadata, so callers can tell when the cache is stale.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) if encoding fails.
    pub fn to_bytes(
        &self,
        source_text: Option<&str>,
    ) -> Result<Vec<u8>, crate::serial::SerializeError> {
        crate::serial::encode(self, source_text)
    }

    /// Deserialize a rule set previously produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// format, integrity, or validation failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::serial::DeserializeError> {
        crate::serial::decode(bytes)
    }

    /// Whether a cached blob was produced from exactly `source_text`.
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) if the
    /// blob itself is unreadable.
    pub fn cached_source_matches(
        bytes: &[u8],
        source_text: &str,
    ) -> Result<bool, crate::serial::DeserializeError> {
        crate::serial::source_matches(bytes, source_text)
    }

    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) on
    /// encoding or I/O failure.
    pub fn to_binary_file(
        &self,
        path: impl AsRef<std::path::Path>,
        source_text: Option<&str>,
    ) -> Result<(), crate::serial::SerializeError> {
        let bytes = self.to_bytes(source_text)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// I/O, format, integrity, or validation failure.
    pub fn from_binary_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, crate::serial::DeserializeError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RuleSet({} rules, {} offers, default '{}')",
            self.len(),
            self.catalog.len(),
            self.catalog.default_label(),
        )
    }
}
