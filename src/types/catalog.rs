use std::collections::HashMap;

use super::outcome::OfferCode;

pub const DEFAULT_OFFER: &str = "default_offer";

/// Interned offer labels, numbered in the order rules first mention them.
///
/// Built during compilation. Each rule stores the [`OfferCode`] of its own
/// label, so batch evaluation can emit compact codes and resolve labels
/// later.
#[derive(Debug, Clone)]
pub struct OfferCatalog {
    labels: Vec<String>,
    codes: HashMap<String, u16>,
    default_label: String,
}

impl OfferCatalog {
    pub(crate) fn new(default_label: impl Into<String>) -> Self {
        Self {
            labels: Vec::new(),
            codes: HashMap::new(),
            default_label: default_label.into(),
        }
    }

    /// Intern a label, returning its code. Returns `None` once the code space
    /// is exhausted (the last value is reserved for the default).
    pub(crate) fn register(&mut self, label: &str) -> Option<OfferCode> {
        if let Some(&code) = self.codes.get(label) {
            return Some(OfferCode(code));
        }
        let code = u16::try_from(self.labels.len())
            .ok()
            .filter(|&c| c != OfferCode::DEFAULT.0)?;
        self.labels.push(label.to_owned());
        self.codes.insert(label.to_owned(), code);
        Some(OfferCode(code))
    }

    /// Look up the code for a label. The default label maps to
    /// [`OfferCode::DEFAULT`] unless a rule also uses it.
    #[must_use]
    pub fn code_of(&self, label: &str) -> Option<OfferCode> {
        match self.codes.get(label) {
            Some(&code) => Some(OfferCode(code)),
            None if label == self.default_label => Some(OfferCode::DEFAULT),
            None => None,
        }
    }

    /// Resolve a code to its label. Unknown codes resolve to the default label.
    #[must_use]
    pub fn label(&self, code: OfferCode) -> &str {
        code.index()
            .and_then(|idx| self.labels.get(idx))
            .map_or(self.default_label.as_str(), String::as_str)
    }

    #[must_use]
    pub fn default_label(&self) -> &str {
        &self.default_label
    }

    /// Number of distinct rule labels (the default label is not counted).
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterate over `(code, label)` pairs in code order.
    pub fn iter(&self) -> impl Iterator<Item = (OfferCode, &str)> {
        self.labels
            .iter()
            .enumerate()
            .map(|(i, l)| (OfferCode(i as u16), l.as_str()))
    }

    #[cfg(feature = "binary-cache")]
    pub(crate) fn from_labels(labels: Vec<String>, default_label: String) -> Option<Self> {
        let mut catalog = Self::new(default_label);
        for label in &labels {
            catalog.register(label)?;
        }
        (catalog.labels.len() == labels.len()).then_some(catalog)
    }

    #[cfg(feature = "binary-cache")]
    pub(crate) fn labels(&self) -> &[String] {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup() {
        let mut cat = OfferCatalog::new(DEFAULT_OFFER);
        let code = cat.register("discount").unwrap();
        assert_eq!(code, OfferCode(0));
        assert_eq!(cat.code_of("discount"), Some(code));
        assert_eq!(cat.label(code), "discount");
    }

    #[test]
    fn duplicate_register_returns_same_code() {
        let mut cat = OfferCatalog::new(DEFAULT_OFFER);
        let a = cat.register("discount").unwrap();
        let b = cat.register("discount").unwrap();
        assert_eq!(a, b);
        assert_eq!(cat.len(), 1);
    }

    #[test]
    fn codes_follow_first_seen_order() {
        let mut cat = OfferCatalog::new(DEFAULT_OFFER);
        cat.register("b").unwrap();
        cat.register("a").unwrap();
        cat.register("b").unwrap();
        let pairs: Vec<_> = cat.iter().collect();
        assert_eq!(pairs, vec![(OfferCode(0), "b"), (OfferCode(1), "a")]);
    }

    #[test]
    fn default_code_resolves_to_default_label() {
        let cat = OfferCatalog::new("fallback");
        assert_eq!(cat.label(OfferCode::DEFAULT), "fallback");
        assert_eq!(cat.code_of("fallback"), Some(OfferCode::DEFAULT));
        assert_eq!(cat.code_of("missing"), None);
    }

    #[test]
    fn empty_catalog() {
        let cat = OfferCatalog::new(DEFAULT_OFFER);
        assert!(cat.is_empty());
        assert_eq!(cat.default_label(), DEFAULT_OFFER);
    }
}
