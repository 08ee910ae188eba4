//! Token sequence matcher
//!
//! Matches ordered `TokenSpec`s with quantifiers over linear token order.
//! For each pattern and start position the matcher reports the longest
//! span the pattern accepts there.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use depmatch_core::{DepmatchError, Doc, Result};

use crate::pattern::TokenSpec;

/// How many consecutive tokens an element consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quantifier {
    /// Exactly one
    One,
    /// `?`
    ZeroOrOne,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
}

impl Quantifier {
    fn optional(&self) -> bool {
        matches!(self, Self::ZeroOrOne | Self::ZeroOrMore)
    }

    fn repeats(&self) -> bool {
        matches!(self, Self::ZeroOrMore | Self::OneOrMore)
    }
}

/// One element of a sequence pattern
#[derive(Debug, Clone)]
pub struct SequenceElement {
    pub spec: TokenSpec,
    pub quantifier: Quantifier,
}

impl SequenceElement {
    pub fn one(spec: TokenSpec) -> Self {
        Self {
            spec,
            quantifier: Quantifier::One,
        }
    }

    pub fn optional(spec: TokenSpec) -> Self {
        Self {
            spec,
            quantifier: Quantifier::ZeroOrOne,
        }
    }

    pub fn any_number(spec: TokenSpec) -> Self {
        Self {
            spec,
            quantifier: Quantifier::ZeroOrMore,
        }
    }

    pub fn at_least_one(spec: TokenSpec) -> Self {
        Self {
            spec,
            quantifier: Quantifier::OneOrMore,
        }
    }
}

/// A validated sequence pattern
#[derive(Debug, Clone)]
pub struct SequencePattern {
    label: String,
    elements: Vec<SequenceElement>,
}

impl SequencePattern {
    /// A pattern needs at least one non-optional element so it can never
    /// match an empty span
    pub fn new(label: impl Into<String>, elements: Vec<SequenceElement>) -> Result<Self> {
        let label = label.into();
        if elements.iter().all(|e| e.quantifier.optional()) {
            return Err(DepmatchError::InvalidPattern {
                pattern: label,
                reason: "pattern must contain a non-optional element".to_string(),
            });
        }

        Ok(Self { label, elements })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// States reachable from `states` without consuming a token
    fn closure(&self, states: BTreeSet<usize>) -> BTreeSet<usize> {
        let mut result = BTreeSet::new();
        let mut stack: Vec<usize> = states.into_iter().collect();

        while let Some(state) = stack.pop() {
            if !result.insert(state) {
                continue;
            }
            if let Some(element) = self.elements.get(state) {
                if element.quantifier.optional() {
                    stack.push(state + 1);
                }
            }
        }

        result
    }

    /// End (exclusive) of the longest match starting at `start`
    pub fn longest_match_at(&self, doc: &Doc, start: usize) -> Option<usize> {
        let accept = self.elements.len();
        let tokens = doc.tokens();

        let mut states = self.closure(BTreeSet::from([0]));
        let mut position = start;
        let mut best = None;

        loop {
            if states.contains(&accept) {
                best = Some(position);
            }
            if position >= tokens.len() || states.is_empty() {
                break;
            }

            let token = &tokens[position];
            let mut next = BTreeSet::new();
            for &state in states.iter().filter(|&&s| s < accept) {
                let element = &self.elements[state];
                if element.spec.matches(token) {
                    next.insert(state + 1);
                    if element.quantifier.repeats() {
                        next.insert(state);
                    }
                }
            }

            states = self.closure(next);
            position += 1;
        }

        // Every pattern has a required element, so an accepted span is non-empty
        best.filter(|&end| end > start)
    }
}

/// A matched span `[start, end)` with its pattern key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanMatch<K> {
    pub pattern: K,
    pub start: usize,
    pub end: usize,
}

/// Registry of keyed sequence patterns
#[derive(Debug, Clone)]
pub struct SequenceMatcher<K> {
    patterns: Vec<(K, SequencePattern)>,
}

impl<K> Default for SequenceMatcher<K> {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }
}

impl<K> SequenceMatcher<K>
where
    K: Copy + Eq + std::fmt::Display,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pattern; each key may be registered once
    pub fn add(&mut self, key: K, pattern: SequencePattern) -> Result<()> {
        if self.patterns.iter().any(|(k, _)| *k == key) {
            return Err(DepmatchError::InvalidPattern {
                pattern: key.to_string(),
                reason: "pattern key already registered".to_string(),
            });
        }
        self.patterns.push((key, pattern));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Longest match per pattern and start, in document order
    /// (start, then registration order)
    pub fn find(&self, doc: &Doc) -> Vec<SpanMatch<K>> {
        let mut matches = Vec::new();

        for start in 0..doc.len() {
            for (key, pattern) in &self.patterns {
                if let Some(end) = pattern.longest_match_at(doc, start) {
                    debug!(
                        pattern = %key,
                        start,
                        end,
                        "Sequence pattern matched: {}",
                        doc.span_text(start, end)
                    );
                    matches.push(SpanMatch {
                        pattern: *key,
                        start,
                        end,
                    });
                }
            }
        }

        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depmatch_core::Token;

    fn propn(index: usize, text: &str) -> Token {
        Token::new(index, text).with_pos("PROPN")
    }

    fn punct(index: usize, text: &str) -> Token {
        Token::new(index, text).with_pos("PUNCT")
    }

    /// "( Villa Cañás , Santa Fe ; 23"
    fn doc() -> Doc {
        Doc::new(
            "(Villa Cañás, Santa Fe; 23",
            vec![
                punct(0, "(").with_space_after(false),
                propn(1, "Villa"),
                propn(2, "Cañás").with_space_after(false),
                punct(3, ","),
                propn(4, "Santa"),
                propn(5, "Fe").with_space_after(false),
                punct(6, ";"),
                Token::new(7, "23").with_pos("NUM"),
            ],
        )
        .unwrap()
    }

    fn separator() -> TokenSpec {
        TokenSpec::any().punct().text_in(&[",", ";"])
    }

    fn place_pattern() -> SequencePattern {
        SequencePattern::new(
            "place",
            vec![
                SequenceElement::one(TokenSpec::any().punct().text("(")),
                SequenceElement::any_number(TokenSpec::any().pos("PROPN")),
                SequenceElement::optional(separator()),
                SequenceElement::any_number(TokenSpec::any().pos("PROPN")),
                SequenceElement::one(separator()),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_longest_match() {
        let pattern = place_pattern();
        // "( Villa Cañás ," also matches; the longest span wins
        assert_eq!(pattern.longest_match_at(&doc(), 0), Some(7));
        assert_eq!(pattern.longest_match_at(&doc(), 1), None);
    }

    #[test]
    fn test_one_or_more() {
        let pattern = SequencePattern::new(
            "names",
            vec![SequenceElement::at_least_one(TokenSpec::any().pos("PROPN"))],
        )
        .unwrap();

        assert_eq!(pattern.longest_match_at(&doc(), 0), None);
        assert_eq!(pattern.longest_match_at(&doc(), 1), Some(3));
        assert_eq!(pattern.longest_match_at(&doc(), 4), Some(6));
    }

    #[test]
    fn test_rejects_all_optional() {
        let result = SequencePattern::new(
            "optional",
            vec![SequenceElement::any_number(TokenSpec::any())],
        );
        assert!(matches!(result, Err(DepmatchError::InvalidPattern { .. })));
    }

    #[test]
    fn test_matcher_document_order() {
        let names = SequencePattern::new(
            "names",
            vec![SequenceElement::at_least_one(TokenSpec::any().pos("PROPN"))],
        )
        .unwrap();

        let mut matcher = SequenceMatcher::new();
        matcher.add("place", place_pattern()).unwrap();
        matcher.add("names", names.clone()).unwrap();
        assert!(matcher.add("names", names).is_err());

        let found: Vec<(&str, usize, usize)> = matcher
            .find(&doc())
            .into_iter()
            .map(|m| (m.pattern, m.start, m.end))
            .collect();

        assert_eq!(
            found,
            vec![
                ("place", 0, 7),
                ("names", 1, 3),
                ("names", 2, 3),
                ("names", 4, 6),
                ("names", 5, 6)
            ]
        );
    }
}
