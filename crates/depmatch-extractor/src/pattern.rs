//! Token constraints
//!
//! A `TokenSpec` is a conjunction of attribute predicates evaluated against
//! one annotated token. Both the dependency matcher and the sequence matcher
//! are built from these.

use serde::{Deserialize, Serialize};

use depmatch_core::Token;

/// Token attribute a predicate can test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Attr {
    Pos,
    Tag,
    Dep,
    Lemma,
    Text,
    Lower,
    IsPunct,
}

impl Attr {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pos => "POS",
            Self::Tag => "TAG",
            Self::Dep => "DEP",
            Self::Lemma => "LEMMA",
            Self::Text => "TEXT",
            Self::Lower => "LOWER",
            Self::IsPunct => "IS_PUNCT",
        }
    }

    /// String value of the attribute on a token; `None` for flag attributes
    /// and for a missing tag
    fn value(&self, token: &Token) -> Option<String> {
        match self {
            Self::Pos => Some(token.pos.clone()),
            Self::Tag => token.tag.clone(),
            Self::Dep => Some(token.dep.clone()),
            Self::Lemma => Some(token.lemma.clone()),
            Self::Text => Some(token.text.clone()),
            Self::Lower => Some(token.lower()),
            Self::IsPunct => None,
        }
    }

    fn flag(&self, token: &Token) -> Option<bool> {
        match self {
            Self::IsPunct => Some(token.is_punct()),
            _ => None,
        }
    }
}

impl std::fmt::Display for Attr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Predicate over one attribute value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Predicate {
    Equals(String),
    In(Vec<String>),
    NotIn(Vec<String>),
    Flag(bool),
}

impl Predicate {
    fn test_value(&self, value: &str) -> bool {
        match self {
            Self::Equals(expected) => value == expected,
            Self::In(options) => options.iter().any(|o| o == value),
            Self::NotIn(options) => options.iter().all(|o| o != value),
            Self::Flag(_) => false,
        }
    }
}

/// A single attribute constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub attr: Attr,
    pub predicate: Predicate,
}

impl Constraint {
    pub fn matches(&self, token: &Token) -> bool {
        match (self.attr.flag(token), &self.predicate) {
            (Some(actual), Predicate::Flag(expected)) => actual == *expected,
            (Some(_), _) => false,
            (None, predicate) => match self.attr.value(token) {
                Some(value) => predicate.test_value(&value),
                // A missing value satisfies only a negative set test
                None => matches!(predicate, Predicate::NotIn(_)),
            },
        }
    }
}

/// Conjunction of constraints on one token; an empty spec matches anything
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSpec {
    constraints: Vec<Constraint>,
}

impl TokenSpec {
    /// Spec that matches any token
    pub fn any() -> Self {
        Self::default()
    }

    /// Add a constraint
    pub fn with(mut self, attr: Attr, predicate: Predicate) -> Self {
        self.constraints.push(Constraint { attr, predicate });
        self
    }

    pub fn pos(self, pos: &str) -> Self {
        self.with(Attr::Pos, Predicate::Equals(pos.to_string()))
    }

    pub fn dep(self, dep: &str) -> Self {
        self.with(Attr::Dep, Predicate::Equals(dep.to_string()))
    }

    pub fn dep_in(self, deps: &[&str]) -> Self {
        self.with(Attr::Dep, Predicate::In(to_strings(deps)))
    }

    pub fn lemma_not_in(self, lemmas: &[&str]) -> Self {
        self.with(Attr::Lemma, Predicate::NotIn(to_strings(lemmas)))
    }

    pub fn text(self, text: &str) -> Self {
        self.with(Attr::Text, Predicate::Equals(text.to_string()))
    }

    pub fn text_in(self, texts: &[&str]) -> Self {
        self.with(Attr::Text, Predicate::In(to_strings(texts)))
    }

    pub fn lower(self, lower: &str) -> Self {
        self.with(Attr::Lower, Predicate::Equals(lower.to_lowercase()))
    }

    pub fn punct(self) -> Self {
        self.with(Attr::IsPunct, Predicate::Flag(true))
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Whether every constraint holds for the token
    pub fn matches(&self, token: &Token) -> bool {
        self.constraints.iter().all(|c| c.matches(token))
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn que() -> Token {
        Token::new(2, "que")
            .with_pos("PRON")
            .with_dep("nsubj", Some(3))
    }

    #[test]
    fn test_conjunction() {
        let spec = TokenSpec::any().dep("nsubj").lemma_not_in(&["que", "quien"]);
        assert!(!spec.matches(&que()));

        let madre = Token::new(5, "madre")
            .with_pos("NOUN")
            .with_dep("nsubj", Some(3));
        assert!(spec.matches(&madre));
        assert!(TokenSpec::any().matches(&madre));
    }

    #[test]
    fn test_punct_and_text() {
        let paren = Token::new(4, "(").with_pos("PUNCT");
        let spec = TokenSpec::any().punct().text("(");
        assert!(spec.matches(&paren));
        assert!(!spec.matches(&Token::new(4, ")").with_pos("PUNCT")));

        // Flag predicates never hold for string attributes
        let wrong = TokenSpec::any().with(Attr::Pos, Predicate::Flag(true));
        assert!(!wrong.matches(&paren));
    }

    #[test]
    fn test_lower_is_case_insensitive() {
        let spec = TokenSpec::any().lower("De");
        assert!(spec.matches(&Token::new(0, "DE")));
        assert!(spec.matches(&Token::new(0, "de")));
    }

    #[test]
    fn test_missing_tag() {
        let token = Token::new(0, "casa");
        assert!(!TokenSpec::any()
            .with(Attr::Tag, Predicate::Equals("NCFS000".into()))
            .matches(&token));
        assert!(TokenSpec::any()
            .with(Attr::Tag, Predicate::NotIn(vec!["NCFS000".into()]))
            .matches(&token));
    }
}
