//! depmatch Core - Annotated token model, traits, and shared types
//!
//! This crate defines the core abstractions used throughout depmatch:
//! - Annotated tokens and documents produced by an external NLP pipeline
//! - The `Annotator` trait implemented by annotation backends
//! - Common error types
//! - Configuration management

pub mod config;

pub use config::{AnnotatorBackend, AnnotatorConfig, AppConfig, ConfigError, LoggingConfig};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for depmatch operations
#[derive(Error, Debug)]
pub enum DepmatchError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Annotation error: {0}")]
    Annotation(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, DepmatchError>;

impl From<ConfigError> for DepmatchError {
    fn from(err: ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

// ============================================================================
// Annotated Tokens
// ============================================================================

/// Tokens made only of Unicode punctuation (covers «», dashes, ¿¡ ...)
static PUNCT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\p{P}+$").expect("valid regex"));

/// A token annotated by the external pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Position in the document (0-based)
    pub index: usize,

    /// Surface form
    pub text: String,

    /// Lemma
    pub lemma: String,

    /// Universal part-of-speech tag (NOUN, PROPN, ...)
    pub pos: String,

    /// Language-specific tag, if the pipeline provides one
    pub tag: Option<String>,

    /// Morphological features, `Key=Value|Key=Value`
    pub feats: Option<String>,

    /// Dependency label (nsubj, obj, acl, ...)
    pub dep: String,

    /// Index of the syntactic head; `None` for a sentence root
    pub head: Option<usize>,

    /// Whether the token is followed by whitespace in the original text
    pub space_after: bool,
}

impl Token {
    /// Create a token with only its surface form; lemma defaults to the form
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            index,
            lemma: text.clone(),
            text,
            pos: "X".to_string(),
            tag: None,
            feats: None,
            dep: "dep".to_string(),
            head: None,
            space_after: true,
        }
    }

    pub fn with_lemma(mut self, lemma: impl Into<String>) -> Self {
        self.lemma = lemma.into();
        self
    }

    pub fn with_pos(mut self, pos: impl Into<String>) -> Self {
        self.pos = pos.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_feats(mut self, feats: impl Into<String>) -> Self {
        self.feats = Some(feats.into());
        self
    }

    /// Set dependency label and head in one step
    pub fn with_dep(mut self, dep: impl Into<String>, head: Option<usize>) -> Self {
        self.dep = dep.into();
        self.head = head;
        self
    }

    pub fn with_space_after(mut self, space_after: bool) -> Self {
        self.space_after = space_after;
        self
    }

    /// Lowercased surface form
    pub fn lower(&self) -> String {
        self.text.to_lowercase()
    }

    /// Punctuation by tag, or by surface form when the tagger disagrees
    pub fn is_punct(&self) -> bool {
        self.pos == "PUNCT" || PUNCT_RE.is_match(&self.text)
    }

    /// Check a single morphological feature, e.g. `has_feat("PronType", "Art")`
    pub fn has_feat(&self, key: &str, value: &str) -> bool {
        self.feats
            .as_deref()
            .map(|feats| {
                feats.split('|').any(|pair| {
                    pair.split_once('=')
                        .map(|(k, v)| k == key && v.split(',').any(|v| v == value))
                        .unwrap_or(false)
                })
            })
            .unwrap_or(false)
    }
}

// ============================================================================
// Annotated Document
// ============================================================================

/// One processed input: its text and the annotated tokens covering it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doc {
    /// Original input text
    pub text: String,

    tokens: Vec<Token>,
}

impl Doc {
    /// Build a document, checking that indices are sequential and heads
    /// point inside the document
    pub fn new(text: impl Into<String>, tokens: Vec<Token>) -> Result<Self> {
        let len = tokens.len();
        for (position, token) in tokens.iter().enumerate() {
            if token.index != position {
                return Err(DepmatchError::Annotation(format!(
                    "token '{}' has index {} at position {}",
                    token.text, token.index, position
                )));
            }
            match token.head {
                Some(head) if head >= len => {
                    return Err(DepmatchError::Annotation(format!(
                        "token '{}' points to head {} outside the document ({} tokens)",
                        token.text, head, len
                    )));
                }
                Some(head) if head == position => {
                    return Err(DepmatchError::Annotation(format!(
                        "token '{}' is its own head",
                        token.text
                    )));
                }
                _ => {}
            }
        }

        Ok(Self {
            text: text.into(),
            tokens,
        })
    }

    /// Join several sentence documents into one, re-basing token indices
    /// and heads so they stay document-wide
    pub fn concat(docs: Vec<Doc>) -> Doc {
        let mut text_parts = Vec::with_capacity(docs.len());
        let mut tokens = Vec::new();

        for doc in docs {
            let offset = tokens.len();
            text_parts.push(doc.text);
            tokens.extend(doc.tokens.into_iter().map(|mut token| {
                token.index += offset;
                token.head = token.head.map(|h| h + offset);
                token
            }));
        }

        Doc {
            text: text_parts.join(" "),
            tokens,
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Direct syntactic children of a token, in document order
    pub fn children(&self, index: usize) -> impl Iterator<Item = &Token> + '_ {
        self.tokens
            .iter()
            .filter(move |token| token.head == Some(index))
    }

    /// Heads above a token, nearest first
    pub fn ancestors(&self, index: usize) -> Vec<usize> {
        let mut result = Vec::new();
        let mut current = self.tokens.get(index).and_then(|t| t.head);

        // Guard against malformed cyclic input
        while let Some(head) = current {
            if result.contains(&head) || result.len() > self.tokens.len() {
                break;
            }
            result.push(head);
            current = self.tokens.get(head).and_then(|t| t.head);
        }

        result
    }

    /// Whether `ancestor` dominates `descendant` (transitively)
    pub fn is_ancestor(&self, ancestor: usize, descendant: usize) -> bool {
        self.ancestors(descendant).contains(&ancestor)
    }

    /// Render tokens `[start, end)` using the original spacing
    pub fn span_text(&self, start: usize, end: usize) -> String {
        let end = end.min(self.tokens.len());
        if start >= end {
            return String::new();
        }

        let mut out = String::new();
        for (offset, token) in self.tokens[start..end].iter().enumerate() {
            out.push_str(&token.text);
            if token.space_after && start + offset + 1 < end {
                out.push(' ');
            }
        }
        out
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Trait for annotation backends (tokenizer + tagger + lemmatizer + parser)
#[async_trait::async_trait]
pub trait Annotator: Send + Sync {
    /// Annotate raw text into a document
    async fn annotate(&self, text: &str) -> Result<Doc>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================
