//! depmatch Parser - Annotation backends
//!
//! Supplies annotated documents to the matchers:
//! - CoNLL-U reader for pre-parsed corpora (offline)
//! - UDPipe REST client for live annotation
//!
//! Both backends implement `depmatch_core::Annotator` and produce
//! a `Doc` whose tokens carry POS, lemma, features and dependencies.

use std::sync::Arc;

use thiserror::Error;

use depmatch_core::{Annotator, AnnotatorBackend, AnnotatorConfig, DepmatchError};

pub mod conllu;
pub mod udpipe;

pub use conllu::{parse_conllu, ConlluAnnotator};
pub use udpipe::UdpipeAnnotator;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while obtaining annotations
#[derive(Error, Debug)]
pub enum ParserError {
    /// IO error while reading a corpus file
    #[error("IO error reading file: {path}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed CoNLL-U input
    #[error("CoNLL-U error at line {line}: {message}")]
    Conllu { line: usize, message: String },

    /// Annotation service failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// Nothing to annotate
    #[error("Empty input")]
    EmptyInput,
}

pub type Result<T> = std::result::Result<T, ParserError>;

impl From<ParserError> for DepmatchError {
    fn from(err: ParserError) -> Self {
        DepmatchError::Annotation(err.to_string())
    }
}

/// Collapse runs of whitespace so lookups ignore spacing differences
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Build the annotator selected by the configuration
pub fn annotator_from_config(
    config: &AnnotatorConfig,
) -> std::result::Result<Arc<dyn Annotator>, DepmatchError> {
    config.validate()?;

    match (config.backend, &config.conllu_path) {
        (AnnotatorBackend::Conllu, Some(path)) => Ok(Arc::new(ConlluAnnotator::from_file(path)?)),
        _ => Ok(Arc::new(UdpipeAnnotator::from_config(config)?)),
    }
}
