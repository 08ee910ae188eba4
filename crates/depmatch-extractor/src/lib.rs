//! depmatch Extractor - Pattern matching over dependency parses
//!
//! Implements the two Spanish extraction tasks on top of annotated
//! documents:
//! - Relative clauses with an explicit antecedent, rebuilt in
//!   subject-verb-object order
//! - Biographical fields (name, birth/death place and date) from
//!   Wikipedia-style lead sentences

use depmatch_core::Doc;

/// Trait for post-processors that turn an annotated document into a
/// domain result
pub trait DocExtractor: Send + Sync {
    type Output;

    fn extract(&self, doc: &Doc) -> Self::Output;
}

pub mod biodata;
pub mod date;
pub mod dependency;
pub mod pattern;
pub mod relative;
pub mod runner;
pub mod sequence;

pub use biodata::{Biodata, BiodataExtractor, BiodataPattern};
pub use date::parse_spanish_date;
pub use dependency::{DepNode, DependencyMatch, DependencyMatcher, DependencyPattern, RelOp};
pub use pattern::{Attr, Predicate, TokenSpec};
pub use relative::{ClauseOutcome, ClauseReconstruction, ClauseRole, RelativeClauseExtractor};
pub use runner::Runner;
pub use sequence::{Quantifier, SequenceElement, SequenceMatcher, SequencePattern, SpanMatch};
