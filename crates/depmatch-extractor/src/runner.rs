//! Matcher runner
//!
//! Ties an annotation backend to the compiled pattern registries. The
//! runner is built once and only read afterwards, so one instance serves
//! any number of sentences and the same input always yields the same output.

use std::sync::Arc;

use tracing::{debug, instrument};

use depmatch_core::{Annotator, Result};

use crate::biodata::{Biodata, BiodataExtractor};
use crate::relative::{ClauseOutcome, RelativeClauseExtractor};
use crate::DocExtractor;

/// Annotates sentences and runs the registries over them
pub struct Runner {
    annotator: Arc<dyn Annotator>,
    relative: RelativeClauseExtractor,
    biodata: BiodataExtractor,
}

impl Runner {
    /// Compile both registries around an annotator
    pub fn new(annotator: Arc<dyn Annotator>) -> Result<Self> {
        Ok(Self {
            annotator,
            relative: RelativeClauseExtractor::new()?,
            biodata: BiodataExtractor::new()?,
        })
    }

    pub fn annotator_name(&self) -> &str {
        self.annotator.name()
    }

    /// Annotate one sentence and hand it to an extractor
    pub async fn run<E: DocExtractor>(&self, extractor: &E, sentence: &str) -> Result<E::Output> {
        let doc = self.annotator.annotate(sentence).await?;
        debug!(tokens = doc.len(), annotator = self.annotator.name(), "Sentence annotated");
        Ok(extractor.extract(&doc))
    }

    /// Rebuild the first relative clause of a sentence
    #[instrument(skip(self))]
    pub async fn reconstruct_clause(&self, sentence: &str) -> Result<ClauseOutcome> {
        self.run(&self.relative, sentence).await
    }

    /// Extract biographical fields from a lead sentence
    #[instrument(skip(self))]
    pub async fn extract_biodata(&self, sentence: &str) -> Result<Biodata> {
        self.run(&self.biodata, sentence).await
    }
}
