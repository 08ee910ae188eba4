//! Relative clauses with an explicit antecedent
//!
//! Finds a noun modified by a clausal modifier (`acl`) and decides whether
//! the noun plays the object or the subject role inside that clause, then
//! rebuilds the clause in canonical subject-verb-object order:
//!
//! - "La comida que preparó mi madre" -> "mi madre preparar comida"
//! - "el periodista que había escrito el reportaje" -> "periodista escribir reportaje"

use serde::{Deserialize, Serialize};
use tracing::debug;

use depmatch_core::{Doc, Result};

use crate::dependency::{DepNode, DependencyMatch, DependencyMatcher, DependencyPattern, RelOp};
use crate::pattern::TokenSpec;
use crate::DocExtractor;

/// Relative pronoun lemmas that cannot stand for the clause-internal argument
const RELATIVE_PRONOUNS: [&str; 2] = ["que", "quien"];

/// Labels used for clausal modifiers of nouns
const CLAUSAL_MODIFIERS: [&str; 2] = ["acl", "acl:relcl"];

/// Left dependents kept when rendering an argument phrase
const PRENOMINAL_MODIFIERS: [&str; 3] = ["det", "amod", "nummod"];

/// Role the antecedent plays inside the relative clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClauseRole {
    /// The clause has its own subject; the antecedent is its object
    AntecedentAsObject,
    /// The clause has its own object; the antecedent is its subject
    AntecedentAsSubject,
}

impl ClauseRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AntecedentAsObject => "antecedent-as-object",
            Self::AntecedentAsSubject => "antecedent-as-subject",
        }
    }
}

impl std::fmt::Display for ClauseRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A relative clause rebuilt as subject, verb lemma and object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseReconstruction {
    pub role: ClauseRole,
    pub subject: String,
    pub verb_lemma: String,
    pub object: String,
}

impl ClauseReconstruction {
    /// One-line explanation naming each role
    pub fn explanation(&self) -> String {
        format!(
            "where \"{}\" is the subject, \"{}\" is the clause head and \"{}\" is the object",
            self.subject, self.verb_lemma, self.object
        )
    }
}

impl std::fmt::Display for ClauseReconstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.subject, self.verb_lemma, self.object)
    }
}

/// Result of looking for a relative clause in one input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClauseOutcome {
    Reconstructed(ClauseReconstruction),
    NoClause,
}

impl ClauseOutcome {
    pub fn reconstruction(&self) -> Option<&ClauseReconstruction> {
        match self {
            Self::Reconstructed(r) => Some(r),
            Self::NoClause => None,
        }
    }
}

/// Pattern registry and post-processor for relative clauses
#[derive(Debug, Clone)]
pub struct RelativeClauseExtractor {
    matcher: DependencyMatcher<ClauseRole>,
}

impl RelativeClauseExtractor {
    /// Create the extractor with both clause patterns registered
    pub fn new() -> Result<Self> {
        let mut matcher = DependencyMatcher::new();
        matcher.add(
            ClauseRole::AntecedentAsObject,
            Self::clause_pattern(ClauseRole::AntecedentAsObject, "nsubj")?,
        )?;
        matcher.add(
            ClauseRole::AntecedentAsSubject,
            Self::clause_pattern(ClauseRole::AntecedentAsSubject, "obj")?,
        )?;

        Ok(Self { matcher })
    }

    /// antecedent (NOUN) > clause_root (acl) > argument (`argument_dep`, not a relative pronoun)
    fn clause_pattern(role: ClauseRole, argument_dep: &str) -> Result<DependencyPattern> {
        DependencyPattern::new(
            role.as_str(),
            vec![
                DepNode::root("antecedent", TokenSpec::any().pos("NOUN")),
                DepNode::linked(
                    "clause_root",
                    "antecedent",
                    RelOp::Child,
                    TokenSpec::any().dep_in(&CLAUSAL_MODIFIERS),
                ),
                DepNode::linked(
                    "argument",
                    "clause_root",
                    RelOp::Child,
                    TokenSpec::any()
                        .dep(argument_dep)
                        .lemma_not_in(&RELATIVE_PRONOUNS),
                ),
            ],
        )
    }

    /// Every clause match, leftmost antecedent first
    pub fn matches(&self, doc: &Doc) -> Vec<DependencyMatch<ClauseRole>> {
        self.matcher.find(doc)
    }

    /// Rebuild the first relative clause in the document
    pub fn reconstruct(&self, doc: &Doc) -> ClauseOutcome {
        match self.matcher.first(doc) {
            Some(found) => {
                debug!(role = %found.pattern, tokens = ?found.tokens, "Relative clause found");
                ClauseOutcome::Reconstructed(Self::rebuild(doc, &found))
            }
            None => ClauseOutcome::NoClause,
        }
    }

    fn rebuild(doc: &Doc, found: &DependencyMatch<ClauseRole>) -> ClauseReconstruction {
        let antecedent = argument_phrase(doc, found.tokens[0]);
        let verb_lemma = doc
            .get(found.tokens[1])
            .map(|t| t.lemma.clone())
            .unwrap_or_default();
        let argument = argument_phrase(doc, found.tokens[2]);

        let (subject, object) = match found.pattern {
            ClauseRole::AntecedentAsObject => (argument, antecedent),
            ClauseRole::AntecedentAsSubject => (antecedent, argument),
        };

        ClauseReconstruction {
            role: found.pattern,
            subject,
            verb_lemma,
            object,
        }
    }
}

impl DocExtractor for RelativeClauseExtractor {
    type Output = ClauseOutcome;

    fn extract(&self, doc: &Doc) -> ClauseOutcome {
        self.reconstruct(doc)
    }
}

/// Head token plus its contiguous prenominal modifiers, articles dropped:
/// "mi madre" stays whole, "el reportaje" becomes "reportaje"
fn argument_phrase(doc: &Doc, head: usize) -> String {
    let mut start = head;

    while start > 0 {
        let Some(candidate) = doc.get(start - 1) else {
            break;
        };
        let is_modifier = candidate.head == Some(head)
            && PRENOMINAL_MODIFIERS.contains(&candidate.dep.as_str());
        if !is_modifier || is_article(candidate) {
            break;
        }
        start -= 1;
    }

    doc.span_text(start, head + 1)
}

fn is_article(token: &depmatch_core::Token) -> bool {
    token.has_feat("PronType", "Art")
        || (token.feats.is_none()
            && matches!(token.lower().as_str(), "el" | "la" | "los" | "las" | "lo"))
}
