//! Biographical fields from Wikipedia-style lead sentences
//!
//! Lead sentences look like
//! `Nombre Apellido (Lugar, 1 de enero de 1900 - Lugar, 2 de febrero de 1990) fue ...`.
//! Four sequence patterns find the name, the two places and the dates; the
//! matches are then consumed in document order to fill a `Biodata` record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use depmatch_core::{Doc, Result};

use crate::date::parse_spanish_date;
use crate::pattern::TokenSpec;
use crate::sequence::{SequenceElement, SequenceMatcher, SequencePattern, SpanMatch};
use crate::DocExtractor;

const PLACE_SEPARATORS: [&str; 2] = [",", ";"];
const DASHES: [&str; 3] = ["-", "–", "—"];

// ============================================================================
// Record
// ============================================================================

/// Biographical record for one sentence; unset fields are `None`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Biodata {
    pub full_name: Option<String>,
    pub birth_place: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub death_place: Option<String>,
    pub death_date: Option<NaiveDate>,
}

impl Biodata {
    /// Field labels and rendered values, in display order
    pub fn fields(&self) -> [(&'static str, Option<String>); 5] {
        [
            ("full name", self.full_name.clone()),
            ("birth place", self.birth_place.clone()),
            ("birth date", self.birth_date.map(|d| d.to_string())),
            ("death place", self.death_place.clone()),
            ("death date", self.death_date.map(|d| d.to_string())),
        ]
    }

    /// Whether no field was found
    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, value)| value.is_none())
    }
}

impl std::fmt::Display for Biodata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (label, value) in self.fields() {
            writeln!(f, "{label}: {}", value.as_deref().unwrap_or("not found"))?;
        }
        Ok(())
    }
}

// ============================================================================
// Patterns
// ============================================================================

/// Sequence patterns of the biodata registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BiodataPattern {
    FullName,
    BirthPlace,
    DeathPlace,
    Date,
}

impl BiodataPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullName => "full-name",
            Self::BirthPlace => "birth-place",
            Self::DeathPlace => "death-place",
            Self::Date => "date",
        }
    }
}

impl std::fmt::Display for BiodataPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn propn() -> TokenSpec {
    TokenSpec::any().pos("PROPN")
}

fn separator() -> TokenSpec {
    TokenSpec::any().punct().text_in(&PLACE_SEPARATORS)
}

/// City, region and country runs with optional separators between them
fn place_body() -> Vec<SequenceElement> {
    vec![
        SequenceElement::any_number(propn()),
        SequenceElement::optional(separator()),
        SequenceElement::any_number(propn()),
        SequenceElement::optional(separator()),
        SequenceElement::any_number(propn()),
    ]
}

// ============================================================================
// Extractor
// ============================================================================

/// Pattern registry and post-processor for biographical data
#[derive(Debug, Clone)]
pub struct BiodataExtractor {
    matcher: SequenceMatcher<BiodataPattern>,
}

impl BiodataExtractor {
    /// Create the extractor with all four patterns registered
    pub fn new() -> Result<Self> {
        let mut matcher = SequenceMatcher::new();

        // Name: PROPN subject followed by more PROPN, right before "("
        matcher.add(
            BiodataPattern::FullName,
            SequencePattern::new(
                BiodataPattern::FullName.as_str(),
                vec![
                    SequenceElement::one(propn().dep("nsubj")),
                    SequenceElement::any_number(propn()),
                    SequenceElement::one(TokenSpec::any().punct().text("(")),
                ],
            )?,
        )?;

        // Birth place: "(" place "," or ";" before the date
        let mut birth = vec![SequenceElement::one(TokenSpec::any().punct().text("("))];
        birth.extend(place_body());
        birth.push(SequenceElement::one(separator()));
        matcher.add(
            BiodataPattern::BirthPlace,
            SequencePattern::new(BiodataPattern::BirthPlace.as_str(), birth)?,
        )?;

        // Death place: follows the dash, no closing punctuation required
        let mut death = vec![SequenceElement::one(TokenSpec::any().punct().text_in(&DASHES))];
        death.extend(place_body());
        matcher.add(
            BiodataPattern::DeathPlace,
            SequencePattern::new(BiodataPattern::DeathPlace.as_str(), death)?,
        )?;

        // Date: NUM de NOUN de NUM
        matcher.add(
            BiodataPattern::Date,
            SequencePattern::new(
                BiodataPattern::Date.as_str(),
                vec![
                    SequenceElement::one(TokenSpec::any().pos("NUM")),
                    SequenceElement::one(TokenSpec::any().pos("ADP").lower("de")),
                    SequenceElement::one(TokenSpec::any().pos("NOUN")),
                    SequenceElement::one(TokenSpec::any().pos("ADP").lower("de")),
                    SequenceElement::one(TokenSpec::any().pos("NUM")),
                ],
            )?,
        )?;

        Ok(Self { matcher })
    }

    /// Raw pattern matches in document order
    pub fn matches(&self, doc: &Doc) -> Vec<SpanMatch<BiodataPattern>> {
        self.matcher.find(doc)
    }

    /// Fill a record from one annotated sentence.
    ///
    /// The name and each place keep their first match. Dates are assigned by
    /// position: the first date match is the birth date, the second the
    /// death date, whether or not the first one could be converted.
    pub fn extract_record(&self, doc: &Doc) -> Biodata {
        let mut record = Biodata::default();
        let mut dates_seen = 0usize;

        for found in self.matches(doc) {
            match found.pattern {
                BiodataPattern::FullName => {
                    if record.full_name.is_none() {
                        // Drop the "(" that closes the match
                        record.full_name = non_empty(doc.span_text(found.start, found.end - 1));
                    }
                }
                BiodataPattern::BirthPlace => {
                    if record.birth_place.is_none() {
                        record.birth_place = place_text(doc, found.start, found.end);
                    }
                }
                BiodataPattern::DeathPlace => {
                    if record.death_place.is_none() {
                        record.death_place = place_text(doc, found.start, found.end);
                    }
                }
                BiodataPattern::Date => {
                    let text = doc.span_text(found.start, found.end);
                    let date = match parse_spanish_date(&text) {
                        Ok(date) => date,
                        Err(e) => {
                            warn!("Skipping date '{}': {}", text, e);
                            None
                        }
                    };

                    match dates_seen {
                        0 => record.birth_date = date,
                        1 => record.death_date = date,
                        _ => debug!("Ignoring extra date '{}'", text),
                    }
                    dates_seen += 1;
                }
            }
        }

        record
    }
}

impl DocExtractor for BiodataExtractor {
    type Output = Biodata;

    fn extract(&self, doc: &Doc) -> Biodata {
        self.extract_record(doc)
    }
}

/// Span text with punctuation tokens trimmed from both ends
fn place_text(doc: &Doc, mut start: usize, mut end: usize) -> Option<String> {
    let is_punct = |i: usize| doc.get(i).map(|t| t.is_punct()).unwrap_or(false);

    while start < end && is_punct(start) {
        start += 1;
    }
    while end > start && is_punct(end - 1) {
        end -= 1;
    }

    non_empty(doc.span_text(start, end))
}

fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
