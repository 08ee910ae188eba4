//! CoNLL-U reader
//!
//! Parses the ten-column CoNLL-U format into `Doc`s. Sentences are grouped
//! into documents by `# newdoc` markers; a file without markers yields one
//! document per sentence. Multiword token ranges (`1-2`) and empty nodes
//! (`1.1`) are skipped, so token indices always follow the syntactic words.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use depmatch_core::{Annotator, DepmatchError, Doc, Token};
use tracing::warn;

use crate::{normalize_text, ParserError, Result};

const COLUMNS: usize = 10;

/// One sentence as read from the file
struct SentenceBlock {
    starts_document: bool,
    doc: Doc,
}

/// Accumulates lines of the sentence being read
#[derive(Default)]
struct SentenceBuilder {
    text: Option<String>,
    tokens: Vec<Token>,
    starts_document: bool,
    first_line: usize,
}

impl SentenceBuilder {
    fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn finish(self) -> Result<SentenceBlock> {
        let line = self.first_line;
        let mut doc = Doc::new(self.text.clone().unwrap_or_default(), self.tokens).map_err(
            |e| ParserError::Conllu {
                line,
                message: e.to_string(),
            },
        )?;
        if self.text.is_none() {
            doc.text = doc.span_text(0, doc.len());
        }

        Ok(SentenceBlock {
            starts_document: self.starts_document,
            doc,
        })
    }
}

/// Parse CoNLL-U content into documents
pub fn parse_conllu(input: &str) -> Result<Vec<Doc>> {
    let mut sentences = Vec::new();
    let mut current = SentenceBuilder::default();
    let mut pending_newdoc = false;

    for (number, raw_line) in input.lines().enumerate() {
        let line_no = number + 1;
        let line = raw_line.trim_end_matches('\r');

        if line.trim().is_empty() {
            if !current.is_empty() {
                sentences.push(std::mem::take(&mut current).finish()?);
            }
            continue;
        }

        if let Some(comment) = line.strip_prefix('#') {
            let comment = comment.trim();
            if comment.starts_with("newdoc") {
                pending_newdoc = true;
            } else if let Some(text) = comment.strip_prefix("text") {
                if let Some(text) = text.trim_start().strip_prefix('=') {
                    current.text = Some(text.trim().to_string());
                }
            }
            continue;
        }

        if current.is_empty() {
            current.first_line = line_no;
            if pending_newdoc {
                current.starts_document = true;
                pending_newdoc = false;
            }
        }

        if let Some(token) = parse_token_line(line, line_no, current.tokens.len())? {
            current.tokens.push(token);
        }
    }

    if !current.is_empty() {
        sentences.push(current.finish()?);
    }

    Ok(group_documents(sentences))
}

/// Parse one token line; `None` for multiword ranges and empty nodes
fn parse_token_line(line: &str, line_no: usize, position: usize) -> Result<Option<Token>> {
    let columns: Vec<&str> = line.split('\t').collect();
    if columns.len() != COLUMNS {
        return Err(ParserError::Conllu {
            line: line_no,
            message: format!("expected {COLUMNS} tab-separated columns, found {}", columns.len()),
        });
    }

    let id = columns[0];
    if id.contains('-') || id.contains('.') {
        return Ok(None);
    }

    let id: usize = id.parse().map_err(|_| ParserError::Conllu {
        line: line_no,
        message: format!("invalid token id '{id}'"),
    })?;
    if id != position + 1 {
        return Err(ParserError::Conllu {
            line: line_no,
            message: format!("token id {id} out of sequence, expected {}", position + 1),
        });
    }

    let form = columns[1];
    // HEAD is 1-based; 0 marks the root
    let head = match columns[6] {
        "_" => None,
        value => {
            let head: usize = value.parse().map_err(|_| ParserError::Conllu {
                line: line_no,
                message: format!("invalid head '{value}'"),
            })?;
            head.checked_sub(1)
        }
    };

    let mut token = Token::new(position, form)
        .with_lemma(non_empty(columns[2]).unwrap_or(form))
        .with_pos(non_empty(columns[3]).unwrap_or("X"))
        .with_dep(non_empty(columns[7]).unwrap_or("dep"), head)
        .with_space_after(!columns[9].split('|').any(|item| item == "SpaceAfter=No"));

    if let Some(tag) = non_empty(columns[4]) {
        token = token.with_tag(tag);
    }
    if let Some(feats) = non_empty(columns[5]) {
        token = token.with_feats(feats);
    }

    Ok(Some(token))
}

fn non_empty(value: &str) -> Option<&str> {
    match value {
        "_" | "" => None,
        other => Some(other),
    }
}

fn group_documents(sentences: Vec<SentenceBlock>) -> Vec<Doc> {
    let has_markers = sentences.iter().any(|s| s.starts_document);
    if !has_markers {
        return sentences.into_iter().map(|s| s.doc).collect();
    }

    let mut documents: Vec<Vec<Doc>> = Vec::new();
    for sentence in sentences {
        match documents.last_mut() {
            Some(group) if !sentence.starts_document => group.push(sentence.doc),
            _ => documents.push(vec![sentence.doc]),
        }
    }

    documents.into_iter().map(Doc::concat).collect()
}

// ============================================================================
// Offline annotator
// ============================================================================

/// Serves annotations from a pre-parsed CoNLL-U corpus
#[derive(Debug, Clone)]
pub struct ConlluAnnotator {
    documents: Vec<Doc>,
    /// Normalized text -> document position
    lookup: HashMap<String, usize>,
}

impl ConlluAnnotator {
    /// Build from CoNLL-U content
    pub fn from_conllu(content: &str) -> Result<Self> {
        let documents = parse_conllu(content)?;
        let mut lookup = HashMap::with_capacity(documents.len());
        for (position, doc) in documents.iter().enumerate() {
            match lookup.entry(normalize_text(&doc.text)) {
                Entry::Occupied(entry) => {
                    warn!(
                        "Duplicate CoNLL-U text at document {}, keeping document {}: {}",
                        position,
                        entry.get(),
                        entry.key()
                    );
                }
                Entry::Vacant(entry) => {
                    entry.insert(position);
                }
            }
        }

        Ok(Self { documents, lookup })
    }

    /// Build from a CoNLL-U file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ParserError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_conllu(&content)
    }

    /// Texts of every document in the corpus, in file order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(|doc| doc.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl Annotator for ConlluAnnotator {
    async fn annotate(&self, text: &str) -> depmatch_core::Result<Doc> {
        let key = normalize_text(text);
        if key.is_empty() {
            return Err(ParserError::EmptyInput.into());
        }

        self.lookup
            .get(&key)
            .map(|&position| self.documents[position].clone())
            .ok_or_else(|| {
                DepmatchError::NotFound(format!("no CoNLL-U annotation for '{key}'"))
            })
    }

    fn name(&self) -> &str {
        "conllu"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# newdoc
# text = Estoy contenta.
1\tEstoy\testar\tAUX\t_\tMood=Ind\t0\tROOT\t_\t_
2\tcontenta\tcontento\tADJ\t_\tGender=Fem\t1\tobj\t_\tSpaceAfter=No
3\t.\t.\tPUNCT\t_\t_\t1\tpunct\t_\t_

# text = Voy al cine.
1\tVoy\tir\tVERB\t_\t_\t0\tROOT\t_\t_
2-3\tal\t_\t_\t_\t_\t_\t_\t_\t_
2\ta\ta\tADP\t_\t_\t4\tcase\t_\t_
3\tel\tel\tDET\t_\tPronType=Art\t4\tdet\t_\t_
4\tcine\tcine\tNOUN\t_\t_\t1\tobl\t_\tSpaceAfter=No
5\t.\t.\tPUNCT\t_\t_\t1\tpunct\t_\t_

# newdoc
1\tHola\thola\tINTJ\t_\t_\t0\tROOT\t_\t_
";

    #[test]
    fn test_parse_groups_documents() {
        let docs = parse_conllu(SAMPLE).unwrap();
        assert_eq!(docs.len(), 2);

        let first = &docs[0];
        assert_eq!(first.text, "Estoy contenta. Voy al cine.");
        assert_eq!(first.len(), 8);
        // Second sentence heads are re-based after the first three tokens
        assert_eq!(first.get(3).unwrap().head, None);
        assert_eq!(first.get(4).unwrap().text, "a");
        assert_eq!(first.get(4).unwrap().head, Some(6));
        assert!(first.get(5).unwrap().has_feat("PronType", "Art"));
        assert!(!first.get(1).unwrap().space_after);

        // Text rebuilt from tokens when there is no `# text` comment
        assert_eq!(docs[1].text, "Hola");
    }

    #[test]
    fn test_parse_without_markers_splits_sentences() {
        let content = SAMPLE.replace("# newdoc\n", "");
        let docs = parse_conllu(&content).unwrap();
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[1].text, "Voy al cine.");
    }

    #[test]
    fn test_parse_rejects_short_lines() {
        let err = parse_conllu("1\tHola\thola\n").unwrap_err();
        assert!(matches!(err, ParserError::Conllu { line: 1, .. }));
    }

    #[test]
    fn test_parse_rejects_out_of_range_head() {
        let err = parse_conllu("1\tHola\thola\tINTJ\t_\t_\t7\tROOT\t_\t_\n").unwrap_err();
        assert!(matches!(err, ParserError::Conllu { line: 1, .. }));
    }

    #[test]
    fn test_parse_zero_padded_root_head() {
        let docs = parse_conllu("1\tHola\thola\tINTJ\t_\t_\t00\tROOT\t_\t_\n").unwrap();
        assert_eq!(docs[0].get(0).unwrap().head, None);

        let docs = parse_conllu(
            "1\tHola\thola\tINTJ\t_\t_\t+0\troot\t_\t_\n2\tya\tya\tADV\t_\t_\t01\tadvmod\t_\t_\n",
        )
        .unwrap();
        assert_eq!(docs[0].get(0).unwrap().head, None);
        assert_eq!(docs[0].get(1).unwrap().head, Some(0));
    }

    #[tokio::test]
    async fn test_duplicate_text_keeps_first_document() {
        let content = "# text = Hola.\n1\tHola\thola\tINTJ\t_\t_\t0\troot\t_\t_\n\n\
                       # text = Hola.\n1\tHola\thola\tNOUN\t_\t_\t0\troot\t_\t_\n";
        let annotator = ConlluAnnotator::from_conllu(content).unwrap();
        assert_eq!(annotator.len(), 2);

        let doc = annotator.annotate("Hola.").await.unwrap();
        assert_eq!(doc.get(0).unwrap().pos, "INTJ");
    }

    #[tokio::test]
    async fn test_annotator_lookup() {
        let annotator = ConlluAnnotator::from_conllu(SAMPLE).unwrap();
        assert_eq!(annotator.len(), 2);

        let doc = annotator
            .annotate("Estoy   contenta.  Voy al cine.")
            .await
            .unwrap();
        assert_eq!(doc.len(), 8);

        let missing = annotator.annotate("Otra frase.").await;
        assert!(matches!(missing, Err(DepmatchError::NotFound(_))));

        let empty = annotator.annotate("   ").await;
        assert!(matches!(empty, Err(DepmatchError::Annotation(_))));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.conllu");
        std::fs::write(&path, SAMPLE).unwrap();

        let annotator = ConlluAnnotator::from_file(&path).unwrap();
        let texts: Vec<&str> = annotator.texts().collect();
        assert_eq!(texts, vec!["Estoy contenta. Voy al cine.", "Hola"]);

        assert!(ConlluAnnotator::from_file(dir.path().join("missing.conllu")).is_err());
    }
}
