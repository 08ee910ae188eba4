//! Dependency tree matcher
//!
//! A `DependencyPattern` is a list of named nodes. The first node is
//! unanchored; every later node is tied to an earlier one by a tree
//! relation. The matcher enumerates all assignments of distinct tokens to
//! nodes that satisfy every node's `TokenSpec` and relation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use depmatch_core::{DepmatchError, Doc, Result};

use crate::pattern::TokenSpec;

/// Relation between a node and its anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelOp {
    /// `>`: the node is a direct child of the anchor
    Child,
    /// `<`: the node is the head of the anchor
    Head,
    /// `>>`: the node is dominated by the anchor
    Descendant,
    /// `<<`: the node dominates the anchor
    Ancestor,
}

impl RelOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Child => ">",
            Self::Head => "<",
            Self::Descendant => ">>",
            Self::Ancestor => "<<",
        }
    }
}

impl std::fmt::Display for RelOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Node declaration as written by a pattern author
#[derive(Debug, Clone)]
pub struct DepNode {
    pub name: String,
    pub spec: TokenSpec,
    /// Anchor node name and relation, `None` only for the first node
    pub anchor: Option<(String, RelOp)>,
}

impl DepNode {
    /// The unanchored first node
    pub fn root(name: &str, spec: TokenSpec) -> Self {
        Self {
            name: name.to_string(),
            spec,
            anchor: None,
        }
    }

    /// A node related to an earlier node
    pub fn linked(name: &str, anchor: &str, op: RelOp, spec: TokenSpec) -> Self {
        Self {
            name: name.to_string(),
            spec,
            anchor: Some((anchor.to_string(), op)),
        }
    }
}

/// Validated node: the anchor is resolved to a node position
#[derive(Debug, Clone)]
struct CompiledNode {
    name: String,
    spec: TokenSpec,
    anchor: Option<(usize, RelOp)>,
}

/// A validated dependency pattern
#[derive(Debug, Clone)]
pub struct DependencyPattern {
    label: String,
    nodes: Vec<CompiledNode>,
}

impl DependencyPattern {
    /// Validate node declarations: at least one node, unique names, first
    /// node unanchored, every anchor names an earlier node
    pub fn new(label: impl Into<String>, nodes: Vec<DepNode>) -> Result<Self> {
        let label = label.into();
        let invalid = |reason: String| DepmatchError::InvalidPattern {
            pattern: label.clone(),
            reason,
        };

        if nodes.is_empty() {
            return Err(invalid("pattern has no nodes".to_string()));
        }

        let mut compiled: Vec<CompiledNode> = Vec::with_capacity(nodes.len());
        for (position, node) in nodes.into_iter().enumerate() {
            if compiled.iter().any(|c| c.name == node.name) {
                return Err(invalid(format!("duplicate node name '{}'", node.name)));
            }

            let anchor = match (position, node.anchor) {
                (0, None) => None,
                (0, Some(_)) => {
                    return Err(invalid(format!(
                        "first node '{}' cannot have an anchor",
                        node.name
                    )))
                }
                (_, None) => {
                    return Err(invalid(format!("node '{}' has no anchor", node.name)));
                }
                (_, Some((anchor_name, op))) => {
                    let anchor_pos = compiled
                        .iter()
                        .position(|c| c.name == anchor_name)
                        .ok_or_else(|| {
                            invalid(format!(
                                "node '{}' refers to undeclared node '{}'",
                                node.name, anchor_name
                            ))
                        })?;
                    Some((anchor_pos, op))
                }
            };

            compiled.push(CompiledNode {
                name: node.name,
                spec: node.spec,
                anchor,
            });
        }

        Ok(Self {
            label,
            nodes: compiled,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node names in declaration order
    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.name.as_str())
    }

    /// Every assignment of tokens to nodes, in search order
    pub fn find_all(&self, doc: &Doc) -> Vec<Vec<usize>> {
        let mut results = Vec::new();
        let mut assignment = Vec::with_capacity(self.nodes.len());
        self.extend(doc, &mut assignment, &mut results);
        results
    }

    fn candidates(&self, doc: &Doc, node: &CompiledNode, assignment: &[usize]) -> Vec<usize> {
        match node.anchor {
            None => (0..doc.len()).collect(),
            Some((anchor_pos, op)) => {
                let anchor = assignment[anchor_pos];
                match op {
                    RelOp::Child => doc.children(anchor).map(|t| t.index).collect(),
                    RelOp::Head => doc.get(anchor).and_then(|t| t.head).into_iter().collect(),
                    RelOp::Descendant => (0..doc.len())
                        .filter(|&i| doc.is_ancestor(anchor, i))
                        .collect(),
                    RelOp::Ancestor => doc.ancestors(anchor),
                }
            }
        }
    }

    fn extend(&self, doc: &Doc, assignment: &mut Vec<usize>, results: &mut Vec<Vec<usize>>) {
        let Some(node) = self.nodes.get(assignment.len()) else {
            results.push(assignment.clone());
            return;
        };

        for candidate in self.candidates(doc, node, assignment) {
            if assignment.contains(&candidate) {
                continue;
            }
            let Some(token) = doc.get(candidate) else {
                continue;
            };
            if !node.spec.matches(token) {
                continue;
            }

            assignment.push(candidate);
            self.extend(doc, assignment, results);
            assignment.pop();
        }
    }
}

/// One match: the pattern key plus one token index per node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyMatch<K> {
    pub pattern: K,
    pub tokens: Vec<usize>,
}

/// Registry of keyed dependency patterns
#[derive(Debug, Clone)]
pub struct DependencyMatcher<K> {
    patterns: Vec<(K, DependencyPattern)>,
}

impl<K> Default for DependencyMatcher<K> {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }
}

impl<K> DependencyMatcher<K>
where
    K: Copy + Eq + std::fmt::Display,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pattern; each key may be registered once
    pub fn add(&mut self, key: K, pattern: DependencyPattern) -> Result<()> {
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

    /// All matches of all patterns, ordered by first node token, then by
    /// registration order, then by the remaining node tokens
    pub fn find(&self, doc: &Doc) -> Vec<DependencyMatch<K>> {
        let mut ranked: Vec<(usize, DependencyMatch<K>)> = Vec::new();

        for (order, (key, pattern)) in self.patterns.iter().enumerate() {
            for tokens in pattern.find_all(doc) {
                debug!(pattern = %key, ?tokens, "Dependency pattern matched");
                ranked.push((
                    order,
                    DependencyMatch {
                        pattern: *key,
                        tokens,
                    },
                ));
            }
        }

        ranked.sort_by(|(order_a, a), (order_b, b)| {
            a.tokens[0]
                .cmp(&b.tokens[0])
                .then(order_a.cmp(order_b))
                .then_with(|| a.tokens[1..].cmp(&b.tokens[1..]))
        });

        ranked.into_iter().map(|(_, m)| m).collect()
    }

    /// The first match under `find` ordering, if any
    pub fn first(&self, doc: &Doc) -> Option<DependencyMatch<K>> {
        self.find(doc).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depmatch_core::Token;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Key {
        Subject,
        Other,
    }

    impl std::fmt::Display for Key {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    /// "perros grandes comen carne": comen <- perros(nsubj) <- grandes(amod), comen <- carne(obj)
    fn doc() -> Doc {
        Doc::new(
            "perros grandes comen carne",
            vec![
                Token::new(0, "perros")
                    .with_pos("NOUN")
                    .with_dep("nsubj", Some(2)),
                Token::new(1, "grandes")
                    .with_pos("ADJ")
                    .with_dep("amod", Some(0)),
                Token::new(2, "comen")
                    .with_lemma("comer")
                    .with_pos("VERB")
                    .with_dep("ROOT", None),
                Token::new(3, "carne")
                    .with_pos("NOUN")
                    .with_dep("obj", Some(2)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_invalid_patterns() {
        assert!(DependencyPattern::new("empty", vec![]).is_err());

        let duplicate = DependencyPattern::new(
            "dup",
            vec![
                DepNode::root("a", TokenSpec::any()),
                DepNode::linked("a", "a", RelOp::Child, TokenSpec::any()),
            ],
        );
        assert!(duplicate.is_err());

        let forward = DependencyPattern::new(
            "forward",
            vec![
                DepNode::root("a", TokenSpec::any()),
                DepNode::linked("b", "c", RelOp::Child, TokenSpec::any()),
                DepNode::linked("c", "a", RelOp::Child, TokenSpec::any()),
            ],
        );
        assert!(matches!(
            forward,
            Err(DepmatchError::InvalidPattern { .. })
        ));

        let unanchored = DependencyPattern::new(
            "unanchored",
            vec![
                DepNode::root("a", TokenSpec::any()),
                DepNode::root("b", TokenSpec::any()),
            ],
        );
        assert!(unanchored.is_err());
    }

    #[test]
    fn test_child_relation() {
        let pattern = DependencyPattern::new(
            "verb-subject",
            vec![
                DepNode::root("verb", TokenSpec::any().pos("VERB")),
                DepNode::linked("subject", "verb", RelOp::Child, TokenSpec::any().dep("nsubj")),
            ],
        )
        .unwrap();

        assert_eq!(pattern.find_all(&doc()), vec![vec![2, 0]]);
        assert_eq!(pattern.node_names().collect::<Vec<_>>(), vec!["verb", "subject"]);
    }

    #[test]
    fn test_other_relations() {
        let descendant = DependencyPattern::new(
            "desc",
            vec![
                DepNode::root("verb", TokenSpec::any().pos("VERB")),
                DepNode::linked("adj", "verb", RelOp::Descendant, TokenSpec::any().pos("ADJ")),
            ],
        )
        .unwrap();
        assert_eq!(descendant.find_all(&doc()), vec![vec![2, 1]]);

        let head = DependencyPattern::new(
            "head",
            vec![
                DepNode::root("adj", TokenSpec::any().pos("ADJ")),
                DepNode::linked("noun", "adj", RelOp::Head, TokenSpec::any()),
                DepNode::linked("verb", "adj", RelOp::Ancestor, TokenSpec::any().pos("VERB")),
            ],
        )
        .unwrap();
        assert_eq!(head.find_all(&doc()), vec![vec![1, 0, 2]]);
    }

    #[test]
    fn test_nodes_bind_distinct_tokens() {
        let pattern = DependencyPattern::new(
            "two-nouns",
            vec![
                DepNode::root("verb", TokenSpec::any().pos("VERB")),
                DepNode::linked("a", "verb", RelOp::Child, TokenSpec::any().pos("NOUN")),
                DepNode::linked("b", "verb", RelOp::Child, TokenSpec::any().pos("NOUN")),
            ],
        )
        .unwrap();

        assert_eq!(pattern.find_all(&doc()), vec![vec![2, 0, 3], vec![2, 3, 0]]);
    }

    #[test]
    fn test_matcher_ordering_and_keys() {
        let subject = DependencyPattern::new(
            "subject",
            vec![
                DepNode::root("noun", TokenSpec::any().pos("NOUN")),
                DepNode::linked("verb", "noun", RelOp::Head, TokenSpec::any()),
            ],
        )
        .unwrap();
        let any_noun = DependencyPattern::new(
            "noun",
            vec![DepNode::root("noun", TokenSpec::any().pos("NOUN"))],
        )
        .unwrap();

        let mut matcher = DependencyMatcher::new();
        matcher.add(Key::Other, any_noun.clone()).unwrap();
        matcher.add(Key::Subject, subject).unwrap();
        assert!(matcher.add(Key::Other, any_noun).is_err());
        assert_eq!(matcher.len(), 2);

        let found = matcher.find(&doc());
        let summary: Vec<(Key, usize)> = found.iter().map(|m| (m.pattern, m.tokens[0])).collect();
        assert_eq!(
            summary,
            vec![
                (Key::Other, 0),
                (Key::Subject, 0),
                (Key::Other, 3),
                (Key::Subject, 3)
            ]
        );
        assert_eq!(matcher.first(&doc()).unwrap().pattern, Key::Other);
    }

    #[test]
    fn test_no_match_is_empty() {
        let matcher: DependencyMatcher<Key> = DependencyMatcher::new();
        assert!(matcher.find(&doc()).is_empty());
        assert!(matcher.first(&doc()).is_none());
    }
}
