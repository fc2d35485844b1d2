//! Normalized configuration tree shared by every dialect

use crate::diagnostic::Loc;
use serde::{Deserialize, Serialize};

/// Structural kind of a node, fixed when the node is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Opens a nested scope (may end up with zero children)
    Section,
    /// Terminal statement
    Leaf,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Section => write!(f, "section"),
            NodeKind::Leaf => write!(f, "leaf"),
        }
    }
}

/// One structural unit of a parsed configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigNode {
    /// Normalized command signature
    pub id: String,
    /// Original source text of the node's own line(s)
    pub raw_text: String,
    /// Tokens of `id`, quotes removed
    pub params: Vec<String>,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub children: Vec<ConfigNode>,
    pub loc: Loc,
}

/// The parsed configuration: top-level nodes in source order
pub type ConfigTree = Vec<ConfigNode>;

impl ConfigNode {
    /// Build a node from a statement; `id` and `params` are derived from `statement`.
    pub fn new(kind: NodeKind, statement: &str, raw_text: &str, loc: Loc) -> Self {
        let id = normalize_id(statement);
        let params = tokenize(&id);
        Self {
            id,
            raw_text: raw_text.to_string(),
            params,
            kind,
            children: Vec::new(),
            loc,
        }
    }

    pub fn section(statement: &str, raw_text: &str, loc: Loc) -> Self {
        Self::new(NodeKind::Section, statement, raw_text, loc)
    }

    pub fn leaf(statement: &str, raw_text: &str, loc: Loc) -> Self {
        Self::new(NodeKind::Leaf, statement, raw_text, loc)
    }

    pub fn is_section(&self) -> bool {
        self.kind == NodeKind::Section
    }

    /// Positional parameter (0 is the command keyword)
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// Whether this node's id token-prefix-matches `selector`
    pub fn matches(&self, selector: &str) -> bool {
        selector_matches(selector, &self.id)
    }

    /// Direct children whose id token-prefix-matches `selector`
    pub fn children_matching<'a>(
        &'a self,
        selector: &'a str,
    ) -> impl Iterator<Item = &'a ConfigNode> + 'a {
        self.children.iter().filter(move |c| c.matches(selector))
    }

    /// First direct child matching `selector`
    pub fn child(&self, selector: &str) -> Option<&ConfigNode> {
        self.children.iter().find(|c| c.matches(selector))
    }

    /// Whether some direct child's id case-insensitively starts with `prefix`
    pub fn has_child_prefix(&self, prefix: &str) -> bool {
        let prefix = collapse_whitespace(prefix).to_lowercase();
        self.children
            .iter()
            .any(|c| c.id.to_lowercase().starts_with(&prefix))
    }

    /// Follow a path of selectors through nested children
    pub fn descend(&self, path: &[&str]) -> Option<&ConfigNode> {
        path.iter()
            .try_fold(self, |node, selector| node.child(selector))
    }

    /// Depth-first iterator over this node and all descendants
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }
}

/// Depth-first, document-order iterator over a (sub)tree
pub struct Walk<'a> {
    stack: Vec<&'a ConfigNode>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a ConfigNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Depth-first iterator over every node of a tree
pub fn walk_tree(tree: &[ConfigNode]) -> Walk<'_> {
    Walk {
        stack: tree.iter().rev().collect(),
    }
}

/// Collapse runs of whitespace into single spaces and trim
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Derive a node id from a statement.
///
/// Strips trailing statement punctuation (`;`, `{`) left by brace dialects
/// and collapses whitespace. Case is preserved; comparisons decide case.
pub fn normalize_id(statement: &str) -> String {
    let trimmed = statement
        .trim()
        .trim_end_matches(|c: char| c == ';' || c == '{' || c.is_whitespace());
    collapse_whitespace(trimmed)
}

/// Split an id into tokens, keeping quoted strings together and dropping the quotes
pub fn tokenize(id: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_token = false;

    for c in id.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' && !in_token => {
                quote = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    tokens
}

/// Case-insensitive, whitespace-normalized token-prefix match.
///
/// `"interface"` matches `"interface Gi0/1"` but not `"interfaces"`;
/// `"line vty"` requires both leading tokens in order. An empty selector
/// matches nothing.
pub fn selector_matches(selector: &str, id: &str) -> bool {
    let mut wanted = selector.split_whitespace().peekable();
    if wanted.peek().is_none() {
        return false;
    }
    let mut have = id.split_whitespace();
    wanted.all(|w| have.next().is_some_and(|h| h.eq_ignore_ascii_case(w)))
}
