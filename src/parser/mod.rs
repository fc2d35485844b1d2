//! Schema-aware configuration parser
//!
//! Converts raw configuration text into a [`ConfigTree`] following the block
//! style of a [`VendorSchema`]. Parsing never fails: malformed structure
//! (unbalanced braces, stray closers, inconsistent indentation) is recovered
//! deterministically and logged at debug level.
//!
//! Every dialect first goes through the same line preparation:
//! - blank and comment lines are dropped (line numbers are preserved)
//! - block comments are stripped
//! - continuation lines are joined into one logical statement
//! - delimited commands (`banner motd ^C ... ^C`) are captured whole

mod brace;
mod indent;
mod keyword;

use crate::diagnostic::Loc;
use crate::schema::{BlockComment, BlockStyle, VendorSchema};
use crate::tree::{selector_matches, ConfigNode, ConfigTree, NodeKind};

/// Parse configuration text with the given dialect schema
pub fn parse(text: &str, schema: &VendorSchema) -> ConfigTree {
    let lines = logical_lines(text, schema);
    let tree = match schema.block_style {
        BlockStyle::Indent => indent::build(&lines, schema),
        BlockStyle::Brace => brace::build(&lines),
        BlockStyle::Keyword => keyword::build(&lines, schema),
        BlockStyle::Flat => flat(&lines),
    };
    log::debug!(
        "Parsed {} logical lines into {} top-level nodes ({})",
        lines.len(),
        tree.len(),
        schema.id
    );
    tree
}

/// One statement after comment removal and line joining
#[derive(Debug, Clone)]
pub(crate) struct LogicalLine {
    /// Statement text, leading indentation kept
    pub text: String,
    /// Original physical line(s)
    pub raw: String,
    pub start_line: usize,
    pub end_line: usize,
    /// Indentation width in columns
    pub indent: usize,
}

impl LogicalLine {
    pub fn loc(&self) -> Loc {
        Loc::new(self.start_line, self.end_line)
    }

    pub fn statement(&self) -> &str {
        self.text.trim()
    }
}

pub(crate) fn logical_lines(text: &str, schema: &VendorSchema) -> Vec<LogicalLine> {
    let physical: Vec<&str> = text.lines().collect();
    let mut lines = Vec::new();
    let mut in_block_comment = false;
    let mut i = 0;

    while i < physical.len() {
        let start = i;
        let mut content = match &schema.block_comment {
            Some(delims) => strip_block_comments(physical[i], delims, &mut in_block_comment),
            None => physical[i].to_string(),
        };

        let trimmed = content.trim();
        if trimmed.is_empty() || schema.is_comment(trimmed) {
            i += 1;
            continue;
        }

        if let Some(suffix) = schema.continuation_suffix.as_deref().filter(|s| !s.is_empty()) {
            while let Some(stripped) = content.trim_end().strip_suffix(suffix) {
                let mut joined = stripped.trim_end().to_string();
                if i + 1 >= physical.len() {
                    content = joined;
                    break;
                }
                i += 1;
                joined.push(' ');
                joined.push_str(physical[i].trim());
                content = joined;
            }
        }

        if let Some((offset, delimiter)) = banner_delimiter(content.trim(), schema) {
            let opening = content.trim();
            let rest = &opening[offset + delimiter.len()..];
            if !rest.contains(delimiter.as_str()) {
                while i + 1 < physical.len() {
                    i += 1;
                    if physical[i].contains(delimiter.as_str()) {
                        break;
                    }
                }
                if !physical[i].contains(delimiter.as_str()) {
                    log::debug!(
                        "Unterminated '{}' body starting at line {}",
                        delimiter,
                        start + 1
                    );
                }
            }
        }

        lines.push(LogicalLine {
            indent: indent_width(&content, schema.tab_width),
            text: content,
            raw: physical[start..=i].join("\n"),
            start_line: start + 1,
            end_line: i + 1,
        });
        i += 1;
    }

    lines
}

fn strip_block_comments(line: &str, delims: &BlockComment, in_comment: &mut bool) -> String {
    let mut out = String::new();
    let mut rest = line;
    loop {
        if *in_comment {
            match rest.find(delims.close.as_str()) {
                Some(end) => {
                    rest = &rest[end + delims.close.len()..];
                    *in_comment = false;
                }
                None => return out,
            }
        } else {
            match rest.find(delims.open.as_str()) {
                Some(start) => {
                    out.push_str(&rest[..start]);
                    rest = &rest[start + delims.open.len()..];
                    *in_comment = true;
                }
                None => {
                    out.push_str(rest);
                    return out;
                }
            }
        }
    }
}

/// Delimiter of a delimited command and its byte offset in the statement.
///
/// The delimiter is the token after the command and its type word
/// (`banner motd ^C`): two characters when it starts with `^`, else one.
fn banner_delimiter(statement: &str, schema: &VendorSchema) -> Option<(usize, String)> {
    let command = schema
        .delimited_commands
        .iter()
        .find(|c| selector_matches(c, statement))?;
    let index = command.split_whitespace().count() + 1;
    let (offset, token) = nth_token(statement, index)?;
    let width = if token.starts_with('^') { 2 } else { 1 };
    let delimiter: String = token.chars().take(width).collect();
    Some((offset, delimiter))
}

fn nth_token(s: &str, n: usize) -> Option<(usize, &str)> {
    let mut count = 0;
    let mut start = None;
    for (i, c) in s.char_indices() {
        match (c.is_whitespace(), start) {
            (false, None) => start = Some(i),
            (true, Some(st)) => {
                if count == n {
                    return Some((st, &s[st..i]));
                }
                count += 1;
                start = None;
            }
            _ => {}
        }
    }
    match start {
        Some(st) if count == n => Some((st, &s[st..])),
        _ => None,
    }
}

fn indent_width(line: &str, tab_width: usize) -> usize {
    let tab = tab_width.max(1);
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .fold(0, |width, c| {
            if c == '\t' {
                width + tab - width % tab
            } else {
                width + 1
            }
        })
}

fn flat(lines: &[LogicalLine]) -> ConfigTree {
    lines
        .iter()
        .map(|line| ConfigNode::leaf(line.statement(), &line.raw, line.loc()))
        .collect()
}

/// Stack of open sections shared by the nesting disciplines.
///
/// Each open section carries a tag (indent depth, keyword block index).
/// Closed sections are attached to their parent, or to the roots.
pub(crate) struct TreeBuilder<T> {
    roots: Vec<ConfigNode>,
    open: Vec<(ConfigNode, T)>,
}

impl<T> TreeBuilder<T> {
    pub fn new() -> Self {
        Self {
            roots: Vec::new(),
            open: Vec::new(),
        }
    }

    /// Open a new section inside the current scope
    pub fn push(&mut self, node: ConfigNode, tag: T) {
        self.open.push((node, tag));
    }

    /// Attach a finished node to the current scope
    pub fn add(&mut self, node: ConfigNode) {
        match self.open.last_mut() {
            Some((parent, _)) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }

    pub fn top_tag(&self) -> Option<&T> {
        self.open.last().map(|(_, tag)| tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &T> {
        self.open.iter().map(|(_, tag)| tag)
    }

    pub fn is_open(&self) -> bool {
        !self.open.is_empty()
    }

    /// Close the innermost section; false when nothing is open
    pub fn close(&mut self) -> bool {
        let Some((mut node, _)) = self.open.pop() else {
            return false;
        };
        if let Some(end) = node.children.iter().map(|c| c.loc.end_line).max() {
            node.loc.end_line = node.loc.end_line.max(end);
        }
        self.add(node);
        true
    }

    /// Close the innermost section, extending it to `end_line`
    pub fn close_at(&mut self, end_line: usize) -> bool {
        match self.open.last_mut() {
            Some((node, _)) => {
                node.loc.end_line = node.loc.end_line.max(end_line);
                self.close()
            }
            None => false,
        }
    }

    /// Extend the most recently attached node of the current scope
    pub fn extend_last(&mut self, end_line: usize) {
        let last = match self.open.last_mut() {
            Some((parent, _)) => parent.children.last_mut(),
            None => self.roots.last_mut(),
        };
        if let Some(node) = last {
            node.loc.end_line = node.loc.end_line.max(end_line);
        }
    }

    /// Detach the most recently attached node of the current scope if it is a leaf
    pub fn take_last_leaf(&mut self) -> Option<ConfigNode> {
        let scope = match self.open.last_mut() {
            Some((parent, _)) => &mut parent.children,
            None => &mut self.roots,
        };
        if scope.last().is_some_and(|n| n.kind == NodeKind::Leaf) {
            scope.pop()
        } else {
            None
        }
    }

    /// Close everything still open and return the roots
    pub fn finish(mut self) -> ConfigTree {
        if self.is_open() {
            log::debug!("Closing {} unterminated section(s) at end of input", self.open.len());
        }
        while self.close() {}
        self.roots
    }
}
