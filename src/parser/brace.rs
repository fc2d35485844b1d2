//! Brace-scoped dialects (Juniper, Nokia SR OS, VyOS)
//!
//! `{` opens a section named by the text before it, `;` or end of line ends
//! a leaf, `}` closes the innermost section. A `}` with nothing open is
//! ignored; sections still open at end of input close at their last child.

use super::{LogicalLine, TreeBuilder};
use crate::diagnostic::Loc;
use crate::tree::{ConfigNode, ConfigTree, NodeKind};

pub(super) fn build(lines: &[LogicalLine]) -> ConfigTree {
    let mut tree: TreeBuilder<()> = TreeBuilder::new();
    // `{` seen with nothing to attach it to; their `}` are swallowed
    let mut orphan_opens = 0usize;

    for line in lines {
        let loc = line.loc();
        let mut buf = String::new();
        let mut quoted = false;

        for c in line.text.chars() {
            if quoted {
                buf.push(c);
                if c == '"' {
                    quoted = false;
                }
                continue;
            }
            match c {
                '"' => {
                    quoted = true;
                    buf.push(c);
                }
                // trailing comment after a brace or semicolon
                '#' if buf.trim().is_empty() => break,
                '{' => {
                    let statement = std::mem::take(&mut buf);
                    if !statement.trim().is_empty() {
                        tree.push(ConfigNode::section(&statement, &line.raw, loc), ());
                    } else if let Some(mut previous) = tree.take_last_leaf() {
                        // opener on its own line: the previous statement names the section
                        previous.kind = NodeKind::Section;
                        tree.push(previous, ());
                    } else {
                        log::debug!("Ignoring anonymous '{{' at line {}", line.start_line);
                        orphan_opens += 1;
                    }
                }
                ';' => flush(&mut tree, &mut buf, &line.raw, loc),
                '}' => {
                    flush(&mut tree, &mut buf, &line.raw, loc);
                    if orphan_opens > 0 {
                        orphan_opens -= 1;
                    } else if !tree.close_at(line.end_line) {
                        log::debug!("Ignoring unbalanced '}}' at line {}", line.start_line);
                    }
                }
                _ => buf.push(c),
            }
        }
        flush(&mut tree, &mut buf, &line.raw, loc);
    }

    tree.finish()
}

fn flush(tree: &mut TreeBuilder<()>, buf: &mut String, raw: &str, loc: Loc) {
    if !buf.trim().is_empty() {
        tree.add(ConfigNode::leaf(buf, raw, loc));
    }
    buf.clear();
}
