//! Indentation-scoped dialects (Cisco, Arista, Aruba, Huawei, Cumulus)
//!
//! A statement opens a section when the next statement is indented deeper.
//! A statement at depth D closes every open section at depth >= D first.
//! Terminators (`exit`, `quit`, ...) never produce nodes: when indentation
//! already closed a section they extend it to cover the terminator line,
//! otherwise they close the innermost open section.

use super::{LogicalLine, TreeBuilder};
use crate::schema::VendorSchema;
use crate::tree::{ConfigNode, ConfigTree};

pub(super) fn build(lines: &[LogicalLine], schema: &VendorSchema) -> ConfigTree {
    let mut tree: TreeBuilder<usize> = TreeBuilder::new();

    for (idx, line) in lines.iter().enumerate() {
        let depth = line.indent;
        let mut closed = false;
        while tree.top_tag().is_some_and(|&open| open >= depth) {
            tree.close();
            closed = true;
        }

        let statement = line.statement();
        if schema.is_terminator(statement) {
            if closed {
                // a top-level terminator (`end`, `return`) ends the document, not a section
                if depth > 0 {
                    tree.extend_last(line.end_line);
                }
            } else if !tree.close_at(line.end_line) && depth > 0 {
                log::debug!(
                    "Ignoring unmatched '{}' at line {}",
                    statement,
                    line.start_line
                );
            }
            continue;
        }

        let opens_scope = lines.get(idx + 1).is_some_and(|next| next.indent > depth);
        if opens_scope {
            tree.push(ConfigNode::section(statement, &line.raw, line.loc()), depth);
        } else {
            tree.add(ConfigNode::leaf(statement, &line.raw, line.loc()));
        }
    }

    tree.finish()
}
