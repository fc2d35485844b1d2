//! Keyword-scoped dialects (FortiOS `config` / `edit` ... `next` / `end`)

use super::{LogicalLine, TreeBuilder};
use crate::schema::VendorSchema;
use crate::tree::{ConfigNode, ConfigTree};

pub(super) fn build(lines: &[LogicalLine], schema: &VendorSchema) -> ConfigTree {
    // tag = index of the keyword block that opened the section
    let mut tree: TreeBuilder<usize> = TreeBuilder::new();

    for line in lines {
        let statement = line.statement();
        let mut tokens = statement.split_whitespace();
        let keyword = tokens.next().unwrap_or_default();
        let bare = tokens.next().is_none();

        let closer = schema
            .keyword_blocks
            .iter()
            .position(|b| bare && keyword.eq_ignore_ascii_case(&b.close));
        if let Some(block) = closer {
            if tree.tags().any(|&open| open == block) {
                // closes intermediate sections left open by missing closers
                while let Some(&open) = tree.top_tag() {
                    tree.close_at(line.end_line);
                    if open == block {
                        break;
                    }
                }
            } else {
                log::debug!(
                    "Ignoring unmatched '{}' at line {}",
                    keyword,
                    line.start_line
                );
            }
            continue;
        }

        let opener = schema
            .keyword_blocks
            .iter()
            .position(|b| keyword.eq_ignore_ascii_case(&b.open));
        match opener {
            Some(block) => tree.push(ConfigNode::section(statement, &line.raw, line.loc()), block),
            None => tree.add(ConfigNode::leaf(statement, &line.raw, line.loc())),
        }
    }

    tree.finish()
}

#[cfg(test)]
mod tests {
    use crate::diagnostic::Loc;
    use crate::parser::parse;
    use crate::schema::SchemaRegistry;
    use crate::tree::ConfigNode;
    use pretty_assertions::assert_eq;

    const FORTIOS: &str = "\
#config-version=FGT60F-7.2.5
config system interface
    edit \"port1\"
        set allowaccess ping https ssh
        set ip 192.0.2.1 255.255.255.0
    next
    edit \"port2\"
        set allowaccess ping telnet
    next
end
config system global
    set hostname \"fw1\"
end
";

    fn fortios(text: &str) -> Vec<ConfigNode> {
        let registry = SchemaRegistry::new();
        parse(text, registry.get("fortios").unwrap())
    }

    #[test]
    fn test_fortios_structure() {
        let tree = fortios(FORTIOS);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].id, "config system interface");
        assert_eq!(tree[0].loc, Loc::new(2, 10));
        assert_eq!(tree[0].children.len(), 2);

        let port1 = &tree[0].children[0];
        assert_eq!(port1.params, vec!["edit", "port1"]);
        assert_eq!(port1.loc, Loc::new(3, 6));
        assert_eq!(port1.children.len(), 2);

        assert_eq!(tree[1].loc, Loc::new(11, 13));
        assert_eq!(tree[1].children[0].param(2), Some("fw1"));
    }

    #[test]
    fn test_end_closes_unfinished_edit() {
        let text = "config firewall policy\n    edit 1\n        set action accept\nend\nset x\n";
        let tree = fortios(text);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].loc, Loc::new(1, 4));
        assert_eq!(tree[0].children[0].loc, Loc::new(2, 4));
        assert_eq!(tree[1].id, "set x");
    }

    #[test]
    fn test_unmatched_closers_ignored() {
        let text = "next\nend\nconfig system dns\n    set primary 1.1.1.1\n";
        let tree = fortios(text);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].loc, Loc::new(3, 4));
    }

    #[test]
    fn test_closer_with_arguments_is_a_statement() {
        let text = "config router static\n    set end 5\nend\n";
        let tree = fortios(text);
        assert_eq!(tree[0].children.len(), 1);
        assert_eq!(tree[0].children[0].id, "set end 5");
    }
}
