//! Aruba AOS-CX helpers

use super::HelperRegistry;
use crate::tree::ConfigNode;

/// Carries `vlan trunk ...` statements (native or allowed lists)
pub fn is_trunk_port(node: &ConfigNode) -> bool {
    node.children_matching("vlan trunk").next().is_some()
}

pub(super) fn register(registry: &mut HelperRegistry) {
    registry.register_node_predicate(Some("aruba"), "isTrunkPort", is_trunk_port);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Loc;

    #[test]
    fn test_is_trunk_port() {
        let mut port = ConfigNode::section("interface 1/1/1", "interface 1/1/1", Loc::line(1));
        port.children
            .push(ConfigNode::leaf("vlan access 10", "    vlan access 10", Loc::line(2)));
        assert!(!is_trunk_port(&port));
        port.children
            .push(ConfigNode::leaf("vlan trunk allowed 10,20", "    vlan trunk allowed 10,20", Loc::line(3)));
        assert!(is_trunk_port(&port));
    }
}
