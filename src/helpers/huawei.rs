//! Huawei VRP helpers

use super::HelperRegistry;
use crate::tree::ConfigNode;

pub fn is_trunk_port(node: &ConfigNode) -> bool {
    node.has_child_prefix("port link-type trunk")
}

pub(super) fn register(registry: &mut HelperRegistry) {
    registry.register_node_predicate(Some("huawei"), "isTrunkPort", is_trunk_port);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Loc;

    #[test]
    fn test_is_trunk_port() {
        let mut port = ConfigNode::section("interface GE1/0/1", "interface GE1/0/1", Loc::line(1));
        assert!(!is_trunk_port(&port));
        port.children
            .push(ConfigNode::leaf("port link-type trunk", " port link-type trunk", Loc::line(2)));
        assert!(is_trunk_port(&port));
    }
}
