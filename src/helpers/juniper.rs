//! Juniper Junos helpers

use super::{has_statement, HelperRegistry};
use crate::tree::ConfigNode;

/// Disabled interface or unit (`disable;`), or a deactivated statement (`inactive:`)
pub fn is_disabled(node: &ConfigNode) -> bool {
    node.param(0).is_some_and(|p| p.eq_ignore_ascii_case("inactive:"))
        || has_statement(node, &["disable"])
}

pub(super) fn register(registry: &mut HelperRegistry) {
    registry.register_node_predicate(Some("juniper"), "isDisabled", is_disabled);
}
