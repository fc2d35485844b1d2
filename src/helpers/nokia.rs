//! Nokia SR OS helpers

use super::{has_statement, HelperRegistry};
use crate::tree::ConfigNode;

/// `admin-state disable` (MD-CLI) or `shutdown` (classic CLI)
pub fn is_admin_disabled(node: &ConfigNode) -> bool {
    has_statement(node, &["admin-state disable", "shutdown"])
}

pub(super) fn register(registry: &mut HelperRegistry) {
    registry.register_node_predicate(Some("nokia"), "isAdminDisabled", is_admin_disabled);
}
