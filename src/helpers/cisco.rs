//! Cisco IOS / NX-OS / IOS-XR helpers

use super::{has_statement, HelperRegistry};
use crate::tree::ConfigNode;
use once_cell::sync::Lazy;
use regex::Regex;

/// Physical port names (full and abbreviated forms)
static PHYSICAL_INTERFACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(GigabitEthernet|FastEthernet|TenGigabitEthernet|TwentyFiveGigE|FortyGigabitEthernet|HundredGigE|Ethernet|Gi|Fa|Te|Twe|Fo|Hu|Eth|Et)\d",
    )
    .unwrap()
});

pub fn is_trunk_port(node: &ConfigNode) -> bool {
    has_statement(node, &["switchport mode trunk"])
}

pub fn is_access_port(node: &ConfigNode) -> bool {
    has_statement(node, &["switchport mode access"])
}

/// Has an explicit `switchport trunk allowed vlan` list
pub fn has_allowed_vlans(node: &ConfigNode) -> bool {
    node.has_child_prefix("switchport trunk allowed vlan")
}

/// Interface node naming a physical port (not Loopback, Vlan, Port-channel, ...)
pub fn is_physical(node: &ConfigNode) -> bool {
    node.matches("interface")
        && node
            .param(1)
            .is_some_and(|name| PHYSICAL_INTERFACE.is_match(name))
}

pub(super) fn register(registry: &mut HelperRegistry) {
    registry.register_node_predicate(Some("cisco"), "isTrunkPort", is_trunk_port);
    registry.register_node_predicate(Some("cisco"), "isAccessPort", is_access_port);
    registry.register_node_predicate(Some("cisco"), "hasAllowedVlans", has_allowed_vlans);
    registry.register_node_predicate(Some("cisco"), "isPhysical", is_physical);
}
