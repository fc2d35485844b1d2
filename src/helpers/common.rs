//! Vendor-neutral helpers

use super::{has_statement, node_arg, value_arg, HelperError, HelperRegistry};
use crate::tree::ConfigNode;
use serde_json::Value;
use std::net::Ipv4Addr;

/// Administratively down (`shutdown` / `disable` child)
pub fn is_shutdown(node: &ConfigNode) -> bool {
    has_statement(node, &["shutdown", "disable"])
}

pub fn has_child(node: &ConfigNode, prefix: &str) -> bool {
    node.has_child_prefix(prefix)
}

pub fn child_count(node: &ConfigNode) -> usize {
    node.children.len()
}

/// Has a `description` child with a non-empty value
pub fn has_description(node: &ConfigNode) -> bool {
    node.children_matching("description")
        .any(|c| c.param(1).is_some_and(|d| !d.trim().is_empty()))
}

pub fn param(node: &ConfigNode, index: usize) -> Option<&str> {
    node.param(index)
}

/// First IPv4 address of a node with its prefix length.
///
/// Understands `ip address A M` (mask form) and `address A/len` (prefix form).
pub fn ipv4_address(node: &ConfigNode) -> Option<(Ipv4Addr, u8)> {
    node.children.iter().find_map(|c| {
        if c.matches("ip address") {
            let address = c.param(2)?.parse::<Ipv4Addr>().ok()?;
            let mask = c.param(3)?.parse::<Ipv4Addr>().ok()?;
            Some((address, mask_to_prefix(mask)))
        } else if c.matches("address") {
            parse_cidr(c.param(1)?)
        } else {
            None
        }
    })
}

/// Prefix length of a netmask (counts set bits)
pub fn mask_to_prefix(mask: Ipv4Addr) -> u8 {
    u32::from(mask).count_ones() as u8
}

/// Parse `A.B.C.D/len`
pub fn parse_cidr(text: &str) -> Option<(Ipv4Addr, u8)> {
    let (address, len) = text.split_once('/')?;
    let len: u8 = len.parse().ok().filter(|l| *l <= 32)?;
    Some((address.parse().ok()?, len))
}

pub(super) fn register(registry: &mut HelperRegistry) {
    registry.register_node_predicate(None, "isShutdown", is_shutdown);
    registry.register_node_predicate(None, "hasDescription", has_description);

    registry.register(None, "hasChild", |args| {
        let node = node_arg("hasChild", args)?;
        let prefix = value_arg("hasChild", args, 0)?
            .as_str()
            .ok_or_else(|| HelperError::BadArgument {
                helper: "hasChild".to_string(),
                message: "prefix must be a string".to_string(),
            })?;
        Ok(Value::Bool(has_child(node, prefix)))
    });

    registry.register(None, "childCount", |args| {
        let node = node_arg("childCount", args)?;
        Ok(Value::from(child_count(node)))
    });

    registry.register(None, "param", |args| {
        let node = node_arg("param", args)?;
        let index = value_arg("param", args, 0)?
            .as_u64()
            .ok_or_else(|| HelperError::BadArgument {
                helper: "param".to_string(),
                message: "index must be a non-negative integer".to_string(),
            })?;
        Ok(param(node, index as usize).map_or(Value::Null, Value::from))
    });

    registry.register(None, "ipv4Address", |args| {
        let node = node_arg("ipv4Address", args)?;
        Ok(ipv4_address(node).map_or(Value::Null, |(address, len)| {
            Value::String(format!("{}/{}", address, len))
        }))
    });
}
