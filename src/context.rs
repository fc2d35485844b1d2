//! Read-only per-scan context handed to every rule check

use crate::schema::VendorSchema;
use crate::tree::{walk_tree, ConfigNode};
use std::net::Ipv4Addr;
use std::sync::OnceLock;

/// An IPv4 address configured on an interface (`ip address A M`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceAddress<'a> {
    pub interface: &'a str,
    pub address: Ipv4Addr,
    pub mask: Ipv4Addr,
}

/// Whole-tree access for cross-node checks.
///
/// Built once per scan. Derived indexes are computed on first use and
/// cached for the rest of the scan.
#[derive(Debug)]
pub struct Context<'a> {
    tree: &'a [ConfigNode],
    vendor: &'a str,
    schema: Option<&'a VendorSchema>,
    interfaces: OnceLock<Vec<InterfaceAddress<'a>>>,
}

impl<'a> Context<'a> {
    pub fn new(tree: &'a [ConfigNode], vendor: &'a str) -> Self {
        Self {
            tree,
            vendor,
            schema: None,
            interfaces: OnceLock::new(),
        }
    }

    /// Attach the schema the tree was parsed with
    pub fn with_schema(mut self, schema: &'a VendorSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// The full parsed tree
    pub fn get_ast(&self) -> &'a [ConfigNode] {
        self.tree
    }

    pub fn vendor(&self) -> &'a str {
        self.vendor
    }

    pub fn schema(&self) -> Option<&'a VendorSchema> {
        self.schema
    }

    /// Helper namespace for this scan (`cisco` for `cisco-ios`)
    pub fn family(&self) -> &'a str {
        match self.schema {
            Some(schema) if !schema.family.is_empty() => schema.family.as_str(),
            _ => self.vendor.split('-').next().unwrap_or(self.vendor),
        }
    }

    /// Whether text comparisons should respect case; dialects without a
    /// schema compare case-insensitively
    pub fn case_sensitive(&self) -> bool {
        self.schema.is_some_and(|s| s.case_sensitive)
    }

    /// Every node in the tree matching `selector`, in document order
    pub fn find_all(&self, selector: &str) -> Vec<&'a ConfigNode> {
        walk_tree(self.tree).filter(|n| n.matches(selector)).collect()
    }

    /// IPv4 addresses configured under `interface` sections
    pub fn interface_addresses(&self) -> &[InterfaceAddress<'a>] {
        self.interfaces.get_or_init(|| build_interface_index(self.tree))
    }
}

fn build_interface_index(tree: &[ConfigNode]) -> Vec<InterfaceAddress<'_>> {
    let mut index = Vec::new();
    for iface in walk_tree(tree).filter(|n| n.is_section() && n.matches("interface")) {
        let name = iface.param(1).unwrap_or_default();
        for stmt in iface.children_matching("ip address") {
            let address = stmt.param(2).and_then(|p| p.parse::<Ipv4Addr>().ok());
            let mask = stmt.param(3).and_then(|p| p.parse::<Ipv4Addr>().ok());
            if let (Some(address), Some(mask)) = (address, mask) {
                index.push(InterfaceAddress {
                    interface: name,
                    address,
                    mask,
                });
            }
        }
    }
    log::debug!("Indexed {} interface addresses", index.len());
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::schema::SchemaRegistry;

    const CONFIG: &str = "\
interface Loopback0
 ip address 192.0.2.1 255.255.255.255
interface GigabitEthernet0/1
 ip address 10.1.1.1 255.255.255.0
 ip address 10.2.2.1 255.255.255.0 secondary
interface GigabitEthernet0/2
 ip address dhcp
router ospf 1
 network 10.1.1.0 0.0.0.255 area 0
";

    #[test]
    fn test_interface_index() {
        let registry = SchemaRegistry::new();
        let schema = registry.get("cisco-ios").unwrap();
        let tree = parse(CONFIG, schema);
        let ctx = Context::new(&tree, "cisco-ios").with_schema(schema);

        let addrs = ctx.interface_addresses();
        assert_eq!(addrs.len(), 3);
        assert_eq!(addrs[0].interface, "Loopback0");
        assert_eq!(addrs[2].address, Ipv4Addr::new(10, 2, 2, 1));
        // cached
        assert!(std::ptr::eq(addrs, ctx.interface_addresses()));
    }

    #[test]
    fn test_find_all_and_family() {
        let registry = SchemaRegistry::new();
        let schema = registry.get("cisco-ios").unwrap();
        let tree = parse(CONFIG, schema);
        let ctx = Context::new(&tree, "cisco-ios").with_schema(schema);

        assert_eq!(ctx.find_all("interface").len(), 3);
        assert_eq!(ctx.find_all("network").len(), 1);
        assert_eq!(ctx.family(), "cisco");
        assert!(!ctx.case_sensitive());

        let bare = Context::new(&tree, "juniper-junos");
        assert_eq!(bare.family(), "juniper");
        assert_eq!(bare.get_ast().len(), 4);
    }
}
