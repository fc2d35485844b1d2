//! Cisco IOS family rules

use crate::context::Context;
use crate::diagnostic::Severity;
use crate::helpers::cisco::{has_allowed_vlans, is_trunk_port};
use crate::rule::{NativeRule, Verdict};
use crate::tree::ConfigNode;
use anyhow::Context as _;
use std::net::Ipv4Addr;

const IOS_LIKE: &[&str] = &["cisco-ios", "cisco-nxos", "arista-eos"];

pub(super) fn rules() -> Vec<NativeRule> {
    vec![
        NativeRule::new("cisco-ospf-network-match", "router ospf", ospf_networks)
            .with_vendor("cisco-ios")
            .with_severity(Severity::Error)
            .with_category("routing")
            .with_description("OSPF network statements should cover a configured interface address")
            .with_remediation("Fix the network/wildcard pair or remove the stale statement"),
        NativeRule::new("cisco-trunk-allowed-vlans", "interface", |node, _| {
            if !is_trunk_port(node) {
                return Ok(Verdict::informational(format!("{} is not a trunk port", node.id)));
            }
            Ok(Verdict::check(
                has_allowed_vlans(node),
                format!("{} restricts allowed VLANs", node.id),
                format!("{} trunk carries all VLANs", node.id),
            ))
        })
        .with_vendors(IOS_LIKE)
        .with_severity(Severity::Warning)
        .with_category("switching")
        .with_description("Trunk ports should list their allowed VLANs")
        .with_remediation("Add `switchport trunk allowed vlan <list>`"),
        NativeRule::new("cisco-vty-ssh-only", "line vty", vty_transport)
            .with_vendors(IOS_LIKE)
            .with_severity(Severity::Error)
            .with_category("security")
            .with_description("Remote terminal lines should accept SSH only")
            .with_remediation("Set `transport input ssh` on every vty line"),
        NativeRule::new("cisco-no-http-server", "ip http server", |_, _| {
            Ok(Verdict::fail("Plain-text HTTP management server is enabled"))
        })
        .with_vendors(IOS_LIKE)
        .with_severity(Severity::Warning)
        .with_category("security")
        .with_description("The unencrypted HTTP server should be disabled")
        .with_remediation("Configure `no ip http server`"),
        NativeRule::new("cisco-enable-secret", "enable password", |_, _| {
            Ok(Verdict::fail("Enable password is stored with reversible encryption"))
        })
        .with_vendors(IOS_LIKE)
        .with_severity(Severity::Error)
        .with_category("security")
        .with_description("Privileged access should use `enable secret`")
        .with_remediation("Replace `enable password` with `enable secret`"),
        NativeRule::new("cisco-snmp-default-community", "snmp-server community", |node, _| {
            let community = node.param(2).unwrap_or_default();
            Ok(Verdict::check(
                !matches!(community.to_lowercase().as_str(), "public" | "private"),
                "SNMP community is not a well-known default",
                format!("SNMP community '{}' is a well-known default", community),
            ))
        })
        .with_vendors(IOS_LIKE)
        .with_severity(Severity::Error)
        .with_category("security")
        .with_description("SNMP communities must not use default strings")
        .with_remediation("Use a unique community string, or move to SNMPv3"),
    ]
}

/// Match every `network A W area X` against the interface address index
fn ospf_networks(node: &ConfigNode, ctx: &Context<'_>) -> anyhow::Result<Verdict> {
    let interfaces = ctx.interface_addresses();
    let mut checked = 0;
    let mut unmatched = Vec::new();

    for stmt in node.children_matching("network") {
        let network = parse_addr(stmt.param(1), &stmt.id)?;
        let wildcard = parse_addr(stmt.param(2), &stmt.id)?;
        let keep = !u32::from(wildcard);
        let target = u32::from(network) & keep;

        checked += 1;
        if !interfaces
            .iter()
            .any(|iface| u32::from(iface.address) & keep == target)
        {
            unmatched.push(format!("{} {}", network, wildcard));
        }
    }

    Ok(match (checked, unmatched.is_empty()) {
        (0, _) => Verdict::informational(format!("{} has no network statements", node.id)),
        (_, true) => Verdict::pass(format!(
            "All {} network statement(s) match a configured interface",
            checked
        )),
        (_, false) => Verdict::fail(format!(
            "OSPF network {} does not match any configured interface",
            unmatched.join(", ")
        )),
    })
}

fn parse_addr(param: Option<&str>, statement: &str) -> anyhow::Result<Ipv4Addr> {
    let text = param.with_context(|| format!("incomplete statement '{}'", statement))?;
    text.parse::<Ipv4Addr>()
        .with_context(|| format!("invalid address '{}' in '{}'", text, statement))
}

/// `transport input` must list ssh and nothing else
fn vty_transport(node: &ConfigNode, _ctx: &Context<'_>) -> anyhow::Result<Verdict> {
    let Some(transport) = node.child("transport input") else {
        return Ok(Verdict::fail(format!(
            "{} has no transport input restriction",
            node.id
        )));
    };

    let protocols: Vec<&str> = transport.params.iter().skip(2).map(String::as_str).collect();
    let ssh_only = !protocols.is_empty() && protocols.iter().all(|p| p.eq_ignore_ascii_case("ssh"));
    Ok(Verdict::check(
        ssh_only,
        format!("{} accepts SSH only", node.id),
        format!("{} accepts '{}'", node.id, protocols.join(" ")),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{Outcome, RuleResult};
    use crate::rules::builtin::run_rules;

    fn only<'a>(results: &'a [RuleResult], rule_id: &str) -> Vec<&'a RuleResult> {
        results.iter().filter(|r| r.rule_id == rule_id).collect()
    }

    fn ospf(network: &str) -> String {
        format!(
            "interface Gi0/1\n ip address 10.0.0.1 255.255.255.0\n!\nrouter ospf 1\n network {} area 0\n",
            network
        )
    }

    #[test]
    fn test_ospf_host_match() {
        let results = run_rules("cisco-ios", &ospf("10.0.0.1 0.0.0.0"), &rules());
        let ospf = only(&results, "cisco-ospf-network-match");
        assert_eq!(ospf.len(), 1);
        assert!(ospf[0].passed);
        assert_eq!(ospf[0].outcome, Outcome::Pass);
    }

    #[test]
    fn test_ospf_mismatch() {
        let results = run_rules("cisco-ios", &ospf("10.0.0.2 0.0.0.0"), &rules());
        let ospf = only(&results, "cisco-ospf-network-match");
        assert!(!ospf[0].passed);
        assert!(ospf[0]
            .message
            .contains("does not match any configured interface"));
        assert_eq!(ospf[0].loc.start_line, 4);
    }

    #[test]
    fn test_ospf_subnet_wildcard() {
        let results = run_rules("cisco-ios", &ospf("10.0.0.0 0.0.0.255"), &rules());
        assert!(only(&results, "cisco-ospf-network-match")[0].passed);
    }

    #[test]
    fn test_ospf_without_networks_is_informational() {
        let results = run_rules("cisco-ios", "router ospf 1\n router-id 1.1.1.1\n", &rules());
        let ospf = only(&results, "cisco-ospf-network-match");
        assert_eq!(ospf[0].outcome, Outcome::Informational);
    }

    #[test]
    fn test_ospf_malformed_network_is_an_error() {
        let results = run_rules("cisco-ios", "router ospf 1\n network 10.0.0.x 0.0.0.0 area 0\n", &rules());
        let ospf = only(&results, "cisco-ospf-network-match");
        assert_eq!(ospf[0].level, Severity::Error);
        assert!(ospf[0].message.contains("10.0.0.x"));
    }

    #[test]
    fn test_trunk_allowed_vlans() {
        let config = "\
interface Gi0/1
 switchport mode trunk
interface Gi0/2
 switchport mode trunk
 switchport trunk allowed vlan 10,20
interface Gi0/3
 switchport mode access
";
        let results = run_rules("cisco-ios", config, &rules());
        let outcomes: Vec<Outcome> = only(&results, "cisco-trunk-allowed-vlans")
            .iter()
            .map(|r| r.outcome)
            .collect();
        assert_eq!(
            outcomes,
            vec![Outcome::Fail, Outcome::Pass, Outcome::Informational]
        );
    }

    #[test]
    fn test_vty_transport() {
        let config = "\
line vty 0 4
 transport input ssh
line vty 5 15
 transport input telnet ssh
line vty 16 20
 login local
";
        let results = run_rules("cisco-ios", config, &rules());
        let vty = only(&results, "cisco-vty-ssh-only");
        assert_eq!(vty.len(), 3);
        assert!(vty[0].passed);
        assert!(!vty[1].passed);
        assert!(vty[1].message.contains("telnet ssh"));
        assert!(vty[2].message.contains("no transport input"));
    }

    #[test]
    fn test_management_plane() {
        let config = "\
enable password cisco
ip http server
ip http secure-server
snmp-server community public RO
snmp-server community N0tDefault RO
";
        let results = run_rules("cisco-ios", config, &rules());
        assert_eq!(only(&results, "cisco-enable-secret").len(), 1);
        assert_eq!(only(&results, "cisco-no-http-server").len(), 1);
        let snmp = only(&results, "cisco-snmp-default-community");
        assert!(!snmp[0].passed);
        assert!(snmp[1].passed);
    }
}
