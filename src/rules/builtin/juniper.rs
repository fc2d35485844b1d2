//! Juniper Junos rules

use crate::diagnostic::Severity;
use crate::rule::{NativeRule, Verdict};

pub(super) fn rules() -> Vec<NativeRule> {
    vec![
        NativeRule::new("juniper-ssh-root-login-deny", "system", |node, _| {
            let Some(ssh) = node.descend(&["services", "ssh"]) else {
                return Ok(Verdict::informational("SSH service is not configured"));
            };
            let setting = ssh
                .child("root-login")
                .and_then(|c| c.param(1))
                .unwrap_or("allow");
            Ok(Verdict::check(
                setting.eq_ignore_ascii_case("deny"),
                "SSH denies root login",
                format!("SSH root-login is '{}'", setting),
            ))
        })
        .with_vendor("juniper-junos")
        .with_severity(Severity::Error)
        .with_category("security")
        .with_description("Root must not log in over SSH")
        .with_remediation("Set `system services ssh root-login deny`"),
        NativeRule::new("juniper-no-telnet", "system", |node, _| {
            Ok(Verdict::check(
                node.descend(&["services", "telnet"]).is_none(),
                "Telnet service is not enabled",
                "Telnet service is enabled",
            ))
        })
        .with_vendor("juniper-junos")
        .with_severity(Severity::Error)
        .with_category("security")
        .with_description("Telnet exposes credentials in clear text")
        .with_remediation("Delete `system services telnet`"),
    ]
}
