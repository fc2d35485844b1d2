//! Fortinet FortiOS rules

use crate::diagnostic::Severity;
use crate::rule::{NativeRule, Verdict};

const INSECURE_ACCESS: &[&str] = &["telnet", "http"];

pub(super) fn rules() -> Vec<NativeRule> {
    vec![NativeRule::new("fortinet-admin-access-secure", "set allowaccess", |node, _| {
        let insecure: Vec<&str> = node
            .params
            .iter()
            .skip(2)
            .map(String::as_str)
            .filter(|p| INSECURE_ACCESS.iter().any(|i| p.eq_ignore_ascii_case(i)))
            .collect();
        Ok(Verdict::check(
            insecure.is_empty(),
            "Administrative access uses encrypted protocols",
            format!("Administrative access allows {}", insecure.join(", ")),
        ))
    })
    .with_vendor("fortinet-fortios")
    .with_severity(Severity::Error)
    .with_category("security")
    .with_description("Interfaces must not allow clear-text administrative access")
    .with_remediation("Remove telnet and http from `set allowaccess`")]
}
