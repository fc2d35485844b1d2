//! Huawei VRP rules

use crate::diagnostic::Severity;
use crate::rule::{NativeRule, Verdict};

pub(super) fn rules() -> Vec<NativeRule> {
    vec![NativeRule::new("huawei-telnet-disabled", "telnet server enable", |_, _| {
        Ok(Verdict::fail("Telnet server is enabled"))
    })
    .with_vendor("huawei-vrp")
    .with_severity(Severity::Error)
    .with_category("security")
    .with_description("Telnet exposes credentials in clear text")
    .with_remediation("Configure `undo telnet server enable` and use STelnet")]
}
