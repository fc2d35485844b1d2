//! Rules shared by the indentation-style dialects

use crate::diagnostic::Severity;
use crate::helpers::common::{has_description, is_shutdown};
use crate::rule::{NativeRule, Verdict};

pub(super) fn rules() -> Vec<NativeRule> {
    vec![NativeRule::new("interface-description", "interface", |node, _| {
        if is_shutdown(node) {
            return Ok(Verdict::informational(format!(
                "{} is administratively down",
                node.id
            )));
        }
        Ok(Verdict::check(
            has_description(node),
            format!("{} has a description", node.id),
            format!("{} has no description", node.id),
        ))
    })
    .with_vendors(&[
        "cisco-ios",
        "cisco-nxos",
        "cisco-iosxr",
        "arista-eos",
        "aruba-aoscx",
        "huawei-vrp",
    ])
    .with_severity(Severity::Info)
    .with_category("documentation")
    .with_description("Active interfaces should carry a description")
    .with_remediation("Add `description <text>` to the interface")]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Outcome;
    use crate::rules::builtin::run_rules;

    const CONFIG: &str = "\
interface Gi0/1
 description uplink
interface Gi0/2
 shutdown
interface Gi0/3
 no shutdown
";

    #[test]
    fn test_interface_description() {
        let results = run_rules("cisco-ios", CONFIG, &rules());
        let outcomes: Vec<Outcome> = results.iter().map(|r| r.outcome).collect();
        assert_eq!(
            outcomes,
            vec![Outcome::Pass, Outcome::Informational, Outcome::Fail]
        );
        assert_eq!(results[2].level, Severity::Info);
        assert_eq!(results[2].message, "interface Gi0/3 has no description");
    }

    #[test]
    fn test_not_run_for_junos() {
        let results = run_rules("juniper-junos", "interfaces {\n ge-0/0/0;\n}\n", &rules());
        assert!(results.is_empty());
    }
}
