//! Finding types produced by rule evaluation

use serde::{Deserialize, Serialize};

/// Severity level of a finding
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message (also used for passing checks)
    Info,
    /// Warning - potential compliance gap
    #[default]
    Warning,
    /// Error - definite compliance violation
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" | "hint" | "note" | "low" => Ok(Severity::Info),
            "warning" | "warn" | "medium" => Ok(Severity::Warning),
            "error" | "err" | "high" | "critical" => Ok(Severity::Error),
            _ => Err(()),
        }
    }
}

/// Line span of a node in the original source (1-based, inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Loc {
    pub start_line: usize,
    pub end_line: usize,
}

impl Loc {
    pub fn new(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line: end_line.max(start_line),
        }
    }

    /// A span covering a single line
    pub fn line(line: usize) -> Self {
        Self::new(line, line)
    }
}

impl std::fmt::Display for Loc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start_line == self.end_line {
            write!(f, "{}", self.start_line)
        } else {
            write!(f, "{}-{}", self.start_line, self.end_line)
        }
    }
}

/// What a check actually established about a node.
///
/// `Informational` covers checks that echo a fact without evaluating a real
/// condition (or found nothing to evaluate). It counts as passed, but
/// aggregate reports keep it apart from verified passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
    Informational,
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        !matches!(self, Outcome::Fail)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Pass => write!(f, "pass"),
            Outcome::Fail => write!(f, "fail"),
            Outcome::Informational => write!(f, "informational"),
        }
    }
}

/// One finding from running one rule against one matched node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleResult {
    /// Rule ID that produced this finding
    pub rule_id: String,
    /// Id of the node the rule was evaluated against
    pub node_id: String,
    /// `false` only for `Outcome::Fail`
    pub passed: bool,
    pub outcome: Outcome,
    /// Reporting level, independent of `passed`
    pub level: Severity,
    pub message: String,
    pub loc: Loc,
    /// Remediation text (usually only set on failures)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl RuleResult {
    fn with_outcome(
        outcome: Outcome,
        rule_id: &str,
        node_id: &str,
        level: Severity,
        message: &str,
        loc: Loc,
    ) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            node_id: node_id.to_string(),
            passed: outcome.is_passed(),
            outcome,
            level,
            message: message.to_string(),
            loc,
            remediation: None,
        }
    }

    /// A verified pass (reported at info level)
    pub fn pass(rule_id: &str, node_id: &str, message: &str, loc: Loc) -> Self {
        Self::with_outcome(Outcome::Pass, rule_id, node_id, Severity::Info, message, loc)
    }

    /// A failure at the given level
    pub fn fail(rule_id: &str, node_id: &str, level: Severity, message: &str, loc: Loc) -> Self {
        Self::with_outcome(Outcome::Fail, rule_id, node_id, level, message, loc)
    }

    /// An informational echo: nothing was violated, but nothing was verified either
    pub fn informational(rule_id: &str, node_id: &str, message: &str, loc: Loc) -> Self {
        Self::with_outcome(
            Outcome::Informational,
            rule_id,
            node_id,
            Severity::Info,
            message,
            loc,
        )
    }

    /// Attach remediation text
    pub fn with_remediation(mut self, remediation: &str) -> Self {
        self.remediation = Some(remediation.to_string());
        self
    }

    /// Override the reporting level
    pub fn with_level(mut self, level: Severity) -> Self {
        self.level = level;
        self
    }

    pub fn is_failure(&self) -> bool {
        self.outcome == Outcome::Fail
    }

    pub fn is_error(&self) -> bool {
        self.is_failure() && self.level == Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_severity_from_str() {
        assert_eq!("error".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!("warn".parse::<Severity>(), Ok(Severity::Warning));
        assert_eq!("critical".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!("note".parse::<Severity>(), Ok(Severity::Info));
        assert!("bogus".parse::<Severity>().is_err());
    }

    #[test]
    fn test_loc_display() {
        assert_eq!(Loc::line(4).to_string(), "4");
        assert_eq!(Loc::new(4, 9).to_string(), "4-9");
        // end never precedes start
        assert_eq!(Loc::new(7, 3), Loc::line(7));
    }

    #[test]
    fn test_result_constructors() {
        let loc = Loc::line(3);
        let pass = RuleResult::pass("r1", "interface Gi0/1", "ok", loc);
        assert!(pass.passed);
        assert_eq!(pass.outcome, Outcome::Pass);
        assert_eq!(pass.level, Severity::Info);

        let fail = RuleResult::fail("r1", "interface Gi0/1", Severity::Error, "bad", loc)
            .with_remediation("fix it");
        assert!(!fail.passed);
        assert!(fail.is_error());
        assert_eq!(fail.remediation.as_deref(), Some("fix it"));

        let info = RuleResult::informational("r1", "router ospf 1", "nothing to check", loc);
        assert!(info.passed);
        assert_eq!(info.outcome, Outcome::Informational);
        assert!(!info.is_failure());
    }

    #[test]
    fn test_result_serializes_outcome() {
        let r = RuleResult::informational("r", "n", "m", Loc::line(1));
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["outcome"], "informational");
        assert_eq!(json["passed"], true);
        assert_eq!(json["loc"]["start_line"], 1);
        assert!(json.get("remediation").is_none());
    }
}
