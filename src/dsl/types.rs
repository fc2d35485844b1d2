//! Data-only rule format

use crate::diagnostic::Severity;
use crate::rule::VendorScope;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A rule file: `{"version": "1", "rules": [...]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRuleFile {
    #[serde(default)]
    pub version: Option<String>,
    pub rules: Vec<JsonRule>,
}

/// A rule defined purely as data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonRule {
    /// Unique rule identifier
    pub id: String,

    /// Selector matched against node ids (e.g., "interface")
    pub selector: String,

    /// Vendor scope: omitted, one id, or a list
    #[serde(default)]
    pub vendor: VendorScope,

    #[serde(default)]
    pub category: Option<String>,

    /// Level reported on failure
    #[serde(default)]
    pub severity: Severity,

    /// Failure message; `{id}` expands to the node id
    pub message: String,

    /// Message for passing nodes
    #[serde(default)]
    pub pass_message: Option<String>,

    #[serde(default)]
    pub remediation: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub owners: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Disabled rules are compiled, then dropped at load time
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Violation condition: a node for which it holds fails
    pub check: JsonCheck,
}

fn default_true() -> bool {
    true
}

/// A condition, optionally negated.
///
/// `negate` sits beside the `type` tag in the same object. Every other key
/// must belong to the tagged shape; unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonCheck {
    #[serde(flatten)]
    pub kind: CheckKind,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub negate: bool,
}

impl JsonCheck {
    pub fn new(kind: CheckKind) -> Self {
        Self {
            kind,
            negate: false,
        }
    }

    pub fn negated(mut self) -> Self {
        self.negate = !self.negate;
        self
    }
}

impl<'de> Deserialize<'de> for JsonCheck {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut value = Value::deserialize(deserializer)?;
        let negate = match value.as_object_mut().and_then(|fields| fields.remove("negate")) {
            None => false,
            Some(Value::Bool(negate)) => negate,
            Some(other) => {
                return Err(de::Error::custom(format!(
                    "`negate` must be a boolean, found {}",
                    other
                )))
            }
        };
        let kind = CheckKind::deserialize(value).map_err(de::Error::custom)?;
        Ok(Self { kind, negate })
    }
}

/// Condition shapes, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum CheckKind {
    /// Text test on the node id or raw text
    Match {
        pattern: String,
        #[serde(default)]
        mode: MatchMode,
        #[serde(default)]
        target: MatchTarget,
        /// Omitted: follow the dialect's case sensitivity
        #[serde(default)]
        ignore_case: Option<bool>,
    },

    /// Some direct child's id starts with `selector` (case-insensitive)
    ChildExists { selector: String },

    /// No direct child's id starts with `selector`
    ChildNotExists { selector: String },

    /// Call a registered helper; a truthy result is a violation
    Helper {
        helper: String,
        /// Literals or `{"$ref": "node"}` / `{"$ref": "context"}`; defaults to the node
        #[serde(default)]
        args: Option<Vec<Value>>,
    },

    /// Compare one node field against a literal
    Expr {
        field: String,
        op: ExprOp,
        #[serde(default)]
        value: Option<Value>,
    },

    And { conditions: Vec<JsonCheck> },

    Or { conditions: Vec<JsonCheck> },

    Not { condition: Box<JsonCheck> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    #[default]
    Contains,
    Exact,
    Prefix,
    Regex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTarget {
    #[default]
    Id,
    RawText,
}

/// Comparison operators of `expr`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprOp {
    Eq,
    Ne,
    Contains,
    StartsWith,
    EndsWith,
    Matches,
    Gt,
    Ge,
    Lt,
    Le,
    In,
    Exists,
}

impl std::fmt::Display for ExprOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ExprOp::Eq => "eq",
            ExprOp::Ne => "ne",
            ExprOp::Contains => "contains",
            ExprOp::StartsWith => "starts_with",
            ExprOp::EndsWith => "ends_with",
            ExprOp::Matches => "matches",
            ExprOp::Gt => "gt",
            ExprOp::Ge => "ge",
            ExprOp::Lt => "lt",
            ExprOp::Le => "le",
            ExprOp::In => "in",
            ExprOp::Exists => "exists",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserialize_nested_check() {
        let json = r#"{
            "type": "and",
            "conditions": [
                {"type": "helper", "helper": "cisco.isTrunkPort"},
                {"type": "child_exists", "selector": "switchport trunk allowed vlan", "negate": true},
                {"type": "not", "condition": {"type": "match", "pattern": "^interface Vlan", "mode": "regex"}}
            ]
        }"#;
        let check: JsonCheck = serde_json::from_str(json).unwrap();
        assert!(!check.negate);
        let CheckKind::And { conditions } = &check.kind else {
            panic!("expected and");
        };
        assert_eq!(conditions.len(), 3);
        assert_eq!(
            conditions[0].kind,
            CheckKind::Helper {
                helper: "cisco.isTrunkPort".to_string(),
                args: None
            }
        );
        assert!(conditions[1].negate);
        let CheckKind::Not { condition } = &conditions[2].kind else {
            panic!("expected not");
        };
        assert!(matches!(
            condition.kind,
            CheckKind::Match {
                mode: MatchMode::Regex,
                target: MatchTarget::Id,
                ignore_case: None,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result: Result<JsonCheck, _> = serde_json::from_str(r#"{"type": "eval", "code": "1"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_check_keys_rejected() {
        let typo: Result<JsonCheck, _> = serde_json::from_str(
            r#"{"type": "child_exists", "selector": "description", "negated": true}"#,
        );
        assert!(typo.unwrap_err().to_string().contains("negated"));

        let nested: Result<JsonCheck, _> = serde_json::from_str(
            r#"{"type": "or", "conditions": [{"type": "match", "pattern": "x", "bogus": 1}]}"#,
        );
        assert!(nested.is_err());

        let not_bool: Result<JsonCheck, _> =
            serde_json::from_str(r#"{"type": "match", "pattern": "x", "negate": "yes"}"#);
        assert!(not_bool.is_err());
    }

    #[test]
    fn test_unknown_op_rejected() {
        let result: Result<JsonCheck, _> =
            serde_json::from_str(r#"{"type": "expr", "field": "id", "op": "like", "value": "x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_rule_defaults() {
        let rule: JsonRule = serde_json::from_str(
            r#"{"id": "r", "selector": "interface", "message": "m",
                "check": {"type": "child_exists", "selector": "description"}}"#,
        )
        .unwrap();
        assert_eq!(rule.vendor, VendorScope::Any);
        assert_eq!(rule.severity, Severity::Warning);
        assert!(rule.enabled);
        assert!(rule.pass_message.is_none());
    }

    #[test]
    fn test_rule_rejects_unknown_keys() {
        let result: Result<JsonRule, _> = serde_json::from_str(
            r#"{"id": "r", "selector": "x", "message": "m", "sevirity": "error",
                "check": {"type": "child_exists", "selector": "y"}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_yaml_rule() {
        let yaml = r#"
id: huawei-telnet
selector: telnet server enable
vendor: [huawei-vrp]
severity: error
message: Telnet server is enabled
check:
  type: match
  pattern: telnet
  negate: true
"#;
        let rule: JsonRule = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rule.vendor, VendorScope::many(&["huawei-vrp"]));
        assert!(rule.check.negate);
    }
}
