//! Compiles JSON conditions into predicate closures
//!
//! Everything that can be checked ahead of time (helper names, regexes,
//! field names, operand types) is checked here, once per rule. The returned
//! predicate only fails at run time when a helper rejects its arguments.

use super::types::{CheckKind, ExprOp, JsonCheck, MatchMode, MatchTarget};
use crate::context::Context;
use crate::helpers::{truthy, Arg, HelperError, HelperRegistry};
use crate::tree::{collapse_whitespace, ConfigNode};
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use thiserror::Error;

/// Compiled condition
pub type Predicate =
    Box<dyn Fn(&ConfigNode, &Context<'_>) -> Result<bool, HelperError> + Send + Sync>;

/// Error compiling a condition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Helper(#[from] HelperError),

    #[error("Invalid regex '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },

    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Operator '{0}' requires a value")]
    MissingValue(ExprOp),

    #[error("Invalid value for '{op}': {message}")]
    InvalidValue { op: String, message: String },
}

/// Compiles [`JsonCheck`] trees against a helper registry
pub struct PredicateCompiler<'r> {
    helpers: &'r HelperRegistry,
}

impl<'r> PredicateCompiler<'r> {
    pub fn new(helpers: &'r HelperRegistry) -> Self {
        Self { helpers }
    }

    pub fn compile(&self, check: &JsonCheck) -> Result<Predicate, CompileError> {
        let inner = self.compile_kind(&check.kind)?;
        if check.negate {
            Ok(Box::new(move |node, ctx| inner(node, ctx).map(|b| !b)))
        } else {
            Ok(inner)
        }
    }

    fn compile_kind(&self, kind: &CheckKind) -> Result<Predicate, CompileError> {
        match kind {
            CheckKind::Match {
                pattern,
                mode,
                target,
                ignore_case,
            } => compile_match(pattern, *mode, *target, *ignore_case),

            CheckKind::ChildExists { selector } => {
                let selector = selector.clone();
                Ok(Box::new(move |node, _| Ok(node.has_child_prefix(&selector))))
            }

            CheckKind::ChildNotExists { selector } => {
                let selector = selector.clone();
                Ok(Box::new(move |node, _| Ok(!node.has_child_prefix(&selector))))
            }

            CheckKind::Helper { helper, args } => self.compile_helper(helper, args.as_deref()),

            CheckKind::Expr { field, op, value } => compile_expr(field, *op, value.as_ref()),

            CheckKind::And { conditions } => {
                let compiled = self.compile_all(conditions)?;
                Ok(Box::new(move |node, ctx| {
                    for predicate in &compiled {
                        if !predicate(node, ctx)? {
                            return Ok(false);
                        }
                    }
                    Ok(true)
                }))
            }

            CheckKind::Or { conditions } => {
                let compiled = self.compile_all(conditions)?;
                Ok(Box::new(move |node, ctx| {
                    for predicate in &compiled {
                        if predicate(node, ctx)? {
                            return Ok(true);
                        }
                    }
                    Ok(false)
                }))
            }

            CheckKind::Not { condition } => {
                let inner = self.compile(condition)?;
                Ok(Box::new(move |node, ctx| inner(node, ctx).map(|b| !b)))
            }
        }
    }

    fn compile_all(&self, conditions: &[JsonCheck]) -> Result<Vec<Predicate>, CompileError> {
        conditions.iter().map(|c| self.compile(c)).collect()
    }

    fn compile_helper(&self, name: &str, args: Option<&[Value]>) -> Result<Predicate, CompileError> {
        let helper = self.helpers.resolve(name)?;
        let specs = match args {
            Some(args) => args
                .iter()
                .map(ArgSpec::from_json)
                .collect::<Result<Vec<_>, _>>()?,
            None => vec![ArgSpec::Node],
        };

        Ok(Box::new(move |node, ctx| {
            let args: Vec<Arg<'_, '_>> = specs
                .iter()
                .map(|spec| match spec {
                    ArgSpec::Node => Arg::Node(node),
                    ArgSpec::Context => Arg::Context(ctx),
                    ArgSpec::Literal(value) => Arg::Value(value),
                })
                .collect();
            helper.call(ctx, &args).map(|v| truthy(&v))
        }))
    }
}

enum ArgSpec {
    Node,
    Context,
    Literal(Value),
}

impl ArgSpec {
    fn from_json(value: &Value) -> Result<Self, CompileError> {
        let reference = value
            .as_object()
            .filter(|o| o.len() == 1)
            .and_then(|o| o.get("$ref"));
        match reference {
            None => Ok(ArgSpec::Literal(value.clone())),
            Some(Value::String(r)) if r == "node" => Ok(ArgSpec::Node),
            Some(Value::String(r)) if r == "context" => Ok(ArgSpec::Context),
            Some(other) => Err(CompileError::InvalidValue {
                op: "$ref".to_string(),
                message: format!("unknown reference {}", other),
            }),
        }
    }
}

enum TextTest {
    Contains(String),
    Exact(String),
    Prefix(String),
    /// Case-sensitive and case-insensitive variants of one pattern
    Regex(Regex, Regex),
}

fn compile_match(
    pattern: &str,
    mode: MatchMode,
    target: MatchTarget,
    ignore_case: Option<bool>,
) -> Result<Predicate, CompileError> {
    if pattern.is_empty() {
        return Err(CompileError::InvalidValue {
            op: "match".to_string(),
            message: "pattern must not be empty".to_string(),
        });
    }
    let text = match target {
        MatchTarget::Id => collapse_whitespace(pattern),
        MatchTarget::RawText => pattern.to_string(),
    };
    let test = match mode {
        MatchMode::Contains => TextTest::Contains(text),
        MatchMode::Exact => TextTest::Exact(text),
        MatchMode::Prefix => TextTest::Prefix(text),
        MatchMode::Regex => TextTest::Regex(build_regex(pattern, false)?, build_regex(pattern, true)?),
    };

    Ok(Box::new(move |node, ctx| {
        let subject = match target {
            MatchTarget::Id => node.id.as_str(),
            MatchTarget::RawText => node.raw_text.as_str(),
        };
        let fold = ignore_case.unwrap_or(!ctx.case_sensitive());
        Ok(match &test {
            TextTest::Regex(sensitive, insensitive) => {
                if fold {
                    insensitive.is_match(subject)
                } else {
                    sensitive.is_match(subject)
                }
            }
            TextTest::Contains(p) => compare_text(subject, p, fold, |s, p| s.contains(p)),
            TextTest::Exact(p) => compare_text(subject, p, fold, |s, p| s == p),
            TextTest::Prefix(p) => compare_text(subject, p, fold, |s, p| s.starts_with(p)),
        })
    }))
}

fn build_regex(pattern: &str, case_insensitive: bool) -> Result<Regex, CompileError> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| CompileError::InvalidRegex {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

fn compare_text(subject: &str, pattern: &str, fold: bool, test: fn(&str, &str) -> bool) -> bool {
    if fold {
        test(&subject.to_lowercase(), &pattern.to_lowercase())
    } else {
        test(subject, pattern)
    }
}

/// Node fields readable by `expr`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    RawText,
    Type,
    ChildCount,
    ParamCount,
    Param(usize),
    StartLine,
    EndLine,
}

impl Field {
    fn parse(name: &str) -> Result<Self, CompileError> {
        let field = match name {
            "id" => Field::Id,
            "raw_text" => Field::RawText,
            "type" => Field::Type,
            "child_count" => Field::ChildCount,
            "param_count" => Field::ParamCount,
            "start_line" => Field::StartLine,
            "end_line" => Field::EndLine,
            other => {
                let index = other
                    .strip_prefix("params.")
                    .and_then(|i| i.parse::<usize>().ok())
                    .ok_or_else(|| CompileError::UnknownField(other.to_string()))?;
                Field::Param(index)
            }
        };
        Ok(field)
    }

    fn read(self, node: &ConfigNode) -> Option<Value> {
        match self {
            Field::Id => Some(Value::from(node.id.as_str())),
            Field::RawText => Some(Value::from(node.raw_text.as_str())),
            Field::Type => Some(Value::from(node.kind.to_string())),
            Field::ChildCount => Some(Value::from(node.children.len())),
            Field::ParamCount => Some(Value::from(node.params.len())),
            Field::Param(i) => node.param(i).map(Value::from),
            Field::StartLine => Some(Value::from(node.loc.start_line)),
            Field::EndLine => Some(Value::from(node.loc.end_line)),
        }
    }
}

/// Operator with its operand validated
enum Comparison {
    Eq(Value),
    Ne(Value),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    /// Case-sensitive and case-insensitive variants of one pattern
    Matches(Regex, Regex),
    Ordered(ExprOp, f64),
    In(Vec<Value>),
    Exists(bool),
}

fn compile_expr(field: &str, op: ExprOp, value: Option<&Value>) -> Result<Predicate, CompileError> {
    let field = Field::parse(field)?;
    let invalid = |message: &str| CompileError::InvalidValue {
        op: op.to_string(),
        message: message.to_string(),
    };

    let comparison = match (op, value) {
        (ExprOp::Exists, None) => Comparison::Exists(true),
        (ExprOp::Exists, Some(v)) => {
            Comparison::Exists(v.as_bool().ok_or_else(|| invalid("expected a boolean"))?)
        }
        (op, None) => return Err(CompileError::MissingValue(op)),
        (ExprOp::Eq, Some(v)) => Comparison::Eq(v.clone()),
        (ExprOp::Ne, Some(v)) => Comparison::Ne(v.clone()),
        (ExprOp::Contains, Some(v)) => Comparison::Contains(scalar_text(v).ok_or_else(|| invalid("expected a scalar"))?),
        (ExprOp::StartsWith, Some(v)) => {
            Comparison::StartsWith(scalar_text(v).ok_or_else(|| invalid("expected a scalar"))?)
        }
        (ExprOp::EndsWith, Some(v)) => {
            Comparison::EndsWith(scalar_text(v).ok_or_else(|| invalid("expected a scalar"))?)
        }
        (ExprOp::Matches, Some(v)) => {
            let pattern = v.as_str().ok_or_else(|| invalid("expected a regex string"))?;
            Comparison::Matches(build_regex(pattern, false)?, build_regex(pattern, true)?)
        }
        (ExprOp::Gt | ExprOp::Ge | ExprOp::Lt | ExprOp::Le, Some(v)) => {
            Comparison::Ordered(op, v.as_f64().ok_or_else(|| invalid("expected a number"))?)
        }
        (ExprOp::In, Some(v)) => {
            Comparison::In(v.as_array().cloned().ok_or_else(|| invalid("expected an array"))?)
        }
    };

    Ok(Box::new(move |node, ctx| {
        let actual = field.read(node);
        Ok(evaluate(&comparison, actual.as_ref(), !ctx.case_sensitive()))
    }))
}

/// Apply a comparison; a missing field satisfies only `ne` and `exists: false`
fn evaluate(comparison: &Comparison, actual: Option<&Value>, fold: bool) -> bool {
    let Some(actual) = actual else {
        return matches!(comparison, Comparison::Ne(_) | Comparison::Exists(false));
    };
    let text = || scalar_text(actual).unwrap_or_default();

    match comparison {
        Comparison::Exists(expected) => *expected,
        Comparison::Eq(expected) => values_equal(actual, expected, fold),
        Comparison::Ne(expected) => !values_equal(actual, expected, fold),
        Comparison::Contains(p) => compare_text(&text(), p, fold, |s, p| s.contains(p)),
        Comparison::StartsWith(p) => compare_text(&text(), p, fold, |s, p| s.starts_with(p)),
        Comparison::EndsWith(p) => compare_text(&text(), p, fold, |s, p| s.ends_with(p)),
        Comparison::Matches(sensitive, insensitive) => {
            let re = if fold { insensitive } else { sensitive };
            re.is_match(&text())
        }
        Comparison::Ordered(op, bound) => match as_number(actual) {
            Some(n) => match op {
                ExprOp::Gt => n > *bound,
                ExprOp::Ge => n >= *bound,
                ExprOp::Lt => n < *bound,
                _ => n <= *bound,
            },
            None => false,
        },
        Comparison::In(candidates) => candidates.iter().any(|c| values_equal(actual, c, fold)),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Numeric when both sides are numbers, textual otherwise
fn values_equal(actual: &Value, expected: &Value, fold: bool) -> bool {
    if let (Some(a), Some(b)) = (as_number(actual), expected.as_f64()) {
        return a == b;
    }
    match (scalar_text(actual), scalar_text(expected)) {
        (Some(a), Some(b)) => compare_text(&a, &b, fold, |s, p| s == p),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Loc;
    use crate::schema::SchemaRegistry;
    use serde_json::json;

    fn check(value: Value) -> JsonCheck {
        serde_json::from_value(value).unwrap()
    }

    fn trunk(allowed: bool) -> Vec<ConfigNode> {
        let mut node = ConfigNode::section("interface Gi0/1", "interface Gi0/1", Loc::new(1, 3));
        node.children
            .push(ConfigNode::leaf("switchport mode trunk", " switchport mode trunk", Loc::line(2)));
        if allowed {
            node.children.push(ConfigNode::leaf(
                "switchport trunk allowed vlan 10,20",
                " switchport trunk allowed vlan 10,20",
                Loc::line(3),
            ));
        }
        vec![node]
    }

    fn eval(value: Value, tree: &[ConfigNode], vendor: &str) -> Result<bool, HelperError> {
        let helpers = HelperRegistry::new();
        let predicate = PredicateCompiler::new(&helpers).compile(&check(value)).unwrap();
        let registry = SchemaRegistry::new();
        let ctx = match registry.get(vendor) {
            Some(schema) => Context::new(tree, vendor).with_schema(schema),
            None => Context::new(tree, vendor),
        };
        predicate(&tree[0], &ctx)
    }

    #[test]
    fn test_child_exists() {
        let rule = json!({"type": "child_exists", "selector": "switchport trunk allowed vlan"});
        assert!(!eval(rule.clone(), &trunk(false), "cisco-ios").unwrap());
        assert!(eval(rule, &trunk(true), "cisco-ios").unwrap());

        let rule = json!({"type": "child_not_exists", "selector": "SHUTDOWN"});
        assert!(eval(rule, &trunk(false), "cisco-ios").unwrap());
    }

    #[test]
    fn test_helper_and_not() {
        let rule = json!({
            "type": "or",
            "conditions": [
                {"type": "not", "condition": {"type": "helper", "helper": "cisco.isTrunkPort"}},
                {"type": "child_exists", "selector": "switchport trunk allowed vlan"}
            ]
        });
        assert!(!eval(rule.clone(), &trunk(false), "cisco-ios").unwrap());
        assert!(eval(rule, &trunk(true), "cisco-ios").unwrap());
    }

    #[test]
    fn test_helper_literal_args() {
        let rule = json!({"type": "helper", "helper": "hasChild",
                          "args": [{"$ref": "node"}, "switchport mode"]});
        assert!(eval(rule, &trunk(false), "cisco-ios").unwrap());
    }

    #[test]
    fn test_helper_runtime_error_propagates() {
        let rule = json!({"type": "helper", "helper": "isTrunkPort"});
        assert!(eval(rule, &trunk(false), "vyos").is_err());
    }

    #[test]
    fn test_empty_and_or() {
        assert!(eval(json!({"type": "and", "conditions": []}), &trunk(false), "cisco-ios").unwrap());
        assert!(!eval(json!({"type": "or", "conditions": []}), &trunk(false), "cisco-ios").unwrap());
    }

    #[test]
    fn test_negate_flag() {
        let rule = json!({"type": "match", "pattern": "gi0/1", "negate": true});
        assert!(!eval(rule, &trunk(false), "cisco-ios").unwrap());
    }

    #[test]
    fn test_match_follows_schema_case() {
        let rule = json!({"type": "match", "pattern": "INTERFACE", "mode": "prefix"});
        assert!(eval(rule.clone(), &trunk(false), "cisco-ios").unwrap());
        assert!(!eval(rule, &trunk(false), "juniper-junos").unwrap());

        let rule = json!({"type": "match", "pattern": "INTERFACE", "mode": "prefix", "ignore_case": true});
        assert!(eval(rule, &trunk(false), "juniper-junos").unwrap());
    }

    #[test]
    fn test_match_modes() {
        let tree = trunk(false);
        assert!(eval(json!({"type": "match", "pattern": "interface  Gi0/1", "mode": "exact"}), &tree, "cisco-ios").unwrap());
        assert!(eval(json!({"type": "match", "pattern": "^interface gi\\d", "mode": "regex"}), &tree, "cisco-ios").unwrap());
        assert!(!eval(json!({"type": "match", "pattern": "^interface gi\\d", "mode": "regex"}), &tree, "juniper-junos").unwrap());
        assert!(eval(json!({"type": "match", "pattern": "Gi0", "target": "raw_text"}), &tree, "cisco-ios").unwrap());
    }

    #[test]
    fn test_expr_fields() {
        let tree = trunk(true);
        let ok = |v: Value| eval(v, &tree, "cisco-ios").unwrap();
        assert!(ok(json!({"type": "expr", "field": "child_count", "op": "ge", "value": 2})));
        assert!(!ok(json!({"type": "expr", "field": "child_count", "op": "gt", "value": 2})));
        assert!(ok(json!({"type": "expr", "field": "type", "op": "eq", "value": "section"})));
        assert!(ok(json!({"type": "expr", "field": "params.1", "op": "starts_with", "value": "gi"})));
        assert!(ok(json!({"type": "expr", "field": "params.1", "op": "in", "value": ["Gi0/1", "Gi0/2"]})));
        assert!(ok(json!({"type": "expr", "field": "params.5", "op": "exists", "value": false})));
        assert!(ok(json!({"type": "expr", "field": "params.5", "op": "ne", "value": "x"})));
        assert!(!ok(json!({"type": "expr", "field": "params.5", "op": "eq", "value": "x"})));
        assert!(ok(json!({"type": "expr", "field": "start_line", "op": "eq", "value": 1})));
        assert!(ok(json!({"type": "expr", "field": "id", "op": "matches", "value": "Gi\\d/\\d$"})));
    }

    #[test]
    fn test_expr_matches_follows_dialect_case() {
        let tree = trunk(false);
        let rule = json!({"type": "expr", "field": "id", "op": "matches", "value": "^INTERFACE gi"});
        assert!(eval(rule.clone(), &tree, "cisco-ios").unwrap());
        assert!(!eval(rule, &tree, "juniper-junos").unwrap());
    }

    #[test]
    fn test_compile_errors() {
        let helpers = HelperRegistry::new();
        let compiler = PredicateCompiler::new(&helpers);
        let err = |v: Value| compiler.compile(&check(v)).err().unwrap();

        assert!(matches!(
            err(json!({"type": "helper", "helper": "nope"})),
            CompileError::Helper(HelperError::UnknownHelper(_))
        ));
        assert!(matches!(
            err(json!({"type": "match", "pattern": "(", "mode": "regex"})),
            CompileError::InvalidRegex { .. }
        ));
        assert_eq!(
            err(json!({"type": "expr", "field": "color", "op": "eq", "value": 1})),
            CompileError::UnknownField("color".to_string())
        );
        assert_eq!(
            err(json!({"type": "expr", "field": "id", "op": "eq"})),
            CompileError::MissingValue(ExprOp::Eq)
        );
        assert!(matches!(
            err(json!({"type": "expr", "field": "id", "op": "gt", "value": "ten"})),
            CompileError::InvalidValue { .. }
        ));
        assert!(matches!(
            err(json!({"type": "and", "conditions": [{"type": "helper", "helper": "cisco.bogus"}]})),
            CompileError::Helper(_)
        ));
        assert!(matches!(
            err(json!({"type": "helper", "helper": "isShutdown", "args": [{"$ref": "parent"}]})),
            CompileError::InvalidValue { .. }
        ));
    }
}
