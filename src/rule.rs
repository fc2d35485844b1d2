//! Rule contract shared by native and JSON-defined rules

use crate::context::Context;
use crate::diagnostic::{RuleResult, Severity};
use crate::tree::ConfigNode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A compliance rule: a selector, a vendor scope, and a pure check.
///
/// The engine calls `check` once for every node whose id token-prefix-matches
/// `selector`, and only when the scan's vendor is inside `vendors()`.
pub trait Rule: Send + Sync {
    /// Unique rule identifier (e.g., "cisco-trunk-allowed-vlans")
    fn id(&self) -> &str;

    /// Selector matched against node ids
    fn selector(&self) -> &str;

    /// Vendors this rule runs for
    fn vendors(&self) -> &VendorScope;

    fn category(&self) -> Option<&str> {
        None
    }

    fn metadata(&self) -> &RuleMetadata;

    /// Evaluate the rule against one matched node
    fn check(&self, node: &ConfigNode, ctx: &Context<'_>) -> anyhow::Result<RuleResult>;

    fn applies_to(&self, vendor: &str) -> bool {
        self.vendors().applies_to(vendor)
    }
}

/// Descriptive rule metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMetadata {
    /// Level reported when the check fails
    #[serde(default)]
    pub severity: Severity,

    #[serde(default)]
    pub description: Option<String>,

    /// How to fix a failure
    #[serde(default)]
    pub remediation: Option<String>,

    /// Teams or people responsible for the rule
    #[serde(default)]
    pub owners: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,
}

/// Vendors a rule applies to: absent/any, one id, or a list.
///
/// Entries compare case-insensitively; `"*"` and `"any"` match everything
/// and a trailing `*` matches by prefix (`"cisco-*"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VendorScope {
    #[default]
    Any,
    One(String),
    Many(Vec<String>),
}

impl VendorScope {
    pub fn one(vendor: &str) -> Self {
        VendorScope::One(vendor.to_string())
    }

    pub fn many(vendors: &[&str]) -> Self {
        VendorScope::Many(vendors.iter().map(|v| v.to_string()).collect())
    }

    pub fn applies_to(&self, vendor: &str) -> bool {
        match self {
            VendorScope::Any => true,
            VendorScope::One(scope) => scope_matches(scope, vendor),
            VendorScope::Many(scopes) => scopes.iter().any(|s| scope_matches(s, vendor)),
        }
    }
}

fn scope_matches(scope: &str, vendor: &str) -> bool {
    let scope = scope.trim();
    if scope == "*" || scope.eq_ignore_ascii_case("any") {
        return true;
    }
    match scope.strip_suffix('*') {
        Some(prefix) => vendor
            .to_lowercase()
            .starts_with(&prefix.to_lowercase()),
        None => scope.eq_ignore_ascii_case(vendor),
    }
}

/// What a native check decided, before the rule attaches its metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass(String),
    Fail(String),
    /// Nothing to verify (not applicable, or a plain echo)
    Informational(String),
}

impl Verdict {
    pub fn pass(message: impl Into<String>) -> Self {
        Verdict::Pass(message.into())
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Verdict::Fail(message.into())
    }

    pub fn informational(message: impl Into<String>) -> Self {
        Verdict::Informational(message.into())
    }

    /// Pass or fail on a condition
    pub fn check(ok: bool, pass: impl Into<String>, fail: impl Into<String>) -> Self {
        if ok {
            Verdict::Pass(pass.into())
        } else {
            Verdict::Fail(fail.into())
        }
    }
}

type CheckFn = Box<dyn Fn(&ConfigNode, &Context<'_>) -> anyhow::Result<Verdict> + Send + Sync>;

/// A rule backed by a Rust closure.
///
/// JSON rules compile into the same type, so both kinds reach the engine
/// through one contract.
pub struct NativeRule {
    id: String,
    selector: String,
    vendors: VendorScope,
    category: Option<String>,
    metadata: RuleMetadata,
    check: CheckFn,
}

impl NativeRule {
    pub fn new<F>(id: &str, selector: &str, check: F) -> Self
    where
        F: Fn(&ConfigNode, &Context<'_>) -> anyhow::Result<Verdict> + Send + Sync + 'static,
    {
        Self {
            id: id.to_string(),
            selector: selector.to_string(),
            vendors: VendorScope::Any,
            category: None,
            metadata: RuleMetadata::default(),
            check: Box::new(check),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.metadata.severity = severity;
        self
    }

    pub fn with_vendor(mut self, vendor: &str) -> Self {
        self.vendors = VendorScope::one(vendor);
        self
    }

    pub fn with_vendors(mut self, vendors: &[&str]) -> Self {
        self.vendors = VendorScope::many(vendors);
        self
    }

    pub fn with_scope(mut self, scope: VendorScope) -> Self {
        self.vendors = scope;
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.metadata.description = Some(description.to_string());
        self
    }

    pub fn with_remediation(mut self, remediation: &str) -> Self {
        self.metadata.remediation = Some(remediation.to_string());
        self
    }

    pub fn with_owner(mut self, owner: &str) -> Self {
        self.metadata.owners.push(owner.to_string());
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.metadata.tags.push(tag.to_string());
        self
    }

    pub fn with_metadata(mut self, metadata: RuleMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

impl Rule for NativeRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn selector(&self) -> &str {
        &self.selector
    }

    fn vendors(&self) -> &VendorScope {
        &self.vendors
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn check(&self, node: &ConfigNode, ctx: &Context<'_>) -> anyhow::Result<RuleResult> {
        let result = match (self.check)(node, ctx)? {
            Verdict::Pass(message) => RuleResult::pass(&self.id, &node.id, &message, node.loc),
            Verdict::Informational(message) => {
                RuleResult::informational(&self.id, &node.id, &message, node.loc)
            }
            Verdict::Fail(message) => {
                let result =
                    RuleResult::fail(&self.id, &node.id, self.metadata.severity, &message, node.loc);
                match &self.metadata.remediation {
                    Some(remediation) => result.with_remediation(remediation),
                    None => result,
                }
            }
        };
        Ok(result)
    }
}

impl fmt::Debug for NativeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeRule")
            .field("id", &self.id)
            .field("selector", &self.selector)
            .field("vendors", &self.vendors)
            .field("category", &self.category)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}
