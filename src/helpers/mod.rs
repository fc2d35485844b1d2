//! Named helper functions callable from JSON rules
//!
//! Helpers are pure functions over a node (and optionally the scan context
//! or literal values) returning a JSON value. They live in a registry keyed
//! by `(family, name)`:
//!
//! - `isShutdown`: common helper, usable for every vendor
//! - `cisco.isTrunkPort`: vendor-scoped helper, falls back to a common
//!   `isTrunkPort` when no scoped one exists
//! - `isTrunkPort` (unqualified, no common entry): dispatched at run time to
//!   the scoped helper of the scan's vendor family
//!
//! Native rules call the plain Rust functions in the submodules directly.

pub mod aruba;
pub mod cisco;
pub mod common;
pub mod huawei;
pub mod juniper;
pub mod nokia;

use crate::context::Context;
use crate::tree::ConfigNode;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Error resolving or invoking a helper
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HelperError {
    #[error("Unknown helper: {0}")]
    UnknownHelper(String),

    #[error("Helper '{helper}' has no implementation for vendor family '{family}'")]
    NoVendorImplementation { helper: String, family: String },

    #[error("Helper '{helper}': {message}")]
    BadArgument { helper: String, message: String },
}

/// One argument passed to a helper
#[derive(Debug, Clone, Copy)]
pub enum Arg<'n, 'c> {
    Node(&'n ConfigNode),
    Context(&'n Context<'c>),
    Value(&'n Value),
}

pub type HelperFn = Arc<dyn Fn(&[Arg<'_, '_>]) -> Result<Value, HelperError> + Send + Sync>;

/// A helper name resolved against the registry
#[derive(Clone)]
pub struct ResolvedHelper {
    name: String,
    fixed: Option<HelperFn>,
    by_family: HashMap<String, HelperFn>,
}

impl ResolvedHelper {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, ctx: &Context<'_>, args: &[Arg<'_, '_>]) -> Result<Value, HelperError> {
        if let Some(helper) = &self.fixed {
            return helper(args);
        }
        match self.by_family.get(ctx.family()) {
            Some(helper) => helper(args),
            None => Err(HelperError::NoVendorImplementation {
                helper: self.name.clone(),
                family: ctx.family().to_string(),
            }),
        }
    }
}

impl fmt::Debug for ResolvedHelper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedHelper")
            .field("name", &self.name)
            .field("fixed", &self.fixed.is_some())
            .field("families", &self.by_family.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Registry of helpers keyed by `(family, name)`; `None` family is common
#[derive(Clone)]
pub struct HelperRegistry {
    helpers: HashMap<(Option<String>, String), HelperFn>,
}

impl Default for HelperRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HelperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelperRegistry")
            .field("helpers", &self.names())
            .finish()
    }
}

impl HelperRegistry {
    /// Registry with all built-in helpers
    pub fn new() -> Self {
        let mut registry = Self::empty();
        common::register(&mut registry);
        cisco::register(&mut registry);
        juniper::register(&mut registry);
        huawei::register(&mut registry);
        aruba::register(&mut registry);
        nokia::register(&mut registry);
        registry
    }

    pub fn empty() -> Self {
        Self {
            helpers: HashMap::new(),
        }
    }

    /// Register a helper; `family` None makes it common
    pub fn register<F>(&mut self, family: Option<&str>, name: &str, helper: F)
    where
        F: Fn(&[Arg<'_, '_>]) -> Result<Value, HelperError> + Send + Sync + 'static,
    {
        self.helpers.insert(
            (family.map(str::to_lowercase), name.to_string()),
            Arc::new(helper),
        );
    }

    /// Register a boolean predicate over the first node argument
    pub fn register_node_predicate(
        &mut self,
        family: Option<&str>,
        name: &'static str,
        predicate: fn(&ConfigNode) -> bool,
    ) {
        self.register(family, name, move |args| {
            Ok(Value::Bool(predicate(node_arg(name, args)?)))
        });
    }

    /// Qualified names (`family.name`) sorted alphabetically
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .helpers
            .keys()
            .map(|(family, name)| match family {
                Some(family) => format!("{}.{}", family, name),
                None => name.clone(),
            })
            .collect();
        names.sort();
        names
    }

    /// Resolve a helper name at rule compile time
    pub fn resolve(&self, qualified: &str) -> Result<ResolvedHelper, HelperError> {
        let unknown = || HelperError::UnknownHelper(qualified.to_string());

        let (family, name) = match qualified.split_once('.') {
            Some((family, name)) => (Some(family.to_lowercase()), name),
            None => (None, qualified),
        };
        if name.is_empty() {
            return Err(unknown());
        }

        let common = self.helpers.get(&(None, name.to_string())).cloned();
        if let Some(family) = family {
            let scoped = self.helpers.get(&(Some(family), name.to_string())).cloned();
            return match scoped.or(common) {
                Some(helper) => Ok(ResolvedHelper {
                    name: qualified.to_string(),
                    fixed: Some(helper),
                    by_family: HashMap::new(),
                }),
                None => Err(unknown()),
            };
        }

        if common.is_some() {
            return Ok(ResolvedHelper {
                name: qualified.to_string(),
                fixed: common,
                by_family: HashMap::new(),
            });
        }

        let by_family: HashMap<String, HelperFn> = self
            .helpers
            .iter()
            .filter_map(|((family, n), helper)| match family {
                Some(family) if n == name => Some((family.clone(), helper.clone())),
                _ => None,
            })
            .collect();
        if by_family.is_empty() {
            return Err(unknown());
        }
        Ok(ResolvedHelper {
            name: qualified.to_string(),
            fixed: None,
            by_family,
        })
    }
}

/// First node argument
pub fn node_arg<'n>(helper: &str, args: &[Arg<'n, '_>]) -> Result<&'n ConfigNode, HelperError> {
    args.iter()
        .find_map(|a| match a {
            Arg::Node(node) => Some(*node),
            _ => None,
        })
        .ok_or_else(|| HelperError::BadArgument {
            helper: helper.to_string(),
            message: "expected a node argument".to_string(),
        })
}

/// The `index`-th literal argument (node and context arguments are skipped)
pub fn value_arg<'n>(
    helper: &str,
    args: &[Arg<'n, '_>],
    index: usize,
) -> Result<&'n Value, HelperError> {
    args.iter()
        .filter_map(|a| match a {
            Arg::Value(value) => Some(*value),
            _ => None,
        })
        .nth(index)
        .ok_or_else(|| HelperError::BadArgument {
            helper: helper.to_string(),
            message: format!("missing literal argument #{}", index + 1),
        })
}

/// JSON truthiness: null, false, 0, "" and empty collections are false
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Whether some direct child's id equals one of `statements` (case-insensitive)
pub(crate) fn has_statement(node: &ConfigNode, statements: &[&str]) -> bool {
    node.children.iter().any(|c| {
        statements
            .iter()
            .any(|s| crate::tree::collapse_whitespace(s).eq_ignore_ascii_case(&c.id))
    })
}
