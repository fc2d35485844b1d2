//! Netlint - Multi-vendor Network Configuration Linter
//!
//! Parses device configurations from many vendors into one tree model and
//! runs compliance rules over it. Rules are either native Rust closures or
//! JSON/YAML data compiled at load time.
//!
//! # Architecture
//!
//! ```text
//! text + vendor -> SchemaRegistry -> parse -> ConfigTree -> RuleEngine -> RuleResult[]
//! ```
//!
//! The [`Scanner`] ties schemas, helpers, rules and [`Config`] together and
//! can scan many configurations in parallel.
//!
//! # Example
//!
//! ```
//! use netlint::{parse, run, NativeRule, Rule, SchemaRegistry, Verdict};
//!
//! let registry = SchemaRegistry::new();
//! let schema = registry.get("cisco-ios").unwrap();
//! let tree = parse("interface Gi0/1\n switchport mode trunk\n", schema);
//!
//! let rule = NativeRule::new("trunk-allowed-vlans", "interface", |node, _| {
//!     Ok(Verdict::check(
//!         node.has_child_prefix("switchport trunk allowed vlan"),
//!         "allowed VLANs restricted",
//!         "trunk carries all VLANs",
//!     ))
//! });
//! let rules: Vec<Box<dyn Rule>> = vec![Box::new(rule)];
//!
//! let results = run(&tree, &rules, "cisco-ios");
//! assert!(!results[0].passed);
//! ```

pub mod config;
pub mod context;
pub mod diagnostic;
pub mod dsl;
pub mod engine;
pub mod helpers;
pub mod parser;
pub mod rule;
pub mod rules;
pub mod scan;
pub mod schema;
pub mod tree;

// Re-export main types
pub use config::{Config, ConfigError};
pub use context::Context;
pub use diagnostic::{Loc, Outcome, RuleResult, Severity};
pub use dsl::{load_rule_dir, load_rule_file, load_rule_str, JsonCheck, JsonRule, RuleLoadError};
pub use engine::{RuleEngine, RuleTiming};
pub use helpers::{HelperError, HelperRegistry};
pub use parser::parse;
pub use rule::{NativeRule, Rule, RuleMetadata, VendorScope, Verdict};
pub use rules::builtin_rules;
pub use scan::{ScanError, ScanJob, ScanReport, ScanSummary, Scanner};
pub use schema::{BlockStyle, SchemaRegistry, VendorSchema};
pub use tree::{ConfigNode, ConfigTree, NodeKind};

/// Run `rules` over an already parsed tree.
///
/// `vendor` may be a schema id or alias; a known vendor is resolved to its
/// canonical id and schema. An unknown vendor runs without a schema, and the
/// context then compares text case-insensitively.
pub fn run(tree: &[ConfigNode], rules: &[Box<dyn Rule>], vendor: &str) -> Vec<RuleResult> {
    let registry = SchemaRegistry::new();
    let ctx = match registry.get(vendor) {
        Some(schema) => Context::new(tree, &schema.id).with_schema(schema),
        None => Context::new(tree, vendor),
    };
    let rules: Vec<&dyn Rule> = rules.iter().map(|r| r.as_ref()).collect();
    RuleEngine::new().run(&ctx, &rules)
}
