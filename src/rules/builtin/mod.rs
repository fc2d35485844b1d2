//! Built-in compliance rules
//!
//! Each vendor module returns its rules as [`NativeRule`]s built with the
//! same builder JSON rules compile into. Rule ids are prefixed with the
//! vendor family so `rules.extend` / `rules.ignore` prefixes can select them.

mod cisco;
mod common;
mod fortinet;
mod huawei;
mod juniper;

use crate::rule::{NativeRule, Rule};

/// Get all built-in rules
pub fn builtin_rules() -> Vec<Box<dyn Rule>> {
    common::rules()
        .into_iter()
        .chain(cisco::rules())
        .chain(juniper::rules())
        .chain(huawei::rules())
        .chain(fortinet::rules())
        .map(|rule: NativeRule| Box::new(rule) as Box<dyn Rule>)
        .collect()
}

/// Parse `text` under `vendor` and run `rules` over it
#[cfg(test)]
pub(crate) fn run_rules(
    vendor: &str,
    text: &str,
    rules: &[NativeRule],
) -> Vec<crate::diagnostic::RuleResult> {
    use crate::context::Context;
    use crate::engine::RuleEngine;
    use crate::schema::SchemaRegistry;

    let registry = SchemaRegistry::new();
    let schema = registry.get(vendor).unwrap();
    let tree = crate::parser::parse(text, schema);
    let ctx = Context::new(&tree, &schema.id).with_schema(schema);
    let rules: Vec<&dyn Rule> = rules.iter().map(|r| r as &dyn Rule).collect();
    RuleEngine::new().run(&ctx, &rules)
}
