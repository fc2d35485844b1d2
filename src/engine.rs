//! Rule evaluation engine

use crate::context::Context;
use crate::diagnostic::{RuleResult, Severity};
use crate::rule::Rule;
use crate::tree::{walk_tree, ConfigNode};
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

/// Per-rule timing statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTiming {
    /// Rule ID
    pub rule_id: String,
    /// Total time spent on this rule
    pub total_time: Duration,
    /// Number of nodes the rule was evaluated against
    pub evaluation_count: usize,
    /// Number of failed results
    pub failure_count: usize,
}

impl RuleTiming {
    pub fn new(rule_id: &str) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            ..Default::default()
        }
    }
}

/// Walks a tree and evaluates every matching rule against every node.
///
/// Nodes are visited depth-first in document order, exactly once. For each
/// node, rules run in the order given. A rule runs only when the scan's
/// vendor is in its scope and its selector matches the node id.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate `rules` over the context's tree
    pub fn run(&self, ctx: &Context<'_>, rules: &[&dyn Rule]) -> Vec<RuleResult> {
        self.execute(ctx, rules, None)
    }

    /// Like [`run`](Self::run), also collecting per-rule timings
    pub fn run_with_stats(
        &self,
        ctx: &Context<'_>,
        rules: &[&dyn Rule],
    ) -> (Vec<RuleResult>, HashMap<String, RuleTiming>) {
        let mut timings = HashMap::new();
        let results = self.execute(ctx, rules, Some(&mut timings));
        (results, timings)
    }

    fn execute(
        &self,
        ctx: &Context<'_>,
        rules: &[&dyn Rule],
        mut timings: Option<&mut HashMap<String, RuleTiming>>,
    ) -> Vec<RuleResult> {
        let active: Vec<&dyn Rule> = rules
            .iter()
            .copied()
            .filter(|rule| rule.applies_to(ctx.vendor()))
            .collect();

        let mut results = Vec::new();
        for node in walk_tree(ctx.get_ast()) {
            for rule in &active {
                if !node.matches(rule.selector()) {
                    continue;
                }

                let start = Instant::now();
                let result = invoke(*rule, node, ctx);

                if let Some(timings) = timings.as_deref_mut() {
                    let entry = timings
                        .entry(rule.id().to_string())
                        .or_insert_with(|| RuleTiming::new(rule.id()));
                    entry.total_time += start.elapsed();
                    entry.evaluation_count += 1;
                    if result.is_failure() {
                        entry.failure_count += 1;
                    }
                }
                results.push(result);
            }
        }
        results
    }
}

/// Run one check, turning errors and panics into a failed error-level result
fn invoke(rule: &dyn Rule, node: &ConfigNode, ctx: &Context<'_>) -> RuleResult {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.check(node, ctx)));
    let message = match outcome {
        Ok(Ok(result)) => return result,
        Ok(Err(e)) => format!("Rule check failed: {:#}", e),
        Err(payload) => format!("Rule check panicked: {}", panic_message(payload.as_ref())),
    };
    log::warn!(
        "Rule '{}' on '{}' (line {}): {}",
        rule.id(),
        node.id,
        node.loc,
        message
    );
    RuleResult::fail(rule.id(), &node.id, Severity::Error, &message, node.loc)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
