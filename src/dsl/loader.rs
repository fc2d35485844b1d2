//! Rule file loading
//!
//! A rule file is accepted or rejected as a whole: every rule in it must be
//! well-formed, uniquely named and compile, or none of them are loaded.

use super::compiler::{CompileError, PredicateCompiler};
use super::types::{JsonRule, JsonRuleFile};
use crate::helpers::HelperRegistry;
use crate::rule::{NativeRule, RuleMetadata, Verdict};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Error loading a rule file
#[derive(Debug, Error)]
pub enum RuleLoadError {
    #[error("IO error reading {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },

    #[error("Invalid rule '{rule}' in {file}: {message}")]
    Invalid {
        file: String,
        rule: String,
        message: String,
    },

    #[error("Rule '{rule}' in {file} failed to compile: {source}")]
    Compile {
        file: String,
        rule: String,
        #[source]
        source: CompileError,
    },
}

impl RuleLoadError {
    /// File the error refers to
    pub fn file(&self) -> &str {
        match self {
            RuleLoadError::Io { file, .. }
            | RuleLoadError::Parse { file, .. }
            | RuleLoadError::Invalid { file, .. }
            | RuleLoadError::Compile { file, .. } => file,
        }
    }
}

/// Parse, validate and compile every rule of one file.
///
/// `source` names the file in errors; its extension selects YAML or JSON.
/// Without a known extension, text starting with `{` is read as JSON.
pub fn load_rule_str(
    text: &str,
    source: &str,
    helpers: &HelperRegistry,
) -> Result<Vec<NativeRule>, RuleLoadError> {
    let file = parse_rule_file(text, source)?;
    validate(&file, source)?;

    let compiler = PredicateCompiler::new(helpers);
    let mut rules = Vec::with_capacity(file.rules.len());
    for rule in &file.rules {
        // disabled rules must still compile
        let compiled = compile_rule(rule, &compiler).map_err(|e| RuleLoadError::Compile {
            file: source.to_string(),
            rule: rule.id.clone(),
            source: e,
        })?;
        if !rule.enabled {
            log::debug!("Skipping disabled rule '{}' in {}", rule.id, source);
            continue;
        }
        rules.push(compiled);
    }
    Ok(rules)
}

/// Load one rule file from disk
pub fn load_rule_file(path: &Path, helpers: &HelperRegistry) -> Result<Vec<NativeRule>, RuleLoadError> {
    let source = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|e| RuleLoadError::Io {
        file: source.clone(),
        source: e,
    })?;
    let rules = load_rule_str(&text, &source, helpers)?;
    log::info!("Loaded {} rule(s) from {}", rules.len(), source);
    Ok(rules)
}

/// Load every `.json`, `.yaml` and `.yml` file of a directory.
///
/// A bad file is reported and skipped; the other files still load.
pub fn load_rule_dir(
    dir: &Path,
    helpers: &HelperRegistry,
) -> Result<(Vec<NativeRule>, Vec<RuleLoadError>), RuleLoadError> {
    let entries = std::fs::read_dir(dir).map_err(|e| RuleLoadError::Io {
        file: dir.display().to_string(),
        source: e,
    })?;

    let mut paths: Vec<_> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("json" | "yaml" | "yml")
                )
        })
        .collect();
    paths.sort();

    let mut rules = Vec::new();
    let mut errors = Vec::new();
    for path in paths {
        match load_rule_file(&path, helpers) {
            Ok(mut loaded) => rules.append(&mut loaded),
            Err(e) => {
                log::warn!("Rejected rule file: {}", e);
                errors.push(e);
            }
        }
    }
    Ok((rules, errors))
}

fn parse_rule_file(text: &str, source: &str) -> Result<JsonRuleFile, RuleLoadError> {
    let ext = Path::new(source)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    let as_json = match ext {
        "json" => true,
        "yaml" | "yml" => false,
        _ => text.trim_start().starts_with('{'),
    };

    let parsed = if as_json {
        serde_json::from_str(text).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(text).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| RuleLoadError::Parse {
        file: source.to_string(),
        message,
    })
}

fn validate(file: &JsonRuleFile, source: &str) -> Result<(), RuleLoadError> {
    let invalid = |rule: &str, message: &str| RuleLoadError::Invalid {
        file: source.to_string(),
        rule: rule.to_string(),
        message: message.to_string(),
    };

    let mut seen = HashSet::new();
    for rule in &file.rules {
        if rule.id.trim().is_empty() {
            return Err(invalid("", "rule id must not be empty"));
        }
        if !seen.insert(rule.id.as_str()) {
            return Err(invalid(&rule.id, "duplicate rule id"));
        }
        if rule.selector.trim().is_empty() {
            return Err(invalid(&rule.id, "selector must not be empty"));
        }
        if rule.message.trim().is_empty() {
            return Err(invalid(&rule.id, "message must not be empty"));
        }
    }
    Ok(())
}

/// Wrap a compiled condition into the native rule contract.
///
/// The condition describes the violation: a node for which it holds fails
/// with the rule's message, every other matched node passes.
pub fn compile_rule(rule: &JsonRule, compiler: &PredicateCompiler<'_>) -> Result<NativeRule, CompileError> {
    let predicate = compiler.compile(&rule.check)?;
    let message = rule.message.clone();
    let pass_message = rule
        .pass_message
        .clone()
        .unwrap_or_else(|| format!("{} passed", rule.id));

    let metadata = RuleMetadata {
        severity: rule.severity,
        description: rule.description.clone(),
        remediation: rule.remediation.clone(),
        owners: rule.owners.clone(),
        tags: rule.tags.clone(),
    };

    let native = NativeRule::new(&rule.id, &rule.selector, move |node, ctx| {
        let verdict = if predicate(node, ctx)? {
            Verdict::Fail(render(&message, &node.id))
        } else {
            Verdict::Pass(render(&pass_message, &node.id))
        };
        Ok(verdict)
    })
    .with_scope(rule.vendor.clone())
    .with_metadata(metadata);

    Ok(match &rule.category {
        Some(category) => native.with_category(category),
        None => native,
    })
}

fn render(template: &str, node_id: &str) -> String {
    template.replace("{id}", node_id)
}
