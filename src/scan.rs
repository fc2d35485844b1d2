//! Scan orchestration: schema lookup, parse, rule filtering, evaluation

use crate::config::Config;
use crate::context::Context;
use crate::diagnostic::{Outcome, RuleResult, Severity};
use crate::dsl::{load_rule_dir, load_rule_file, RuleLoadError};
use crate::engine::{RuleEngine, RuleTiming};
use crate::helpers::HelperRegistry;
use crate::parser;
use crate::rule::Rule;
use crate::rules::builtin_rules;
use crate::schema::{SchemaError, SchemaRegistry};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Error setting up or running a scan
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Unknown vendor: {0}")]
    UnknownVendor(String),

    #[error("No vendor given for {0} and none configured")]
    NoVendor(String),

    #[error("IO error reading {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    RuleLoad(#[from] RuleLoadError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Outcome of scanning one configuration
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    /// File name or label of the scanned text
    pub name: String,

    /// Canonical schema id the text was parsed with
    pub vendor: String,

    pub results: Vec<RuleResult>,

    /// Number of nodes in the parsed tree
    pub node_count: usize,

    pub passed: usize,
    pub failed: usize,
    pub informational: usize,

    /// Failures reported at error level
    pub error_count: usize,

    /// Failures reported at warning level
    pub warning_count: usize,

    #[serde(skip)]
    pub duration: Duration,

    /// Per-rule timing statistics, when enabled in the engine config
    #[serde(skip)]
    pub rule_timings: HashMap<String, RuleTiming>,
}

impl ScanReport {
    fn tally(&mut self) {
        for result in &self.results {
            match result.outcome {
                Outcome::Pass => self.passed += 1,
                Outcome::Informational => self.informational += 1,
                Outcome::Fail => {
                    self.failed += 1;
                    match result.level {
                        Severity::Error => self.error_count += 1,
                        Severity::Warning => self.warning_count += 1,
                        Severity::Info => {}
                    }
                }
            }
        }
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Get exit code (0 = clean, 1 = warnings, 2 = errors)
    pub fn exit_code(&self) -> i32 {
        if self.error_count > 0 {
            2
        } else if self.warning_count > 0 {
            1
        } else {
            0
        }
    }

    /// Failed results only
    pub fn failures(&self) -> impl Iterator<Item = &RuleResult> {
        self.results.iter().filter(|r| r.is_failure())
    }
}

/// One unit of work for [`Scanner::scan_many`]
#[derive(Debug, Clone)]
pub struct ScanJob {
    pub name: String,
    pub text: String,
    /// Vendor id; falls back to the configured default
    pub vendor: Option<String>,
}

impl ScanJob {
    pub fn new(name: &str, text: &str) -> Self {
        Self {
            name: name.to_string(),
            text: text.to_string(),
            vendor: None,
        }
    }

    pub fn with_vendor(mut self, vendor: &str) -> Self {
        self.vendor = Some(vendor.to_string());
        self
    }
}

/// Combined outcome of several scans
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Reports in job order
    pub reports: Vec<ScanReport>,

    /// Jobs that could not be scanned at all
    pub errors: Vec<(String, ScanError)>,

    pub duration: Duration,
}

impl ScanSummary {
    pub fn error_count(&self) -> usize {
        self.reports.iter().map(|r| r.error_count).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.reports.iter().map(|r| r.warning_count).sum()
    }

    /// Get exit code; unscannable jobs count as errors
    pub fn exit_code(&self) -> i32 {
        if !self.errors.is_empty() {
            return 2;
        }
        self.reports.iter().map(|r| r.exit_code()).max().unwrap_or(0)
    }
}

/// Convenience facade tying schemas, helpers, rules and config together
pub struct Scanner {
    schemas: SchemaRegistry,
    helpers: HelperRegistry,
    rules: Vec<Box<dyn Rule>>,
    rule_errors: Vec<RuleLoadError>,
    config: Config,
    engine: RuleEngine,
}

impl Scanner {
    /// Scanner with the built-in schemas and helpers and no rules
    pub fn new(config: Config) -> Self {
        Self {
            schemas: SchemaRegistry::new(),
            helpers: HelperRegistry::new(),
            rules: Vec::new(),
            rule_errors: Vec::new(),
            config,
            engine: RuleEngine::new(),
        }
    }

    /// Scanner with the built-in rules plus every schema and rule file the
    /// config names
    pub fn from_config(config: Config) -> Result<Self, ScanError> {
        let schema_files = config.schema_files.clone();
        let rule_files = config.rule_files.clone();

        let mut scanner = Self::new(config).with_builtin_rules();
        for path in &schema_files {
            scanner.schemas.load_file(path)?;
        }
        for path in &rule_files {
            scanner.load_rules(path)?;
        }
        Ok(scanner)
    }

    /// Add the built-in native rule library
    pub fn with_builtin_rules(mut self) -> Self {
        self.rules.extend(builtin_rules());
        self
    }

    pub fn add_rule(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn add_rules<I>(&mut self, rules: I)
    where
        I: IntoIterator<Item = Box<dyn Rule>>,
    {
        self.rules.extend(rules);
    }

    /// Load a rule file, or every rule file in a directory.
    ///
    /// A broken file inside a directory is skipped and kept in
    /// [`rule_errors`](Self::rule_errors); a broken single file is an error.
    /// Returns the number of rules added.
    pub fn load_rules(&mut self, path: &Path) -> Result<usize, ScanError> {
        let rules = if path.is_dir() {
            let (rules, rejected) = load_rule_dir(path, &self.helpers)?;
            self.rule_errors.extend(rejected);
            rules
        } else {
            load_rule_file(path, &self.helpers)?
        };
        let count = rules.len();
        self.rules
            .extend(rules.into_iter().map(|r| Box::new(r) as Box<dyn Rule>));
        Ok(count)
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    pub fn schemas_mut(&mut self) -> &mut SchemaRegistry {
        &mut self.schemas
    }

    pub fn helpers(&self) -> &HelperRegistry {
        &self.helpers
    }

    pub fn helpers_mut(&mut self) -> &mut HelperRegistry {
        &mut self.helpers
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Rule files rejected while loading rule directories
    pub fn rule_errors(&self) -> &[RuleLoadError] {
        &self.rule_errors
    }

    /// Rules that survive the config filters for a given file name
    fn active_rules(&self, name: &str) -> Vec<&dyn Rule> {
        let path = Path::new(name);
        self.rules
            .iter()
            .map(|r| r.as_ref())
            .filter(|rule| {
                self.config.is_rule_enabled(rule.id())
                    && self.config.is_category_enabled(rule.category())
                    && !self.config.should_ignore_rule_for_file(rule.id(), path)
            })
            .collect()
    }

    /// Parse `text` under `vendor` and run every active rule over it
    pub fn scan(&self, name: &str, text: &str, vendor: &str) -> Result<ScanReport, ScanError> {
        let start = Instant::now();
        let schema = self
            .schemas
            .get(vendor)
            .ok_or_else(|| ScanError::UnknownVendor(vendor.to_string()))?;

        let tree = parser::parse(text, schema);
        let ctx = Context::new(&tree, &schema.id).with_schema(schema);
        let rules = self.active_rules(name);

        let (mut results, rule_timings) = if self.config.engine.statistics {
            self.engine.run_with_stats(&ctx, &rules)
        } else {
            (self.engine.run(&ctx, &rules), HashMap::new())
        };

        for result in results.iter_mut().filter(|r| r.is_failure()) {
            if let Some(level) = self.config.get_severity_override(&result.rule_id) {
                result.level = level;
            }
        }

        let mut report = ScanReport {
            name: name.to_string(),
            vendor: schema.id.clone(),
            results,
            node_count: crate::tree::walk_tree(&tree).count(),
            rule_timings,
            ..ScanReport::default()
        };
        report.tally();
        report.duration = start.elapsed();

        log::debug!(
            "Scanned {} as {}: {} node(s), {} rule(s), {} failure(s)",
            name,
            report.vendor,
            report.node_count,
            rules.len(),
            report.failed
        );
        Ok(report)
    }

    /// Read and scan a file; `vendor` falls back to the configured default
    pub fn scan_file(&self, path: &Path, vendor: Option<&str>) -> Result<ScanReport, ScanError> {
        let name = path.display().to_string();
        let vendor = self.vendor_for(&name, vendor)?;
        let text = std::fs::read_to_string(path).map_err(|e| ScanError::Io {
            file: name.clone(),
            source: e,
        })?;
        self.scan(&name, &text, vendor)
    }

    /// Scan files from disk, in parallel when the engine config allows
    pub fn scan_files(&self, paths: &[PathBuf], vendor: Option<&str>) -> ScanSummary {
        self.run_all(paths, |path| {
            (
                path.display().to_string(),
                self.scan_file(path, vendor),
            )
        })
    }

    /// Scan in-memory configurations, in parallel when the engine config allows
    pub fn scan_many(&self, jobs: &[ScanJob]) -> ScanSummary {
        self.run_all(jobs, |job| {
            let outcome = self
                .vendor_for(&job.name, job.vendor.as_deref())
                .and_then(|vendor| self.scan(&job.name, &job.text, vendor));
            (job.name.clone(), outcome)
        })
    }

    fn vendor_for<'s>(&'s self, name: &str, vendor: Option<&'s str>) -> Result<&'s str, ScanError> {
        vendor
            .or(self.config.vendor.as_deref())
            .ok_or_else(|| ScanError::NoVendor(name.to_string()))
    }

    fn run_all<T, F>(&self, items: &[T], scan_one: F) -> ScanSummary
    where
        T: Sync,
        F: Fn(&T) -> (String, Result<ScanReport, ScanError>) + Sync,
    {
        let start = Instant::now();

        let outcomes: Vec<(String, Result<ScanReport, ScanError>)> =
            if self.config.engine.is_parallel() && items.len() > 1 {
                match rayon::ThreadPoolBuilder::new()
                    .num_threads(self.config.engine.effective_jobs())
                    .build()
                {
                    Ok(pool) => pool.install(|| items.par_iter().map(&scan_one).collect()),
                    Err(e) => {
                        log::warn!("Could not start scan thread pool, scanning sequentially: {}", e);
                        items.iter().map(&scan_one).collect()
                    }
                }
            } else {
                items.iter().map(&scan_one).collect()
            };

        let mut summary = ScanSummary::default();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(report) => summary.reports.push(report),
                Err(e) => {
                    log::warn!("Skipping {}: {}", name, e);
                    summary.errors.push((name, e));
                }
            }
        }
        summary.duration = start.elapsed();
        summary
    }
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("schemas", &self.schemas.ids())
            .field("rules", &self.rules.len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{NativeRule, Verdict};
    use tempfile::TempDir;

    const TRUNK: &str = "interface Gi0/1\n switchport mode trunk\n!\ninterface Gi0/2\n shutdown\n";

    fn trunk_rule() -> Box<dyn Rule> {
        Box::new(
            NativeRule::new("trunk-vlans", "interface", |node, _| {
                Ok(Verdict::check(
                    !node.has_child_prefix("switchport mode trunk")
                        || node.has_child_prefix("switchport trunk allowed vlan"),
                    "ok",
                    "trunk carries all VLANs",
                ))
            })
            .with_severity(Severity::Error)
            .with_category("switching"),
        )
    }

    #[test]
    fn test_scan_counts() {
        let mut scanner = Scanner::new(Config::default());
        scanner.add_rule(trunk_rule());

        let report = scanner.scan("r1.cfg", TRUNK, "ios").unwrap();
        assert_eq!(report.vendor, "cisco-ios");
        assert_eq!(report.node_count, 4);
        assert_eq!(report.passed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.error_count, 1);
        assert_eq!(report.exit_code(), 2);
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_unknown_vendor() {
        let scanner = Scanner::new(Config::default());
        let err = scanner.scan("x", "hostname x", "acme-os").unwrap_err();
        assert!(matches!(err, ScanError::UnknownVendor(v) if v == "acme-os"));
    }

    #[test]
    fn test_config_filters() {
        let mut config = Config::default();
        config.rules.severity.insert("trunk-vlans".to_string(), Severity::Warning);
        let mut scanner = Scanner::new(config);
        scanner.add_rule(trunk_rule());
        let report = scanner.scan("r1.cfg", TRUNK, "cisco-ios").unwrap();
        assert_eq!(report.warning_count, 1);
        assert_eq!(report.exit_code(), 1);

        let mut config = Config::default();
        config.rules.disabled.push("trunk-vlans".to_string());
        let mut scanner = Scanner::new(config);
        scanner.add_rule(trunk_rule());
        assert!(scanner.scan("r1.cfg", TRUNK, "cisco-ios").unwrap().results.is_empty());

        let mut config = Config::default();
        config.categories.push("security".to_string());
        let mut scanner = Scanner::new(config);
        scanner.add_rule(trunk_rule());
        assert!(scanner.scan("r1.cfg", TRUNK, "cisco-ios").unwrap().results.is_empty());

        let mut config = Config::default();
        config
            .rules
            .per_file
            .insert("lab/**".to_string(), vec!["all".to_string()]);
        let mut scanner = Scanner::new(config);
        scanner.add_rule(trunk_rule());
        assert!(scanner.scan("lab/r1.cfg", TRUNK, "cisco-ios").unwrap().results.is_empty());
        assert_eq!(scanner.scan("prod/r1.cfg", TRUNK, "cisco-ios").unwrap().results.len(), 2);
    }

    #[test]
    fn test_scan_many_keeps_job_order() {
        let mut config = Config::default();
        config.engine.jobs = 2;
        config.vendor = Some("cisco-ios".to_string());
        let mut scanner = Scanner::new(config);
        scanner.add_rule(trunk_rule());

        let jobs = vec![
            ScanJob::new("a", TRUNK),
            ScanJob::new("b", "interface Gi0/9\n description uplink\n"),
            ScanJob::new("c", "hostname c").with_vendor("nope"),
        ];
        let summary = scanner.scan_many(&jobs);
        assert_eq!(summary.reports.len(), 2);
        assert_eq!(summary.reports[0].name, "a");
        assert_eq!(summary.reports[1].name, "b");
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].0, "c");
        assert_eq!(summary.error_count(), 1);
        assert_eq!(summary.exit_code(), 2);
    }

    #[test]
    fn test_scan_file_needs_vendor() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("r1.cfg");
        std::fs::write(&path, TRUNK).unwrap();

        let scanner = Scanner::new(Config::default());
        assert!(matches!(
            scanner.scan_file(&path, None),
            Err(ScanError::NoVendor(_))
        ));
        assert!(scanner.scan_file(&path, Some("cisco-ios")).is_ok());
        assert!(matches!(
            scanner.scan_file(&dir.path().join("missing.cfg"), Some("cisco-ios")),
            Err(ScanError::Io { .. })
        ));
    }

    #[test]
    fn test_statistics() {
        let mut config = Config::default();
        config.engine.statistics = true;
        let mut scanner = Scanner::new(config);
        scanner.add_rule(trunk_rule());
        let report = scanner.scan("r1.cfg", TRUNK, "cisco-ios").unwrap();
        assert_eq!(report.rule_timings["trunk-vlans"].evaluation_count, 2);
    }

    #[test]
    fn test_from_config_loads_rule_files() {
        let dir = TempDir::new().unwrap();
        let rules = dir.path().join("site.json");
        std::fs::write(
            &rules,
            r#"{"rules": [{"id": "site-hostname", "selector": "hostname", "message": "no hostname",
                "check": {"type": "match", "pattern": "hostname Router", "mode": "prefix"}}]}"#,
        )
        .unwrap();

        let config = Config {
            rule_files: vec![rules],
            ..Config::default()
        };
        let scanner = Scanner::from_config(config).unwrap();
        assert_eq!(scanner.rule_count(), builtin_rules().len() + 1);

        let report = scanner.scan("r1.cfg", "hostname r1\n", "cisco-ios").unwrap();
        assert!(report
            .results
            .iter()
            .any(|r| r.rule_id == "site-hostname" && r.passed));
    }
}
