//! Configuration for scans
//!
//! Reads configuration from:
//! - `.netlintrc.yaml` / `.netlintrc.yml` / `.netlintrc.json` (project-level)
//! - the same names in the home directory (user-level)
//!
//! ```yaml
//! extends: [security]
//! vendor: cisco-ios
//! engine:
//!   jobs: 4
//! rules:
//!   disabled: [cisco-interface-description]
//!   severity:
//!     cisco-http-server: warning
//!   per_file:
//!     "lab/**": [all]
//! rule_files: [rules/site.json]
//! ```

use crate::diagnostic::Severity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Scan multiple files in parallel (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,

    /// Number of parallel jobs (0 = auto-detect)
    pub jobs: usize,

    /// Collect per-rule timing statistics
    pub statistics: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: None,
            jobs: 0,
            statistics: false,
        }
    }
}

impl EngineConfig {
    pub fn is_parallel(&self) -> bool {
        self.parallel.unwrap_or(true)
    }

    /// Worker count to use for parallel scans
    pub fn effective_jobs(&self) -> usize {
        if self.jobs > 0 {
            self.jobs
        } else {
            num_cpus::get()
        }
    }
}

/// Rule configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Disabled rules
    pub disabled: Vec<String>,

    /// Enabled rules (empty = all)
    pub enabled: Vec<String>,

    /// Select rules by id prefix (e.g., "cisco-" selects all cisco rules)
    pub extend: Vec<String>,

    /// Ignore rules by id prefix
    pub ignore: Vec<String>,

    /// Severity overrides (rule_id -> severity)
    pub severity: HashMap<String, Severity>,

    /// Per-file rule ignores (glob pattern -> rule IDs, or "all")
    pub per_file: HashMap<String, Vec<String>>,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Presets or other configuration files to inherit from
    pub extends: Vec<String>,

    /// Vendor used when a scan does not name one
    pub vendor: Option<String>,

    pub engine: EngineConfig,

    pub rules: RulesConfig,

    /// Rule categories to run (empty = all)
    pub categories: Vec<String>,

    /// Extra JSON/YAML rule files or directories
    pub rule_files: Vec<PathBuf>,

    /// Extra vendor schema files
    pub schema_files: Vec<PathBuf>,
}

impl Config {
    /// Create default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a preset configuration by name
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "recommended" => Some(Self::default()),
            "security" => Some(Self {
                categories: vec!["security".to_string()],
                ..Self::default()
            }),
            _ => None,
        }
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_depth(path, 0)
    }

    /// Load with recursion depth limit (to prevent infinite loops)
    fn load_with_depth(path: &Path, depth: usize) -> Result<Self, ConfigError> {
        const MAX_DEPTH: usize = 10;
        if depth >= MAX_DEPTH {
            return Err(ConfigError::Invalid(
                "Maximum config inheritance depth exceeded".to_string(),
            ));
        }

        let content = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let mut config: Self = match ext {
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "Unknown config file format: {}",
                    ext
                )))
            }
        };

        let base_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(base_dir);

        if !config.extends.is_empty() {
            let mut base_config = Self::default();

            for extend in &config.extends {
                let extended = match Self::preset(extend) {
                    Some(preset) => preset,
                    None => {
                        let extend_path = if Path::new(extend).is_absolute() {
                            PathBuf::from(extend)
                        } else {
                            base_dir.join(extend)
                        };
                        Self::load_with_depth(&extend_path, depth + 1)?
                    }
                };
                base_config.merge(extended);
            }

            base_config.merge(config);
            config = base_config;
        }

        Ok(config)
    }

    /// Make relative rule/schema file paths relative to the config file
    fn resolve_paths(&mut self, base_dir: &Path) {
        for path in self.rule_files.iter_mut().chain(self.schema_files.iter_mut()) {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        }
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Self) {
        if other.vendor.is_some() {
            self.vendor = other.vendor;
        }

        if other.engine.jobs != 0 {
            self.engine.jobs = other.engine.jobs;
        }
        if other.engine.parallel.is_some() {
            self.engine.parallel = other.engine.parallel;
        }
        if other.engine.statistics {
            self.engine.statistics = true;
        }

        self.rules.disabled.extend(other.rules.disabled);
        if !other.rules.enabled.is_empty() {
            self.rules.enabled = other.rules.enabled;
        }
        self.rules.extend.extend(other.rules.extend);
        self.rules.ignore.extend(other.rules.ignore);
        self.rules.severity.extend(other.rules.severity);
        for (pattern, rules) in other.rules.per_file {
            self.rules.per_file.entry(pattern).or_default().extend(rules);
        }

        if !other.categories.is_empty() {
            self.categories = other.categories;
        }
        self.rule_files.extend(other.rule_files);
        self.schema_files.extend(other.schema_files);
    }

    /// Load configuration from default locations
    pub fn load_default() -> Result<Self, ConfigError> {
        let config_names = [".netlintrc.yaml", ".netlintrc.yml", ".netlintrc.json"];

        for name in &config_names {
            let path = PathBuf::from(name);
            if path.exists() {
                return Self::load(&path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            for name in &config_names {
                let path = home.join(name);
                if path.exists() {
                    return Self::load(&path);
                }
            }
        }

        Ok(Self::default())
    }

    /// Check if a rule is enabled
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        if self.rules.disabled.iter().any(|r| r == rule_id) {
            return false;
        }

        if self.matches_ignore_prefix(rule_id) {
            return false;
        }

        if !self.rules.enabled.is_empty() {
            return self.rules.enabled.iter().any(|r| r == rule_id);
        }

        self.matches_extend_prefix(rule_id)
    }

    /// Check if a rule matches any prefix in the extend list
    pub fn matches_extend_prefix(&self, rule_id: &str) -> bool {
        if self.rules.extend.is_empty() {
            return true;
        }
        let rule_upper = rule_id.to_uppercase();
        self.rules
            .extend
            .iter()
            .any(|prefix| rule_upper.starts_with(&prefix.to_uppercase()))
    }

    /// Check if a rule matches any prefix in the ignore list
    pub fn matches_ignore_prefix(&self, rule_id: &str) -> bool {
        let rule_upper = rule_id.to_uppercase();
        self.rules
            .ignore
            .iter()
            .any(|prefix| rule_upper.starts_with(&prefix.to_uppercase()))
    }

    /// Whether rules of `category` run (uncategorized rules always run)
    pub fn is_category_enabled(&self, category: Option<&str>) -> bool {
        match category {
            _ if self.categories.is_empty() => true,
            Some(category) => self
                .categories
                .iter()
                .any(|c| c.eq_ignore_ascii_case(category)),
            None => true,
        }
    }

    /// Get severity override for a rule
    pub fn get_severity_override(&self, rule_id: &str) -> Option<Severity> {
        self.rules.severity.get(rule_id).copied()
    }

    /// Check if a rule should be ignored for a file
    pub fn should_ignore_rule_for_file(&self, rule_id: &str, file_path: &Path) -> bool {
        let file_str = file_path.to_string_lossy();

        for (pattern, rules) in &self.rules.per_file {
            match globset::Glob::new(pattern) {
                Ok(glob) => {
                    if glob.compile_matcher().is_match(file_str.as_ref())
                        && rules.iter().any(|r| r == "all" || r == rule_id)
                    {
                        return true;
                    }
                }
                Err(e) => log::debug!("Ignoring invalid per-file pattern '{}': {}", pattern, e),
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::new();
        assert!(config.engine.is_parallel());
        assert_eq!(config.engine.jobs, 0);
        assert!(config.engine.effective_jobs() >= 1);
        assert!(config.vendor.is_none());
    }

    #[test]
    fn test_rule_enabled() {
        let mut config = Config::new();
        assert!(config.is_rule_enabled("any-rule"));

        config.rules.disabled.push("disabled-rule".to_string());
        assert!(!config.is_rule_enabled("disabled-rule"));
        assert!(config.is_rule_enabled("other-rule"));

        config.rules.enabled = vec!["only-this".to_string()];
        assert!(!config.is_rule_enabled("other-rule"));
        assert!(config.is_rule_enabled("only-this"));
    }

    #[test]
    fn test_extend_and_ignore_prefixes() {
        let mut config = Config::new();
        config.rules.extend.push("cisco-".to_string());
        assert!(config.is_rule_enabled("cisco-http-server"));
        assert!(config.is_rule_enabled("CISCO-enable-secret"));
        assert!(!config.is_rule_enabled("juniper-ssh-root-login"));

        config.rules.ignore.push("cisco-http".to_string());
        assert!(!config.is_rule_enabled("cisco-http-server"));
        assert!(config.is_rule_enabled("cisco-enable-secret"));
    }

    #[test]
    fn test_categories() {
        let config = Config::preset("security").unwrap();
        assert!(config.is_category_enabled(Some("Security")));
        assert!(!config.is_category_enabled(Some("documentation")));
        assert!(config.is_category_enabled(None));
        assert!(Config::new().is_category_enabled(Some("documentation")));
        assert!(Config::preset("nonexistent").is_none());
    }

    #[test]
    fn test_severity_override() {
        let mut config = Config::new();
        config.rules.severity.insert("rule1".to_string(), Severity::Error);
        assert_eq!(config.get_severity_override("rule1"), Some(Severity::Error));
        assert_eq!(config.get_severity_override("rule2"), None);
    }

    #[test]
    fn test_per_file_ignore() {
        let mut config = Config::new();
        config
            .rules
            .per_file
            .insert("lab/**".to_string(), vec!["all".to_string()]);
        config
            .rules
            .per_file
            .insert("**/edge-*.cfg".to_string(), vec!["cisco-http-server".to_string()]);

        assert!(config.should_ignore_rule_for_file("anything", Path::new("lab/r1.cfg")));
        assert!(config.should_ignore_rule_for_file("cisco-http-server", Path::new("site/edge-1.cfg")));
        assert!(!config.should_ignore_rule_for_file("cisco-enable-secret", Path::new("site/edge-1.cfg")));
        assert!(!config.should_ignore_rule_for_file("anything", Path::new("prod/r1.cfg")));
    }

    #[test]
    fn test_yaml_deserialize() {
        let yaml = r#"
vendor: juniper-junos
engine:
  parallel: false
  jobs: 4
rules:
  disabled:
    - rule1
    - rule2
  severity:
    rule3: error
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.engine.is_parallel());
        assert_eq!(config.engine.jobs, 4);
        assert_eq!(config.vendor.as_deref(), Some("juniper-junos"));
        assert_eq!(config.rules.disabled.len(), 2);
        assert_eq!(config.get_severity_override("rule3"), Some(Severity::Error));
    }

    #[test]
    fn test_load_with_extends() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("base.yaml"),
            "vendor: cisco-ios\nrules:\n  disabled: [base-rule]\nrule_files: [rules/base.json]\n",
        )
        .unwrap();
        let path = temp.path().join(".netlintrc.json");
        std::fs::write(
            &path,
            r#"{"extends": ["base.yaml", "security"], "rules": {"disabled": ["local-rule"]}}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.vendor.as_deref(), Some("cisco-ios"));
        assert!(!config.is_rule_enabled("base-rule"));
        assert!(!config.is_rule_enabled("local-rule"));
        assert_eq!(config.categories, vec!["security".to_string()]);
        assert_eq!(config.rule_files, vec![temp.path().join("rules/base.json")]);
    }

    #[test]
    fn test_extends_keeps_base_engine_settings() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("base.yaml"), "engine:\n  parallel: false\n").unwrap();
        let path = temp.path().join("child.yaml");
        std::fs::write(&path, "extends: [base.yaml]\nvendor: cisco-ios\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert!(!config.engine.is_parallel());

        let mut base = Config::new();
        base.engine.parallel = Some(false);
        let mut child = Config::new();
        child.engine.parallel = Some(true);
        base.merge(child);
        assert!(base.engine.is_parallel());
    }

    #[test]
    fn test_extends_cycle_is_bounded() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("loop.yaml");
        std::fs::write(&path, "extends: [loop.yaml]\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Invalid(_))));
    }
}
