//! Vendor schemas: declarative descriptions of each configuration dialect
//!
//! A schema tells the parser how a dialect scopes blocks, which lines are
//! comments, how continuation lines and multi-line commands are written, and
//! whether the dialect treats keywords case-sensitively. Built-in schemas cover
//! the common vendors; additional schemas can be loaded from YAML/JSON files:
//!
//! ```yaml
//! id: mikrotik-routeros
//! family: mikrotik
//! block_style: flat
//! comment_prefixes: ["#"]
//! continuation_suffix: "\\"
//! ```

mod builtin;

pub use builtin::builtin_schemas;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Error loading a schema file
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },

    #[error("Invalid schema: {0}")]
    Invalid(String),
}

/// How a dialect expresses nesting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockStyle {
    /// Deeper indentation opens a child scope (Cisco IOS, Huawei VRP)
    #[default]
    Indent,
    /// `{` / `}` delimit scopes (Juniper, Nokia SR OS, VyOS)
    Brace,
    /// Opener / closer keywords delimit scopes (`config` ... `end`)
    Keyword,
    /// No nesting; every statement is top-level (`set ...` staging)
    Flat,
}

impl std::fmt::Display for BlockStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockStyle::Indent => write!(f, "indent"),
            BlockStyle::Brace => write!(f, "brace"),
            BlockStyle::Keyword => write!(f, "keyword"),
            BlockStyle::Flat => write!(f, "flat"),
        }
    }
}

/// Block comment delimiters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockComment {
    pub open: String,
    pub close: String,
}

/// A keyword-delimited block (`config` closed by `end`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordBlock {
    pub open: String,
    pub close: String,
}

/// Declarative description of one dialect's lexical and structural rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorSchema {
    /// Vendor identifier (e.g., "cisco-ios")
    pub id: String,

    /// Helper namespace shared by related dialects (e.g., "cisco")
    pub family: String,

    /// Human-readable description
    pub description: String,

    /// Alternative identifiers accepted on lookup
    pub aliases: Vec<String>,

    pub block_style: BlockStyle,

    /// Whole-line comment markers
    pub comment_prefixes: Vec<String>,

    pub block_comment: Option<BlockComment>,

    /// A line ending with this marker continues on the next line
    pub continuation_suffix: Option<String>,

    /// Statements that close the current scope without producing a node
    /// (`exit`, `quit`, `exit-address-family`); indent style only
    pub terminators: Vec<String>,

    /// Opener/closer keyword pairs; keyword style only
    pub keyword_blocks: Vec<KeywordBlock>,

    /// Commands whose body runs until a repeated delimiter (`banner motd ^C`)
    pub delimited_commands: Vec<String>,

    /// Columns a tab advances to when measuring indentation
    pub tab_width: usize,

    /// Whether keywords and values compare case-sensitively
    pub case_sensitive: bool,
}

impl Default for VendorSchema {
    fn default() -> Self {
        Self {
            id: String::new(),
            family: String::new(),
            description: String::new(),
            aliases: Vec::new(),
            block_style: BlockStyle::Indent,
            comment_prefixes: vec!["!".to_string(), "#".to_string()],
            block_comment: None,
            continuation_suffix: None,
            terminators: Vec::new(),
            keyword_blocks: Vec::new(),
            delimited_commands: Vec::new(),
            tab_width: 8,
            case_sensitive: false,
        }
    }
}

impl VendorSchema {
    /// Create a schema with the given id and block style
    pub fn new(id: &str, family: &str, block_style: BlockStyle) -> Self {
        Self {
            id: id.to_string(),
            family: family.to_string(),
            block_style,
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_comments(mut self, prefixes: &[&str]) -> Self {
        self.comment_prefixes = prefixes.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_block_comment(mut self, open: &str, close: &str) -> Self {
        self.block_comment = Some(BlockComment {
            open: open.to_string(),
            close: close.to_string(),
        });
        self
    }

    pub fn with_continuation(mut self, suffix: &str) -> Self {
        self.continuation_suffix = Some(suffix.to_string());
        self
    }

    pub fn with_terminators(mut self, terminators: &[&str]) -> Self {
        self.terminators = terminators.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_keyword_block(mut self, open: &str, close: &str) -> Self {
        self.keyword_blocks.push(KeywordBlock {
            open: open.to_string(),
            close: close.to_string(),
        });
        self
    }

    pub fn with_delimited(mut self, commands: &[&str]) -> Self {
        self.delimited_commands = commands.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }

    /// Whether `id` names this schema (id or alias, case-insensitive)
    pub fn answers_to(&self, id: &str) -> bool {
        self.id.eq_ignore_ascii_case(id) || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(id))
    }

    /// Whether an already-trimmed line is a comment
    pub fn is_comment(&self, trimmed: &str) -> bool {
        self.comment_prefixes
            .iter()
            .any(|p| !p.is_empty() && trimmed.starts_with(p.as_str()))
    }

    /// Whether a statement is a scope terminator
    pub fn is_terminator(&self, statement: &str) -> bool {
        self.terminators
            .iter()
            .any(|t| statement.eq_ignore_ascii_case(t))
    }

    /// Compare two strings under this dialect's case rule
    pub fn eq_text(&self, a: &str, b: &str) -> bool {
        if self.case_sensitive {
            a == b
        } else {
            a.eq_ignore_ascii_case(b)
        }
    }

    /// Check structural consistency of a loaded schema
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.id.trim().is_empty() {
            return Err(SchemaError::Invalid("schema id must not be empty".to_string()));
        }
        if self.block_style == BlockStyle::Keyword && self.keyword_blocks.is_empty() {
            return Err(SchemaError::Invalid(format!(
                "schema '{}' uses keyword blocks but declares none",
                self.id
            )));
        }
        if let Some(bc) = &self.block_comment {
            if bc.open.is_empty() || bc.close.is_empty() {
                return Err(SchemaError::Invalid(format!(
                    "schema '{}' has an empty block comment delimiter",
                    self.id
                )));
            }
        }
        if self.tab_width == 0 {
            return Err(SchemaError::Invalid(format!(
                "schema '{}' has tab_width 0",
                self.id
            )));
        }
        Ok(())
    }
}

/// Lookup table of available schemas
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<String, VendorSchema>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    /// Registry pre-populated with the built-in schemas
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for schema in builtin_schemas() {
            registry.register(schema);
        }
        registry
    }

    /// Registry with no schemas
    pub fn empty() -> Self {
        Self {
            schemas: HashMap::new(),
        }
    }

    /// Add or replace a schema
    pub fn register(&mut self, schema: VendorSchema) {
        self.schemas.insert(schema.id.to_lowercase(), schema);
    }

    /// Resolve a vendor id or alias
    pub fn get(&self, vendor: &str) -> Option<&VendorSchema> {
        self.schemas
            .get(&vendor.to_lowercase())
            .or_else(|| self.schemas.values().find(|s| s.answers_to(vendor)))
    }

    /// Sorted list of registered schema ids
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.schemas.values().map(|s| s.id.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Load a schema from a YAML or JSON file and register it
    pub fn load_file(&mut self, path: &Path) -> Result<String, SchemaError> {
        let content = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let schema = parse_schema(&content, ext).map_err(|message| SchemaError::Parse {
            file: path.display().to_string(),
            message,
        })?;
        schema.validate()?;
        let id = schema.id.clone();
        log::info!("Loaded vendor schema '{}' from {}", id, path.display());
        self.register(schema);
        Ok(id)
    }
}

fn parse_schema(content: &str, ext: &str) -> Result<VendorSchema, String> {
    match ext {
        "yaml" | "yml" => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        "json" => serde_json::from_str(content).map_err(|e| e.to_string()),
        other => Err(format!("Unsupported schema format: {}", other)),
    }
}
