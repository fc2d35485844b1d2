//! JSON rule DSL
//!
//! Third-party rules are plain data: a selector, a vendor scope, messages,
//! and a condition tree describing the violation. Conditions compile once, at
//! load time, into the same [`NativeRule`](crate::rule::NativeRule) contract
//! hand-written rules use.
//!
//! ```json
//! {
//!   "rules": [{
//!     "id": "trunk-allowed-vlans",
//!     "selector": "interface",
//!     "vendor": "cisco-ios",
//!     "severity": "error",
//!     "message": "{id}: trunk carries all VLANs",
//!     "check": {
//!       "type": "and",
//!       "conditions": [
//!         {"type": "helper", "helper": "cisco.isTrunkPort"},
//!         {"type": "child_not_exists", "selector": "switchport trunk allowed vlan"}
//!       ]
//!     }
//!   }]
//! }
//! ```

pub mod compiler;
pub mod loader;
pub mod types;

pub use compiler::{CompileError, Predicate, PredicateCompiler};
pub use loader::{compile_rule, load_rule_dir, load_rule_file, load_rule_str, RuleLoadError};
pub use types::{CheckKind, ExprOp, JsonCheck, JsonRule, JsonRuleFile, MatchMode, MatchTarget};
