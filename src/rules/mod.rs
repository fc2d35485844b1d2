//! Native rule library

pub mod builtin;

pub use builtin::builtin_rules;
