//! Validation Framework
//!
//! Declarative parameter validation: pure format validators, per-attribute
//! checks, and whole-object schemas combining allow-lists with rules.

pub mod attribute;
pub mod format;
pub mod schema;

pub use attribute::{check_attr, Rule, ValueType};
pub use format::{check_format, FormatError, FormatRules, FormatSpec};
pub use schema::{check_allowed_keys, extract_data, Schema};
