//! APIForge Path Template Router
//!
//! Compiles declared path templates (literal segments plus `:name`
//! placeholders) into matchers, matches them against incoming request
//! paths, and extracts named path parameters together with query-string
//! parameters. Compiled templates are immutable and safe to reuse across
//! concurrent requests.

pub mod request;
pub mod template;

pub use request::{parse_query, ServiceRequest};
pub use template::{MatchResult, PathTemplate, TemplateError};
