//! Path template compilation and matching.

use indexmap::IndexMap;
use regex::Regex;

/// A declared route pattern compiled into a matcher.
///
/// Templates are normalized (one leading slash stripped) and split on `/`.
/// A token starting with `:` followed by word characters becomes a
/// single-segment capturing wildcard recorded under that name; every other
/// token is escaped and matched verbatim. Template and candidate must have
/// the same segment count to match.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    raw: String,
    pattern: Regex,
    param_names: Vec<String>,
}

/// Named path parameters bound by a successful match, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    pub path_params: IndexMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid path template '{template}': {reason}")]
pub struct TemplateError {
    pub template: String,
    pub reason: String,
}

impl PathTemplate {
    pub fn compile(template: &str) -> Result<Self, TemplateError> {
        let normalized = template.strip_prefix('/').unwrap_or(template);
        let mut param_names = Vec::new();
        let mut parts = Vec::new();

        for token in normalized.split('/') {
            if let Some(rest) = token.strip_prefix(':') {
                let name: String = rest
                    .chars()
                    .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                    .collect();
                if !name.is_empty() {
                    param_names.push(name);
                    parts.push("([^/]+)".to_string());
                    continue;
                }
            }
            parts.push(regex::escape(token));
        }

        let pattern = Regex::new(&format!("^{}$", parts.join("/"))).map_err(|e| TemplateError {
            template: template.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            raw: template.to_string(),
            pattern,
            param_names,
        })
    }

    /// Match a candidate path. Returns `None` on segment-count or literal
    /// mismatch; this is a clean no-match, not an error. Captured segments
    /// are percent-decoded as UTF-8 and bound in declaration order.
    pub fn matches(&self, path: &str) -> Option<MatchResult> {
        let candidate = path.strip_prefix('/').unwrap_or(path);
        let captures = self.pattern.captures(candidate)?;

        let mut path_params = IndexMap::with_capacity(self.param_names.len());
        for (idx, name) in self.param_names.iter().enumerate() {
            let segment = captures.get(idx + 1).map(|m| m.as_str()).unwrap_or_default();
            let decoded = urlencoding::decode(segment)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| segment.to_string());
            path_params.insert(name.clone(), decoded);
        }

        Some(MatchResult { path_params })
    }

    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}
