//! Parameter schema enforcer
//!
//! Validates a whole request `data` object against explicit allow-lists of
//! keys and a set of attribute rules. Allow-lists are enforced at every
//! declared nesting level before any rule runs.

use serde_json::{Map, Value};

use super::attribute::{check_attr, Rule, ValueType};
use super::format::FormatRules;
use crate::error::{AdminError, Result};

/// Reject the first key of `data` not present in the allow-list.
pub fn check_allowed_keys(allowed: &[&str], data: &Map<String, Value>) -> Result<()> {
    if let Some(key) = data.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(AdminError::validation(format!(
            "Unexpected '{}' parameter",
            key
        )));
    }
    Ok(())
}

/// Pull the `data` member out of a request body, requiring a non-null
/// object.
pub fn extract_data(body: &Value) -> Result<Map<String, Value>> {
    let mut root = body
        .as_object()
        .cloned()
        .ok_or_else(|| AdminError::validation("The parameter data is required"))?;

    check_attr(
        &mut root,
        None,
        &Rule::required("data").expect(ValueType::Object),
        &FormatRules::default(),
    )?;

    match root.remove("data") {
        Some(Value::Object(map)) => Ok(map),
        _ => Err(AdminError::validation("The parameter data must be an object")),
    }
}

/// Allow-lists plus rules for one resource type and action.
///
/// Scope paths are segment lists under the `data` object: `&[]` addresses
/// `data` itself, `&["listen"]` addresses `data[listen]`, and so on. Rules
/// against an absent scope still run (against an empty scope) so required
/// attributes report their full path.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    allows: Vec<(&'static [&'static str], &'static [&'static str])>,
    rules: Vec<(&'static [&'static str], Rule)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(
        mut self,
        path: &'static [&'static str],
        keys: &'static [&'static str],
    ) -> Self {
        self.allows.push((path, keys));
        self
    }

    pub fn rule(mut self, path: &'static [&'static str], rule: Rule) -> Self {
        self.rules.push((path, rule));
        self
    }

    pub fn validate(&self, data: &mut Map<String, Value>, rules: &FormatRules) -> Result<()> {
        for (path, keys) in &self.allows {
            if let Some(scope) = resolve_scope(data, path) {
                check_allowed_keys(keys, scope)?;
            }
        }

        for (path, rule) in &self.rules {
            let scope_name = scope_name(path);
            match resolve_scope_mut(data, path) {
                Some(scope) => check_attr(scope, scope_name.as_deref(), rule, rules)?,
                None => {
                    let mut empty = Map::new();
                    check_attr(&mut empty, scope_name.as_deref(), rule, rules)?;
                }
            }
        }

        Ok(())
    }
}

fn scope_name(path: &[&str]) -> Option<String> {
    if path.is_empty() {
        None
    } else {
        Some(format!("data[{}]", path.join("][")))
    }
}

fn resolve_scope<'a>(data: &'a Map<String, Value>, path: &[&str]) -> Option<&'a Map<String, Value>> {
    let mut scope = data;
    for segment in path {
        scope = scope.get(*segment)?.as_object()?;
    }
    Some(scope)
}

fn resolve_scope_mut<'a>(
    data: &'a mut Map<String, Value>,
    path: &[&str],
) -> Option<&'a mut Map<String, Value>> {
    let mut scope = data;
    for segment in path {
        scope = scope.get_mut(*segment)?.as_object_mut()?;
    }
    Some(scope)
}
