//! Attribute checker
//!
//! Validates one named attribute within a parameter scope: required,
//! expected type, and format, in that order, failing fast on the first
//! violation.

use std::fmt;

use serde_json::{Map, Value};

use super::format::{check_format, FormatError, FormatRules, FormatSpec};
use crate::error::{AdminError, Result};

/// Runtime type expectation for a JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Object,
    Array,
    Bool,
    Number,
}

impl ValueType {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::Bool => value.is_boolean(),
            Self::Number => value.is_number(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "a string",
            Self::Object => "an object",
            Self::Array => "an array",
            Self::Bool => "a boolean",
            Self::Number => "a number",
        };
        f.write_str(name)
    }
}

/// One declarative validation rule for a named attribute.
#[derive(Debug, Clone)]
pub struct Rule {
    pub attribute: &'static str,
    pub required: bool,
    pub expected: Option<ValueType>,
    pub format: Option<FormatSpec>,
}

impl Rule {
    pub fn required(attribute: &'static str) -> Self {
        Self {
            attribute,
            required: true,
            expected: None,
            format: None,
        }
    }

    pub fn optional(attribute: &'static str) -> Self {
        Self {
            required: false,
            ..Self::required(attribute)
        }
    }

    pub fn expect(mut self, expected: ValueType) -> Self {
        self.expected = Some(expected);
        self
    }

    pub fn format(mut self, format: FormatSpec) -> Self {
        self.format = Some(format);
        self
    }
}

fn full_name(scope_name: Option<&str>, attribute: &str) -> String {
    match scope_name {
        Some(scope) => format!("{}[{}]", scope, attribute),
        None => attribute.to_string(),
    }
}

// `false` is a present value; empty strings and empty containers are not.
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        _ => false,
    }
}

/// Validate one attribute within `scope`. String values are trimmed in
/// place before any check runs; an optional absent attribute skips the
/// type and format checks entirely.
pub fn check_attr(
    scope: &mut Map<String, Value>,
    scope_name: Option<&str>,
    rule: &Rule,
    rules: &FormatRules,
) -> Result<()> {
    if let Some(Value::String(s)) = scope.get_mut(rule.attribute) {
        let trimmed = s.trim();
        if trimmed.len() != s.len() {
            *s = trimmed.to_string();
        }
    }

    if rule.required && is_blank(scope.get(rule.attribute)) {
        return Err(AdminError::validation(format!(
            "The parameter {} is required",
            full_name(scope_name, rule.attribute)
        )));
    }

    let Some(value) = scope.get_mut(rule.attribute) else {
        return Ok(());
    };
    if value.is_null() {
        return Ok(());
    }

    if let Some(expected) = rule.expected {
        if !expected.matches(value) {
            return Err(AdminError::validation(format!(
                "The parameter {} must be {}",
                full_name(scope_name, rule.attribute),
                expected
            )));
        }
    }

    if let Some(format) = &rule.format {
        match check_format(value, format, rules) {
            Ok(()) => {}
            Err(FormatError::Invalid(reason)) => {
                return Err(AdminError::validation(format!(
                    "The parameter {} {}",
                    full_name(scope_name, rule.attribute),
                    reason
                )));
            }
            Err(FormatError::UnknownRule(name)) => {
                return Err(AdminError::configuration(format!(
                    "unknown format rule '{}'",
                    name
                )));
            }
            Err(FormatError::BadPattern(reason)) => {
                return Err(AdminError::configuration(format!(
                    "unparseable format pattern: {}",
                    reason
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scope_from(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn run(scope: &mut Map<String, Value>, rule: Rule) -> Result<()> {
        check_attr(scope, None, &rule, &FormatRules::default())
    }

    #[test]
    fn test_required_absent_fails() {
        let mut scope = scope_from(json!({}));
        let err = run(&mut scope, Rule::required("name")).unwrap_err();
        assert_eq!(err.to_string(), "The parameter name is required");
    }

    #[test]
    fn test_required_empty_string_fails() {
        let mut scope = scope_from(json!({"name": "   "}));
        // trimmed in place before the blank check
        let err = run(&mut scope, Rule::required("name")).unwrap_err();
        assert_eq!(err.to_string(), "The parameter name is required");
    }

    #[test]
    fn test_false_is_not_blank() {
        let mut scope = scope_from(json!({"active": false}));
        assert!(run(&mut scope, Rule::required("active")).is_ok());
    }

    #[test]
    fn test_optional_absent_skips_type_and_format() {
        let mut scope = scope_from(json!({}));
        let rule = Rule::optional("when")
            .expect(ValueType::String)
            .format(FormatSpec::Date);
        assert!(run(&mut scope, rule).is_ok());
    }

    #[test]
    fn test_type_mismatch() {
        let mut scope = scope_from(json!({"headers": "nope"}));
        let err = run(&mut scope, Rule::optional("headers").expect(ValueType::Array)).unwrap_err();
        assert_eq!(err.to_string(), "The parameter headers must be an array");
    }

    #[test]
    fn test_format_failure_names_parameter() {
        let mut scope = scope_from(json!({"when": "2024-13-01"}));
        let err = run(
            &mut scope,
            Rule::required("when").expect(ValueType::String).format(FormatSpec::Date),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "The parameter when is not a valid date (YYYY-MM-DD)"
        );
    }

    #[test]
    fn test_scope_name_in_message() {
        let mut scope = scope_from(json!({}));
        let err = check_attr(
            &mut scope,
            Some("data[listen]"),
            &Rule::required("method"),
            &FormatRules::default(),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "The parameter data[listen][method] is required"
        );
    }

    #[test]
    fn test_string_trimmed_in_place() {
        let mut scope = scope_from(json!({"name": "  billing  "}));
        run(&mut scope, Rule::required("name").expect(ValueType::String)).unwrap();
        assert_eq!(scope["name"], json!("billing"));
    }

    #[test]
    fn test_unknown_custom_rule_is_configuration_error() {
        let mut scope = scope_from(json!({"code": "x"}));
        let err = run(&mut scope, Rule::required("code").format(FormatSpec::Custom("nope")))
            .unwrap_err();
        assert_eq!(err.code(), 500);
    }
}
