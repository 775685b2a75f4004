//! Format validators
//!
//! Pure checks of a single scalar value against a format rule. Absent
//! values always pass: format rules only apply to present values.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Format rule attached to a validation rule.
#[derive(Debug, Clone)]
pub enum FormatSpec {
    /// The value's string form must match the pattern.
    Pattern(&'static str),
    /// `YYYY-MM-DD` and a real calendar date.
    Date,
    /// Date or date-time with optional millis and offset/`Z`.
    Iso8601,
    /// Fixed set of allowed literals.
    OneOf(&'static [&'static str]),
    /// Named rule resolved against caller-supplied [`FormatRules`].
    Custom(&'static str),
}

pub type CustomRule = fn(&Value) -> Result<(), String>;

/// Caller-supplied named format rules.
#[derive(Debug, Default, Clone)]
pub struct FormatRules {
    rules: HashMap<&'static str, CustomRule>,
}

impl FormatRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, name: &'static str, rule: CustomRule) -> Self {
        self.rules.insert(name, rule);
        self
    }

    fn get(&self, name: &str) -> Option<&CustomRule> {
        self.rules.get(name)
    }
}

/// Why a format check did not pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Human-readable reason, reported as a 400 naming the parameter.
    Invalid(String),
    /// Unknown custom rule name: a configuration error, never a 400.
    UnknownRule(String),
    /// Unparseable pattern in a rule declaration: a configuration error.
    BadPattern(String),
}

static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());
static ISO8601_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}(T\d{2}:\d{2}:\d{2}(\.\d{1,3})?( ?[+-]\d{2}:\d{2}| \d{2}:\d{2}|Z)?)?$")
        .unwrap()
});
// ` +HH:MM`, ` -HH:MM`, and the sign-less ` HH:MM` all normalize to a
// signed offset; a missing sign means `+`.
static TRAILING_OFFSET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" ([+-]?)(\d{2}:\d{2})$").unwrap());

const DATE_REASON: &str = "is not a valid date (YYYY-MM-DD)";
const ISO8601_REASON: &str = "is not a valid date (iso8601: YYYY-MM-DDTHH:MM:SSZ)";

fn string_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parses_as_iso8601(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Check `value` against `spec`. Iso8601 normalizes a space before a
/// trailing `HH:MM` offset to `+HH:MM` in place before parsing.
pub fn check_format(
    value: &mut Value,
    spec: &FormatSpec,
    rules: &FormatRules,
) -> Result<(), FormatError> {
    if value.is_null() {
        return Ok(());
    }

    match spec {
        FormatSpec::Pattern(pattern) => {
            let re = Regex::new(pattern).map_err(|e| FormatError::BadPattern(e.to_string()))?;
            if !re.is_match(&string_form(value)) {
                return Err(FormatError::Invalid("is not valid".to_string()));
            }
            Ok(())
        }
        FormatSpec::Date => {
            let s = string_form(value);
            if !DATE_RE.is_match(&s) || NaiveDate::parse_from_str(&s, "%Y-%m-%d").is_err() {
                return Err(FormatError::Invalid(DATE_REASON.to_string()));
            }
            Ok(())
        }
        FormatSpec::Iso8601 => {
            let s = string_form(value);
            if !ISO8601_RE.is_match(&s) {
                return Err(FormatError::Invalid(ISO8601_REASON.to_string()));
            }
            let normalized = TRAILING_OFFSET_RE
                .replace(&s, |caps: &regex::Captures| {
                    let sign = if &caps[1] == "-" { "-" } else { "+" };
                    format!("{sign}{}", &caps[2])
                })
                .into_owned();
            if !parses_as_iso8601(&normalized) {
                return Err(FormatError::Invalid(ISO8601_REASON.to_string()));
            }
            if normalized != s {
                *value = Value::String(normalized);
            }
            Ok(())
        }
        FormatSpec::OneOf(allowed) => {
            let member = value
                .as_str()
                .map(|s| allowed.contains(&s))
                .unwrap_or(false);
            if !member {
                return Err(FormatError::Invalid("is not valid".to_string()));
            }
            Ok(())
        }
        FormatSpec::Custom(name) => {
            let rule = rules
                .get(name)
                .ok_or_else(|| FormatError::UnknownRule(name.to_string()))?;
            rule(value).map_err(FormatError::Invalid)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(value: Value, spec: FormatSpec) -> Result<(), FormatError> {
        let mut value = value;
        check_format(&mut value, &spec, &FormatRules::default())
    }

    #[test]
    fn test_absent_value_always_passes() {
        assert!(check(Value::Null, FormatSpec::Date).is_ok());
        assert!(check(Value::Null, FormatSpec::Pattern(r"^\d+$")).is_ok());
        assert!(check(Value::Null, FormatSpec::OneOf(&["a"])).is_ok());
    }

    #[test]
    fn test_pattern() {
        assert!(check(json!("abc-123"), FormatSpec::Pattern(r"^[a-z]+-\d+$")).is_ok());
        assert_eq!(
            check(json!("nope"), FormatSpec::Pattern(r"^\d+$")),
            Err(FormatError::Invalid("is not valid".to_string()))
        );
    }

    #[test]
    fn test_date() {
        assert!(check(json!("2024-01-05"), FormatSpec::Date).is_ok());
        assert!(check(json!("2024-1-5"), FormatSpec::Date).is_err());
        // matches the shape but is not a real calendar date
        assert!(check(json!("2024-13-01"), FormatSpec::Date).is_err());
        assert!(check(json!("2024-02-30"), FormatSpec::Date).is_err());
    }

    #[test]
    fn test_iso8601_accepts_spec_cases() {
        assert!(check(json!("2024-01-05T10:00:00Z"), FormatSpec::Iso8601).is_ok());
        assert!(check(json!("2024-01-05T10:00:00 +01:00"), FormatSpec::Iso8601).is_ok());
        assert!(check(json!("2024-01-05T10:00:00.123Z"), FormatSpec::Iso8601).is_ok());
        assert!(check(json!("2024-01-05T10:00:00"), FormatSpec::Iso8601).is_ok());
        assert!(check(json!("2024-01-05"), FormatSpec::Iso8601).is_ok());
    }

    #[test]
    fn test_iso8601_rejects_bad_dates() {
        assert!(check(json!("2024-13-01"), FormatSpec::Iso8601).is_err());
        assert!(check(json!("2024-01-05T25:00:00Z"), FormatSpec::Iso8601).is_err());
        assert!(check(json!("not a date"), FormatSpec::Iso8601).is_err());
    }

    #[test]
    fn test_iso8601_normalizes_space_offset_in_place() {
        let mut value = json!("2024-01-05T10:00:00 +01:00");
        check_format(&mut value, &FormatSpec::Iso8601, &FormatRules::default()).unwrap();
        assert_eq!(value, json!("2024-01-05T10:00:00+01:00"));

        let mut value = json!("2024-01-05T10:00:00 01:00");
        check_format(&mut value, &FormatSpec::Iso8601, &FormatRules::default()).unwrap();
        assert_eq!(value, json!("2024-01-05T10:00:00+01:00"));

        let mut value = json!("2024-01-05T10:00:00 -05:00");
        check_format(&mut value, &FormatSpec::Iso8601, &FormatRules::default()).unwrap();
        assert_eq!(value, json!("2024-01-05T10:00:00-05:00"));
    }

    #[test]
    fn test_one_of() {
        const METHODS: &[&str] = &["get", "post", "put", "delete"];
        assert!(check(json!("get"), FormatSpec::OneOf(METHODS)).is_ok());
        assert!(check(json!("patch"), FormatSpec::OneOf(METHODS)).is_err());
        assert!(check(json!(42), FormatSpec::OneOf(METHODS)).is_err());
    }

    #[test]
    fn test_custom_rule_dispatch() {
        fn even(value: &Value) -> Result<(), String> {
            match value.as_i64() {
                Some(n) if n % 2 == 0 => Ok(()),
                _ => Err("is not even".to_string()),
            }
        }
        let rules = FormatRules::new().with_rule("even", even);

        let mut value = json!(4);
        assert!(check_format(&mut value, &FormatSpec::Custom("even"), &rules).is_ok());

        let mut value = json!(3);
        assert_eq!(
            check_format(&mut value, &FormatSpec::Custom("even"), &rules),
            Err(FormatError::Invalid("is not even".to_string()))
        );
    }

    #[test]
    fn test_unknown_custom_rule_is_configuration_error() {
        let mut value = json!("x");
        assert_eq!(
            check_format(&mut value, &FormatSpec::Custom("missing"), &FormatRules::default()),
            Err(FormatError::UnknownRule("missing".to_string()))
        );
    }
}
