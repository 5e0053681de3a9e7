//! Declarative payload validation.
//!
//! A [`Schema`] maps field names to an ordered rule list and is evaluated
//! against an untyped JSON payload. Evaluation never panics and never stops at
//! the first failure: every broken rule contributes a message to the
//! resulting [`ValidationErrors`].

use core::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use stockroom_core::ValidationErrors;

/// A single field constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Field must be present and not null (empty strings count as null).
    Required,
    /// Null is an accepted value; remaining rules are skipped for it.
    Nullable,
    /// Value must be a JSON string.
    String,
    /// Strings may hold at most this many characters.
    Max(usize),
    /// JSON number or a numeric string, within the range of [`Decimal`].
    Numeric,
    /// JSON integer or an integer string.
    Integer,
}

impl Rule {
    fn check(&self, field: &str, value: &Value) -> Option<String> {
        match self {
            Rule::Required | Rule::Nullable => None,
            Rule::String => (!value.is_string()).then(|| format!("The {field} field must be a string.")),
            Rule::Max(max) => match value {
                Value::String(s) if s.chars().count() > *max => Some(format!(
                    "The {field} field must not be greater than {max} characters."
                )),
                _ => None,
            },
            Rule::Numeric => {
                let text = numeric_text(value);
                if text.as_deref().and_then(parse_decimal).is_some() {
                    None
                } else if text.as_deref().is_some_and(looks_numeric) {
                    Some(format!("The {field} field is outside the supported numeric range."))
                } else {
                    Some(format!("The {field} field must be a number."))
                }
            }
            Rule::Integer => as_integer(value)
                .is_none()
                .then(|| format!("The {field} field must be an integer.")),
        }
    }
}

/// Field -> rules, evaluated in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<(&'static str, Vec<Rule>)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &'static str, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.fields.push((name, rules.into_iter().collect()));
        self
    }

    /// Validate `payload` and return the declared fields that were present.
    ///
    /// Keys not declared in the schema are dropped. A payload that is not a
    /// JSON object is evaluated as an empty object.
    pub fn validate(&self, payload: &Value) -> Result<Map<String, Value>, ValidationErrors> {
        let input = normalize(payload);
        let mut errors = ValidationErrors::new();
        let mut validated = Map::new();

        for (field, rules) in &self.fields {
            let value = match input.get(*field) {
                Some(Value::Null) | None if rules.contains(&Rule::Required) => {
                    errors.add(*field, format!("The {field} field is required."));
                    continue;
                }
                None => continue,
                Some(Value::Null) if rules.contains(&Rule::Nullable) => {
                    validated.insert(field.to_string(), Value::Null);
                    continue;
                }
                Some(value) => value,
            };

            let mut passed = true;
            for rule in rules {
                if let Some(message) = rule.check(field, value) {
                    errors.add(*field, message);
                    passed = false;
                }
            }
            if passed {
                validated.insert(field.to_string(), value.clone());
            }
        }

        errors.into_result().map(|()| validated)
    }
}

/// Top-level strings are trimmed and empty strings become null.
fn normalize(payload: &Value) -> Map<String, Value> {
    let Value::Object(map) = payload else {
        return Map::new();
    };

    map.iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) if s.trim().is_empty() => Value::Null,
                Value::String(s) => Value::String(s.trim().to_string()),
                other => other.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

/// Interpret a JSON value as a decimal number (numbers and numeric strings).
pub fn as_decimal(value: &Value) -> Option<Decimal> {
    numeric_text(value).as_deref().and_then(parse_decimal)
}

fn numeric_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.trim().to_string()),
        _ => None,
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Decimal or exponent notation, regardless of magnitude. Rejects `inf`/`NaN`.
fn looks_numeric(text: &str) -> bool {
    text.parse::<f64>().is_ok() && !text.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E')
}

/// Interpret a JSON value as a 64-bit integer (integral numbers and integer strings).
pub fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
            (f.fract() == 0.0 && in_range).then_some(f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
