//! Comparison helpers used by validation steps
//!
//! The boolean forms answer the question; the `expect_*` forms turn a
//! negative answer into an [`Error::AssertionFailed`] carrying both sides.

use std::collections::HashSet;

use serde_json::Value;

use crate::common::{Error, Result};
use crate::substitute::value_text;

/// Elements of `expected` that do not appear in `actual`
pub fn missing<E, A>(expected: E, actual: A) -> Vec<String>
where
    E: IntoIterator,
    E::Item: AsRef<str>,
    A: IntoIterator,
    A::Item: AsRef<str>,
{
    let actual: HashSet<String> = actual.into_iter().map(|a| a.as_ref().to_string()).collect();
    expected
        .into_iter()
        .filter(|e| !actual.contains(e.as_ref()))
        .map(|e| e.as_ref().to_string())
        .collect()
}

/// Minimum-contained check: every expected element is present in `actual`.
/// Extra actual elements are fine.
pub fn contains_all<E, A>(expected: E, actual: A) -> bool
where
    E: IntoIterator,
    E::Item: AsRef<str>,
    A: IntoIterator,
    A::Item: AsRef<str>,
{
    missing(expected, actual).is_empty()
}

pub fn expect_contains_all<E, A>(subject: &str, expected: E, actual: A) -> Result<()>
where
    E: IntoIterator,
    E::Item: AsRef<str>,
    A: IntoIterator,
    A::Item: AsRef<str>,
{
    let expected: Vec<String> = expected.into_iter().map(|e| e.as_ref().to_string()).collect();
    let actual: Vec<String> = actual.into_iter().map(|a| a.as_ref().to_string()).collect();
    let absent = missing(&expected, &actual);
    if absent.is_empty() {
        return Ok(());
    }
    Err(Error::assertion(
        format!("{} (missing {:?})", subject, absent),
        format!("{:?}", expected),
        format!("{:?}", actual),
    ))
}

/// Exact comparison of string-coerced values
pub fn expect_text(subject: &str, expected: &str, actual: &str) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::assertion(subject, expected, actual))
    }
}

/// Compare a JSON value in its string form against expected text
pub fn expect_value_text(subject: &str, expected: &str, actual: &Value) -> Result<()> {
    expect_text(subject, expected, &value_text(actual))
}

/// Compare two JSON values, reporting both in their string form
pub fn expect_value(subject: &str, expected: &Value, actual: &Value) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::assertion(subject, value_text(expected), value_text(actual)))
    }
}

/// A value is "present" when it is neither null nor empty/false
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimum_contained() {
        assert!(contains_all(["a", "b"], ["a", "b", "c"]));
        assert!(!contains_all(["a", "b"], ["a"]));
        assert!(contains_all(Vec::<String>::new(), ["a"]));
    }

    #[test]
    fn test_expect_contains_all_reports_both_sides() {
        let err = expect_contains_all("Container tags", ["a", "b"], ["a"]).unwrap_err();
        match err {
            Error::AssertionFailed {
                subject,
                expected,
                actual,
            } => {
                assert!(subject.contains("\"b\""));
                assert_eq!(expected, r#"["a", "b"]"#);
                assert_eq!(actual, r#"["a"]"#);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_expect_value_text_coerces() {
        assert!(expect_value_text("count", "3", &json!(3)).is_ok());
        assert!(expect_value_text("name", "x", &json!("x")).is_ok());
        assert!(expect_value_text("name", "x", &json!("y")).is_err());
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(is_truthy(&json!("value")));
        assert!(is_truthy(&json!({"k": 1})));
    }
}
