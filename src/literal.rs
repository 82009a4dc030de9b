//! Inline literal grammar for step parameters and table cells
//!
//! Three forms are recognised anywhere a scalar is accepted:
//!
//! ```text
//! key:value        single pair
//! [a, b, c]        list of trimmed strings
//! {"k": [1, 2]}    JSON literal
//! ```

use serde_json::{Map, Value};

use crate::common::Result;

/// Parse a one-line list such as `[a, b,c ]` into its trimmed elements.
///
/// Embedded commas cannot be escaped. An empty literal (`[]` or ``)
/// produces an empty list.
pub fn parse_list(text: &str) -> Vec<String> {
    let inner = text.trim().trim_matches(|c| c == '[' || c == ']');
    if inner.trim().is_empty() {
        return Vec::new();
    }
    inner.split(',').map(|item| item.trim().to_string()).collect()
}

/// Parse a mapping literal.
///
/// - `key:value` (no braces) gives a single pair. Only the text between the
///   first and second colon becomes the value; anything after a second
///   colon is dropped.
/// - `{...}` is parsed as a JSON object.
/// - Anything else is an empty mapping.
pub fn parse_dict(text: &str) -> Result<Map<String, Value>> {
    if is_pair(text) {
        let mut parts = text.split(':');
        let key = parts.next().unwrap_or_default();
        let value = parts.next().unwrap_or_default();

        let mut map = Map::new();
        map.insert(key.to_string(), Value::String(value.to_string()));
        return Ok(map);
    }

    if is_braced(text) {
        return Ok(serde_json::from_str(text)?);
    }

    Ok(Map::new())
}

/// Reinterpret a table cell through the literal grammar.
///
/// Pairs become one-entry objects, braced text is parsed as JSON of any
/// shape, bracketed text becomes a list of strings, and everything else
/// stays a string.
pub fn parse_cell(text: &str) -> Result<Value> {
    if is_pair(text) {
        return Ok(Value::Object(parse_dict(text)?));
    }
    if is_braced(text) {
        return Ok(serde_json::from_str(text)?);
    }
    if is_bracketed(text) {
        return Ok(Value::Array(
            parse_list(text).into_iter().map(Value::String).collect(),
        ));
    }
    Ok(Value::String(text.to_string()))
}

fn is_pair(text: &str) -> bool {
    text.contains(':') && !text.contains('{')
}

fn is_braced(text: &str) -> bool {
    text.contains('{') && text.contains('}')
}

fn is_bracketed(text: &str) -> bool {
    text.contains('[') && text.contains(']')
}
