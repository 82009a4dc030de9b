//! `${name}` variable substitution
//!
//! Tokens are resolved against the run's [`VariableStore`]. Resolution is
//! flat: a replacement is never rescanned for further tokens, and tokens
//! whose name is not stored are left exactly as written.

use std::borrow::Cow;

use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^\s{}]+)\}").expect("Invalid token regex"));

/// Variables assigned during one scenario run
///
/// Written by assignment steps and action-output extraction, read before
/// and after every step. The last write to a name wins.
#[derive(Debug, Default, Clone)]
pub struct VariableStore {
    vars: IndexMap<String, Value>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a variable, replacing any previous value
    pub fn assign(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        tracing::debug!(variable = %name, value = %value, "assigned variable");
        self.vars.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for VariableStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = Self::new();
        for (name, value) in iter {
            store.assign(name, value);
        }
        store
    }
}

/// String form of a JSON value: strings verbatim, everything else as JSON
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Replace every resolvable `${name}` token inside `text`
pub fn substitute_str<'a>(text: &'a str, store: &VariableStore) -> Cow<'a, str> {
    if store.is_empty() || !text.contains("${") {
        return Cow::Borrowed(text);
    }
    TOKEN.replace_all(text, |caps: &Captures<'_>| match store.get(&caps[1]) {
        Some(value) => value_text(value),
        None => caps[0].to_string(),
    })
}

/// Substitute tokens in a value and hand it back with the same shape
pub fn substitute<T: Substitute>(mut value: T, store: &VariableStore) -> T {
    value.substitute(store);
    value
}

/// In-place token substitution over a value and everything it owns
pub trait Substitute {
    fn substitute(&mut self, store: &VariableStore);
}

impl Substitute for String {
    fn substitute(&mut self, store: &VariableStore) {
        let replaced = match substitute_str(self, store) {
            Cow::Borrowed(_) => return,
            Cow::Owned(replaced) => replaced,
        };
        *self = replaced;
    }
}

impl Substitute for Value {
    fn substitute(&mut self, store: &VariableStore) {
        match self {
            Value::String(s) => s.substitute(store),
            Value::Array(items) => items.substitute(store),
            Value::Object(map) => map.substitute(store),
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }
}

impl Substitute for Map<String, Value> {
    fn substitute(&mut self, store: &VariableStore) {
        for value in self.values_mut() {
            value.substitute(store);
        }
    }
}

impl<T: Substitute> Substitute for Vec<T> {
    fn substitute(&mut self, store: &VariableStore) {
        for item in self.iter_mut() {
            item.substitute(store);
        }
    }
}

impl<T: Substitute> Substitute for Option<T> {
    fn substitute(&mut self, store: &VariableStore) {
        if let Some(inner) = self {
            inner.substitute(store);
        }
    }
}

impl Substitute for IndexSet<String> {
    fn substitute(&mut self, store: &VariableStore) {
        *self = std::mem::take(self)
            .into_iter()
            .map(|item| substitute(item, store))
            .collect();
    }
}

impl<T: Substitute> Substitute for IndexMap<String, T> {
    fn substitute(&mut self, store: &VariableStore) {
        for value in self.values_mut() {
            value.substitute(store);
        }
    }
}
