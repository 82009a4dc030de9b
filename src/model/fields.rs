//! Field access by name
//!
//! Steps address entity attributes by the names scenario authors write
//! ("label", "custom_fields", "result_data"). Each entity registers a
//! static table of getter/setter pairs; lookups go through the table
//! instead of any runtime reflection.

use indexmap::IndexSet;
use serde_json::{Map, Value};

use crate::common::{Error, Result};
use crate::literal::{parse_dict, parse_list};
use crate::substitute::value_text;

/// Getter/setter pair for one named attribute of `T`
pub struct Field<T: 'static> {
    pub name: &'static str,
    pub get: fn(&T) -> Value,
    pub set: fn(&mut T, Value) -> Result<()>,
}

/// Registered fields of one entity type
pub struct FieldTable<T: 'static> {
    entity: &'static str,
    fields: &'static [Field<T>],
}

impl<T: 'static> FieldTable<T> {
    /// Register a table of fields.
    ///
    /// # Panics
    ///
    /// If two fields share a name; tables are static and this is a
    /// programming error.
    pub fn new(entity: &'static str, fields: &'static [Field<T>]) -> Self {
        for (index, field) in fields.iter().enumerate() {
            assert!(
                !fields[..index].iter().any(|other| other.name == field.name),
                "duplicate field '{}' registered for {}",
                field.name,
                entity
            );
        }
        Self { entity, fields }
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Result<&Field<T>> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| Error::UnknownField {
                entity: self.entity,
                field: name.to_string(),
            })
    }

    /// Read a field as a JSON value
    pub fn get(&self, target: &T, name: &str) -> Result<Value> {
        Ok((self.field(name)?.get)(target))
    }

    /// Read a field in its string-coerced form, as used by assertions
    pub fn get_text(&self, target: &T, name: &str) -> Result<String> {
        self.get(target, name).map(|v| value_text(&v))
    }

    /// Write a field from a JSON value
    pub fn set(&self, target: &mut T, name: &str, value: Value) -> Result<()> {
        (self.field(name)?.set)(target, value)
    }

    /// Write every entry of a record onto `target`
    pub fn apply(&self, target: &mut T, record: Map<String, Value>) -> Result<()> {
        for (name, value) in record {
            self.set(target, &name, value)?;
        }
        Ok(())
    }
}

/// Coerce a scalar into text
pub fn text_value(field: &str, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Null => Ok(String::new()),
        Value::Bool(_) | Value::Number(_) => Ok(value.to_string()),
        Value::Array(_) | Value::Object(_) => {
            Err(Error::invalid_value(field, format!("expected text, got {}", value)))
        }
    }
}

/// Coerce a list, or a list literal, into strings
pub fn list_value(field: &str, value: Value) -> Result<Vec<String>> {
    match value {
        Value::Array(items) => Ok(items.iter().map(value_text).collect()),
        Value::String(s) => Ok(parse_list(&s)),
        Value::Null => Ok(Vec::new()),
        other => Err(Error::invalid_value(field, format!("expected a list, got {}", other))),
    }
}

/// Coerce a list, or a list literal, into a set of strings
pub fn set_value(field: &str, value: Value) -> Result<IndexSet<String>> {
    list_value(field, value).map(|items| items.into_iter().collect())
}

/// Coerce an object, or a mapping literal, into a mapping
pub fn map_value(field: &str, value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        Value::String(s) => parse_dict(&s),
        Value::Null => Ok(Map::new()),
        other => Err(Error::invalid_value(
            field,
            format!("expected a mapping, got {}", other),
        )),
    }
}

/// Coerce a number or numeric text into an optional id
pub fn id_value(field: &str, value: Value) -> Result<Option<u64>> {
    match &value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| Error::invalid_value(field, format!("invalid id {}", n))),
        Value::String(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::invalid_value(field, format!("invalid id '{}'", s))),
        _ => Err(Error::invalid_value(field, format!("invalid id {}", value))),
    }
}

/// Coerce a boolean or `true`/`false` text (any case) into a bool
pub fn bool_value(field: &str, value: Value) -> Result<bool> {
    match &value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(Error::invalid_value(field, format!("expected true or false, got {}", value))),
    }
}

pub fn id_json(id: Option<u64>) -> Value {
    id.map(Value::from).unwrap_or(Value::Null)
}

pub fn set_json(set: &IndexSet<String>) -> Value {
    Value::Array(set.iter().cloned().map(Value::String).collect())
}
