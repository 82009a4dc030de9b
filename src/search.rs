//! Recursive key search over nested JSON trees

use serde_json::{map, Value};

/// Lazily yield every value stored under `key`, at any depth.
///
/// Objects are walked in insertion order and arrays in index order,
/// depth first. A matching value is yielded as a whole and not searched
/// further. Each call starts a fresh traversal.
pub fn find_all<'a>(key: &'a str, tree: &'a Value) -> FindAll<'a> {
    let mut iter = FindAll {
        key,
        stack: Vec::new(),
    };
    iter.push(tree);
    iter
}

/// First value stored under `key` in traversal order
pub fn find_first<'a>(key: &'a str, tree: &'a Value) -> Option<&'a Value> {
    find_all(key, tree).next()
}

enum Frame<'a> {
    Object(map::Iter<'a>),
    Array(std::slice::Iter<'a, Value>),
}

/// Iterator returned by [`find_all`]
pub struct FindAll<'a> {
    key: &'a str,
    stack: Vec<Frame<'a>>,
}

impl<'a> FindAll<'a> {
    fn push(&mut self, value: &'a Value) {
        match value {
            Value::Object(map) => self.stack.push(Frame::Object(map.iter())),
            Value::Array(items) => self.stack.push(Frame::Array(items.iter())),
            _ => {}
        }
    }
}

impl<'a> Iterator for FindAll<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            let child = match frame {
                Frame::Object(entries) => match entries.next() {
                    Some((k, v)) if k == self.key => return Some(v),
                    Some((_, v)) => Some(v),
                    None => None,
                },
                Frame::Array(items) => items.next(),
            };

            match child {
                Some(value) => self.push(value),
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}
